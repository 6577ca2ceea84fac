//! # gatekeep-core
//!
//! Core error handling, configuration, entities, and collaborator
//! traits for the Gatekeep credential/session service.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod user;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
pub use user::User;
