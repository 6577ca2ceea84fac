//! # gatekeep-auth
//!
//! The credential/session core of the Gatekeep account service.
//!
//! ## Modules
//!
//! - `password` — Argon2id password hashing and constant-time verification
//! - `token` — signed token claims, issuance/validation, and the revocable
//!   token store
//! - `service` — the orchestrating [`AuthService`]

pub mod password;
pub mod service;
pub mod token;

pub use password::PasswordHasher;
pub use service::{AuthService, Profile};
pub use token::{Claims, Identity, IssuedToken, SessionIssuer, TokenStore};
