//! Signed session tokens and the revocable token store.

pub mod claims;
pub mod issuer;
pub mod store;

pub use claims::{Claims, Identity};
pub use issuer::{IssuedToken, SessionIssuer};
pub use store::{TokenRecord, TokenStore, UserToken};
