//! Authentication module for bookmark-server
//!
//! Password hashing, session token issuance and the signup/signin flow
//! that composes them.

pub mod extractor;
pub mod handlers;
pub mod password;
pub mod service;
pub mod token;

pub use extractor::AuthenticatedUser;
pub use password::CredentialHasher;
pub use service::AuthService;
pub use token::{AccessToken, Claims, TokenIssuer};
