//! `ecom-auth`: session-based bearer token authentication.
//!
//! This crate is decoupled from HTTP and storage: sessions, users and password
//! hashing are consumed through capability traits implemented elsewhere.

pub mod claims;
pub mod guard;
pub mod password;
pub mod service;
pub mod session;
pub mod token;
pub mod user;

pub use claims::{Claims, TokenError, TokenKind};
pub use guard::{AdminGuard, AuthGuard, extract_bearer, require_admin};
pub use password::{HashError, PasswordHasher};
pub use service::{
    AuthError, AuthService, LoginOutcome, RegisterUser, RenewOutcome, SessionRejection,
    TokenLifetimes,
};
pub use session::{NewSession, Session, SessionStore};
pub use token::TokenSigner;
pub use user::{NewUser, User, UserStore, UserUpdate};
