// ============================
// backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod password;
pub mod session;
mod service;
mod service_impl;

pub use password::{
    constant_time_eq, hash_password, hash_password_secure, validate_password_strength,
    verify_password, Credential, CredentialError, PasswordRequirements, MIN_PASSWORD_LENGTH,
};
pub use session::{
    extract_bearer, AuthRejection, Clock, ManualClock, SessionClaims, SystemClock, TokenError,
    TokenSigner, TokenVerifier, SESSION_TTL,
};
pub use service::AuthService;
pub use service_impl::DefaultAuth;
