//! Local authentication primitives for the Medical Wallet gateway.
//!
//! Two concerns live here, both free of storage and HTTP dependencies:
//! - [`password`]: Argon2id hashing and verification of user passwords
//! - [`token`]: minting and verifying the HS256 bearer tokens the API issues
//!
//! The user store that calls into these lives in `medwallet-store`; the HTTP
//! extractor that verifies bearer headers lives in `medwallet-api`.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::{TokenClaims, TokenSigner};

/// Errors returned by the authentication primitives.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),

    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    BadSignature,

    #[error("token has expired")]
    Expired,

    #[error("failed to encode claims: {0}")]
    ClaimsEncoding(#[from] serde_json::Error),
}

/// Type alias for Results that can fail with an [`AuthError`].
pub type AuthResult<T> = Result<T, AuthError>;
