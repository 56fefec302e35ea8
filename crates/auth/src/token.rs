//! HS256 bearer tokens carrying user id, role and expiry.
//!
//! Tokens are standard three-part JWTs (`header.claims.signature`) signed with
//! HMAC-SHA256 over the configured secret. There is no refresh mechanism; a
//! token is valid until its fixed expiry and callers re-authenticate after
//! that.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{AuthError, AuthResult};

type HmacSha256 = Hmac<Sha256>;

/// The claims embedded in an access token.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// User id the token was issued to.
    pub sub: String,
    /// Role carried for authorisation decisions.
    pub role: String,
    /// Expiry as a unix timestamp (seconds).
    pub exp: i64,
}

/// Mints and verifies access tokens for one signing secret and TTL.
///
/// Construct once from configuration and share; both operations are pure.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl_minutes: i64,
}

impl TokenSigner {
    pub fn new(secret: impl Into<Vec<u8>>, ttl_minutes: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_minutes,
        }
    }

    /// Issue a signed token for the given user id and role, expiring after the
    /// configured TTL.
    pub fn issue(&self, user_id: &str, role: &str) -> AuthResult<String> {
        let claims = TokenClaims {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: (Utc::now() + Duration::minutes(self.ttl_minutes)).timestamp(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &TokenClaims) -> AuthResult<String> {
        let header = serde_json::json!({"alg": "HS256", "typ": "JWT"});
        let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
        let claims_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
        let message = format!("{header_b64}.{claims_b64}");

        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| AuthError::BadSignature)?;
        mac.update(message.as_bytes());
        let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{message}.{signature_b64}"))
    }

    /// Verify a token's signature and expiry, returning its claims.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Malformed`] when the token is not three base64url parts
    ///   or the claims do not decode
    /// - [`AuthError::BadSignature`] when the HMAC does not verify
    /// - [`AuthError::Expired`] when `exp` is in the past
    pub fn verify(&self, token: &str) -> AuthResult<TokenClaims> {
        let mut parts = token.splitn(3, '.');
        let (header_b64, claims_b64, signature_b64) =
            match (parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(c), Some(s)) if !h.is_empty() && !c.is_empty() && !s.is_empty() => {
                    (h, c, s)
                }
                _ => return Err(AuthError::Malformed),
            };

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AuthError::Malformed)?;

        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| AuthError::BadSignature)?;
        mac.update(format!("{header_b64}.{claims_b64}").as_bytes());
        // constant-time comparison via the Mac verifier
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let claims_json = URL_SAFE_NO_PAD
            .decode(claims_b64)
            .map_err(|_| AuthError::Malformed)?;
        let claims: TokenClaims =
            serde_json::from_slice(&claims_json).map_err(|_| AuthError::Malformed)?;

        if claims.exp < Utc::now().timestamp() {
            tracing::debug!(sub = %claims.sub, "rejected expired token");
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(b"test-secret".to_vec(), 30)
    }

    #[test]
    fn issue_then_verify_round_trip() {
        let token = signer().issue("user-1", "clinician").expect("issue");
        let claims = signer().verify(&token).expect("verify");
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, "clinician");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn tampered_claims_fail_signature_check() {
        let token = signer().issue("user-1", "patient").expect("issue");
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&TokenClaims {
                sub: "user-1".to_string(),
                role: "admin".to_string(),
                exp: (Utc::now() + Duration::hours(1)).timestamp(),
            })
            .unwrap(),
        );
        parts[1] = &forged;
        let tampered = parts.join(".");

        let err = signer().verify(&tampered).expect_err("should reject");
        assert!(matches!(err, AuthError::BadSignature));
    }

    #[test]
    fn expired_token_is_rejected() {
        let stale = TokenSigner::new(b"test-secret".to_vec(), -5);
        let token = stale.issue("user-1", "patient").expect("issue");
        let err = signer().verify(&token).expect_err("should reject");
        assert!(matches!(err, AuthError::Expired));
    }

    #[test]
    fn garbage_token_is_malformed() {
        let err = signer().verify("not-a-token").expect_err("should reject");
        assert!(matches!(err, AuthError::Malformed));

        let err = signer().verify("a.b").expect_err("should reject");
        assert!(matches!(err, AuthError::Malformed));
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let token = signer().issue("user-1", "patient").expect("issue");
        let other = TokenSigner::new(b"other-secret".to_vec(), 30);
        let err = other.verify(&token).expect_err("should reject");
        assert!(matches!(err, AuthError::BadSignature));
    }
}
