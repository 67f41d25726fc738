//! Fixed-TTL session credentials.
//!
//! HS256 bearer tokens with an `exp`/`iat` pair and a `typ` claim. There is
//! deliberately no refresh flow: expiry forces a full re-authentication
//! (another constant-time hash check) rather than silent renewal. Expiry is
//! validated against the caller's clock so the whole flow stays
//! deterministic under simulation.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ServerError;

/// The only token type this deployment issues.
const TOKEN_TYPE: &str = "access";

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Expiry, Unix seconds.
    pub exp: u64,
    /// Issued-at, Unix seconds.
    pub iat: u64,
    /// Token type; always `access`.
    pub typ: String,
}

/// Issues and verifies session tokens.
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
}

impl SessionIssuer {
    /// Create an issuer from the deployment secret and TTL.
    pub fn new(secret: &str, ttl_minutes: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: ttl_minutes * 60,
        }
    }

    /// Issue a token at the given wall-clock time.
    ///
    /// Returns `(token, expires_in_seconds)`.
    ///
    /// # Errors
    ///
    /// [`ServerError::Session`] if signing fails.
    pub fn issue(&self, now_secs: u64) -> Result<(String, u64), ServerError> {
        let claims = SessionClaims {
            exp: now_secs + self.ttl_secs,
            iat: now_secs,
            typ: TOKEN_TYPE.to_string(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServerError::Session(e.to_string()))?;

        Ok((token, self.ttl_secs))
    }

    /// Verify a token's signature, type, and expiry at the given time.
    ///
    /// # Errors
    ///
    /// [`ServerError::Session`] for a bad signature, wrong `typ`, or an
    /// expired token. Collaborator handlers map all three to the same
    /// unauthorized response.
    pub fn verify(&self, token: &str, now_secs: u64) -> Result<SessionClaims, ServerError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is checked below against the caller's clock, not the OS clock
        validation.validate_exp = false;

        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| ServerError::Session(e.to_string()))?;

        if data.claims.typ != TOKEN_TYPE {
            return Err(ServerError::Session("invalid token type".to_string()));
        }

        if data.claims.exp <= now_secs {
            return Err(ServerError::Session("token expired".to_string()));
        }

        Ok(data.claims)
    }
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("secret", &"[REDACTED]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}
