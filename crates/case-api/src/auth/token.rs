//! Bearer token issuance and verification.
//!
//! Tokens are signed with HS256 and carry exactly three claims: the
//! username (`sub`), the user's authorized scopes, and the expiry time.

use std::time::{SystemTime, UNIX_EPOCH};

use database::Scope;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;

/// Payload embedded in a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username the token was issued to.
    pub sub: String,
    /// Scopes the user held at issuance.
    pub scopes: Vec<Scope>,
    /// Expiration time (Unix timestamp).
    pub exp: u64,
}

/// Signs and verifies bearer tokens.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_seconds: u64,
}

impl TokenSigner {
    /// Create a signer. The secret must already be validated (non-empty,
    /// long enough); [`crate::config::Config`] enforces that at startup.
    pub fn new(secret: &str, expiry_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds,
        }
    }

    /// Issue a signed, time-limited token for an authenticated user.
    pub fn issue(&self, username: &str, scopes: &[Scope]) -> Result<String, AuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| AuthError::InvalidCredentials)?
            .as_secs();

        let claims = Claims {
            sub: username.to_string(),
            scopes: scopes.to_vec(),
            exp: now + self.expiry_seconds,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::InvalidCredentials)
    }

    /// Verify a token's signature and expiry, returning its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.set_required_spec_claims(&["exp"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::warn!(error = %err, "Rejected bearer token");
                AuthError::InvalidCredentials
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_signer() -> TokenSigner {
        TokenSigner::new("test-secret-that-is-at-least-32-characters-long", 1800)
    }

    #[test]
    fn test_issue_and_verify() {
        let signer = test_signer();

        let token = signer
            .issue("johndoe", &[Scope::Read, Scope::Create])
            .unwrap();
        assert!(!token.is_empty());

        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, "johndoe");
        assert_eq!(claims.scopes, vec![Scope::Read, Scope::Create]);
    }

    #[test]
    fn test_claims_are_exactly_sub_scopes_exp() {
        let claims = Claims {
            sub: "johndoe".to_string(),
            scopes: vec![Scope::Read],
            exp: 1_700_000_000,
        };

        let value = serde_json::to_value(&claims).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["exp", "scopes", "sub"]);
        assert_eq!(value["scopes"], serde_json::json!(["read"]));
    }

    #[test]
    fn test_invalid_token_rejected() {
        let signer = test_signer();

        let result = signer.verify("not-a-token");
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = test_signer();
        let other = TokenSigner::new("different-secret-that-is-at-least-32-chars", 1800);

        let token = signer.issue("johndoe", &[]).unwrap();
        assert!(matches!(
            other.verify(&token),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Expiry in the past, beyond the default leeway
        let signer = TokenSigner::new("test-secret-that-is-at-least-32-characters-long", 0);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let claims = Claims {
            sub: "johndoe".to_string(),
            scopes: vec![],
            exp: now - 120,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret-that-is-at-least-32-characters-long".as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            signer.verify(&token),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
