//! Session Tokens
//!
//! Stateless HS256 JWTs carrying the user identity. Nothing is stored server-side,
//! so a token stays valid until its `exp` (when one is configured) or until the
//! secret changes.

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::models::{Identity, SessionClaims};

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

/// Issues and verifies signed identity tokens
pub struct TokenIssuer {
    issuer: String,
    expiration: Option<i64>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenIssuer {
    /// Create an issuer signing with `secret`
    ///
    /// Fails with [`AuthError::Config`] when the secret is empty.
    pub fn new(
        secret: &str,
        issuer: impl Into<String>,
        expiration: Option<i64>,
    ) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Config("token secret must not be empty".into()));
        }

        Ok(Self {
            issuer: issuer.into(),
            expiration,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        Self::new(
            &config.app_secret,
            config.jwt_issuer.clone(),
            config.token_expiration,
        )
    }

    /// Produce a signed token binding `identity`
    pub fn issue(&self, identity: &Identity) -> Result<String, AuthError> {
        let now = Utc::now();

        let exp = match self.expiration {
            Some(secs) => Some(
                Duration::try_seconds(secs)
                    .and_then(|ttl| now.checked_add_signed(ttl))
                    .ok_or_else(|| {
                        AuthError::Config(format!("token lifetime of {secs} seconds is out of range"))
                    })?
                    .timestamp(),
            ),
            None => None,
        };

        let claims = SessionClaims {
            sub: identity.id,
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            exp,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("JWT encoding failed: {:?}", e);
            AuthError::Internal
        })
    }

    /// Verify a token and return the identity it carries
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation())?;

        Ok(Identity::from(token_data.claims.sub))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);
        // `exp` is checked when present but not required.
        validation.required_spec_claims.clear();
        validation.leeway = 0;
        validation
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(secret, "session-auth", None).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = issuer("test-secret");
        let identity = Identity::from(Uuid::new_v4());

        let token = tokens.issue(&identity).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), identity);
    }

    #[test]
    fn test_empty_secret_is_config_error() {
        assert!(matches!(
            TokenIssuer::new("", "session-auth", None),
            Err(AuthError::Config(_))
        ));
    }

    #[test]
    fn test_different_secret_rejected() {
        let identity = Identity::from(Uuid::new_v4());
        let token = issuer("first-secret").issue(&identity).unwrap();

        assert!(matches!(
            issuer("second-secret").verify(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        let tokens = issuer("test-secret");
        assert!(matches!(tokens.verify("123123"), Err(AuthError::InvalidToken)));
        assert!(matches!(tokens.verify(""), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let tokens = issuer("test-secret");
        let victim = tokens.issue(&Identity::from(Uuid::new_v4())).unwrap();
        let other = tokens.issue(&Identity::from(Uuid::new_v4())).unwrap();

        // Swap in the payload of another token, keeping the first token's signature.
        let victim_parts: Vec<&str> = victim.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let tampered = format!("{}.{}.{}", victim_parts[0], other_parts[1], victim_parts[2]);

        assert!(matches!(tokens.verify(&tampered), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_issuer_mismatch_rejected() {
        let identity = Identity::from(Uuid::new_v4());
        let token = TokenIssuer::new("test-secret", "someone-else", None)
            .unwrap()
            .issue(&identity)
            .unwrap();

        assert!(issuer("test-secret").verify(&token).is_err());
    }

    #[test]
    fn test_non_expiring_by_default() {
        let tokens = issuer("test-secret");
        let token = tokens.issue(&Identity::from(Uuid::new_v4())).unwrap();

        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.required_spec_claims.clear();
        validation.validate_aud = false;
        let claims = decode::<SessionClaims>(&token, &DecodingKey::from_secret(&[]), &validation)
            .unwrap()
            .claims;
        assert!(claims.exp.is_none());
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = TokenIssuer::new("test-secret", "session-auth", Some(-60)).unwrap();
        let token = tokens.issue(&Identity::from(Uuid::new_v4())).unwrap();

        assert!(matches!(tokens.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_out_of_range_lifetime_is_config_error() {
        let identity = Identity::from(Uuid::new_v4());

        for secs in [10_000_000_000_000, i64::MAX] {
            let tokens = TokenIssuer::new("test-secret", "session-auth", Some(secs)).unwrap();
            assert!(matches!(tokens.issue(&identity), Err(AuthError::Config(_))));
        }
    }

    #[test]
    fn test_long_lifetime_issues() {
        let tokens = TokenIssuer::new(
            "test-secret",
            "session-auth",
            Some(crate::config::MAX_TOKEN_EXPIRATION),
        )
        .unwrap();
        let identity = Identity::from(Uuid::new_v4());

        let token = tokens.issue(&identity).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), identity);
    }

    #[test]
    fn test_tokens_are_independently_valid() {
        let tokens = issuer("test-secret");
        let identity = Identity::from(Uuid::new_v4());

        let first = tokens.issue(&identity).unwrap();
        let second = tokens.issue(&identity).unwrap();

        assert_eq!(tokens.verify(&first).unwrap(), identity);
        assert_eq!(tokens.verify(&second).unwrap(), identity);
    }
}
