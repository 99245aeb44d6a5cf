use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use guestbook_types::api::Claims;

/// Authenticated owner behind a verified bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid credential: {0}")]
pub struct TokenError(#[from] jsonwebtoken::errors::Error);

/// Issues and verifies HS256 credentials. Key material and issuer are
/// supplied at construction.
#[derive(Clone)]
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl TokenAuthority {
    pub fn new(secret: &[u8], issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
            ttl,
        }
    }

    pub fn issue(&self, user_id: Uuid, username: &str) -> anyhow::Result<String> {
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            iss: self.issuer.clone(),
            exp: (Utc::now() + self.ttl).timestamp() as usize,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(Identity {
            user_id: data.claims.sub,
            username: data.claims.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authority(secret: &str, issuer: &str) -> TokenAuthority {
        TokenAuthority::new(secret.as_bytes(), issuer, Duration::days(1))
    }

    #[test]
    fn issued_token_verifies_to_same_identity() {
        let tokens = authority("s3cret", "guestbook");
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id, "alice").unwrap();

        let identity = tokens.verify(&token).unwrap();
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.username, "alice");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = authority("one", "guestbook").issue(Uuid::new_v4(), "alice").unwrap();
        assert!(authority("two", "guestbook").verify(&token).is_err());
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let token = authority("same", "other-site").issue(Uuid::new_v4(), "alice").unwrap();
        assert!(authority("same", "guestbook").verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = TokenAuthority::new(b"s3cret", "guestbook", Duration::hours(-2));
        let token = tokens.issue(Uuid::new_v4(), "alice").unwrap();
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(authority("s3cret", "guestbook").verify("not-a-jwt").is_err());
    }
}
