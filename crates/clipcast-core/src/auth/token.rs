//! Signed bearer credential codec.
//!
//! Encodes (user id, role, email) into an HS256 JWT with expiry and decodes
//! it back, rejecting forged or expired tokens with
//! [`AppError::InvalidCredential`]. Stateless; no I/O.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Role;

/// JWT claims carried by a credential.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

/// The identity decoded from a valid credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub expires_at: i64,
}

/// Stateless credential codec.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
}

impl TokenCodec {
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours,
        }
    }

    /// Mint a credential for a user.
    pub fn issue(&self, user_id: Uuid, email: &str, role: Role) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role,
            exp: (now + Duration::hours(self.expiry_hours)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Decode and validate a credential (signature + expiry).
    pub fn decode(&self, token: &str) -> Result<Identity, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::InvalidCredential(e.to_string()))?;

        Ok(Identity {
            user_id: data.claims.sub,
            email: data.claims.email,
            role: data.claims.role,
            expires_at: data.claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-min-32-characters-long";

    #[test]
    fn round_trip_preserves_identity() {
        let codec = TokenCodec::new(SECRET, 24);
        let user_id = Uuid::new_v4();

        let token = codec.issue(user_id, "studio@example.com", Role::Studio).unwrap();
        let identity = codec.decode(&token).unwrap();

        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.email, "studio@example.com");
        assert_eq!(identity.role, Role::Studio);
        assert!(identity.expires_at > Utc::now().timestamp());
    }

    #[test]
    fn round_trip_preserves_each_role() {
        let codec = TokenCodec::new(SECRET, 24);
        for role in Role::ALL {
            let token = codec.issue(Uuid::new_v4(), "user@example.com", role).unwrap();
            assert_eq!(codec.decode(&token).unwrap().role, role);
        }
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = TokenCodec::new(SECRET, -1);
        let token = codec.issue(Uuid::new_v4(), "user@example.com", Role::Editor).unwrap();

        match codec.decode(&token) {
            Err(AppError::InvalidCredential(_)) => {}
            other => panic!("expected InvalidCredential, got {:?}", other.map(|i| i.email)),
        }
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let codec = TokenCodec::new(SECRET, 24);
        let forger = TokenCodec::new("another-secret-key-min-32-characters!!", 24);
        let token = forger.issue(Uuid::new_v4(), "user@example.com", Role::Studio).unwrap();

        assert!(matches!(
            codec.decode(&token),
            Err(AppError::InvalidCredential(_))
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let codec = TokenCodec::new(SECRET, 24);
        assert!(matches!(
            codec.decode("not-a-jwt"),
            Err(AppError::InvalidCredential(_))
        ));
    }
}
