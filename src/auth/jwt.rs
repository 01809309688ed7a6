//! JWT bearer token verification

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::types::{AtriumError, Result};

/// User role carried in token claims and on authored content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Expert,
    #[default]
    Client,
    /// Unknown role strings decode here instead of failing the document
    #[serde(other)]
    Other,
}

/// Verified requester identity
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub role: Role,
}

/// Token claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    /// Expiry (seconds since epoch)
    pub exp: u64,
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    // Reject obviously truncated tokens before hitting the verifier
    if token.len() < 10 {
        None
    } else {
        Some(token)
    }
}

/// HS256 token verifier
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify a bearer token and return the requester identity
    pub fn verify(&self, token: &str) -> Result<AuthUser> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| AtriumError::Auth(format!("Invalid token: {}", e)))?;

        Ok(AuthUser {
            uid: data.claims.sub,
            email: data.claims.email,
            role: data.claims.role,
        })
    }
}
