use crate::error::{AppError, AppResult};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims issued by the hosted auth service. Only `sub` and `exp` are relied on.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // auth user id
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub role: Option<String>, // "authenticated", not the app role
}

/// Identity attached to a request after the bearer token checks out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Verifies tokens only; minting is left to the hosted auth service.
#[derive(Clone)]
pub struct JwtService {
    decoding_key: DecodingKey,
    #[cfg(test)]
    encoding_key: jsonwebtoken::EncodingKey,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            #[cfg(test)]
            encoding_key: jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Mints a token the same shape as the hosted service.
    #[cfg(test)]
    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        expires_in: i64,
    ) -> AppResult<String> {
        use chrono::{Duration, Utc};
        use jsonwebtoken::{Header, encode};

        let now = Utc::now();
        let exp = now + Duration::seconds(expires_in);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.map(str::to_string),
            exp: exp.timestamp(),
            iat: Some(now.timestamp()),
            role: Some("authenticated".to_string()),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AppError::JwtError)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // hosted tokens carry aud = "authenticated"
        validation.validate_aud = false;
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)
    }

    pub fn verify_access_token(&self, token: &str) -> AppResult<AuthUser> {
        let claims = self.verify_token(token)?;
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))?;

        Ok(AuthUser {
            id,
            email: claims.email,
        })
    }
}
