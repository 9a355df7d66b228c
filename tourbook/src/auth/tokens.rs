//! JWT token generation
//!
//! Tokens are signed with the configured HMAC secret and validated by
//! [`JwtAuth`](crate::middleware::JwtAuth).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use crate::config::JwtConfig;
use crate::error::Error;
use crate::middleware::Claims;

/// JWT token generator
#[derive(Clone)]
pub struct JwtGenerator {
    encoding_key: Arc<EncodingKey>,
    algorithm: Algorithm,
    lifetime: Duration,
    issuer: Option<String>,
    audience: Option<String>,
}

impl JwtGenerator {
    /// Create a new JWT generator from configuration
    pub fn new(config: &JwtConfig) -> Result<Self, Error> {
        let algorithm = parse_algorithm(&config.algorithm)?;
        Ok(Self {
            encoding_key: Arc::new(EncodingKey::from_secret(config.secret.as_bytes())),
            algorithm,
            lifetime: Duration::from_secs(config.expires_in_secs),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        })
    }

    /// Lifetime of issued tokens
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issue a token for `user_id` carrying `role`
    pub fn generate(&self, user_id: &str, role: &str) -> Result<String, Error> {
        self.generate_with_expiry(user_id, role, self.lifetime)
    }

    /// Issue a token with a custom lifetime
    pub fn generate_with_expiry(
        &self,
        user_id: &str,
        role: &str,
        expires_in: Duration,
    ) -> Result<String, Error> {
        let now = Utc::now().timestamp();
        let lifetime = i64::try_from(expires_in.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user_id.to_string(),
            roles: vec![role.to_string()],
            exp: now.saturating_add(lifetime),
            iat: now,
            jti: Some(uuid::Uuid::new_v4().to_string()),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let header = Header::new(self.algorithm);
        encode(&header, &claims, &self.encoding_key).map_err(|e| Error::Jwt(Box::new(e)))
    }
}

/// Map a configured algorithm name to an HMAC algorithm
pub(crate) fn parse_algorithm(alg: &str) -> Result<Algorithm, Error> {
    match alg.to_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        _ => Err(Error::Config(Box::new(figment::Error::from(format!(
            "Unsupported JWT algorithm: {}",
            alg
        ))))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-for-tokens".into(),
            expires_in_secs: 3600,
            ..Default::default()
        }
    }

    #[test]
    fn test_generate_carries_claims() {
        let generator = JwtGenerator::new(&config()).unwrap();
        let token = generator.generate("user-1", "guide").unwrap();

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret-for-tokens"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        assert_eq!(data.claims.sub, "user-1");
        assert_eq!(data.claims.roles, vec!["guide".to_string()]);
        assert_eq!(data.claims.exp - data.claims.iat, 3600);
        assert!(data.claims.jti.is_some());
    }

    #[test]
    fn test_tokens_are_unique() {
        let generator = JwtGenerator::new(&config()).unwrap();
        let a = generator.generate("user-1", "user").unwrap();
        let b = generator.generate("user-1", "user").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!(parse_algorithm("hs512").unwrap(), Algorithm::HS512);
        assert!(matches!(parse_algorithm("RS256"), Err(Error::Config(_))));
    }
}
