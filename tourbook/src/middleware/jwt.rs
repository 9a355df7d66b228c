//! JWT validation

use jsonwebtoken::{decode, DecodingKey, Validation};
use std::sync::Arc;

use super::token::Claims;
use crate::{auth::tokens::parse_algorithm, config::JwtConfig, error::Error};

/// Validates tokens issued by [`JwtGenerator`](crate::auth::JwtGenerator)
#[derive(Clone)]
pub struct JwtAuth {
    decoding_key: Arc<DecodingKey>,
    validation: Validation,
}

impl JwtAuth {
    /// Create a validator for the configured secret and algorithm
    pub fn new(config: &JwtConfig) -> Result<Self, Error> {
        let algorithm = parse_algorithm(&config.algorithm)?;

        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        if let Some(audience) = &config.audience {
            validation.set_audience(&[audience]);
        }

        Ok(Self {
            decoding_key: Arc::new(DecodingKey::from_secret(config.secret.as_bytes())),
            validation,
        })
    }

    /// Validate a token and extract claims
    ///
    /// Bad signatures and expired tokens fail with [`Error::Jwt`].
    pub fn validate_token(&self, token: &str) -> Result<Claims, Error> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}
