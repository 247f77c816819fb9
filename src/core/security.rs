use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::Settings;

#[derive(Debug, Error)]
pub(crate) enum SecurityError {
    #[cfg(test)]
    #[error("jwt encoding failed")]
    JwtEncoding,
    #[error("jwt decoding failed")]
    JwtDecoding,
    #[error("token subject is not a user id: {0}")]
    InvalidSubject(String),
    #[error("unsupported jwt algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub(crate) sub: String,
    pub(crate) exp: i64,
}

impl Claims {
    pub(crate) fn user_id(&self) -> Result<i64, SecurityError> {
        self.sub.parse::<i64>().map_err(|_| SecurityError::InvalidSubject(self.sub.clone()))
    }
}

pub(crate) fn verify_token(token: &str, settings: &Settings) -> Result<Claims, SecurityError> {
    let algorithm = algorithm_from_settings(settings)?;
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = true;
    validation.required_spec_claims.insert("exp".to_string());
    validation.required_spec_claims.insert("sub".to_string());

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.security().secret_key.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| SecurityError::JwtDecoding)
}

/// Tokens are issued by the identity service; this exists so tests can act as a user.
#[cfg(test)]
pub(crate) fn create_access_token(
    user_id: i64,
    settings: &Settings,
    expires_in: time::Duration,
) -> Result<String, SecurityError> {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let algorithm = algorithm_from_settings(settings)?;
    let expire = time::OffsetDateTime::now_utc() + expires_in;
    let claims = Claims { sub: user_id.to_string(), exp: expire.unix_timestamp() };

    encode(
        &Header::new(algorithm),
        &claims,
        &EncodingKey::from_secret(settings.security().secret_key.as_bytes()),
    )
    .map_err(|_| SecurityError::JwtEncoding)
}

fn algorithm_from_settings(settings: &Settings) -> Result<Algorithm, SecurityError> {
    match settings.security().algorithm.as_str() {
        "HS256" => Ok(Algorithm::HS256),
        other => Err(SecurityError::UnsupportedAlgorithm(other.to_string())),
    }
}
