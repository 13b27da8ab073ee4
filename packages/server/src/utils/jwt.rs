use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Issuer stamped into and required from every token.
pub const ISSUER: &str = "tgphoto";

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// External identity of the caller.
    pub user_id: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Sign a bearer token for `user_id`, valid for `ttl_hours`.
pub fn sign(user_id: &str, secret: &str, ttl_hours: i64) -> Result<String> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::hours(ttl_hours))
        .context("token expiry out of range")?;

    let claims = Claims {
        user_id: user_id.to_owned(),
        iat: now.timestamp(),
        exp: expiration.timestamp(),
        iss: ISSUER.to_owned(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify signature, expiry and issuer, then decode the claims.
pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss"]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}
