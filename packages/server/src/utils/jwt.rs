use anyhow::{Result, anyhow};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Permissions a token can carry.
pub const PAGE_EDIT: &str = "page:edit";
pub const PAGE_DELETE: &str = "page:delete";
pub const HEADER_EDIT: &str = "header:edit";

pub const ALL_PERMISSIONS: &[&str] = &[PAGE_EDIT, PAGE_DELETE, HEADER_EDIT];

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Editor name
    pub exp: usize,  // Expiration timestamp
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Sign a new HS256 token for an editor.
pub fn sign(subject: &str, permissions: &[String], secret: &str, ttl_days: i64) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(ttl_days))
        .ok_or_else(|| anyhow!("token lifetime of {ttl_days} days overflows"))?
        .timestamp();

    let claims = Claims {
        sub: subject.to_owned(),
        exp: expiration as usize,
        permissions: permissions.to_vec(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a JWT token.
pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
