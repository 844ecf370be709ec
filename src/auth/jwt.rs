use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use crate::error::{AppError, AppResult};
use crate::models::Claims;

/// Tokens are issued elsewhere; this service only verifies them.
pub fn verify_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "Bearer token rejected");
        AppError::Unauthenticated("Invalid or expired token".into())
    })
}
