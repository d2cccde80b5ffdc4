use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::Role;
use crate::services::Actor;

use super::error::ApiError;
use super::AppState;

// ============================================================================
// Bearer-token Authentication
// ============================================================================
//
// Identity arrives as an HS256-signed JWT issued by the identity service.
// This layer only verifies and extracts; role checks happen per operation in
// the services.
//
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    pub role: Role,
    /// Expiry as a unix timestamp, validated by the decoder.
    pub exp: usize,
}

/// Extractor wrapping the verified principal.
#[derive(Debug, Clone, Copy)]
pub struct AuthedUser(pub Actor);

impl FromRequest for AuthedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, ApiError>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_actor(req).map(AuthedUser))
    }
}

fn extract_actor(req: &HttpRequest) -> Result<Actor, ApiError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or(ApiError::Internal)?;

    let header = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Expected a Bearer token".into()))?;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|error| {
        tracing::debug!(error = %error, "token verification failed");
        ApiError::Unauthorized("Invalid or expired token".into())
    })?;

    Ok(Actor {
        id: data.claims.sub,
        role: data.claims.role,
    })
}

#[cfg(test)]
pub(crate) fn issue_token(secret: &str, actor: &Actor) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        sub: actor.id,
        role: actor.role,
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
