use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::{jwt::JwtKeys, sessions};
use crate::{error::ApiError, state::AppState, users::repo::User};

/// Extracts a `Bearer` token, verifies its signature and checks it against the
/// persisted allow-list. A valid signature alone is not enough: logout removes
/// the row and the token stops authenticating.
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or(ApiError::Unauthorized("Invalid Authorization header"))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::Unauthorized("Invalid or expired token")
        })?;

        if !sessions::exists(&state.db, claims.sub, token).await? {
            warn!(user_id = %claims.sub, "token not on allow-list");
            return Err(ApiError::Unauthorized("Session revoked"));
        }

        let user = User::find_by_id(&state.db, claims.sub)
            .await?
            .ok_or(ApiError::Unauthorized("Session revoked"))?;

        Ok(AuthSession {
            user,
            token: token.to_string(),
        })
    }
}
