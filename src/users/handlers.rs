use axum::{
    extract::{FromRef, Multipart, Path, State},
    http::{header, StatusCode},
    Json,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        extractors::AuthSession,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        sessions,
    },
    error::{is_unique_violation, ApiError},
    mail,
    state::AppState,
    users::{
        avatar,
        dto::{AuthResponse, CreateUserRequest, LoginRequest, UpdateUserRequest, UserResponse},
        repo::{self, User},
        validate::{check_age, check_password, is_valid_email},
    },
};

const ALLOWED_UPDATES: &[&str] = &["name", "email", "password", "age"];

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::bad_request("Invalid email"));
    }
    check_password(&payload.password).map_err(ApiError::bad_request)?;
    let age = payload.age.unwrap_or(0);
    check_age(age).map_err(ApiError::bad_request)?;

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, payload.name.trim(), &payload.email, &hash, age)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                warn!(email = %payload.email, "email already registered");
                ApiError::Conflict("Email already registered".into())
            } else {
                ApiError::Database(e)
            }
        })?;

    // Delivery is not awaited; a mail failure never fails the registration.
    mail::queue_welcome(state.mailer.clone(), user.email.clone(), user.name.clone());

    let token = JwtKeys::from_ref(&state).sign(user.id)?;
    sessions::insert(&state.db, user.id, &token).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    // The same rejection for unknown email and wrong password, so a caller
    // cannot probe which addresses are registered.
    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::Unauthorized("Invalid credentials")
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    let token = JwtKeys::from_ref(&state).sign(user.id)?;
    sessions::insert(&state.db, user.id, &token).await?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}

#[instrument(skip(state, session))]
pub async fn logout(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<StatusCode, ApiError> {
    sessions::remove(&state.db, session.user.id, &session.token).await?;
    info!(user_id = %session.user.id, "session revoked");
    Ok(StatusCode::OK)
}

#[instrument(skip(state, session))]
pub async fn logout_all(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<StatusCode, ApiError> {
    sessions::remove_all(&state.db, session.user.id).await?;
    info!(user_id = %session.user.id, "all sessions revoked");
    Ok(StatusCode::OK)
}

#[instrument(skip(session))]
pub async fn me(session: AuthSession) -> Json<UserResponse> {
    Json(session.user.into())
}

#[instrument(skip(state, session, body))]
pub async fn update_me(
    State(state): State<AppState>,
    session: AuthSession,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<UserResponse>, ApiError> {
    // Whole-request rejection on any key outside the allowed set. No field is
    // applied when another one is invalid.
    let keys = body
        .as_object()
        .ok_or_else(|| ApiError::bad_request("Invalid updates!"))?;
    if keys.keys().any(|k| !ALLOWED_UPDATES.contains(&k.as_str())) {
        return Err(ApiError::bad_request("Invalid updates!"));
    }
    let updates: UpdateUserRequest =
        serde_json::from_value(body).map_err(|_| ApiError::bad_request("Invalid updates!"))?;

    let mut user = session.user;
    if let Some(name) = updates.name {
        if name.trim().is_empty() {
            return Err(ApiError::bad_request("Name is required"));
        }
        user.name = name.trim().to_string();
    }
    if let Some(email) = updates.email {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(ApiError::bad_request("Invalid email"));
        }
        user.email = email;
    }
    if let Some(password) = updates.password {
        check_password(&password).map_err(ApiError::bad_request)?;
        user.password_hash = hash_password(&password)?;
    }
    if let Some(age) = updates.age {
        check_age(age).map_err(ApiError::bad_request)?;
        user.age = age;
    }

    let user = user.update(&state.db).await.map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::Conflict("Email already registered".into())
        } else {
            ApiError::Database(e)
        }
    })?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state, session))]
pub async fn delete_me(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<UserResponse>, ApiError> {
    let user = session.user;
    user.delete(&state.db).await?;

    mail::queue_cancellation(state.mailer.clone(), user.email.clone(), user.name.clone());

    info!(user_id = %user.id, "account deleted");
    Ok(Json(user.into()))
}

#[instrument(skip(state, session, multipart))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    session: AuthSession,
    mut multipart: Multipart,
) -> Result<StatusCode, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        if field.name() != Some("avatar") {
            continue;
        }
        let filename = field.file_name().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.to_string()))?;

        avatar::validate_upload(filename.as_deref(), data.len())
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        let png = avatar::normalize(&data).map_err(|e| ApiError::bad_request(e.to_string()))?;

        session.user.set_avatar(&state.db, &png).await?;
        info!(user_id = %session.user.id, bytes = png.len(), "avatar stored");
        return Ok(StatusCode::OK);
    }

    Err(ApiError::bad_request("avatar field is required"))
}

#[instrument(skip(state, session))]
pub async fn delete_avatar(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<StatusCode, ApiError> {
    session.user.clear_avatar(&state.db).await?;
    info!(user_id = %session.user.id, "avatar cleared");
    Ok(StatusCode::OK)
}

#[instrument(skip(state))]
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<([(header::HeaderName, &'static str); 1], Vec<u8>), ApiError> {
    let png = repo::fetch_avatar(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Avatar not found"))?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
