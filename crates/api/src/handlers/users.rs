//! Handlers for the `/users` resource (signup, signin, profile, avatar).

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use stock_core::assets::AssetCategory;
use stock_core::error::CoreError;
use stock_db::models::user::{CreateUser, UpdateUser, UserResponse};
use validator::Validate;

use crate::assets::multipart::read_file_field;
use crate::assets::replace::{replace_asset, UserAvatar};
use crate::auth::jwt::generate_access_token;
use crate::auth::password::{
    hash_password_blocking, validate_password_strength, verify_password_blocking,
    DUMMY_PASSWORD_HASH, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::handlers::{asset_response, validate_input};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Multipart field carrying the avatar image.
pub const AVATAR_FIELD: &str = "avatar";

/// Message for any failed sign-in, whichever part was wrong.
const INVALID_CREDENTIALS: &str = "Invalid credentials";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /users/signup`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Form body for `POST /users/signin` (OAuth2 password flow field names).
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    /// The account e-mail.
    pub username: String,
    pub password: String,
}

/// Request body for `PUT /users`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/users/signup
pub async fn sign_up(
    State(state): State<AppState>,
    Json(input): Json<SignUpRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    validate_input(&input)?;
    check_new_password(&input.password, &input.confirm_password)?;

    if state
        .users
        .find_by_credential_key(&input.email)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::Conflict(
            "E-mail already exists".into(),
        )));
    }

    let password_hash = hash_password_blocking(input.password).await?;
    let user = state
        .users
        .create_user(&CreateUser {
            name: input.name,
            email: input.email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = user.id, "User signed up");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /api/v1/users/signin
///
/// Exchange e-mail + password for a bearer access token.
pub async fn sign_in(
    State(state): State<AppState>,
    Form(input): Form<SignInForm>,
) -> AppResult<Json<TokenResponse>> {
    let Some(user) = state.users.find_by_credential_key(&input.username).await? else {
        // Same Argon2 cost as a known e-mail.
        verify_password_blocking(input.password, DUMMY_PASSWORD_HASH.to_string()).await?;
        tracing::debug!("Sign-in rejected: unknown e-mail");
        return Err(AppError::BadRequest(INVALID_CREDENTIALS.into()));
    };

    if !verify_password_blocking(input.password, user.password_hash).await? {
        tracing::debug!(user_id = user.id, "Sign-in rejected: wrong password");
        return Err(AppError::BadRequest(INVALID_CREDENTIALS.into()));
    }

    let access_token = generate_access_token(user.id, &state.config.jwt)?;

    tracing::info!(user_id = user.id, "User signed in");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

/// GET /api/v1/users/me
pub async fn me(AuthUser(identity): AuthUser) -> Json<UserResponse> {
    Json(identity.into())
}

/// GET /api/v1/users/file
///
/// Stream the caller's avatar, or 204 when they have none.
pub async fn avatar(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> AppResult<Response> {
    let asset = state
        .assets
        .open(&identity.avatar, AssetCategory::Users)
        .await?;
    asset_response(asset)
}

/// PUT /api/v1/users
///
/// Replace the caller's name and password.
pub async fn update(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(input): Json<UpdateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    validate_input(&input)?;
    check_new_password(&input.password, &input.confirm_password)?;

    let password_hash = hash_password_blocking(input.password).await?;
    let user = state
        .users
        .update_user(
            identity.id,
            &UpdateUser {
                name: input.name,
                password_hash,
            },
        )
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: identity.id,
        })?;

    tracing::info!(user_id = user.id, "User updated");
    Ok((StatusCode::ACCEPTED, Json(user.into())))
}

/// PATCH /api/v1/users
///
/// Upload a new avatar (multipart field `avatar`), replacing any previous one.
pub async fn upload_avatar(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let upload = read_file_field(&mut multipart, AVATAR_FIELD).await?;
    let slot = UserAvatar {
        users: state.users.as_ref(),
        user_id: identity.id,
    };

    let user = replace_asset(&state.assets, &state.upload_locks, &slot, &upload).await?;
    Ok((StatusCode::ACCEPTED, Json(user.into())))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_new_password(password: &str, confirm_password: &str) -> AppResult<()> {
    if password != confirm_password {
        return Err(AppError::BadRequest("Passwords do not match".into()));
    }
    validate_password_strength(password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))
}
