//! Resolve a bearer token to the live user it names.
//!
//! Resolution fails closed: a bad token, an unusable subject and a subject
//! with no matching user all produce the same [`CoreError::InvalidCredential`].

use stock_core::error::CoreError;
use stock_core::types::DbId;
use stock_db::models::user::{User, UserResponse};
use stock_db::UserStore;

use crate::auth::jwt::{validate_token, JwtConfig};
use crate::error::{AppError, AppResult};

/// The caller behind a validated token. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub id: DbId,
    pub name: String,
    pub email: String,
    /// Stored avatar name, empty when the user has none.
    pub avatar: String,
}

impl From<User> for AuthenticatedIdentity {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            avatar: user.avatar,
        }
    }
}

impl From<AuthenticatedIdentity> for UserResponse {
    fn from(identity: AuthenticatedIdentity) -> Self {
        Self {
            id: identity.id,
            name: identity.name,
            email: identity.email,
            avatar: identity.avatar,
        }
    }
}

/// Validate `token` and load the user its subject refers to.
///
/// A lookup failure in the store is reported as a database error, not as an
/// authentication failure.
pub async fn resolve(
    token: &str,
    config: &JwtConfig,
    users: &dyn UserStore,
) -> AppResult<AuthenticatedIdentity> {
    let claims = validate_token(token, config)?;

    let user_id: DbId = claims.sub.parse().map_err(|_| {
        tracing::debug!(sub = %claims.sub, "Access token rejected: unusable subject");
        CoreError::InvalidCredential
    })?;

    let user = users
        .find_by_subject(user_id)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| {
            tracing::debug!(user_id, "Access token rejected: unknown subject");
            CoreError::InvalidCredential
        })?;

    Ok(user.into())
}
