//! Access-token issuing and validation.
//!
//! Access tokens are HMAC-signed JWTs carrying a [`Claims`] payload. The
//! signing algorithm is fixed by configuration and is the only one accepted
//! when decoding, so a token cannot pick its own algorithm.

use std::str::FromStr;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use stock_core::error::CoreError;
use stock_core::types::DbId;

/// Value of the `type` claim on every access token.
pub const ACCESS_TOKEN_TYPE: &str = "access_token";

/// Default access token lifetime: 7 days.
pub const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 7 * 24 * 60;

/// Longest accepted access token lifetime: 365 days.
pub const MAX_ACCESS_EXPIRY_MINS: i64 = 365 * 24 * 60;

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Always [`ACCESS_TOKEN_TYPE`].
    #[serde(rename = "type")]
    pub token_type: String,
    /// Subject -- the user's internal database id, rendered as a string.
    pub sub: String,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret used to sign and verify tokens.
    pub secret: String,
    /// Signing algorithm. Always one of the HMAC family.
    pub algorithm: Algorithm,
    /// Access token lifetime in minutes (default: 7 days).
    pub access_token_expiry_mins: i64,
}

impl JwtConfig {
    /// Load JWT configuration through `lookup` (usually the process env).
    ///
    /// | Env Var                        | Required | Default  |
    /// |--------------------------------|----------|----------|
    /// | `JWT_SECRET`                   | **yes**  | --       |
    /// | `JWT_ALGORITHM`                | **yes**  | --       |
    /// | `ACCESS_TOKEN_EXPIRE_MINUTES`  | no       | `10080`  |
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CoreError::Configuration("JWT_SECRET must be set".into()))?;

        let algorithm = lookup("JWT_ALGORITHM")
            .ok_or_else(|| CoreError::Configuration("JWT_ALGORITHM must be set".into()))
            .and_then(|name| parse_algorithm(&name))?;

        let access_token_expiry_mins = match lookup("ACCESS_TOKEN_EXPIRE_MINUTES") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|m| (1..=MAX_ACCESS_EXPIRY_MINS).contains(m))
                .ok_or_else(|| {
                    CoreError::Configuration(format!(
                        "ACCESS_TOKEN_EXPIRE_MINUTES must be between 1 and {MAX_ACCESS_EXPIRY_MINS}"
                    ))
                })?,
            None => DEFAULT_ACCESS_EXPIRY_MINS,
        };

        Ok(Self {
            secret,
            algorithm,
            access_token_expiry_mins,
        })
    }
}

/// Parse a configured algorithm name, accepting only HS256/HS384/HS512.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, CoreError> {
    let algorithm = Algorithm::from_str(name.trim())
        .map_err(|_| CoreError::Configuration(format!("Unknown JWT algorithm '{name}'")))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => Err(CoreError::Configuration(format!(
            "JWT algorithm {other:?} needs a key pair; only HS256, HS384 and HS512 are supported"
        ))),
    }
}

/// Generate an access token for the given user, issued now.
pub fn generate_access_token(user_id: DbId, config: &JwtConfig) -> Result<String, CoreError> {
    generate_access_token_at(user_id, chrono::Utc::now().timestamp(), config)
}

/// Generate an access token as if issued at `issued_at` (Unix seconds).
pub fn generate_access_token_at(
    user_id: DbId,
    issued_at: i64,
    config: &JwtConfig,
) -> Result<String, CoreError> {
    let exp = config
        .access_token_expiry_mins
        .checked_mul(60)
        .and_then(|ttl| issued_at.checked_add(ttl))
        .ok_or_else(|| CoreError::Internal("Access token expiry overflows".into()))?;

    let claims = Claims {
        token_type: ACCESS_TOKEN_TYPE.to_string(),
        sub: user_id.to_string(),
        iat: issued_at,
        exp,
    };

    encode(
        &Header::new(config.algorithm),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| CoreError::Internal(format!("Token encoding error: {e}")))
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Checks the signature with the configured algorithm only, requires
/// `exp > now` with no leeway and requires the access-token type. Every
/// failure is [`CoreError::InvalidCredential`]; the reason is only logged.
pub fn validate_token(token: &str, config: &JwtConfig) -> Result<Claims, CoreError> {
    validate_token_at(token, config, chrono::Utc::now().timestamp())
}

/// [`validate_token`] against an explicit clock reading (Unix seconds).
pub fn validate_token_at(token: &str, config: &JwtConfig, now: i64) -> Result<Claims, CoreError> {
    let mut validation = Validation::new(config.algorithm);
    validation.leeway = 0;
    // Expiry is checked below against `now`.
    validation.validate_exp = false;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "Access token rejected");
        CoreError::InvalidCredential
    })?
    .claims;

    if claims.exp <= now {
        tracing::debug!(exp = claims.exp, "Access token rejected: expired");
        return Err(CoreError::InvalidCredential);
    }

    if claims.token_type != ACCESS_TOKEN_TYPE {
        tracing::debug!(token_type = %claims.token_type, "Access token rejected: wrong type");
        return Err(CoreError::InvalidCredential);
    }

    Ok(claims)
}
