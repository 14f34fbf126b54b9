use std::path::PathBuf;
use std::str::FromStr;

use stock_core::error::CoreError;

use crate::auth::jwt::JwtConfig;

/// Per-minute request ceilings enforced by the rate gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Ceiling for every route except sign-in.
    pub general_per_minute: u32,
    /// Stricter ceiling for `POST /users/signin`.
    pub sign_in_per_minute: u32,
}

/// Server configuration loaded from environment variables.
///
/// Values are read once at startup and never re-read while serving.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Postgres connection string.
    pub database_url: String,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, algorithm, expiry).
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    /// Root directory for uploaded assets.
    pub upload_dir: PathBuf,
    /// Default page size for list endpoints (default: `25`).
    pub page_size: i64,
    /// Largest accepted request body in bytes (default: 5 MiB).
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                    | Required | Default                  |
    /// |----------------------------|----------|--------------------------|
    /// | `HOST`                     | no       | `0.0.0.0`                |
    /// | `PORT`                     | no       | `3000`                   |
    /// | `DATABASE_URL`             | **yes**  | --                       |
    /// | `CORS_ORIGINS`             | no       | `http://localhost:3000`  |
    /// | `REQUEST_TIMEOUT_SECS`     | no       | `30`                     |
    /// | `REQUEST_PER_MINUTES`      | **yes**  | --                       |
    /// | `REQUEST_PER_MINUTES_AUTH` | **yes**  | --                       |
    /// | `UPLOAD_DIR`               | **yes**  | --                       |
    /// | `SIZE_PER_PAGE`            | no       | `25`                     |
    /// | `MAX_UPLOAD_BYTES`         | no       | `5242880`                |
    ///
    /// JWT variables are documented on [`JwtConfig::from_lookup`].
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;
        let database_url = required(&lookup, "DATABASE_URL")?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?;
        let jwt = JwtConfig::from_lookup(&lookup)?;

        let rate_limit = RateLimitConfig {
            general_per_minute: parse_required(&lookup, "REQUEST_PER_MINUTES")?,
            sign_in_per_minute: parse_required(&lookup, "REQUEST_PER_MINUTES_AUTH")?,
        };

        let upload_dir = PathBuf::from(required(&lookup, "UPLOAD_DIR")?);

        let page_size: i64 = parse_or(&lookup, "SIZE_PER_PAGE", 25)?;
        if page_size < 1 {
            return Err(CoreError::Configuration(
                "SIZE_PER_PAGE must be at least 1".into(),
            ));
        }

        let max_upload_bytes: usize = parse_or(&lookup, "MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?;

        Ok(Self {
            host,
            port,
            database_url,
            cors_origins,
            request_timeout_secs,
            jwt,
            rate_limit,
            upload_dir,
            page_size,
            max_upload_bytes,
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, CoreError> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| CoreError::Configuration(format!("{key} must be set")))
}

fn parse_required<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<T, CoreError> {
    parse_value(key, &required(lookup, key)?)
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, CoreError> {
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, CoreError> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::Configuration(format!("{key} has an invalid value '{raw}'")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/stock"),
            ("JWT_SECRET", "secret"),
            ("JWT_ALGORITHM", "HS256"),
            ("REQUEST_PER_MINUTES", "60"),
            ("REQUEST_PER_MINUTES_AUTH", "5"),
            ("UPLOAD_DIR", "/tmp/uploads"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<ServerConfig, CoreError> {
        ServerConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn applies_defaults() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.page_size, 25);
        assert_eq!(config.max_upload_bytes, 5_242_880);
        assert_eq!(
            config.rate_limit,
            RateLimitConfig {
                general_per_minute: 60,
                sign_in_per_minute: 5,
            }
        );
    }

    #[test]
    fn missing_required_value_is_a_configuration_error() {
        let mut env = base_env();
        env.remove("UPLOAD_DIR");
        assert_matches!(load(&env), Err(CoreError::Configuration(msg)) if msg.contains("UPLOAD_DIR"));
    }

    #[test]
    fn unparsable_value_is_a_configuration_error() {
        let mut env = base_env();
        env.insert("REQUEST_PER_MINUTES", "lots");
        assert_matches!(load(&env), Err(CoreError::Configuration(_)));

        let mut env = base_env();
        env.insert("PORT", "70000");
        assert_matches!(load(&env), Err(CoreError::Configuration(_)));
    }

    #[test]
    fn asymmetric_algorithm_is_refused() {
        let mut env = base_env();
        env.insert("JWT_ALGORITHM", "RS256");
        assert_matches!(load(&env), Err(CoreError::Configuration(_)));
    }

    #[test]
    fn splits_cors_origins() {
        let mut env = base_env();
        env.insert("CORS_ORIGINS", "https://a.example, https://b.example,");
        let config = load(&env).unwrap();
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn oversized_token_lifetime_is_a_configuration_error() {
        let mut env = base_env();
        env.insert("ACCESS_TOKEN_EXPIRE_MINUTES", "922337203685477580");
        assert_matches!(load(&env), Err(CoreError::Configuration(_)));
    }
}
