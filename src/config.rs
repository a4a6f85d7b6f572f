use std::env;

/// Prefix under which every JSON endpoint is mounted.
pub const API_V1_STR: &str = "/api/v1";

const LOCAL_SECRET_KEY: &str = "super-secure-test-secret-value-local";
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 8;

/// AppConfig
///
/// Holds the application's entire configuration state. Immutable once loaded and
/// shared with every handler through `FromRef`, alongside the repository.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` only in local mode, where the in-memory store is used.
    pub db_url: Option<String>,
    // Runtime environment marker. Controls log format, secrets policy and sample data.
    pub env: Env,
    // HMAC secret used to sign and verify access tokens.
    pub secret_key: String,
    // Lifetime of tokens issued by the login endpoints.
    pub access_token_expire_minutes: i64,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Bootstrap administrator, created at startup when missing.
    pub first_admin_email: Option<String>,
    pub first_admin_password: Option<String>,
}

/// Env
///
/// Defines the runtime context: local development or hardened production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking configuration used for test state scaffolding.
    fn default() -> Self {
        Self {
            db_url: None,
            env: Env::Local,
            secret_key: LOCAL_SECRET_KEY.to_string(),
            access_token_expire_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            bind_addr: "127.0.0.1:0".to_string(),
            first_admin_email: Some("admin@example.com".to_string()),
            first_admin_password: Some("adminpassword".to_string()),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables and implements the **fail-fast** principle.
    ///
    /// # Panics
    /// Panics if a variable required for the current environment is missing (`SECRET_KEY` and
    /// `DATABASE_URL` in production), or if `ACCESS_TOKEN_EXPIRE_MINUTES` is not an integer.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let access_token_expire_minutes = match env::var("ACCESS_TOKEN_EXPIRE_MINUTES") {
            Ok(raw) => raw
                .parse()
                .expect("FATAL: ACCESS_TOKEN_EXPIRE_MINUTES must be an integer"),
            Err(_) => DEFAULT_TOKEN_TTL_MINUTES,
        };
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        match env {
            Env::Local => Self {
                env: Env::Local,
                // Without a database locally we fall back to the in-memory store.
                db_url: env::var("DATABASE_URL").ok(),
                secret_key: env::var("SECRET_KEY").unwrap_or_else(|_| LOCAL_SECRET_KEY.to_string()),
                access_token_expire_minutes,
                bind_addr,
                first_admin_email: Some(
                    env::var("FIRST_ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string()),
                ),
                first_admin_password: Some(
                    env::var("FIRST_ADMIN_PASSWORD").unwrap_or_else(|_| "adminpassword".to_string()),
                ),
            },
            Env::Production => Self {
                env: Env::Production,
                db_url: Some(env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod")),
                secret_key: env::var("SECRET_KEY").expect("FATAL: SECRET_KEY must be set in production."),
                access_token_expire_minutes,
                bind_addr,
                // Production only bootstraps an admin when both values are given explicitly.
                first_admin_email: env::var("FIRST_ADMIN_EMAIL").ok(),
                first_admin_password: env::var("FIRST_ADMIN_PASSWORD").ok(),
            },
        }
    }
}
