use crate::auth::authenticator::{DEFAULT_ISSUER, DEFAULT_SUBJECT};
use crate::auth::token::MIN_SECRET_LEN;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    // Redis
    pub redis_url: String,

    // Server
    pub bind_addr: SocketAddr,

    // Session tokens
    pub jwt_secret: String,
    pub token_issuer: String,
    pub token_subject: String,

    // Cookies
    pub cookie_secure: bool,

    // Challenge store
    pub store_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("redis_url", &"[REDACTED]")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"[REDACTED]")
            .field("token_issuer", &self.token_issuer)
            .field("token_subject", &self.token_subject)
            .field("cookie_secure", &self.cookie_secure)
            .field("store_timeout", &self.store_timeout)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        // (env vars may be set directly in production)
        let _ = dotenvy::dotenv();

        // Redis (required): holds the challenge messages
        let redis_url =
            env::var("REDIS_URL").map_err(|_| ConfigError::MissingVar("REDIS_URL".to_string()))?;

        // Server
        let bind_addr_str = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError("BIND_ADDR".to_string(), e.to_string()))?;

        // Session tokens: JWT_SECRET is required
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| ConfigError::MissingVar("JWT_SECRET".to_string()))?;

        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET".to_string(),
                format!("must be at least {} characters", MIN_SECRET_LEN),
            ));
        }

        let token_issuer = non_empty_or_default("TOKEN_ISSUER", DEFAULT_ISSUER)?;
        let token_subject = non_empty_or_default("TOKEN_SUBJECT", DEFAULT_SUBJECT)?;

        // Cookies
        let cookie_secure = parse_env_or_default("COOKIE_SECURE", false)?;

        // Challenge store
        let store_timeout_ms: u64 = parse_env_or_default("STORE_TIMEOUT_MS", 2_000)?;
        if store_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "STORE_TIMEOUT_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Config {
            redis_url,
            bind_addr,
            jwt_secret,
            token_issuer,
            token_subject,
            cookie_secure,
            store_timeout: Duration::from_millis(store_timeout_ms),
        })
    }
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}

fn non_empty_or_default(key: &str, default: &str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(val) if val.trim().is_empty() => Err(ConfigError::InvalidValue(
            key.to_string(),
            "cannot be empty".to_string(),
        )),
        Ok(val) => Ok(val),
        Err(_) => Ok(default.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Use a mutex to ensure tests run serially since they modify global env vars.
    // unwrap_or_else handles poison from prior panics.
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn lock_test() -> std::sync::MutexGuard<'static, ()> {
        TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
    }

    const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn clear_test_env() {
        env::remove_var("REDIS_URL");
        env::remove_var("BIND_ADDR");
        env::remove_var("JWT_SECRET");
        env::remove_var("TOKEN_ISSUER");
        env::remove_var("TOKEN_SUBJECT");
        env::remove_var("COOKIE_SECURE");
        env::remove_var("STORE_TIMEOUT_MS");
    }

    fn set_required() {
        env::set_var("REDIS_URL", "redis://127.0.0.1:6379");
        env::set_var("JWT_SECRET", TEST_SECRET);
    }

    #[test]
    fn test_parse_env_or_default() {
        let _guard = lock_test();

        env::set_var("TEST_U64", "12345");
        let result: Result<u64, ConfigError> = parse_env_or_default("TEST_U64", 100);
        assert_eq!(result.unwrap(), 12345);

        env::remove_var("TEST_U64");
        let result: Result<u64, ConfigError> = parse_env_or_default("TEST_U64", 100);
        assert_eq!(result.unwrap(), 100);
    }

    #[test]
    fn test_config_defaults() {
        let _guard = lock_test();
        clear_test_env();

        set_required();
        // Override any .env value to keep the expectation predictable
        env::set_var("BIND_ADDR", "0.0.0.0:3000");

        let config = Config::from_env().unwrap();

        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(config.jwt_secret, TEST_SECRET);
        assert_eq!(config.token_issuer, "IDHub IdP");
        assert_eq!(config.token_subject, "IDHub identity is all your life");
        assert!(!config.cookie_secure);
        assert_eq!(config.store_timeout, Duration::from_millis(2_000));

        clear_test_env();
    }

    #[test]
    fn test_short_jwt_secret() {
        let _guard = lock_test();
        clear_test_env();

        set_required();
        env::set_var("JWT_SECRET", "too-short");

        let result = Config::from_env();
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue(ref s, _) if s == "JWT_SECRET"
        ));

        clear_test_env();
    }

    #[test]
    fn test_invalid_socket_addr() {
        let _guard = lock_test();
        clear_test_env();

        set_required();
        env::set_var("BIND_ADDR", "invalid_address");

        let result = Config::from_env();
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_, _)));

        clear_test_env();
    }

    #[test]
    fn test_cookie_secure_parsing() {
        let _guard = lock_test();
        clear_test_env();

        set_required();
        env::set_var("COOKIE_SECURE", "true");
        assert!(Config::from_env().unwrap().cookie_secure);

        env::set_var("COOKIE_SECURE", "yes");
        assert!(matches!(
            Config::from_env().unwrap_err(),
            ConfigError::ParseError(ref s, _) if s == "COOKIE_SECURE"
        ));

        clear_test_env();
    }

    #[test]
    fn test_zero_store_timeout() {
        let _guard = lock_test();
        clear_test_env();

        set_required();
        env::set_var("STORE_TIMEOUT_MS", "0");

        assert!(matches!(
            Config::from_env().unwrap_err(),
            ConfigError::InvalidValue(ref s, _) if s == "STORE_TIMEOUT_MS"
        ));

        clear_test_env();
    }

    #[test]
    fn test_empty_issuer_rejected() {
        let _guard = lock_test();
        clear_test_env();

        set_required();
        env::set_var("TOKEN_ISSUER", "  ");

        assert!(matches!(
            Config::from_env().unwrap_err(),
            ConfigError::InvalidValue(ref s, _) if s == "TOKEN_ISSUER"
        ));

        clear_test_env();
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let _guard = lock_test();
        clear_test_env();

        set_required();
        let debug = format!("{:?}", Config::from_env().unwrap());
        assert!(!debug.contains(TEST_SECRET));
        assert!(!debug.contains("redis://"));

        clear_test_env();
    }
}
