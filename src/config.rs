use anyhow::Result;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub session_expiration_hours: i64,
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub client_base_url: String,
    pub admin_password: String,
    pub bcrypt_cost: u32,
    pub location_cache_ttl_seconds: u64,
    pub max_failed_pin_attempts: u32,
    pub pin_lockout_seconds: u64,
    pub allow_self_registration: bool,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_env_only()
    }

    /// Load configuration from environment variables only (without loading .env files)
    /// This is useful for testing where you want to control the environment directly
    pub fn from_env_only() -> Result<Self> {
        let config = Config {
            database_url: var_or("DATABASE_URL", "sqlite:./timeclock.db"),
            jwt_secret: var_or(
                "JWT_SECRET",
                "your-super-secret-jwt-key-change-this-in-production-12345",
            ),
            session_expiration_hours: parse_or("SESSION_EXPIRATION_HOURS", 12),
            host: var_or("HOST", "127.0.0.1"),
            port: parse_or("PORT", 8080),
            environment: var_or("ENVIRONMENT", "development"),
            client_base_url: var_or("BASE_URL", "http://localhost:3000"),
            admin_password: var_or("ADMIN_PASSWORD", "change-me"),
            bcrypt_cost: parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST),
            location_cache_ttl_seconds: parse_or("LOCATION_CACHE_TTL_SECONDS", 60),
            max_failed_pin_attempts: parse_or("MAX_FAILED_PIN_ATTEMPTS", 5),
            pin_lockout_seconds: parse_or("PIN_LOCKOUT_SECONDS", 900),
            allow_self_registration: parse_or("ALLOW_SELF_REGISTRATION", false),
        };

        if config.is_production() && config.admin_password == "change-me" {
            anyhow::bail!("ADMIN_PASSWORD must be set in production");
        }

        Ok(config)
    }

    /// Fixed configuration for tests: in-memory friendly values and the cheapest bcrypt cost.
    pub fn test_config() -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-jwt-secret-key-that-is-long-enough".to_string(),
            session_expiration_hours: 1,
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            client_base_url: "http://localhost:3000".to_string(),
            admin_password: "test-admin-password".to_string(),
            bcrypt_cost: 4,
            location_cache_ttl_seconds: 60,
            max_failed_pin_attempts: 3,
            pin_lockout_seconds: 900,
            allow_self_registration: false,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
