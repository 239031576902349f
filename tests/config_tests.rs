use pretty_assertions::assert_eq;
use serial_test::serial;
use std::env;

use timeclock::config::Config;

const KEYS: [&str; 13] = [
    "DATABASE_URL",
    "JWT_SECRET",
    "SESSION_EXPIRATION_HOURS",
    "HOST",
    "PORT",
    "ENVIRONMENT",
    "BASE_URL",
    "ADMIN_PASSWORD",
    "BCRYPT_COST",
    "LOCATION_CACHE_TTL_SECONDS",
    "MAX_FAILED_PIN_ATTEMPTS",
    "PIN_LOCKOUT_SECONDS",
    "ALLOW_SELF_REGISTRATION",
];

// Clears the config keys for the duration of a test and restores them afterwards.
struct EnvGuard(Vec<(&'static str, Option<String>)>);

impl EnvGuard {
    fn clear() -> Self {
        let saved = KEYS.iter().map(|k| (*k, env::var(k).ok())).collect();
        for key in KEYS {
            unsafe { env::remove_var(key) };
        }
        EnvGuard(saved)
    }

    fn set(&self, key: &str, value: &str) {
        unsafe { env::set_var(key, value) };
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.0 {
            match value {
                Some(v) => unsafe { env::set_var(key, v) },
                None => unsafe { env::remove_var(key) },
            }
        }
    }
}

#[test]
#[serial]
fn test_config_defaults() {
    let _env = EnvGuard::clear();

    let config = Config::from_env_only().unwrap();

    assert_eq!(config.database_url, "sqlite:./timeclock.db");
    assert_eq!(config.session_expiration_hours, 12);
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 8080);
    assert_eq!(config.environment, "development");
    assert_eq!(config.client_base_url, "http://localhost:3000");
    assert_eq!(config.admin_password, "change-me");
    assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
    assert_eq!(config.location_cache_ttl_seconds, 60);
    assert_eq!(config.max_failed_pin_attempts, 5);
    assert_eq!(config.pin_lockout_seconds, 900);
    assert!(!config.allow_self_registration);
    assert!(config.is_development());
    assert_eq!(config.server_address(), "127.0.0.1:8080");
}

#[test]
#[serial]
fn test_config_custom_values() {
    let env = EnvGuard::clear();
    env.set("DATABASE_URL", "sqlite:./custom.db");
    env.set("JWT_SECRET", "custom-secret");
    env.set("SESSION_EXPIRATION_HOURS", "8");
    env.set("HOST", "0.0.0.0");
    env.set("PORT", "3000");
    env.set("ENVIRONMENT", "production");
    env.set("ADMIN_PASSWORD", "s3cret-admin");
    env.set("BCRYPT_COST", "6");
    env.set("MAX_FAILED_PIN_ATTEMPTS", "10");
    env.set("ALLOW_SELF_REGISTRATION", "true");

    let config = Config::from_env_only().unwrap();

    assert_eq!(config.database_url, "sqlite:./custom.db");
    assert_eq!(config.jwt_secret, "custom-secret");
    assert_eq!(config.session_expiration_hours, 8);
    assert_eq!(config.server_address(), "0.0.0.0:3000");
    assert!(config.is_production());
    assert_eq!(config.admin_password, "s3cret-admin");
    assert_eq!(config.bcrypt_cost, 6);
    assert_eq!(config.max_failed_pin_attempts, 10);
    assert!(config.allow_self_registration);
}

#[test]
#[serial]
fn test_config_unparseable_numbers_fall_back() {
    let env = EnvGuard::clear();
    env.set("PORT", "not-a-port");
    env.set("SESSION_EXPIRATION_HOURS", "");

    let config = Config::from_env_only().unwrap();

    assert_eq!(config.port, 8080);
    assert_eq!(config.session_expiration_hours, 12);
}

#[test]
#[serial]
fn test_production_requires_admin_password() {
    let env = EnvGuard::clear();
    env.set("ENVIRONMENT", "production");

    assert!(Config::from_env_only().is_err());
}
