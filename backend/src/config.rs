use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;

const DEV_TOKEN_SECRET: &str = "dev-order-token-secret";

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Database connection string.
    pub database_url: String,

    /// Address the HTTP server binds to.
    pub bind_addr: String,

    /// Shared secret for per-order access tokens.
    ///
    /// Tokens are issued by the ordering flow and handed to the customer;
    /// this service only verifies them.
    pub order_token_secret: String,

    pub estimator: EstimatorConfig,
}

/// Tunables for the wait-time estimator and its prep-time cache.
#[derive(Clone, Debug)]
pub struct EstimatorConfig {
    /// Lifetime of a cached base prep figure, measured from write.
    pub cache_ttl: Duration,

    /// Entry count above which the whole cache is reset.
    ///
    /// Not LRU. A burst of recomputation after the reset is accepted in
    /// exchange for a hard memory ceiling.
    pub cache_max_entries: usize,

    /// Base prep minutes used when a merchant has too little history.
    pub default_base_minutes: i64,

    /// How many recent completed orders are sampled.
    pub sample_limit: usize,

    /// Zone used when a merchant's timezone name does not resolve.
    pub default_timezone: Tz,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(120),
            cache_max_entries: 500,
            default_base_minutes: 20,
            sample_limit: 60,
            default_timezone: Tz::UTC,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://order_eta_dev.db?mode=rwc".to_string());

        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let order_token_secret = match std::env::var("ORDER_TOKEN_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                tracing::warn!("ORDER_TOKEN_SECRET not set; using development secret");
                DEV_TOKEN_SECRET.to_string()
            }
        };

        let defaults = EstimatorConfig::default();
        let estimator = EstimatorConfig {
            cache_ttl: Duration::from_secs(env_or("PREP_CACHE_TTL_SECS", 120)),
            cache_max_entries: env_or("PREP_CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            default_base_minutes: env_or("DEFAULT_BASE_PREP_MINUTES", defaults.default_base_minutes),
            sample_limit: env_or("PREP_SAMPLE_LIMIT", defaults.sample_limit),
            default_timezone: env_or("DEFAULT_TIMEZONE", defaults.default_timezone),
        };

        Self {
            database_url,
            bind_addr,
            order_token_secret,
            estimator,
        }
    }
}

/// Reads and parses `key`, falling back to `default` when unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T: FromStr>(key: &str, raw: &str, default: T) -> T {
    match raw.trim().parse::<T>() {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!(key, value = raw, "malformed config value; using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimator_defaults_match_service_contract() {
        let cfg = EstimatorConfig::default();

        assert_eq!(cfg.cache_ttl, Duration::from_secs(120));
        assert_eq!(cfg.cache_max_entries, 500);
        assert_eq!(cfg.default_base_minutes, 20);
        assert_eq!(cfg.sample_limit, 60);
        assert_eq!(cfg.default_timezone, Tz::UTC);
    }

    #[test]
    fn parse_or_accepts_valid_values() {
        assert_eq!(parse_or("K", " 42 ", 7_usize), 42);
        assert_eq!(parse_or("K", "Asia/Jakarta", Tz::UTC), Tz::Asia__Jakarta);
    }

    #[test]
    fn parse_or_falls_back_on_garbage() {
        assert_eq!(parse_or("K", "many", 7_usize), 7);
        assert_eq!(parse_or("K", "Mars/Olympus", Tz::UTC), Tz::UTC);
    }
}
