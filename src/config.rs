use crate::error::AppError;
use std::env;

pub const DEFAULT_API_BASE: &str = "https://api.deadlock-api.com";
pub const DEFAULT_ASSETS_BASE: &str = "https://assets.deadlock-api.com";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base: String,
    pub assets_base: String,
    pub leaderboard_region: String,
    pub cache_ttl_hours: i64,
    pub requests_per_second: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base: DEFAULT_API_BASE.to_string(),
            assets_base: DEFAULT_ASSETS_BASE.to_string(),
            leaderboard_region: "Europe".to_string(),
            cache_ttl_hours: 24,
            requests_per_second: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let api_base = lookup("DEADLOCK_API_BASE").unwrap_or(defaults.api_base);
        let assets_base = lookup("DEADLOCK_ASSETS_BASE").unwrap_or(defaults.assets_base);
        let leaderboard_region =
            lookup("DEADLOCK_LEADERBOARD_REGION").unwrap_or(defaults.leaderboard_region);

        let cache_ttl_hours = match lookup("DEADLOCK_CACHE_TTL_HOURS") {
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
                AppError::ConfigError(format!("DEADLOCK_CACHE_TTL_HOURS is not a number: {raw}"))
            })?,
            None => defaults.cache_ttl_hours,
        };

        let requests_per_second = match lookup("DEADLOCK_REQUESTS_PER_SECOND") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(rps) if rps > 0 => rps,
                _ => {
                    return Err(AppError::ConfigError(format!(
                        "DEADLOCK_REQUESTS_PER_SECOND must be a positive integer: {raw}"
                    )))
                }
            },
            None => defaults.requests_per_second,
        };

        Ok(Config {
            api_base: api_base.trim_end_matches('/').to_string(),
            assets_base: assets_base.trim_end_matches('/').to_string(),
            leaderboard_region,
            cache_ttl_hours,
            requests_per_second,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn overrides_and_trims_trailing_slash() {
        let config = Config::from_lookup(lookup_from(&[
            ("DEADLOCK_API_BASE", "http://localhost:3000/"),
            ("DEADLOCK_CACHE_TTL_HOURS", "6"),
        ]))
        .unwrap();
        assert_eq!(config.api_base, "http://localhost:3000");
        assert_eq!(config.cache_ttl_hours, 6);
    }

    #[test]
    fn rejects_zero_request_rate() {
        let err = Config::from_lookup(lookup_from(&[("DEADLOCK_REQUESTS_PER_SECOND", "0")]));
        assert!(matches!(err, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn rejects_non_numeric_ttl() {
        let err = Config::from_lookup(lookup_from(&[("DEADLOCK_CACHE_TTL_HOURS", "day")]));
        assert!(matches!(err, Err(AppError::ConfigError(_))));
    }
}
