use crate::config::Config;
use crate::error::AppError;
use governor::{Quota, RateLimiter, state::{InMemoryState, NotKeyed}, clock::DefaultClock};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::num::NonZeroU32;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

use super::endpoints;
use super::models::*;

const USER_AGENT: &str = "deadlock_insight/0.1.0";

pub struct DeadlockApiClient {
    config: Config,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl DeadlockApiClient {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let per_second = NonZeroU32::new(config.requests_per_second).ok_or_else(|| {
            AppError::ConfigError("requests per second must be positive".to_string())
        })?;
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));
        Ok(DeadlockApiClient {
            config,
            rate_limiter,
        })
    }

    // One attempt per call: a non-200 surfaces immediately.
    fn execute_request(&self, url: &str) -> Result<String, AppError> {
        while self.rate_limiter.check().is_err() {
            thread::sleep(Duration::from_millis(25));
        }

        let response = ureq::get(url)
            .set("User-Agent", USER_AGENT)
            .set("Accept", "*/*")
            .call();

        match response {
            Ok(resp) => {
                info!("Request Status {} | {}", resp.status(), url);
                resp.into_string()
                    .map_err(|e| AppError::HttpError(e.to_string()))
            }
            Err(ureq::Error::Status(status, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                let err = AppError::api(status, &body);
                warn!("Request Status {} | {} | {}", status, url, err);
                Err(err)
            }
            Err(e) => {
                warn!("Request failed | {} | {}", url, e);
                Err(AppError::HttpError(e.to_string()))
            }
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, AppError> {
        let body = self.execute_request(url)?;
        serde_json::from_str(&body).map_err(|e| AppError::JsonError(format!("{url}: {e}")))
    }

    pub fn get_heroes(&self) -> Result<Vec<Value>, AppError> {
        self.get_json(&endpoints::heroes(&self.config))
    }

    pub fn get_items(&self) -> Result<Vec<Value>, AppError> {
        self.get_json(&endpoints::items(&self.config))
    }

    pub fn get_ranks(&self) -> Result<Vec<Value>, AppError> {
        self.get_json(&endpoints::ranks(&self.config))
    }

    pub fn get_match_history(&self, player_id: u32) -> Result<Vec<MatchHistoryDto>, AppError> {
        self.get_json(&endpoints::match_history(&self.config, player_id))
    }

    /// Metric summaries keyed by metric name; left untyped for the flattener.
    pub fn get_player_stats(&self, player_id: u32, hero: Option<u32>) -> Result<Value, AppError> {
        self.get_json(&endpoints::player_stats(&self.config, player_id, hero))
    }

    pub fn get_performance_curve(
        &self,
        player_id: u32,
        hero: Option<u32>,
    ) -> Result<Vec<PerformanceCurveDto>, AppError> {
        self.get_json(&endpoints::performance_curve(&self.config, player_id, hero))
    }

    pub fn get_kill_death_stats(
        &self,
        player_id: u32,
        hero: Option<u32>,
    ) -> Result<Vec<KillDeathDto>, AppError> {
        self.get_json(&endpoints::kill_death_stats(&self.config, player_id, hero))
    }

    pub fn get_steam_profiles(&self, player_id: u32) -> Result<Vec<SteamProfileDto>, AppError> {
        // The search returns either a list or a single object.
        let value: Value = self.get_json(&endpoints::steam_search(&self.config, player_id))?;
        let profiles = match value {
            Value::Array(_) => serde_json::from_value(value),
            other => serde_json::from_value(other).map(|p: SteamProfileDto| vec![p]),
        };
        profiles.map_err(|e| AppError::JsonError(e.to_string()))
    }

    pub fn get_mmr_history(&self, player_id: u32) -> Result<Vec<MmrDto>, AppError> {
        self.get_json(&endpoints::mmr_history(&self.config, player_id))
    }

    pub fn get_match_metadata(&self, match_id: u64) -> Result<MatchMetadataDto, AppError> {
        self.get_json(&endpoints::match_metadata(&self.config, match_id))
    }

    pub fn get_leaderboard(&self, region: &str) -> Result<LeaderboardDto, AppError> {
        self.get_json(&endpoints::leaderboard(&self.config, region))
    }
}
