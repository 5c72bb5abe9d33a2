// URL builders for the stats API and the assets API.
// The aggregate endpoints take `account_ids` (plural).

use crate::config::Config;

pub fn heroes(config: &Config) -> String {
    format!("{}/v2/heroes", config.assets_base)
}

pub fn items(config: &Config) -> String {
    format!("{}/v2/items", config.assets_base)
}

pub fn ranks(config: &Config) -> String {
    format!("{}/v2/ranks", config.assets_base)
}

pub fn match_history(config: &Config, player_id: u32) -> String {
    format!(
        "{}/v1/players/{}/match-history?only_stored_history=false",
        config.api_base, player_id
    )
}

pub fn player_stats(config: &Config, player_id: u32, hero: Option<u32>) -> String {
    with_hero(
        format!(
            "{}/v1/analytics/player-stats/metrics?account_ids={}",
            config.api_base, player_id
        ),
        hero,
    )
}

pub fn performance_curve(config: &Config, player_id: u32, hero: Option<u32>) -> String {
    with_hero(
        format!(
            "{}/v1/analytics/player-performance-curve?account_ids={}&resolution=0",
            config.api_base, player_id
        ),
        hero,
    )
}

pub fn kill_death_stats(config: &Config, player_id: u32, hero: Option<u32>) -> String {
    with_hero(
        format!(
            "{}/v1/analytics/kill-death-stats?account_ids={}",
            config.api_base, player_id
        ),
        hero,
    )
}

pub fn steam_search(config: &Config, player_id: u32) -> String {
    format!(
        "{}/v1/players/steam-search?search_query={}",
        config.api_base, player_id
    )
}

pub fn mmr_history(config: &Config, player_id: u32) -> String {
    format!("{}/v1/players/{}/mmr-history", config.api_base, player_id)
}

pub fn match_metadata(config: &Config, match_id: u64) -> String {
    format!("{}/v1/matches/{}/metadata", config.api_base, match_id)
}

pub fn leaderboard(config: &Config, region: &str) -> String {
    format!("{}/v1/leaderboard/{}", config.api_base, region)
}

fn with_hero(url: String, hero: Option<u32>) -> String {
    match hero {
        Some(hero_id) => format!("{url}&hero_ids={hero_id}"),
        None => url,
    }
}
