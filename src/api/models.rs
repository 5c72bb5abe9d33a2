use serde::{Deserialize, Serialize};

// Match history row (data API /v1/players/{id}/match-history)
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct MatchHistoryDto {
    pub match_id: u64,
    pub hero_id: u32,
    pub start_time: i64,
    #[serde(default)]
    pub player_team: Option<i64>,
    #[serde(default)]
    pub match_result: Option<i64>,
    #[serde(default)]
    pub player_kills: u32,
    #[serde(default)]
    pub player_deaths: u32,
    #[serde(default)]
    pub player_assists: u32,
    #[serde(default)]
    pub net_worth: u64,
    #[serde(default)]
    pub last_hits: u32,
    #[serde(default)]
    pub denies: u32,
    #[serde(default)]
    pub match_duration_s: Option<u32>,
}

// Performance curve sample (one per game-time bucket)
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct PerformanceCurveDto {
    pub game_time: f64,
    #[serde(default)]
    pub net_worth_avg: Option<f64>,
    #[serde(default)]
    pub kills_avg: Option<f64>,
    #[serde(default)]
    pub deaths_avg: Option<f64>,
    #[serde(default)]
    pub assists_avg: Option<f64>,
}

// Kill/death location bucket
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct KillDeathDto {
    pub position_x: f64,
    pub position_y: f64,
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub deaths: u32,
}

// MMR history row; division is the rank tier, division_tier the subtier
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct MmrDto {
    #[serde(default)]
    pub match_id: u64,
    pub start_time: i64,
    pub player_score: f64,
    #[serde(default)]
    pub rank: Option<f64>,
    #[serde(default)]
    pub division: Option<u8>,
    #[serde(default)]
    pub division_tier: Option<u8>,
}

// Steam search result
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct SteamProfileDto {
    pub account_id: u64,
    #[serde(default)]
    pub personaname: Option<String>,
    #[serde(default)]
    pub avatarfull: Option<String>,
}

// Match metadata (/v1/matches/{id}/metadata), trimmed to what item ranking needs
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct MatchMetadataDto {
    pub match_info: MatchInfoDto,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct MatchInfoDto {
    pub match_id: u64,
    #[serde(default)]
    pub winning_team: Option<i64>,
    #[serde(default)]
    pub players: Vec<MetadataPlayerDto>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct MetadataPlayerDto {
    pub account_id: u64,
    #[serde(default)]
    pub team: Option<i64>,
    #[serde(default)]
    pub items: Vec<ItemPurchaseDto>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct ItemPurchaseDto {
    pub item_id: u32,
    #[serde(default)]
    pub game_time_s: u32,
    /// Zero while the item is still held.
    #[serde(default)]
    pub sold_time_s: u32,
}

// Third-party leaderboard feed (/v1/leaderboard/{region})
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct LeaderboardDto {
    #[serde(default)]
    pub entries: Vec<LeaderboardEntryDto>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct LeaderboardEntryDto {
    #[serde(default)]
    pub account_name: Option<String>,
    pub rank: u32,
    #[serde(default)]
    pub badge_level: Option<u32>,
    #[serde(default)]
    pub ranked_rank: Option<u8>,
    #[serde(default)]
    pub ranked_subrank: Option<u8>,
}

impl LeaderboardEntryDto {
    /// Rank tier of the entry; badge levels encode `tier * 10 + subtier`.
    pub fn tier(&self) -> Option<u8> {
        self.ranked_rank
            .or_else(|| self.badge_level.and_then(|b| u8::try_from(b / 10).ok()))
    }

    pub fn subtier(&self) -> Option<u8> {
        self.ranked_subrank
            .or_else(|| self.badge_level.and_then(|b| u8::try_from(b % 10).ok()))
    }
}
