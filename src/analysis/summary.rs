use serde::Serialize;

use crate::flatten::{MatchOutcome, MatchRow};

/// Scalar aggregates, pre-formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub total_matches: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: String,
    pub avg_kills: String,
    pub avg_deaths: String,
    pub avg_assists: String,
}

/// `None` when there are no matches to summarise.
pub fn summarize(matches: &[MatchRow]) -> Option<PlayerSummary> {
    if matches.is_empty() {
        return None;
    }

    let total = matches.len();
    let wins = matches.iter().filter(|m| m.result == Some(MatchOutcome::Win)).count();
    let losses = matches.iter().filter(|m| m.result == Some(MatchOutcome::Loss)).count();
    let mean = |read: fn(&MatchRow) -> u32| {
        matches.iter().map(|m| f64::from(read(m))).sum::<f64>() / total as f64
    };

    Some(PlayerSummary {
        total_matches: total,
        wins,
        losses,
        win_rate: format!("{:.1}%", wins as f64 / total as f64 * 100.0),
        avg_kills: format!("{:.1}", mean(|m: &MatchRow| m.kills)),
        avg_deaths: format!("{:.1}", mean(|m: &MatchRow| m.deaths)),
        avg_assists: format!("{:.1}", mean(|m: &MatchRow| m.assists)),
    })
}
