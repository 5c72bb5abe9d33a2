use serde::Serialize;
use std::collections::BTreeMap;

use super::rank::RankTable;
use crate::api::models::LeaderboardEntryDto;

pub const LEADERBOARD_SIZE: usize = 10;
pub const UNKNOWN_PLAYER: &str = "Unknown Player";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    pub rank: u32,
    pub account_name: String,
    pub rank_name: Option<String>,
    pub subtier: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankBucket {
    pub tier: u8,
    pub name: String,
    pub players: usize,
}

/// Leaderboard players per rank tier, lowest tier first. Tiers missing from
/// the rank table are labelled by number.
pub fn rank_distribution(entries: &[LeaderboardEntryDto], ranks: &RankTable) -> Vec<RankBucket> {
    let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
    for tier in entries.iter().filter_map(LeaderboardEntryDto::tier) {
        *counts.entry(tier).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(tier, players)| RankBucket {
            tier,
            name: ranks
                .name(tier)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Tier {tier}")),
            players,
        })
        .collect()
}

pub fn top_entries(
    entries: &[LeaderboardEntryDto],
    ranks: &RankTable,
    top_n: usize,
) -> Vec<LeaderboardRow> {
    let mut sorted: Vec<&LeaderboardEntryDto> = entries.iter().collect();
    sorted.sort_by_key(|e| e.rank);

    sorted
        .into_iter()
        .take(top_n)
        .map(|e| LeaderboardRow {
            rank: e.rank,
            account_name: e
                .account_name
                .clone()
                .unwrap_or_else(|| UNKNOWN_PLAYER.to_string()),
            rank_name: e.tier().and_then(|t| ranks.name(t)).map(str::to_string),
            subtier: e.subtier(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn entry(rank: u32, badge_level: u32) -> LeaderboardEntryDto {
        LeaderboardEntryDto {
            account_name: Some(format!("player{rank}")),
            rank,
            badge_level: Some(badge_level),
            ..Default::default()
        }
    }

    fn ranks() -> RankTable {
        RankTable::from_json(&[
            json!({"tier": 10, "name": "Ascendant"}),
            json!({"tier": 11, "name": "Eternus"}),
        ])
    }

    #[test]
    fn counts_players_per_tier() {
        let entries = vec![entry(1, 116), entry(2, 115), entry(3, 104), entry(4, 92)];
        let buckets = rank_distribution(&entries, &ranks());
        assert_eq!(
            buckets,
            vec![
                RankBucket { tier: 9, name: "Tier 9".to_string(), players: 1 },
                RankBucket { tier: 10, name: "Ascendant".to_string(), players: 1 },
                RankBucket { tier: 11, name: "Eternus".to_string(), players: 2 },
            ]
        );
    }

    #[test]
    fn top_entries_sorted_by_leaderboard_rank() {
        let entries = vec![entry(3, 104), entry(1, 116), entry(2, 115)];
        let rows = top_entries(&entries, &ranks(), 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].account_name, "player1");
        assert_eq!(rows[0].rank_name.as_deref(), Some("Eternus"));
        assert_eq!(rows[0].subtier, Some(6));

        let anonymous = LeaderboardEntryDto { rank: 4, ..Default::default() };
        let rows = top_entries(&[anonymous], &ranks(), 1);
        assert_eq!(rows[0].account_name, UNKNOWN_PLAYER);
        assert_eq!(rows[0].rank_name, None);
    }
}
