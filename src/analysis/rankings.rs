use serde::Serialize;
use tracing::debug;

use super::usage_stats::{UsageStats, UsageTracker};
use crate::flatten::{LookupTable, MatchHistory, PlayerMatchItems};

pub const TOP_HEROES: usize = 5;
pub const TOP_ITEMS: usize = 10;

pub const HERO_ICON_FIELDS: [&str; 4] = [
    "images.icon_hero_card",
    "images.icon_image_small",
    "images.minimap_image",
    "images.selection_image",
];

pub const ITEM_ICON_FIELDS: [&str; 4] = ["shop_image_small", "shop_image", "image", "image_webp"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntity {
    pub id: u32,
    pub name: String,
    pub matches: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub icon_url: Option<String>,
}

impl RankedEntity {
    pub fn win_rate_label(&self) -> String {
        format!("{:.1}%", self.win_rate)
    }
}

/// Most-played heroes over the full history, whatever filter the caller
/// applies elsewhere. Heroes missing from the hero table are left out.
pub fn top_heroes(history: &MatchHistory, heroes: &LookupTable, top_n: usize) -> Vec<RankedEntity> {
    let mut tracker = UsageTracker::new();
    for row in history.rows() {
        tracker.add_match(row.hero_id, row.won());
    }
    rank_entities(tracker.get_stats(), heroes, &HERO_ICON_FIELDS, top_n)
}

/// Most-held items, one count per item per match.
pub fn top_items(
    match_items: &[PlayerMatchItems],
    items: &LookupTable,
    top_n: usize,
) -> Vec<RankedEntity> {
    let mut tracker = UsageTracker::new();
    for entry in match_items {
        for &item_id in &entry.held_item_ids {
            tracker.add_match(item_id, entry.won);
        }
    }
    rank_entities(tracker.get_stats(), items, &ITEM_ICON_FIELDS, top_n)
}

// Sorted by match count desc; ties by wins desc, then id asc.
fn rank_entities(
    stats: Vec<UsageStats<u32>>,
    table: &LookupTable,
    icon_fields: &[&str],
    top_n: usize,
) -> Vec<RankedEntity> {
    let mut ranked: Vec<RankedEntity> = stats
        .iter()
        .filter_map(|s| {
            let Some(entity) = table.get(s.key) else {
                debug!("Id {} missing from metadata table, excluded from ranking", s.key);
                return None;
            };
            let icon_url = entity.icon(icon_fields);
            if icon_url.is_none() {
                debug!("No icon found for {}", entity.name);
            }
            Some(RankedEntity {
                id: entity.id,
                name: entity.name.clone(),
                matches: s.matches,
                wins: s.wins,
                win_rate: s.win_rate(),
                icon_url,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.matches
            .cmp(&a.matches)
            .then_with(|| b.wins.cmp(&a.wins))
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked.truncate(top_n);

    ranked
}
