use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::flatten::{flatten_records, resolve_icon, FlatFields, FlatRecord, MmrRow};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankInfo {
    pub tier: u8,
    pub subtier: u8,
    pub name: String,
    pub badge_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct RankTier {
    name: String,
    fields: FlatRecord,
}

/// Rank tiers from the assets API, keyed by tier number (0-11).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankTable {
    tiers: BTreeMap<u8, RankTier>,
}

impl RankTable {
    pub fn from_json(values: &[Value]) -> Self {
        let mut tiers = BTreeMap::new();
        for fields in flatten_records(values) {
            let tier = fields.number("tier").and_then(|t| u8::try_from(t as i64).ok());
            let name = fields.text("name").map(str::to_string);
            match (tier, name) {
                (Some(tier), Some(name)) => {
                    tiers.insert(tier, RankTier { name, fields });
                }
                _ => debug!("Skipping rank record without tier/name"),
            }
        }
        RankTable { tiers }
    }

    pub fn name(&self, tier: u8) -> Option<&str> {
        self.tiers.get(&tier).map(|t| t.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Subtier badge (`small_subrank{n}`) when the subtier is set, else the
    /// tier's small badge.
    pub fn resolve(&self, tier: u8, subtier: u8) -> Option<RankInfo> {
        let entry = self.tiers.get(&tier)?;
        let badge_url = if subtier > 0 {
            let subrank_key = format!("images.small_subrank{subtier}");
            resolve_icon(&entry.fields, &[subrank_key.as_str(), "images.small"])
        } else {
            resolve_icon(&entry.fields, &["images.small"])
        };

        Some(RankInfo {
            tier,
            subtier,
            name: entry.name.clone(),
            badge_url,
        })
    }
}

/// Rank at the most recent match of the MMR history.
pub fn current_rank(history: &[MmrRow], ranks: &RankTable) -> Option<RankInfo> {
    let latest = history.iter().max_by_key(|r| r.start_ts)?;
    let Some(tier) = latest.division else {
        debug!("Latest MMR record {} has no division", latest.match_id);
        return None;
    };
    let info = ranks.resolve(tier, latest.division_tier.unwrap_or(0));
    if info.is_none() {
        debug!("Division {} missing from rank table", tier);
    }
    info
}
