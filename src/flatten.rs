//! Schema flattening.
//!
//! Nested JSON records are hoisted into [`FlatRecord`]s keyed by dotted
//! paths (`images.icon_hero_card`), and typed API rows are mapped into the
//! flat row types the analysis modules consume. Foreign keys are resolved by
//! left join: every input row yields exactly one output row.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

use crate::api::models::{MatchHistoryDto, MatchMetadataDto, MmrDto, PerformanceCurveDto};

pub type FlatRecord = BTreeMap<String, Value>;

/// Flattens one JSON value. Non-object input lands under the `value` key.
pub fn flatten_value(value: &Value) -> FlatRecord {
    let mut out = FlatRecord::new();
    match value {
        Value::Object(map) => flatten_into(&mut out, None, map),
        other => {
            out.insert("value".to_string(), other.clone());
        }
    }
    out
}

pub fn flatten_records(values: &[Value]) -> Vec<FlatRecord> {
    values.iter().map(flatten_value).collect()
}

fn flatten_into(out: &mut FlatRecord, prefix: Option<&str>, map: &Map<String, Value>) {
    for (key, value) in map {
        let path = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(out, Some(&path), inner),
            _ => {
                out.insert(path, value.clone());
            }
        }
    }
}

/// Typed accessors over flattened columns. Absent columns read as `None`.
pub trait FlatFields {
    fn number(&self, key: &str) -> Option<f64>;
    fn text(&self, key: &str) -> Option<&str>;
}

impl FlatFields for FlatRecord {
    fn number(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn text(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }
}

/// First non-empty string among `candidates`, in order.
pub fn resolve_icon(fields: &FlatRecord, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find_map(|key| fields.text(key))
        .map(str::to_string)
}

/// A metadata row (hero, item) addressable by numeric id.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRef {
    pub id: u32,
    pub name: String,
    pub fields: FlatRecord,
}

pub type HeroRef = EntityRef;
pub type ItemRef = EntityRef;

impl EntityRef {
    pub fn from_flat(fields: FlatRecord) -> Option<Self> {
        let id = fields.number("id").and_then(|n| u32::try_from(n as i64).ok())?;
        let name = fields.text("name")?.to_string();
        Some(EntityRef { id, name, fields })
    }

    pub fn icon(&self, candidates: &[&str]) -> Option<String> {
        resolve_icon(&self.fields, candidates)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    by_id: HashMap<u32, EntityRef>,
}

impl LookupTable {
    pub fn from_json(values: &[Value]) -> Self {
        let mut by_id = HashMap::new();
        for record in flatten_records(values) {
            match EntityRef::from_flat(record) {
                Some(entity) => {
                    by_id.insert(entity.id, entity);
                }
                None => debug!("Skipping metadata record without id/name"),
            }
        }
        LookupTable { by_id }
    }

    pub fn get(&self, id: u32) -> Option<&EntityRef> {
        self.by_id.get(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MatchOutcome {
    Win,
    Loss,
}

impl MatchOutcome {
    pub fn from_teams(player_team: Option<i64>, match_result: Option<i64>) -> Option<Self> {
        match (player_team, match_result) {
            (Some(team), Some(result)) if team == result => Some(MatchOutcome::Win),
            (Some(_), Some(_)) => Some(MatchOutcome::Loss),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRow {
    pub match_id: u64,
    pub hero_id: u32,
    /// `None` when the hero table has no entry for `hero_id`.
    pub hero_name: Option<String>,
    pub start_time: i64,
    pub start_ts: DateTime<Utc>,
    pub result: Option<MatchOutcome>,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub net_worth: u64,
    pub last_hits: u32,
    pub denies: u32,
    pub duration_s: Option<u32>,
}

impl MatchRow {
    pub fn hero_label(&self) -> String {
        self.hero_name
            .clone()
            .unwrap_or_else(|| self.hero_id.to_string())
    }

    pub fn won(&self) -> bool {
        self.result == Some(MatchOutcome::Win)
    }
}

/// A player's complete match list. Rankings accept only this type, so they
/// cannot be handed a hero-filtered subset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchHistory {
    rows: Vec<MatchRow>,
}

impl MatchHistory {
    pub fn rows(&self) -> &[MatchRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn filtered(&self, hero: Option<u32>) -> Vec<MatchRow> {
        match hero {
            Some(hero_id) => self
                .rows
                .iter()
                .filter(|row| row.hero_id == hero_id)
                .cloned()
                .collect(),
            None => self.rows.clone(),
        }
    }
}

/// Out-of-range timestamps map to the Unix epoch.
pub fn unix_to_utc(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or_else(|| {
        warn!("Timestamp {} is out of range, using the Unix epoch", seconds);
        DateTime::default()
    })
}

/// Left-joins match rows onto the hero table.
pub fn flatten_matches(matches: &[MatchHistoryDto], heroes: &LookupTable) -> MatchHistory {
    let rows = matches
        .iter()
        .map(|m| {
            let hero_name = heroes.get(m.hero_id).map(|h| h.name.clone());
            if hero_name.is_none() {
                debug!("Hero {} missing from hero table, keeping raw id", m.hero_id);
            }
            MatchRow {
                match_id: m.match_id,
                hero_id: m.hero_id,
                hero_name,
                start_time: m.start_time,
                start_ts: unix_to_utc(m.start_time),
                result: MatchOutcome::from_teams(m.player_team, m.match_result),
                kills: m.player_kills,
                deaths: m.player_deaths,
                assists: m.player_assists,
                net_worth: m.net_worth,
                last_hits: m.last_hits,
                denies: m.denies,
                duration_s: m.match_duration_s,
            }
        })
        .collect();
    MatchHistory { rows }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MmrRow {
    pub match_id: u64,
    pub start_ts: DateTime<Utc>,
    pub player_score: f64,
    pub rank: Option<f64>,
    pub division: Option<u8>,
    pub division_tier: Option<u8>,
}

pub fn flatten_mmr(records: &[MmrDto]) -> Vec<MmrRow> {
    records
        .iter()
        .map(|r| MmrRow {
            match_id: r.match_id,
            start_ts: unix_to_utc(r.start_time),
            player_score: r.player_score,
            rank: r.rank,
            division: r.division,
            division_tier: r.division_tier,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveRow {
    pub game_time_min: f64,
    pub net_worth: Option<f64>,
    pub kills: Option<f64>,
    pub deaths: Option<f64>,
    pub assists: Option<f64>,
}

pub fn flatten_curve(samples: &[PerformanceCurveDto]) -> Vec<CurveRow> {
    samples
        .iter()
        .map(|s| CurveRow {
            game_time_min: s.game_time / 60.0,
            net_worth: s.net_worth_avg,
            kills: s.kills_avg,
            deaths: s.deaths_avg,
            assists: s.assists_avg,
        })
        .collect()
}

/// Items one player still held at the end of one match.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerMatchItems {
    pub match_id: u64,
    pub won: bool,
    pub held_item_ids: BTreeSet<u32>,
}

/// Extracts the player's held, unsold items, deduplicated per match.
pub fn flatten_match_items(meta: &MatchMetadataDto, account_id: u32) -> Option<PlayerMatchItems> {
    let info = &meta.match_info;
    let player = info
        .players
        .iter()
        .find(|p| p.account_id == u64::from(account_id))?;

    let won = match (player.team, info.winning_team) {
        (Some(team), Some(winner)) => team == winner,
        _ => {
            debug!("Match {} has no team result, counting as not won", info.match_id);
            false
        }
    };

    let held_item_ids = player
        .items
        .iter()
        .filter(|item| item.sold_time_s == 0)
        .map(|item| item.item_id)
        .collect();

    Some(PlayerMatchItems {
        match_id: info.match_id,
        won,
        held_item_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{ItemPurchaseDto, MatchInfoDto, MetadataPlayerDto};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn heroes() -> LookupTable {
        LookupTable::from_json(&[
            json!({"id": 1, "name": "Abrams", "images": {"icon_hero_card": "abrams.png"}}),
            json!({"id": 2, "name": "Bebop"}),
        ])
    }

    fn history_row(match_id: u64, hero_id: u32) -> MatchHistoryDto {
        MatchHistoryDto {
            match_id,
            hero_id,
            start_time: 1_700_000_000,
            player_team: Some(0),
            match_result: Some(0),
            ..Default::default()
        }
    }

    #[test]
    fn nested_objects_become_dotted_keys() {
        let flat = flatten_value(&json!({
            "id": 1,
            "images": {"icon_hero_card": "a.png", "nested": {"deep": 3}},
            "tags": [1, 2]
        }));
        assert_eq!(flat.get("images.icon_hero_card"), Some(&json!("a.png")));
        assert_eq!(flat.get("images.nested.deep"), Some(&json!(3)));
        assert_eq!(flat.get("tags"), Some(&json!([1, 2])));
        assert!(!flat.contains_key("images"));
    }

    #[test]
    fn empty_input_flattens_to_nothing() {
        assert!(flatten_records(&[]).is_empty());
        assert!(flatten_matches(&[], &heroes()).is_empty());
    }

    #[test]
    fn join_preserves_row_count_for_any_lookup() {
        let matches = vec![history_row(1, 1), history_row(2, 99), history_row(3, 2)];

        for table in [heroes(), LookupTable::default()] {
            let history = flatten_matches(&matches, &table);
            assert_eq!(history.len(), matches.len());
        }
    }

    #[test]
    fn unmatched_hero_keeps_raw_id() {
        let history = flatten_matches(&[history_row(1, 99)], &heroes());
        let row = &history.rows()[0];
        assert_eq!(row.hero_id, 99);
        assert_eq!(row.hero_name, None);
        assert_eq!(row.hero_label(), "99");
    }

    #[test]
    fn start_time_is_read_as_utc() {
        let history = flatten_matches(&[history_row(1, 1)], &heroes());
        assert_eq!(
            history.rows()[0].start_ts.to_rfc3339(),
            "2023-11-14T22:13:20+00:00"
        );
    }

    #[test]
    fn outcome_requires_both_team_columns() {
        assert_eq!(MatchOutcome::from_teams(Some(1), Some(1)), Some(MatchOutcome::Win));
        assert_eq!(MatchOutcome::from_teams(Some(1), Some(0)), Some(MatchOutcome::Loss));
        assert_eq!(MatchOutcome::from_teams(None, Some(0)), None);
    }

    #[test]
    fn icon_resolution_skips_empty_candidates() {
        let hero = EntityRef::from_flat(flatten_value(&json!({
            "id": 3,
            "name": "Haze",
            "images": {"icon_hero_card": "", "icon_image_small": "haze_small.png"}
        })))
        .unwrap();
        assert_eq!(
            hero.icon(&["images.icon_hero_card", "images.icon_image_small"]),
            Some("haze_small.png".to_string())
        );
        assert_eq!(hero.icon(&["images.minimap_image"]), None);
    }

    #[test]
    fn held_items_are_deduplicated_and_sold_items_dropped() {
        let meta = MatchMetadataDto {
            match_info: MatchInfoDto {
                match_id: 10,
                winning_team: Some(1),
                players: vec![MetadataPlayerDto {
                    account_id: 42,
                    team: Some(1),
                    items: vec![
                        ItemPurchaseDto { item_id: 5, game_time_s: 60, sold_time_s: 0 },
                        ItemPurchaseDto { item_id: 5, game_time_s: 900, sold_time_s: 0 },
                        ItemPurchaseDto { item_id: 6, game_time_s: 120, sold_time_s: 600 },
                    ],
                }],
            },
        };
        let items = flatten_match_items(&meta, 42).unwrap();
        assert!(items.won);
        assert_eq!(items.held_item_ids.into_iter().collect::<Vec<_>>(), vec![5]);
        assert!(flatten_match_items(&meta, 7).is_none());
    }

    #[test]
    fn out_of_range_timestamp_maps_to_epoch() {
        assert_eq!(unix_to_utc(i64::MAX), DateTime::<Utc>::default());
        assert_eq!(unix_to_utc(86_400).to_rfc3339(), "1970-01-02T00:00:00+00:00");
    }
}
