use deadlock_insight::analysis::rankings::{top_heroes, TOP_HEROES};
use deadlock_insight::api::models::{MatchHistoryDto, MatchMetadataDto};
use deadlock_insight::flatten::{flatten_matches, LookupTable, MatchOutcome};
use deadlock_insight::pipeline::{build_report, item_match_ids, PlayerData};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const PLAYER: u32 = 1_234_567;

fn history_json() -> Value {
    json!([
        {"match_id": 101, "hero_id": 1, "start_time": 1_700_000_000,
         "player_team": 0, "match_result": 0,
         "player_kills": 5, "player_deaths": 2, "player_assists": 10},
        {"match_id": 102, "hero_id": 1, "start_time": 1_700_090_000,
         "player_team": 1, "match_result": 0,
         "player_kills": 3, "player_deaths": 5, "player_assists": 4}
    ])
}

fn heroes_json() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Abrams", "images": {"icon_hero_card": "abrams.png"}}),
        json!({"id": 2, "name": "Bebop", "images": {"icon_image_small": "bebop.png"}}),
    ]
}

fn player_data(history: Value) -> PlayerData {
    PlayerData {
        heroes: heroes_json(),
        items: vec![json!({"id": 900, "name": "Extra Health", "shop_image_small": "hp.png"})],
        ranks: vec![json!({"tier": 7, "name": "Oracle", "images": {"small": "oracle.png"}})],
        match_history: serde_json::from_value(history).unwrap(),
        player_stats: Some(json!({
            "kills": {"avg": 6.0, "percentile25": 3.0, "percentile50": 5.0, "percentile75": 8.0},
            "boss_damage": {"avg": 100.0, "percentile25": 10.0, "percentile75": 10.005}
        })),
        match_metadata: vec![serde_json::from_value::<MatchMetadataDto>(json!({
            "match_info": {
                "match_id": 101,
                "winning_team": 0,
                "players": [{
                    "account_id": PLAYER,
                    "team": 0,
                    "items": [
                        {"item_id": 900, "game_time_s": 300, "sold_time_s": 0},
                        {"item_id": 900, "game_time_s": 900, "sold_time_s": 0},
                        {"item_id": 901, "game_time_s": 400, "sold_time_s": 800}
                    ]
                }]
            }
        }))
        .unwrap()],
        ..Default::default()
    }
}

#[test]
fn two_abrams_matches_end_to_end() {
    let data = player_data(history_json());

    let history = flatten_matches(&data.match_history, &LookupTable::from_json(&data.heroes));
    let names: Vec<_> = history.rows().iter().map(|r| r.hero_name.as_deref()).collect();
    assert_eq!(names, vec![Some("Abrams"), Some("Abrams")]);
    let results: Vec<_> = history.rows().iter().map(|r| r.result).collect();
    assert_eq!(results, vec![Some(MatchOutcome::Win), Some(MatchOutcome::Loss)]);

    let report = build_report(PLAYER, &data, None).unwrap();
    let summary = report.summary.unwrap();
    assert_eq!(summary.win_rate, "50.0%");
    assert_eq!(summary.avg_kills, "4.0");

    assert_eq!(report.top_heroes.len(), 1);
    assert_eq!(report.top_heroes[0].name, "Abrams");
    assert_eq!(report.top_heroes[0].icon_url.as_deref(), Some("abrams.png"));

    // Item 900 counted once; item 901 was sold and is not in the item table.
    assert_eq!(report.top_items.len(), 1);
    assert_eq!(report.top_items[0].matches, 1);
    assert_eq!(report.top_items[0].win_rate_label(), "100.0%");

    let metrics: Vec<_> = report
        .distributions
        .unwrap()
        .into_iter()
        .map(|d| d.metric)
        .collect();
    assert_eq!(metrics, vec!["kills".to_string()]);
    assert!(!report.charts["percentile_dist"].is_placeholder());
    assert!(!report.charts["timeline"].is_placeholder());
}

#[test]
fn hero_filter_does_not_change_top_heroes() {
    let mut games = history_json();
    if let Value::Array(rows) = &mut games {
        rows.push(json!({"match_id": 103, "hero_id": 2, "start_time": 1_700_100_000,
                         "player_team": 0, "match_result": 1}));
        rows.push(json!({"match_id": 104, "hero_id": 99, "start_time": 1_700_200_000}));
    }
    let data = player_data(games);

    let unfiltered = build_report(PLAYER, &data, None).unwrap();
    let filtered = build_report(PLAYER, &data, Some(2)).unwrap();
    assert_eq!(unfiltered.top_heroes, filtered.top_heroes);

    let history = flatten_matches(&data.match_history, &LookupTable::from_json(&data.heroes));
    assert_eq!(
        top_heroes(&history, &LookupTable::from_json(&data.heroes), TOP_HEROES),
        filtered.top_heroes
    );

    // Hero 99 is unknown and never ranked.
    assert!(filtered.top_heroes.iter().all(|h| h.id != 99));
    assert_eq!(filtered.summary.unwrap().total_matches, 1);
}

#[test]
fn flattening_keeps_every_row() {
    let games: Vec<MatchHistoryDto> = serde_json::from_value(json!([
        {"match_id": 1, "hero_id": 1, "start_time": 0},
        {"match_id": 2, "hero_id": 42, "start_time": 0},
        {"match_id": 3, "hero_id": 1, "start_time": 0}
    ]))
    .unwrap();

    for heroes in [LookupTable::default(), LookupTable::from_json(&heroes_json())] {
        let history = flatten_matches(&games, &heroes);
        assert_eq!(history.len(), games.len());
    }

    let history = flatten_matches(&games, &LookupTable::from_json(&heroes_json()));
    assert_eq!(history.rows()[1].hero_name, None);
    assert_eq!(history.rows()[1].hero_label(), "42");
}

#[test]
fn report_serialises_charts() {
    let report = build_report(PLAYER, &player_data(history_json()), None).unwrap();
    let json = serde_json::to_value(&report.charts).unwrap();
    assert_eq!(json["timeline"]["traces"][0]["kind"], "bar");
    assert!(json["mmr_history"]["placeholder"].is_string());
}

fn held_items(match_id: u64, start_time: i64, item_ids: &[u32]) -> (MatchHistoryDto, MatchMetadataDto) {
    let items: Vec<Value> = item_ids
        .iter()
        .map(|id| json!({"item_id": id, "game_time_s": 600, "sold_time_s": 0}))
        .collect();
    let game = serde_json::from_value(json!({
        "match_id": match_id, "hero_id": 1, "start_time": start_time,
        "player_team": 0, "match_result": 0
    }))
    .unwrap();
    let meta = serde_json::from_value(json!({
        "match_info": {
            "match_id": match_id,
            "winning_team": 0,
            "players": [{"account_id": PLAYER, "team": 0, "items": items}]
        }
    }))
    .unwrap();
    (game, meta)
}

#[test]
fn item_ranking_counts_older_matches() {
    // Item 900 only appears in the 30 oldest matches, item 901 in the 20 newest.
    let (history, metadata): (Vec<_>, Vec<_>) = (1..=50u64)
        .map(|i| {
            let item = if i <= 30 { 900 } else { 901 };
            held_items(i, 1_700_000_000 + i as i64 * 3_600, &[item])
        })
        .unzip();

    assert_eq!(item_match_ids(&history, None).len(), 50);

    let items = vec![
        json!({"id": 900, "name": "Extra Health"}),
        json!({"id": 901, "name": "Extra Stamina"}),
    ];
    let data = PlayerData {
        heroes: heroes_json(),
        items,
        match_history: history.clone(),
        match_metadata: metadata.clone(),
        ..Default::default()
    };
    let report = build_report(PLAYER, &data, None).unwrap();
    let ranked: Vec<_> = report.top_items.iter().map(|i| (i.id, i.matches)).collect();
    assert_eq!(ranked, vec![(900, 30), (901, 20)]);

    // Capped to the 20 newest matches, the older item disappears.
    let recent = item_match_ids(&history, Some(20));
    let capped = PlayerData {
        match_metadata: metadata
            .into_iter()
            .filter(|m| recent.contains(&m.match_info.match_id))
            .collect(),
        ..data
    };
    let report = build_report(PLAYER, &capped, None).unwrap();
    let ranked: Vec<_> = report.top_items.iter().map(|i| (i.id, i.matches)).collect();
    assert_eq!(ranked, vec![(901, 20)]);
}
