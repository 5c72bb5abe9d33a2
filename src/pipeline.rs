//! Request pipeline: fetch everything a player report needs, then build the
//! report from the fetched data without touching the network.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::analysis::distribution::{estimate_all, parse_metric_summaries, DistributionEstimate};
use crate::analysis::leaderboard::{rank_distribution, top_entries, LeaderboardRow, UNKNOWN_PLAYER};
use crate::analysis::rank::{current_rank, RankInfo, RankTable};
use crate::analysis::rankings::{top_heroes, top_items, RankedEntity, TOP_HEROES, TOP_ITEMS};
use crate::analysis::summary::{summarize, PlayerSummary};
use crate::analysis::trend::{kda_trends, mmr_trends};
use crate::api::client::DeadlockApiClient;
use crate::api::models::{
    KillDeathDto, LeaderboardDto, MatchHistoryDto, MatchMetadataDto, MmrDto, PerformanceCurveDto,
    SteamProfileDto,
};
use crate::charts::{self, Chart, ChartSet};
use crate::error::AppError;
use crate::flatten::{flatten_curve, flatten_match_items, flatten_matches, flatten_mmr, LookupTable};

const INSUFFICIENT_DATA: &str = "Not enough data to display this chart";

/// Raw upstream payloads for one player.
#[derive(Debug, Clone, Default)]
pub struct PlayerData {
    pub heroes: Vec<Value>,
    pub items: Vec<Value>,
    pub ranks: Vec<Value>,
    pub match_history: Vec<MatchHistoryDto>,
    pub player_stats: Option<Value>,
    pub performance_curve: Vec<PerformanceCurveDto>,
    pub kill_death: Vec<KillDeathDto>,
    pub mmr_history: Vec<MmrDto>,
    pub steam_profiles: Vec<SteamProfileDto>,
    pub match_metadata: Vec<MatchMetadataDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileInfo {
    pub username: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerReport {
    pub player_id: u32,
    pub hero_filter: Option<u32>,
    pub profile: ProfileInfo,
    pub summary: Option<PlayerSummary>,
    pub rank: Option<RankInfo>,
    pub top_heroes: Vec<RankedEntity>,
    pub top_items: Vec<RankedEntity>,
    pub distributions: Option<Vec<DistributionEstimate>>,
    pub charts: ChartSet,
}

/// Rank distribution and leaderboard shown before any player is looked up.
#[derive(Debug, Clone, Serialize)]
pub struct IndexOverview {
    pub region: String,
    pub rank_distribution_chart: Chart,
    pub leaderboard: Vec<LeaderboardRow>,
}

pub fn parse_player_id(raw: &str) -> Result<u32, AppError> {
    match raw.trim().parse::<u32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::InvalidPlayerId(raw.to_string())),
    }
}

/// Matches whose item builds are fetched, newest first. `None` covers the
/// whole history.
pub fn item_match_ids(history: &[MatchHistoryDto], limit: Option<usize>) -> Vec<u64> {
    let mut recent: Vec<&MatchHistoryDto> = history.iter().collect();
    recent.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    recent
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|game| game.match_id)
        .collect()
}

/// Fetches every payload in sequence. Any failed request aborts the whole
/// fetch; `on_step` is called before each one. `item_matches` caps how many
/// matches have their items fetched; `None` fetches all of them.
pub fn fetch_player_data<F>(
    client: &DeadlockApiClient,
    player_id: u32,
    hero: Option<u32>,
    item_matches: Option<usize>,
    mut on_step: F,
) -> Result<PlayerData, AppError>
where
    F: FnMut(&str),
{
    on_step("Fetching match history");
    let match_history = client.get_match_history(player_id)?;
    if match_history.is_empty() {
        return Err(AppError::NoMatchHistory(player_id.to_string()));
    }

    on_step("Fetching hero, item and rank tables");
    let heroes = client.get_heroes()?;
    let items = client.get_items()?;
    let ranks = client.get_ranks()?;

    on_step("Fetching metric percentiles");
    let player_stats = client.get_player_stats(player_id, hero)?;

    on_step("Fetching performance curve");
    let performance_curve = client.get_performance_curve(player_id, hero)?;

    on_step("Fetching kill/death locations");
    let kill_death = client.get_kill_death_stats(player_id, hero)?;

    on_step("Fetching MMR history");
    let mmr_history = client.get_mmr_history(player_id)?;

    on_step("Fetching Steam profile");
    let steam_profiles = client.get_steam_profiles(player_id)?;

    let match_ids = item_match_ids(&match_history, item_matches);
    if match_ids.len() < match_history.len() {
        warn!(
            "Item rankings limited to the {} most recent of {} matches",
            match_ids.len(),
            match_history.len()
        );
    }
    let mut match_metadata = Vec::with_capacity(match_ids.len());
    for (idx, match_id) in match_ids.iter().enumerate() {
        on_step(&format!(
            "Fetching items for match {} ({}/{})",
            match_id,
            idx + 1,
            match_ids.len()
        ));
        match_metadata.push(client.get_match_metadata(*match_id)?);
    }

    info!(
        "Fetched {} matches and {} match item lists for player {}",
        match_history.len(),
        match_metadata.len(),
        player_id
    );

    Ok(PlayerData {
        heroes,
        items,
        ranks,
        match_history,
        player_stats: Some(player_stats),
        performance_curve,
        kill_death,
        mmr_history,
        steam_profiles,
        match_metadata,
    })
}

fn insert_chart(charts: &mut ChartSet, key: &str, title: &str, chart: Option<Chart>) {
    let chart = chart.unwrap_or_else(|| {
        debug!("Chart {} has insufficient data", key);
        Chart::placeholder(title, INSUFFICIENT_DATA)
    });
    charts.insert(key.to_string(), chart);
}

/// Builds the report from already-fetched data. The hero filter narrows the
/// summary, timeline and trend charts; hero and item rankings always cover
/// the full history.
pub fn build_report(
    player_id: u32,
    data: &PlayerData,
    hero: Option<u32>,
) -> Result<PlayerReport, AppError> {
    let hero_table = LookupTable::from_json(&data.heroes);
    let item_table = LookupTable::from_json(&data.items);
    let rank_table = RankTable::from_json(&data.ranks);
    if hero_table.is_empty() {
        warn!("Hero table is empty, heroes are labelled by id and not ranked");
    }
    if item_table.is_empty() {
        warn!("Item table is empty, no items can be ranked");
    }
    if rank_table.is_empty() {
        warn!("Rank table is empty, no rank badge can be resolved");
    }

    let history = flatten_matches(&data.match_history, &hero_table);
    if history.is_empty() {
        return Err(AppError::NoMatchHistory(player_id.to_string()));
    }
    let matches = history.filtered(hero);
    if matches.is_empty() {
        warn!("No matches for hero {:?} in {} games", hero, history.len());
    }

    let heroes = top_heroes(&history, &hero_table, TOP_HEROES);
    let match_items: Vec<_> = data
        .match_metadata
        .iter()
        .filter_map(|meta| flatten_match_items(meta, player_id))
        .collect();
    let items = top_items(&match_items, &item_table, TOP_ITEMS);

    let distributions = data
        .player_stats
        .as_ref()
        .map(parse_metric_summaries)
        .and_then(|summaries| estimate_all(&summaries));
    if distributions.is_none() {
        debug!("No metric qualified for a distribution chart");
    }

    let mmr_rows = flatten_mmr(&data.mmr_history);
    let rank = current_rank(&mmr_rows, &rank_table);

    let profile = data
        .steam_profiles
        .iter()
        .find(|p| p.account_id == u64::from(player_id));
    let profile = ProfileInfo {
        username: profile
            .and_then(|p| p.personaname.clone())
            .unwrap_or_else(|| UNKNOWN_PLAYER.to_string()),
        avatar_url: profile.and_then(|p| p.avatarfull.clone()),
    };

    let mut chart_set = ChartSet::new();
    insert_chart(
        &mut chart_set,
        "timeline",
        "Number of Matches Played",
        charts::win_loss_timeline(&matches),
    );
    insert_chart(
        &mut chart_set,
        "performance_curve",
        "Performance Over Game Time",
        charts::performance_curve(&flatten_curve(&data.performance_curve)),
    );
    insert_chart(
        &mut chart_set,
        "kill_death",
        "Kill and Death Locations",
        charts::kill_death_map(&data.kill_death),
    );
    insert_chart(
        &mut chart_set,
        "percentile_dist",
        "Compared To Community Distribution",
        distributions.as_deref().and_then(charts::percentile_distribution),
    );
    insert_chart(
        &mut chart_set,
        "kda_trend",
        "KDA Trend Over Time",
        charts::kda_trend(&kda_trends(&matches)),
    );
    insert_chart(
        &mut chart_set,
        "mmr_history",
        "MMR History",
        charts::mmr_history(&mmr_trends(&mmr_rows)),
    );
    insert_chart(
        &mut chart_set,
        "hero_heatmap",
        "Hero Activity By Weekday",
        charts::hero_heatmap(&history, &heroes),
    );

    info!(
        "Built report for player {}: {} matches ({} after filter), {} charts",
        player_id,
        history.len(),
        matches.len(),
        chart_set.values().filter(|c| !c.is_placeholder()).count()
    );

    Ok(PlayerReport {
        player_id,
        hero_filter: hero,
        profile,
        summary: summarize(&matches),
        rank,
        top_heroes: heroes,
        top_items: items,
        distributions,
        charts: chart_set,
    })
}

pub fn build_index_overview(
    region: &str,
    leaderboard: &LeaderboardDto,
    ranks: &[Value],
    top_n: usize,
) -> IndexOverview {
    let rank_table = RankTable::from_json(ranks);
    let buckets = rank_distribution(&leaderboard.entries, &rank_table);
    let chart = charts::rank_distribution(&buckets).unwrap_or_else(|| {
        Chart::placeholder("Leaderboard Rank Distribution", INSUFFICIENT_DATA)
    });

    IndexOverview {
        region: region.to_string(),
        rank_distribution_chart: chart,
        leaderboard: top_entries(&leaderboard.entries, &rank_table, top_n),
    }
}

pub fn fetch_index_overview(
    client: &DeadlockApiClient,
    region: &str,
    top_n: usize,
) -> Result<IndexOverview, AppError> {
    let leaderboard = client.get_leaderboard(region)?;
    let ranks = client.get_ranks()?;
    Ok(build_index_overview(region, &leaderboard, &ranks, top_n))
}
