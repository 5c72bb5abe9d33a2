//! Chart payloads: numeric series plus the style directives a renderer needs.
//! Charts serialise with serde; nothing here draws anything.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::analysis::distribution::DistributionEstimate;
use crate::analysis::leaderboard::RankBucket;
use crate::analysis::rankings::RankedEntity;
use crate::analysis::trend::TrendSeries;
use crate::api::models::KillDeathDto;
use crate::flatten::{CurveRow, MatchHistory, MatchOutcome, MatchRow};

pub const WIN_COLOR: &str = "#22c55e";
pub const LOSS_COLOR: &str = "#ef4444";
pub const KILLS_COLOR: &str = "#22c55e";
pub const DEATHS_COLOR: &str = "#ef4444";
pub const ASSISTS_COLOR: &str = "#3b82f6";
pub const NET_WORTH_COLOR: &str = "#f59e0b";
pub const MMR_COLOR: &str = "#f59e0b";
pub const RANK_COLOR: &str = "#8b5cf6";
pub const COMMUNITY_COLOR: &str = "#66c0f4";
pub const PLAYER_COLOR: &str = "#22ff22";

/// Half-width of the minimap coordinate space.
pub const MAP_EXTENT: f64 = 10_000.0;

/// Percentile markers drawn on distribution charts.
const MARKER_PERCENTILES: [(u8, &str); 5] = [
    (10, "#ff6666"),
    (25, "#ff9944"),
    (50, "#ffcc00"),
    (75, "#99dd66"),
    (90, "#66cc66"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    Line,
    Markers,
    Bar,
    Area,
    Heatmap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Axis {
    Numbers(Vec<f64>),
    Times(Vec<DateTime<Utc>>),
    Labels(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub name: String,
    pub kind: TraceKind,
    pub color: String,
    pub x: Axis,
    pub y: Axis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<Vec<Vec<f64>>>,
    pub visible: bool,
    pub opacity: f64,
    /// Traces sharing a group are toggled together by a selector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl Trace {
    pub fn new(name: impl Into<String>, kind: TraceKind, color: &str, x: Axis, y: Axis) -> Self {
        Trace {
            name: name.into(),
            kind,
            color: color.to_string(),
            x,
            y,
            z: None,
            visible: true,
            opacity: 1.0,
            group: None,
        }
    }

    pub fn in_group(mut self, group: &str, visible: bool) -> Self {
        self.group = Some(group.to_string());
        self.visible = visible;
        self
    }

    pub fn faint(mut self) -> Self {
        self.opacity = 0.3;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub traces: Vec<Trace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_range: Option<(f64, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_range: Option<(f64, f64)>,
    /// Set instead of traces when the data was insufficient.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl Chart {
    pub fn new(title: &str, x_title: &str, y_title: &str, traces: Vec<Trace>) -> Self {
        Chart {
            title: title.to_string(),
            x_title: x_title.to_string(),
            y_title: y_title.to_string(),
            traces,
            x_range: None,
            y_range: None,
            placeholder: None,
        }
    }

    pub fn placeholder(title: &str, reason: &str) -> Self {
        Chart {
            placeholder: Some(reason.to_string()),
            ..Chart::new(title, "", "", Vec::new())
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder.is_some()
    }
}

pub type ChartSet = BTreeMap<String, Chart>;

/// Wins and losses per UTC day.
pub fn win_loss_timeline(matches: &[MatchRow]) -> Option<Chart> {
    let mut per_day: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for row in matches {
        let Some(result) = row.result else { continue };
        let counts = per_day.entry(row.start_ts.date_naive()).or_default();
        match result {
            MatchOutcome::Win => counts.0 += 1.0,
            MatchOutcome::Loss => counts.1 += 1.0,
        }
    }
    if per_day.is_empty() {
        return None;
    }

    let days: Vec<String> = per_day.keys().map(|d| d.to_string()).collect();
    let wins = per_day.values().map(|c| c.0).collect();
    let losses = per_day.values().map(|c| c.1).collect();

    Some(Chart::new(
        "Number of Matches Played",
        "Date",
        "Number of Matches",
        vec![
            Trace::new("Win", TraceKind::Bar, WIN_COLOR, Axis::Labels(days.clone()), Axis::Numbers(wins)),
            Trace::new("Loss", TraceKind::Bar, LOSS_COLOR, Axis::Labels(days), Axis::Numbers(losses)),
        ],
    ))
}

/// One selectable series per metric the curve carries; the first is shown.
pub fn performance_curve(rows: &[CurveRow]) -> Option<Chart> {
    let metrics: [(&str, &str, fn(&CurveRow) -> Option<f64>); 4] = [
        ("Net Worth", NET_WORTH_COLOR, |r: &CurveRow| r.net_worth),
        ("Kills", KILLS_COLOR, |r: &CurveRow| r.kills),
        ("Deaths", DEATHS_COLOR, |r: &CurveRow| r.deaths),
        ("Assists", ASSISTS_COLOR, |r: &CurveRow| r.assists),
    ];

    let mut traces = Vec::new();
    for (name, color, read) in metrics {
        let points: Vec<(f64, f64)> = rows
            .iter()
            .filter_map(|r| read(r).map(|v| (r.game_time_min, v)))
            .collect();
        if points.is_empty() {
            continue;
        }
        let (x, y): (Vec<f64>, Vec<f64>) = points.into_iter().unzip();
        let first = traces.is_empty();
        traces.push(
            Trace::new(name, TraceKind::Line, color, Axis::Numbers(x), Axis::Numbers(y))
                .in_group(name, first),
        );
    }
    if traces.is_empty() {
        return None;
    }

    let title = format!("Cumulative {} Over Game Time", traces[0].name);
    Some(Chart::new(&title, "Game Time (minutes)", "Value", traces))
}

/// Kill and death locations on the minimap.
pub fn kill_death_map(points: &[KillDeathDto]) -> Option<Chart> {
    if points.is_empty() {
        return None;
    }

    let mut traces = Vec::new();
    for (label, color, select) in [
        ("Kills", KILLS_COLOR, (|p: &KillDeathDto| p.kills > 0) as fn(&KillDeathDto) -> bool),
        ("Deaths", DEATHS_COLOR, |p: &KillDeathDto| p.deaths > 0),
    ] {
        let (x, y): (Vec<f64>, Vec<f64>) = points
            .iter()
            .filter(|p| select(p))
            .map(|p| (p.position_x, p.position_y))
            .unzip();
        if x.is_empty() {
            continue;
        }
        let name = format!("{label} ({})", x.len());
        traces.push(Trace::new(name, TraceKind::Markers, color, Axis::Numbers(x), Axis::Numbers(y)));
    }
    if traces.is_empty() {
        return None;
    }

    let mut chart = Chart::new("Kill and Death Locations", "", "", traces);
    chart.x_range = Some((-MAP_EXTENT, MAP_EXTENT));
    chart.y_range = Some((-MAP_EXTENT, MAP_EXTENT));
    Some(chart)
}

/// Community curve, percentile markers and the player's average per metric.
/// Each metric is a group; only the first group starts visible.
pub fn percentile_distribution(estimates: &[DistributionEstimate]) -> Option<Chart> {
    let first = estimates.first()?;

    let mut traces = Vec::new();
    for (i, est) in estimates.iter().enumerate() {
        let visible = i == 0;
        let peak = est.density.iter().copied().fold(0.0, f64::max);

        traces.push(
            Trace::new(
                "Community Distribution",
                TraceKind::Area,
                COMMUNITY_COLOR,
                Axis::Numbers(est.x.clone()),
                Axis::Numbers(est.density.clone()),
            )
            .in_group(&est.metric, visible),
        );

        for (p, color) in MARKER_PERCENTILES {
            let Some(&value) = est.percentiles.get(&p) else { continue };
            traces.push(
                Trace::new(
                    format!("P{p}"),
                    TraceKind::Line,
                    color,
                    Axis::Numbers(vec![value, value]),
                    Axis::Numbers(vec![0.0, peak * 0.95]),
                )
                .in_group(&est.metric, visible),
            );
        }

        traces.push(
            Trace::new(
                format!("Your Average ({})", est.rank_label),
                TraceKind::Line,
                PLAYER_COLOR,
                Axis::Numbers(vec![est.player_value, est.player_value]),
                Axis::Numbers(vec![0.0, peak * 1.1]),
            )
            .in_group(&est.metric, visible),
        );
    }

    let title = format!("{} Compared To Community Distribution", first.label);
    Some(Chart::new(&title, &first.label, "Probability Density", traces))
}

fn trend_traces(series: &[TrendSeries], colors: &[(&str, &str)]) -> Vec<Trace> {
    let mut traces = Vec::new();
    for s in series {
        let color = colors
            .iter()
            .find(|(name, _)| *name == s.name)
            .map(|(_, c)| *c)
            .unwrap_or(COMMUNITY_COLOR);
        let times: Vec<DateTime<Utc>> = s.points.iter().map(|p| p.timestamp).collect();
        let averages = s.points.iter().map(|p| p.windowed_average).collect();
        let raw = s.points.iter().map(|p| p.value).collect();

        traces.push(Trace::new(
            format!("{} (7-day avg)", s.name),
            TraceKind::Line,
            color,
            Axis::Times(times.clone()),
            Axis::Numbers(averages),
        ));
        traces.push(
            Trace::new(
                format!("{} (per match)", s.name),
                TraceKind::Markers,
                color,
                Axis::Times(times),
                Axis::Numbers(raw),
            )
            .faint(),
        );
    }
    traces
}

pub fn kda_trend(series: &[TrendSeries]) -> Option<Chart> {
    if series.iter().all(|s| s.points.is_empty()) {
        return None;
    }
    let colors = [("Kills", KILLS_COLOR), ("Deaths", DEATHS_COLOR), ("Assists", ASSISTS_COLOR)];
    Some(Chart::new(
        "KDA Trend Over Time (7-Day Rolling Average)",
        "Date",
        "Average Count",
        trend_traces(series, &colors),
    ))
}

pub fn mmr_history(series: &[TrendSeries]) -> Option<Chart> {
    if series.iter().all(|s| s.points.is_empty()) {
        return None;
    }
    let colors = [("MMR", MMR_COLOR), ("Rank", RANK_COLOR)];
    Some(Chart::new(
        "MMR History",
        "Date",
        "MMR (Player Score)",
        trend_traces(series, &colors),
    ))
}

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Matches per UTC weekday for each ranked hero.
pub fn hero_heatmap(history: &MatchHistory, heroes: &[RankedEntity]) -> Option<Chart> {
    if heroes.is_empty() {
        return None;
    }

    let z: Vec<Vec<f64>> = heroes
        .iter()
        .map(|hero| {
            let mut counts = [0.0; 7];
            for row in history.rows().iter().filter(|r| r.hero_id == hero.id) {
                counts[row.start_ts.weekday().num_days_from_monday() as usize] += 1.0;
            }
            counts.to_vec()
        })
        .collect();

    let days = WEEKDAYS.iter().map(|d| d.to_string()).collect();
    let names = heroes.iter().map(|h| h.name.clone()).collect();
    let mut trace = Trace::new(
        "Matches",
        TraceKind::Heatmap,
        COMMUNITY_COLOR,
        Axis::Labels(days),
        Axis::Labels(names),
    );
    trace.z = Some(z);

    Some(Chart::new("Hero Activity By Weekday", "Weekday", "Hero", vec![trace]))
}

pub fn rank_distribution(buckets: &[RankBucket]) -> Option<Chart> {
    if buckets.is_empty() {
        return None;
    }
    let names = buckets.iter().map(|b| b.name.clone()).collect();
    let players = buckets.iter().map(|b| b.players as f64).collect();
    Some(Chart::new(
        "Leaderboard Rank Distribution",
        "Rank",
        "Players",
        vec![Trace::new(
            "Players",
            TraceKind::Bar,
            RANK_COLOR,
            Axis::Labels(names),
            Axis::Numbers(players),
        )],
    ))
}
