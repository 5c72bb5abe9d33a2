//! Community distribution estimates.
//!
//! The stats API only reports an average and a sparse set of percentiles per
//! metric. From those we build a Gaussian approximation of the community
//! distribution and place the player's average on it as a percentile rank.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::f64::consts::PI;
use tracing::debug;

use crate::flatten::{flatten_value, FlatFields, FlatRecord};

pub const PERCENTILE_IDS: [u8; 9] = [1, 5, 10, 25, 50, 75, 90, 95, 99];

/// Shown whenever two percentiles exist, however narrow their spread.
pub const ALWAYS_SHOW: [&str; 3] = ["kills", "deaths", "assists"];

pub const DISTRIBUTION_METRICS: [(&str, &str); 24] = [
    ("kills", "Kills"),
    ("deaths", "Deaths"),
    ("assists", "Assists"),
    ("kd", "K/D Ratio"),
    ("kda", "KDA Ratio"),
    ("net_worth", "Net Worth (Souls)"),
    ("net_worth_per_min", "Souls Per Minute"),
    ("last_hits", "Last Hits"),
    ("denies", "Denies"),
    ("player_damage", "Player Damage"),
    ("player_damage_per_min", "Player Damage Per Minute"),
    ("player_damage_taken_per_min", "Damage Taken Per Minute"),
    ("player_healing", "Player Healing"),
    ("healing", "Total Healing"),
    ("boss_damage", "Boss Damage"),
    ("neutral_damage", "Neutral Damage"),
    ("creep_damage", "Creep Damage"),
    ("accuracy", "Accuracy (%)"),
    ("crit_shot_rate", "Critical Hit Rate"),
    ("headshot_rate", "Headshot Rate"),
    ("hero_bullets_hit", "Hero Bullets Hit"),
    ("hero_bullets_hit_crit", "Hero Crit Bullets"),
    ("level_at_first_death", "Level at First Death"),
    ("deaths_to_neutrals", "Deaths to Neutrals"),
];

pub const SAMPLE_COUNT: usize = 300;

const MIN_SPREAD: f64 = 0.01;
const SCALE_EPSILON: f64 = 1e-9;

const RED: (u8, u8, u8) = (0xef, 0x44, 0x44);
const YELLOW: (u8, u8, u8) = (0xea, 0xb3, 0x08);
const GREEN: (u8, u8, u8) = (0x22, 0xc5, 0x5e);

/// Average, deviation and percentiles of one metric. Absent fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricSummary {
    pub key: String,
    pub avg: Option<f64>,
    pub std: Option<f64>,
    pub percentiles: BTreeMap<u8, f64>,
}

impl MetricSummary {
    pub fn from_flat(key: &str, stats: &FlatRecord) -> Self {
        let percentiles = PERCENTILE_IDS
            .iter()
            .filter_map(|&p| {
                stats
                    .number(&format!("{key}.percentile{p}"))
                    .map(|value| (p, value))
            })
            .collect();

        MetricSummary {
            key: key.to_string(),
            avg: stats.number(&format!("{key}.avg")),
            std: stats.number(&format!("{key}.std")),
            percentiles,
        }
    }

    pub fn percentile(&self, p: u8) -> Option<f64> {
        self.percentiles.get(&p).copied()
    }

    fn is_empty(&self) -> bool {
        self.avg.is_none() && self.std.is_none() && self.percentiles.is_empty()
    }
}

/// Reads the player-stats payload: an object keyed by metric name, or a list
/// whose first element is such an object.
pub fn parse_metric_summaries(payload: &Value) -> BTreeMap<String, MetricSummary> {
    let record = match payload {
        Value::Array(list) => match list.first() {
            Some(first) => flatten_value(first),
            None => return BTreeMap::new(),
        },
        Value::Object(_) => flatten_value(payload),
        _ => return BTreeMap::new(),
    };

    DISTRIBUTION_METRICS
        .iter()
        .map(|(key, _)| MetricSummary::from_flat(key, &record))
        .filter(|summary| !summary.is_empty())
        .map(|summary| (summary.key.clone(), summary))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Inclusion {
    Include,
    MissingAverage,
    TooFewPercentiles,
    NarrowSpread,
}

pub fn inclusion(summary: &MetricSummary) -> Inclusion {
    if summary.avg.is_none() {
        return Inclusion::MissingAverage;
    }
    if summary.percentiles.len() < 2 {
        return Inclusion::TooFewPercentiles;
    }
    if ALWAYS_SHOW.contains(&summary.key.as_str()) {
        return Inclusion::Include;
    }
    match spread_pair(summary) {
        Some((low, high)) if (high - low).abs() > MIN_SPREAD => Inclusion::Include,
        _ => Inclusion::NarrowSpread,
    }
}

// Widest well-known pair first, then the outermost percentiles present.
fn spread_pair(summary: &MetricSummary) -> Option<(f64, f64)> {
    [(25, 75), (10, 90), (1, 99)]
        .iter()
        .find_map(|&(a, b)| Some((summary.percentile(a)?, summary.percentile(b)?)))
        .or_else(|| {
            let low = *summary.percentiles.values().next()?;
            let high = *summary.percentiles.values().next_back()?;
            Some((low, high))
        })
}

/// Standard deviation estimate: IQR / 1.35, then (p90 - p10) / 2.56, then
/// (p99 - p1) / 6, then the reported std, then a width tied to the mean.
pub fn estimate_scale(summary: &MetricSummary, center: f64) -> f64 {
    let p = |id| summary.percentile(id);

    let from_percentiles = if let (Some(p25), Some(p75)) = (p(25), p(75)) {
        Some((p75 - p25) / 1.35)
    } else if let (Some(p10), Some(p90)) = (p(10), p(90)) {
        Some((p90 - p10) / 2.56)
    } else if p(1).is_some() || p(99).is_some() {
        Some((p(99).unwrap_or(center) - p(1).unwrap_or(center)) / 6.0)
    } else {
        None
    };

    from_percentiles
        .map(f64::abs)
        .filter(|s| s.is_finite() && *s > SCALE_EPSILON)
        .or_else(|| summary.std.filter(|s| s.is_finite() && *s > SCALE_EPSILON))
        .unwrap_or_else(|| (center.abs() * 0.1).max(1.0))
}

/// x-axis extent: p1..p99 widened by 10% when percentiles exist, otherwise
/// four deviations either side of the mean.
pub fn sample_range(summary: &MetricSummary, mean: f64, scale: f64) -> (f64, f64) {
    let (a, b) = if summary.percentiles.is_empty() {
        (mean - 4.0 * scale, mean + 4.0 * scale)
    } else {
        let low = summary.percentile(1).unwrap_or(mean - 3.0 * scale);
        let high = summary.percentile(99).unwrap_or(mean + 3.0 * scale);
        (low * 0.9, high * 1.1)
    };

    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    if high - low <= SCALE_EPSILON {
        (low - 4.0 * scale, high + 4.0 * scale)
    } else {
        (low, high)
    }
}

pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}

pub fn normal_pdf(x: f64, mean: f64, std: f64) -> f64 {
    let z = (x - mean) / std;
    (-0.5 * z * z).exp() / (std * (2.0 * PI).sqrt())
}

/// Piecewise-linear rank between the bracketing known percentiles. Values
/// outside the known range clamp to the lowest/highest percentile id.
pub fn percentile_rank(value: f64, percentiles: &BTreeMap<u8, f64>) -> Option<f64> {
    let points: Vec<(f64, f64)> = percentiles
        .iter()
        .map(|(&id, &v)| (f64::from(id), v))
        .collect();
    let &(first_id, first_value) = points.first()?;
    let &(last_id, last_value) = points.last()?;

    if value <= first_value {
        return Some(first_id);
    }
    if value >= last_value {
        return Some(last_id);
    }

    for pair in points.windows(2) {
        let (p0, v0) = pair[0];
        let (p1, v1) = pair[1];
        if value >= v0 && value <= v1 {
            if (v1 - v0).abs() <= SCALE_EPSILON {
                return Some(p0);
            }
            return Some(p0 + (value - v0) / (v1 - v0) * (p1 - p0));
        }
    }

    // Non-monotonic percentiles: take the closest known one.
    points
        .iter()
        .min_by(|a, b| (a.1 - value).abs().total_cmp(&(b.1 - value).abs()))
        .map(|&(id, _)| id)
}

pub fn rank_label(rank: f64) -> String {
    if rank >= 50.0 {
        format!("Top {:.0}%", 100.0 - rank)
    } else {
        format!("Bottom {:.0}%", rank)
    }
}

/// Red to yellow below rank 50, yellow to green above. Lower-is-better
/// metrics are coloured the same way.
pub fn rank_color(rank: f64) -> String {
    let rank = rank.clamp(0.0, 100.0);
    let (from, to, t) = if rank < 50.0 {
        (RED, YELLOW, rank / 50.0)
    } else {
        (YELLOW, GREEN, (rank - 50.0) / 50.0)
    };
    let lerp = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        lerp(from.0, to.0),
        lerp(from.1, to.1),
        lerp(from.2, to.2)
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionEstimate {
    pub metric: String,
    pub label: String,
    pub x: Vec<f64>,
    pub density: Vec<f64>,
    pub community_mean: f64,
    pub community_std: f64,
    pub player_value: f64,
    pub player_percentile_rank: f64,
    pub rank_label: String,
    pub rank_color: String,
    pub percentiles: BTreeMap<u8, f64>,
}

pub fn estimate(summary: &MetricSummary, label: &str) -> Option<DistributionEstimate> {
    let decision = inclusion(summary);
    if decision != Inclusion::Include {
        debug!("No distribution for {}: {:?}", summary.key, decision);
        return None;
    }

    let player_value = summary.avg?;
    let community_mean = summary.percentile(50).unwrap_or(player_value);
    let community_std = estimate_scale(summary, community_mean);
    let (low, high) = sample_range(summary, community_mean, community_std);
    let x = linspace(low, high, SAMPLE_COUNT);
    let density = x
        .iter()
        .map(|&v| normal_pdf(v, community_mean, community_std))
        .collect();
    let rank = percentile_rank(player_value, &summary.percentiles)?;

    Some(DistributionEstimate {
        metric: summary.key.clone(),
        label: label.to_string(),
        x,
        density,
        community_mean,
        community_std,
        player_value,
        player_percentile_rank: rank,
        rank_label: rank_label(rank),
        rank_color: rank_color(rank),
        percentiles: summary.percentiles.clone(),
    })
}

/// Estimates every known metric; `None` when not a single one qualifies.
pub fn estimate_all(
    summaries: &BTreeMap<String, MetricSummary>,
) -> Option<Vec<DistributionEstimate>> {
    let estimates: Vec<DistributionEstimate> = DISTRIBUTION_METRICS
        .iter()
        .filter_map(|(key, label)| summaries.get(*key).and_then(|s| estimate(s, label)))
        .collect();

    if estimates.is_empty() {
        None
    } else {
        Some(estimates)
    }
}
