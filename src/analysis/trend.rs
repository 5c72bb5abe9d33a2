use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::flatten::{MatchRow, MmrRow};

pub const TREND_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub windowed_average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub name: String,
    pub points: Vec<TrendPoint>,
}

/// Trailing time-window mean. Each point averages every observation with a
/// timestamp in `(t - window, t]`, duplicates of `t` included. Output is
/// sorted by time and keeps one point per input.
pub fn rolling_average(observations: &[(DateTime<Utc>, f64)], window: Duration) -> Vec<TrendPoint> {
    let mut sorted = observations.to_vec();
    sorted.sort_by_key(|(timestamp, _)| *timestamp);

    sorted
        .iter()
        .map(|&(timestamp, value)| {
            let start = sorted.partition_point(|(t, _)| *t <= timestamp - window);
            let end = sorted.partition_point(|(t, _)| *t <= timestamp);
            let in_window = &sorted[start..end];
            let sum: f64 = in_window.iter().map(|(_, v)| v).sum();
            TrendPoint {
                timestamp,
                value,
                windowed_average: sum / in_window.len() as f64,
            }
        })
        .collect()
}

pub fn weekly_trend(name: &str, observations: &[(DateTime<Utc>, f64)]) -> TrendSeries {
    TrendSeries {
        name: name.to_string(),
        points: rolling_average(observations, Duration::days(TREND_WINDOW_DAYS)),
    }
}

/// Kills, deaths and assists trends over the given matches.
pub fn kda_trends(matches: &[MatchRow]) -> Vec<TrendSeries> {
    let counters: [(&str, fn(&MatchRow) -> u32); 3] = [
        ("Kills", |m: &MatchRow| m.kills),
        ("Deaths", |m: &MatchRow| m.deaths),
        ("Assists", |m: &MatchRow| m.assists),
    ];

    counters
        .iter()
        .map(|(name, read)| {
            let observations: Vec<_> = matches
                .iter()
                .map(|m| (m.start_ts, f64::from(read(m))))
                .collect();
            weekly_trend(name, &observations)
        })
        .collect()
}

/// MMR trend, plus a rank trend when the history carries rank values.
pub fn mmr_trends(history: &[MmrRow]) -> Vec<TrendSeries> {
    let mut series = Vec::new();
    if history.is_empty() {
        return series;
    }

    let scores: Vec<_> = history.iter().map(|r| (r.start_ts, r.player_score)).collect();
    series.push(weekly_trend("MMR", &scores));

    let ranks: Vec<_> = history
        .iter()
        .filter_map(|r| r.rank.map(|rank| (r.start_ts, rank)))
        .collect();
    if !ranks.is_empty() {
        series.push(weekly_trend("Rank", &ranks));
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + n * 86_400, 0).unwrap()
    }

    fn averages(points: &[TrendPoint]) -> Vec<f64> {
        points.iter().map(|p| p.windowed_average).collect()
    }

    #[test]
    fn window_excludes_point_exactly_seven_days_back() {
        let points = rolling_average(
            &[(day(0), 10.0), (day(1), 20.0), (day(8), 30.0)],
            Duration::days(7),
        );
        assert_eq!(averages(&points), vec![10.0, 15.0, 30.0]);
    }

    #[test]
    fn window_includes_point_just_inside_seven_days() {
        let almost_week = day(7) - Duration::seconds(1);
        let points = rolling_average(&[(day(0), 10.0), (almost_week, 20.0)], Duration::days(7));
        assert_eq!(averages(&points), vec![10.0, 15.0]);
    }

    #[test]
    fn unsorted_input_is_sorted_and_row_count_kept() {
        let points = rolling_average(
            &[(day(3), 3.0), (day(1), 1.0), (day(2), 2.0)],
            Duration::days(7),
        );
        let timestamps: Vec<_> = points.iter().map(|p| p.timestamp).collect();
        assert_eq!(timestamps, vec![day(1), day(2), day(3)]);
        assert_eq!(averages(&points), vec![1.0, 1.5, 2.0]);
        assert_eq!(points[2].value, 3.0);
    }

    #[test]
    fn duplicate_timestamps_are_averaged_together() {
        let points = rolling_average(
            &[(day(0), 4.0), (day(0), 8.0), (day(20), 1.0)],
            Duration::days(7),
        );
        assert_eq!(averages(&points), vec![6.0, 6.0, 1.0]);
    }

    #[test]
    fn first_point_averages_itself_and_empty_input_is_empty() {
        assert_eq!(averages(&rolling_average(&[(day(0), 9.0)], Duration::days(7))), vec![9.0]);
        assert!(rolling_average(&[], Duration::days(7)).is_empty());
    }

    #[test]
    fn mmr_trend_skips_rank_series_without_ranks() {
        let history = vec![MmrRow {
            match_id: 1,
            start_ts: day(0),
            player_score: 1500.0,
            rank: None,
            division: None,
            division_tier: None,
        }];
        let series = mmr_trends(&history);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].name, "MMR");
        assert!(mmr_trends(&[]).is_empty());
    }
}
