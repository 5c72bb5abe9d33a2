use crate::analysis::distribution::DistributionEstimate;
use crate::analysis::leaderboard::LeaderboardRow;
use crate::analysis::rankings::RankedEntity;
use crate::charts::Axis;
use crate::pipeline::{IndexOverview, PlayerReport};
use colored::*;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct RankedRow {
    #[tabled(rename = "#")]
    rank: String,
    name: String,
    matches: String,
    wins: String,
    win_rate: String,
}

#[derive(Tabled)]
struct PercentileRow {
    metric: String,
    you: String,
    median: String,
    standing: String,
}

#[derive(Tabled)]
struct LeaderboardTableRow {
    #[tabled(rename = "#")]
    rank: String,
    player: String,
    division: String,
}

pub fn display_error(error: &str) {
    eprintln!("{} {}", "❌ Error:".red().bold(), error);
}

pub fn display_info(message: &str) {
    println!("{} {}", "ℹ️".cyan(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

fn header(title: &str) {
    println!("\n{}", title.bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());
}

// "#rrggbb" to a truecolor foreground; malformed colours print plain.
fn paint(text: &str, hex: &str) -> ColoredString {
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
    };
    match (channel(1), channel(3), channel(5)) {
        (Some(r), Some(g), Some(b)) => text.truecolor(r, g, b),
        _ => text.normal(),
    }
}

pub fn display_report(report: &PlayerReport) {
    let title = match report.hero_filter {
        Some(hero) => format!("🎮 {} (hero {})", report.profile.username, hero),
        None => format!("🎮 {}", report.profile.username),
    };
    header(&title);

    if let Some(rank) = &report.rank {
        let subtier = if rank.subtier > 0 {
            format!(" {}", rank.subtier)
        } else {
            String::new()
        };
        println!("{} {}{}", "🏅 Rank:".bold(), rank.name.yellow(), subtier);
    }

    match &report.summary {
        Some(summary) => println!(
            "{} {} W / {} L ({} WR) over {} matches\n{} {} / {} / {}",
            "📈 Overall:".bold(),
            summary.wins.to_string().green(),
            summary.losses.to_string().red(),
            summary.win_rate,
            summary.total_matches,
            "⚔️ Avg K/D/A:".bold(),
            summary.avg_kills,
            summary.avg_deaths,
            summary.avg_assists
        ),
        None => println!("{}", "No matches for this selection".yellow()),
    }

    display_ranked("🦸 TOP HEROES", &report.top_heroes);
    display_ranked("🛒 TOP ITEMS", &report.top_items);

    match &report.distributions {
        Some(estimates) => display_percentiles(estimates),
        None => {
            header("📊 COMMUNITY PERCENTILES");
            println!("{}", "No distribution data available".yellow());
        }
    }

    let placeholders: Vec<&str> = report
        .charts
        .iter()
        .filter(|(_, chart)| chart.is_placeholder())
        .map(|(name, _)| name.as_str())
        .collect();
    if !placeholders.is_empty() {
        println!(
            "\n{} {}",
            "Not enough data for:".dimmed(),
            placeholders.join(", ").dimmed()
        );
    }
    println!();
}

fn display_ranked(title: &str, entries: &[RankedEntity]) {
    header(title);
    if entries.is_empty() {
        println!("{}", "Nothing to rank yet".yellow());
        return;
    }

    let rows: Vec<RankedRow> = entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| RankedRow {
            rank: format!("#{}", idx + 1),
            name: entry.name.clone(),
            matches: entry.matches.to_string(),
            wins: entry.wins.to_string(),
            win_rate: entry.win_rate_label(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

fn display_percentiles(estimates: &[DistributionEstimate]) {
    header("📊 COMMUNITY PERCENTILES");

    let rows: Vec<PercentileRow> = estimates
        .iter()
        .map(|est| PercentileRow {
            metric: est.label.clone(),
            you: format!("{:.2}", est.player_value),
            median: est
                .percentiles
                .get(&50)
                .map(|p| format!("{:.2}", p))
                .unwrap_or_else(|| "-".to_string()),
            standing: paint(&est.rank_label, &est.rank_color).to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

pub fn display_overview(overview: &IndexOverview) {
    header(&format!("🏆 LEADERBOARD ({})", overview.region));
    display_leaderboard(&overview.leaderboard);

    let chart = &overview.rank_distribution_chart;
    if let Some(trace) = chart.traces.first() {
        println!("\n{}", chart.title.bold().yellow());
        if let (Axis::Labels(names), Axis::Numbers(counts)) = (&trace.x, &trace.y) {
            let max = counts.iter().copied().fold(1.0, f64::max);
            for (name, count) in names.iter().zip(counts) {
                let width = (count / max * 40.0).round() as usize;
                println!("  {:<12} {} {}", name, "█".repeat(width).magenta(), count);
            }
        }
    }
    println!();
}

fn display_leaderboard(rows: &[LeaderboardRow]) {
    if rows.is_empty() {
        println!("{}", "Leaderboard is empty".yellow());
        return;
    }

    let rows: Vec<LeaderboardTableRow> = rows
        .iter()
        .map(|row| LeaderboardTableRow {
            rank: format!("#{}", row.rank),
            player: row.account_name.clone(),
            division: match (&row.rank_name, row.subtier) {
                (Some(name), Some(sub)) if sub > 0 => format!("{name} {sub}"),
                (Some(name), _) => name.clone(),
                (None, _) => "-".to_string(),
            },
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}
