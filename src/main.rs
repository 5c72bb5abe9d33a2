use anyhow::Context;
use clap::{Parser, Subcommand};
use deadlock_insight::analysis::leaderboard::LEADERBOARD_SIZE;
use deadlock_insight::api::client::DeadlockApiClient;
use deadlock_insight::cache::TtlCache;
use deadlock_insight::config::Config;
use deadlock_insight::display::output::{
    display_error, display_info, display_overview, display_report, display_success,
};
use deadlock_insight::pipeline::{
    build_report, fetch_index_overview, fetch_player_data, parse_player_id, IndexOverview,
    PlayerReport,
};
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "Deadlock Insight")]
#[command(about = "Deadlock player stats compared to the community", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one player's matches, percentiles and trends
    Analyze {
        /// Numeric account id (SteamID3)
        player_id: String,

        /// Only use matches played with this hero id
        #[arg(long)]
        hero: Option<u32>,

        /// Write the chart JSON (default: ~/.deadlock_insight/<player>.charts.json)
        #[arg(long, num_args = 0..=1)]
        export: Option<Option<PathBuf>>,

        /// Only fetch item builds for this many recent matches (default: all)
        #[arg(long)]
        item_matches: Option<usize>,
    },
    /// Show the leaderboard and its rank distribution
    Leaderboard {
        /// Leaderboard region (default from DEADLOCK_LEADERBOARD_REGION)
        #[arg(short, long)]
        region: Option<String>,

        /// Number of players to list
        #[arg(short, long, default_value_t = LEADERBOARD_SIZE)]
        top: usize,

        /// Redisplay every N seconds; data refreshes once the cache TTL passes
        #[arg(long)]
        watch: Option<u64>,
    },
}

fn main() {
    let args = Args::parse();
    init_tracing(&args.log_level, args.json_logs);

    if let Err(e) = run(args) {
        tracing::error!("{:#}", e);
        display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;

    match args.command {
        Command::Analyze {
            player_id,
            hero,
            export,
            item_matches,
        } => {
            let player_id = parse_player_id(&player_id)?;
            let client = DeadlockApiClient::new(config)?;

            display_info(&format!("Fetching data for player {}", player_id));
            let pb = ProgressBar::new_spinner();
            pb.enable_steady_tick(Duration::from_millis(120));
            let fetched = fetch_player_data(&client, player_id, hero, item_matches, |step| {
                pb.set_message(step.to_string())
            });
            pb.finish_and_clear();
            let data = fetched?;
            display_success(&format!("Fetched {} matches", data.match_history.len()));

            let report = build_report(player_id, &data, hero)?;
            display_report(&report);

            if let Some(path) = export {
                let written = export_charts(&report, path)?;
                display_success(&format!("Charts written to {}", written.display()));
            }
        }
        Command::Leaderboard { region, top, watch } => {
            if let Some(region) = region {
                config.leaderboard_region = region;
            }
            let region = config.leaderboard_region.clone();
            let ttl = chrono::Duration::hours(config.cache_ttl_hours);
            let client = DeadlockApiClient::new(config)?;
            let cache: TtlCache<IndexOverview> = TtlCache::new(ttl);

            loop {
                let overview = cache.get_or_refresh(|| fetch_index_overview(&client, &region, top))?;
                display_overview(&overview);
                match watch {
                    Some(secs) => std::thread::sleep(Duration::from_secs(secs)),
                    None => break,
                }
            }
        }
    }

    Ok(())
}

fn export_charts(report: &PlayerReport, path: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let path = match path {
        Some(path) => path,
        None => dirs::home_dir()
            .context("Could not find home directory")?
            .join(".deadlock_insight")
            .join(format!("{}.charts.json", report.player_id)),
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&report.charts).context("Failed to serialise charts")?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
