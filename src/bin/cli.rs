//! Rematch tracker CLI - link profiles, refresh stats and print leaderboards

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use rematch_tracker::core::DEFAULT_PAGE_SIZE;
use rematch_tracker::store::LinkBackend;
use rematch_tracker::{AppConfig, ProfileSnapshot, Stat, TrackerService};

#[derive(Parser)]
#[command(name = "rematch-tracker")]
#[command(author, version, about = "Rematch profile tracker CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding links and the snapshot cache
    #[arg(long, env = "DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Link backend: auto, sqlite or json
    #[arg(long, env = "LINK_BACKEND")]
    link_backend: Option<String>,

    /// TOML selector table overriding the built-in one
    #[arg(long, env = "SELECTORS_PATH")]
    selectors: Option<PathBuf>,

    /// JSON file mapping user ids to display names
    #[arg(long, env = "USER_DIRECTORY")]
    users: Option<PathBuf>,

    /// Seconds to wait for a profile page to render
    #[arg(long, env = "RENDER_TIMEOUT_SECS")]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Link a user to a tracker profile URL
    Link {
        /// User id
        user: String,

        /// https://www.rematchtracker.com/player/<platform>/<id>
        url: String,

        /// Replace an existing link
        #[arg(long)]
        force: bool,
    },

    /// Remove a user's link
    Unlink {
        /// User id
        user: String,
    },

    /// List linked profiles
    Links,

    /// Remove every link
    ClearLinks {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Scrape a user's profile now and cache it
    Refresh {
        /// User id
        user: String,

        /// Game mode filter (e.g. ranked, quick)
        #[arg(short, long)]
        mode: Option<String>,
    },

    /// Show a user's stats
    Stats {
        /// User id
        user: String,

        /// Show the cached snapshot instead of scraping
        #[arg(long)]
        cached: bool,

        /// Game mode filter (ignored with --cached)
        #[arg(short, long)]
        mode: Option<String>,
    },

    /// Rank cached profiles by a stat
    Leaderboard {
        /// wins, goals, saves, rank, passes, steals, assists or win-percent
        stat: String,

        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Entries per page
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        per_page: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;

    let service = TrackerService::from_config(&config)
        .with_context(|| format!("Failed to open tracker data in {:?}", config.storage.data_dir))?;

    match cli.command {
        Commands::Link { user, url, force } => link(&service, &user, &url, force)?,
        Commands::Unlink { user } => {
            if service.unlink(&user)? {
                println!("{} {}", "Unlinked".green(), user);
            } else {
                println!("{}", format!("{} has no linked profile.", user).yellow());
            }
        }
        Commands::Links => list_links(&service)?,
        Commands::ClearLinks { yes } => clear_links(&service, yes)?,
        Commands::Refresh { user, mode } => {
            let snapshot = refresh(&service, &user, mode.as_deref()).await?;
            print_snapshot(&snapshot);
        }
        Commands::Stats { user, cached, mode } => {
            let snapshot = if cached {
                service.cached(&user)?
            } else {
                refresh(&service, &user, mode.as_deref()).await?
            };
            print_snapshot(&snapshot);
        }
        Commands::Leaderboard {
            stat,
            page,
            per_page,
        } => leaderboard(&service, &stat, page, per_page)?,
    }

    Ok(())
}

/// Environment first, then command-line overrides
fn build_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::from_env()?;

    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = dir.clone();
    }
    if let Some(backend) = &cli.link_backend {
        config.storage.link_backend = backend
            .parse::<LinkBackend>()
            .map_err(anyhow::Error::msg)?;
    }
    if let Some(path) = &cli.selectors {
        config.selectors_path = Some(path.clone());
    }
    if let Some(path) = &cli.users {
        config.user_directory = Some(path.clone());
    }
    if let Some(secs) = cli.timeout {
        config.scraper.timeout_secs = secs;
    }

    Ok(config)
}

fn link(service: &TrackerService, user: &str, url: &str, force: bool) -> Result<()> {
    let record = if force {
        service.force_link(user, url)?
    } else {
        service.link(user, url)?
    };

    println!(
        "{} {} -> {}/{}",
        "Linked".green(),
        record.user_id,
        record.platform,
        record.player_id
    );
    Ok(())
}

fn list_links(service: &TrackerService) -> Result<()> {
    let links = service.list_links()?;

    if links.is_empty() {
        println!("{}", "No linked profiles.".yellow());
        return Ok(());
    }

    println!("{}", "Linked Profiles:".yellow().bold());
    println!("{:<28} {:<20} {:<10} {}", "User", "Id", "Platform", "Player");
    println!("{}", "-".repeat(80));
    for link in &links {
        println!(
            "{:<28} {:<20} {:<10} {}",
            link.display_name, link.record.user_id, link.record.platform, link.record.player_id
        );
    }
    println!("\n{} linked", links.len());

    Ok(())
}

fn clear_links(service: &TrackerService, yes: bool) -> Result<()> {
    if !yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Remove every linked profile?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    service.clear_links()?;
    println!("{}", "All links cleared.".green());
    Ok(())
}

async fn refresh(
    service: &TrackerService,
    user: &str,
    mode: Option<&str>,
) -> Result<ProfileSnapshot> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Fetching profile for {}...", user));

    let result = service.refresh(user, mode).await;
    pb.finish_and_clear();

    Ok(result?)
}

fn print_snapshot(snapshot: &ProfileSnapshot) {
    let stats = &snapshot.stats;

    println!(
        "{} {} ({}/{})",
        "Profile:".yellow().bold(),
        snapshot.user_id,
        snapshot.platform,
        snapshot.player_id
    );
    println!("{}", "-".repeat(40));
    println!("{:<10} {}", "Rank", stats.rank.cyan().bold());
    println!("{:<10} {}", "Wins", stats.wins);
    println!("{:<10} {}", "Losses", stats.losses);
    println!("{:<10} {}", "Win %", snapshot.win_percent_display());
    println!("{:<10} {}", "Goals", stats.goals);
    println!("{:<10} {}", "Assists", stats.assists);
    println!("{:<10} {}", "Passes", stats.passes);
    println!("{:<10} {}", "Steals", stats.steals);
    println!("{:<10} {}", "Saves", stats.saves);
    println!(
        "{}",
        format!(
            "Updated {}",
            snapshot.captured_at.format("%Y-%m-%d %H:%M UTC")
        )
        .dimmed()
    );
}

fn leaderboard(service: &TrackerService, stat: &str, page: usize, per_page: usize) -> Result<()> {
    let board = service.leaderboard(stat, page, per_page)?;

    if board.total_entries == 0 {
        println!(
            "{}",
            format!("No cached profiles to rank by {}.", board.stat).yellow()
        );
        return Ok(());
    }

    println!("{}", leaderboard_title(board.stat).yellow().bold());
    println!("{:>4}  {:<28} {:>12}", "#", "Player", "Value");
    println!("{}", "-".repeat(46));
    for entry in &board.entries {
        let line = format!(
            "{:>4}  {:<28} {:>12}",
            entry.position, entry.display_name, entry.display_value
        );
        if entry.podium {
            println!("{}", line.green().bold());
        } else {
            println!("{}", line);
        }
    }
    println!(
        "\n{}",
        format!(
            "Page {}/{} ({} players)",
            board.page, board.total_pages, board.total_entries
        )
        .dimmed()
    );

    Ok(())
}

fn leaderboard_title(stat: Stat) -> String {
    match stat {
        Stat::WinPercent => "Win % Leaderboard".to_string(),
        other => format!("{} Leaderboard", capitalize(other.key())),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
