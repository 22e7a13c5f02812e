use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use commands::{browse, config, item, refresh, serve, AppContext};
use std::path::PathBuf;
use uuid::Uuid;
use watchtrack_models::{MediaKind, TrendingWindow};

mod commands;
mod logging;
mod output;
mod server;
mod ui;

#[derive(Parser)]
#[command(name = "watchtrack")]
#[command(about = "watchtrack - Track movies and shows from announcement to streaming")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Directory holding config.toml and credentials.toml
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Owner of the watchlist rows this invocation reads and writes
    #[arg(long, global = true, env = "WATCHTRACK_USER", default_value = "default")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Movie,
    Show,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Movie => MediaKind::Movie,
            KindArg::Show => MediaKind::Show,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum WindowArg {
    Day,
    Week,
}

impl From<WindowArg> for TrendingWindow {
    fn from(window: WindowArg) -> Self {
        match window {
            WindowArg::Day => TrendingWindow::Day,
            WindowArg::Week => TrendingWindow::Week,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Re-enrich one watchlist item now
    Refresh {
        /// Watchlist item id
        id: Uuid,
    },
    /// Refresh the stalest eligible items within a time budget
    #[command(long_about = "Refresh the least recently enriched items across all users, in parallel, each bounded by the configured time budget. This is what the HTTP cron endpoint runs.")]
    Cron,
    /// Refresh every eligible item in paced chunks
    #[command(long_about = "Refresh every refresh-eligible item in fixed-size chunks, pausing between chunks to stay under the catalog's rate limit. Intended for occasional maintenance runs.")]
    Sweep {
        /// Items per chunk (defaults to refresh.sweep_chunk_size)
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Seconds to pause between chunks (defaults to refresh.sweep_delay_secs)
        #[arg(long)]
        delay_secs: Option<u64>,
    },
    /// Show the Upcoming view
    Upcoming,
    /// List every tracked item
    List,
    /// Search the catalog
    Search {
        query: String,

        #[arg(long, value_enum, default_value = "movie")]
        kind: KindArg,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show trending titles
    Trending {
        #[arg(long, value_enum, default_value = "movie")]
        kind: KindArg,

        #[arg(long, value_enum, default_value = "week")]
        window: WindowArg,
    },
    /// Add, update or remove a watchlist item
    Item {
        #[command(subcommand)]
        cmd: ItemCommands,
    },
    /// Serve the health and cron endpoints over HTTP
    Serve {
        /// Address to listen on (defaults to server.bind)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Inspect or create configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ItemCommands {
    /// Track a catalog title
    Add {
        tmdb_id: u32,

        #[arg(long, value_enum)]
        kind: KindArg,
    },
    /// Stop tracking an item
    Remove { id: Uuid },
    /// Mark watched (shows: every released season)
    Watched { id: Uuid },
    /// Clear watched state
    Unwatched { id: Uuid },
    /// Mark dropped
    Dropped { id: Uuid },
    /// Set the last fully watched season (shows)
    Season { id: Uuid, season: u32 },
    /// Set episodes watched in the current season (shows)
    Progress { id: Uuid, episodes: u32 },
    /// Pin a streaming release date by hand (movies)
    ManualDate {
        id: Uuid,

        /// YYYY-MM-DD
        date: NaiveDate,

        /// Streaming service name to show next to the date
        #[arg(long)]
        provider: Option<String>,
    },
    /// Remove a hand-pinned release date
    ResetDate { id: Uuid },
    /// Hide from the Upcoming view
    Dismiss { id: Uuid },
    /// Show in the Upcoming view again
    Restore { id: Uuid },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks secrets)
    Show {
        /// Show secrets unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Write a default config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let ctx = AppContext::load(cli.config_dir.clone(), cli.user.clone())?;

    logging::init_logging(cli.verbose, cli.quiet, &ctx.config.logging)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to initialize logging: {}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Refresh { id } => refresh::run_refresh(&ctx, id, &output).await,
        Commands::Cron => refresh::run_cron(&ctx, &output).await,
        Commands::Sweep { chunk_size, delay_secs } => refresh::run_sweep(&ctx, chunk_size, delay_secs, &output).await,
        Commands::Upcoming => browse::run_upcoming(&ctx, &output).await,
        Commands::List => browse::run_list(&ctx, &output).await,
        Commands::Search { query, kind, page } => browse::run_search(&ctx, &query, kind.into(), page, &output).await,
        Commands::Trending { kind, window } => browse::run_trending(&ctx, kind.into(), window.into(), &output).await,
        Commands::Item { cmd } => item::run_item(&ctx, cmd, &output).await,
        Commands::Serve { bind } => serve::run_serve(&ctx, bind, &output).await,
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show { full } => config::show_config(&ctx, full, &output),
            ConfigCommands::Init { force } => config::init_config(&ctx, force, &output),
        },
    }
}
