mod terminal;

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracker_core::TaskKind;
use tracker_logging::tracker_info;

use terminal::app::App;
use terminal::config::{Overrides, TrackerConfig};

/// Submit and follow keyword scraping tasks on a tracking service.
#[derive(Debug, Parser)]
#[command(name = "keyword-tracker", version, about)]
struct Cli {
    /// Config file; defaults to ./tracker.ron when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the tracking service.
    #[arg(long, global = true, env = "TRACKER_API_URL")]
    base_url: Option<String>,

    /// Seconds between active-task polls.
    #[arg(long, global = true)]
    poll_interval: Option<u64>,

    /// Videos to collect per keyword.
    #[arg(long, global = true)]
    top_n: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Follow whatever is in the queue.
    Watch {
        /// Exit once no tasks are pending or running.
        #[arg(long)]
        exit_when_idle: bool,
    },
    /// Queue a search for every active keyword.
    RunAll {
        /// Return as soon as the service accepts the batch.
        #[arg(long)]
        no_follow: bool,
    },
    /// Queue a search for a single keyword.
    Search {
        keyword: String,
        #[arg(long)]
        no_follow: bool,
    },
    /// Manage the keyword registry.
    Keywords {
        #[command(subcommand)]
        action: KeywordAction,
    },
    /// Print the videos collected by one search.
    ShowSearch { id: u64 },
}

#[derive(Debug, Subcommand)]
enum KeywordAction {
    List,
    Add { keyword: String },
    Toggle { id: u64 },
    Delete { id: u64 },
    /// Recent searches for one keyword.
    History { id: u64 },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, source) = TrackerConfig::load(cli.config.as_deref())?;
    let config = config.apply(&Overrides {
        base_url: cli.base_url.clone(),
        poll_interval_secs: cli.poll_interval,
        result_count: cli.top_n,
    });
    config.validate()?;

    terminal::logging::initialize(config.log_destination, config.log_level());
    match &source {
        Some(path) => tracker_info!("Loaded config from {}", path.display()),
        None => tracker_info!("No config file; using defaults"),
    }
    tracker_info!("Using task service at {}", config.base_url);

    let stdout = io::stdout();
    let mut app = App::new(
        config.client_settings(),
        config.tracker_settings(),
        stdout.lock(),
    )?;

    match cli.command {
        Command::Watch { exit_when_idle } => app.watch(exit_when_idle),
        Command::RunAll { no_follow } => app.submit(TaskKind::RunAll, None, !no_follow),
        Command::Search { keyword, no_follow } => {
            app.submit(TaskKind::Search, Some(keyword), !no_follow)
        }
        Command::Keywords { action } => match action {
            KeywordAction::List => app.list_keywords(),
            KeywordAction::Add { keyword } => app.add_keyword(keyword),
            KeywordAction::Toggle { id } => app.toggle_keyword(id),
            KeywordAction::Delete { id } => app.delete_keyword(id),
            KeywordAction::History { id } => app.keyword_history(id),
        },
        Command::ShowSearch { id } => app.show_search(id),
    }
}
