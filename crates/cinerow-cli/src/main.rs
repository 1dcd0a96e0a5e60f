mod commands;
mod format;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use cinerow_core::catalog::CatalogPage;
use cinerow_core::models::TitleKey;
use cinerow_core::MediaKind;
use cinerow_runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "cinerow", version, about = "Browse, search and play movies and series")]
struct Cli {
    /// Write logs to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// A title on the command line: numeric id plus kind flag.
#[derive(Args, Debug, Clone, Copy)]
struct TitleArg {
    /// Provider id of the title.
    id: u64,

    /// The id refers to a series rather than a movie.
    #[arg(long)]
    series: bool,
}

impl TitleArg {
    fn key(self) -> TitleKey {
        let kind = if self.series {
            MediaKind::Series
        } else {
            MediaKind::Movie
        };
        TitleKey::new(self.id, kind)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the rows of a catalog page
    Browse {
        /// home, series, movies, new or my-list
        #[arg(long, default_value = "home")]
        page: CatalogPage,
        /// Titles shown per row
        #[arg(long, default_value_t = 6)]
        limit: usize,
    },
    /// Search movies and series
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Show full details of a title
    Details {
        #[command(flatten)]
        title: TitleArg,
    },
    /// Titles similar to a title
    Similar {
        #[command(flatten)]
        title: TitleArg,
    },
    /// List the episodes of a season
    Season { series_id: u64, number: u32 },
    /// Resolve a playback URL and record the viewing
    Play {
        #[command(flatten)]
        title: TitleArg,
        #[arg(long)]
        season: Option<u32>,
        #[arg(long)]
        episode: Option<u32>,
    },
    /// Hover a title and wait for its trailer preview
    Preview {
        #[command(flatten)]
        title: TitleArg,
    },
    /// Manage My List
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Inspect and edit watch history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Show configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum FavoritesAction {
    List,
    Add(TitleArg),
    Remove(TitleArg),
    Toggle(TitleArg),
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    List,
    /// Titles not yet finished
    Continue,
    Remove(TitleArg),
    Clear,
    /// Set watched percentage (0-100)
    Progress {
        #[command(flatten)]
        title: TitleArg,
        percent: f32,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the config file location
    Path,
    /// Print the effective configuration
    Show,
    /// Store a TMDB API key in the config file
    SetKey { key: String },
}

fn init_logging(log_file: Option<&Path>, verbose: bool) -> Option<WorkerGuard> {
    let default = if verbose { "cinerow=debug" } else { "cinerow=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    match log_file {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let name = path.file_name().unwrap_or_else(|| "cinerow.log".as_ref());
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_file.as_deref(), cli.verbose);

    if let Err(e) = run(cli.command).await {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Command) -> Result<(), cinerow_runtime::RuntimeError> {
    if let Command::Config { action } = &command {
        return commands::config(action);
    }

    let rt = Runtime::new()?;
    match command {
        Command::Browse { page, limit } => commands::browse(&rt, page, limit).await,
        Command::Search { query } => commands::search(&rt, &query.join(" ")).await,
        Command::Details { title } => commands::details(&rt, title.key()).await,
        Command::Similar { title } => commands::similar(&rt, title.key()).await,
        Command::Season { series_id, number } => commands::season(&rt, series_id, number).await,
        Command::Play {
            title,
            season,
            episode,
        } => commands::play(&rt, title.key(), season, episode).await,
        Command::Preview { title } => commands::preview(&rt, title.key()).await,
        Command::Favorites { action } => commands::favorites(&rt, action).await,
        Command::History { action } => commands::history(&rt, action).await,
        Command::Config { .. } => Ok(()),
    }
}
