mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use joyplay_server::AppConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser)]
#[command(name = "joyplay")]
#[command(about = "Playground server: run programs with timed output, share snippets")]
#[command(version)]
pub struct Cli {
    /// Config file (default: ~/.config/joyplay/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Listen address, overriding the config file
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Run a program locally and replay its output with the recorded pacing
    Run {
        /// Source file
        file: PathBuf,

        /// Engine executable, overriding the config file
        #[arg(short, long)]
        engine: Option<String>,

        /// Time limit such as "2s" or "500ms"
        #[arg(short, long, value_parser = parse_duration)]
        deadline: Option<Duration>,
    },
    /// Print the formatted source of a file
    Fmt {
        /// Source file
        file: PathBuf,

        /// Also fix up the import list
        #[arg(long)]
        imports: bool,
    },
    /// Store a snippet and print its id
    Share {
        /// Source file
        file: PathBuf,
    },
    /// Print the snippet stored under an id
    Get {
        /// Snippet id
        id: String,
    },
}

fn parse_duration(input: &str) -> Result<Duration, String> {
    humantime_serde::re::humantime::parse_duration(input).map_err(|e| e.to_string())
}

/// Initialize tracing to stderr, and to `log_file` when given.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_logging(verbose: bool, log_file: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "joyplay={0},joyplay_server={0},joyplay_sandbox={0},joyplay_store={0}",
            log_level
        ))
    });

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let name = path
                .file_name()
                .with_context(|| format!("Log file path has no file name: {}", path.display()))?;
            let file_appender = tracing_appender::rolling::never(dir, name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(file_layer)
        .with(filter)
        .init();

    Ok(guard)
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log_file.as_ref())?;
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind_address = bind;
            }
            commands::execute_serve(&config).await
        }
        Commands::Run {
            file,
            engine,
            deadline,
        } => {
            if let Some(engine) = engine {
                config.sandbox.engine = engine;
            }
            if let Some(deadline) = deadline {
                config.sandbox.deadline = deadline;
            }
            commands::execute_run(&config, &file).await
        }
        Commands::Fmt { file, imports } => commands::execute_fmt(&config, &file, imports).await,
        Commands::Share { file } => commands::execute_share(&config, &file).await,
        Commands::Get { id } => commands::execute_get(&config, &id).await,
    }
}
