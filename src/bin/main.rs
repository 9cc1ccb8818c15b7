//! reportgen CLI - Generate reports from provider data
//!
//! Usage:
//!   reportgen providers
//!   reportgen sync --provider <name>
//!   reportgen generate --provider <name> --report <file.json> [--format table] [--join materialized]
//!   reportgen cache stats
//!   reportgen cache clear [--provider <name>]
//!
//! Examples:
//!   reportgen sync --provider voyanta
//!   reportgen generate --provider voyanta --report reports/market_value.json --format table

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use reportgen::cache::{CachedMetadataStore, MetadataCache};
use reportgen::config::{Credential, Settings};
use reportgen::metadata::{ProviderRegistry, SyncOutcome, WorkerProvider};
use reportgen::report::{
    format_table, JoinKind, ReportDefinition, ReportGenerator, ReportOptions,
};
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "reportgen")]
#[command(about = "reportgen - Generate dimensional reports from external data providers")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to the standard search locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured providers
    Providers,

    /// Bring a provider's cached metadata up to date
    Sync {
        /// Provider name from the config file
        #[arg(short, long)]
        provider: String,
    },

    /// Generate a report from a JSON definition
    Generate {
        /// Provider name from the config file
        #[arg(short, long)]
        provider: String,

        /// Path to the report definition
        #[arg(short, long)]
        report: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        /// Join strategy (overrides the config file)
        #[arg(short, long)]
        join: Option<JoinArg>,
    },

    /// Inspect or clear the metadata cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show entry count and size
    Stats,

    /// Remove cached metadata
    Clear {
        /// Only clear this provider's entries
        #[arg(short, long)]
        provider: Option<String>,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Tables as a JSON array
    Json,
    /// Aligned plain-text tables
    Table,
}

#[derive(Clone, ValueEnum)]
enum JoinArg {
    Recursive,
    Materialized,
}

impl From<JoinArg> for JoinKind {
    fn from(arg: JoinArg) -> Self {
        match arg {
            JoinArg::Recursive => JoinKind::Recursive,
            JoinArg::Materialized => JoinKind::Materialized,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_ref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Providers => cmd_providers(&settings),
        Commands::Sync { provider } => cmd_sync(&settings, &provider).await,
        Commands::Generate {
            provider,
            report,
            format,
            join,
        } => cmd_generate(&settings, &provider, report, format, join).await,
        Commands::Cache { command } => cmd_cache(&settings, command),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so report output on stdout stays machine readable.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_settings(path: Option<&PathBuf>) -> CliResult<Settings> {
    Ok(match path {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    })
}

fn cmd_providers(settings: &Settings) -> CliResult<()> {
    let names = settings.provider_names();
    if names.is_empty() {
        println!("No providers configured.");
        return Ok(());
    }

    println!("Providers:");
    for name in names {
        let provider = settings.get_provider(name)?;
        println!("  - {} (worker: {})", name, provider.worker);
    }
    Ok(())
}

/// Spawn the provider's worker, register it and sync its metadata.
async fn connect(
    settings: &Settings,
    name: &str,
) -> CliResult<(Arc<ProviderRegistry>, Credential, SyncOutcome)> {
    let provider_settings = settings.get_provider(name)?;
    let credential = provider_settings.resolved_credential()?;
    let provider = WorkerProvider::spawn(provider_settings).await?;

    let cache = MetadataCache::open(settings.cache.cache_path()?)?;
    let store = CachedMetadataStore::new(Arc::new(Mutex::new(cache)), name);

    let mut registry = ProviderRegistry::new();
    registry.register(name, Arc::new(provider), Arc::new(store));
    let outcome = registry.init_provider(name, &credential).await?;

    Ok((Arc::new(registry), credential, outcome))
}

async fn cmd_sync(settings: &Settings, name: &str) -> CliResult<()> {
    let (_, _, outcome) = connect(settings, name).await?;
    match outcome {
        SyncOutcome::UpToDate { version } => {
            println!("{}: metadata up to date (version {})", name, version)
        }
        SyncOutcome::Refreshed { from: Some(from), to } => {
            println!("{}: metadata refreshed (version {} -> {})", name, from, to)
        }
        SyncOutcome::Refreshed { from: None, to } => {
            println!("{}: metadata loaded (version {})", name, to)
        }
    }
    Ok(())
}

async fn cmd_generate(
    settings: &Settings,
    name: &str,
    report: PathBuf,
    format: OutputFormat,
    join: Option<JoinArg>,
) -> CliResult<()> {
    let source = fs::read_to_string(&report)
        .map_err(|e| format!("cannot read report '{}': {}", report.display(), e))?;
    let definition = ReportDefinition::from_json(&source)?;

    let mut options = ReportOptions::from(&settings.report);
    if let Some(join) = join {
        options.join = join.into();
    }

    let (registry, credential, _) = connect(settings, name).await?;
    let generator = ReportGenerator::new(registry).with_options(options);
    let tables = generator.generate(name, &credential, &definition).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tables)?),
        OutputFormat::Table => {
            for (i, table) in tables.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print!("{}", format_table(table));
            }
        }
    }
    Ok(())
}

fn cmd_cache(settings: &Settings, command: CacheCommands) -> CliResult<()> {
    let path = settings.cache.cache_path()?;
    let cache = MetadataCache::open(&path)?;

    match command {
        CacheCommands::Stats => {
            let stats = cache.stats()?;
            println!("Cache: {}", path.display());
            println!("  entries: {}", stats.entry_count);
            println!("  size:    {} bytes", stats.total_size_bytes);
        }
        CacheCommands::Clear { provider: Some(name) } => {
            let removed = cache.clear_provider(&name)?;
            println!("Removed {} entries for provider '{}'", removed, name);
        }
        CacheCommands::Clear { provider: None } => {
            cache.clear_all()?;
            println!("Cache cleared");
        }
    }
    Ok(())
}
