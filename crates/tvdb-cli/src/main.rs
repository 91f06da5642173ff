//! tvdb - TheTVDB API command-line client.

/// Application configuration (TOML).
mod config;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::AppConfig;
use tvdb_api::tvdb::{Credentials, LocalTvdbApi, SeriesRecord, TvdbClient, series_name};
use tvdb_cache::{CacheBackend, TESTING_ENV_VAR, open_store};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config/cache directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Log in and report whether a token was issued.
    Login,
    /// Search series by name.
    Search(SearchArgs),
    /// Print the series whose title best matches a name.
    Closest(SearchArgs),
    /// Print one series record.
    Series(SeriesArgs),
    /// Response cache maintenance.
    Cache(CacheCommand),
    /// Config file operations.
    Config(ConfigCommand),
}

/// Arguments for the `search` and `closest` subcommands.
#[derive(clap::Args)]
struct SearchArgs {
    /// Series name (e.g. "Game of Thrones").
    #[arg(long, required = true)]
    name: String,
}

/// Arguments for the `series` subcommand.
#[derive(clap::Args)]
struct SeriesArgs {
    /// TheTVDB series ID.
    #[arg(long, required = true)]
    id: u64,
}

/// Arguments for the `cache` subcommand.
#[derive(clap::Args)]
struct CacheCommand {
    /// Cache subcommand to run.
    #[command(subcommand)]
    command: CacheSubcommands,
}

/// Available cache subcommands.
#[derive(Subcommand)]
enum CacheSubcommands {
    /// Remove expired responses.
    Purge,
    /// Remove every cached response.
    Clear,
}

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigCommand {
    /// Config subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommands,
}

/// Available config subcommands.
#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Write a default config file if none exists.
    Init,
    /// Print the config file path and its settings (secrets redacted).
    Show,
}

/// Loads `config.toml` from `dir` or the default location.
fn load_config(dir: Option<&Path>) -> Result<AppConfig> {
    let config_path = AppConfig::path(dir).context("failed to resolve config path")?;
    AppConfig::load(&config_path).context("failed to load config")
}

/// Cache backend from the config, forced to memory by `TVDB_CLIENT_TESTING`.
fn resolve_cache_backend(config: &AppConfig, dir: Option<&Path>) -> CacheBackend {
    if std::env::var_os(TESTING_ENV_VAR).is_some() {
        return CacheBackend::Memory;
    }
    config.cache.backend(dir)
}

/// Builds a logged-in `TvdbClient`.
///
/// Environment credentials win; empty ones fall back to `config.toml`.
///
/// # Errors
///
/// Returns an error if credentials are incomplete, the cache cannot be
/// opened, or the login request fails.
#[instrument(skip_all)]
async fn build_tvdb_client(dir: Option<&Path>) -> Result<TvdbClient> {
    let config = load_config(dir)?;

    TvdbClient::builder()
        .credentials(Credentials::from_env())
        .credential_source(config.credentials.to_credentials())
        .cache_backend(resolve_cache_backend(&config, dir))
        .expire_after(config.cache.expire_after())
        .build()
        .await
        .context("failed to build TheTVDB client")
}

/// Prints a record as pretty JSON.
fn log_record(record: &SeriesRecord) -> Result<()> {
    let json = serde_json::to_string_pretty(record).context("failed to serialize record")?;
    tracing::info!("{json}");
    Ok(())
}

/// Runs the `login` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build.
#[instrument(skip_all)]
async fn run_login(dir: Option<&Path>) -> Result<()> {
    let client = build_tvdb_client(dir).await?;

    if client.token().is_some() {
        tracing::info!("Logged in to TheTVDB");
        Ok(())
    } else {
        bail!("TheTVDB did not issue a token; check your credentials")
    }
}

/// Runs the `search` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_search(args: &SearchArgs, dir: Option<&Path>) -> Result<()> {
    let client = build_tvdb_client(dir).await?;

    let Some(series) = client
        .search(&args.name)
        .await
        .context("TheTVDB search/series request failed")?
    else {
        tracing::info!("No results for {}", args.name);
        return Ok(());
    };

    tracing::info!("ID\tFirstAired\tName");
    for record in &series {
        tracing::info!(
            "{}\t{}\t{}",
            record.get("id").map_or_else(|| String::from("-"), ToString::to_string),
            record
                .get("firstAired")
                .and_then(serde_json::Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or("-"),
            series_name(record).unwrap_or("-"),
        );
    }
    tracing::info!("Total: {} series", series.len());

    Ok(())
}

/// Runs the `closest` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_closest(args: &SearchArgs, dir: Option<&Path>) -> Result<()> {
    let client = build_tvdb_client(dir).await?;

    match client
        .search_closest_matching(&args.name)
        .await
        .context("TheTVDB search/series request failed")?
    {
        Some(record) => log_record(&record),
        None => {
            tracing::info!("No results for {}", args.name);
            Ok(())
        }
    }
}

/// Runs the `series` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_series(args: &SeriesArgs, dir: Option<&Path>) -> Result<()> {
    let client = build_tvdb_client(dir).await?;

    match client
        .get_serie_by_id(args.id)
        .await
        .context("TheTVDB series request failed")?
    {
        Some(record) => log_record(&record),
        None => {
            tracing::info!("Series {} not found", args.id);
            Ok(())
        }
    }
}

/// Runs the `cache purge` and `cache clear` subcommands.
///
/// Works on the store directly; no credentials are needed.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or the store cannot be
/// opened or written.
#[instrument(skip_all)]
fn run_cache(command: &CacheSubcommands, dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let mut store = open_store(&config.cache.backend(dir)).context("failed to open cache")?;

    match command {
        CacheSubcommands::Purge => {
            let removed = store.purge_expired(Utc::now())?;
            tracing::info!("Removed {removed} expired responses");
        }
        CacheSubcommands::Clear => {
            let removed = store.clear()?;
            tracing::info!("Removed {removed} responses");
        }
    }

    let remaining = store.count()?;
    tracing::info!("{remaining} responses cached");
    Ok(())
}

/// Runs the `config init` subcommand.
///
/// # Errors
///
/// Returns an error if the config path cannot be resolved or written.
fn run_config_init(dir: Option<&Path>) -> Result<()> {
    let config_path = AppConfig::path(dir).context("failed to resolve config path")?;
    if config_path.exists() {
        tracing::info!("Config already exists: {}", config_path.display());
        return Ok(());
    }

    AppConfig::default()
        .save(&config_path)
        .context("failed to save config")?;
    tracing::info!("Wrote {}", config_path.display());
    Ok(())
}

/// Runs the `config show` subcommand.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded.
fn run_config_show(dir: Option<&Path>) -> Result<()> {
    let config_path = AppConfig::path(dir).context("failed to resolve config path")?;
    let config = AppConfig::load(&config_path).context("failed to load config")?;

    tracing::info!("Config: {}", config_path.display());
    tracing::info!("{:?}", config.credentials);
    tracing::info!(
        "Cache: {:?}, expire after {}s",
        config.cache.backend(dir),
        config.cache.expire_after_secs
    );
    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    let dir = cli.dir.as_deref();
    match cli.command {
        Commands::Login => run_login(dir).await,
        Commands::Search(args) => run_search(&args, dir).await,
        Commands::Closest(args) => run_closest(&args, dir).await,
        Commands::Series(args) => run_series(&args, dir).await,
        Commands::Cache(cache) => run_cache(&cache.command, dir),
        Commands::Config(config) => match config.command {
            ConfigSubcommands::Init => run_config_init(dir),
            ConfigSubcommands::Show => run_config_show(dir),
        },
    }
}
