//! Social Cache inspector
//!
//! Reads and maintains a durable cache file from the command line.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use social_cache::{CacheKey, Config, TtlCache};

#[derive(Parser)]
#[command(name = "social-cache")]
#[command(version)]
#[command(about = "Inspect and maintain a social cache store")]
struct Cli {
    /// Cache store file, overrides CACHE_STORAGE_PATH
    #[arg(short, long)]
    store: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List live keys with their remaining TTL
    List,
    /// Print the cached value of a key
    Get { key: String },
    /// Remove one key
    Delete { key: String },
    /// Remove every expired entry
    Purge,
    /// Remove every entry under the cache prefix
    Clear,
}

fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "social_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(path) = cli.store {
        config = config.with_storage_path(path);
    }
    if config.storage_path.is_none() {
        bail!("no cache store given, pass --store or set CACHE_STORAGE_PATH");
    }
    info!(
        "Configuration loaded: prefix={}, default_ttl_ms={}, quota_bytes={}",
        config.prefix, config.default_ttl_ms, config.quota_bytes
    );

    let mut cache = TtlCache::from_config(&config);

    match cli.command {
        Command::List => {
            for key in cache.keys() {
                let remaining = cache.ttl_remaining(&key).unwrap_or(0);
                println!("{}\t{}ms", key, remaining);
            }
        }
        Command::Get { key } => {
            let key: CacheKey = key.parse()?;
            let value = cache
                .get(&key)
                .with_context(|| format!("no live entry for {}", key))?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Command::Delete { key } => {
            let key: CacheKey = key.parse()?;
            cache.delete(&key);
            info!("Deleted {}", key);
        }
        Command::Purge => {
            let removed = cache.purge_expired();
            info!("Purged {} expired entries", removed);
        }
        Command::Clear => {
            cache.clear();
            info!("Cleared all entries under {}", cache.prefix());
        }
    }

    let stats = cache.stats();
    if stats.persist_failures > 0 {
        bail!("{} store operations failed", stats.persist_failures);
    }
    Ok(())
}
