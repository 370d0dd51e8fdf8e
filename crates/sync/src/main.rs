//! httpcache-sync entry point.
//!
//! Fetches the configured URL list twice through the disk cache and reports
//! how long the cached pass took relative to the fresh one. Logs go to
//! stderr; the summary line goes to stdout.

use anyhow::{Context, Result};
use httpcache_client::{ReqwestTransport, TransportConfig};
use httpcache_core::{AppConfig, HttpCache};
use tracing_subscriber::EnvFilter;

mod sync;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let urls = config.require_urls()?;

    if config.reset_cache && config.cache_dir.exists() {
        tracing::info!("Clearing cache directory {}", config.cache_dir.display());
        std::fs::remove_dir_all(&config.cache_dir)
            .with_context(|| format!("failed to clear {}", config.cache_dir.display()))?;
    }

    let mut cache = HttpCache::open(&config.cache_dir)?;
    let transport = ReqwestTransport::new(&TransportConfig::from(&config))?;
    let requests = sync::build_requests(urls, &config.user_agent);

    tracing::info!("Syncing {} resources into {}", requests.len(), cache.dir().display());

    let fresh = sync::run_pass(&transport, &mut cache, &requests).await;
    let cached = sync::run_pass(&transport, &mut cache, &requests).await;

    cache.close()?;

    let ratio = sync::ratio_percent(fresh.elapsed, cached.elapsed)
        .map(|ratio| format!("{ratio:.1}%"))
        .unwrap_or_else(|| "n/a".to_string());
    println!(
        "Fresh sync: {} ms; Cached sync: {} ms ({ratio})",
        fresh.elapsed.as_millis(),
        cached.elapsed.as_millis()
    );

    if fresh.failed > 0 || cached.failed > 0 {
        tracing::warn!("{} fresh and {} cached requests failed", fresh.failed, cached.failed);
    }

    Ok(())
}
