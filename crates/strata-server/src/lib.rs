// Strata server - hosts the demo site over HTTP and builds it to static files

pub mod app;
pub mod build;
pub mod site;

use anyhow::{Context, Result};
use std::sync::Arc;
use strata::{ArtifactStore, Config, Fetcher, FixtureFetcher, HttpFetcher, Resolver};
use tracing::info;

/// Fetcher for `config`: canned fixtures when configured, HTTP otherwise
pub fn fetcher_from_config(config: &Config) -> Result<Arc<dyn Fetcher>> {
    if let Some(path) = &config.fetch.fixtures {
        info!(path = ?path, "serving fetches from fixtures");
        let fetcher = FixtureFetcher::from_file(path)?;
        return Ok(Arc::new(fetcher));
    }

    let fetcher = match config.fetch.timeout() {
        Some(timeout) => HttpFetcher::with_timeout(timeout)?,
        None => HttpFetcher::new(),
    };
    Ok(Arc::new(fetcher))
}

/// Resolver over the demo site, wired from `config`
pub async fn resolver_from_config(config: &Config) -> Result<Resolver> {
    let pages = site::pages(config)?;
    let fetcher = fetcher_from_config(config)?;

    let isr_config = config
        .isr
        .to_runtime_config()
        .context("Invalid [isr] configuration")?;
    let store = ArtifactStore::new(isr_config).await?;
    info!(storage = store.storage_name(), pages = pages.len(), "resolver ready");

    let resolver = Resolver::new(pages, fetcher, store).with_hydrate_prefix(&config.server.hydrate_prefix);
    app::check_hydrate_prefix(&resolver).context("Invalid [server] configuration")?;
    Ok(resolver)
}
