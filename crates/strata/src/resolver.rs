// File: src/resolver.rs
// Purpose: Chooses when each page fetches and drives fetch + render accordingly

use crate::error::ResolveError;
use crate::mount::Mount;
use crate::page::{Page, PageRegistry};
use crate::props::Props;
use crate::request_context::RequestContext;
use crate::strategy::Strategy;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use strata_fetch::Fetcher;
use strata_isr::{Artifact, ArtifactStore, CacheStatus};
use tokio::task::JoinHandle;
use tracing::{debug, info};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Default path prefix the host serves hydrated regions under
pub const DEFAULT_HYDRATE_PREFIX: &str = "/_hydrate";

/// Output of one page render
#[derive(Debug)]
pub struct Rendered {
    /// Route that was rendered
    pub route: String,

    /// Strategy name of the page
    pub strategy: &'static str,

    /// Full HTML document
    pub html: String,

    /// Store outcome for build-time pages
    pub cache: Option<CacheStatus>,

    /// Background refresh started by this render
    pub refresh: Option<JoinHandle<()>>,
}

/// One entry of a build report
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltPage {
    pub route: String,
    pub strategy: &'static str,
    pub bytes: usize,
}

/// Pages built by [`Resolver::build`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub pages: Vec<BuiltPage>,
}

impl BuildReport {
    pub fn total_bytes(&self) -> usize {
        self.pages.iter().map(|page| page.bytes).sum()
    }
}

/// Resolves routes to rendered pages according to each page's strategy
///
/// Owns the artifact store for build-time pages. Cloning is cheap.
#[derive(Clone)]
pub struct Resolver {
    pages: Arc<PageRegistry>,
    fetcher: Arc<dyn Fetcher>,
    store: ArtifactStore,
    hydrate_prefix: String,
}

impl Resolver {
    pub fn new(pages: PageRegistry, fetcher: Arc<dyn Fetcher>, store: ArtifactStore) -> Self {
        Self {
            pages: Arc::new(pages),
            fetcher,
            store,
            hydrate_prefix: DEFAULT_HYDRATE_PREFIX.to_string(),
        }
    }

    /// Change where hydrated regions are requested from
    pub fn with_hydrate_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.hydrate_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    pub fn pages(&self) -> &PageRegistry {
        &self.pages
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn hydrate_prefix(&self) -> &str {
        &self.hydrate_prefix
    }

    /// Path a page's first paint asks for its hydrated region
    pub fn hydrate_path(&self, route: &str) -> String {
        if route == "/" {
            self.hydrate_prefix.clone()
        } else {
            format!("{}{}", self.hydrate_prefix, route)
        }
    }

    fn page(&self, route: &str) -> Result<Arc<Page>, ResolveError> {
        self.pages
            .get(route)
            .ok_or_else(|| ResolveError::UnknownRoute(route.to_string()))
    }

    fn hydrate_from(&self, page: &Page) -> Option<String> {
        page.strategy()
            .hydrates()
            .then(|| self.hydrate_path(page.route()))
    }

    /// Render `route` for an incoming request
    ///
    /// Build-time and request-time fetch failures abort the render; no
    /// partial output is produced.
    pub async fn render(&self, route: &str, ctx: &RequestContext) -> Result<Rendered, ResolveError> {
        let page = self.page(route)?;
        let strategy = page.strategy().name();
        debug!(route = %page.route(), strategy, "rendering");

        match page.strategy() {
            Strategy::Static { .. } | Strategy::Incremental { .. } | Strategy::Hybrid { .. } => {
                let generate = self.artifact_generator(&page);
                let served = self.store.get_or_generate(page.route(), generate).await?;

                Ok(Rendered {
                    route: page.route().to_string(),
                    strategy,
                    html: served.artifact.html,
                    cache: Some(served.status),
                    refresh: served.refresh,
                })
            }
            Strategy::ServerSide { .. } => {
                let source = page
                    .request_source(ctx)
                    .ok_or_else(|| ResolveError::NotPrerendered(page.route().to_string()))?;
                let data = self
                    .fetcher
                    .fetch(&source)
                    .await
                    .map_err(|e| ResolveError::fetch(page.route(), e))?;
                let html = page
                    .render_document(&Props::with_data(data), None)
                    .map_err(|e| ResolveError::render(page.route(), e))?;

                Ok(Rendered {
                    route: page.route().to_string(),
                    strategy,
                    html,
                    cache: None,
                    refresh: None,
                })
            }
            Strategy::ClientSide { .. } => {
                let hydrate_from = self.hydrate_from(&page);
                let html = page
                    .render_document(&Props::empty(), hydrate_from.as_deref())
                    .map_err(|e| ResolveError::render(page.route(), e))?;

                Ok(Rendered {
                    route: page.route().to_string(),
                    strategy,
                    html,
                    cache: None,
                    refresh: None,
                })
            }
        }
    }

    /// Mount a ClientSide or Hybrid page for its client-time fetch
    pub async fn mount(&self, route: &str) -> Result<Mount, ResolveError> {
        let page = self.page(route)?;
        if !page.strategy().hydrates() {
            return Err(ResolveError::NotHydratable(page.route().to_string()));
        }

        let build_data = if page.strategy().is_prerendered() {
            let generate = self.artifact_generator(&page);
            let served = self.store.get_or_generate(page.route(), generate).await?;
            served.artifact.props
        } else {
            None
        };

        Ok(Mount::new(page, Arc::clone(&self.fetcher), build_data))
    }

    /// Build every page that renders ahead of requests
    ///
    /// Stops at the first failure; pages built before it keep their new
    /// artifacts.
    pub async fn build(&self) -> Result<BuildReport, ResolveError> {
        let mut report = BuildReport::default();

        for page in self.pages.iter().filter(|page| page.strategy().is_prerendered()) {
            let artifact = self.build_page(page.route()).await?;
            report.pages.push(BuiltPage {
                route: page.route().to_string(),
                strategy: page.strategy().name(),
                bytes: artifact.html.len(),
            });
        }

        info!(
            pages = report.pages.len(),
            bytes = report.total_bytes(),
            "build complete"
        );
        Ok(report)
    }

    /// Fetch and render one build-time page now, swapping its artifact
    ///
    /// A failure leaves the previous artifact in place.
    pub async fn build_page(&self, route: &str) -> Result<Artifact, ResolveError> {
        let page = self.page(route)?;
        if !page.strategy().is_prerendered() {
            return Err(ResolveError::NotPrerendered(page.route().to_string()));
        }

        let generate = self.artifact_generator(&page);
        let artifact = self.store.regenerate(page.route(), generate).await?;
        info!(route = %page.route(), strategy = page.strategy().name(), "page built");
        Ok(artifact)
    }

    /// On-demand revalidation of a build-time page
    pub async fn revalidate(&self, route: &str) -> Result<Artifact, ResolveError> {
        self.build_page(route).await
    }

    fn artifact_generator(
        &self,
        page: &Arc<Page>,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<Artifact, ResolveError>> + Send + 'static {
        let page = Arc::clone(page);
        let fetcher = Arc::clone(&self.fetcher);
        let hydrate_from = self.hydrate_from(&page);
        move || Box::pin(build_artifact(page, fetcher, hydrate_from))
    }
}

/// Build-time fetch + render of a page into an artifact
async fn build_artifact(
    page: Arc<Page>,
    fetcher: Arc<dyn Fetcher>,
    hydrate_from: Option<String>,
) -> Result<Artifact, ResolveError> {
    let source = page
        .strategy()
        .build_source()
        .ok_or_else(|| ResolveError::NotPrerendered(page.route().to_string()))?;

    let data = fetcher
        .fetch(source)
        .await
        .map_err(|e| ResolveError::fetch(page.route(), e))?;

    let props = Props::with_data(data);
    let html = page
        .render_document(&props, hydrate_from.as_deref())
        .map_err(|e| ResolveError::render(page.route(), e))?;

    let mut artifact = Artifact::new(html, page.strategy().revalidate());
    if let Some(data) = props.data {
        artifact = artifact.with_props(data);
    }
    Ok(artifact)
}
