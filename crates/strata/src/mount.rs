// File: src/mount.rs
// Purpose: Viewer-side page instance that owns its client-time fetch

use crate::error::ResolveError;
use crate::page::Page;
use crate::props::Props;
use std::sync::Arc;
use strata_fetch::Fetcher;
use tracing::{debug, warn};

/// Lifecycle of a mounted page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    /// Nothing rendered yet
    Unpainted,
    /// First paint done, client fetch not yet performed
    Painted,
    /// Client fetch resolved and the page re-rendered
    Hydrated,
    /// Client fetch failed; the first paint stands
    Failed,
}

/// One mounted instance of a ClientSide or Hybrid page
///
/// Hydration takes `&mut self`, so a mount can never have two client
/// fetches in flight. The fetch runs once per mount; call
/// [`Mount::invalidate`] to allow another.
pub struct Mount {
    page: Arc<Page>,
    fetcher: Arc<dyn Fetcher>,
    props: Props,
    state: MountState,
    renders: usize,
}

impl Mount {
    /// `build_data` is the build-time result for Hybrid pages
    pub(crate) fn new(page: Arc<Page>, fetcher: Arc<dyn Fetcher>, build_data: Option<serde_json::Value>) -> Self {
        Self {
            page,
            fetcher,
            props: Props {
                data: build_data,
                client: None,
            },
            state: MountState::Unpainted,
            renders: 0,
        }
    }

    pub fn state(&self) -> MountState {
        self.state
    }

    /// Number of renders performed by this mount
    pub fn renders(&self) -> usize {
        self.renders
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn route(&self) -> &str {
        self.page.route()
    }

    /// First paint, without client data
    pub fn paint(&mut self) -> Result<String, ResolveError> {
        let html = self.render()?;
        if self.state == MountState::Unpainted {
            self.state = MountState::Painted;
        }
        Ok(html)
    }

    /// Perform the client-time fetch and re-render
    ///
    /// Returns the re-rendered region, or `None` when there is nothing new
    /// to show: the fetch already ran for this mount, or it failed and the
    /// first paint is left standing.
    pub async fn hydrate(&mut self) -> Result<Option<String>, ResolveError> {
        match self.state {
            MountState::Unpainted => return Err(ResolveError::NotPainted(self.route().to_string())),
            MountState::Hydrated | MountState::Failed => return Ok(None),
            MountState::Painted => {}
        }

        let source = self
            .page
            .strategy()
            .client_source()
            .ok_or_else(|| ResolveError::NotHydratable(self.route().to_string()))?
            .clone();

        debug!(route = %self.route(), url = %source, "client fetch");
        match self.fetcher.fetch(&source).await {
            Ok(data) => {
                self.props.client = Some(data);
                // Render errors are fatal to this pass; the mount is done either way
                self.state = MountState::Failed;
                let html = self.render()?;
                self.state = MountState::Hydrated;
                Ok(Some(html))
            }
            Err(e) => {
                warn!(route = %self.route(), error = %e, "client fetch failed, keeping first paint");
                self.state = MountState::Failed;
                Ok(None)
            }
        }
    }

    /// Allow one more client fetch
    pub fn invalidate(&mut self) {
        if matches!(self.state, MountState::Hydrated | MountState::Failed) {
            self.state = MountState::Painted;
        }
    }

    fn render(&mut self) -> Result<String, ResolveError> {
        let region = self
            .page
            .render_region(&self.props, None)
            .map_err(|e| ResolveError::render(self.page.route(), e))?;
        self.renders += 1;
        Ok(region.into_string())
    }
}
