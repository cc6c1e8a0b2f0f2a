// File: src/page.rs
// Purpose: Page definitions and the route registry

use crate::error::{RenderError, ResolveError};
use crate::props::Props;
use crate::render::{self, RenderFn};
use crate::request_context::RequestContext;
use crate::strategy::Strategy;
use maud::Markup;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use strata_fetch::FetchRequest;

/// A routable page: strategy plus render function
///
/// The strategy is fixed once the page is built.
#[derive(Clone)]
pub struct Page {
    route: String,
    title: String,
    strategy: Strategy,
    render: RenderFn,
    forward_query: Vec<String>,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("route", &self.route)
            .field("strategy", &self.strategy)
            .finish()
    }
}

impl Page {
    pub fn new<F>(route: &str, strategy: Strategy, render: F) -> Self
    where
        F: Fn(&Props) -> Result<Markup, RenderError> + Send + Sync + 'static,
    {
        let route = normalize_route(route).into_owned();
        Self {
            title: route.clone(),
            route,
            strategy,
            render: Arc::new(render),
            forward_query: Vec::new(),
        }
    }

    /// Document title; defaults to the route
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Copy these request query parameters onto request-time fetches
    pub fn forward_query<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.forward_query = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Resolve relative endpoint paths against `base_url`
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.strategy = self.strategy.resolve(base_url);
        self
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn page_title(&self) -> &str {
        &self.title
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Request-time fetch for `ctx`, with forwarded query parameters appended
    pub fn request_source(&self, ctx: &RequestContext) -> Option<FetchRequest> {
        let source = self.strategy.request_source()?.clone();
        let forwarded = self
            .forward_query
            .iter()
            .filter_map(|key| ctx.query.get(key).map(|value| (key.clone(), value.clone())));
        Some(source.queries(forwarded))
    }

    /// Run the render function and wrap the result in the page region
    pub fn render_region(&self, props: &Props, hydrate_from: Option<&str>) -> Result<Markup, RenderError> {
        let body = (self.render)(props)?;
        Ok(render::page_region(body, hydrate_from))
    }

    /// Render a full document
    pub fn render_document(&self, props: &Props, hydrate_from: Option<&str>) -> Result<String, RenderError> {
        let region = self.render_region(props, hydrate_from)?;
        Ok(render::document(&self.title, region).into_string())
    }
}

/// Normalize a route path
///
/// - Leading slash: `blog` → `/blog`
/// - Trailing slashes: `/blog/` → `/blog`
/// - Double slashes: `/blog//posts` → `/blog/posts`
/// - Backslashes: `\blog` → `/blog`
pub fn normalize_route(path: &str) -> Cow<'_, str> {
    let is_clean = path.starts_with('/')
        && !path.contains("//")
        && !path.contains('\\')
        && (path == "/" || !path.ends_with('/'));

    if is_clean {
        return Cow::Borrowed(path);
    }

    let segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .collect();

    Cow::Owned(format!("/{}", segments.join("/")))
}

/// Pages keyed by normalized route, in registration order
#[derive(Debug, Clone, Default)]
pub struct PageRegistry {
    pages: HashMap<String, Arc<Page>>,
    order: Vec<String>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page; each route may be registered once
    pub fn add(&mut self, page: Page) -> Result<(), ResolveError> {
        let route = page.route().to_string();
        if self.pages.contains_key(&route) {
            return Err(ResolveError::DuplicateRoute(route));
        }

        self.order.push(route.clone());
        self.pages.insert(route, Arc::new(page));
        Ok(())
    }

    /// Builder form of [`PageRegistry::add`]
    pub fn with(mut self, page: Page) -> Result<Self, ResolveError> {
        self.add(page)?;
        Ok(self)
    }

    pub fn get(&self, route: &str) -> Option<Arc<Page>> {
        self.pages.get(normalize_route(route).as_ref()).cloned()
    }

    /// Pages in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Page>> {
        self.order.iter().filter_map(|route| self.pages.get(route))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
