// File: src/error.rs
// Purpose: Render and resolve error types

use strata_fetch::FetchError;
use thiserror::Error;

/// Data reached a render function in a shape it cannot use
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("missing field `{field}`")]
    MissingField { field: String },

    #[error("expected {expected}, found {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },
}

/// Errors surfaced by the resolver to the host
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("no page registered for route {0}")]
    UnknownRoute(String),

    #[error("route {0} is registered twice")]
    DuplicateRoute(String),

    #[error("fetch for {route} failed: {source}")]
    Fetch {
        route: String,
        #[source]
        source: FetchError,
    },

    #[error("render of {route} failed: {source}")]
    Render {
        route: String,
        #[source]
        source: RenderError,
    },

    #[error("route {0} has no client-time fetch")]
    NotHydratable(String),

    #[error("route {0} is not rendered ahead of requests")]
    NotPrerendered(String),

    #[error("route {0} must be painted before hydrating")]
    NotPainted(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ResolveError {
    pub(crate) fn fetch(route: &str, source: FetchError) -> Self {
        ResolveError::Fetch {
            route: route.to_string(),
            source,
        }
    }

    pub(crate) fn render(route: &str, source: RenderError) -> Self {
        ResolveError::Render {
            route: route.to_string(),
            source,
        }
    }
}
