// File: src/strategy.rs
// Purpose: Render strategies and the fetch timings they allow

use std::fmt;
use std::time::Duration;
use strata_fetch::FetchRequest;

/// When a fetch happens relative to the render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchTiming {
    /// Once, when the artifact is built
    Build,
    /// Before every render, per incoming request
    Request,
    /// After the first paint, from the viewer's runtime
    Client,
}

impl FetchTiming {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchTiming::Build => "build",
            FetchTiming::Request => "request",
            FetchTiming::Client => "client",
        }
    }
}

/// How a page gets its data
///
/// Each variant owns the requests it is allowed to make, so a page cannot
/// fetch at a time its strategy does not declare.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// Fetched once at build time, embedded in the artifact
    Static { source: FetchRequest },

    /// Fetched before every render
    ServerSide { source: FetchRequest },

    /// Rendered without data, fetched after first paint
    ClientSide { source: FetchRequest },

    /// Static, refreshed in the background once `revalidate` has elapsed
    Incremental {
        source: FetchRequest,
        revalidate: Duration,
    },

    /// One build-time fetch plus one client-time fetch
    Hybrid {
        build: FetchRequest,
        client: FetchRequest,
    },
}

impl Strategy {
    pub fn static_from(source: FetchRequest) -> Self {
        Strategy::Static { source }
    }

    pub fn server_side(source: FetchRequest) -> Self {
        Strategy::ServerSide { source }
    }

    pub fn client_side(source: FetchRequest) -> Self {
        Strategy::ClientSide { source }
    }

    pub fn incremental(source: FetchRequest, revalidate: Duration) -> Self {
        Strategy::Incremental { source, revalidate }
    }

    pub fn hybrid(build: FetchRequest, client: FetchRequest) -> Self {
        Strategy::Hybrid { build, client }
    }

    /// Short name used in logs and response headers
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Static { .. } => "static",
            Strategy::ServerSide { .. } => "server",
            Strategy::ClientSide { .. } => "client",
            Strategy::Incremental { .. } => "incremental",
            Strategy::Hybrid { .. } => "hybrid",
        }
    }

    /// Fetch timings this strategy performs, in order
    pub fn timings(&self) -> &'static [FetchTiming] {
        match self {
            Strategy::Static { .. } | Strategy::Incremental { .. } => &[FetchTiming::Build],
            Strategy::ServerSide { .. } => &[FetchTiming::Request],
            Strategy::ClientSide { .. } => &[FetchTiming::Client],
            Strategy::Hybrid { .. } => &[FetchTiming::Build, FetchTiming::Client],
        }
    }

    /// Request used when building the artifact
    pub fn build_source(&self) -> Option<&FetchRequest> {
        match self {
            Strategy::Static { source } | Strategy::Incremental { source, .. } => Some(source),
            Strategy::Hybrid { build, .. } => Some(build),
            _ => None,
        }
    }

    /// Request made before every render
    pub fn request_source(&self) -> Option<&FetchRequest> {
        match self {
            Strategy::ServerSide { source } => Some(source),
            _ => None,
        }
    }

    /// Request made after first paint
    pub fn client_source(&self) -> Option<&FetchRequest> {
        match self {
            Strategy::ClientSide { source } => Some(source),
            Strategy::Hybrid { client, .. } => Some(client),
            _ => None,
        }
    }

    /// Revalidation interval, for Incremental pages
    pub fn revalidate(&self) -> Option<Duration> {
        match self {
            Strategy::Incremental { revalidate, .. } => Some(*revalidate),
            _ => None,
        }
    }

    /// Whether the page is rendered ahead of requests and kept in the store
    pub fn is_prerendered(&self) -> bool {
        self.build_source().is_some()
    }

    /// Whether the page needs a client-time fetch after first paint
    pub fn hydrates(&self) -> bool {
        self.client_source().is_some()
    }

    /// Resolve relative endpoint paths against `base_url`
    pub fn resolve(self, base_url: &str) -> Self {
        match self {
            Strategy::Static { source } => Strategy::Static {
                source: source.resolve(base_url),
            },
            Strategy::ServerSide { source } => Strategy::ServerSide {
                source: source.resolve(base_url),
            },
            Strategy::ClientSide { source } => Strategy::ClientSide {
                source: source.resolve(base_url),
            },
            Strategy::Incremental { source, revalidate } => Strategy::Incremental {
                source: source.resolve(base_url),
                revalidate,
            },
            Strategy::Hybrid { build, client } => Strategy::Hybrid {
                build: build.resolve(base_url),
                client: client.resolve(base_url),
            },
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.revalidate() {
            Some(interval) => write!(f, "{} (every {}s)", self.name(), interval.as_secs()),
            None => f.write_str(self.name()),
        }
    }
}
