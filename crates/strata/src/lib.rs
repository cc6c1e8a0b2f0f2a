// Strata - per-page render strategies
// Decides when each page fetches its data and feeds the result to a pure render function

pub mod config;
pub mod error;
pub mod mount;
pub mod page;
pub mod props;
pub mod render;
pub mod request_context;
pub mod resolver;
pub mod strategy;

// Re-export Maud for render functions
pub use maud::{html as maud, Markup, PreEscaped, DOCTYPE};

// Re-export framework types
pub use config::Config;
pub use error::{RenderError, ResolveError};
pub use mount::{Mount, MountState};
pub use page::{normalize_route, Page, PageRegistry};
pub use props::Props;
pub use render::RenderFn;
pub use request_context::{QueryParams, RequestContext};
pub use resolver::{BuildReport, BuiltPage, Rendered, Resolver};
pub use strategy::{FetchTiming, Strategy};

// Re-export the crates pages are defined against
pub use strata_fetch::{self as fetch, FetchError, FetchRequest, Fetcher, FixtureFetcher, HttpFetcher};
pub use strata_isr::{self as isr, ArtifactStore, CacheStatus};
