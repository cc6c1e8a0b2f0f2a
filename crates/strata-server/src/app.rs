// File: src/app.rs
// Purpose: HTTP surface over the resolver: page renders, hydration, revalidation

use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::collections::HashMap;
use strata::{maud, QueryParams, RequestContext, ResolveError, Resolver, DOCTYPE};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Strategy of the rendered page
pub const STRATEGY_HEADER: &str = "x-strata-strategy";

/// HIT, STALE or MISS for pages served from the artifact store
pub const CACHE_HEADER: &str = "x-strata-cache";

const REVALIDATE_PREFIX: &str = "/_revalidate";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    resolver: Resolver,
}

/// Build the router for `resolver`'s pages
///
/// Fails when the hydrate prefix cannot be routed next to the pages.
pub fn router(resolver: Resolver) -> anyhow::Result<Router> {
    check_hydrate_prefix(&resolver)?;
    let hydrate_prefix = resolver.hydrate_prefix().to_string();
    let state = AppState { resolver };

    let router = Router::new()
        .route(&hydrate_prefix, get(hydrate_root))
        .route(&format!("{}/*route", hydrate_prefix), get(hydrate_handler))
        .route(REVALIDATE_PREFIX, post(revalidate_root))
        .route(&format!("{}/*route", REVALIDATE_PREFIX), post(revalidate_handler))
        .route("/", get(index_handler))
        .route("/*route", get(page_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);
    Ok(router)
}

/// The hydrate prefix must be a plain path below the root that shadows no other route
pub fn check_hydrate_prefix(resolver: &Resolver) -> anyhow::Result<()> {
    let prefix = resolver.hydrate_prefix();
    let nested = |path: &str, under: &str| path == under || path.starts_with(&format!("{}/", under));

    if !prefix.starts_with('/') || prefix.len() < 2 || prefix.contains([':', '*']) {
        anyhow::bail!("hydrate_prefix must be a plain path below the root, got {:?}", prefix);
    }
    if nested(prefix, REVALIDATE_PREFIX) || nested(REVALIDATE_PREFIX, prefix) {
        anyhow::bail!("hydrate_prefix {:?} overlaps {}", prefix, REVALIDATE_PREFIX);
    }
    if let Some(page) = resolver.pages().iter().find(|page| nested(page.route(), prefix)) {
        anyhow::bail!("hydrate_prefix {:?} hides page {}", prefix, page.route());
    }
    Ok(())
}

async fn index_handler(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    render_page(&state, "/".to_string(), query).await
}

async fn page_handler(
    State(state): State<AppState>,
    Path(route): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    render_page(&state, format!("/{}", route), query).await
}

async fn render_page(state: &AppState, route: String, query: HashMap<String, String>) -> Response {
    let ctx = RequestContext::new(route.clone(), QueryParams::new(query));

    match state.resolver.render(&route, &ctx).await {
        Ok(rendered) => {
            let mut response = Html(rendered.html).into_response();
            let headers = response.headers_mut();
            headers.insert(STRATEGY_HEADER, HeaderValue::from_static(rendered.strategy));
            if let Some(cache) = rendered.cache {
                headers.insert(CACHE_HEADER, HeaderValue::from_static(cache.as_str()));
            }
            // A started refresh runs on without this request
            response
        }
        Err(e) => error_response(&e),
    }
}

async fn hydrate_root(State(state): State<AppState>) -> Response {
    hydrate_page(&state, "/").await
}

async fn hydrate_handler(State(state): State<AppState>, Path(route): Path<String>) -> Response {
    hydrate_page(&state, &format!("/{}", route)).await
}

/// Client-time fetch for one mount of a ClientSide or Hybrid page
///
/// Answers the re-rendered region, or 204 when the fetch failed so the
/// first paint stays on screen.
async fn hydrate_page(state: &AppState, route: &str) -> Response {
    let mut mount = match state.resolver.mount(route).await {
        Ok(mount) => mount,
        Err(e) => return error_response(&e),
    };

    if let Err(e) = mount.paint() {
        return error_response(&e);
    }

    match mount.hydrate().await {
        Ok(Some(region)) => Html(region).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e),
    }
}

async fn revalidate_root(State(state): State<AppState>) -> Response {
    revalidate_page(&state, "/").await
}

async fn revalidate_handler(State(state): State<AppState>, Path(route): Path<String>) -> Response {
    revalidate_page(&state, &format!("/{}", route)).await
}

async fn revalidate_page(state: &AppState, route: &str) -> Response {
    let page = match state.resolver.pages().get(route) {
        Some(page) => page,
        None => return error_response(&ResolveError::UnknownRoute(route.to_string())),
    };

    match state.resolver.revalidate(route).await {
        Ok(artifact) => Json(serde_json::json!({
            "route": page.route(),
            "strategy": page.strategy().name(),
            "bytes": artifact.html.len(),
            "generated_at": artifact.generated_at,
        }))
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// HTTP status for a resolve failure
pub fn status_for(error: &ResolveError) -> StatusCode {
    match error {
        ResolveError::UnknownRoute(_) => StatusCode::NOT_FOUND,
        ResolveError::NotHydratable(_) | ResolveError::NotPrerendered(_) | ResolveError::NotPainted(_) => {
            StatusCode::BAD_REQUEST
        }
        ResolveError::Fetch { .. } => StatusCode::BAD_GATEWAY,
        ResolveError::Render { .. } | ResolveError::DuplicateRoute(_) | ResolveError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(error: &ResolveError) -> Response {
    let status = status_for(error);
    if status.is_server_error() {
        error!(error = %error, "request failed");
    } else {
        warn!(error = %error, "request rejected");
    }

    let title = status.canonical_reason().unwrap_or("Error");
    let markup = maud! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                title { (title) }
            }
            body {
                h1 { (status.as_u16()) " " (title) }
                p { (error) }
                a href="/" { "Go Home" }
            }
        }
    };

    (status, Html(markup.into_string())).into_response()
}
