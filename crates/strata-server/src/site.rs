// File: src/site.rs
// Purpose: The demo site, one page per render strategy

use serde_json::Value;
use std::time::Duration;
use strata::{
    maud, render, Config, FetchRequest, Markup, Page, PageRegistry, Props, RenderError, ResolveError,
    Strategy,
};

const POSTS: &str = "/posts";
const USER: &str = "/user";

/// Register the demo pages, resolving endpoints against the configured API
pub fn pages(config: &Config) -> Result<PageRegistry, ResolveError> {
    let base_url = config.fetch.base_url.as_str();
    let news_interval = Duration::from_secs(config.isr.default_revalidate);

    PageRegistry::new()
        .with(home().with_base_url(base_url))?
        .with(blog().with_base_url(base_url))?
        .with(profile().with_base_url(base_url))?
        .with(products().with_base_url(base_url))?
        .with(news(news_interval).with_base_url(base_url))
}

fn first_page() -> FetchRequest {
    FetchRequest::new(POSTS).query("limit", 1).query("offset", 0)
}

/// Build-time post list
fn blog() -> Page {
    Page::new("/blog", Strategy::static_from(FetchRequest::new(POSTS)), |props: &Props| {
        render::post_headings(props.data())
    })
    .title("Blog")
}

/// Greets the user named by the `id` query parameter, fetched per request
fn profile() -> Page {
    Page::new("/profile", Strategy::server_side(FetchRequest::new(USER)), |props: &Props| {
        let user = props.data().unwrap_or(&Value::Null);
        let name = render::text_field(user, "name")?;
        Ok(maud! { h1 { "Welcome, " (name) "!" } })
    })
    .title("Profile")
    .forward_query(["id"])
}

/// Empty on first paint; the browser fetches the list after load
fn products() -> Page {
    Page::new("/products", Strategy::client_side(first_page()), |props: &Props| {
        render::post_headings(props.client())
    })
    .title("Products")
}

/// Build-time post list, refreshed in the background once older than `interval`
fn news(interval: Duration) -> Page {
    Page::new(
        "/news",
        Strategy::incremental(FetchRequest::new(POSTS), interval),
        |props: &Props| render::post_headings(props.data()),
    )
    .title("News")
}

/// Build-time headline plus a live panel filled in by the browser
fn home() -> Page {
    Page::new("/", Strategy::hybrid(first_page(), first_page()), home_body).title("Home")
}

fn home_body(props: &Props) -> Result<Markup, RenderError> {
    let headline = match props.data() {
        Some(data) => first_text(data, "title")?,
        None => String::new(),
    };
    let live = props.client().map(|data| first_text(data, "info")).transpose()?;

    Ok(maud! {
        div {
            h1 { "Static Data: " (headline) }
            @if let Some(info) = live {
                h2 { "Dynamic Data: " (info) }
            }
        }
    })
}

// A one-item page may arrive as a bare object or a list, possibly empty
fn first_item(value: &Value) -> Result<Option<&Value>, RenderError> {
    match value {
        Value::Array(items) => Ok(items.first()),
        Value::Object(_) => Ok(Some(value)),
        other => Err(RenderError::UnexpectedShape {
            expected: "object or array",
            found: render::kind_name(other),
        }),
    }
}

/// `field` of the first item, empty when there is no item
fn first_text(value: &Value, field: &str) -> Result<String, RenderError> {
    Ok(first_item(value)?
        .map(|item| render::text_field(item, field))
        .transpose()?
        .unwrap_or_default())
}
