// File: src/render.rs
// Purpose: Render function type and markup helpers

use crate::error::RenderError;
use crate::props::Props;
use maud::{html, Markup, DOCTYPE};
use serde_json::Value;
use std::sync::Arc;

/// Pure mapping from props to markup
pub type RenderFn = Arc<dyn Fn(&Props) -> Result<Markup, RenderError> + Send + Sync>;

/// Id of the element that wraps every page body
pub const REGION_ID: &str = "page";

const HTMX_SRC: &str = "https://unpkg.com/htmx.org@1.9.12";

/// Name of a JSON value's kind, for error messages
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Elements of a JSON array; absent or null data is an empty sequence
pub fn items(value: Option<&Value>) -> Result<&[Value], RenderError> {
    match value {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(RenderError::UnexpectedShape {
            expected: "array",
            found: kind_name(other),
        }),
    }
}

/// Text of `field` on a JSON object; numbers and booleans are stringified
pub fn text_field(value: &Value, field: &str) -> Result<String, RenderError> {
    let object = value.as_object().ok_or(RenderError::UnexpectedShape {
        expected: "object",
        found: kind_name(value),
    })?;

    match object.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(v.to_string()),
        _ => Err(RenderError::MissingField {
            field: field.to_string(),
        }),
    }
}

/// One `<h2>` per item, titled by the item's `title` field
pub fn post_headings(value: Option<&Value>) -> Result<Markup, RenderError> {
    let titles = items(value)?
        .iter()
        .map(|item| text_field(item, "title"))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(html! {
        div {
            @for title in &titles {
                h2 { (title) }
            }
        }
    })
}

/// Wrap a page body in its region element.
///
/// With `hydrate_from` set, the region asks the host for its hydrated
/// version once loaded. The hydrated version carries no trigger, so the
/// client-time fetch runs once per mount.
pub fn page_region(body: Markup, hydrate_from: Option<&str>) -> Markup {
    html! {
        main id=(REGION_ID)
            hx-get=[hydrate_from]
            hx-trigger=[hydrate_from.map(|_| "load")]
            hx-swap=[hydrate_from.map(|_| "outerHTML")] {
            (body)
        }
    }
}

/// Full HTML document around a page region
pub fn document(title: &str, region: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                script src=(HTMX_SRC) {}
            }
            body {
                (region)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_items_tolerates_absent_data() {
        assert!(items(None).unwrap().is_empty());
        assert!(items(Some(&Value::Null)).unwrap().is_empty());
        assert_eq!(items(Some(&json!([1, 2]))).unwrap().len(), 2);
    }

    #[test]
    fn test_items_rejects_non_array() {
        let err = items(Some(&json!({"id": 1}))).unwrap_err();
        assert_eq!(
            err,
            RenderError::UnexpectedShape {
                expected: "array",
                found: "object"
            }
        );
    }

    #[test]
    fn test_text_field() {
        let post = json!({"id": 7, "title": "A"});
        assert_eq!(text_field(&post, "title").unwrap(), "A");
        assert_eq!(text_field(&post, "id").unwrap(), "7");
        assert_eq!(
            text_field(&post, "name").unwrap_err(),
            RenderError::MissingField {
                field: "name".to_string()
            }
        );
        assert!(text_field(&json!("A"), "title").is_err());
    }

    #[test]
    fn test_post_headings() {
        let markup = post_headings(Some(&json!([{"id": 1, "title": "A"}, {"id": 2, "title": "B"}])))
            .unwrap()
            .into_string();
        assert_eq!(markup, "<div><h2>A</h2><h2>B</h2></div>");

        let empty = post_headings(None).unwrap().into_string();
        assert_eq!(empty, "<div></div>");
    }

    #[test]
    fn test_post_headings_escapes_titles() {
        let markup = post_headings(Some(&json!([{"title": "<script>"}])))
            .unwrap()
            .into_string();
        assert!(markup.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_page_region_hydration_attributes() {
        let plain = page_region(html! { p { "x" } }, None).into_string();
        assert_eq!(plain, r#"<main id="page"><p>x</p></main>"#);

        let hydrating = page_region(html! { p { "x" } }, Some("/_hydrate/products")).into_string();
        assert!(hydrating.contains(r#"hx-get="/_hydrate/products""#));
        assert!(hydrating.contains(r#"hx-trigger="load""#));
        assert!(hydrating.contains(r#"hx-swap="outerHTML""#));
    }

    #[test]
    fn test_document_shell() {
        let doc = document("Blog", page_region(html! {}, None)).into_string();
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<title>Blog</title>"));
        assert!(doc.contains(r#"<main id="page"></main>"#));
    }
}
