//! Fetch request builder.

use std::fmt;

/// A GET request against a JSON endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchRequest {
    base: String,
    query: Vec<(String, String)>,
}

impl FetchRequest {
    /// Create a request for `url`. Any query string already present is kept.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            base: url.into(),
            query: Vec::new(),
        }
    }

    /// Append a query parameter. Order is preserved.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append several query parameters.
    pub fn queries<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        self
    }

    /// Resolve a relative endpoint path against `base_url`.
    ///
    /// Absolute URLs (scheme and host) are returned untouched.
    pub fn resolve(mut self, base_url: &str) -> Self {
        let absolute = reqwest::Url::parse(&self.base).map_or(false, |url| url.has_host());
        if !absolute {
            self.base = format!(
                "{}/{}",
                base_url.trim_end_matches('/'),
                self.base.trim_start_matches('/')
            );
        }
        self
    }

    /// URL without the query parameters added through the builder.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Full URL with a percent-encoded query string.
    pub fn url(&self) -> String {
        if self.query.is_empty() {
            return self.base.clone();
        }

        let encoded: Vec<String> = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        let separator = if self.base.contains('?') { '&' } else { '?' };

        format!("{}{}{}", self.base, separator, encoded.join("&"))
    }
}

impl fmt::Display for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}
