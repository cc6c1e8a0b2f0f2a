// File: src/request_context.rs
// Purpose: Request context passed to request-time fetches

use std::collections::HashMap;

/// Request context handed to the resolver for each incoming request
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request path
    pub path: String,

    /// Query parameters from URL (?key=value)
    pub query: QueryParams,
}

impl RequestContext {
    pub fn new(path: impl Into<String>, query: QueryParams) -> Self {
        Self {
            path: path.into(),
            query,
        }
    }

    /// A bare request for `path`, as used by builds and tests
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(path, QueryParams::default())
    }

    /// Add a query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key, value);
        self
    }
}

/// Query parameters from URL
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    params: HashMap<String, String>,
}

impl QueryParams {
    pub fn new(params: HashMap<String, String>) -> Self {
        Self { params }
    }

    /// Get a query parameter value
    pub fn get(&self, key: &str) -> Option<&String> {
        self.params.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }
}
