// File: src/props.rs
// Purpose: Data handed to render functions

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a render function can see
///
/// `data` comes from a build-time or request-time fetch, `client` from a
/// client-time fetch once it resolved. Either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Props {
    #[serde(default)]
    pub data: Option<Value>,

    #[serde(default)]
    pub client: Option<Value>,
}

impl Props {
    /// No data at all, as seen by a first paint
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_data(data: Value) -> Self {
        Self {
            data: Some(data),
            client: None,
        }
    }

    /// Add a resolved client-time result
    pub fn and_client(mut self, client: Value) -> Self {
        self.client = Some(client);
        self
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn client(&self) -> Option<&Value> {
        self.client.as_ref()
    }
}
