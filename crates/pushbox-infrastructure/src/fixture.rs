//! JSON fixtures describing a gateway's initial contents.

use pushbox_core::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Initial state for a [`MemoryGateway`](crate::MemoryGateway).
///
/// Payloads are kept as raw JSON so a fixture can include malformed entries.
///
/// ```json
/// {
///   "notifications": [
///     {"seqno": "123", "title": "test title 1", "body": "test body 1", "message": "{\"data\":\"111\"}"}
///   ],
///   "opening": null
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayFixture {
    #[serde(default)]
    pub notifications: Vec<Value>,
    /// The notification that opened the app, if any.
    #[serde(default)]
    pub opening: Option<Value>,
}

impl GatewayFixture {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
