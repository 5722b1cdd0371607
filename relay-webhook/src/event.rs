use std::collections::HashMap;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Deserializer};

/// A single inbound webhook call.
///
/// Deserializes from the trigger event shape used by serverless runtimes,
/// `{"headers": {...}, "body": "..."}`, where either field may be missing
/// or `null`. Header lookups are case-insensitive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundEvent {
    #[serde(default, deserialize_with = "deserialize_headers")]
    pub headers: HeaderMap,

    #[serde(default, deserialize_with = "deserialize_body")]
    pub body: String,
}

impl InboundEvent {
    pub fn new(headers: HeaderMap, body: impl Into<String>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }
}

fn deserialize_headers<'de, D>(deserializer: D) -> Result<HeaderMap, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, String>> = Deserialize::deserialize(deserializer)?;
    let mut headers = HeaderMap::new();
    for (name, value) in raw.unwrap_or_default() {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(serde::de::Error::custom)?;
        let value = HeaderValue::from_str(&value).map_err(serde::de::Error::custom)?;
        headers.append(name, value);
    }
    Ok(headers)
}

fn deserialize_body<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let body: Option<String> = Deserialize::deserialize(deserializer)?;
    Ok(body.unwrap_or_default())
}
