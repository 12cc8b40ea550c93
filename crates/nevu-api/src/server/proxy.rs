//! Envelope for requests forwarded by the backend's `/proxy` endpoint.
//!
//! The browser cannot reach most servers directly (mixed content, CORS), so
//! the backend performs the request and relays status and body unchanged.

use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProxyMethod {
    Get,
    Put,
}

impl ProxyMethod {
    pub fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Put => reqwest::Method::PUT,
        }
    }
}

/// Body POSTed to `{backend}/proxy`.
#[derive(Debug, Clone, Serialize)]
pub struct ProxyRequest {
    pub url: String,
    pub method: ProxyMethod,
    pub headers: BTreeMap<String, String>,
}
