//! HTTP transport types and the blocking transport used by default.
//!
//! # Design
//! Requests and responses are plain data. `AddressClient` builds an
//! `HttpRequest`, hands it to a `Transport`, and interprets the returned
//! `HttpResponse` without knowing how the bytes travelled. `UreqTransport` is
//! the stock implementation; tests substitute their own.
//!
//! All fields use owned types so values can be logged, cloned into fixtures
//! or moved across threads without lifetime concerns.

use std::time::Duration;

use crate::error::TransportError;

/// A POST request described as plain data.
///
/// The upstream API only accepts POST, so the method is implied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
    /// Applied to the whole exchange, from connect to the last body byte.
    pub timeout: Duration,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Canonical reason phrase for `status`, e.g. `"Unauthorized"`, not the
    /// phrase from the wire. Empty for non-standard codes.
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes one request and returns the raw response.
///
/// Implementations must return non-2xx responses as `Ok` so the client can
/// classify them; `Err` is reserved for failures where no response exists.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by a `ureq` agent.
///
/// The agent pools connections and is safe to share between threads, so one
/// `UreqTransport` can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.agent.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder
            .config()
            .timeout_global(Some(request.timeout))
            .build()
            .send(request.body.as_bytes())
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            reason: String::new(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    #[test]
    fn only_2xx_is_success() {
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(199).is_success());
        assert!(!response(301).is_success());
        assert!(!response(500).is_success());
    }

    #[test]
    fn unreachable_host_is_a_network_error() {
        let request = HttpRequest {
            url: "http://127.0.0.1:9/addressvalidation/v1/3".to_string(),
            headers: Vec::new(),
            body: "{}".to_string(),
            timeout: Duration::from_secs(2),
        };
        let err = UreqTransport::new().execute(&request).unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }
}
