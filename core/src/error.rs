//! Error types for the address validation client.
//!
//! # Design
//! Failures are split by the layer that produced them. `TransportError`
//! covers everything up to and including the HTTP status line, `DecodeError`
//! covers a body that cannot be projected into the typed response, and
//! `Error::Service` covers a well-formed response whose embedded status code
//! reports a business-level failure. None of them are retried here; the
//! caller decides what is worth another attempt.

use thiserror::Error;

/// Failures while building, sending or receiving the HTTP exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The service answered with a non-2xx status.
    #[error("HTTP {status}{}", reason_suffix(.reason))]
    Status {
        status: u16,
        reason: String,
        body: String,
    },

    /// Connection, TLS, timeout or body read failure.
    #[error("network failure: {0}")]
    Network(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The configured base URL could not be turned into a request URL.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

fn reason_suffix(reason: &str) -> String {
    if reason.is_empty() {
        String::new()
    } else {
        format!(" {reason}")
    }
}

/// Failures while normalizing a response body.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The body is not valid JSON.
    #[error("malformed JSON: {0}")]
    Malformed(String),

    /// A field required to interpret the response is absent.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// A field is present but holds the wrong JSON type.
    #[error("field `{field}` has an unexpected type, expected {expected}")]
    UnexpectedType {
        field: &'static str,
        expected: &'static str,
    },
}

/// Any failure returned by `AddressClient::validate_address`.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The response decoded but its status code is not the success code.
    #[error("address validation service failed ({code}): {description}")]
    Service { code: String, description: String },
}
