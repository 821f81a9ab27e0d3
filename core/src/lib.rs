//! Blocking client for the UPS address validation (XAV) API.
//!
//! # Overview
//! `AddressClient` turns a flat `Address` into an authenticated POST, sends
//! it through a `Transport`, and normalizes the response into a
//! `ValidationOutcome`. One call is one request; nothing is cached, retried
//! or batched.
//!
//! # Design
//! - The service's response schema is inconsistent (presence-only booleans,
//!   scalars standing in for one-element arrays). `normalize` decodes into a
//!   generic JSON tree first and projects it into typed structures second.
//! - Request building and response parsing are pure; only the `Transport`
//!   does I/O. `UreqTransport` is the default.
//! - Failures are typed by layer: `TransportError`, `DecodeError`, and
//!   `Error::Service` for a non-success status code inside a good response.
//!
//! # Example
//! ```no_run
//! use ups_address::{Address, AddressClient};
//!
//! let mut client = AddressClient::new("username", "password", "access-key");
//! client.set_sandbox(true);
//!
//! let address = Address {
//!     address_line1: "26601 Aliso Viejo Pkwy".to_string(),
//!     city: "Aliso Viejo".to_string(),
//!     state_prov: "CA".to_string(),
//!     postal_code: "92656".to_string(),
//!     country_code: "US".to_string(),
//!     ..Address::default()
//! };
//!
//! let outcome = client.validate_address(&address)?;
//! if let Some(suggested) = outcome.address() {
//!     println!("{} {}", suggested.address_line1, suggested.city);
//! }
//! # Ok::<(), ups_address::Error>(())
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod normalize;
pub mod types;

pub use client::{AddressClient, ValidationOutcome};
pub use error::{DecodeError, Error, TransportError};
pub use http::{HttpRequest, HttpResponse, Transport, UreqTransport};
pub use normalize::normalize;
pub use types::{
    Address, AddressClassification, AddressKeyFormat, Candidate, ResponseStatus,
    ValidationResponse,
};
