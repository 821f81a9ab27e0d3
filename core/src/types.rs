//! Domain types for the address validation API.
//!
//! # Design
//! `Address` is the flat shape callers work with. `AddressKeyFormat` is the
//! upstream canonical representation and is what travels on the wire.
//! `ValidationResponse` is the normalized decode of one response envelope:
//! indicators are plain booleans and candidates are always a list, whatever
//! shape the service used. Decoding goes through `crate::normalize`; the
//! `Deserialize` impls for these types live there.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The success code carried in `Response.ResponseStatus.Code`.
pub const SUCCESS_CODE: &str = "1";

/// A postal address in flat form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Address {
    pub address_line1: String,
    pub address_line2: String,
    pub address_line3: String,
    pub city: String,
    pub state_prov: String,
    pub postal_code: String,
    pub postal_code_extended: String,
    pub address_type: String,
    pub country_code: String,
    /// Classification label, filled in when the address comes from a candidate.
    pub classification: String,
}

impl Address {
    /// Build an address from a map keyed by field name (`"AddressLine1"`,
    /// `"City"`, `"StateProv"`, ...). Missing keys become empty strings and
    /// unknown keys are ignored.
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let field = |name: &str| fields.get(name).cloned().unwrap_or_default();
        Self {
            address_line1: field("AddressLine1"),
            address_line2: field("AddressLine2"),
            address_line3: field("AddressLine3"),
            city: field("City"),
            state_prov: field("StateProv"),
            postal_code: field("PostalCode"),
            postal_code_extended: field("PostalCodeExtended"),
            address_type: field("AddressType"),
            country_code: field("CountryCode"),
            classification: field("Classification"),
        }
    }

    /// Flatten a key-format address. The first three address lines map to
    /// `address_line1..3`; further lines are dropped.
    pub fn from_key_format(format: &AddressKeyFormat, classification: &str) -> Self {
        let line = |i: usize| format.address_line.get(i).cloned().unwrap_or_default();
        Self {
            address_line1: line(0),
            address_line2: line(1),
            address_line3: line(2),
            city: format.political_division2.clone(),
            state_prov: format.political_division1.clone(),
            postal_code: format.postcode_primary_low.clone(),
            postal_code_extended: format.postcode_extended_low.clone(),
            address_type: String::new(),
            country_code: format.country_code.clone(),
            classification: classification.to_string(),
        }
    }
}

/// The upstream canonical address representation.
///
/// Serializes in the wire's PascalCase form, omitting empty fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressKeyFormat {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub consignee_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub building_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub address_line: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub region: String,
    /// State or province.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub political_division1: String,
    /// City.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub political_division2: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub postcode_primary_low: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub postcode_extended_low: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub urbanization: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub country_code: String,
}

impl From<&Address> for AddressKeyFormat {
    /// Lines keep their positions. Only trailing blank lines are dropped, so
    /// a blank line between two filled ones is still sent.
    fn from(address: &Address) -> Self {
        let mut address_line = vec![
            address.address_line1.clone(),
            address.address_line2.clone(),
            address.address_line3.clone(),
        ];
        while address_line.last().is_some_and(|line| line.trim().is_empty()) {
            address_line.pop();
        }

        Self {
            address_line,
            political_division1: address.state_prov.clone(),
            political_division2: address.city.clone(),
            postcode_primary_low: address.postal_code.clone(),
            postcode_extended_low: address.postal_code_extended.clone(),
            country_code: address.country_code.clone(),
            ..Self::default()
        }
    }
}

/// A classification code and its description, e.g. `("1", "Commercial")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressClassification {
    pub code: String,
    pub description: String,
}

impl Default for AddressClassification {
    /// Used when the service leaves the classification out.
    fn default() -> Self {
        Self {
            code: "0".to_string(),
            description: "Unknown".to_string(),
        }
    }
}

/// One suggested match for the submitted address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Candidate {
    pub address_classification: AddressClassification,
    pub address_key_format: AddressKeyFormat,
}

/// `Response.ResponseStatus` from the envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseStatus {
    pub code: String,
    pub description: String,
}

impl ResponseStatus {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

/// The normalized content of an `XAVResponse` envelope.
///
/// Serializes to a canonical PascalCase shape with explicit booleans. That
/// shape is not the upstream wire shape and is not meant to be fed back into
/// the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValidationResponse {
    pub status: ResponseStatus,
    pub valid_address: bool,
    pub ambiguous_address: bool,
    pub no_candidates: bool,
    pub address_classification: AddressClassification,
    pub candidates: Vec<Candidate>,
}
