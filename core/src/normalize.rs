//! Two-phase decoding of the `XAVResponse` envelope.
//!
//! # Design
//! The service's JSON encoder does not produce a stable shape:
//!
//! - indicator fields are omitted when false and sent as `""` when true, so
//!   only their presence carries meaning;
//! - single-element arrays collapse to the bare element, which affects
//!   `Candidate` (object or array of objects) and `AddressLine` (string or
//!   array of strings);
//! - the top-level `AddressClassification` may be missing altogether.
//!
//! Deriving `Deserialize` against that shape would either reject valid
//! responses or silently misread them. Instead the body is parsed into a
//! `serde_json::Value` tree first and then projected field by field into the
//! typed structures. Field presence and the scalar-or-array union are modeled
//! explicitly by `Field` and `OneOrMany`. JSON `null` is treated the same
//! as an absent key.

use serde::de::{self, Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::types::{
    AddressClassification, AddressKeyFormat, Candidate, ResponseStatus, ValidationResponse,
};

/// Top-level key wrapping every response body.
pub const RESPONSE_ENVELOPE: &str = "XAVResponse";

/// Normalize a raw response body into a `ValidationResponse`.
///
/// The body must be the full envelope, `{"XAVResponse": {...}}`.
pub fn normalize(body: &[u8]) -> Result<ValidationResponse, DecodeError> {
    let root: Value =
        serde_json::from_slice(body).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    let root = as_object(&root, "<root>")?;
    match lookup(root, RESPONSE_ENVELOPE) {
        Field::Present(inner) => validation_response(inner),
        Field::Absent => Err(DecodeError::MissingField(RESPONSE_ENVELOPE)),
    }
}

/// Presence of a key in a raw JSON object.
#[derive(Debug, Clone, Copy)]
enum Field<'a> {
    Absent,
    Present(&'a Value),
}

fn lookup<'a>(object: &'a Map<String, Value>, key: &str) -> Field<'a> {
    match object.get(key) {
        None | Some(Value::Null) => Field::Absent,
        Some(value) => Field::Present(value),
    }
}

/// A value that arrives either bare or wrapped in an array.
#[derive(Debug, Clone, Copy)]
enum OneOrMany<'a> {
    One(&'a Value),
    Many(&'a [Value]),
}

impl<'a> OneOrMany<'a> {
    fn of(value: &'a Value) -> Self {
        match value {
            Value::Array(items) => OneOrMany::Many(items),
            other => OneOrMany::One(other),
        }
    }

    fn items(self) -> Vec<&'a Value> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(items) => items.iter().collect(),
        }
    }
}

fn as_object<'a>(
    value: &'a Value,
    field: &'static str,
) -> Result<&'a Map<String, Value>, DecodeError> {
    value.as_object().ok_or(DecodeError::UnexpectedType {
        field,
        expected: "object",
    })
}

fn as_string(value: &Value, field: &'static str) -> Result<String, DecodeError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or(DecodeError::UnexpectedType {
            field,
            expected: "string",
        })
}

/// Scalar string field; absent means empty.
fn string_field(object: &Map<String, Value>, key: &'static str) -> Result<String, DecodeError> {
    match lookup(object, key) {
        Field::Absent => Ok(String::new()),
        Field::Present(value) => as_string(value, key),
    }
}

/// Indicator field; its value is ignored.
fn indicator(object: &Map<String, Value>, key: &str) -> bool {
    matches!(lookup(object, key), Field::Present(_))
}

fn validation_response(value: &Value) -> Result<ValidationResponse, DecodeError> {
    let object = as_object(value, RESPONSE_ENVELOPE)?;

    let candidates = match lookup(object, "Candidate") {
        Field::Absent => Vec::new(),
        Field::Present(raw) => OneOrMany::of(raw)
            .items()
            .into_iter()
            .map(candidate)
            .collect::<Result<_, _>>()?,
    };

    Ok(ValidationResponse {
        status: response_status(object)?,
        valid_address: indicator(object, "ValidAddressIndicator"),
        ambiguous_address: indicator(object, "AmbiguousAddressIndicator"),
        no_candidates: indicator(object, "NoCandidatesIndicator"),
        address_classification: classification(object)?,
        candidates,
    })
}

fn response_status(object: &Map<String, Value>) -> Result<ResponseStatus, DecodeError> {
    let response = match lookup(object, "Response") {
        Field::Present(value) => as_object(value, "Response")?,
        Field::Absent => return Err(DecodeError::MissingField("Response")),
    };
    let status = match lookup(response, "ResponseStatus") {
        Field::Present(value) => as_object(value, "ResponseStatus")?,
        Field::Absent => return Err(DecodeError::MissingField("ResponseStatus")),
    };
    Ok(ResponseStatus {
        code: string_field(status, "Code")?,
        description: string_field(status, "Description")?,
    })
}

fn classification(object: &Map<String, Value>) -> Result<AddressClassification, DecodeError> {
    match lookup(object, "AddressClassification") {
        Field::Absent => Ok(AddressClassification::default()),
        Field::Present(value) => {
            let raw = as_object(value, "AddressClassification")?;
            Ok(AddressClassification {
                code: string_field(raw, "Code")?,
                description: string_field(raw, "Description")?,
            })
        }
    }
}

fn candidate(value: &Value) -> Result<Candidate, DecodeError> {
    let object = as_object(value, "Candidate")?;
    let address_key_format = match lookup(object, "AddressKeyFormat") {
        Field::Absent => AddressKeyFormat::default(),
        Field::Present(raw) => address_key_format(raw)?,
    };
    Ok(Candidate {
        address_classification: classification(object)?,
        address_key_format,
    })
}

fn address_key_format(value: &Value) -> Result<AddressKeyFormat, DecodeError> {
    let object = as_object(value, "AddressKeyFormat")?;
    Ok(AddressKeyFormat {
        consignee_name: string_field(object, "ConsigneeName")?,
        building_name: string_field(object, "BuildingName")?,
        address_line: address_lines(object)?,
        region: string_field(object, "Region")?,
        political_division1: string_field(object, "PoliticalDivision1")?,
        political_division2: string_field(object, "PoliticalDivision2")?,
        postcode_primary_low: string_field(object, "PostcodePrimaryLow")?,
        postcode_extended_low: string_field(object, "PostcodeExtendedLow")?,
        urbanization: string_field(object, "Urbanization")?,
        country_code: string_field(object, "CountryCode")?,
    })
}

fn address_lines(object: &Map<String, Value>) -> Result<Vec<String>, DecodeError> {
    match lookup(object, "AddressLine") {
        Field::Absent => Ok(Vec::new()),
        Field::Present(raw) => OneOrMany::of(raw)
            .items()
            .into_iter()
            .map(|line| as_string(line, "AddressLine"))
            .collect(),
    }
}

impl<'de> Deserialize<'de> for AddressKeyFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        address_key_format(&value).map_err(de::Error::custom)
    }
}

/// Deserializes the object found under the `XAVResponse` key, not the
/// envelope itself. Use [`normalize`] for a whole response body.
impl<'de> Deserialize<'de> for ValidationResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        validation_response(&value).map_err(de::Error::custom)
    }
}
