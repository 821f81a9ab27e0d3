//! Stand-in for the address validation endpoint.
//!
//! Reproduces the quirks of the real service so clients can be tested
//! against them: indicators are sent as `""` when true and omitted when
//! false, a single candidate is sent as a bare object, and a single address
//! line is sent as a bare string.
//!
//! Canned behavior, keyed on the submitted address:
//! - postal code `00000`: no candidates
//! - city `SPRINGFIELD` (any case): ambiguous, several candidates
//! - no city and no postal code: status code `"2"` inside a 200 response
//! - anything else: valid, echoed back upper-cased as one candidate

use std::collections::HashMap;

use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

const CREDENTIAL_HEADERS: [&str; 3] = ["Username", "Password", "AccessLicenseNumber"];
const AMBIGUOUS_CITY: &str = "SPRINGFIELD";
const NO_MATCH_POSTCODE: &str = "00000";

#[derive(Debug, Deserialize)]
pub struct XavRequestEnvelope {
    #[serde(rename = "XAVRequest")]
    pub request: XavRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XavRequest {
    pub address_key_format: RequestAddress,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RequestAddress {
    pub address_line: Vec<String>,
    pub political_division1: String,
    pub political_division2: String,
    pub postcode_primary_low: String,
    pub postcode_extended_low: String,
    pub country_code: String,
}

pub fn app() -> Router {
    Router::new().route("/addressvalidation/v1/{option}", post(validate))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn validate(
    Path(option): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(input): Json<XavRequestEnvelope>,
) -> (StatusCode, Json<Value>) {
    let authenticated = CREDENTIAL_HEADERS.iter().all(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| !v.is_empty())
    });
    if !authenticated {
        return error(StatusCode::UNAUTHORIZED, "250002", "Invalid Authentication Information.");
    }
    if !matches!(option.as_str(), "1" | "2" | "3") {
        return error(StatusCode::BAD_REQUEST, "265001", "Invalid request option.");
    }
    let limit = match params.get("maximumcandidatelistsize") {
        None => 15,
        Some(raw) => match raw.parse::<usize>() {
            Ok(limit) if limit <= 50 => limit,
            _ => {
                return error(
                    StatusCode::BAD_REQUEST,
                    "265002",
                    "Invalid maximum candidate list size.",
                )
            }
        },
    };

    let address = input.request.address_key_format;
    (StatusCode::OK, Json(json!({ "XAVResponse": respond(&address, limit) })))
}

fn respond(address: &RequestAddress, limit: usize) -> Value {
    let mut body = serde_json::Map::new();

    if address.political_division2.is_empty() && address.postcode_primary_low.is_empty() {
        body.insert("Response".into(), status("2", "Failure: missing city and postal code"));
        return Value::Object(body);
    }
    body.insert("Response".into(), status("1", "Success"));

    if address.postcode_primary_low == NO_MATCH_POSTCODE {
        body.insert("NoCandidatesIndicator".into(), json!(""));
        return Value::Object(body);
    }

    if address.political_division2.eq_ignore_ascii_case(AMBIGUOUS_CITY) {
        body.insert("AmbiguousAddressIndicator".into(), json!(""));
        let candidates: Vec<Value> = ["IL", "MA", "MO", "OR"]
            .iter()
            .zip(["62701", "01103", "65806", "97477"])
            .take(limit)
            .map(|(state, postcode)| {
                let mut suggestion = upper_cased(address);
                suggestion.political_division1 = state.to_string();
                suggestion.postcode_primary_low = postcode.to_string();
                candidate(&suggestion)
            })
            .collect();
        body.insert("Candidate".into(), collapse(candidates));
        return Value::Object(body);
    }

    body.insert("ValidAddressIndicator".into(), json!(""));
    body.insert("AddressClassification".into(), classification());
    if limit > 0 {
        body.insert("Candidate".into(), candidate(&upper_cased(address)));
    }
    Value::Object(body)
}

fn upper_cased(address: &RequestAddress) -> RequestAddress {
    RequestAddress {
        address_line: address.address_line.iter().map(|l| l.to_uppercase()).collect(),
        political_division1: address.political_division1.to_uppercase(),
        political_division2: address.political_division2.to_uppercase(),
        postcode_primary_low: address.postcode_primary_low.clone(),
        postcode_extended_low: address.postcode_extended_low.clone(),
        country_code: address.country_code.to_uppercase(),
    }
}

fn candidate(address: &RequestAddress) -> Value {
    let mut format = json!({
        "PoliticalDivision2": address.political_division2,
        "PoliticalDivision1": address.political_division1,
        "PostcodePrimaryLow": address.postcode_primary_low,
        "CountryCode": address.country_code,
    });
    if !address.postcode_extended_low.is_empty() {
        format["PostcodeExtendedLow"] = json!(address.postcode_extended_low);
    }
    let lines: Vec<Value> = address.address_line.iter().map(|l| json!(l)).collect();
    if !lines.is_empty() {
        format["AddressLine"] = collapse(lines);
    }
    json!({
        "AddressClassification": classification(),
        "AddressKeyFormat": format,
    })
}

/// One element goes out bare, the way the real service encodes it.
fn collapse(mut items: Vec<Value>) -> Value {
    if items.len() == 1 {
        items.remove(0)
    } else {
        Value::Array(items)
    }
}

fn classification() -> Value {
    json!({ "Code": "1", "Description": "Commercial" })
}

fn status(code: &str, description: &str) -> Value {
    json!({ "ResponseStatus": { "Code": code, "Description": description } })
}

fn error(status: StatusCode, code: &str, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({ "response": { "errors": [{ "code": code, "message": message }] } })),
    )
}
