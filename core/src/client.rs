//! Request building, transport dispatch and outcome classification for the
//! address validation endpoint.
//!
//! # Design
//! `AddressClient` keeps request building and response parsing separate from I/O:
//! `build_validate_request` produces an `HttpRequest`, a `Transport` executes
//! it, and `parse_validate_response` turns the `HttpResponse` into a
//! `ValidationOutcome`. `validate_address` chains the three. Only the
//! transport touches the network, so both pure halves are testable with
//! canned data.
//!
//! The client holds credentials and settings but no per-call state. Sharing
//! one client across threads is as safe as its transport.

use std::time::Duration;

use url::Url;

use crate::error::{Error, TransportError};
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::normalize::normalize;
use crate::types::{Address, AddressKeyFormat, Candidate, ValidationResponse};

pub const PRODUCTION_URL: &str = "https://onlinetools.ups.com";
pub const SANDBOX_URL: &str = "https://wwwcie.ups.com";
pub const API_VERSION: &str = "v1";

const RESOURCE: &str = "addressvalidation";
const REQUEST_ENVELOPE: &str = "XAVRequest";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAXIMUM_CANDIDATE_SIZE: u32 = 10;
pub const MAXIMUM_CANDIDATE_SIZE_LIMIT: u32 = 50;
pub const DEFAULT_REQUEST_OPTION: u8 = 3;

/// Static credentials sent as headers on every request.
#[derive(Clone)]
struct Credentials {
    username: String,
    password: String,
    access_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Client for the address validation API.
#[derive(Debug, Clone)]
pub struct AddressClient<T = UreqTransport> {
    credentials: Credentials,
    transport: T,
    base_url: Option<String>,
    debug: bool,
    sandbox: bool,
    timeout: Duration,
    maximum_candidate_size: u32,
    request_option: u8,
}

impl AddressClient<UreqTransport> {
    pub fn new(username: &str, password: &str, access_key: &str) -> Self {
        Self::with_transport(username, password, access_key, UreqTransport::new())
    }
}

impl<T: Transport> AddressClient<T> {
    pub fn with_transport(username: &str, password: &str, access_key: &str, transport: T) -> Self {
        Self {
            credentials: Credentials {
                username: username.to_string(),
                password: password.to_string(),
                access_key: access_key.to_string(),
            },
            transport,
            base_url: None,
            debug: false,
            sandbox: false,
            timeout: DEFAULT_TIMEOUT,
            maximum_candidate_size: DEFAULT_MAXIMUM_CANDIDATE_SIZE,
            request_option: DEFAULT_REQUEST_OPTION,
        }
    }

    /// Send requests to `base_url` instead of the production or sandbox host.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    /// Log full requests and responses, credential headers included.
    /// Never enable this in production.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn set_sandbox(&mut self, sandbox: bool) {
        self.sandbox = sandbox;
    }

    pub fn sandbox(&self) -> bool {
        self.sandbox
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Values above 50 are clamped to 50.
    pub fn set_maximum_candidate_size(&mut self, size: u32) {
        self.maximum_candidate_size = size.min(MAXIMUM_CANDIDATE_SIZE_LIMIT);
    }

    pub fn maximum_candidate_size(&self) -> u32 {
        self.maximum_candidate_size
    }

    /// Validation mode path segment. Its meaning is defined by the service.
    pub fn set_request_option(&mut self, option: u8) {
        self.request_option = option;
    }

    pub fn request_option(&self) -> u8 {
        self.request_option
    }

    pub fn base_url(&self) -> &str {
        match (&self.base_url, self.sandbox) {
            (Some(url), _) => url,
            (None, true) => SANDBOX_URL,
            (None, false) => PRODUCTION_URL,
        }
    }

    /// Validate `address` with one round-trip to the service.
    pub fn validate_address(&self, address: &Address) -> Result<ValidationOutcome, Error> {
        let request = self.build_validate_request(address)?;
        if self.debug {
            log::debug!("request: POST {}", request.url);
            for (name, value) in &request.headers {
                log::debug!("request header: {name}: {value}");
            }
            log::debug!("request body: {}", request.body);
        }

        let response = self.transport.execute(&request)?;
        if self.debug {
            log::debug!("response: {} {}", response.status, response.reason);
            log::debug!("response body: {}", response.body);
        }

        self.parse_validate_response(response)
    }

    pub fn build_validate_request(&self, address: &Address) -> Result<HttpRequest, TransportError> {
        let payload = XavRequest {
            address_key_format: AddressKeyFormat::from(address),
        };
        let size = self.maximum_candidate_size.to_string();
        self.build_post(
            RESOURCE,
            REQUEST_ENVELOPE,
            &payload,
            &self.request_option.to_string(),
            &[("maximumcandidatelistsize", size.as_str())],
        )
    }

    /// Classify a raw response: non-2xx is a transport error, an undecodable
    /// body is a decode error, and a status code other than `"1"` is a
    /// service error.
    pub fn parse_validate_response(&self, response: HttpResponse) -> Result<ValidationOutcome, Error> {
        check_status(&response)?;

        let normalized = normalize(response.body.as_bytes()).map_err(|e| {
            log::error!("failed to normalize address validation response: {e}");
            e
        })?;

        if !normalized.status.is_success() {
            log::warn!(
                "address validation returned status {}: {}",
                normalized.status.code,
                normalized.status.description
            );
            return Err(Error::Service {
                code: normalized.status.code,
                description: normalized.status.description,
            });
        }

        log::debug!(
            "address validation succeeded with {} candidate(s)",
            normalized.candidates.len()
        );
        Ok(ValidationOutcome {
            response: normalized,
        })
    }

    /// Assemble `{base}/{resource}/{version}[/{suffix}][?query]` and wrap
    /// `payload` under `envelope`.
    fn build_post<P: serde::Serialize>(
        &self,
        resource: &str,
        envelope: &str,
        payload: &P,
        suffix: &str,
        query: &[(&str, &str)],
    ) -> Result<HttpRequest, TransportError> {
        let mut url =
            Url::parse(self.base_url()).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                TransportError::InvalidUrl(format!("{} cannot be a base", self.base_url()))
            })?;
            segments.pop_if_empty().extend([resource, API_VERSION]);
            if !suffix.is_empty() {
                segments.push(suffix);
            }
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let mut body = serde_json::Map::new();
        body.insert(
            envelope.to_string(),
            serde_json::to_value(payload).map_err(|e| TransportError::Serialization(e.to_string()))?,
        );
        let body = serde_json::to_string(&body)
            .map_err(|e| TransportError::Serialization(e.to_string()))?;

        Ok(HttpRequest {
            url: url.to_string(),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
                ("Username".to_string(), self.credentials.username.clone()),
                ("Password".to_string(), self.credentials.password.clone()),
                (
                    "AccessLicenseNumber".to_string(),
                    self.credentials.access_key.clone(),
                ),
            ],
            body,
            timeout: self.timeout,
        })
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct XavRequest {
    address_key_format: AddressKeyFormat,
}

/// Map non-2xx status codes to `TransportError::Status`.
fn check_status(response: &HttpResponse) -> Result<(), TransportError> {
    if response.is_success() {
        return Ok(());
    }
    Err(TransportError::Status {
        status: response.status,
        reason: response.reason.clone(),
        body: response.body.clone(),
    })
}

/// A successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    response: ValidationResponse,
}

impl ValidationOutcome {
    pub fn response(&self) -> &ValidationResponse {
        &self.response
    }

    pub fn into_response(self) -> ValidationResponse {
        self.response
    }

    pub fn valid_address(&self) -> bool {
        self.response.valid_address
    }

    pub fn ambiguous_address(&self) -> bool {
        self.response.ambiguous_address
    }

    pub fn no_candidate(&self) -> bool {
        self.response.no_candidates
    }

    /// Description of the top-level classification, `"Unknown"` if the
    /// service did not classify the address.
    pub fn address_classification(&self) -> &str {
        &self.response.address_classification.description
    }

    /// The validated address, or the first suggestion when the input was not
    /// valid, in flat form. `None` when there are no candidates.
    pub fn address(&self) -> Option<Address> {
        self.first_candidate().map(|candidate| {
            Address::from_key_format(
                &candidate.address_key_format,
                &candidate.address_classification.description,
            )
        })
    }

    /// The first candidate exactly as the service formatted it.
    pub fn address_key_format(&self) -> Option<&AddressKeyFormat> {
        self.first_candidate().map(|c| &c.address_key_format)
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.response.candidates
    }

    fn first_candidate(&self) -> Option<&Candidate> {
        self.response.candidates.first()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::DecodeError;

    /// Replays one canned response and remembers the request it was given.
    struct CannedTransport {
        response: Result<HttpResponse, String>,
        seen: RefCell<Option<HttpRequest>>,
    }

    impl CannedTransport {
        fn ok(status: u16, body: &str) -> Self {
            Self {
                response: Ok(HttpResponse {
                    status,
                    reason: String::new(),
                    headers: Vec::new(),
                    body: body.to_string(),
                }),
                seen: RefCell::new(None),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                response: Err(message.to_string()),
                seen: RefCell::new(None),
            }
        }
    }

    impl Transport for CannedTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            *self.seen.borrow_mut() = Some(request.clone());
            self.response.clone().map_err(TransportError::Network)
        }
    }

    fn client() -> AddressClient {
        AddressClient::new("user", "secret", "key")
    }

    fn canned(transport: CannedTransport) -> AddressClient<CannedTransport> {
        AddressClient::with_transport("user", "secret", "key", transport)
    }

    fn address() -> Address {
        Address {
            address_line1: "123 Main St".to_string(),
            address_line2: "Apt 4".to_string(),
            city: "Timonium".to_string(),
            state_prov: "MD".to_string(),
            postal_code: "21093".to_string(),
            country_code: "US".to_string(),
            ..Address::default()
        }
    }

    const SUCCESS: &str = r#"{"XAVResponse": {
        "Response": {"ResponseStatus": {"Code": "1", "Description": "Success"}},
        "ValidAddressIndicator": "",
        "AddressClassification": {"Code": "1", "Description": "Commercial"},
        "Candidate": {
            "AddressClassification": {"Code": "1", "Description": "Commercial"},
            "AddressKeyFormat": {
                "AddressLine": ["123 MAIN ST", "APT 4"],
                "PoliticalDivision2": "TIMONIUM",
                "PoliticalDivision1": "MD",
                "PostcodePrimaryLow": "21093",
                "PostcodeExtendedLow": "1234",
                "CountryCode": "US"
            }
        }
    }}"#;

    #[test]
    fn defaults_match_service_conventions() {
        let c = client();
        assert!(!c.debug());
        assert!(!c.sandbox());
        assert_eq!(c.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(c.maximum_candidate_size(), 10);
        assert_eq!(c.request_option(), 3);
        assert_eq!(c.base_url(), PRODUCTION_URL);
    }

    #[test]
    fn maximum_candidate_size_is_clamped() {
        let mut c = client();
        for (input, expected) in [(0, 0), (15, 15), (50, 50), (51, 50), (500, 50)] {
            c.set_maximum_candidate_size(input);
            assert_eq!(c.maximum_candidate_size(), expected, "input {input}");
        }
    }

    #[test]
    fn sandbox_switches_host() {
        let mut c = client();
        c.set_sandbox(true);
        let req = c.build_validate_request(&address()).unwrap();
        assert_eq!(
            req.url,
            "https://wwwcie.ups.com/addressvalidation/v1/3?maximumcandidatelistsize=10"
        );
    }

    #[test]
    fn build_request_uses_option_and_candidate_size() {
        let mut c = client();
        c.set_request_option(1);
        c.set_maximum_candidate_size(25);
        c.set_timeout(Duration::from_secs(5));
        let req = c.build_validate_request(&address()).unwrap();
        assert_eq!(
            req.url,
            "https://onlinetools.ups.com/addressvalidation/v1/1?maximumcandidatelistsize=25"
        );
        assert_eq!(req.timeout, Duration::from_secs(5));
    }

    #[test]
    fn build_request_sets_json_and_credential_headers() {
        let req = client().build_validate_request(&address()).unwrap();
        let header = |name: &str| {
            req.headers
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(header("Content-Type"), Some("application/json"));
        assert_eq!(header("Accept"), Some("application/json"));
        assert_eq!(header("Username"), Some("user"));
        assert_eq!(header("Password"), Some("secret"));
        assert_eq!(header("AccessLicenseNumber"), Some("key"));
    }

    #[test]
    fn build_request_wraps_payload_in_envelope() {
        let req = client().build_validate_request(&address()).unwrap();
        let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
        let format = &body["XAVRequest"]["AddressKeyFormat"];
        assert_eq!(format["AddressLine"], serde_json::json!(["123 Main St", "Apt 4"]));
        assert_eq!(format["PoliticalDivision1"], "MD");
        assert_eq!(format["PoliticalDivision2"], "Timonium");
        assert_eq!(format["PostcodePrimaryLow"], "21093");
        assert_eq!(format["CountryCode"], "US");
    }

    #[test]
    fn base_url_override_strips_trailing_slash() {
        let c = client().with_base_url("http://127.0.0.1:3000/");
        let req = c.build_validate_request(&address()).unwrap();
        assert_eq!(
            req.url,
            "http://127.0.0.1:3000/addressvalidation/v1/3?maximumcandidatelistsize=10"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let c = client().with_base_url("not a url");
        let err = c.build_validate_request(&address()).unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl(_)));
    }

    #[test]
    fn validate_address_sends_built_request() {
        let c = canned(CannedTransport::ok(200, SUCCESS));
        let outcome = c.validate_address(&address()).unwrap();
        assert!(outcome.valid_address());

        let seen = c.transport.seen.borrow().clone().unwrap();
        assert_eq!(seen, c.build_validate_request(&address()).unwrap());
    }

    #[test]
    fn outcome_exposes_first_candidate() {
        let outcome = canned(CannedTransport::ok(200, SUCCESS))
            .validate_address(&address())
            .unwrap();
        assert!(outcome.valid_address());
        assert!(!outcome.ambiguous_address());
        assert!(!outcome.no_candidate());
        assert_eq!(outcome.address_classification(), "Commercial");

        let flat = outcome.address().unwrap();
        assert_eq!(flat.address_line1, "123 MAIN ST");
        assert_eq!(flat.address_line2, "APT 4");
        assert_eq!(flat.address_line3, "");
        assert_eq!(flat.city, "TIMONIUM");
        assert_eq!(flat.state_prov, "MD");
        assert_eq!(flat.postal_code_extended, "1234");
        assert_eq!(flat.classification, "Commercial");

        let format = outcome.address_key_format().unwrap();
        assert_eq!(format.address_line, vec!["123 MAIN ST", "APT 4"]);
    }

    #[test]
    fn no_candidates_yields_no_address() {
        let body = r#"{"XAVResponse": {
            "Response": {"ResponseStatus": {"Code": "1", "Description": "Success"}},
            "NoCandidatesIndicator": ""
        }}"#;
        let outcome = canned(CannedTransport::ok(200, body))
            .validate_address(&address())
            .unwrap();
        assert!(outcome.no_candidate());
        assert!(outcome.address().is_none());
        assert!(outcome.address_key_format().is_none());
        assert_eq!(outcome.address_classification(), "Unknown");
    }

    #[test]
    fn non_success_status_code_is_service_error() {
        let body = r#"{"XAVResponse": {
            "Response": {"ResponseStatus": {"Code": "2", "Description": "Invalid Access License"}},
            "ValidAddressIndicator": ""
        }}"#;
        let err = canned(CannedTransport::ok(200, body))
            .validate_address(&address())
            .unwrap_err();
        match err {
            Error::Service { code, description } => {
                assert_eq!(code, "2");
                assert_eq!(description, "Invalid Access License");
            }
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[test]
    fn non_2xx_is_transport_error() {
        let mut transport = CannedTransport::ok(401, r#"{"response":{"errors":[]}}"#);
        if let Ok(response) = transport.response.as_mut() {
            response.reason = "Unauthorized".to_string();
        }
        let err = canned(transport).validate_address(&address()).unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::Status { status: 401, ref reason, .. }) if reason == "Unauthorized"
        ));
    }

    #[test]
    fn network_failure_is_transport_error() {
        let err = canned(CannedTransport::failing("timed out"))
            .validate_address(&address())
            .unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Network(_))));
    }

    #[test]
    fn undecodable_body_is_decode_error() {
        let err = canned(CannedTransport::ok(200, "<html>maintenance</html>"))
            .validate_address(&address())
            .unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::Malformed(_))));
    }

    /// Collects formatted records per thread so parallel tests do not see
    /// each other's output.
    struct CaptureLogger;

    thread_local! {
        static CAPTURED: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    impl log::Log for CaptureLogger {
        fn enabled(&self, _: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            CAPTURED.with(|lines| lines.borrow_mut().push(record.args().to_string()));
        }

        fn flush(&self) {}
    }

    static LOGGER: CaptureLogger = CaptureLogger;

    /// Run `f` and return every line it logged on this thread.
    fn captured_logs(f: impl FnOnce()) -> Vec<String> {
        static INSTALL: std::sync::Once = std::sync::Once::new();
        INSTALL.call_once(|| {
            let _ = log::set_logger(&LOGGER);
            log::set_max_level(log::LevelFilter::Trace);
        });
        CAPTURED.with(|lines| lines.borrow_mut().clear());
        f();
        CAPTURED.with(|lines| lines.borrow_mut().drain(..).collect())
    }

    #[test]
    fn debug_mode_logs_full_request_and_response() {
        let mut c = canned(CannedTransport::ok(200, SUCCESS));
        c.set_debug(true);
        let lines = captured_logs(|| {
            c.validate_address(&address()).unwrap();
        });

        assert!(lines.iter().any(|l| l.starts_with("request: POST ")), "{lines:?}");
        assert!(lines.contains(&"request header: Username: user".to_string()), "{lines:?}");
        assert!(lines.contains(&"request header: Password: secret".to_string()), "{lines:?}");
        assert!(lines.contains(&"request header: AccessLicenseNumber: key".to_string()), "{lines:?}");
        assert!(lines.iter().any(|l| l.starts_with("request body: ") && l.contains("XAVRequest")));
        assert!(lines.iter().any(|l| l.starts_with("response body: ") && l.contains("XAVResponse")));
    }

    #[test]
    fn quiet_mode_logs_no_request_or_response_content() {
        let c = canned(CannedTransport::ok(200, SUCCESS));
        let lines = captured_logs(|| {
            c.validate_address(&address()).unwrap();
        });

        assert!(!lines.is_empty(), "outcome summary should still be logged");
        for line in &lines {
            assert!(!line.contains("secret"), "{line}");
            assert!(!line.contains("AccessLicenseNumber"), "{line}");
            assert!(!line.starts_with("request"), "{line}");
            assert!(!line.starts_with("response"), "{line}");
            assert!(!line.contains("123 MAIN ST"), "{line}");
        }
    }

    #[test]
    fn credentials_are_not_in_debug_output() {
        let rendered = format!("{:?}", client());
        assert!(rendered.contains("user"));
        assert!(!rendered.contains("secret"));
    }
}
