use std::fmt;
use std::ops::Deref;

use http::{StatusCode, Version};
use serde_json::Value;

use crate::error::{ErrorDetails, ErrorMessage, Result, ResourceError};
use crate::request::Headers;

/// Response body as handed back by a transport
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Any non-JSON body, decoded as text
    Text(String),
    /// A JSON body: the text as received plus its parsed value
    Json { text: String, value: Value },
}

impl ResponseBody {
    /// Create a text body
    pub fn text(text: impl Into<String>) -> Self {
        ResponseBody::Text(text.into())
    }

    /// Create a JSON body from a value, rendering its text
    pub fn json(value: Value) -> Self {
        ResponseBody::Json {
            text: value.to_string(),
            value,
        }
    }

    /// Parse `text` as JSON, falling back to a text body when it is not
    pub fn parse_json(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => ResponseBody::Json { text, value },
            Err(_) => ResponseBody::Text(text),
        }
    }

    /// Get the body text
    pub fn as_str(&self) -> &str {
        match self {
            ResponseBody::Text(text) | ResponseBody::Json { text, .. } => text,
        }
    }

    /// Get the parsed JSON value, if any
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json { value, .. } => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    /// Consume the body, returning its text
    pub fn into_text(self) -> String {
        match self {
            ResponseBody::Text(text) | ResponseBody::Json { text, .. } => text,
        }
    }

    /// Extract the error message carried by this body
    ///
    /// A JSON object yields its `error` and `reason` members, each absent
    /// when missing or null. Anything else is returned verbatim.
    pub fn error_message(self) -> ErrorMessage {
        match self {
            ResponseBody::Json {
                value: Value::Object(map),
                ..
            } => ErrorMessage::Structured {
                error: map.get("error").and_then(member_text),
                reason: map.get("reason").and_then(member_text),
            },
            body => ErrorMessage::Raw(body.into_text()),
        }
    }
}

fn member_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// What the transport knows about the response, besides its body
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: StatusCode,
    url: String,
    version: Version,
    headers: Headers,
}

impl RawResponse {
    /// Create a raw response with no headers
    pub fn new(status: StatusCode, url: impl Into<String>) -> Self {
        Self {
            status,
            url: url.into(),
            version: Version::HTTP_11,
            headers: Headers::new(),
        }
    }

    /// Set the HTTP version
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Set the response headers
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Add a response header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value.into());
        self
    }

    /// Get the HTTP status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the URL that answered
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the HTTP version
    pub fn version(&self) -> Version {
        self.version
    }

    /// Get the response headers, in the order received
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get the last value of a header, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iget(name).ok().map(String::as_str)
    }

    /// Get the content type
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

/// A successful response
///
/// Derefs to the body text. The status code and the raw response are
/// available alongside it.
///
/// ```rust
/// use restkit::response::{classify, RawResponse, ResponseBody};
/// use restkit::StatusCode;
///
/// let raw = RawResponse::new(StatusCode::OK, "http://x.org/");
/// let result = classify(StatusCode::OK, ResponseBody::text("hello"), raw).unwrap();
/// assert_eq!(result, "hello");
/// assert_eq!(result.len(), 5);
/// assert_eq!(result.status_code(), 200);
/// ```
#[derive(Debug, Clone)]
pub struct ResourceResult {
    value: String,
    status: StatusCode,
    response: RawResponse,
}

impl ResourceResult {
    /// Create a result from its parts
    pub fn new(value: impl Into<String>, status: StatusCode, response: RawResponse) -> Self {
        Self {
            value: value.into(),
            status,
            response,
        }
    }

    /// Get the body text
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Get the HTTP status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the HTTP status code as a number
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Get the raw response
    pub fn response(&self) -> &RawResponse {
        &self.response
    }

    /// Consume the result, returning the body text
    pub fn into_string(self) -> String {
        self.value
    }

    /// Deserialize the body text as JSON
    pub fn json<T>(&self) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        Ok(serde_json::from_str(&self.value)?)
    }
}

impl Deref for ResourceResult {
    type Target = str;

    fn deref(&self) -> &str {
        &self.value
    }
}

impl AsRef<str> for ResourceResult {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for ResourceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl PartialEq<str> for ResourceResult {
    fn eq(&self, other: &str) -> bool {
        self.value == other
    }
}

impl PartialEq<&str> for ResourceResult {
    fn eq(&self, other: &&str) -> bool {
        self.value == *other
    }
}

impl From<ResourceResult> for String {
    fn from(result: ResourceResult) -> Self {
        result.value
    }
}

/// Turn a status code and body into a result or a typed failure
///
/// Anything below 400 succeeds. 404 is `NotFound`, 401 and 403 are
/// `Unauthorized`, every other status from 400 up is `RequestFailed`.
pub fn classify(
    status: StatusCode,
    body: ResponseBody,
    response: RawResponse,
) -> std::result::Result<ResourceResult, ResourceError> {
    let code = status.as_u16();
    if code < 400 {
        return Ok(ResourceResult::new(body.into_text(), status, response));
    }

    let details = ErrorDetails {
        message: body.error_message(),
        status,
        response,
    };
    Err(match code {
        404 => ResourceError::NotFound(details),
        401 | 403 => ResourceError::Unauthorized(details),
        _ => ResourceError::RequestFailed(details),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn raw(status: StatusCode) -> RawResponse {
        RawResponse::new(status, "http://x.org/doc")
    }

    fn status(code: u16) -> StatusCode {
        StatusCode::from_u16(code).unwrap()
    }

    #[test]
    fn test_success_carries_body_and_status() {
        let result = assert_ok!(classify(status(200), ResponseBody::text("hello"), raw(status(200))));
        assert_eq!(result, "hello");
        assert_eq!(result.as_str(), "hello");
        assert_eq!(result.status_code(), 200);
        assert_eq!(result.response().url(), "http://x.org/doc");
        assert_eq!(String::from(result), "hello");
    }

    #[test]
    fn test_redirect_and_informational_codes_succeed() {
        for code in [100, 204, 304, 399] {
            assert_ok!(classify(status(code), ResponseBody::text(""), raw(status(code))));
        }
    }

    #[test]
    fn test_not_found_with_structured_body() {
        let body = ResponseBody::json(json!({"error": "not_found", "reason": "missing"}));
        let err = assert_err!(classify(status(404), body, raw(status(404))));

        assert!(matches!(err, ResourceError::NotFound(_)));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message().error(), Some("not_found"));
        assert_eq!(err.message().reason(), Some("missing"));
        assert_eq!(err.to_string(), "Resource not found (404 Not Found): (not_found, missing)");
    }

    #[test]
    fn test_unauthorized_with_raw_body() {
        for code in [401, 403] {
            let err = assert_err!(classify(
                status(code),
                ResponseBody::text("forbidden page"),
                raw(status(code))
            ));
            assert!(matches!(err, ResourceError::Unauthorized(_)));
            assert_eq!(err.status().as_u16(), code);
            assert_eq!(err.message(), &ErrorMessage::Raw("forbidden page".to_string()));
        }
    }

    #[test]
    fn test_other_error_codes_fail() {
        for code in [400, 409, 500, 503] {
            let err = assert_err!(classify(status(code), ResponseBody::text("boom"), raw(status(code))));
            assert!(matches!(err, ResourceError::RequestFailed(_)));
        }
    }

    #[test]
    fn test_structured_body_missing_members() {
        let body = ResponseBody::json(json!({"error": "conflict", "reason": null}));
        let err = assert_err!(classify(status(409), body, raw(status(409))));
        assert_eq!(
            err.message(),
            &ErrorMessage::Structured {
                error: Some("conflict".to_string()),
                reason: None,
            }
        );

        let body = ResponseBody::json(json!(["not", "a", "mapping"]));
        let err = assert_err!(classify(status(500), body, raw(status(500))));
        assert_eq!(err.message(), &ErrorMessage::Raw(r#"["not","a","mapping"]"#.to_string()));
    }

    #[test]
    fn test_result_json_decoding() {
        let body = ResponseBody::parse_json(r#"{"id": "abc", "rev": 2}"#.to_string());
        assert!(body.as_json().is_some());

        let result = assert_ok!(classify(status(200), body, raw(status(200))));
        assert_eq!(result, r#"{"id": "abc", "rev": 2}"#);
        let value: serde_json::Value = result.json().unwrap();
        assert_eq!(value["rev"], 2);
    }

    #[test]
    fn test_raw_response_header_lookup() {
        let response = raw(status(200))
            .with_header("Content-Type", "application/json")
            .with_header("X-Rev", "1")
            .with_header("x-rev", "2");
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.header("X-REV"), Some("2"));
        assert_eq!(response.headers().len(), 3);
    }
}
