use http::header::{HeaderName, CONTENT_TYPE};
use http::{HeaderValue, Method};
use reqwest::Request as ReqwestRequest;
use serde_json::Value;
use url::Url;

use crate::error::Result;
use crate::multidict::MultiDict;

/// Request or response headers, in order, repeats allowed
pub type Headers = MultiDict<String>;

/// Request body types
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// String body
    Text(String),
    /// Bytes body
    Bytes(Vec<u8>),
    /// JSON body; sent as `application/json` unless a content type is given
    Json(Value),
}

impl RequestBody {
    /// Serialize any value into a JSON body
    pub fn json<T: serde::Serialize>(body: &T) -> Result<Self> {
        Ok(RequestBody::Json(serde_json::to_value(body)?))
    }

    /// Get the encoded body bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(match self {
            RequestBody::Text(text) => text.as_bytes().to_vec(),
            RequestBody::Bytes(bytes) => bytes.clone(),
            RequestBody::Json(json) => serde_json::to_vec(json)?,
        })
    }

    /// Content type implied by the body, if any
    pub fn default_content_type(&self) -> Option<&'static str> {
        match self {
            RequestBody::Json(_) => Some("application/json"),
            _ => None,
        }
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Bytes(bytes)
    }
}

impl From<Value> for RequestBody {
    fn from(json: Value) -> Self {
        RequestBody::Json(json)
    }
}

/// A fully assembled request, ready for a transport
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: String,
    headers: Headers,
    body: Option<RequestBody>,
}

impl Request {
    /// Create a new request
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: Headers::new(),
            body: None,
        }
    }

    /// Set the headers
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Set the body
    pub fn with_body(mut self, body: Option<RequestBody>) -> Self {
        self.body = body;
        self
    }

    /// Get the HTTP method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the target URI
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Get the headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get the body
    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// Convert to reqwest request
    ///
    /// Every header pair is appended, so repeated names reach the wire in
    /// order.
    pub fn into_reqwest_request(self) -> Result<ReqwestRequest> {
        let url = Url::parse(&self.uri)?;
        let mut request = ReqwestRequest::new(self.method, url);

        let mut has_content_type = false;
        for (name, value) in self.headers {
            let name = name.parse::<HeaderName>()?;
            let value = value.parse::<HeaderValue>()?;
            has_content_type |= name == CONTENT_TYPE;
            request.headers_mut().append(name, value);
        }

        if let Some(body) = self.body {
            if let (false, Some(content_type)) = (has_content_type, body.default_content_type()) {
                request
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
            *request.body_mut() = Some(body.to_bytes()?.into());
        }

        Ok(request)
    }
}
