use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, ClientBuilder as ReqwestBuilder};
use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::multidict::KeyMatch;
use crate::request::{Headers, Request};
use crate::response::{RawResponse, ResponseBody};
use crate::timeout::TimeoutConfig;

/// What a transport hands back for every completed exchange
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// The response body
    pub body: ResponseBody,
    /// Status, headers and anything else the transport knows
    pub response: RawResponse,
}

impl TransportResponse {
    /// Create a transport response
    pub fn new(body: ResponseBody, response: RawResponse) -> Self {
        Self { body, response }
    }
}

/// Transport trait for HTTP operations
///
/// The only capability the resource layer needs from its environment:
/// send a request, get back status, headers and body. A transport fails
/// only for transport-level problems; error statuses are returned as
/// ordinary responses and classified by the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the response
    async fn send(&self, request: Request) -> Result<TransportResponse>;

    /// Get the transport name/type
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: Request) -> Result<TransportResponse> {
        (**self).send(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Default HTTP transport implementation using reqwest
#[derive(Clone)]
pub struct HttpTransport {
    client: Arc<ReqwestClient>,
    timeout_config: TimeoutConfig,
    default_headers: Headers,
}

impl HttpTransport {
    /// Create a new HTTP transport
    ///
    /// The overall deadline comes from `timeout_config`; the connect
    /// timeout is whatever `client` was built with.
    pub fn new(client: Arc<ReqwestClient>, timeout_config: TimeoutConfig) -> Self {
        Self {
            client,
            timeout_config,
            default_headers: Headers::new(),
        }
    }

    /// Create a new transport builder
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    /// Get the underlying reqwest client
    pub fn client(&self) -> &ReqwestClient {
        &self.client
    }

    /// Get the timeout configuration
    pub fn timeout_config(&self) -> &TimeoutConfig {
        &self.timeout_config
    }

    /// Get the headers added to every request that does not set them
    pub fn default_headers(&self) -> &Headers {
        &self.default_headers
    }

    fn with_default_headers(&self, request: Request) -> Request {
        if self.default_headers.is_empty() {
            return request;
        }
        let mut headers = request.headers().clone();
        for (name, value) in self.default_headers.iter() {
            if !headers.keys().any(|key| KeyMatch::IgnoreCase.matches(key, name)) {
                headers.add(name, value.clone());
            }
        }
        request.with_headers(headers)
    }

    /// Send the request and read the whole body
    async fn exchange(&self, request: Request) -> Result<TransportResponse> {
        let response = self
            .client
            .execute(request.into_reqwest_request()?)
            .await
            .map_err(|err| self.network_error(err))?;

        let mut headers = Headers::with_capacity(response.headers().len());
        for (name, value) in response.headers() {
            headers.add(
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
        let raw = RawResponse::new(response.status(), response.url().as_str())
            .with_version(response.version())
            .with_headers(headers);

        let is_json = raw
            .content_type()
            .map_or(false, |ct| ct.to_ascii_lowercase().contains("json"));
        let text = response.text().await.map_err(|err| self.network_error(err))?;
        let body = if is_json {
            ResponseBody::parse_json(text)
        } else {
            ResponseBody::Text(text)
        };

        trace!(status = %raw.status(), headers = raw.headers().len(), "received response");
        Ok(TransportResponse::new(body, raw))
    }

    /// A timeout raised inside reqwest (connect timeout or a deadline set on
    /// a caller-supplied client) is still a timeout
    fn network_error(&self, err: reqwest::Error) -> Error {
        if !err.is_timeout() {
            return Error::Network(err);
        }
        let duration = if err.is_connect() {
            self.timeout_config.get_connect_timeout()
        } else {
            self.timeout_config.get_timeout()
        };
        match duration.or_else(|| self.timeout_config.get_timeout()) {
            Some(duration) => Error::timeout(duration),
            None => Error::Network(err),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        let timeout_config = TimeoutConfig::default();
        let mut builder = ReqwestClient::builder();
        if let Some(connect_timeout) = timeout_config.get_connect_timeout() {
            builder = builder.connect_timeout(connect_timeout);
        }
        let client = match builder.build() {
            Ok(client) => client,
            Err(err) => {
                warn!(error = %err, "falling back to a plain reqwest client");
                ReqwestClient::new()
            }
        };
        Self::new(Arc::new(client), timeout_config)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<TransportResponse> {
        let request = self.with_default_headers(request);
        trace!(
            method = %request.method(),
            uri = request.uri(),
            headers = request.headers().len(),
            "sending request"
        );

        match self.timeout_config.get_timeout() {
            Some(timeout) => tokio::time::timeout(timeout, self.exchange(request))
                .await
                .map_err(|_| Error::timeout(timeout))?,
            None => self.exchange(request).await,
        }
    }

    fn name(&self) -> &str {
        "reqwest"
    }
}

/// Builder for [`HttpTransport`]
///
/// ```rust
/// use restkit::transport::HttpTransport;
/// use std::time::Duration;
///
/// let transport = HttpTransport::builder()
///     .timeout(Duration::from_secs(5))
///     .user_agent("restkit/0.1")
///     .default_header("Accept", "application/json")
///     .build()
///     .unwrap();
/// assert_eq!(transport.default_headers().len(), 1);
/// ```
pub struct HttpTransportBuilder {
    reqwest_builder: ReqwestBuilder,
    timeout_config: TimeoutConfig,
    default_headers: Headers,
}

impl HttpTransportBuilder {
    /// Create a new transport builder
    pub fn new() -> Self {
        Self {
            reqwest_builder: ReqwestClient::builder(),
            timeout_config: TimeoutConfig::default(),
            default_headers: Headers::new(),
        }
    }

    /// Set the overall deadline for every request, body read included
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_config = self.timeout_config.timeout(timeout);
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_config = self.timeout_config.connect_timeout(timeout);
        self.reqwest_builder = self.reqwest_builder.connect_timeout(timeout);
        self
    }

    /// Replace the whole timeout configuration
    pub fn timeout_config(mut self, config: TimeoutConfig) -> Self {
        if let Some(timeout) = config.get_connect_timeout() {
            self.reqwest_builder = self.reqwest_builder.connect_timeout(timeout);
        }
        self.timeout_config = config;
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.reqwest_builder = self.reqwest_builder.user_agent(user_agent.to_string());
        self
    }

    /// Add a header sent with every request that does not set it itself
    pub fn default_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers.add(name, value.to_string());
        self
    }

    /// Build the transport
    pub fn build(self) -> Result<HttpTransport> {
        let client = self.reqwest_builder.build()?;
        Ok(HttpTransport {
            client: Arc::new(client),
            timeout_config: self.timeout_config,
            default_headers: self.default_headers,
        })
    }
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
