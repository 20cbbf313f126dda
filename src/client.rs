use std::fmt;
use std::sync::Arc;

use http::Method;
use tracing::debug;

use crate::error::Result;
use crate::request::{Headers, Request, RequestBody};
use crate::response::{classify, ResourceResult};
use crate::transport::{HttpTransport, Transport};
use crate::uri::{join_path, make_uri, QueryParams};

/// Stateless REST client
///
/// Builds the target URI, hands the request to its transport, and
/// classifies the reply. Error statuses come back as
/// [`Error::Resource`](crate::Error::Resource); nothing is retried.
///
/// # Examples
///
/// ```rust,no_run
/// use restkit::{QueryParams, RestClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = RestClient::new();
///     let page = client
///         .get("http://friendpaste.com", Some("5rOqE9XTz7lccLgZoQS4IP"), None, &QueryParams::new())
///         .await?;
///     println!("{} ({})", page, page.status_code());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct RestClient {
    transport: Arc<dyn Transport>,
}

impl RestClient {
    /// Create a new client on the default reqwest transport
    pub fn new() -> Self {
        Self::with_transport(HttpTransport::default())
    }

    /// Create a new client on the given transport
    pub fn with_transport<T>(transport: T) -> Self
    where
        T: Transport + 'static,
    {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Create a new client sharing an existing transport
    pub fn from_shared(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Get the transport
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// HTTP GET
    pub async fn get(
        &self,
        uri: &str,
        path: Option<&str>,
        headers: Option<&Headers>,
        params: &QueryParams,
    ) -> Result<ResourceResult> {
        self.request(Method::GET, uri, path, None, headers, params).await
    }

    /// HTTP HEAD
    pub async fn head(
        &self,
        uri: &str,
        path: Option<&str>,
        headers: Option<&Headers>,
        params: &QueryParams,
    ) -> Result<ResourceResult> {
        self.request(Method::HEAD, uri, path, None, headers, params).await
    }

    /// HTTP DELETE
    pub async fn delete(
        &self,
        uri: &str,
        path: Option<&str>,
        headers: Option<&Headers>,
        params: &QueryParams,
    ) -> Result<ResourceResult> {
        self.request(Method::DELETE, uri, path, None, headers, params).await
    }

    /// HTTP POST
    pub async fn post(
        &self,
        uri: &str,
        path: Option<&str>,
        body: Option<RequestBody>,
        headers: Option<&Headers>,
        params: &QueryParams,
    ) -> Result<ResourceResult> {
        self.request(Method::POST, uri, path, body, headers, params).await
    }

    /// HTTP PUT
    pub async fn put(
        &self,
        uri: &str,
        path: Option<&str>,
        body: Option<RequestBody>,
        headers: Option<&Headers>,
        params: &QueryParams,
    ) -> Result<ResourceResult> {
        self.request(Method::PUT, uri, path, body, headers, params).await
    }

    /// Perform one HTTP call
    ///
    /// `path` is appended to `uri` as one encoded segment and `params`
    /// become the query string. Statuses below 400 return the body as a
    /// [`ResourceResult`]; anything else is a typed error.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        path: Option<&str>,
        body: Option<RequestBody>,
        headers: Option<&Headers>,
        params: &QueryParams,
    ) -> Result<ResourceResult> {
        let target = make_uri(uri, [path], params);
        debug!(%method, uri = %target, transport = self.transport.name(), "dispatching request");

        let request = Request::new(method, target)
            .with_headers(headers.cloned().unwrap_or_default())
            .with_body(body);
        let reply = self.transport.send(request).await?;

        let status = reply.response.status();
        debug!(%status, "classifying response");
        Ok(classify(status, reply.body, reply.response)?)
    }
}

impl Default for RestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("transport", &self.transport.name())
            .finish()
    }
}

/// A RESTful resource: a base URI bound to a client
///
/// ```rust,no_run
/// use restkit::{QueryParams, Resource};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let res = Resource::new("http://friendpaste.com");
///     let paste = res.child("5rOqE9XTz7lccLgZoQS4IP");
///     let body = paste.get(None, None, &QueryParams::new()).await?;
///     println!("{}", body);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Resource {
    uri: String,
    client: RestClient,
}

impl Resource {
    /// Create a resource on the default transport
    pub fn new(uri: impl Into<String>) -> Self {
        Self::with_client(uri, RestClient::new())
    }

    /// Create a resource on the given client
    pub fn with_client(uri: impl Into<String>, client: RestClient) -> Self {
        Self {
            uri: uri.into(),
            client,
        }
    }

    /// Get the base URI
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Get the client
    pub fn client(&self) -> &RestClient {
        &self.client
    }

    /// Derive a new resource one path segment below this one
    ///
    /// The new resource shares the transport; `self` is left unchanged.
    pub fn child(&self, path: &str) -> Resource {
        Resource {
            uri: join_path(&self.uri, Some(path)),
            client: self.client.clone(),
        }
    }

    /// Rebase this resource one path segment further down
    pub fn update_uri(&mut self, path: &str) {
        self.uri = join_path(&self.uri, Some(path));
    }

    /// HTTP GET
    pub async fn get(
        &self,
        path: Option<&str>,
        headers: Option<&Headers>,
        params: &QueryParams,
    ) -> Result<ResourceResult> {
        self.request(Method::GET, path, None, headers, params).await
    }

    /// HTTP HEAD
    pub async fn head(
        &self,
        path: Option<&str>,
        headers: Option<&Headers>,
        params: &QueryParams,
    ) -> Result<ResourceResult> {
        self.request(Method::HEAD, path, None, headers, params).await
    }

    /// HTTP DELETE
    pub async fn delete(
        &self,
        path: Option<&str>,
        headers: Option<&Headers>,
        params: &QueryParams,
    ) -> Result<ResourceResult> {
        self.request(Method::DELETE, path, None, headers, params).await
    }

    /// HTTP POST
    pub async fn post(
        &self,
        path: Option<&str>,
        payload: Option<RequestBody>,
        headers: Option<&Headers>,
        params: &QueryParams,
    ) -> Result<ResourceResult> {
        self.request(Method::POST, path, payload, headers, params).await
    }

    /// HTTP PUT
    pub async fn put(
        &self,
        path: Option<&str>,
        payload: Option<RequestBody>,
        headers: Option<&Headers>,
        params: &QueryParams,
    ) -> Result<ResourceResult> {
        self.request(Method::PUT, path, payload, headers, params).await
    }

    /// Perform one HTTP call against this resource
    pub async fn request(
        &self,
        method: Method,
        path: Option<&str>,
        payload: Option<RequestBody>,
        headers: Option<&Headers>,
        params: &QueryParams,
    ) -> Result<ResourceResult> {
        self.client
            .request(method, &self.uri, path, payload, headers, params)
            .await
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Resource {}>", self.uri)
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
