//! restkit - REST resource access for Rust
//!
//! A thin layer over an HTTP transport. It turns a base URI plus path,
//! query, header and body parameters into a request, sends it through a
//! pluggable [`Transport`], and classifies the reply into either a
//! [`ResourceResult`] or a typed [`ResourceError`].
//!
//! ## Features
//!
//! - **Ordered multi-valued dictionaries** ([`MultiDict`]) for headers and
//!   query parameters, with repeated keys kept in order
//! - **URI assembly** with encoded path segments and repeated query keys
//! - **Typed failures**: `NotFound`, `Unauthorized`, `RequestFailed`
//! - **Pluggable transports**, reqwest by default
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use restkit::{Headers, QueryParams, Resource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let res = Resource::new("http://friendpaste.com");
//!
//!     let mut headers = Headers::new();
//!     headers.add("Accept", "application/json".to_string());
//!
//!     let page = res.get(Some("5rOqE9XTz7lccLgZoQS4IP"), Some(&headers), &QueryParams::new()).await?;
//!     println!("Status: {}", page.status_code());
//!     println!("Body: {}", page);
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod multidict;
pub mod request;
pub mod response;
pub mod timeout;
pub mod transport;
pub mod uri;

// Re-export main types for convenience
pub use client::{Resource, RestClient};
pub use error::{Error, ErrorMessage, ResourceError, Result};
pub use multidict::{KeyMatch, MixedValue, MultiDict, MultiDictView};
pub use request::{Headers, Request, RequestBody};
pub use response::{classify, RawResponse, ResourceResult, ResponseBody};
pub use timeout::TimeoutConfig;
pub use transport::{HttpTransport, HttpTransportBuilder, Transport, TransportResponse};
pub use uri::{make_uri, ParamValue, QueryParams};

// Re-export common HTTP types
pub use http::{Method, StatusCode};

// Re-export JSON types
pub use serde_json::{Map as JsonMap, Value as JsonValue};

// Re-export common traits
pub use async_trait::async_trait;
