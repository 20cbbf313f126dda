use std::time::Duration;

/// Timeout settings applied by [`HttpTransport`](crate::transport::HttpTransport)
///
/// The resource layer itself never times out; these only bound the
/// network call made by the default transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Overall request timeout
    pub timeout: Option<Duration>,
    /// Connection establishment timeout
    pub connect_timeout: Option<Duration>,
}

impl TimeoutConfig {
    /// Create a new timeout configuration with an overall timeout only
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            connect_timeout: None,
        }
    }

    /// A configuration that never times out
    pub fn none() -> Self {
        Self {
            timeout: None,
            connect_timeout: None,
        }
    }

    /// Set the overall request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Get the overall request timeout
    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Get the connection timeout
    pub fn get_connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    /// Merge with another timeout configuration; its set values win
    pub fn merge(mut self, other: &TimeoutConfig) -> Self {
        if other.timeout.is_some() {
            self.timeout = other.timeout;
        }
        if other.connect_timeout.is_some() {
            self.connect_timeout = other.connect_timeout;
        }
        self
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
        }
    }
}
