//! Configuration for bucketkv
//!
//! Centralized client configuration with sensible defaults.

use crate::error::{BucketError, Result};

/// Default data port when the URL carries none
pub const DEFAULT_PORT: u16 = 11211;

/// Configuration for one [`Client`](crate::Client) instance
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -------------------------------------------------------------------------
    // Server Configuration
    // -------------------------------------------------------------------------
    /// Server URL; `host:port`, `memcached://host:port`, and
    /// `http://host:port[/path]` forms are accepted
    pub url: String,

    /// Bucket (namespace) to operate on
    pub bucket: String,

    /// Bucket credential; empty for no-auth buckets
    pub credential: String,

    // -------------------------------------------------------------------------
    // Behavior Configuration
    // -------------------------------------------------------------------------
    /// Log every operation at debug level instead of trace
    pub verbose: bool,

    // -------------------------------------------------------------------------
    // Timeout Configuration
    // -------------------------------------------------------------------------
    /// TCP connect timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// Socket read timeout (milliseconds; 0 = no timeout)
    pub read_timeout_ms: u64,

    /// Socket write timeout (milliseconds; 0 = no timeout)
    pub write_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: format!("127.0.0.1:{}", DEFAULT_PORT),
            bucket: "default".to_string(),
            credential: String::new(),
            verbose: false,
            connect_timeout_ms: 5000,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
        }
    }
}

impl ClientConfig {
    /// Create a config for the given server URL and bucket
    pub fn new(url: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Resolve the configured URL to a `host:port` dial address
    ///
    /// No cluster discovery happens here; the URL must point at the node
    /// itself. A URL without an explicit port gets [`DEFAULT_PORT`].
    pub fn server_addr(&self) -> Result<String> {
        let rest = self
            .url
            .strip_prefix("memcached://")
            .or_else(|| self.url.strip_prefix("http://"))
            .or_else(|| self.url.strip_prefix("https://"))
            .unwrap_or(&self.url);

        // Drop any path component after the authority
        let authority = rest.split('/').next().unwrap_or("");
        if authority.is_empty() {
            return Err(BucketError::Config(format!(
                "URL has no host: {:?}",
                self.url
            )));
        }

        match authority.rsplit_once(':') {
            Some((host, port)) => {
                if host.is_empty() {
                    return Err(BucketError::Config(format!(
                        "URL has no host: {:?}",
                        self.url
                    )));
                }
                port.parse::<u16>().map_err(|_| {
                    BucketError::Config(format!("Invalid port {:?} in URL {:?}", port, self.url))
                })?;
                Ok(authority.to_string())
            }
            None => Ok(format!("{}:{}", authority, DEFAULT_PORT)),
        }
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the server URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    /// Set the bucket name
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.config.bucket = bucket.into();
        self
    }

    /// Set the bucket credential (empty disables authentication)
    pub fn credential(mut self, credential: impl Into<String>) -> Self {
        self.config.credential = credential.into();
        self
    }

    /// Enable verbose per-operation logging
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Set the TCP connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the socket read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the socket write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
