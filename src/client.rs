//! Client Facade
//!
//! The public-facing client, bound to one (url, bucket, credential)
//! configuration. Owns a single connection and exposes every operation
//! of the operation layer.

use parking_lot::Mutex;

use crate::config::ClientConfig;
use crate::error::{BucketError, Result};
use crate::network::Connection;
use crate::ops;
use crate::ops::{CounterResult, GetResult};
use crate::protocol::{Opcode, Request, Response};

/// A synchronous client for one bucket on one server node
///
/// ## Concurrency Model
///
/// The connection is owned exclusively by this client and guarded by a
/// mutex, so exactly one request is in flight at a time. Independent
/// `Client` instances may target the same bucket concurrently; the
/// server arbitrates conflicting writes via CAS tokens and atomic
/// counters. No item state is cached client-side: every `get` reflects
/// server state at call time.
#[derive(Debug)]
pub struct Client {
    /// Client configuration
    config: ClientConfig,

    /// The single connection; `None` once `done` has been called
    conn: Mutex<Option<Connection>>,
}

impl Client {
    /// Connect to the configured server and authenticate if needed
    ///
    /// A non-empty credential triggers SASL PLAIN authentication against
    /// the configured bucket before the client is handed out.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut conn = Connection::connect(&config)?;

        if !config.credential.is_empty() {
            let mechs = ops::expect_success(conn.send(ops::sasl_list_mechs_request())?)?;
            if !String::from_utf8_lossy(&mechs.value).contains("PLAIN") {
                return Err(BucketError::Protocol(format!(
                    "Server does not offer SASL PLAIN (mechanisms: {:?})",
                    String::from_utf8_lossy(&mechs.value)
                )));
            }

            let request = ops::sasl_auth_request(&config.bucket, &config.credential);
            let response = conn.send(request)?;
            ops::expect_success(response)?;
            tracing::debug!("Authenticated against bucket {}", config.bucket);
        }

        Ok(Self {
            config,
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Connect with an explicit (url, bucket, credential, verbose) tuple
    pub fn connect(
        url: impl Into<String>,
        bucket: impl Into<String>,
        credential: impl Into<String>,
        verbose: bool,
    ) -> Result<Self> {
        let config = ClientConfig::builder()
            .url(url)
            .bucket(bucket)
            .credential(credential)
            .verbose(verbose)
            .build();
        Self::new(config)
    }

    // -------------------------------------------------------------------------
    // CRUD Operations
    // -------------------------------------------------------------------------

    /// Store a value only if the key does not exist yet
    ///
    /// Returns the new CAS; fails with KeyExists when the key is present.
    pub fn add(&self, key: &str, flags: u32, expiry: u32, value: &[u8]) -> Result<u64> {
        self.log_op("add", key);
        let request = ops::store_request(Opcode::Add, key.as_bytes(), flags, expiry, value, 0);
        ops::interpret_store(self.dispatch(request)?)
    }

    /// Store a value unconditionally, returning the new CAS
    pub fn set(&self, key: &str, flags: u32, expiry: u32, value: &[u8]) -> Result<u64> {
        self.log_op("set", key);
        let request = ops::store_request(Opcode::Set, key.as_bytes(), flags, expiry, value, 0);
        ops::interpret_store(self.dispatch(request)?)
    }

    /// Store a value only if the item still carries the given CAS
    ///
    /// A stale CAS is rejected with KeyExists.
    pub fn set_with_cas(
        &self,
        key: &str,
        flags: u32,
        expiry: u32,
        value: &[u8],
        cas: u64,
    ) -> Result<u64> {
        self.log_op("set(cas)", key);
        let request = ops::store_request(Opcode::Set, key.as_bytes(), flags, expiry, value, cas);
        ops::interpret_store(self.dispatch(request)?)
    }

    /// Store a value only if the key already exists
    ///
    /// Fails with NotStored when the key is absent.
    pub fn replace(&self, key: &str, flags: u32, expiry: u32, value: &[u8]) -> Result<u64> {
        self.log_op("replace", key);
        let request = ops::store_request(Opcode::Replace, key.as_bytes(), flags, expiry, value, 0);
        ops::interpret_store(self.dispatch(request)?)
    }

    /// Fetch an item's (flags, CAS, value)
    ///
    /// Fails with KeyNotFound when the key is absent.
    pub fn get(&self, key: &str) -> Result<GetResult> {
        self.log_op("get", key);
        let request = ops::get_request(key.as_bytes());
        ops::interpret_get(self.dispatch(request)?)
    }

    /// Delete an item; fails with KeyNotFound when absent
    pub fn delete(&self, key: &str) -> Result<()> {
        self.log_op("delete", key);
        let request = ops::delete_request(key.as_bytes());
        ops::expect_success(self.dispatch(request)?)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // String Mutation Operations
    // -------------------------------------------------------------------------

    /// Append bytes to an existing value, returning the new CAS
    ///
    /// Fails with NotStored when the key is absent.
    pub fn append(&self, key: &str, bytes: &[u8]) -> Result<u64> {
        self.log_op("append", key);
        let request = ops::concat_request(Opcode::Append, key.as_bytes(), bytes);
        ops::interpret_store(self.dispatch(request)?)
    }

    /// Prepend bytes to an existing value, returning the new CAS
    ///
    /// Fails with NotStored when the key is absent.
    pub fn prepend(&self, key: &str, bytes: &[u8]) -> Result<u64> {
        self.log_op("prepend", key);
        let request = ops::concat_request(Opcode::Prepend, key.as_bytes(), bytes);
        ops::interpret_store(self.dispatch(request)?)
    }

    // -------------------------------------------------------------------------
    // Counter Operations
    // -------------------------------------------------------------------------

    /// Atomically increment a counter by `delta`
    ///
    /// A missing key is created at 0. The stored value must be the
    /// decimal text of a non-negative 64-bit integer; anything else
    /// fails with NotNumeric. The read-modify-write happens entirely
    /// server-side, so concurrent increments from independent clients
    /// never lose updates.
    pub fn incr(&self, key: &str, delta: u64) -> Result<CounterResult> {
        self.incr_with(key, delta, Some(0), 0)
    }

    /// Increment with an explicit default and expiry
    ///
    /// With `default` of `None`, a missing key fails with KeyNotFound
    /// instead of being created.
    pub fn incr_with(
        &self,
        key: &str,
        delta: u64,
        default: Option<u64>,
        expiry: u32,
    ) -> Result<CounterResult> {
        self.log_op("incr", key);
        let request =
            ops::counter_request(Opcode::Increment, key.as_bytes(), delta, default, expiry);
        ops::interpret_counter(self.dispatch(request)?)
    }

    /// Atomically decrement a counter by `delta`, flooring at zero
    pub fn decr(&self, key: &str, delta: u64) -> Result<CounterResult> {
        self.decr_with(key, delta, Some(0), 0)
    }

    /// Decrement with an explicit default and expiry
    pub fn decr_with(
        &self,
        key: &str,
        delta: u64,
        default: Option<u64>,
        expiry: u32,
    ) -> Result<CounterResult> {
        self.log_op("decr", key);
        let request =
            ops::counter_request(Opcode::Decrement, key.as_bytes(), delta, default, expiry);
        ops::interpret_counter(self.dispatch(request)?)
    }

    // -------------------------------------------------------------------------
    // Expiry and Maintenance Operations
    // -------------------------------------------------------------------------

    /// Reset an item's expiry; fails with KeyNotFound when absent
    pub fn touch(&self, key: &str, expiry: u32) -> Result<()> {
        self.log_op("touch", key);
        let request = ops::touch_request(key.as_bytes(), expiry);
        ops::expect_success(self.dispatch(request)?)?;
        Ok(())
    }

    /// Delete every item in the bucket
    pub fn flush(&self) -> Result<()> {
        self.log_op("flush", "");
        let request = ops::flush_request(0);
        ops::expect_success(self.dispatch(request)?)?;
        Ok(())
    }

    /// Header-only liveness probe
    pub fn noop(&self) -> Result<()> {
        self.log_op("noop", "");
        let request = ops::noop_request();
        ops::expect_success(self.dispatch(request)?)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Release the underlying connection
    ///
    /// Safe to call more than once; later calls are no-ops. Any
    /// operation after `done` fails with a connection error.
    pub fn done(&self) {
        if let Some(conn) = self.conn.lock().take() {
            conn.close();
        }
    }

    /// Send one request over the connection and return the raw response
    fn dispatch(&self, request: Request) -> Result<Response> {
        let mut guard = self.conn.lock();
        let conn = guard
            .as_mut()
            .ok_or_else(|| BucketError::Connection("Client is closed".to_string()))?;
        conn.send(request)
    }

    /// Per-operation logging, promoted to debug level in verbose mode
    fn log_op(&self, name: &str, key: &str) {
        if self.config.verbose {
            tracing::debug!("{} {:?} on bucket {}", name, key, self.config.bucket);
        } else {
            tracing::trace!("{} {:?} on bucket {}", name, key, self.config.bucket);
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.done();
    }
}
