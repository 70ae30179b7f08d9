//! # bucketkv
//!
//! A synchronous memcached-binary-protocol client for Couchbase-style
//! buckets:
//! - Basic CRUD (`add`, `set`, `get`, `delete`) with CAS tokens
//! - Atomic server-side counters (`incr`, `decr`)
//! - String mutation (`append`, `prepend`, `replace`)
//! - Expiry management (`touch`) and bucket-wide `flush`
//! - SASL PLAIN bucket authentication
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Client                                │
//! │        (one per bucket; no shared in-process state)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Operation Layer                             │
//! │       (request builders / status interpreters)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Connection                                │
//! │     (one TCP socket, blocking send-then-receive)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Wire Codec                                │
//! │        (24-byte header binary frames, big-endian)            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! No operation is retried automatically; transport and protocol errors
//! propagate to the caller, who decides whether to reconnect.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod ops;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use client::Client;
pub use config::ClientConfig;
pub use error::{BucketError, Result};
pub use ops::{CounterResult, GetResult};
pub use protocol::{Opcode, Status};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of bucketkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
