//! Network Module
//!
//! TCP connection handling for the client.
//!
//! ## Architecture
//! - One TCP socket per connection, owned exclusively
//! - Strict send-then-receive pairing (no pipelining)
//! - Opaque correlation ids verified on every response

mod connection;

pub use connection::Connection;
