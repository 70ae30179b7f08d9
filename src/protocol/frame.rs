//! Frame definitions
//!
//! In-memory representations of one request and one response frame.
//! The codec turns these into wire bytes and back.

use crate::error::{BucketError, Result};
use super::{Opcode, Status};

/// A request frame, before encoding
///
/// `extras`, `key`, and `value` are concatenated into the frame body in
/// that order; the header length fields are derived from them at encode
/// time and never stored here.
#[derive(Debug, Clone)]
pub struct Request {
    /// Operation to perform
    pub opcode: Opcode,

    /// Item key; empty for header-only operations
    pub key: Vec<u8>,

    /// Operation-specific extras block (flags/expiry/delta)
    pub extras: Vec<u8>,

    /// Item value; empty when the operation carries none
    pub value: Vec<u8>,

    /// CAS precondition; 0 means unconditional
    pub cas: u64,

    /// Correlation id, echoed back by the server
    pub opaque: u32,
}

impl Request {
    /// Create a header-only request for the given opcode
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            key: Vec::new(),
            extras: Vec::new(),
            value: Vec::new(),
            cas: 0,
            opaque: 0,
        }
    }

    /// Total body length (extras + key + value) as encoded on the wire
    pub fn body_len(&self) -> usize {
        self.extras.len() + self.key.len() + self.value.len()
    }
}

/// A decoded response frame
#[derive(Debug, Clone)]
pub struct Response {
    /// Opcode of the request this answers
    pub opcode: Opcode,

    /// Server-reported status
    pub status: Status,

    /// Correlation id copied from the request
    pub opaque: u32,

    /// CAS of the item after the operation (0 when not applicable)
    pub cas: u64,

    /// Extras block (flags for GET; empty otherwise)
    pub extras: Vec<u8>,

    /// Key, present only for key-returning variants
    pub key: Vec<u8>,

    /// Value body (item bytes, counter value, or error text)
    pub value: Vec<u8>,
}

impl Response {
    /// Item flags from a GET response's 4-byte extras block
    pub fn flags(&self) -> Result<u32> {
        if self.extras.len() < 4 {
            return Err(BucketError::Protocol(format!(
                "Expected 4 extras bytes carrying flags, got {}",
                self.extras.len()
            )));
        }
        Ok(u32::from_be_bytes([
            self.extras[0],
            self.extras[1],
            self.extras[2],
            self.extras[3],
        ]))
    }

    /// Counter value from an INCREMENT/DECREMENT response's 8-byte body
    pub fn counter_value(&self) -> Result<u64> {
        let body: [u8; 8] = self.value.as_slice().try_into().map_err(|_| {
            BucketError::Protocol(format!(
                "Expected 8-byte counter body, got {} bytes",
                self.value.len()
            ))
        })?;
        Ok(u64::from_be_bytes(body))
    }
}
