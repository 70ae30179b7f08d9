//! Operation Layer
//!
//! Builds one request frame per named operation and interprets response
//! statuses into typed results or failures. The [`Client`](crate::Client)
//! facade pairs these builders and interpreters around a connection.

use bytes::BufMut;

use crate::error::{BucketError, Result};
use crate::protocol::{Opcode, Request, Response};

/// Expiry sentinel telling the server not to create a missing counter
///
/// An increment/decrement carrying this expiry fails with key-not-found
/// instead of seeding the counter from its default.
pub const NO_CREATE_EXPIRY: u32 = 0xffff_ffff;

// =============================================================================
// Result Types
// =============================================================================

/// Result of a `get`: the item's flags, current CAS, and value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetResult {
    /// Client-opaque flags stored alongside the value
    pub flags: u32,

    /// CAS current as of this read
    pub cas: u64,

    /// Item value bytes
    pub value: Vec<u8>,
}

/// Result of an `incr`/`decr`: the post-operation counter and its CAS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterResult {
    /// Counter value after the operation
    pub value: u64,

    /// CAS assigned by the mutation
    pub cas: u64,
}

// =============================================================================
// Request Builders
// =============================================================================

/// Build a SET/ADD/REPLACE request
///
/// Extras: flags (4) + expiry (4). A non-zero `cas` makes the store
/// conditional on the item still carrying that CAS.
pub fn store_request(
    opcode: Opcode,
    key: &[u8],
    flags: u32,
    expiry: u32,
    value: &[u8],
    cas: u64,
) -> Request {
    let mut extras = Vec::with_capacity(8);
    extras.put_u32(flags);
    extras.put_u32(expiry);

    Request {
        opcode,
        key: key.to_vec(),
        extras,
        value: value.to_vec(),
        cas,
        opaque: 0,
    }
}

/// Build a GET request
pub fn get_request(key: &[u8]) -> Request {
    Request {
        key: key.to_vec(),
        ..Request::new(Opcode::Get)
    }
}

/// Build a DELETE request
pub fn delete_request(key: &[u8]) -> Request {
    Request {
        key: key.to_vec(),
        ..Request::new(Opcode::Delete)
    }
}

/// Build an APPEND/PREPEND request (no extras)
pub fn concat_request(opcode: Opcode, key: &[u8], bytes: &[u8]) -> Request {
    Request {
        opcode,
        key: key.to_vec(),
        value: bytes.to_vec(),
        ..Request::new(opcode)
    }
}

/// Build an INCREMENT/DECREMENT request
///
/// Extras: delta (8) + default (8) + expiry (4). When `default` is
/// `None` the expiry is set to [`NO_CREATE_EXPIRY`] so a missing key
/// yields key-not-found.
pub fn counter_request(
    opcode: Opcode,
    key: &[u8],
    delta: u64,
    default: Option<u64>,
    expiry: u32,
) -> Request {
    let (initial, expiry) = match default {
        Some(initial) => (initial, expiry),
        None => (0, NO_CREATE_EXPIRY),
    };

    let mut extras = Vec::with_capacity(20);
    extras.put_u64(delta);
    extras.put_u64(initial);
    extras.put_u32(expiry);

    Request {
        opcode,
        key: key.to_vec(),
        extras,
        ..Request::new(opcode)
    }
}

/// Build a TOUCH request (extras: new expiry)
pub fn touch_request(key: &[u8], expiry: u32) -> Request {
    let mut extras = Vec::with_capacity(4);
    extras.put_u32(expiry);

    Request {
        key: key.to_vec(),
        extras,
        ..Request::new(Opcode::Touch)
    }
}

/// Build a bucket-wide FLUSH request (extras: delay before flushing)
pub fn flush_request(delay: u32) -> Request {
    let mut extras = Vec::with_capacity(4);
    extras.put_u32(delay);

    Request {
        extras,
        ..Request::new(Opcode::Flush)
    }
}

/// Build a NOOP request (header only)
pub fn noop_request() -> Request {
    Request::new(Opcode::Noop)
}

/// Build a SASL mechanism listing request (header only)
pub fn sasl_list_mechs_request() -> Request {
    Request::new(Opcode::SaslListMechs)
}

/// Build a SASL PLAIN authentication request for a bucket credential
///
/// Key names the mechanism; the value is the PLAIN message
/// `\0<bucket>\0<credential>`.
pub fn sasl_auth_request(bucket: &str, credential: &str) -> Request {
    let mut value = Vec::with_capacity(bucket.len() + credential.len() + 2);
    value.put_u8(0);
    value.put_slice(bucket.as_bytes());
    value.put_u8(0);
    value.put_slice(credential.as_bytes());

    Request {
        key: b"PLAIN".to_vec(),
        value,
        ..Request::new(Opcode::SaslAuth)
    }
}

// =============================================================================
// Response Interpreters
// =============================================================================

/// Map a non-success status to a typed operation failure
pub fn expect_success(response: Response) -> Result<Response> {
    if response.status.is_success() {
        Ok(response)
    } else {
        Err(BucketError::operation(response.status))
    }
}

/// Interpret a GET response into (flags, CAS, value)
pub fn interpret_get(response: Response) -> Result<GetResult> {
    let response = expect_success(response)?;
    let flags = response.flags()?;

    Ok(GetResult {
        flags,
        cas: response.cas,
        value: response.value,
    })
}

/// Interpret a mutation response into the new CAS
pub fn interpret_store(response: Response) -> Result<u64> {
    let response = expect_success(response)?;
    Ok(response.cas)
}

/// Interpret an INCREMENT/DECREMENT response into the counter result
pub fn interpret_counter(response: Response) -> Result<CounterResult> {
    let response = expect_success(response)?;
    let value = response.counter_value()?;

    Ok(CounterResult {
        value,
        cas: response.cas,
    })
}
