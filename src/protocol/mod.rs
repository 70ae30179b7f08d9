//! Protocol Module
//!
//! The memcached binary wire protocol: frame types, opcode and status
//! tables, and the codec that turns frames into bytes and back.
//!
//! ## Frame Format
//! ```text
//! ┌────────┬────────┬──────────┬──────────┬──────┬─────────┐
//! │Magic(1)│ Op (1) │KeyLen(2) │ExtLen(1) │DT(1) │VB/St(2) │
//! ├────────┴────────┴──────────┴──────────┴──────┴─────────┤
//! │ Total body length (4) │ Opaque (4) │       CAS (8)     │
//! ├─────────────────────────────────────────────────────────┤
//! │               Extras + Key + Value (body)               │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Opcodes (requests, magic 0x80)
//! - 0x00 GET · 0x01 SET · 0x02 ADD · 0x03 REPLACE · 0x04 DELETE
//! - 0x05 INCREMENT · 0x06 DECREMENT · 0x08 FLUSH · 0x0a NOOP
//! - 0x0e APPEND · 0x0f PREPEND · 0x1c TOUCH · 0x20/0x21 SASL
//!
//! ### Status codes (responses, magic 0x81)
//! - 0x0000 SUCCESS · 0x0001 KEY_NOT_FOUND · 0x0002 KEY_EXISTS
//! - 0x0003 VALUE_TOO_BIG · 0x0004 INVALID_ARGUMENTS · 0x0005 NOT_STORED
//! - 0x0006 NOT_NUMERIC · 0x0020 AUTH_ERROR · 0x0081+ server errors

mod opcode;
mod frame;
mod codec;

pub use opcode::{Opcode, Status, DATA_TYPE_RAW, MAGIC_REQUEST, MAGIC_RESPONSE};
pub use frame::{Request, Response};
pub use codec::{
    decode_request, decode_response, encode_request, encode_response,
    read_request, read_response, write_request, write_response,
    HEADER_SIZE, MAX_BODY_SIZE,
};
