//! Opcode and status definitions
//!
//! The fixed tables of the memcached binary protocol: magic bytes,
//! request opcodes, and response status codes.

use std::fmt;

/// Magic byte of every request frame
pub const MAGIC_REQUEST: u8 = 0x80;

/// Magic byte of every response frame
pub const MAGIC_RESPONSE: u8 = 0x81;

/// Data type byte; the protocol defines only raw bytes
pub const DATA_TYPE_RAW: u8 = 0x00;

/// Request opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Get = 0x00,
    Set = 0x01,
    Add = 0x02,
    Replace = 0x03,
    Delete = 0x04,
    Increment = 0x05,
    Decrement = 0x06,
    Flush = 0x08,
    Noop = 0x0a,
    Append = 0x0e,
    Prepend = 0x0f,
    Touch = 0x1c,
    SaslListMechs = 0x20,
    SaslAuth = 0x21,
}

impl Opcode {
    /// Look up an opcode by its wire byte
    pub fn from_u8(byte: u8) -> Option<Opcode> {
        match byte {
            0x00 => Some(Opcode::Get),
            0x01 => Some(Opcode::Set),
            0x02 => Some(Opcode::Add),
            0x03 => Some(Opcode::Replace),
            0x04 => Some(Opcode::Delete),
            0x05 => Some(Opcode::Increment),
            0x06 => Some(Opcode::Decrement),
            0x08 => Some(Opcode::Flush),
            0x0a => Some(Opcode::Noop),
            0x0e => Some(Opcode::Append),
            0x0f => Some(Opcode::Prepend),
            0x1c => Some(Opcode::Touch),
            0x20 => Some(Opcode::SaslListMechs),
            0x21 => Some(Opcode::SaslAuth),
            _ => None,
        }
    }
}

/// Response status codes
///
/// The set is closed: decoding a code outside this table is a protocol
/// error, never a silently-passed-through value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Status {
    Success = 0x0000,
    KeyNotFound = 0x0001,
    KeyExists = 0x0002,
    ValueTooBig = 0x0003,
    InvalidArguments = 0x0004,
    NotStored = 0x0005,
    NotNumeric = 0x0006,
    AuthError = 0x0020,
    UnknownCommand = 0x0081,
    OutOfMemory = 0x0082,
    ServerError = 0x0084,
    Busy = 0x0085,
}

impl Status {
    /// Look up a status by its wire code
    pub fn from_code(code: u16) -> Option<Status> {
        match code {
            0x0000 => Some(Status::Success),
            0x0001 => Some(Status::KeyNotFound),
            0x0002 => Some(Status::KeyExists),
            0x0003 => Some(Status::ValueTooBig),
            0x0004 => Some(Status::InvalidArguments),
            0x0005 => Some(Status::NotStored),
            0x0006 => Some(Status::NotNumeric),
            0x0020 => Some(Status::AuthError),
            0x0081 => Some(Status::UnknownCommand),
            0x0082 => Some(Status::OutOfMemory),
            0x0084 => Some(Status::ServerError),
            0x0085 => Some(Status::Busy),
            _ => None,
        }
    }

    /// The numeric wire code
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// True for the success status
    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Success => "success",
            Status::KeyNotFound => "key not found",
            Status::KeyExists => "key exists",
            Status::ValueTooBig => "value too big",
            Status::InvalidArguments => "invalid arguments",
            Status::NotStored => "not stored",
            Status::NotNumeric => "non-numeric value",
            Status::AuthError => "authentication error",
            Status::UnknownCommand => "unknown command",
            Status::OutOfMemory => "out of memory",
            Status::ServerError => "internal server error",
            Status::Busy => "server busy",
        };
        f.write_str(name)
    }
}
