//! Protocol codec
//!
//! Encoding and decoding functions for the memcached binary wire protocol.
//!
//! ## Wire Format
//!
//! Every frame is a 24-byte fixed header followed by a variable body
//! (extras, then key, then value):
//!
//! ```text
//! ┌────────┬────────┬──────────┬──────────┬──────┬─────────┐
//! │Magic(1)│ Op (1) │KeyLen(2) │ExtLen(1) │DT(1) │VB/St(2) │
//! ├────────┴────────┴──────────┴──────────┴──────┴─────────┤
//! │                    Total body length (4)                │
//! ├─────────────────────────────────────────────────────────┤
//! │                        Opaque (4)                       │
//! ├─────────────────────────────────────────────────────────┤
//! │                         CAS (8)                         │
//! ├─────────────────────────────────────────────────────────┤
//! │               Extras + Key + Value (body)               │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Requests carry magic 0x80 and a vbucket id in the VB/St slot;
//! responses carry magic 0x81 and the status code there. All integers
//! are big-endian.

use std::io::{Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{BucketError, Result};
use super::opcode::{DATA_TYPE_RAW, MAGIC_REQUEST, MAGIC_RESPONSE};
use super::{Opcode, Request, Response, Status};

/// Fixed header size of every frame
pub const HEADER_SIZE: usize = 24;

/// Maximum body size accepted by the codec (16 MB)
pub const MAX_BODY_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Request Encoding
// =============================================================================

/// Encode a request frame to wire bytes
///
/// Fails when a length field cannot represent the payload (key longer
/// than u16, extras longer than u8, or body above [`MAX_BODY_SIZE`]).
pub fn encode_request(request: &Request) -> Result<Vec<u8>> {
    if request.key.len() > u16::MAX as usize {
        return Err(BucketError::Protocol(format!(
            "Key too long for frame: {} bytes (max {})",
            request.key.len(),
            u16::MAX
        )));
    }
    if request.extras.len() > u8::MAX as usize {
        return Err(BucketError::Protocol(format!(
            "Extras too long for frame: {} bytes (max {})",
            request.extras.len(),
            u8::MAX
        )));
    }

    let body_len = request.body_len();
    if body_len > MAX_BODY_SIZE as usize {
        return Err(BucketError::Protocol(format!(
            "Body too large: {} bytes (max {})",
            body_len, MAX_BODY_SIZE
        )));
    }

    let mut frame = BytesMut::with_capacity(HEADER_SIZE + body_len);
    frame.put_u8(MAGIC_REQUEST);
    frame.put_u8(request.opcode as u8);
    frame.put_u16(request.key.len() as u16);
    frame.put_u8(request.extras.len() as u8);
    frame.put_u8(DATA_TYPE_RAW);
    frame.put_u16(0); // vbucket id; single-node scope
    frame.put_u32(body_len as u32);
    frame.put_u32(request.opaque);
    frame.put_u64(request.cas);
    frame.put_slice(&request.extras);
    frame.put_slice(&request.key);
    frame.put_slice(&request.value);

    Ok(frame.to_vec())
}

// =============================================================================
// Request Decoding
// =============================================================================

/// Decode a request frame from a byte buffer
///
/// The server-side mirror of [`encode_request`]; used by test fixtures
/// and anything speaking the protocol from the other end.
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    if bytes.len() < HEADER_SIZE {
        return Err(BucketError::Protocol(format!(
            "Incomplete request header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = [0u8; HEADER_SIZE];
    header.copy_from_slice(&bytes[..HEADER_SIZE]);
    let parsed = parse_request_header(&header)?;

    let total_len = HEADER_SIZE + parsed.body_len;
    if bytes.len() < total_len {
        return Err(BucketError::Protocol(format!(
            "Incomplete request body: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    Ok(assemble_request(parsed, &bytes[HEADER_SIZE..total_len]))
}

/// Parsed request header fields, before the body is read
#[derive(Debug, Clone, Copy)]
struct RequestHeader {
    opcode: Opcode,
    key_len: usize,
    extras_len: usize,
    body_len: usize,
    opaque: u32,
    cas: u64,
}

/// Parse and validate a 24-byte request header
fn parse_request_header(header: &[u8; HEADER_SIZE]) -> Result<RequestHeader> {
    let mut buf = &header[..];

    let magic = buf.get_u8();
    if magic != MAGIC_REQUEST {
        return Err(BucketError::Protocol(format!(
            "Bad request magic: 0x{:02x} (expected 0x{:02x})",
            magic, MAGIC_REQUEST
        )));
    }

    let opcode_byte = buf.get_u8();
    let opcode = Opcode::from_u8(opcode_byte).ok_or_else(|| {
        BucketError::Protocol(format!("Unknown opcode in request: 0x{:02x}", opcode_byte))
    })?;

    let key_len = buf.get_u16() as usize;
    let extras_len = buf.get_u8() as usize;

    let data_type = buf.get_u8();
    if data_type != DATA_TYPE_RAW {
        return Err(BucketError::Protocol(format!(
            "Unknown data type in request: 0x{:02x}",
            data_type
        )));
    }

    let _vbucket = buf.get_u16();

    let body_len = buf.get_u32() as usize;
    if body_len > MAX_BODY_SIZE as usize {
        return Err(BucketError::Protocol(format!(
            "Request body too large: {} bytes (max {})",
            body_len, MAX_BODY_SIZE
        )));
    }
    if extras_len + key_len > body_len {
        return Err(BucketError::Protocol(format!(
            "Inconsistent header: extras {} + key {} exceed body {}",
            extras_len, key_len, body_len
        )));
    }

    let opaque = buf.get_u32();
    let cas = buf.get_u64();

    Ok(RequestHeader {
        opcode,
        key_len,
        extras_len,
        body_len,
        opaque,
        cas,
    })
}

/// Assemble a request from a validated header and its body bytes
fn assemble_request(header: RequestHeader, body: &[u8]) -> Request {
    let extras_end = header.extras_len;
    let key_end = extras_end + header.key_len;

    Request {
        opcode: header.opcode,
        key: body[extras_end..key_end].to_vec(),
        extras: body[..extras_end].to_vec(),
        value: body[key_end..].to_vec(),
        cas: header.cas,
        opaque: header.opaque,
    }
}

// =============================================================================
// Response Encoding
// =============================================================================

/// Encode a response frame to wire bytes
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    if response.key.len() > u16::MAX as usize {
        return Err(BucketError::Protocol(format!(
            "Key too long for frame: {} bytes (max {})",
            response.key.len(),
            u16::MAX
        )));
    }
    if response.extras.len() > u8::MAX as usize {
        return Err(BucketError::Protocol(format!(
            "Extras too long for frame: {} bytes (max {})",
            response.extras.len(),
            u8::MAX
        )));
    }

    let body_len = response.extras.len() + response.key.len() + response.value.len();
    if body_len > MAX_BODY_SIZE as usize {
        return Err(BucketError::Protocol(format!(
            "Body too large: {} bytes (max {})",
            body_len, MAX_BODY_SIZE
        )));
    }

    let mut frame = BytesMut::with_capacity(HEADER_SIZE + body_len);
    frame.put_u8(MAGIC_RESPONSE);
    frame.put_u8(response.opcode as u8);
    frame.put_u16(response.key.len() as u16);
    frame.put_u8(response.extras.len() as u8);
    frame.put_u8(DATA_TYPE_RAW);
    frame.put_u16(response.status.code());
    frame.put_u32(body_len as u32);
    frame.put_u32(response.opaque);
    frame.put_u64(response.cas);
    frame.put_slice(&response.extras);
    frame.put_slice(&response.key);
    frame.put_slice(&response.value);

    Ok(frame.to_vec())
}

// =============================================================================
// Response Decoding
// =============================================================================

/// Parsed response header fields, before the body is read
#[derive(Debug, Clone, Copy)]
struct ResponseHeader {
    opcode: Opcode,
    key_len: usize,
    extras_len: usize,
    status: Status,
    body_len: usize,
    opaque: u32,
    cas: u64,
}

/// Parse and validate a 24-byte response header
fn parse_response_header(header: &[u8; HEADER_SIZE]) -> Result<ResponseHeader> {
    let mut buf = &header[..];

    let magic = buf.get_u8();
    if magic != MAGIC_RESPONSE {
        return Err(BucketError::Protocol(format!(
            "Bad response magic: 0x{:02x} (expected 0x{:02x})",
            magic, MAGIC_RESPONSE
        )));
    }

    let opcode_byte = buf.get_u8();
    let opcode = Opcode::from_u8(opcode_byte).ok_or_else(|| {
        BucketError::Protocol(format!("Unknown opcode in response: 0x{:02x}", opcode_byte))
    })?;

    let key_len = buf.get_u16() as usize;
    let extras_len = buf.get_u8() as usize;

    let data_type = buf.get_u8();
    if data_type != DATA_TYPE_RAW {
        return Err(BucketError::Protocol(format!(
            "Unknown data type in response: 0x{:02x}",
            data_type
        )));
    }

    let status_code = buf.get_u16();
    let status = Status::from_code(status_code).ok_or_else(|| {
        BucketError::Protocol(format!("Unknown status code: 0x{:04x}", status_code))
    })?;

    let body_len = buf.get_u32() as usize;
    if body_len > MAX_BODY_SIZE as usize {
        return Err(BucketError::Protocol(format!(
            "Response body too large: {} bytes (max {})",
            body_len, MAX_BODY_SIZE
        )));
    }
    if extras_len + key_len > body_len {
        return Err(BucketError::Protocol(format!(
            "Inconsistent header: extras {} + key {} exceed body {}",
            extras_len, key_len, body_len
        )));
    }

    let opaque = buf.get_u32();
    let cas = buf.get_u64();

    Ok(ResponseHeader {
        opcode,
        key_len,
        extras_len,
        status,
        body_len,
        opaque,
        cas,
    })
}

/// Assemble a response from a validated header and its body bytes
fn assemble_response(header: ResponseHeader, body: &[u8]) -> Response {
    let extras_end = header.extras_len;
    let key_end = extras_end + header.key_len;

    Response {
        opcode: header.opcode,
        status: header.status,
        opaque: header.opaque,
        cas: header.cas,
        extras: body[..extras_end].to_vec(),
        key: body[extras_end..key_end].to_vec(),
        value: body[key_end..].to_vec(),
    }
}

/// Decode a response frame from a byte buffer
///
/// The buffer must hold at least one complete frame; a truncated buffer
/// is a protocol error.
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    if bytes.len() < HEADER_SIZE {
        return Err(BucketError::Protocol(format!(
            "Incomplete response header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = [0u8; HEADER_SIZE];
    header.copy_from_slice(&bytes[..HEADER_SIZE]);
    let parsed = parse_response_header(&header)?;

    let total_len = HEADER_SIZE + parsed.body_len;
    if bytes.len() < total_len {
        return Err(BucketError::Protocol(format!(
            "Incomplete response body: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    Ok(assemble_response(parsed, &bytes[HEADER_SIZE..total_len]))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a request frame to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    let bytes = encode_request(request)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read one complete response frame from a stream
///
/// Blocks until the full frame is received or an error occurs.
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let parsed = parse_response_header(&header)?;

    let mut body = vec![0u8; parsed.body_len];
    if parsed.body_len > 0 {
        reader.read_exact(&mut body)?;
    }

    Ok(assemble_response(parsed, &body))
}

/// Read one complete request frame from a stream
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let parsed = parse_request_header(&header)?;

    let mut body = vec![0u8; parsed.body_len];
    if parsed.body_len > 0 {
        reader.read_exact(&mut body)?;
    }

    Ok(assemble_request(parsed, &body))
}

/// Write a response frame to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
