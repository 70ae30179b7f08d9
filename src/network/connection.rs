//! Connection Handler
//!
//! Owns one TCP socket to a single server node and performs blocking
//! request/response dispatch over it.

use std::io::{BufReader, BufWriter};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{BucketError, Result};
use crate::protocol::{read_response, write_request, Request, Response};

/// A single client connection
///
/// Exactly one request is in flight at a time: `send` writes the frame
/// and blocks until the matching response arrives. The connection is
/// never shared between clients.
#[derive(Debug)]
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Peer address for logging
    peer_addr: String,

    /// Correlation id for the next request
    next_opaque: u32,
}

impl Connection {
    /// Open a TCP connection per the given config
    ///
    /// Resolves the config URL, dials with the connect timeout, disables
    /// Nagle's algorithm, and applies the read/write timeouts.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let addr = config.server_addr()?;

        let sock_addr = addr
            .to_socket_addrs()
            .map_err(|e| BucketError::Connection(format!("Cannot resolve {}: {}", addr, e)))?
            .next()
            .ok_or_else(|| {
                BucketError::Connection(format!("No addresses resolved for {}", addr))
            })?;

        let stream = if config.connect_timeout_ms > 0 {
            TcpStream::connect_timeout(
                &sock_addr,
                Duration::from_millis(config.connect_timeout_ms),
            )
        } else {
            TcpStream::connect(sock_addr)
        }
        .map_err(|e| classify_io(e, &format!("connect to {}", addr)))?;

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        if config.read_timeout_ms > 0 {
            stream.set_read_timeout(Some(Duration::from_millis(config.read_timeout_ms)))?;
        }
        if config.write_timeout_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(config.write_timeout_ms)))?;
        }

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        tracing::debug!("Connected to {}", addr);

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            peer_addr: addr,
            next_opaque: 0,
        })
    }

    /// Send one request and block for its response
    ///
    /// Assigns a fresh opaque correlation id and verifies the server
    /// echoed it back; a mismatch means the stream is desynchronized and
    /// surfaces as a protocol error.
    pub fn send(&mut self, mut request: Request) -> Result<Response> {
        let opaque = self.next_opaque;
        self.next_opaque = self.next_opaque.wrapping_add(1);
        request.opaque = opaque;

        tracing::trace!(
            "Sending {:?} to {} (opaque {})",
            request.opcode,
            self.peer_addr,
            opaque
        );

        write_request(&mut self.writer, &request)
            .map_err(|e| classify_transport(e, "write request"))?;

        let response = read_response(&mut self.reader)
            .map_err(|e| classify_transport(e, "read response"))?;

        if response.opaque != opaque {
            return Err(BucketError::Protocol(format!(
                "Response correlation mismatch: sent opaque {}, got {}",
                opaque, response.opaque
            )));
        }

        tracing::trace!(
            "Received {:?} status {} from {} (cas {})",
            response.opcode,
            response.status,
            self.peer_addr,
            response.cas
        );

        Ok(response)
    }

    /// Close the connection, releasing the socket
    pub fn close(self) {
        let _ = self.writer.get_ref().shutdown(Shutdown::Both);
        tracing::debug!("Closed connection to {}", self.peer_addr);
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// Partition an I/O error into Timeout vs Connection
fn classify_io(err: std::io::Error, context: &str) -> BucketError {
    use std::io::ErrorKind;

    match err.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => {
            BucketError::Timeout(format!("{}: {}", context, err))
        }
        ErrorKind::ConnectionRefused
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::BrokenPipe
        | ErrorKind::NotConnected
        | ErrorKind::UnexpectedEof => BucketError::Connection(format!("{}: {}", context, err)),
        _ => BucketError::Io(err),
    }
}

/// Classify a codec-layer error from the transport path
///
/// Protocol errors pass through untouched; I/O errors are partitioned
/// the same way as raw socket errors.
fn classify_transport(err: BucketError, context: &str) -> BucketError {
    match err {
        BucketError::Io(io_err) => classify_io(io_err, context),
        other => other,
    }
}
