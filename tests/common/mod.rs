//! Test fixtures
//!
//! An in-memory memcached-binary server the integration tests dial over
//! real TCP. One locked map backs the whole bucket, so every mutation
//! (counters included) is serialized server-side exactly like the real
//! thing.

use std::collections::HashMap;
use std::io::{BufReader, BufWriter};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use bucketkv::protocol::{read_request, write_response, Opcode, Request, Response, Status};

/// One stored item
#[derive(Debug, Clone)]
struct StoredItem {
    flags: u32,
    value: Vec<u8>,
    cas: u64,
    expires_at: Option<Instant>,
}

impl StoredItem {
    fn expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if deadline <= now)
    }
}

/// Shared bucket state
struct Store {
    items: Mutex<HashMap<Vec<u8>, StoredItem>>,
    cas_counter: AtomicU64,
}

impl Store {
    fn new() -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            cas_counter: AtomicU64::new(1),
        }
    }

    fn next_cas(&self) -> u64 {
        self.cas_counter.fetch_add(1, Ordering::SeqCst)
    }
}

/// Handle to a running test server
pub struct TestServer {
    addr: String,
}

impl TestServer {
    /// Bind an ephemeral port and start serving in background threads
    pub fn spawn() -> TestServer {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
        let addr = listener.local_addr().expect("local addr").to_string();
        let store = Arc::new(Store::new());

        thread::spawn(move || {
            for stream in listener.incoming() {
                let stream = match stream {
                    Ok(s) => s,
                    Err(_) => break,
                };
                let store = Arc::clone(&store);
                thread::spawn(move || serve_connection(stream, store));
            }
        });

        TestServer { addr }
    }

    /// `host:port` the server listens on
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

/// Serve one client connection until it hangs up
fn serve_connection(stream: TcpStream, store: Arc<Store>) {
    let read_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut reader = BufReader::new(read_stream);
    let mut writer = BufWriter::new(stream);

    loop {
        let request = match read_request(&mut reader) {
            Ok(req) => req,
            Err(_) => return, // disconnect or bad frame
        };

        let response = execute(&store, &request);
        if write_response(&mut writer, &response).is_err() {
            return;
        }
    }
}

/// Empty response with the given status, echoing opcode and opaque
fn status_response(request: &Request, status: Status) -> Response {
    Response {
        opcode: request.opcode,
        status,
        opaque: request.opaque,
        cas: 0,
        extras: Vec::new(),
        key: Vec::new(),
        value: Vec::new(),
    }
}

/// Success response carrying a CAS
fn stored_response(request: &Request, cas: u64) -> Response {
    Response {
        cas,
        ..status_response(request, Status::Success)
    }
}

/// Relative expiry seconds to an absolute deadline (0 = never)
fn deadline(expiry: u32) -> Option<Instant> {
    if expiry == 0 {
        None
    } else {
        Some(Instant::now() + Duration::from_secs(u64::from(expiry)))
    }
}

/// Execute one request against the store
fn execute(store: &Store, request: &Request) -> Response {
    match request.opcode {
        Opcode::Get => do_get(store, request),
        Opcode::Set | Opcode::Add | Opcode::Replace => do_store(store, request),
        Opcode::Delete => do_delete(store, request),
        Opcode::Append | Opcode::Prepend => do_concat(store, request),
        Opcode::Increment | Opcode::Decrement => do_counter(store, request),
        Opcode::Touch => do_touch(store, request),
        Opcode::Flush => do_flush(store, request),
        Opcode::Noop => status_response(request, Status::Success),
        Opcode::SaslListMechs => Response {
            value: b"PLAIN".to_vec(),
            ..status_response(request, Status::Success)
        },
        Opcode::SaslAuth => do_sasl_auth(request),
    }
}

fn do_get(store: &Store, request: &Request) -> Response {
    let now = Instant::now();
    let mut items = store.items.lock();

    match items.get(&request.key) {
        Some(item) if !item.expired(now) => Response {
            cas: item.cas,
            extras: item.flags.to_be_bytes().to_vec(),
            value: item.value.clone(),
            ..status_response(request, Status::Success)
        },
        Some(_) => {
            items.remove(&request.key);
            status_response(request, Status::KeyNotFound)
        }
        None => status_response(request, Status::KeyNotFound),
    }
}

fn do_store(store: &Store, request: &Request) -> Response {
    if request.extras.len() != 8 {
        return status_response(request, Status::InvalidArguments);
    }
    let flags = u32::from_be_bytes(request.extras[0..4].try_into().unwrap());
    let expiry = u32::from_be_bytes(request.extras[4..8].try_into().unwrap());

    let now = Instant::now();
    let mut items = store.items.lock();
    let existing = items
        .get(&request.key)
        .filter(|item| !item.expired(now))
        .cloned();

    match request.opcode {
        Opcode::Add if existing.is_some() => {
            return status_response(request, Status::KeyExists);
        }
        Opcode::Replace if existing.is_none() => {
            return status_response(request, Status::NotStored);
        }
        Opcode::Set if request.cas != 0 => match &existing {
            None => return status_response(request, Status::KeyNotFound),
            Some(item) if item.cas != request.cas => {
                return status_response(request, Status::KeyExists);
            }
            Some(_) => {}
        },
        _ => {}
    }

    let cas = store.next_cas();
    items.insert(
        request.key.clone(),
        StoredItem {
            flags,
            value: request.value.clone(),
            cas,
            expires_at: deadline(expiry),
        },
    );
    stored_response(request, cas)
}

fn do_delete(store: &Store, request: &Request) -> Response {
    let now = Instant::now();
    let mut items = store.items.lock();

    match items.remove(&request.key) {
        Some(item) if !item.expired(now) => status_response(request, Status::Success),
        _ => status_response(request, Status::KeyNotFound),
    }
}

fn do_concat(store: &Store, request: &Request) -> Response {
    let now = Instant::now();
    let mut items = store.items.lock();

    match items.get_mut(&request.key) {
        Some(item) if !item.expired(now) => {
            match request.opcode {
                Opcode::Append => item.value.extend_from_slice(&request.value),
                _ => {
                    let mut combined = request.value.clone();
                    combined.extend_from_slice(&item.value);
                    item.value = combined;
                }
            }
            item.cas = store.cas_counter.fetch_add(1, Ordering::SeqCst);
            let cas = item.cas;
            stored_response(request, cas)
        }
        _ => status_response(request, Status::NotStored),
    }
}

fn do_counter(store: &Store, request: &Request) -> Response {
    if request.extras.len() != 20 {
        return status_response(request, Status::InvalidArguments);
    }
    let delta = u64::from_be_bytes(request.extras[0..8].try_into().unwrap());
    let initial = u64::from_be_bytes(request.extras[8..16].try_into().unwrap());
    let expiry = u32::from_be_bytes(request.extras[16..20].try_into().unwrap());

    let now = Instant::now();
    let mut items = store.items.lock();
    let existing = items.get(&request.key).filter(|item| !item.expired(now));
    let prev_expires = existing.and_then(|item| item.expires_at);
    let was_existing = existing.is_some();

    let new_value = match existing {
        Some(item) => {
            let text = match std::str::from_utf8(&item.value) {
                Ok(t) => t,
                Err(_) => return status_response(request, Status::NotNumeric),
            };
            let current: u64 = match text.trim().parse() {
                Ok(n) => n,
                Err(_) => return status_response(request, Status::NotNumeric),
            };
            match request.opcode {
                Opcode::Increment => current.wrapping_add(delta),
                _ => current.saturating_sub(delta), // decrement floors at zero
            }
        }
        None => {
            // 0xffffffff means "do not create"
            if expiry == u32::MAX {
                return status_response(request, Status::KeyNotFound);
            }
            initial
        }
    };

    let cas = store.next_cas();
    // A live counter keeps its deadline; a fresh one gets the request's
    let expires_at = if was_existing {
        prev_expires
    } else {
        deadline(expiry)
    };
    items.insert(
        request.key.clone(),
        StoredItem {
            flags: 0,
            value: new_value.to_string().into_bytes(),
            cas,
            expires_at,
        },
    );

    Response {
        cas,
        value: new_value.to_be_bytes().to_vec(),
        ..status_response(request, Status::Success)
    }
}

fn do_touch(store: &Store, request: &Request) -> Response {
    if request.extras.len() != 4 {
        return status_response(request, Status::InvalidArguments);
    }
    let expiry = u32::from_be_bytes(request.extras[0..4].try_into().unwrap());

    let now = Instant::now();
    let mut items = store.items.lock();

    match items.get_mut(&request.key) {
        Some(item) if !item.expired(now) => {
            item.expires_at = deadline(expiry);
            item.cas = store.cas_counter.fetch_add(1, Ordering::SeqCst);
            let cas = item.cas;
            stored_response(request, cas)
        }
        _ => status_response(request, Status::KeyNotFound),
    }
}

fn do_flush(store: &Store, request: &Request) -> Response {
    store.items.lock().clear();
    status_response(request, Status::Success)
}

fn do_sasl_auth(request: &Request) -> Response {
    // PLAIN message: authzid NUL authcid NUL passwd
    if request.key == b"PLAIN" && request.value.iter().filter(|&&b| b == 0).count() >= 2 {
        status_response(request, Status::Success)
    } else {
        status_response(request, Status::AuthError)
    }
}

// =============================================================================
// Misbehaving Fixtures
// =============================================================================

/// A server that accepts connections but never answers
///
/// Accepted streams are held open so reads on the client side block
/// until its read timeout fires.
pub struct SilentServer {
    addr: String,
}

impl SilentServer {
    /// Bind an ephemeral port and swallow every request
    pub fn spawn() -> SilentServer {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind silent server");
        let addr = listener.local_addr().expect("local addr").to_string();

        thread::spawn(move || {
            let mut held = Vec::new();
            for stream in listener.incoming() {
                match stream {
                    Ok(s) => held.push(s),
                    Err(_) => break,
                }
            }
        });

        SilentServer { addr }
    }

    /// `host:port` the server listens on
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

/// A server that answers every request with a corrupted correlation id
pub struct BadOpaqueServer {
    addr: String,
}

impl BadOpaqueServer {
    /// Bind an ephemeral port and answer success frames with the wrong opaque
    pub fn spawn() -> BadOpaqueServer {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind bad-opaque server");
        let addr = listener.local_addr().expect("local addr").to_string();

        thread::spawn(move || {
            for stream in listener.incoming() {
                let stream = match stream {
                    Ok(s) => s,
                    Err(_) => break,
                };
                thread::spawn(move || {
                    let read_stream = match stream.try_clone() {
                        Ok(s) => s,
                        Err(_) => return,
                    };
                    let mut reader = BufReader::new(read_stream);
                    let mut writer = BufWriter::new(stream);

                    while let Ok(request) = read_request(&mut reader) {
                        let response = Response {
                            opaque: request.opaque.wrapping_add(1),
                            ..status_response(&request, Status::Success)
                        };
                        if write_response(&mut writer, &response).is_err() {
                            return;
                        }
                    }
                });
            }
        });

        BadOpaqueServer { addr }
    }

    /// `host:port` the server listens on
    pub fn addr(&self) -> &str {
        &self.addr
    }
}
