//! Minimal in-process repository server for integration tests.
//!
//! Speaks just enough HTTP/1.1 for the client: one request per connection,
//! bodies framed by Content-Length. Uploaded parts are kept in memory so
//! tests can compare them with the source files.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

pub const TOKEN: &str = "test-token";

/// Wire-format part list for a file: `part_size` chunks, end offsets inclusive.
fn manifest_parts(size: u64, part_size: u64) -> Vec<Value> {
    let mut out = Vec::new();
    let mut start = 0u64;
    let mut part_no = 1u32;
    while start < size && part_size > 0 {
        let end = (start + part_size).min(size);
        out.push(json!({
            "part_no": part_no,
            "start_offset": start,
            "end_offset": end - 1,
        }));
        start = end;
        part_no += 1;
    }
    out
}

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub quota: u64,
    pub part_size: u64,
    pub categories: Vec<String>,
    pub item_types: Vec<String>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            quota: 1 << 20,
            part_size: 256,
            categories: vec!["Ecology".into(), "Geology".into()],
            item_types: vec!["dataset".into(), "figure".into()],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoredFile {
    pub record_id: u64,
    pub name: String,
    pub size: u64,
    pub hash: String,
    pub parts: BTreeMap<u32, Vec<u8>>,
    pub completed: bool,
}

impl StoredFile {
    pub fn content(&self) -> Vec<u8> {
        self.parts.values().flatten().copied().collect()
    }
}

#[derive(Debug, Default)]
pub struct ServerState {
    pub records: Vec<Value>,
    pub files: Vec<StoredFile>,
    /// "METHOD /path" of every request, in arrival order.
    pub requests: Vec<String>,
}

pub struct RepoServer {
    pub base_url: String,
    pub state: Arc<Mutex<ServerState>>,
}

/// Starts a server in a background thread. It runs until the process exits.
pub fn start(opts: ServerOptions) -> RepoServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let base_url = format!("http://127.0.0.1:{}/api/", port);
    let state = Arc::new(Mutex::new(ServerState::default()));
    let shared = Arc::clone(&state);
    let base = base_url.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let state = Arc::clone(&shared);
            let opts = opts.clone();
            let base = base.clone();
            thread::spawn(move || handle(stream, &state, &opts, &base));
        }
    });
    RepoServer { base_url, state }
}

struct Request {
    method: String,
    path: String,
    authorized: bool,
    body: Vec<u8>,
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut data = Vec::new();
    let mut buf = [0u8; 8192];
    let header_end = loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = std::str::from_utf8(&data[..header_end]).ok()?.to_string();
    let mut lines = head.lines();
    let mut first = lines.next()?.split_whitespace();
    let method = first.next()?.to_string();
    let path = first.next()?.to_string();
    let mut content_length = 0usize;
    let mut authorized = false;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse().ok()?;
            } else if name.eq_ignore_ascii_case("authorization") {
                authorized = value == format!("Bearer {}", TOKEN);
            }
        }
    }
    let mut body = data[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
    }
    Some(Request {
        method,
        path,
        authorized,
        body,
    })
}

fn respond(stream: &mut TcpStream, status: &str, body: &Value) {
    let body = body.to_string();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}

fn handle(mut stream: TcpStream, state: &Mutex<ServerState>, opts: &ServerOptions, base: &str) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let Some(req) = read_request(&mut stream) else {
        return;
    };
    state
        .lock()
        .unwrap()
        .requests
        .push(format!("{} {}", req.method, req.path));
    if !req.authorized {
        respond(&mut stream, "401 Unauthorized", &json!({"error": "bad token"}));
        return;
    }

    let segments: Vec<&str> = req
        .path
        .trim_start_matches("/api/")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let (status, body) = route(&req, &segments, state, opts, base);
    respond(&mut stream, status, &body);
}

fn route(
    req: &Request,
    segments: &[&str],
    state: &Mutex<ServerState>,
    opts: &ServerOptions,
    base: &str,
) -> (&'static str, Value) {
    let mut st = state.lock().unwrap();
    match (req.method.as_str(), segments) {
        ("GET", ["account"]) => {
            let used: u64 = st.files.iter().map(|f| f.size).sum();
            ("200 OK", json!({"quota": opts.quota, "used_quota": used}))
        }
        ("GET", ["enumerations"]) => (
            "200 OK",
            json!({
                "categories": opts.categories,
                "item_types": opts.item_types,
                "licenses": ["CC0", "CC BY 4.0"],
            }),
        ),
        ("POST", ["records"]) => {
            let Ok(record) = serde_json::from_slice::<Value>(&req.body) else {
                return ("400 Bad Request", json!({"error": "invalid json"}));
            };
            st.records.push(record);
            ("201 Created", json!({"id": st.records.len()}))
        }
        ("POST", ["records", id, "files"]) => {
            let Ok(announced) = serde_json::from_slice::<Value>(&req.body) else {
                return ("400 Bad Request", json!({"error": "invalid json"}));
            };
            st.files.push(StoredFile {
                record_id: id.parse().unwrap_or(0),
                name: announced["name"].as_str().unwrap_or_default().to_string(),
                size: announced["size"].as_u64().unwrap_or(0),
                hash: announced["hash"].as_str().unwrap_or_default().to_string(),
                ..Default::default()
            });
            let location = format!("{}uploads/{}", base, st.files.len());
            ("201 Created", json!({ "location": location }))
        }
        ("GET", ["uploads", n]) => match upload(&mut st, n) {
            Some(file) => {
                let status = if file.completed { "COMPLETED" } else { "PENDING" };
                (
                    "200 OK",
                    json!({
                        "status": status,
                        "parts": manifest_parts(file.size, opts.part_size),
                    }),
                )
            }
            None => ("404 Not Found", json!({})),
        },
        ("PUT", ["uploads", n, part]) => {
            let Ok(part_no) = part.parse::<u32>() else {
                return ("400 Bad Request", json!({}));
            };
            match upload(&mut st, n) {
                Some(file) => {
                    file.parts.insert(part_no, req.body.clone());
                    ("200 OK", json!({}))
                }
                None => ("404 Not Found", json!({})),
            }
        }
        ("POST", ["uploads", n, "complete"]) => match upload(&mut st, n) {
            Some(file) => {
                let digest = hex::encode(Sha256::digest(file.content()));
                if digest != file.hash || file.content().len() as u64 != file.size {
                    return ("409 Conflict", json!({"error": "content does not match"}));
                }
                file.completed = true;
                ("200 OK", json!({}))
            }
            None => ("404 Not Found", json!({})),
        },
        _ => ("404 Not Found", json!({"error": "no such endpoint"})),
    }
}

fn upload<'a>(st: &'a mut ServerState, n: &str) -> Option<&'a mut StoredFile> {
    let index: usize = n.parse().ok()?;
    st.files.get_mut(index.checked_sub(1)?)
}
