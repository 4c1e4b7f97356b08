// ABOUTME: Minimal JSON RPC server on a real TCP socket for transport tests.
// ABOUTME: Can hang up on the first connections to simulate a dropped link.

use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// A background server answering `{"method", "params"}` posts.
///
/// Each connection serves one request and then closes.
pub struct RpcServer {
    url: String,
    accepted: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl RpcServer {
    /// Serve `respond(method)` as the RPC result, hanging up without a reply
    /// on the first `drop_first` connections.
    pub fn spawn<F>(drop_first: usize, respond: F) -> Self
    where
        F: Fn(&str) -> Value + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/rpc", listener.local_addr().unwrap());
        let accepted = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&accepted);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let seen = counter.fetch_add(1, Ordering::SeqCst);
                if seen < drop_first {
                    drop(stream);
                    continue;
                }
                serve(stream, &respond);
            }
        });

        Self { url, accepted }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connections accepted so far, including dropped ones.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

fn serve(stream: TcpStream, respond: &impl Fn(&str) -> Value) {
    let mut reader = BufReader::new(stream);
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            return;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = vec![0u8; content_length];
    if reader.read_exact(&mut body).is_err() {
        return;
    }
    let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let method = request["method"].as_str().unwrap_or_default();
    let payload = json!({ "result": respond(method) }).to_string();

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        payload.len(),
        payload
    );
    let mut stream = reader.into_inner();
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
