//! Shared utilities for integration testing.

use devserve::config::Config;
use devserve::server::Server;
use std::net::SocketAddr;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A server running in the background on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Bind `127.0.0.1:0` serving `root` and run it in the background.
    pub fn start(root: &Path) -> Self {
        let mut cfg = Config::default();
        cfg.server.port = 0;
        cfg.http.root = root.to_path_buf();
        cfg.logging.access_log = false;

        let server = Server::bind(&cfg).unwrap();
        let addr = server.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(server.run_until(async {
            let _ = rx.await;
        }));

        Self {
            addr,
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    /// Trigger shutdown and wait for the accept loop to exit.
    pub async fn stop(mut self) -> SocketAddr {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.await.unwrap();
        }
        self.addr
    }
}

/// A parsed HTTP/1.1 response.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    /// Header names lowercased, in wire order
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Send one request on a fresh connection and read the whole response.
pub async fn send(addr: SocketAddr, method: &str, path: &str, extra_headers: &[(&str, &str)]) -> RawResponse {
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let mut request = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
    for (name, value) in extra_headers {
        request.push_str(&format!("{name}: {value}\r\n"));
    }
    request.push_str("\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    parse_response(&raw)
}

pub async fn get(addr: SocketAddr, path: &str) -> RawResponse {
    send(addr, "GET", path, &[]).await
}

fn parse_response(raw: &[u8]) -> RawResponse {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has no header terminator");
    let head = std::str::from_utf8(&raw[..split]).unwrap();
    let body = raw[split + 4..].to_vec();

    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap();
    let status = status_line
        .split(' ')
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap();

    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    RawResponse {
        status,
        headers,
        body,
    }
}

/// Headers the transport may add after the handler is done
const TRANSPORT_HEADERS: [&str; 2] = ["date", "content-length"];

/// Assert the five isolation headers are present, exact, in order, and
/// follow every header the file-serving layer set.
pub fn assert_isolation_headers(resp: &RawResponse) {
    let expected = devserve::http::ISOLATION_HEADERS;
    let start = resp
        .headers
        .iter()
        .position(|(k, _)| k == expected[0].0)
        .unwrap_or_else(|| panic!("missing {} in {:?}", expected[0].0, resp.headers));

    for (offset, (name, value)) in expected.iter().enumerate() {
        let (k, v) = &resp.headers[start + offset];
        assert_eq!(k, name, "headers out of order: {:?}", resp.headers);
        assert_eq!(v, value);
    }

    for (k, _) in &resp.headers[start + expected.len()..] {
        assert!(
            TRANSPORT_HEADERS.contains(&k.as_str()),
            "unexpected header {k} after isolation headers: {:?}",
            resp.headers
        );
    }
}
