//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use cors_gateway::config::GatewayConfig;
use cors_gateway::http::HttpServer;
use cors_gateway::lifecycle::Shutdown;

/// A mock upstream bound to an OS-assigned port.
pub struct MockUpstream {
    pub addr: SocketAddr,
    calls: Arc<AtomicU32>,
}

impl MockUpstream {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of requests the upstream has received.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Read one HTTP/1.1 request (headers plus Content-Length body) so the
/// client never sees a reset before the response is written.
async fn read_request(socket: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return buf,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
        if let Some(pos) = find_subslice(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let content_length = std::str::from_utf8(&buf[..header_end])
        .ok()
        .and_then(|headers| {
            headers.lines().find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
        })
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    buf
}

/// Locate a byte pattern inside a buffer.
pub fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

async fn serve_fixed(
    listener: TcpListener,
    calls: Arc<AtomicU32>,
    status_line: &'static str,
    body: &'static str,
    delay: Option<Duration>,
    captured: Option<mpsc::UnboundedSender<Vec<u8>>>,
) {
    loop {
        match listener.accept().await {
            Ok((mut socket, _)) => {
                let calls = calls.clone();
                let captured = captured.clone();
                tokio::spawn(async move {
                    let request = read_request(&mut socket).await;
                    calls.fetch_add(1, Ordering::SeqCst);
                    if let Some(tx) = captured {
                        let _ = tx.send(request);
                    }
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status_line,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
            Err(_) => break,
        }
    }
}

/// Start a mock upstream returning a fixed status and body.
pub async fn start_upstream(status_line: &'static str, body: &'static str) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(AtomicU32::new(0));

    let loop_calls = calls.clone();
    tokio::spawn(serve_fixed(listener, loop_calls, status_line, body, None, None));

    MockUpstream { addr, calls }
}

/// Start a mock upstream that also hands each raw request to the test.
#[allow(dead_code)]
pub async fn start_capturing_upstream(
    body: &'static str,
) -> (MockUpstream, mpsc::UnboundedReceiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let (tx, rx) = mpsc::unbounded_channel();

    let loop_calls = calls.clone();
    tokio::spawn(serve_fixed(
        listener,
        loop_calls,
        "200 OK",
        body,
        None,
        Some(tx),
    ));

    (MockUpstream { addr, calls }, rx)
}

/// Start a mock upstream that stalls before answering.
#[allow(dead_code)]
pub async fn start_slow_upstream(delay: Duration, body: &'static str) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(AtomicU32::new(0));

    let loop_calls = calls.clone();
    tokio::spawn(serve_fixed(
        listener,
        loop_calls,
        "200 OK",
        body,
        Some(delay),
        None,
    ));

    MockUpstream { addr, calls }
}

/// An address that is bound and immediately released, so connections to it
/// are refused.
pub async fn dead_upstream_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Gateway configuration pointed at the given upstream, with OS-assigned
/// listener port and test-friendly timeouts.
pub fn test_config(upstream_url: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.base_url = upstream_url.to_string();
    config.timeouts.connect_secs = 2;
    config.timeouts.upstream_secs = 5;
    config.timeouts.request_secs = 10;
    config
}

/// Spawn the gateway and return its address plus the shutdown handle.
pub async fn spawn_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let server = HttpServer::new(config).unwrap();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, shutdown)
}

/// A client that ignores environment proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
