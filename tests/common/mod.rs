// tests/common/mod.rs
// A tiny HTTP/1.1 server on a local port for driving the scanner end to end.
//
// Routes:
//   /                 200 (also answers HEAD for the liveness check)
//   /admin/           200 directory listing
//   /admin            301 -> /admin/
//   /login            200 HTML page titled "Login"
//   /admin/login      200 HTML page titled "Admin login"
//   /private          200 with header "X-Token: abc", 401 otherwise
//   /big              200 with a 5000-byte body
//   anything else     404
//
// Every response closes the connection.

#![allow(dead_code)]

use async_trait::async_trait;
use dirhound::timing::Calibrator;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const BIG_BODY_LEN: usize = 5000;

pub struct StubServer {
    pub base: String,
    pub requests: Arc<AtomicUsize>,
}

/// Starts the stub; each response is delayed by `latency`
pub async fn start(latency: Duration) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&requests);
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else { break };
            let counter = Arc::clone(&counter);
            tokio::spawn(async move {
                let _ = serve(stream, counter, latency).await;
            });
        }
    });

    StubServer {
        base: format!("http://{}", addr),
        requests,
    }
}

async fn serve(mut stream: TcpStream, counter: Arc<AtomicUsize>, latency: Duration) -> std::io::Result<()> {
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        raw.extend_from_slice(&buf[..n]);
    }
    counter.fetch_add(1, Ordering::SeqCst);

    let request = String::from_utf8_lossy(&raw).to_lowercase();
    let mut request_line = request.lines().next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();

    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }

    let (status, extra, body) = route(&path, &request);
    let body = if method == "head" { String::new() } else { body };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
        status,
        body.len(),
        extra,
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

// (status line, extra header lines, body); `request` is lowercased
fn route(path: &str, request: &str) -> (&'static str, String, String) {
    let html = "Content-Type: text/html; charset=utf-8\r\n".to_string();
    match path {
        "/" => ("200 OK", String::new(), "ok".to_string()),
        "/admin/" => (
            "200 OK",
            html,
            "<html><head><title>Index of /admin</title></head><body>Parent Directory</body></html>".to_string(),
        ),
        "/admin" => ("301 Moved Permanently", "Location: /admin/\r\n".to_string(), String::new()),
        "/login" => ("200 OK", html, "<html><title>Login</title></html>".to_string()),
        "/admin/login" => ("200 OK", html, "<html><title>Admin login</title></html>".to_string()),
        "/private" if request.contains("x-token: abc") => ("200 OK", String::new(), "secret".to_string()),
        "/private" => ("401 Unauthorized", String::new(), String::new()),
        "/big" => ("200 OK", String::new(), "a".repeat(BIG_BODY_LEN)),
        _ => ("404 Not Found", String::new(), "not found".to_string()),
    }
}

/// Calibrator that never touches the network
pub struct FixedCalibrator(pub Duration);

#[async_trait]
impl Calibrator for FixedCalibrator {
    async fn measure(&self, _hostname: &str) -> Option<Duration> {
        Some(self.0)
    }
}

pub fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}
