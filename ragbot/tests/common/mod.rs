//! Shared helpers: a deterministic embedder and a one-shot HTTP stub server.

#![allow(dead_code)]

use std::net::SocketAddr;

use async_trait::async_trait;
use ragbot::vectorstore::{Embedder, StoreError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Folds text bytes into a fixed-size vector; identical text gives identical vectors.
pub struct ByteEmbedder {
    pub dimension: usize,
}

impl ByteEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for ByteEmbedder {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, StoreError> {
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![0f32; self.dimension];
                for (i, b) in t.bytes().enumerate() {
                    v[i % self.dimension] += b as f32 / 256.0;
                }
                v
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// One captured request: head (request line + headers) and body.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub head: String,
    pub body: String,
}

impl CapturedRequest {
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        let prefix = format!("{}:", name.to_ascii_lowercase());
        self.head.lines().find_map(|line| {
            line.to_ascii_lowercase()
                .starts_with(&prefix)
                .then(|| line[prefix.len()..].trim().to_string())
        })
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

async fn read_http_request(stream: &mut TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 1024];
    loop {
        let n = stream.read(&mut tmp).await.unwrap();
        if n == 0 {
            return CapturedRequest {
                head: String::from_utf8_lossy(&buf).to_string(),
                body: String::new(),
            };
        }
        buf.extend_from_slice(&tmp[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let header_end = pos + 4;
            let head = String::from_utf8_lossy(&buf[..pos]).to_string();
            let content_length = head
                .lines()
                .find_map(|line| {
                    line.to_ascii_lowercase()
                        .strip_prefix("content-length:")
                        .and_then(|v| v.trim().parse::<usize>().ok())
                })
                .unwrap_or(0);
            let mut body = buf[header_end..].to_vec();
            while body.len() < content_length {
                let m = stream.read(&mut tmp).await.unwrap();
                if m == 0 {
                    break;
                }
                body.extend_from_slice(&tmp[..m]);
            }
            return CapturedRequest {
                head,
                body: String::from_utf8_lossy(&body).to_string(),
            };
        }
    }
}

async fn write_http_response(stream: &mut TcpStream, status: &str, content_type: &str, body: &str) {
    let resp = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nConnection: close\r\nContent-Length: {}\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    );
    stream.write_all(resp.as_bytes()).await.unwrap();
}

/// Serves `responses` (status, content type, body) to consecutive connections,
/// then returns the captured requests.
pub async fn serve(
    responses: Vec<(&'static str, &'static str, String)>,
) -> (SocketAddr, JoinHandle<Vec<CapturedRequest>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let mut captured = Vec::new();
        for (status, content_type, body) in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            captured.push(read_http_request(&mut stream).await);
            write_http_response(&mut stream, status, content_type, &body).await;
        }
        captured
    });
    (addr, handle)
}

/// Serves JSON bodies with `200 OK`.
pub async fn serve_json(
    bodies: Vec<serde_json::Value>,
) -> (SocketAddr, JoinHandle<Vec<CapturedRequest>>) {
    serve(
        bodies
            .into_iter()
            .map(|b| ("200 OK", "application/json", b.to_string()))
            .collect(),
    )
    .await
}
