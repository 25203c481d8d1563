//! Page Fetcher
//!
//! Tải HTML của trang cần scan. Trang được fetch MỘT lần và dùng chung
//! cho AI model và website analyzer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;

use crate::constants::BROWSER_USER_AGENT;
use crate::error::Result;
use crate::logic::normalize::is_private_url;

/// Upper bound on downloaded HTML (bytes)
pub const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;

pub const MAX_REDIRECTS: usize = 10;

/// Source of page HTML
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// HTML of the page, or `None` when unreachable / non-2xx
    async fn fetch(&self, url: &str) -> Option<String>;
}

/// Redirects are followed only to public hosts
fn redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if is_private_url(attempt.url()) {
            log::warn!("Redirect to private address blocked: {}", attempt.url());
            attempt.stop()
        } else {
            attempt.follow()
        }
    })
}

/// Client settings for page fetches
pub fn page_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder().redirect(redirect_policy())
}

/// reqwest-backed fetcher with a browser user agent
pub struct HttpPageFetcher {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self::with_client(page_client_builder().build()?, timeout))
    }

    /// The client should come from [`page_client_builder`]
    pub fn with_client(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }
}

/// Read at most `limit` bytes of the body, then drop the connection
async fn read_capped(mut response: reqwest::Response, limit: usize) -> reqwest::Result<Vec<u8>> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        let response = self
            .http
            .get(url)
            .timeout(self.timeout)
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
            .header(reqwest::header::ACCEPT, "text/html")
            .header(reqwest::header::ACCEPT_LANGUAGE, "vi-VN,vi;q=0.9,en;q=0.8")
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                log::debug!("Fetch failed for {}: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            log::debug!("Fetch {} returned HTTP {}", url, response.status());
            return None;
        }

        match read_capped(response, MAX_PAGE_BYTES).await {
            Ok(body) => Some(String::from_utf8_lossy(&body).into_owned()),
            Err(e) => {
                log::debug!("Reading body of {} failed: {}", url, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn fetcher() -> HttpPageFetcher {
        let http = page_client_builder().no_proxy().build().unwrap();
        HttpPageFetcher::with_client(http, Duration::from_secs(10))
    }

    /// One-connection server that answers with `head` then `body_len` bytes of 'a';
    /// resolves to the number of body bytes written before the peer went away
    async fn serve(head: String, body_len: usize) -> (SocketAddr, JoinHandle<usize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            if socket.write_all(head.as_bytes()).await.is_err() {
                return 0;
            }

            let chunk = vec![b'a'; 64 * 1024];
            let mut written = 0;
            while written < body_len {
                let n = chunk.len().min(body_len - written);
                if socket.write_all(&chunk[..n]).await.is_err() {
                    break;
                }
                written += n;
            }
            written
        });

        (addr, handle)
    }

    #[tokio::test]
    async fn test_body_is_capped_while_reading() {
        let total = 64 * 1024 * 1024;
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n",
            total
        );
        let (addr, server) = serve(head, total).await;

        let page = fetcher().fetch(&format!("http://{}/", addr)).await.unwrap();
        assert_eq!(page.len(), MAX_PAGE_BYTES);

        let written = server.await.unwrap();
        assert!(written < total / 2, "server wrote {} bytes", written);
    }

    #[tokio::test]
    async fn test_small_page_read_fully() {
        let head = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 5\r\nConnection: close\r\n\r\n".to_string();
        let (addr, _server) = serve(head, 5).await;

        let page = fetcher().fetch(&format!("http://{}/", addr)).await.unwrap();
        assert_eq!(page, "aaaaa");
    }

    #[tokio::test]
    async fn test_redirect_to_private_host_not_followed() {
        let body = "HTTP/1.1 200 OK\r\nContent-Length: 6\r\nConnection: close\r\n\r\n".to_string();
        let (internal, _internal_server) = serve(body, 6).await;

        let redirect = format!(
            "HTTP/1.1 302 Found\r\nLocation: http://{}/latest/meta-data\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            internal
        );
        let (entry, _entry_server) = serve(redirect, 0).await;

        assert_eq!(fetcher().fetch(&format!("http://{}/", entry)).await, None);
    }

    #[tokio::test]
    async fn test_non_success_status_is_none() {
        let head = "HTTP/1.1 404 Not Found\r\nContent-Length: 3\r\nConnection: close\r\n\r\n".to_string();
        let (addr, _server) = serve(head, 3).await;
        assert_eq!(fetcher().fetch(&format!("http://{}/", addr)).await, None);
    }
}
