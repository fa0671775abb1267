//! Reachability check for `http:` resources handed to `SetAVTransportURI`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::RANGE};
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Resource answered with HTTP status {0}")]
    Status(u16),
}

#[async_trait]
pub trait ResourceProbe: Send + Sync {
    async fn probe(&self, url: &Url) -> Result<(), ProbeError>;
}

/// Probe issuing a `HEAD`, or a one-byte ranged `GET` for servers that
/// refuse `HEAD`.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ResourceProbe for HttpProbe {
    async fn probe(&self, url: &Url) -> Result<(), ProbeError> {
        let response = self.client.head(url.clone()).send().await?;
        let mut status = response.status();

        if status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED {
            debug!(%url, "HEAD refused, retrying with ranged GET");
            let response = self
                .client
                .get(url.clone())
                .header(RANGE, "bytes=0-0")
                .send()
                .await?;
            status = response.status();
        }

        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::Status(status.as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answers one request per connection with the given statuses, in order,
    /// and returns the request heads it received.
    async fn serve(statuses: &[u16]) -> (Url, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let statuses = statuses.to_vec();

        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for status in statuses {
                let (mut stream, _) = listener.accept().await.unwrap();
                let mut head = Vec::new();
                let mut chunk = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = stream.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    head.extend_from_slice(&chunk[..n]);
                }
                requests.push(String::from_utf8_lossy(&head).to_ascii_lowercase());

                let response = format!(
                    "HTTP/1.1 {} Test\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    status
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                let _ = stream.shutdown().await;
            }
            requests
        });

        let url = Url::parse(&format!("http://{}/music/track.flac", addr)).unwrap();
        (url, handle)
    }

    fn probe() -> HttpProbe {
        HttpProbe::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_head_ok() {
        let (url, server) = serve(&[200]).await;
        probe().probe(&url).await.unwrap();

        let requests = server.await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("head /music/track.flac "));
    }

    #[tokio::test]
    async fn test_head_refused_falls_back_to_ranged_get() {
        let (url, server) = serve(&[405, 206]).await;
        probe().probe(&url).await.unwrap();

        let requests = server.await.unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].starts_with("head "));
        assert!(requests[1].starts_with("get "));
        assert!(requests[1].contains("range: bytes=0-0"));
    }

    #[tokio::test]
    async fn test_not_implemented_then_missing() {
        let (url, server) = serve(&[501, 404]).await;
        let err = probe().probe(&url).await.unwrap_err();
        assert!(matches!(err, ProbeError::Status(404)));
        assert_eq!(server.await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_not_found() {
        let (url, server) = serve(&[404]).await;
        let err = probe().probe(&url).await.unwrap_err();
        assert!(matches!(err, ProbeError::Status(404)));

        // no fallback for statuses other than 405 and 501
        assert_eq!(server.await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{}/a.mp3", addr)).unwrap();
        let err = probe().probe(&url).await.unwrap_err();
        assert!(matches!(err, ProbeError::Http(_)));
    }
}
