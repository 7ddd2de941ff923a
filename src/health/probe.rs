use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::net::TcpStream;

/// Reachability checks for the local API gateway and database.
#[async_trait]
pub trait ServiceProbe: Send + Sync {
    /// True when the API port answers HTTP at all.
    async fn api_reachable(&self, port: u16, timeout: Duration) -> bool;

    /// True when the database port accepts a TCP connection.
    async fn db_reachable(&self, port: u16, timeout: Duration) -> bool;
}

/// Probes over loopback networking.
pub struct NetworkProbe {
    client: Client,
}

impl NetworkProbe {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(2)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ServiceProbe for NetworkProbe {
    async fn api_reachable(&self, port: u16, timeout: Duration) -> bool {
        let url = format!("http://127.0.0.1:{}/", port);
        // Any status code means the gateway is up; only transport errors count.
        match self.client.get(&url).timeout(timeout).send().await {
            Ok(response) => {
                tracing::debug!("API probe {} -> {}", url, response.status());
                true
            }
            Err(e) => {
                tracing::debug!("API probe {} failed: {}", url, e);
                false
            }
        }
    }

    async fn db_reachable(&self, port: u16, timeout: Duration) -> bool {
        matches!(
            tokio::time::timeout(timeout, TcpStream::connect(("127.0.0.1", port))).await,
            Ok(Ok(_))
        )
    }
}
