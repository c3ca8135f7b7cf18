//! Outbound command delivery
//!
//! Defines the trait for reaching a worker's command endpoint and the HTTP
//! implementation used in production.

use crate::model::WorkerCommand;
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Delivery errors
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Trait for delivering a command to a worker endpoint
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Send `command` to `url`
    ///
    /// Any response from the worker counts as delivered; only transport
    /// failures are errors.
    async fn deliver(
        &self,
        url: &str,
        command: &WorkerCommand,
    ) -> std::result::Result<(), DeliveryError>;
}

/// POSTs commands as JSON over HTTP
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CommandTransport for HttpTransport {
    async fn deliver(
        &self,
        url: &str,
        command: &WorkerCommand,
    ) -> std::result::Result<(), DeliveryError> {
        let response = self
            .client
            .post(url)
            .json(command)
            .send()
            .await
            .map_err(|source| DeliveryError::Request {
                url: url.to_string(),
                source,
            })?;

        tracing::debug!(
            url = url,
            status = response.status().as_u16(),
            "Worker answered command"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CmdVerb;

    #[tokio::test]
    async fn test_unreachable_worker_is_request_error() {
        let transport = HttpTransport::new(Duration::from_millis(500)).unwrap();
        let command = WorkerCommand {
            cmd: CmdVerb::Ping,
            mirror_id: "arch".into(),
            args: Vec::new(),
        };

        // Grab a free port, then release it so nothing is listening there.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = format!("http://127.0.0.1:{}/cmd", port);

        let err = transport.deliver(&url, &command).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Request { .. }));
        assert!(err.to_string().starts_with(&format!("request to {} failed", url)));
    }
}
