use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::error::TransportError;

pub trait SnapshotSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

impl<T: SnapshotSource> SnapshotSource for Arc<T> {
    fn fetch(&self) -> impl Future<Output = Result<Value, TransportError>> + Send {
        (**self).fetch()
    }
}

pub struct HttpSource {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| TransportError::Request {
                url: url.clone(),
                reason: error.to_string(),
            })?;

        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SnapshotSource for HttpSource {
    fn fetch(&self) -> impl Future<Output = Result<Value, TransportError>> + Send {
        async move {
            tracing::debug!(url = %self.url, "requesting metrics snapshot");
            let response = self.client.get(&self.url).send().await.map_err(|error| {
                if error.is_timeout() {
                    TransportError::Timeout(self.timeout)
                } else {
                    TransportError::Request {
                        url: self.url.clone(),
                        reason: error.to_string(),
                    }
                }
            })?;

            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::Status {
                    url: self.url.clone(),
                    status: status.as_u16(),
                });
            }

            response
                .json::<Value>()
                .await
                .map_err(|error| TransportError::Body {
                    url: self.url.clone(),
                    reason: error.to_string(),
                })
        }
    }
}
