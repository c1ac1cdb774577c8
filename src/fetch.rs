//! External identifier source. Every failure mode — transport error,
//! non-success status, unreadable body, malformed payload, missing field —
//! collapses into `None`; callers only see success vs absence.

use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;

use crate::config::ServiceConfig;

#[async_trait]
pub trait IdentifierSource: Send + Sync {
    /// One freshly generated identifier, or `None` on any failure.
    async fn fetch_identifier(&self) -> Option<String>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Deserialize)]
struct UuidPayload {
    uuid: Option<String>,
}

/// Extract the identifier from a response body shaped like
/// `{"uuid": "..."}`.
fn extract_identifier(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<UuidPayload>(body)
        .ok()
        .and_then(|p| p.uuid)
}

pub struct HttpBinSource {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpBinSource {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.identifier_url.clone(),
            timeout: Duration::from_secs(config.fetch_timeout_secs),
        }
    }
}

#[async_trait]
impl IdentifierSource for HttpBinSource {
    async fn fetch_identifier(&self) -> Option<String> {
        let resp = match self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(error = ?e, source = self.name(), "identifier request failed");
                counter!("pipeline_fetch_failures_total").increment(1);
                return None;
            }
        };

        if let Err(e) = resp.error_for_status_ref() {
            tracing::warn!(error = ?e, source = self.name(), "identifier endpoint returned error status");
            counter!("pipeline_fetch_failures_total").increment(1);
            return None;
        }

        let body = match resp.bytes().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = ?e, source = self.name(), "identifier body read failed");
                counter!("pipeline_fetch_failures_total").increment(1);
                return None;
            }
        };

        match extract_identifier(&body) {
            Some(uuid) => Some(uuid),
            None => {
                tracing::warn!(source = self.name(), "identifier payload missing uuid field");
                counter!("pipeline_fetch_failures_total").increment(1);
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "HTTPBin"
    }
}
