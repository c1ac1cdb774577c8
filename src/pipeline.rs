//! The per-request pipeline: three sequential fetch → enrich → persist
//! attempts with isolated failures, followed by the notification step.

use std::sync::Arc;
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::enrich::Enricher;
use crate::fetch::IdentifierSource;
use crate::notify::Notifier;
use crate::store::{NewResult, ResultStore};

/// Number of independent attempts per request.
pub const ATTEMPTS: usize = 3;

/// Message recorded when the source yields no identifier. All fetch
/// failure causes collapse into this one string.
pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch UUID";

const NOTIFICATION_ERROR_MESSAGE: &str = "Failed to send notification";

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_requests_total", "Pipeline runs started.");
        describe_counter!(
            "pipeline_items_stored_total",
            "Attempts that fetched, enriched and persisted successfully."
        );
        describe_counter!(
            "pipeline_attempt_errors_total",
            "Attempts recorded as failed (fetch or storage)."
        );
        describe_counter!(
            "pipeline_fetch_failures_total",
            "Identifier source calls that yielded no identifier."
        );
        describe_histogram!("pipeline_run_ms", "Full pipeline run time in milliseconds.");
    });
}

fn default_email() -> String {
    "unknown@example.com".to_string()
}

fn default_source() -> String {
    "HTTPBin UUID".to_string()
}

/// Caller-supplied request body. Both fields are optional; a missing or
/// malformed body falls back to `Default`.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineRequest {
    /// Accepted for provenance; not echoed back and not persisted.
    #[serde(default = "default_email")]
    pub email: String,
    #[serde(default = "default_source")]
    pub source: String,
}

impl Default for PipelineRequest {
    fn default() -> Self {
        Self {
            email: default_email(),
            source: default_source(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EnrichedItem {
    pub original: String,
    pub analysis: String,
    pub sentiment: String,
    pub stored: bool,
    pub timestamp: String,
}

/// Entries of the report's `errors` array. Attempt failures and the
/// (currently unreachable) notification failure serialize as different
/// object shapes, so the kinds stay distinguishable to callers.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ReportError {
    Attempt { item: usize, error: String },
    Notification { notification: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub items: Vec<EnrichedItem>,
    pub notification_sent: bool,
    pub processed_at: String,
    pub errors: Vec<ReportError>,
}

/// Per-attempt failure, converted into a `ReportError::Attempt` entry.
#[derive(Debug)]
struct AttemptError {
    index: usize,
    message: String,
}

pub struct Pipeline {
    source: Arc<dyn IdentifierSource>,
    store: Arc<dyn ResultStore>,
    enricher: Enricher,
    notifier: Notifier,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn IdentifierSource>,
        store: Arc<dyn ResultStore>,
        enricher: Enricher,
        notifier: Notifier,
    ) -> Self {
        Self {
            source,
            store,
            enricher,
            notifier,
        }
    }

    /// Run the three attempts strictly in sequence, then the notification
    /// step. Never fails as a whole; partial failure lands in `errors`.
    pub async fn run(&self, request: &PipelineRequest) -> PipelineReport {
        ensure_metrics_described();
        counter!("pipeline_requests_total").increment(1);
        let t0 = Instant::now();

        let mut items = Vec::with_capacity(ATTEMPTS);
        let mut errors = Vec::new();

        for index in 0..ATTEMPTS {
            match self.run_attempt(index, &request.source).await {
                Ok(item) => items.push(item),
                Err(e) => {
                    tracing::warn!(item = e.index, error = %e.message, "attempt failed");
                    errors.push(ReportError::Attempt {
                        item: e.index,
                        error: e.message,
                    });
                }
            }
        }

        counter!("pipeline_items_stored_total").increment(items.len() as u64);
        counter!("pipeline_attempt_errors_total").increment(errors.len() as u64);

        let notification_sent = match self
            .notifier
            .send_summary(items.len(), errors.len())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = ?e, "notification failed");
                errors.push(ReportError::Notification {
                    notification: NOTIFICATION_ERROR_MESSAGE.to_string(),
                });
                false
            }
        };

        histogram!("pipeline_run_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        PipelineReport {
            items,
            notification_sent,
            processed_at: utc_timestamp(),
            errors,
        }
    }

    async fn run_attempt(
        &self,
        index: usize,
        source_label: &str,
    ) -> Result<EnrichedItem, AttemptError> {
        let Some(identifier) = self.source.fetch_identifier().await else {
            return Err(AttemptError {
                index,
                message: FETCH_ERROR_MESSAGE.to_string(),
            });
        };

        let enrichment = self.enricher.enrich(&identifier);

        // Assigned at persistence time, not fetch time.
        let timestamp = utc_timestamp();
        self.store
            .insert(NewResult {
                original: &identifier,
                analysis: &enrichment.analysis,
                sentiment: &enrichment.sentiment,
                source: source_label,
                timestamp: &timestamp,
            })
            .map_err(|e| AttemptError {
                index,
                message: e.to_string(),
            })?;

        Ok(EnrichedItem {
            original: identifier,
            analysis: enrichment.analysis,
            sentiment: enrichment.sentiment,
            stored: true,
            timestamp,
        })
    }
}

/// ISO-8601 UTC with microsecond precision and trailing `Z`.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
