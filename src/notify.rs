//! Post-pipeline notification. Delivery is log-only: the transport is a
//! stub and cannot fail today, but callers keep the failure branch because
//! the flag and the error entry are part of the response contract.

use anyhow::Result;

pub struct Notifier {
    recipient: String,
}

impl Notifier {
    pub fn new(recipient: String) -> Self {
        Self { recipient }
    }

    pub async fn send_summary(&self, stored: usize, failed: usize) -> Result<()> {
        tracing::info!(
            recipient = %self.recipient,
            stored,
            failed,
            "notification sent"
        );
        Ok(())
    }
}
