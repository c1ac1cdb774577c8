//! Deterministic enrichment of fetched identifiers. The analysis is a
//! fixed template and the sentiment label is constant; there is no model
//! behind this and no failure mode.

/// The only sentiment the enricher emits today. The field exists in the
/// data model so the label can vary later.
pub const SENTIMENT_LABEL: &str = "balanced";

#[derive(Debug, Clone)]
pub struct Enrichment {
    pub analysis: String,
    pub sentiment: String,
}

#[derive(Debug, Clone, Default)]
pub struct Enricher;

impl Enricher {
    pub fn new() -> Self {
        Self
    }

    /// Embeds the identifier verbatim into the canned description.
    pub fn enrich(&self, identifier: &str) -> Enrichment {
        let analysis = format!(
            "The generated UUID {identifier} represents a unique identifier typically used in \
             distributed systems. It ensures uniqueness across systems and supports reliable \
             tracking of resources."
        );
        Enrichment {
            analysis,
            sentiment: SENTIMENT_LABEL.to_string(),
        }
    }
}
