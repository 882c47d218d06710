//! Optional narrative text on top of a computed report.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use valvey_core::Degradation;

use crate::llm::LlmClient;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeSource {
    Generated,
    Local,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub source: NarrativeSource,
    pub text: String,
}

impl Narrative {
    /// The degradation to report alongside a locally produced narrative.
    pub fn degradation(&self) -> Option<Degradation> {
        (self.source == NarrativeSource::Local).then_some(Degradation::NarrativeUnavailable)
    }
}

/// Wraps an optional LLM client. The computed report never depends on it;
/// any failure falls back to the locally composed summary.
#[derive(Clone, Default)]
pub struct NarrativeService {
    client: Option<Arc<dyn LlmClient>>,
}

impl NarrativeService {
    pub fn new(client: Option<Arc<dyn LlmClient>>) -> Self {
        Self { client }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub async fn narrate(
        &self,
        correlation_id: &str,
        prompt: &str,
        local_summary: impl FnOnce() -> String,
    ) -> Narrative {
        let Some(client) = &self.client else {
            debug!(
                event_name = "system.narrative.disabled",
                correlation_id = correlation_id,
                "narrative client not configured"
            );
            return Narrative { source: NarrativeSource::Local, text: local_summary() };
        };

        match client.complete(prompt).await {
            Ok(text) => Narrative { source: NarrativeSource::Generated, text },
            Err(error) => {
                warn!(
                    event_name = "system.narrative.fallback",
                    correlation_id = correlation_id,
                    error = %error,
                    "narrative generation failed; using local summary"
                );
                Narrative { source: NarrativeSource::Local, text: local_summary() }
            }
        }
    }
}
