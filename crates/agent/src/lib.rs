pub mod llm;
pub mod narrative;

pub use llm::{client_from_config, AnthropicClient, LlmClient, LlmError, OllamaClient};
pub use narrative::{Narrative, NarrativeService, NarrativeSource};
