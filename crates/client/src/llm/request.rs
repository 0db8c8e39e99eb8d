//! Chat-completion request types.

use serde::{Deserialize, Serialize};

/// System message submitted with every completion request.
const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Instruction wrapped around the scraped search payload.
const INTENT_INSTRUCTION: &str = "The following content was scraped from a search engine. Based on this data, \
                                  please infer the most likely information the user was originally searching for \
                                  and explain it as accurately as possible:";

/// A chat-completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

/// One chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatRequest {
    /// Build the request asking the model to infer the original search
    /// intent behind a scraped search-engine payload.
    pub fn infer_search_intent(model: &str, scraped: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![
                ChatMessage { role: "system".to_string(), content: SYSTEM_PROMPT.to_string() },
                ChatMessage { role: "user".to_string(), content: format!("{INTENT_INSTRUCTION}\n\n{scraped}") },
            ],
        }
    }
}
