use std::sync::Arc;

use tracing::{error, info};

use crate::core::intent::Intent;
use crate::core::llm::LlmProvider;

/// Translates free-form queries into structured intents via the NLU model.
///
/// Resolution must be tolerant of NLU failure: every failure mode here
/// (model error, unparseable response) degrades to the degenerate
/// `{action: "unknown", query: ...}` intent instead of failing the request.
pub struct IntentParser {
    llm: Arc<dyn LlmProvider>,
    model: String,
}

impl IntentParser {
    pub fn new(llm: Arc<dyn LlmProvider>, model: String) -> Self {
        Self { llm, model }
    }

    pub async fn parse_intent(&self, query: &str) -> Intent {
        let prompt = build_nlu_prompt(query);

        let response = match self.llm.generate(&self.model, &prompt, 0.1).await {
            Ok(text) => text,
            Err(e) => {
                error!("intent parsing failed: {}", e);
                return Intent::unknown(query);
            }
        };

        match extract_json_object(&response)
            .and_then(|raw| serde_json::from_str::<serde_json::Value>(raw).ok())
        {
            Some(value) => {
                let intent = Intent::from_json(&value);
                info!("intent parsed: {}", intent.search_text());
                intent
            }
            None => {
                error!("no JSON intent found in NLU response");
                Intent::unknown(query)
            }
        }
    }
}

fn build_nlu_prompt(query: &str) -> String {
    format!(
        r#"You are a command parser. Convert this natural language command into a JSON intent.

Rules:
- Extract the main action (e.g., open, play, create, search, control)
- Extract relevant parameters (e.g., app names, playlist names, file paths)
- Return ONLY valid JSON, no explanation
- Use snake_case for keys

Examples:
Input: "play my morning playlist"
Output: {{"action": "play_music", "playlist": "morning"}}

Input: "open chrome"
Output: {{"action": "open_app", "app": "chrome"}}

Input: "create a new note"
Output: {{"action": "create_note"}}

Now parse this command:
Input: "{}"
Output:"#,
        query
    )
}

/// Slice out the outermost `{...}` from a model response that may carry
/// prose around the JSON.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Key terms of a query with stopwords stripped, for reporting.
pub fn extract_keywords(text: &str) -> Vec<String> {
    const STOPWORDS: &[&str] = &[
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "my",
    ];
    text.to_lowercase()
        .split_whitespace()
        .filter(|w| w.len() > 2 && !STOPWORDS.contains(w))
        .map(|w| w.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;

    struct CannedLlm {
        response: Result<&'static str, &'static str>,
    }

    #[async_trait]
    impl LlmProvider for CannedLlm {
        async fn generate(&self, _model: &str, _prompt: &str, _temperature: f32) -> Result<String> {
            match self.response {
                Ok(text) => Ok(text.to_string()),
                Err(msg) => Err(anyhow!(msg)),
            }
        }

        async fn embed(&self, _model: &str, _text: &str) -> Result<Vec<f32>> {
            Err(anyhow!("not used"))
        }
    }

    fn parser(response: Result<&'static str, &'static str>) -> IntentParser {
        IntentParser::new(Arc::new(CannedLlm { response }), "test-model".to_string())
    }

    #[tokio::test]
    async fn parses_json_embedded_in_prose() {
        let p = parser(Ok(
            "Sure, here is the intent:\n{\"action\": \"open_app\", \"app\": \"chrome\"}\nDone.",
        ));
        let intent = p.parse_intent("open chrome").await;
        assert_eq!(intent.action, "open_app");
        assert_eq!(intent.params.get("app").unwrap(), "chrome");
    }

    #[tokio::test]
    async fn model_error_falls_back_to_unknown_intent() {
        let p = parser(Err("connection refused"));
        let intent = p.parse_intent("open chrome").await;
        assert_eq!(intent.action, "unknown");
        assert_eq!(intent.params.get("query").unwrap(), "open chrome");
    }

    #[tokio::test]
    async fn garbage_response_falls_back_to_unknown_intent() {
        let p = parser(Ok("I cannot help with that."));
        let intent = p.parse_intent("do something").await;
        assert_eq!(intent.action, "unknown");
        assert_eq!(intent.params.get("query").unwrap(), "do something");
    }

    #[test]
    fn extract_json_object_requires_balanced_braces() {
        assert_eq!(extract_json_object("x {\"a\":1} y"), Some("{\"a\":1}"));
        assert_eq!(extract_json_object("} {"), None);
        assert_eq!(extract_json_object("no json"), None);
    }

    #[test]
    fn keywords_strip_stopwords_and_short_words() {
        let kw = extract_keywords("play my morning playlist on the speaker");
        assert_eq!(kw, vec!["play", "morning", "playlist", "speaker"]);
    }
}
