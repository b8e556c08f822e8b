//! Narrative drafter backed by an OpenAI-compatible chat completions API

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

use super::{BriefingContext, NarrativeDrafter, NarrativeError};
use crate::config::NarrativeConfig;

const SYSTEM_PROMPT: &str = "You are a concise environmental health assistant. \
Write plain-text daily briefings for commuters and keep medical claims conservative.";

pub struct OpenAiDrafter {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl OpenAiDrafter {
    pub fn new(config: &NarrativeConfig) -> Result<Self, NarrativeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| NarrativeError::Http(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// Extract the first non-empty completion from a chat response body
fn parse_completion(body: &str) -> Result<String, NarrativeError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| NarrativeError::Serialization(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| NarrativeError::Response("missing completion text".to_string()))
}

#[async_trait]
impl NarrativeDrafter for OpenAiDrafter {
    #[instrument(skip(self, context), fields(model = %self.model, briefing_type = %context.briefing_type))]
    async fn draft(&self, context: &BriefingContext) -> Result<String, NarrativeError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(NarrativeError::MissingCredential)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| NarrativeError::Http(e.to_string()))?,
        );

        let prompt = context.to_prompt();
        debug!("Narrative prompt: {}", prompt);

        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
        };

        let start_time = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| NarrativeError::Http(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| NarrativeError::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(NarrativeError::Response(format!("HTTP {status}: {text}")));
        }

        let briefing = parse_completion(&text)?;
        info!(
            "Drafted {}-character briefing in {:.3}s",
            briefing.chars().count(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(briefing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrative::BriefingType;

    #[test]
    fn test_parse_completion() {
        let body = r#"{"id": "chatcmpl-1", "choices": [
            {"index": 0, "message": {"role": "assistant", "content": "  Good morning, Boston!  "},
             "finish_reason": "stop"}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "Good morning, Boston!");
    }

    #[test]
    fn test_parse_completion_without_choices() {
        let err = parse_completion(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, NarrativeError::Response(_)));
    }

    #[test]
    fn test_parse_completion_invalid_json() {
        let err = parse_completion("not json").unwrap_err();
        assert!(matches!(err, NarrativeError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let drafter = OpenAiDrafter::new(&NarrativeConfig::default()).unwrap();
        let context = BriefingContext {
            location: "Boston, MA".to_string(),
            weather: "N/A".to_string(),
            air_quality: "N/A".to_string(),
            risk_score: 0.0,
            risk_level: "low".to_string(),
            briefing_type: BriefingType::Short,
            urgent: false,
        };
        let err = drafter.draft(&context).await.unwrap_err();
        assert!(matches!(err, NarrativeError::MissingCredential));
    }
}
