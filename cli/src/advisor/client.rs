use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::AdvisorError;
use crate::config::AdvisorConfig;

const SYSTEM_PROMPT: &str = "You are a friendly battery health advisor for smartphones. \
Provide concise, actionable advice (2-3 sentences max) based on the user's current battery \
status and usage patterns. Be specific and practical. Focus on one key recommendation at a \
time. Use a warm, helpful tone.";

const VALIDATION_PROMPT: &str = "test";
const VALIDATION_MAX_TOKENS: u32 = 5;
const EMPTY_SUGGESTION: &str = "Unable to generate suggestion.";

/// A hosted model that turns a usage context into advice.
pub trait Advisor {
    fn suggest(&self, api_key: &str, context: &str) -> Result<String, AdvisorError>;

    /// Minimal round-trip; only a 2xx answer counts as a usable key.
    fn validate(&self, api_key: &str) -> Result<(), AdvisorError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Blocking client for an OpenAI-compatible chat-completions endpoint.
pub struct ChatClient {
    agent: ureq::Agent,
    config: AdvisorConfig,
}

impl ChatClient {
    pub fn new(config: AdvisorConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .build();

        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            config,
        }
    }

    fn suggestion_request<'a>(&'a self, context: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: context,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
        }
    }

    fn validation_request(&self) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: VALIDATION_PROMPT,
            }],
            max_tokens: VALIDATION_MAX_TOKENS,
            temperature: None,
        }
    }

    fn post(&self, api_key: &str, request: &ChatRequest<'_>) -> Result<(u16, String), AdvisorError> {
        let body =
            serde_json::to_string(request).map_err(|e| AdvisorError::Malformed(e.to_string()))?;

        debug!(endpoint = %self.config.endpoint, model = %self.config.model, "Calling advisor");

        let mut response = self
            .agent
            .post(&self.config.endpoint)
            .header("Authorization", &format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .send(body.as_str())
            .map_err(|e| AdvisorError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| AdvisorError::Transport(e.to_string()))?;

        debug!(status, bytes = text.len(), "Advisor responded");
        Ok((status, text))
    }
}

impl Advisor for ChatClient {
    fn suggest(&self, api_key: &str, context: &str) -> Result<String, AdvisorError> {
        let (status, body) = self.post(api_key, &self.suggestion_request(context))?;
        if !(200..300).contains(&status) {
            let error = AdvisorError::from_status(status, &body);
            warn!(status, error = %error, "Advisor request failed");
            return Err(error);
        }
        parse_suggestion(&body)
    }

    fn validate(&self, api_key: &str) -> Result<(), AdvisorError> {
        let (status, body) = self.post(api_key, &self.validation_request())?;
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(AdvisorError::from_status(status, &body))
        }
    }
}

fn parse_suggestion(body: &str) -> Result<String, AdvisorError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| AdvisorError::Malformed(e.to_string()))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty());

    Ok(content.unwrap_or_else(|| EMPTY_SUGGESTION.to_string()))
}

/// Pull `error.message` out of an error body, if there is one.
pub(super) fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()?
        .error?
        .message
        .filter(|m| !m.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestion_request_shape() {
        let client = ChatClient::new(AdvisorConfig::default());
        let json = serde_json::to_value(client.suggestion_request("Level: 40%")).unwrap();

        assert_eq!(json["model"], "llama-3.3-70b-versatile");
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "Level: 40%");
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_validation_request_is_minimal() {
        let client = ChatClient::new(AdvisorConfig::default());
        let json = serde_json::to_value(client.validation_request()).unwrap();

        assert_eq!(json["max_tokens"], 5);
        assert_eq!(json["messages"].as_array().map(Vec::len), Some(1));
        assert_eq!(json["messages"][0]["content"], "test");
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_parse_suggestion() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Unplug at 80%.  "}}]}"#;
        assert_eq!(parse_suggestion(body).unwrap(), "Unplug at 80%.");
    }

    #[test]
    fn test_parse_empty_choices_falls_back() {
        assert_eq!(
            parse_suggestion(r#"{"choices":[]}"#).unwrap(),
            "Unable to generate suggestion."
        );
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        assert!(matches!(
            parse_suggestion("not json"),
            Err(AdvisorError::Malformed(_))
        ));
    }
}
