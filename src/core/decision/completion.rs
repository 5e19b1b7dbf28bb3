//! External completion provider client for the primary decision path.
//!
//! Talks to an OpenAI-compatible chat-completions endpoint. The instruction
//! set constrains the model to emit exactly one next-action JSON object; the
//! response is parsed strictly against the `NextAction` schema and anything
//! that does not validate is reported as an error for the engine to absorb.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::contracts::{NextAction, TurnRequest};

const SYSTEM_PROMPT: &str = "\
You are the turn-decision engine of a phone receptionist for a business. \
Given the caller's latest utterance and the business context, respond with \
exactly one JSON object and nothing else. The object must have one of these \
shapes:\n\
{\"type\":\"speak\",\"text\":\"...\"}\n\
{\"type\":\"tool_call\",\"tool_name\":\"...\",\"tool_args\":{...},\"idempotency_key\":\"...\"}\n\
{\"type\":\"handoff\",\"reason\":\"...\"}\n\
{\"type\":\"end_call\",\"reason\":\"...\"}\n\
Do not wrap the object in markdown fences. Do not add commentary.";

/// Why the primary path failed. Every variant routes to the fallback; the
/// distinction only matters for logging.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion response had no content")]
    MissingContent,

    #[error("completion output failed next-action validation: {0}")]
    InvalidAction(String),
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Client for the completion provider. Constructed once at startup when a
/// credential is configured; `None` otherwise, which pins the engine to the
/// fallback path.
pub struct CompletionClient {
    api_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl CompletionClient {
    pub fn new(api_url: String, api_key: String, model: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_url,
            api_key,
            model,
            client,
        }
    }

    /// Requests one next action for the turn. A single attempt; the caller
    /// decides what a failure means.
    pub async fn next_action(&self, request: &TurnRequest) -> Result<NextAction, CompletionError> {
        let user_prompt = build_user_prompt(request);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200).to_string(),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or(CompletionError::MissingContent)?;

        parse_action(content)
    }
}

/// Parses the model output into a `NextAction`, tolerating markdown fences
/// the instruction set forbids but models sometimes emit anyway.
pub fn parse_action(content: &str) -> Result<NextAction, CompletionError> {
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    serde_json::from_str(trimmed).map_err(|e| CompletionError::InvalidAction(e.to_string()))
}

fn build_user_prompt(request: &TurnRequest) -> String {
    let mut prompt = String::new();

    if let Some(profile) = &request.context.business_profile {
        prompt.push_str(&format!("Business: {}\n", profile.name));
        if let Some(tz) = &profile.timezone {
            prompt.push_str(&format!("Timezone: {tz}\n"));
        }
        if let Some(hours) = &profile.hours {
            prompt.push_str(&format!("Hours: {hours}\n"));
        }
    }

    if !request.context.faq_items.is_empty() {
        prompt.push_str("FAQ:\n");
        for item in &request.context.faq_items {
            prompt.push_str(&format!("Q: {}\nA: {}\n", item.q, item.a));
        }
    }

    prompt.push_str(&format!(
        "Turn {turn} of call {call}.\nCaller said: {text}\n",
        turn = request.turn_id,
        call = request.call_id,
        text = request.caller_input.text
    ));

    prompt
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_action() {
        let action = parse_action(r#"{"type":"speak","text":"Hello there"}"#).unwrap();
        assert_eq!(
            action,
            NextAction::Speak {
                text: "Hello there".to_string()
            }
        );
    }

    #[test]
    fn test_parse_fenced_action() {
        let content = "```json\n{\"type\":\"handoff\",\"reason\":\"complex_request\"}\n```";
        let action = parse_action(content).unwrap();
        assert!(matches!(action, NextAction::Handoff { .. }));
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert!(matches!(
            parse_action("I think the caller wants to book."),
            Err(CompletionError::InvalidAction(_))
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_variant() {
        assert!(parse_action(r#"{"type":"transfer","target":"+1555"}"#).is_err());
    }

    #[test]
    fn test_user_prompt_includes_context() {
        use crate::contracts::{BusinessProfile, CallerInput, FaqItem, TurnContext};

        let request = TurnRequest {
            trace_id: None,
            tenant_id: "tenant_abc".to_string(),
            call_id: "c1".to_string(),
            turn_id: "t3".to_string(),
            caller_input: CallerInput {
                kind: "speech".to_string(),
                text: "when do you open".to_string(),
            },
            context: TurnContext {
                from_number: None,
                to_number: None,
                business_profile: Some(BusinessProfile {
                    name: "Evergreen Plumbing".to_string(),
                    timezone: Some("America/Los_Angeles".to_string()),
                    industry: None,
                    hours: Some("Mon-Fri 8-5".to_string()),
                }),
                faq_items: vec![FaqItem {
                    q: "Do you do emergency work?".to_string(),
                    a: "Yes, 24/7.".to_string(),
                }],
            },
        };

        let prompt = build_user_prompt(&request);
        assert!(prompt.contains("Evergreen Plumbing"));
        assert!(prompt.contains("Mon-Fri 8-5"));
        assert!(prompt.contains("emergency work"));
        assert!(prompt.contains("when do you open"));
        assert!(prompt.contains("Turn t3 of call c1"));
    }
}
