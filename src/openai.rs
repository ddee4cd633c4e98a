//! Minimal OpenAI client for our use-cases.
//!
//! We only call chat.completions and request plain text: once to turn a
//! topic into `Term: Definition` lines, once to suggest a lesson name
//! from sample cards. Calls are instrumented and log model names,
//! latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::util::fill_template;

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub fast_model: String,
  pub strong_model: String,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let fast_model =
      std::env::var("OPENAI_FAST_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let strong_model =
      std::env::var("OPENAI_STRONG_MODEL").unwrap_or_else(|_| "gpt-4o".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, fast_model, strong_model })
  }

  /// Plain-text chat completion. Both of our calls want raw text back.
  #[instrument(level = "info", skip(self, system, user), fields(model = %model))]
  async fn chat_plain(
    &self,
    model: &str,
    system: &str,
    user: &str,
    temperature: f32,
  ) -> Result<String, String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: model.to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
    };

    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "memodeck-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req)
      .send()
      .await
      .map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      return Err(format!("OpenAI HTTP {}: {}", status, msg));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body
      .choices
      .first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default()
      .trim()
      .to_string();

    Ok(text)
  }

  // --- High-level helpers (domain-specialized) ---

  /// Generate raw flashcard text for a topic. The caller parses and
  /// validates the lines; an empty or malformed response is its problem
  /// to surface.
  #[instrument(level = "info", skip(self, prompts, topic), fields(topic_len = topic.len(), model = %self.strong_model))]
  pub async fn generate_flashcards_text(
    &self,
    prompts: &Prompts,
    topic: &str,
  ) -> Result<String, String> {
    let user = fill_template(&prompts.generate_user_template, &[("topic", topic)]);
    let start = std::time::Instant::now();
    let result = self.chat_plain(&self.strong_model, &prompts.generate_system, &user, 0.9).await;
    let elapsed = start.elapsed();

    match &result {
      Ok(text) => {
        info!(?elapsed, lines = text.lines().count(), "Flashcard text generated")
      }
      Err(e) => error!(?elapsed, error = %e, "Model call failed during flashcard generation"),
    }
    result
  }

  /// Suggest a short lesson name from sample cards rendered as
  /// `Term: Definition` lines. Wrapping quotes are stripped; an empty
  /// suggestion is returned as-is for the caller's fallback.
  #[instrument(level = "info", skip(self, prompts, cards_block), fields(cards_len = cards_block.len(), model = %self.fast_model))]
  pub async fn suggest_lesson_name(
    &self,
    prompts: &Prompts,
    cards_block: &str,
  ) -> Result<String, String> {
    let user = fill_template(&prompts.name_user_template, &[("cards", cards_block)]);
    let name = self.chat_plain(&self.fast_model, &prompts.name_system, &user, 0.2).await?;
    Ok(strip_wrapping_quotes(&name).to_string())
  }
}

/// Models sometimes wrap a requested bare name in quotes anyway.
fn strip_wrapping_quotes(s: &str) -> &str {
  let s = s.trim();
  let stripped = s
    .strip_prefix('"')
    .and_then(|t| t.strip_suffix('"'))
    .or_else(|| s.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')));
  stripped.unwrap_or(s)
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
}
#[derive(Serialize)]
struct ChatMessageReq {
  role: String,
  content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)]
  usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice {
  message: ChatMessageResp,
}
#[derive(Deserialize)]
struct ChatMessageResp {
  content: Option<String>,
}
#[derive(Deserialize)]
struct Usage {
  #[serde(default)]
  prompt_tokens: Option<u32>,
  #[serde(default)]
  completion_tokens: Option<u32>,
  #[serde(default)]
  total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    error: EObj,
  }
  #[derive(Deserialize)]
  struct EObj {
    message: String,
  }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wrapping_quotes_are_stripped_once() {
    assert_eq!(strip_wrapping_quotes("\"Cell Biology\""), "Cell Biology");
    assert_eq!(strip_wrapping_quotes("'Cell Biology'"), "Cell Biology");
    assert_eq!(strip_wrapping_quotes("  Plain Name "), "Plain Name");
    assert_eq!(strip_wrapping_quotes("\"unbalanced"), "\"unbalanced");
  }

  #[test]
  fn error_body_extraction() {
    let body = r#"{"error": {"message": "model overloaded"}}"#;
    assert_eq!(extract_openai_error(body).as_deref(), Some("model overloaded"));
    assert!(extract_openai_error("plain text").is_none());
  }
}
