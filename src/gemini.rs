//! Client for the Google Gemini generative-language REST API.
//!
//! Two call shapes: one-shot `generateContent` for the consultation question
//! and the edit chat, and `streamGenerateContent` (SSE) for game code
//! generation. Thinking budget is pinned to 0 on every call.

use futures_util::StreamExt;
use log::info;
use serde_json::{json, Value};
use std::time::Duration;

use crate::assets::{restore_data_payloads, tokenize_data_payloads};
use crate::extract::clean_generated_code;
use crate::models::ChatReply;
use crate::prompts::{
    build_consultation_prompt, build_edit_prompt, FALLBACK_QUESTION, GENERATION_BANNER,
};
use crate::settings::pick_api_key;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Request-local deadline for the consultation call. On expiry the call is
/// abandoned and reported as an error, never retried.
const CONSULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Chat reply when the model returned a complete document.
const EDIT_APPLIED_MESSAGE: &str = "Đã sửa code!";

fn request_body(prompt: &str, temperature: Option<f64>) -> Value {
    let mut config = json!({ "thinkingConfig": { "thinkingBudget": 0 } });
    if let Some(t) = temperature {
        config["temperature"] = json!(t);
    }
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": config
    })
}

/// First text part of the first candidate, if any.
fn response_text(value: &Value) -> Option<String> {
    value["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(|s| s.to_string())
}

async fn generate_content(
    prompt: &str,
    temperature: Option<f64>,
    timeout: Option<Duration>,
) -> Result<String, String> {
    let api_key = pick_api_key()?;

    let mut builder = reqwest::Client::builder();
    if let Some(t) = timeout {
        builder = builder.timeout(t);
    }
    let client = builder
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

    let response = client
        .post(format!("{}/{}:generateContent", GEMINI_BASE_URL, GEMINI_MODEL))
        .header("x-goog-api-key", api_key)
        .header("Content-Type", "application/json")
        .json(&request_body(prompt, temperature))
        .send()
        .await
        .map_err(|e| format!("API request failed: {}", e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("API error {}: {}", status, body));
    }

    let value: Value = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))?;
    Ok(response_text(&value).unwrap_or_default())
}

/// Ask the model for ONE clarifying question about the game mechanics.
///
/// Empty model output falls back to a canned question; transport errors
/// propagate so the orchestrator can take the no-consultation path.
pub async fn consult_game_logic(idea: &str, age_group: &str) -> Result<String, String> {
    let prompt = build_consultation_prompt(idea, age_group);
    let text = generate_content(&prompt, Some(0.7), Some(CONSULT_TIMEOUT)).await?;
    if text.trim().is_empty() {
        Ok(FALLBACK_QUESTION.to_string())
    } else {
        Ok(text)
    }
}

/// Stream the game generation.
///
/// `on_update` receives the full accumulated raw text after every chunk, so
/// observers always see a growing prefix of the final stream. Extraction is
/// the caller's job and happens once, after the stream ends.
pub async fn generate_game_code_stream<F>(prompt: &str, mut on_update: F) -> Result<String, String>
where
    F: FnMut(&str),
{
    let mut full_text = String::from(GENERATION_BANNER);
    on_update(&full_text);

    let api_key = pick_api_key()?;
    let client = reqwest::Client::new();
    let response = client
        .post(format!(
            "{}/{}:streamGenerateContent",
            GEMINI_BASE_URL, GEMINI_MODEL
        ))
        .query(&[("alt", "sse")])
        .header("x-goog-api-key", api_key)
        .header("Content-Type", "application/json")
        .json(&request_body(prompt, Some(0.6)))
        .send()
        .await
        .map_err(|e| format!("API request failed: {}", e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("API error {}: {}", status, body));
    }

    let mut stream = response.bytes_stream();
    let mut buffer = String::new();

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| format!("Stream error: {}", e))?;
        buffer.push_str(&String::from_utf8_lossy(&chunk));
        drain_sse_lines(&mut buffer, &mut full_text, &mut on_update);
    }

    info!(
        "[generate_game_code_stream] stream complete, {} chars",
        full_text.len()
    );
    Ok(full_text)
}

/// Process every complete SSE line sitting in `buffer`, appending each text
/// delta to `full_text` and pushing the grown prefix to the observer.
fn drain_sse_lines<F>(buffer: &mut String, full_text: &mut String, on_update: &mut F)
where
    F: FnMut(&str),
{
    while let Some(line_end) = buffer.find('\n') {
        let line = buffer[..line_end].trim().to_string();
        *buffer = buffer[line_end + 1..].to_string();

        if let Some(text) = parse_sse_data_line(&line) {
            full_text.push_str(&text);
            on_update(full_text.as_str());
        }
    }
}

/// Text delta carried by one SSE `data:` line, if any.
fn parse_sse_data_line(line: &str) -> Option<String> {
    let json_str = line.strip_prefix("data: ")?;
    if json_str == "[DONE]" {
        return None;
    }
    let value: Value = serde_json::from_str(json_str).ok()?;
    response_text(&value)
}

/// Run one edit-chat turn over the current artifact.
///
/// Payloads are tokenized out before the prompt is built and restored into
/// the cleaned reply, so the round-trip cost is independent of how much
/// audio is embedded. A reply that cleans to a complete document replaces
/// the artifact; anything else is a conversational answer.
pub async fn send_chat_edit(current_code: &str, instruction: &str) -> Result<ChatReply, String> {
    let (tokenized, payload_map) = tokenize_data_payloads(current_code);
    let prompt = build_edit_prompt(&tokenized, instruction);

    let raw = generate_content(&prompt, None, None).await?;
    let cleaned = restore_data_payloads(&clean_generated_code(&raw), &payload_map);

    if cleaned.starts_with("<!DOCTYPE") {
        Ok(ChatReply {
            text: EDIT_APPLIED_MESSAGE.to_string(),
            new_code: Some(cleaned),
        })
    } else {
        Ok(ChatReply {
            text: raw,
            new_code: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_pins_thinking_budget() {
        let body = request_body("xin chào", None);
        assert_eq!(
            body["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            0
        );
        assert_eq!(body["contents"][0]["parts"][0]["text"], "xin chào");
        assert!(body["generationConfig"].get("temperature").is_none());
    }

    #[test]
    fn request_body_sets_temperature_when_given() {
        let body = request_body("p", Some(0.6));
        assert_eq!(body["generationConfig"]["temperature"], 0.6);
    }

    #[test]
    fn parses_sse_text_delta() {
        let line = r#"data: {"candidates":[{"content":{"parts":[{"text":"<canvas"}]}}]}"#;
        assert_eq!(parse_sse_data_line(line).as_deref(), Some("<canvas"));
    }

    #[test]
    fn ignores_non_data_and_done_lines() {
        assert!(parse_sse_data_line("event: ping").is_none());
        assert!(parse_sse_data_line("data: [DONE]").is_none());
        assert!(parse_sse_data_line("data: not json").is_none());
        assert!(parse_sse_data_line("").is_none());
    }

    #[test]
    fn observer_sees_a_prefix_chain() {
        // two network chunks, the second splitting an SSE line in half
        let chunks = [
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"<!DOCTYPE html>\"}]}}]}\n\
             data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"<html>\"}]}}]}\ndata: {\"cand",
            "idates\":[{\"content\":{\"parts\":[{\"text\":\"</html>\"}]}}]}\n",
        ];

        let mut buffer = String::new();
        let mut full_text = String::from(GENERATION_BANNER);
        let mut observed: Vec<String> = vec![full_text.clone()];

        for chunk in chunks {
            buffer.push_str(chunk);
            drain_sse_lines(&mut buffer, &mut full_text, &mut |partial: &str| {
                observed.push(partial.to_string())
            });
        }

        assert_eq!(observed.len(), 4);
        for pair in observed.windows(2) {
            assert!(pair[1].starts_with(&pair[0]));
        }
        assert_eq!(
            full_text,
            format!("{}<!DOCTYPE html><html></html>", GENERATION_BANNER)
        );
    }

    #[test]
    fn response_text_reads_first_candidate() {
        let value = serde_json::json!({
            "candidates": [
                { "content": { "parts": [{ "text": "câu hỏi?" }] } },
                { "content": { "parts": [{ "text": "bỏ qua" }] } }
            ]
        });
        assert_eq!(response_text(&value).as_deref(), Some("câu hỏi?"));
    }
}
