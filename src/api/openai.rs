use crate::api::ScriptWriter;
use crate::error::{PipelineError, Result};
use crate::{logi, logw};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

const OPENAI_BASE: &str = "https://api.openai.com";
const MAX_ARTICLE_BYTES: usize = 60_000;

const SCRIPT_PROMPT: &str = "Return a single JSON object with these keys:\n\
- tone: an array of the two adjectives that best describe the article's tone.\n\
- script: a narration of the article that reads aloud in about one minute. Conversational, no greeting, one paragraph, every sentence ends with '.', '?' or '!'.\n\
- visuals: one object per sentence of the script, in order, each with:\n\
  - description: about three simple keywords for background stock footage matching the sentence. Prefer general concepts over specific people.\n\
  - source: the script sentence the description was written for.";

fn trim_copy_utf8_safe(input: &str, max_bytes: usize) -> &str {
    if input.len() <= max_bytes {
        return input;
    }

    let mut cut = max_bytes;
    while cut > 0 && !input.is_char_boundary(cut) {
        cut -= 1;
    }
    &input[..cut]
}

fn openai_extract_message_content(resp_json: &str) -> Option<String> {
    let root: serde_json::Value = serde_json::from_str(resp_json).ok()?;

    if let Some(err) = root.get("error") {
        if let Some(msg) = err.get("message").and_then(|v| v.as_str()) {
            logw(format!("OpenAI error message: {}", msg));
        }
        if let Some(code) = err.get("code").and_then(|v| v.as_str()) {
            logw(format!("OpenAI error code: {}", code));
        }
        return None;
    }

    root.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(client: Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: OPENAI_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn complete(&self, article: &str) -> anyhow::Result<String> {
        let article = trim_copy_utf8_safe(article, MAX_ARTICLE_BYTES);
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SCRIPT_PROMPT},
                {"role": "user", "content": article},
            ],
        });

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(std::time::Duration::from_secs(600))
            .send()
            .await
            .context("OpenAI request failed")?;

        let status = resp.status();
        let raw = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            let snippet = raw.chars().take(800).collect::<String>();
            logw(format!("OpenAI raw body: {}", snippet));
            anyhow::bail!("OpenAI HTTP {}", status.as_u16());
        }

        openai_extract_message_content(&raw).context("OpenAI response had no message content")
    }
}

#[async_trait]
impl ScriptWriter for OpenAiClient {
    async fn write_script(&self, article: &str) -> Result<String> {
        let reply = self
            .complete(article)
            .await
            .map_err(|e| PipelineError::upstream("openai", e))?;
        logi(format!("Script reply received ({} bytes)", reply.len()));
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_on_char_boundary() {
        let text = "héllo";
        assert_eq!(trim_copy_utf8_safe(text, 2), "h");
        assert_eq!(trim_copy_utf8_safe(text, 3), "hé");
        assert_eq!(trim_copy_utf8_safe(text, 64), text);
    }

    #[test]
    fn extracts_first_choice_content() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"{\"script\":\"Hi.\"}"}}]}"#;
        assert_eq!(
            openai_extract_message_content(raw).as_deref(),
            Some(r#"{"script":"Hi."}"#)
        );
    }

    #[test]
    fn error_payload_yields_nothing() {
        let raw = r#"{"error":{"message":"bad key","code":"invalid_api_key"}}"#;
        assert!(openai_extract_message_content(raw).is_none());
        assert!(openai_extract_message_content("not json").is_none());
    }
}
