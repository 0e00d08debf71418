use crate::api::{SpeechSynthesizer, Voice};
use crate::error::{PipelineError, Result};
use crate::model::AudioData;
use crate::{logi, logw};
use anyhow::Context;
use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;

const ELEVENLABS_BASE: &str = "https://api.elevenlabs.io";

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<VoiceEntry>,
}

#[derive(Debug, Deserialize)]
struct VoiceEntry {
    voice_id: String,
    #[serde(default)]
    name: Option<String>,
}

pub struct ElevenLabsClient {
    client: Client,
    api_key: String,
    model_id: String,
    base_url: String,
}

impl ElevenLabsClient {
    pub fn new(client: Client, api_key: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model_id: model_id.into(),
            base_url: ELEVENLABS_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn list_voices(&self) -> anyhow::Result<Vec<Voice>> {
        let resp = self
            .client
            .get(self.url("/v1/voices"))
            .header("xi-api-key", &self.api_key)
            .send()
            .await
            .context("ElevenLabs voices request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("ElevenLabs voices HTTP {}", resp.status().as_u16());
        }

        let body: VoicesResponse = resp.json().await.context("ElevenLabs voices parse failed")?;
        Ok(body
            .voices
            .into_iter()
            .map(|v| Voice {
                name: v.name.unwrap_or_else(|| v.voice_id.clone()),
                voice_id: v.voice_id,
            })
            .collect())
    }

    async fn convert_with_timestamps(&self, voice_id: &str, text: &str) -> anyhow::Result<AudioData> {
        let url = self.url(&format!("/v1/text-to-speech/{voice_id}/with-timestamps"));
        let body = serde_json::json!({
            "text": text,
            "model_id": self.model_id,
        });

        let resp = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .timeout(std::time::Duration::from_secs(300))
            .send()
            .await
            .context("ElevenLabs request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let raw = resp.text().await.unwrap_or_default();
            let snippet = raw.chars().take(400).collect::<String>();
            logw(format!("ElevenLabs TTS failed HTTP {}: {}", status.as_u16(), snippet));
            anyhow::bail!("ElevenLabs TTS HTTP {}", status.as_u16());
        }

        resp.json::<AudioData>()
            .await
            .context("ElevenLabs response parse failed")
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn pick_voice(&self) -> Result<Voice> {
        let mut voices = self
            .list_voices()
            .await
            .map_err(|e| PipelineError::upstream("elevenlabs", e))?;

        if voices.is_empty() {
            return Err(PipelineError::upstream(
                "elevenlabs",
                anyhow::anyhow!("account has no voices"),
            ));
        }

        let idx = rand::thread_rng().gen_range(0..voices.len());
        let voice = voices.swap_remove(idx);
        logi(format!("Voice: {} ({})", voice.name, voice.voice_id));
        Ok(voice)
    }

    async fn synthesize(&self, voice: &Voice, text: &str) -> Result<AudioData> {
        let audio = self
            .convert_with_timestamps(&voice.voice_id, text)
            .await
            .map_err(|e| PipelineError::upstream("elevenlabs", e))?;
        audio.alignment.validate()?;
        Ok(audio)
    }
}
