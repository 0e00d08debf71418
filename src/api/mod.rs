//! Network and process collaborators the pipeline drives.
//!
//! The orchestrator only sees these traits; each concrete client owns its
//! own credentials and HTTP client.

use crate::error::Result;
use crate::model::{AudioData, FootageAsset, Word};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub mod elevenlabs;
pub mod openai;
pub mod pexels;

#[async_trait]
pub trait ScriptWriter: Send + Sync {
    /// Returns the model's raw reply; parsing is left to [`crate::model::Script::from_llm_reply`].
    async fn write_script(&self, article: &str) -> Result<String>;
}

#[async_trait]
pub trait FootageSource: Send + Sync {
    async fn search(&self, query: &str) -> Result<FootageAsset>;
    async fn download(&self, asset: &FootageAsset, dest: &Path) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn pick_voice(&self) -> Result<Voice>;
    async fn synthesize(&self, voice: &Voice, text: &str) -> Result<AudioData>;
}

/// Inputs for the final concatenation.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeRequest {
    pub clips: Vec<PathBuf>,
    pub ends: Vec<f64>,
    pub audio: PathBuf,
    pub output: PathBuf,
}

#[async_trait]
pub trait VideoEncoder: Send + Sync {
    async fn encode(&self, request: &EncodeRequest) -> Result<PathBuf>;
}

#[async_trait]
pub trait SubtitleRenderer: Send + Sync {
    async fn render(&self, video: &Path, words: &[Word]) -> Result<PathBuf>;
}
