use crate::api::SubtitleRenderer;
use crate::error::{PipelineError, Result};
use crate::model::Word;
use crate::serve::StaticServer;
use crate::{logi, logok};
use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;

#[derive(Serialize)]
struct RenderInput<'a> {
    video: &'a str,
    words: &'a [Word],
}

/// Burns captions in by handing the served video and word timings to an
/// external renderer command.
pub struct CommandSubtitleRenderer {
    command: Vec<String>,
    port: u16,
    output: PathBuf,
}

impl CommandSubtitleRenderer {
    pub fn new(command: Vec<String>, port: u16, output: impl Into<PathBuf>) -> Self {
        Self {
            command,
            port,
            output: output.into(),
        }
    }

    pub fn renderer_args(&self, video_url: &str, words_path: &Path) -> Vec<String> {
        let mut args = self.command.clone();
        args.extend([
            "--video".to_string(),
            video_url.to_string(),
            "--words".to_string(),
            words_path.display().to_string(),
            "--output".to_string(),
            self.output.display().to_string(),
        ]);
        args
    }

    async fn run(&self, video: &Path, words: &[Word]) -> anyhow::Result<PathBuf> {
        let serve_dir = video
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name = video
            .file_name()
            .and_then(|n| n.to_str())
            .context("video path has no file name")?;

        let server = StaticServer::start(serve_dir, self.port).await?;
        let video_url = server.url_for(file_name);

        let words_path = serve_dir.join("words.json");
        let payload = serde_json::to_vec_pretty(&RenderInput {
            video: &video_url,
            words,
        })?;
        fs::write(&words_path, payload)
            .await
            .with_context(|| format!("failed to write {}", words_path.display()))?;

        let args = self.renderer_args(&video_url, &words_path);
        logi(format!("Rendering {} caption words via {}", words.len(), args[0]));
        let status = Command::new(&args[0])
            .args(&args[1..])
            .status()
            .await
            .with_context(|| format!("failed to start renderer {:?}", args[0]));

        server.shutdown().await?;
        let status = status?;
        if !status.success() {
            anyhow::bail!("renderer exited with {}", status);
        }
        if !self.output.exists() {
            anyhow::bail!("renderer did not produce {}", self.output.display());
        }
        Ok(self.output.clone())
    }
}

#[async_trait]
impl SubtitleRenderer for CommandSubtitleRenderer {
    async fn render(&self, video: &Path, words: &[Word]) -> Result<PathBuf> {
        if self.command.is_empty() {
            return Err(PipelineError::RenderFailure(anyhow::anyhow!("no renderer command configured")));
        }
        let out = self.run(video, words).await.map_err(PipelineError::RenderFailure)?;
        logok(format!("Subtitled video: {}", out.display()));
        Ok(out)
    }
}
