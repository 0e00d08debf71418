use crate::api::elevenlabs::ElevenLabsClient;
use crate::api::openai::OpenAiClient;
use crate::api::pexels::PexelsClient;
use crate::api::{EncodeRequest, FootageSource, ScriptWriter, SpeechSynthesizer, SubtitleRenderer, VideoEncoder};
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::ffmpeg::FfmpegEncoder;
use crate::init;
use crate::journal::Journal;
use crate::model::Script;
use crate::subtitles::CommandSubtitleRenderer;
use crate::timing;
use crate::{logi, logok, logw};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::path::PathBuf;
use tokio::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Clean,
    ScriptGenerated,
    FootageAssigned,
    AudioSynthesized,
    AudioSaved,
    DurationsComputed,
    VideoEncoded,
    SubtitlesRendered,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Clean => "clean",
            Stage::ScriptGenerated => "script-generated",
            Stage::FootageAssigned => "footage-assigned",
            Stage::AudioSynthesized => "audio-synthesized",
            Stage::AudioSaved => "audio-saved",
            Stage::DurationsComputed => "durations-computed",
            Stage::VideoEncoded => "video-encoded",
            Stage::SubtitlesRendered => "subtitles-rendered",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Where a run reads its article and writes its artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub article: PathBuf,
    pub out_dir: PathBuf,
}

impl RunPaths {
    pub fn new(article: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            article: article.into(),
            out_dir: out_dir.into(),
        }
    }

    pub fn journal(&self) -> PathBuf {
        self.out_dir.join("source.json")
    }

    pub fn clips_dir(&self) -> PathBuf {
        self.out_dir.join("clips")
    }

    /// Clip files are numbered from 1 in narration order.
    pub fn clip(&self, index: usize) -> PathBuf {
        self.clips_dir().join(format!("{}.mp4", index + 1))
    }

    pub fn audio(&self) -> PathBuf {
        self.out_dir.join("voice.mp3")
    }

    pub fn video(&self) -> PathBuf {
        self.out_dir.join("video.mp4")
    }

    pub fn subtitled(&self) -> PathBuf {
        self.out_dir.join("subtitled.mp4")
    }
}

pub struct Pipeline {
    paths: RunPaths,
    journal: Journal,
    writer: Box<dyn ScriptWriter>,
    footage: Box<dyn FootageSource>,
    speech: Box<dyn SpeechSynthesizer>,
    encoder: Box<dyn VideoEncoder>,
    subtitles: Option<Box<dyn SubtitleRenderer>>,
    stage: Stage,
}

impl Pipeline {
    pub fn new(
        paths: RunPaths,
        writer: Box<dyn ScriptWriter>,
        footage: Box<dyn FootageSource>,
        speech: Box<dyn SpeechSynthesizer>,
        encoder: Box<dyn VideoEncoder>,
    ) -> Self {
        Self {
            journal: Journal::new(paths.journal()),
            paths,
            writer,
            footage,
            speech,
            encoder,
            subtitles: None,
            stage: Stage::Clean,
        }
    }

    /// Enables the caption stage; without it `SubtitlesRendered` is skipped.
    pub fn with_subtitles(mut self, renderer: Box<dyn SubtitleRenderer>) -> Self {
        self.subtitles = Some(renderer);
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, stage: Stage) {
        debug_assert!(stage > self.stage, "stage {stage} after {}", self.stage);
        self.stage = stage;
        logi(format!("Stage: {stage}"));
    }

    /// Runs every stage in order and returns the final video path.
    pub async fn run(&mut self) -> Result<PathBuf> {
        self.stage = Stage::Clean;
        init::clean_output(&self.paths.out_dir).await?;

        let mut script = self.generate_script().await?;
        self.advance(Stage::ScriptGenerated);

        let clips = self.assign_footage(&mut script).await?;
        self.advance(Stage::FootageAssigned);

        logi("Generating voice...");
        let voice = self.speech.pick_voice().await?;
        script.voice_name = Some(voice.name.clone());
        self.journal.save(&script).await?;
        let audio = self.speech.synthesize(&voice, &script.script).await?;
        self.advance(Stage::AudioSynthesized);

        logi("Saving audio...");
        let audio_file = self.paths.audio();
        let bytes = STANDARD
            .decode(audio.audio_base64.trim())
            .map_err(|e| PipelineError::upstream("elevenlabs", anyhow::anyhow!("audio is not base64: {e}")))?;
        fs::write(&audio_file, bytes)
            .await
            .map_err(|e| PipelineError::io(&audio_file, e))?;
        self.advance(Stage::AudioSaved);

        logi("Mapping audio to clips...");
        let ends = timing::map_sentence_boundaries(&audio.alignment, script.visuals.len());
        for (segment, end) in script.visuals.iter_mut().zip(&ends) {
            segment.end = *end;
        }
        self.journal.save(&script).await?;
        let ends = timing::resolve_segment_ends(&ends)?;
        self.advance(Stage::DurationsComputed);

        logi("Encoding video...");
        let request = EncodeRequest {
            clips,
            ends,
            audio: audio_file,
            output: self.paths.video(),
        };
        let mut output = self.encoder.encode(&request).await?;
        self.advance(Stage::VideoEncoded);

        if let Some(renderer) = &self.subtitles {
            logi("Adding subtitles...");
            let words = timing::extract_words(&audio.alignment);
            output = renderer.render(&output, &words).await?;
        }
        self.advance(Stage::SubtitlesRendered);

        self.advance(Stage::Done);
        logok(format!("Saved video at: {}", output.display()));
        Ok(output)
    }

    async fn generate_script(&self) -> Result<Script> {
        logi("Reading article...");
        let article = fs::read_to_string(&self.paths.article)
            .await
            .map_err(|source| PipelineError::InputMissing {
                path: self.paths.article.clone(),
                source,
            })?;

        logi("Generating script...");
        let raw = self.writer.write_script(&article).await?;
        self.journal.save_raw(&raw).await?;
        let script = Script::from_llm_reply(&raw)?;
        logi(format!(
            "Script has {} visuals, tone {:?}",
            script.visuals.len(),
            script.tone
        ));
        self.journal.save(&script).await?;
        Ok(script)
    }

    async fn assign_footage(&self, script: &mut Script) -> Result<Vec<PathBuf>> {
        logi("Searching b-roll footage...");
        let mut assets = Vec::with_capacity(script.visuals.len());
        for segment in script.visuals.iter_mut() {
            let asset = self.footage.search(&segment.description).await?;
            segment.video = Some(asset.clone());
            assets.push(asset);
        }

        let mut clips = Vec::with_capacity(assets.len());
        for (idx, asset) in assets.iter().enumerate() {
            let dest = self.paths.clip(idx);
            self.footage.download(asset, &dest).await?;
            clips.push(dest);
        }

        self.journal.save(script).await?;
        Ok(clips)
    }
}

/// Builds the real collaborators from the environment and runs one video.
pub async fn run_generation() -> Result<PathBuf> {
    let cfg = Config::from_env().map_err(PipelineError::Config)?;

    if !init::check_ffmpeg().await {
        logw("FFmpeg not found in PATH. Please install FFmpeg.");
    }

    let client = reqwest::Client::builder()
        .build()
        .map_err(|e| PipelineError::Config(anyhow::anyhow!("failed to build HTTP client: {e}")))?;

    let paths = RunPaths::new(&cfg.article_path, &cfg.out_dir);
    let subtitled = paths.subtitled();

    let mut pipeline = Pipeline::new(
        paths,
        Box::new(OpenAiClient::new(client.clone(), &cfg.openai_key, &cfg.openai_model)),
        Box::new(PexelsClient::new(client.clone(), &cfg.pexels_key)),
        Box::new(ElevenLabsClient::new(client, &cfg.elevenlabs_key, &cfg.eleven_model_id)),
        Box::new(FfmpegEncoder),
    );

    if cfg.subtitles {
        pipeline = pipeline.with_subtitles(Box::new(CommandSubtitleRenderer::new(
            cfg.subtitle_renderer.clone(),
            cfg.subtitle_server_port,
            subtitled,
        )));
    }

    pipeline.run().await
}
