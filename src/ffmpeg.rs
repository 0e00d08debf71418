use crate::api::{EncodeRequest, VideoEncoder};
use crate::error::{PipelineError, Result};
use crate::logi;
use crate::timing::clip_durations;
use anyhow::Context;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

pub const OUTPUT_WIDTH: u32 = 1080;
pub const OUTPUT_HEIGHT: u32 = 1920;

async fn run_cmd(args: &[String]) -> anyhow::Result<()> {
    if args.is_empty() {
        return Ok(());
    }

    let mut cmd = Command::new(&args[0]);
    if args.len() > 1 {
        cmd.args(&args[1..]);
    }

    let status = cmd.status().await.context("Command execution failed")?;
    if !status.success() {
        return Err(anyhow::anyhow!("Command failed ({}): {:?}", status, args));
    }

    Ok(())
}

fn clip_filter(index: usize, duration: f64) -> String {
    format!(
        "[{index}:v]trim=duration={duration:.3},scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,setpts=PTS-STARTPTS[v{index}];",
        w = OUTPUT_WIDTH,
        h = OUTPUT_HEIGHT,
    )
}

/// Full ffmpeg argv that trims each clip to its segment, letterboxes it to
/// portrait and lays the narration under the concatenation.
pub fn build_encode_args(clips: &[PathBuf], ends: &[f64], audio: &Path, output: &Path) -> Vec<String> {
    let mut args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
    ];

    for clip in clips {
        args.push("-i".to_string());
        args.push(clip.display().to_string());
    }
    args.push("-i".to_string());
    args.push(audio.display().to_string());

    let mut filters = String::new();
    let mut streams = String::new();
    for (index, duration) in clip_durations(ends).into_iter().enumerate() {
        filters.push_str(&clip_filter(index, duration));
        streams.push_str(&format!("[v{index}]"));
    }
    filters.push_str(&format!("{}concat=n={}:v=1:a=0[concatv]", streams, clips.len()));

    args.extend([
        "-filter_complex".to_string(),
        filters,
        "-map".to_string(),
        "[concatv]".to_string(),
        "-map".to_string(),
        format!("{}:a", clips.len()),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        "192k".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        output.display().to_string(),
    ]);
    args
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegEncoder;

#[async_trait]
impl VideoEncoder for FfmpegEncoder {
    async fn encode(&self, request: &EncodeRequest) -> Result<PathBuf> {
        if request.clips.len() != request.ends.len() {
            return Err(PipelineError::EncodingFailure(anyhow::anyhow!(
                "{} clips but {} segment end times",
                request.clips.len(),
                request.ends.len()
            )));
        }

        let args = build_encode_args(&request.clips, &request.ends, &request.audio, &request.output);
        logi(format!(
            "Encoding {} clips + narration -> {}",
            request.clips.len(),
            request.output.display()
        ));
        run_cmd(&args).await.map_err(PipelineError::EncodingFailure)?;

        if !request.output.exists() {
            return Err(PipelineError::EncodingFailure(anyhow::anyhow!(
                "ffmpeg exited cleanly but {} is missing",
                request.output.display()
            )));
        }
        Ok(request.output.clone())
    }
}
