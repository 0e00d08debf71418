use crate::error::{PipelineError, Result};
use crate::logi;
use std::path::Path;
use tokio::fs;
use walkdir::WalkDir;

/// Empties `out_dir` and recreates it together with its `clips/` folder.
pub async fn clean_output(out_dir: &Path) -> Result<()> {
    logi("Clearing previous output...");
    if fs::metadata(out_dir).await.map(|m| m.is_dir()).unwrap_or(false) {
        for entry in WalkDir::new(out_dir).min_depth(1).contents_first(true) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(out_dir).to_path_buf();
                PipelineError::io(path, e.into())
            })?;
            let path = entry.path();
            let removed = if entry.file_type().is_dir() {
                fs::remove_dir(path).await
            } else {
                fs::remove_file(path).await
            };
            removed.map_err(|e| PipelineError::io(path, e))?;
        }
    }

    let clips = out_dir.join("clips");
    fs::create_dir_all(&clips)
        .await
        .map_err(|e| PipelineError::io(&clips, e))?;
    Ok(())
}

pub async fn check_ffmpeg() -> bool {
    match tokio::process::Command::new("ffmpeg")
        .arg("-version")
        .output()
        .await
    {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn removes_previous_run_and_recreates_clips() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(out.join("clips")).await.unwrap();
        fs::write(out.join("clips").join("1.mp4"), b"old").await.unwrap();
        fs::write(out.join("source.json"), b"{}").await.unwrap();

        clean_output(&out).await.unwrap();

        assert!(out.join("clips").is_dir());
        assert!(!out.join("source.json").exists());
        assert!(!out.join("clips").join("1.mp4").exists());
    }

    #[tokio::test]
    async fn creates_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("fresh");
        clean_output(&out).await.unwrap();
        assert!(out.join("clips").is_dir());
    }
}
