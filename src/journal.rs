use crate::error::{PipelineError, Result};
use crate::model::Script;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Debug snapshot of the run, rewritten after each stage.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stores the language model's reply verbatim, before it is parsed.
    pub async fn save_raw(&self, raw: &str) -> Result<()> {
        self.write(raw.as_bytes()).await
    }

    pub async fn save(&self, script: &Script) -> Result<()> {
        let json = serde_json::to_vec_pretty(script)
            .map_err(|e| PipelineError::io(&self.path, std::io::Error::other(e)))?;
        self.write(&json).await
    }

    async fn write(&self, data: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::io(parent, e))?;
        }
        fs::write(&self.path, data)
            .await
            .map_err(|e| PipelineError::io(&self.path, e))
    }
}
