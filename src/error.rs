use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Every way a run can fail. None of these are recovered inside a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[source] anyhow::Error),

    #[error("failed to read article {}", path.display())]
    InputMissing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{service} request failed")]
    UpstreamApi {
        service: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("no footage found for query {query:?}")]
    NoFootageFound { query: String },

    #[error("language model output could not be parsed: {reason}")]
    ParseFailure { reason: String },

    #[error("segments {missing:?} have no sentence boundary in the narration")]
    UnderDeterminedSegments { missing: Vec<usize> },

    #[error("segments {empty:?} would play for less than a millisecond")]
    EmptySegments { empty: Vec<usize> },

    #[error("ffmpeg encoding failed")]
    EncodingFailure(#[source] anyhow::Error),

    #[error("subtitle rendering failed")]
    RenderFailure(#[source] anyhow::Error),

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    pub fn upstream(service: &'static str, source: anyhow::Error) -> Self {
        Self::UpstreamApi { service, source }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(reason: impl Into<String>) -> Self {
        Self::ParseFailure {
            reason: reason.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_exit_with_two() {
        let err = PipelineError::Config(anyhow::anyhow!("PEXELS_API_KEY missing"));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(PipelineError::parse("empty reply").exit_code(), 1);
    }

    #[test]
    fn messages_name_the_failure() {
        let err = PipelineError::UnderDeterminedSegments { missing: vec![1, 2] };
        assert_eq!(
            err.to_string(),
            "segments [1, 2] have no sentence boundary in the narration"
        );

        let err = PipelineError::EmptySegments { empty: vec![1] };
        assert_eq!(err.to_string(), "segments [1] would play for less than a millisecond");

        let err = PipelineError::NoFootageFound {
            query: "city skyline night".to_string(),
        };
        assert!(err.to_string().contains("city skyline night"));
    }
}
