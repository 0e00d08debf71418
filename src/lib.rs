pub mod api;
pub mod config;
pub mod error;
pub mod ffmpeg;
pub mod footage;
pub mod journal;
pub mod model;
pub mod pipeline;
pub mod serve;
pub mod subtitles;
pub mod timing;

pub use error::{PipelineError, Result};

pub(crate) fn logv(tag: &str, message: &str) {
    match tag {
        "WARN" => tracing::warn!("[{}] {}", tag, message),
        _ => tracing::info!("[{}] {}", tag, message),
    }
}

pub(crate) fn logi(message: impl AsRef<str>) {
    logv("INFO", message.as_ref());
}

pub(crate) fn logok(message: impl AsRef<str>) {
    logv("OK", message.as_ref());
}

pub(crate) fn logw(message: impl AsRef<str>) {
    logv("WARN", message.as_ref());
}

pub mod init;
