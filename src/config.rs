use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_key: String,
    pub openai_model: String,
    pub elevenlabs_key: String,
    pub eleven_model_id: String,
    pub pexels_key: String,
    pub subtitles: bool,
    pub article_path: PathBuf,
    pub out_dir: PathBuf,
    pub subtitle_server_port: u16,
    pub subtitle_renderer: Vec<String>,
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_renderer() -> &'static str {
    "node subtitles/render.mjs"
}

impl Config {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
                _ => anyhow::bail!("{key} missing"),
            }
        };

        let openai_key = required("OPENAI_API_KEY")?;
        let elevenlabs_key = required("ELEVENLABS_API_KEY")?;
        let pexels_key = required("PEXELS_API_KEY")?;

        let subtitles = lookup("SUBTITLES")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let subtitle_server_port = match lookup("SUBTITLE_SERVER_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("SUBTITLE_SERVER_PORT is not a port: {raw}"))?,
            None => 8080,
        };

        let renderer_line = lookup("SUBTITLE_RENDERER").unwrap_or_else(|| default_renderer().to_string());
        let subtitle_renderer: Vec<String> = renderer_line.split_whitespace().map(str::to_string).collect();
        if subtitle_renderer.is_empty() {
            anyhow::bail!("SUBTITLE_RENDERER is empty");
        }

        Ok(Self {
            openai_key,
            openai_model: lookup("OPENAI_MODEL").unwrap_or_else(default_openai_model),
            elevenlabs_key,
            eleven_model_id: lookup("ELEVENLABS_MODEL_ID").unwrap_or_else(default_model_id),
            pexels_key,
            subtitles,
            article_path: lookup("ARTICLE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("article.txt")),
            out_dir: lookup("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("out")),
            subtitle_server_port,
            subtitle_renderer,
        })
    }
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("true") || value == "1"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn keys() -> Vec<(&'static str, &'static str)> {
        vec![
            ("OPENAI_API_KEY", "sk-test"),
            ("ELEVENLABS_API_KEY", "el-test"),
            ("PEXELS_API_KEY", "px-test"),
        ]
    }

    #[test]
    fn defaults_apply_when_only_keys_are_set() {
        let vars = env(&keys());
        let cfg = Config::from_lookup(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(cfg.openai_model, "gpt-4o");
        assert_eq!(cfg.eleven_model_id, "eleven_multilingual_v2");
        assert!(!cfg.subtitles);
        assert_eq!(cfg.article_path, PathBuf::from("article.txt"));
        assert_eq!(cfg.out_dir, PathBuf::from("out"));
        assert_eq!(cfg.subtitle_server_port, 8080);
        assert_eq!(cfg.subtitle_renderer, vec!["node", "subtitles/render.mjs"]);
    }

    #[test]
    fn missing_key_is_reported_by_name() {
        let mut pairs = keys();
        pairs.retain(|(k, _)| *k != "PEXELS_API_KEY");
        let vars = env(&pairs);
        let err = Config::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("PEXELS_API_KEY"));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let mut pairs = keys();
        pairs.push(("OPENAI_API_KEY", "  "));
        let vars = env(&pairs);
        assert!(Config::from_lookup(|k| vars.get(k).cloned()).is_err());
    }

    #[test]
    fn subtitle_flag_accepts_true_in_any_case() {
        for (raw, expected) in [("TRUE", true), ("true", true), ("1", true), ("FALSE", false), ("yes", false)] {
            let mut pairs = keys();
            pairs.push(("SUBTITLES", raw));
            let vars = env(&pairs);
            let cfg = Config::from_lookup(|k| vars.get(k).cloned()).unwrap();
            assert_eq!(cfg.subtitles, expected, "SUBTITLES={raw}");
        }
    }

    #[test]
    fn bad_port_is_rejected() {
        let mut pairs = keys();
        pairs.push(("SUBTITLE_SERVER_PORT", "eighty"));
        let vars = env(&pairs);
        assert!(Config::from_lookup(|k| vars.get(k).cloned()).is_err());
    }
}
