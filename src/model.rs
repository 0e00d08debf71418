use crate::error::{PipelineError, Result};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Characters that close a sentence and also split words.
pub const TERMINATORS: [&str; 3] = [".", "?", "!"];

pub fn is_terminator(ch: &str) -> bool {
    TERMINATORS.contains(&ch)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootageAsset {
    pub width: u32,
    pub height: u32,
    pub quality: Option<String>,
    pub fps: Option<f64>,
    pub link: String,
}

/// One sentence of narration and the footage that plays under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub description: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<FootageAsset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(rename = "voiceName", default, skip_serializing_if = "Option::is_none")]
    pub voice_name: Option<String>,
    #[serde(default)]
    pub tone: Vec<String>,
    pub script: String,
    pub visuals: Vec<Segment>,
}

impl Script {
    /// Parses a language-model reply, tolerating a ```json fence around it.
    pub fn from_llm_reply(reply: &str) -> Result<Self> {
        let cleaned = clean_json_string(reply);
        if cleaned.is_empty() {
            return Err(PipelineError::parse("empty reply"));
        }

        let script: Script = serde_json::from_str(cleaned)
            .map_err(|e| PipelineError::parse(format!("invalid script JSON: {e}")))?;

        if script.script.trim().is_empty() {
            return Err(PipelineError::parse("script text is empty"));
        }
        if script.visuals.is_empty() {
            return Err(PipelineError::parse("no visuals in script"));
        }
        Ok(script)
    }
}

fn fence_regex() -> std::result::Result<&'static Regex, regex::Error> {
    static FENCE_RE: OnceCell<Regex> = OnceCell::new();
    FENCE_RE.get_or_try_init(|| Regex::new(r"(?s)^```(?:json)?\s*(.*?)\s*```$"))
}

pub fn clean_json_string(input: &str) -> &str {
    let trimmed = input.trim();
    let body = fence_regex()
        .ok()
        .and_then(|re| re.captures(trimmed))
        .and_then(|c| c.get(1));
    match body {
        Some(body) => body.as_str().trim(),
        None => trimmed,
    }
}

/// Per-character timing returned by the speech synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterAlignment {
    pub characters: Vec<String>,
    pub character_end_times_seconds: Vec<f64>,
}

impl CharacterAlignment {
    pub fn new(characters: Vec<String>, character_end_times_seconds: Vec<f64>) -> Result<Self> {
        let alignment = Self {
            characters,
            character_end_times_seconds,
        };
        alignment.validate()?;
        Ok(alignment)
    }

    /// Builds an alignment from a string, one end time per `char`.
    pub fn from_text(text: &str, ends: &[f64]) -> Result<Self> {
        Self::new(text.chars().map(String::from).collect(), ends.to_vec())
    }

    pub fn validate(&self) -> Result<()> {
        if self.characters.len() != self.character_end_times_seconds.len() {
            return Err(PipelineError::upstream(
                "elevenlabs",
                anyhow::anyhow!(
                    "alignment has {} characters but {} end times",
                    self.characters.len(),
                    self.character_end_times_seconds.len()
                ),
            ));
        }
        if self
            .character_end_times_seconds
            .windows(2)
            .any(|w| w[1] < w[0])
        {
            return Err(PipelineError::upstream(
                "elevenlabs",
                anyhow::anyhow!("alignment end times go backwards"),
            ));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.characters
            .iter()
            .map(String::as_str)
            .zip(self.character_end_times_seconds.iter().copied())
    }

    pub fn final_time(&self) -> Option<f64> {
        self.character_end_times_seconds.last().copied()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioData {
    pub audio_base64: String,
    pub alignment: CharacterAlignment,
    #[serde(default)]
    pub normalized_alignment: Option<CharacterAlignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub punctuated_word: String,
    pub start: f64,
    pub end: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = r#"{
        "tone": ["curious", "upbeat"],
        "script": "Bees are back. Cities are helping!",
        "visuals": [
            {"description": "bees flowers garden", "source": "Bees are back."},
            {"description": "city rooftop garden", "source": "Cities are helping!"}
        ]
    }"#;

    #[test]
    fn parses_plain_reply() {
        let script = Script::from_llm_reply(REPLY).unwrap();
        assert_eq!(script.tone, vec!["curious", "upbeat"]);
        assert_eq!(script.visuals.len(), 2);
        assert_eq!(script.visuals[1].source, "Cities are helping!");
        assert!(script.visuals.iter().all(|s| s.video.is_none() && s.end.is_none()));
    }

    #[test]
    fn strips_json_fence() {
        let fenced = format!("```json\n{REPLY}\n```");
        let script = Script::from_llm_reply(&fenced).unwrap();
        assert_eq!(script.visuals[0].description, "bees flowers garden");
    }

    #[test]
    fn rejects_prose_and_empty_visuals() {
        assert!(matches!(
            Script::from_llm_reply("Sure! Here is your script."),
            Err(PipelineError::ParseFailure { .. })
        ));
        assert!(matches!(
            Script::from_llm_reply(r#"{"tone":[],"script":"Hi.","visuals":[]}"#),
            Err(PipelineError::ParseFailure { .. })
        ));
        assert!(matches!(
            Script::from_llm_reply("   "),
            Err(PipelineError::ParseFailure { .. })
        ));
    }

    #[test]
    fn journal_shape_uses_voice_name_and_skips_unset_fields() {
        let mut script = Script::from_llm_reply(REPLY).unwrap();
        let json = serde_json::to_value(&script).unwrap();
        assert!(json.get("voiceName").is_none());
        assert!(json["visuals"][0].get("end").is_none());

        script.voice_name = Some("Rachel".to_string());
        script.visuals[0].end = Some(1.25);
        let json = serde_json::to_value(&script).unwrap();
        assert_eq!(json["voiceName"], "Rachel");
        assert_eq!(json["visuals"][0]["end"], 1.25);
    }

    #[test]
    fn alignment_rejects_length_mismatch() {
        let err = CharacterAlignment::from_text("Hi.", &[0.1, 0.2]).unwrap_err();
        assert!(matches!(err, PipelineError::UpstreamApi { .. }));
    }

    #[test]
    fn alignment_rejects_decreasing_times() {
        assert!(CharacterAlignment::from_text("Hi.", &[0.1, 0.3, 0.2]).is_err());
        assert!(CharacterAlignment::from_text("Hi.", &[0.1, 0.1, 0.2]).is_ok());
    }
}
