use crate::model::FootageAsset;
use serde::Deserialize;

/// One encoding of a stock clip as listed by the provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FootageVariant {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub fps: Option<f64>,
    pub link: String,
}

impl FootageVariant {
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl From<&FootageVariant> for FootageAsset {
    fn from(v: &FootageVariant) -> Self {
        FootageAsset {
            width: v.width,
            height: v.height,
            quality: v.quality.clone(),
            fps: v.fps,
            link: v.link.clone(),
        }
    }
}

/// Largest `width * height` wins; on a tie the earlier variant is kept.
pub fn select_best_variant(candidates: &[FootageVariant]) -> Option<&FootageVariant> {
    let mut best: Option<&FootageVariant> = None;
    for candidate in candidates {
        match best {
            Some(current) if current.area() >= candidate.area() => {}
            _ => best = Some(candidate),
        }
    }
    best
}
