use crate::api::FootageSource;
use crate::error::{PipelineError, Result};
use crate::footage::{FootageVariant, select_best_variant};
use crate::model::FootageAsset;
use crate::{logi, logw};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

const PEXELS_BASE: &str = "https://api.pexels.com";
const SEARCH_USER_AGENT: &str = "curl/7.81.0";
const DOWNLOAD_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    videos: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    video_files: Vec<FootageVariant>,
}

pub struct PexelsClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl PexelsClient {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: PEXELS_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_variants(&self, query: &str) -> anyhow::Result<Vec<FootageVariant>> {
        let url = format!("{}/videos/search", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .get(url)
            .query(&[("query", query)])
            .header("User-Agent", SEARCH_USER_AGENT)
            .header("Authorization", &self.api_key)
            .send()
            .await
            .context("Pexels search request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let raw = resp.text().await.unwrap_or_default();
            let snippet = raw.chars().take(400).collect::<String>();
            anyhow::bail!("Pexels search HTTP {}: {}", status.as_u16(), snippet);
        }

        let body: SearchResponse = resp.json().await.context("Pexels search response parse failed")?;
        Ok(body
            .videos
            .into_iter()
            .next()
            .map(|hit| hit.video_files)
            .unwrap_or_default())
    }
}

#[async_trait]
impl FootageSource for PexelsClient {
    async fn search(&self, query: &str) -> Result<FootageAsset> {
        let variants = self
            .fetch_variants(query)
            .await
            .map_err(|e| PipelineError::upstream("pexels", e))?;

        let Some(best) = select_best_variant(&variants) else {
            logw(format!("Pexels returned no footage for {query:?}"));
            return Err(PipelineError::NoFootageFound {
                query: query.to_string(),
            });
        };

        logi(format!(
            "Footage for {:?}: {}x{} ({})",
            query,
            best.width,
            best.height,
            best.quality.as_deref().unwrap_or("unknown")
        ));
        Ok(FootageAsset::from(best))
    }

    async fn download(&self, asset: &FootageAsset, dest: &Path) -> Result<()> {
        logi(format!("Downloading {}", asset.link));
        let bytes = async {
            let resp = self
                .client
                .get(&asset.link)
                .header("User-Agent", DOWNLOAD_USER_AGENT)
                .send()
                .await
                .context("footage download request failed")?;
            if !resp.status().is_success() {
                anyhow::bail!("footage download HTTP {}", resp.status().as_u16());
            }
            resp.bytes().await.context("footage download read failed")
        }
        .await
        .map_err(|e| PipelineError::upstream("pexels", e))?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::io(parent, e))?;
        }
        fs::write(dest, &bytes)
            .await
            .map_err(|e| PipelineError::io(dest, e))?;
        Ok(())
    }
}
