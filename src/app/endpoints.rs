//! Backend endpoint URLs.

use anyhow::{Context, Result, bail};
use url::Url;

/// Validated backend API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    base: Url,
}

impl Backend {
    /// Parses an absolute http(s) base URL such as `http://nas:8000/api`.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let mut base =
            Url::parse(trimmed).with_context(|| format!("Invalid backend URL '{trimmed}'"))?;
        if !matches!(base.scheme(), "http" | "https") {
            bail!("Backend URL must use http or https: '{trimmed}'");
        }
        base.set_query(None);
        base.set_fragment(None);
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    /// Streaming endpoint for one library file.
    pub fn media_stream_url(&self, media_path: &str) -> Result<Url> {
        let mut url = self
            .base
            .join("media_stream/")
            .context("Failed to build media stream URL")?;
        url.query_pairs_mut().append_pair("path", media_path);
        Ok(url)
    }

    /// Upload endpoint; the destination directory is added by the engine.
    pub fn upload_url(&self) -> Result<Url> {
        self.base
            .join("upload")
            .context("Failed to build upload URL")
    }
}
