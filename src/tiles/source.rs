use crate::{MosaicError, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Shared async HTTP client for preview listings and image payloads
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("mosaic/", env!("CARGO_PKG_VERSION")))
        .tcp_keepalive(std::time::Duration::from_secs(30))
        .pool_idle_timeout(std::time::Duration::from_secs(90))
        .pool_max_idle_per_host(16)
        .build()
        .expect("failed to build reqwest async client")
});

/// An image to show on one tile and the challenge it leads to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRef {
    pub image_url: String,
    pub target_id: String,
}

impl PreviewRef {
    pub fn new(image_url: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            target_id: target_id.into(),
        }
    }
}

/// Lists preview references. May return fewer than `count` entries;
/// an empty list is a valid answer, not an error.
#[async_trait]
pub trait PreviewSource: Send + Sync {
    async fn list_previews(
        &self,
        count: usize,
        resume_after_id: Option<&str>,
    ) -> Result<Vec<PreviewRef>>;
}

/// Fetches the raw bytes behind an image URL
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, image_url: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Deserialize)]
struct CropPayload {
    url: String,
}

#[derive(Debug, Deserialize)]
struct PreviewPayload {
    uuid: String,
    crop: CropPayload,
}

impl From<PreviewPayload> for PreviewRef {
    fn from(payload: PreviewPayload) -> Self {
        PreviewRef::new(payload.crop.url, payload.uuid)
    }
}

/// Preview listing served over HTTP as
/// `GET {base}/previews?count=N[&after=ID]` returning
/// `[{ "uuid": ..., "crop": { "url": ... } }, ...]`
#[derive(Debug, Clone)]
pub struct HttpPreviewSource {
    base_url: String,
}

impl HttpPreviewSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn listing_url(&self) -> String {
        format!("{}/previews", self.base_url)
    }
}

#[async_trait]
impl PreviewSource for HttpPreviewSource {
    async fn list_previews(
        &self,
        count: usize,
        resume_after_id: Option<&str>,
    ) -> Result<Vec<PreviewRef>> {
        let url = self.listing_url();
        let mut request = HTTP_CLIENT
            .get(&url)
            .query(&[("count", count.to_string())]);
        if let Some(after) = resume_after_id {
            request = request.query(&[("after", after)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(MosaicError::Http {
                status: response.status().as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        let payloads: Vec<PreviewPayload> = serde_json::from_slice(&body)?;
        let mut previews: Vec<PreviewRef> = payloads.into_iter().map(PreviewRef::from).collect();
        previews.truncate(count);
        Ok(previews)
    }
}

/// Plain HTTP GET image fetcher; non-2xx responses are errors
#[derive(Debug, Clone, Default)]
pub struct HttpImageFetcher;

impl HttpImageFetcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, image_url: &str) -> Result<Vec<u8>> {
        let response = HTTP_CLIENT.get(image_url).send().await?;
        if !response.status().is_success() {
            return Err(MosaicError::Http {
                status: response.status().as_u16(),
                url: image_url.to_string(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}
