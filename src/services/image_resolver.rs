use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::models::plan::{PlanImage, PlanPatch};
use crate::services::blob_storage::BlobStorage;
use crate::services::plan_store::{PlanStore, StoreError};

const UNSPLASH_BASE_URL: &str = "https://api.unsplash.com";
const PLACEHOLDER_CONTENT_TYPE: &str = "image/svg+xml";
const PLACEHOLDER_MAX_CHARS: usize = 40;
const PLACEHOLDER_DEFAULT_TITLE: &str = "Your Next Adventure";
const PLACEHOLDER_COLORS: [&str; 6] = [
    "#0ea5e9", "#6366f1", "#12b981", "#f97316", "#ec4899", "#14b8a6",
];

#[derive(Debug)]
pub enum ImageError {
    NotConfigured,
    NoResults(String),
    InvalidRequest(String),
    HttpError(reqwest::Error),
    Status(u16),
    StorageUnavailable(String),
    PlanNotFound(String),
    Store(StoreError),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::NotConfigured => write!(f, "Stock photo credentials are not configured"),
            ImageError::NoResults(query) => write!(f, "No photo results for \"{}\"", query),
            ImageError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ImageError::HttpError(err) => write!(f, "HTTP error: {}", err),
            ImageError::Status(status) => write!(f, "Photo fetch failed with status {}", status),
            ImageError::StorageUnavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            ImageError::PlanNotFound(plan_id) => write!(f, "Plan {} not found", plan_id),
            ImageError::Store(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ImageError {}

impl From<reqwest::Error> for ImageError {
    fn from(err: reqwest::Error) -> Self {
        ImageError::HttpError(err)
    }
}

impl From<StoreError> for ImageError {
    fn from(err: StoreError) -> Self {
        ImageError::Store(err)
    }
}

#[derive(Debug, Clone)]
pub struct Photo {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct DownloadedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[async_trait]
pub trait StockPhotoProvider: Send + Sync {
    async fn search_photos(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Photo>, ImageError>;

    async fn download(&self, url: &str) -> Result<DownloadedImage, ImageError>;
}

#[derive(Debug, Deserialize)]
struct UnsplashSearchResponse {
    #[serde(default)]
    results: Vec<UnsplashPhoto>,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    urls: UnsplashUrls,
}

#[derive(Debug, Deserialize)]
struct UnsplashUrls {
    regular: Option<String>,
}

pub struct UnsplashClient {
    http_client: reqwest::Client,
    access_key: String,
    base_url: String,
}

impl UnsplashClient {
    pub fn new(access_key: String) -> Result<Self, ImageError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            http_client,
            access_key,
            base_url: UNSPLASH_BASE_URL.to_string(),
        })
    }
}

#[async_trait]
impl StockPhotoProvider for UnsplashClient {
    async fn search_photos(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Photo>, ImageError> {
        let url = url::Url::parse_with_params(
            &format!("{}/search/photos", self.base_url),
            &[
                ("query", query.to_string()),
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ],
        )
        .map_err(|e| ImageError::InvalidRequest(e.to_string()))?;

        let response = self
            .http_client
            .get(url)
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .header("Accept-Version", "v1")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ImageError::Status(response.status().as_u16()));
        }

        let body: UnsplashSearchResponse = response.json().await?;
        Ok(body
            .results
            .into_iter()
            .filter_map(|photo| photo.urls.regular)
            .map(|url| Photo { url })
            .collect())
    }

    async fn download(&self, url: &str) -> Result<DownloadedImage, ImageError> {
        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ImageError::Status(response.status().as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = response.bytes().await?.to_vec();

        Ok(DownloadedImage {
            bytes,
            content_type,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    StockPhoto,
    Placeholder,
}

/// Resolves the cover image of a plan. Always leaves the plan with some image
/// and the `imagination` flag set, unless the plan itself is gone.
pub struct ImageResolver {
    photos: Option<Arc<dyn StockPhotoProvider>>,
    storage: Option<Arc<dyn BlobStorage>>,
    plans: Arc<dyn PlanStore>,
}

impl ImageResolver {
    pub fn new(
        photos: Option<Arc<dyn StockPhotoProvider>>,
        storage: Option<Arc<dyn BlobStorage>>,
        plans: Arc<dyn PlanStore>,
    ) -> Self {
        if photos.is_none() {
            log::warn!("UNSPLASH_ACCESS_KEY missing; plans will use generated images");
        }
        Self {
            photos,
            storage,
            plans,
        }
    }

    pub async fn generate_and_store(
        &self,
        plan_id: &str,
        prompt: &str,
    ) -> Result<ImageSource, ImageError> {
        match self.fetch_photo(prompt).await {
            Ok(photo) => match self.store(photo.bytes, &photo.content_type).await {
                Ok(image) => {
                    self.attach(plan_id, image).await?;
                    return Ok(ImageSource::StockPhoto);
                }
                Err(e) => log::error!("Unable to store photo for plan {}: {}", plan_id, e),
            },
            Err(ImageError::NotConfigured) => {
                log::warn!("Using generated fallback image for plan {}", plan_id)
            }
            Err(e) => log::warn!(
                "Photo lookup failed for plan {}; using fallback image: {}",
                plan_id,
                e
            ),
        }

        let svg = placeholder_svg(prompt);
        let image = match self
            .store(svg.clone().into_bytes(), PLACEHOLDER_CONTENT_TYPE)
            .await
        {
            Ok(image) => image,
            Err(e) => {
                log::warn!(
                    "Unable to store fallback image for plan {}; embedding it inline: {}",
                    plan_id,
                    e
                );
                PlanImage {
                    storage_id: None,
                    image_url: svg_data_url(&svg),
                }
            }
        };

        self.attach(plan_id, image).await?;
        Ok(ImageSource::Placeholder)
    }

    async fn fetch_photo(&self, prompt: &str) -> Result<DownloadedImage, ImageError> {
        let photos = self.photos.as_ref().ok_or(ImageError::NotConfigured)?;
        let query = prompt.split(',').next().unwrap_or(prompt).trim();

        let results = photos.search_photos(query, 1, 1).await?;
        let photo = results
            .into_iter()
            .next()
            .ok_or_else(|| ImageError::NoResults(query.to_string()))?;

        photos.download(&photo.url).await
    }

    async fn store(&self, bytes: Vec<u8>, content_type: &str) -> Result<PlanImage, ImageError> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| ImageError::StorageUnavailable("no blob storage configured".to_string()))?;

        let storage_id = storage
            .store(bytes, content_type)
            .await
            .map_err(|e| ImageError::StorageUnavailable(e.to_string()))?;
        let image_url = storage.url_for(&storage_id).await.ok_or_else(|| {
            ImageError::StorageUnavailable(format!("no URL for stored object {}", storage_id))
        })?;

        Ok(PlanImage {
            storage_id: Some(storage_id),
            image_url,
        })
    }

    async fn attach(&self, plan_id: &str, image: PlanImage) -> Result<(), ImageError> {
        if self.plans.apply_patch(plan_id, &PlanPatch::Image(image)).await? {
            Ok(())
        } else {
            Err(ImageError::PlanNotFound(plan_id.to_string()))
        }
    }
}

pub fn placeholder_title(prompt: &str) -> String {
    let trimmed: String = prompt.trim().chars().take(PLACEHOLDER_MAX_CHARS).collect();
    if trimmed.is_empty() {
        PLACEHOLDER_DEFAULT_TITLE.to_string()
    } else {
        trimmed
    }
}

pub fn placeholder_color(prompt: &str) -> &'static str {
    let title = placeholder_title(prompt);
    let hash: usize = title.encode_utf16().map(usize::from).sum();
    PLACEHOLDER_COLORS[hash % PLACEHOLDER_COLORS.len()]
}

pub fn placeholder_svg(prompt: &str) -> String {
    let color = placeholder_color(prompt);
    let title = escape_xml(&placeholder_title(prompt));

    format!(
        r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 1200 800" preserveAspectRatio="xMidYMid slice">
  <defs>
    <linearGradient id="grad" x1="0" y1="0" x2="1" y2="1">
      <stop offset="0%" stop-color="{color}" stop-opacity="0.95" />
      <stop offset="100%" stop-color="{color}" stop-opacity="0.6" />
    </linearGradient>
  </defs>
  <rect width="1200" height="800" fill="url(#grad)" />
  <g transform="translate(120, 200)">
    <text x="0" y="0" font-family="'Segoe UI', 'Helvetica Neue', Arial, sans-serif" font-size="72" fill="#ffffff" font-weight="700">
      {title}
    </text>
    <text x="0" y="140" font-family="'Segoe UI', 'Helvetica Neue', Arial, sans-serif" font-size="36" fill="#f8fafc" opacity="0.9">
      Adventure awaits • Curated by Travel Planner AI
    </text>
  </g>
</svg>"##
    )
}

pub fn svg_data_url(svg: &str) -> String {
    format!(
        "data:{};base64,{}",
        PLACEHOLDER_CONTENT_TYPE,
        general_purpose::STANDARD.encode(svg)
    )
}

fn escape_xml(label: &str) -> String {
    label
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
