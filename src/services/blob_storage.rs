use async_trait::async_trait;
use google_cloud_storage::client::{Client, ClientConfig};
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};
use std::fmt;
use uuid::Uuid;

#[derive(Debug)]
pub enum StorageError {
    GcsError(String),
    UnsupportedContentType(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::GcsError(err) => write!(f, "GCS error: {}", err),
            StorageError::UnsupportedContentType(content_type) => {
                write!(f, "Unsupported content type: {}", content_type)
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Blob storage: `store` returns an opaque id, `url_for` resolves it to a public URL.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn store(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, StorageError>;
    async fn url_for(&self, storage_id: &str) -> Option<String>;
}

pub struct GcsBlobStorage {
    client: Client,
    bucket_name: String,
}

impl GcsBlobStorage {
    pub async fn new(bucket_name: String) -> Result<Self, StorageError> {
        let config = ClientConfig::default()
            .with_auth()
            .await
            .map_err(|e| StorageError::GcsError(format!("Failed to create GCS client: {}", e)))?;

        Ok(Self {
            client: Client::new(config),
            bucket_name,
        })
    }
}

pub fn file_extension(content_type: &str) -> Result<&'static str, StorageError> {
    // Parameters such as "; charset=utf-8" are ignored.
    let mime = content_type.split(';').next().unwrap_or("").trim();
    match mime {
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/gif" => Ok("gif"),
        "image/webp" => Ok("webp"),
        "image/svg+xml" => Ok("svg"),
        other => Err(StorageError::UnsupportedContentType(other.to_string())),
    }
}

#[async_trait]
impl BlobStorage for GcsBlobStorage {
    async fn store(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, StorageError> {
        let extension = file_extension(content_type)?;
        let object_name = format!(
            "plans/{}-{}.{}",
            chrono::Utc::now().timestamp(),
            Uuid::new_v4(),
            extension
        );

        let mut media = Media::new(object_name.clone());
        media.content_type = content_type.to_string().into();
        let upload_type = UploadType::Simple(media);
        let upload_request = UploadObjectRequest {
            bucket: self.bucket_name.clone(),
            ..Default::default()
        };

        self.client
            .upload_object(&upload_request, bytes, &upload_type)
            .await
            .map_err(|e| StorageError::GcsError(format!("Failed to upload to GCS: {}", e)))?;

        Ok(object_name)
    }

    async fn url_for(&self, storage_id: &str) -> Option<String> {
        Some(format!(
            "https://storage.googleapis.com/{}/{}",
            self.bucket_name, storage_id
        ))
    }
}
