//! Image hosting for payment proofs and wallet QR codes.

use axum::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("No file provided")]
    MissingFile,

    #[error("Image uploads are not configured")]
    NotConfigured,

    #[error("Failed to upload image")]
    Request(#[from] reqwest::Error),

    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores the image and returns its public URL.
    async fn put(&self, upload: Upload) -> Result<String, UploadError>;
}

pub struct CloudinaryStore {
    client: reqwest::Client,
    cloud_name: Option<String>,
    upload_preset: String,
    folder: String,
}

impl CloudinaryStore {
    pub fn new(cloud_name: Option<String>, upload_preset: String, folder: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name,
            upload_preset,
            folder,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    error: Option<UploadFailure>,
}

#[derive(Debug, Deserialize)]
struct UploadFailure {
    message: Option<String>,
}

fn parse_upload_response(success: bool, response: UploadResponse) -> Result<String, UploadError> {
    match response.secure_url {
        Some(url) if success && !url.is_empty() => Ok(url),
        _ => Err(UploadError::Rejected(
            response
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Upload failed".to_string()),
        )),
    }
}

/// Client-declared content type, dropped when reqwest cannot parse it so the
/// file still goes up untyped.
fn usable_mime(content_type: Option<&str>) -> Option<&str> {
    content_type.filter(|content_type| {
        let valid = Part::bytes(Vec::new()).mime_str(content_type).is_ok();
        if !valid {
            warn!("Ignoring invalid content type {content_type:?}");
        }
        valid
    })
}

#[async_trait]
impl BlobStore for CloudinaryStore {
    async fn put(&self, upload: Upload) -> Result<String, UploadError> {
        let cloud_name = self.cloud_name.as_deref().ok_or(UploadError::NotConfigured)?;
        let url = format!("https://api.cloudinary.com/v1_1/{cloud_name}/image/upload");

        let mut part = Part::bytes(upload.bytes).file_name(upload.file_name.clone());
        if let Some(content_type) = usable_mime(upload.content_type.as_deref()) {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", self.folder.clone());

        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status();
        let body: UploadResponse = response.json().await.map_err(|e| {
            warn!("Malformed upload response (status={status}): {e}");
            UploadError::Rejected("Upload failed".to_string())
        })?;

        let secure_url = parse_upload_response(status.is_success(), body)?;
        info!("Uploaded {} to {secure_url}", upload.file_name);
        Ok(secure_url)
    }
}

/// Keeps uploads in memory and hands out `memory://` URLs.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<Vec<Upload>>,
    reject_with: Option<String>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every upload fails with `message`.
    pub fn rejecting(message: &str) -> Self {
        Self {
            blobs: Mutex::default(),
            reject_with: Some(message.to_string()),
        }
    }

    pub async fn len(&self) -> usize {
        self.blobs.lock().await.len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, upload: Upload) -> Result<String, UploadError> {
        if let Some(message) = &self.reject_with {
            return Err(UploadError::Rejected(message.clone()));
        }

        let mut blobs = self.blobs.lock().await;
        let url = format!("memory://blobs/{}/{}", blobs.len(), upload.file_name);
        blobs.push(upload);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> UploadResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn malformed_content_types_are_dropped() {
        assert_eq!(usable_mime(Some("image/png")), Some("image/png"));
        assert_eq!(usable_mime(Some("not a mime")), None);
        assert_eq!(usable_mime(Some("")), None);
        assert_eq!(usable_mime(None), None);
    }

    #[test]
    fn secure_url_is_taken_verbatim() {
        let url = parse_upload_response(
            true,
            response(r#"{"secure_url":"https://res.cloudinary.com/demo/proof.png","public_id":"x"}"#),
        )
        .unwrap();
        assert_eq!(url, "https://res.cloudinary.com/demo/proof.png");
    }

    #[test]
    fn provider_message_is_reported() {
        let err = parse_upload_response(
            false,
            response(r#"{"error":{"message":"Upload preset not found"}}"#),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Upload preset not found");

        let err = parse_upload_response(true, response("{}")).unwrap_err();
        assert_eq!(err.to_string(), "Upload failed");
    }

    #[tokio::test]
    async fn unconfigured_cloud_fails_before_any_request() {
        let store = CloudinaryStore::new(None, "ml_default".into(), "donation_proofs".into());
        let err = store
            .put(Upload {
                bytes: vec![1, 2, 3],
                file_name: "proof.png".into(),
                content_type: Some("image/png".into()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::NotConfigured));
    }

    #[tokio::test]
    async fn memory_store_counts_uploads() {
        let store = MemoryBlobStore::new();
        let url = store
            .put(Upload {
                bytes: vec![0xff],
                file_name: "qr.png".into(),
                content_type: None,
            })
            .await
            .unwrap();
        assert_eq!(url, "memory://blobs/0/qr.png");
        assert_eq!(store.len().await, 1);
    }
}
