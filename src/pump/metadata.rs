//! Token metadata upload
//!
//! pump.fun expects the metadata JSON (and image) to be pinned on IPFS
//! before `create` is called; the returned URI is stored on-chain.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Default pump.fun IPFS upload endpoint
pub const PUMP_IPFS_URL: &str = "https://pump.fun/api/ipfs";

/// Fields submitted alongside the token image
#[derive(Debug, Clone, Default)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpfsResponse {
    metadata_uri: String,
}

/// Uploads token metadata to the pump.fun IPFS endpoint
pub struct MetadataUploader {
    client: Client,
    url: String,
}

impl MetadataUploader {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    /// Upload the image file and metadata, returning the metadata URI
    pub async fn upload(&self, metadata: &TokenMetadata, image_path: &Path) -> Result<String> {
        let image = tokio::fs::read(image_path).await.map_err(|e| {
            Error::MetadataUpload(format!("Cannot read image {}: {}", image_path.display(), e))
        })?;

        let file_name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.png".to_string());

        debug!("Uploading {} ({} bytes) to {}", file_name, image.len(), self.url);

        let form = build_form(metadata)
            .part("file", Part::bytes(image).file_name(file_name));

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::MetadataUpload(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::MetadataUpload(format!("HTTP {}: {}", status, body)));
        }

        let parsed: IpfsResponse = response
            .json()
            .await
            .map_err(|e| Error::Deserialization(format!("Failed to parse IPFS response: {}", e)))?;

        info!("Metadata pinned at {}", parsed.metadata_uri);
        Ok(parsed.metadata_uri)
    }
}

fn build_form(metadata: &TokenMetadata) -> Form {
    let mut form = Form::new()
        .text("name", metadata.name.clone())
        .text("symbol", metadata.symbol.clone())
        .text("description", metadata.description.clone())
        .text("showName", "true");

    for (key, value) in [
        ("twitter", &metadata.twitter),
        ("telegram", &metadata.telegram),
        ("website", &metadata.website),
    ] {
        if let Some(value) = value {
            form = form.text(key, value.clone());
        }
    }

    form
}
