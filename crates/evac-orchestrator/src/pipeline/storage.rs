use std::path::{Path, PathBuf};

use chrono::Utc;
use futures::future::BoxFuture;
use tracing::{instrument, warn};

use crate::error::PipelineError;

#[derive(Debug, Clone)]
pub struct PlacedFrame {
    /// Portable path relative to the storage root, suitable for
    /// persistence on an `ImageRecord`.
    pub relative_path: String,
    /// Absolute path for any further local I/O this cycle still needs.
    pub absolute_path: PathBuf,
}

/// Moves a freshly captured file into `BASE/YYYY/MM/DD/{floorId}/{cameraId}/{basename}`,
/// using the UTC wall clock at placement time. A move, not a copy, per
/// the throughput requirement in §4.5.
#[instrument(skip(base_dir), fields(camera_id = %camera_id))]
pub async fn place_frame(
    base_dir: &Path,
    temp_path: &Path,
    floor_id: &str,
    camera_id: &str,
) -> Result<PlacedFrame, PipelineError> {
    let map_err = |source: anyhow::Error| PipelineError::Acquire {
        camera_id: camera_id.to_string(),
        source,
    };

    let basename = temp_path
        .file_name()
        .ok_or_else(|| map_err(anyhow::anyhow!("temp path has no file name: {}", temp_path.display())))?;

    let now = Utc::now();
    let relative = PathBuf::from(format!("{}", now.format("%Y/%m/%d")))
        .join(floor_id)
        .join(camera_id)
        .join(basename);

    let absolute = base_dir.join(&relative);
    if let Some(parent) = absolute.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| map_err(e.into()))?;
    }

    tokio::fs::rename(temp_path, &absolute).await.map_err(|e| map_err(e.into()))?;

    Ok(PlacedFrame {
        relative_path: relative.to_string_lossy().replace('\\', "/"),
        absolute_path: absolute,
    })
}

#[derive(Debug, Clone)]
pub struct UploadResult {
    pub url: String,
    pub public_id: String,
    pub width: u32,
    pub height: u32,
}

/// The object store is an external collaborator: an opaque upload that
/// accepts an absolute path plus a logical folder key and returns a URL
/// plus dimensions, or fails.
pub trait CloudUploader: Send + Sync {
    fn upload<'a>(&'a self, absolute_path: &'a Path, folder_key: &'a str) -> BoxFuture<'a, anyhow::Result<UploadResult>>;
}

pub struct HttpCloudUploader {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCloudUploader {
    pub fn new(client: reqwest::Client, endpoint: String) -> Self {
        HttpCloudUploader { client, endpoint }
    }
}

impl CloudUploader for HttpCloudUploader {
    fn upload<'a>(&'a self, absolute_path: &'a Path, folder_key: &'a str) -> BoxFuture<'a, anyhow::Result<UploadResult>> {
        Box::pin(async move {
            let bytes = tokio::fs::read(absolute_path).await?;
            let part = reqwest::multipart::Part::bytes(bytes).file_name(
                absolute_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "frame.jpg".to_string()),
            );
            let form = reqwest::multipart::Form::new().text("folder", folder_key.to_string()).part("file", part);
            let response = self
                .client
                .post(&self.endpoint)
                .multipart(form)
                .send()
                .await?
                .error_for_status()?;
            Ok(response.json::<UploadResult>().await?)
        })
    }
}

impl serde::Serialize for UploadResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("UploadResult", 4)?;
        s.serialize_field("url", &self.url)?;
        s.serialize_field("publicId", &self.public_id)?;
        s.serialize_field("width", &self.width)?;
        s.serialize_field("height", &self.height)?;
        s.end()
    }
}

impl<'de> serde::Deserialize<'de> for UploadResult {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Raw {
            url: String,
            public_id: String,
            width: u32,
            height: u32,
        }
        let raw = Raw::deserialize(deserializer)?;
        Ok(UploadResult {
            url: raw.url,
            public_id: raw.public_id,
            width: raw.width,
            height: raw.height,
        })
    }
}

/// Uploads the placed frame to the object store. Failure is non-fatal:
/// this returns `None` and the cycle continues local-only (cloud-precedence
/// fusion then falls through to the local detector or zero).
#[instrument(skip(uploader), fields(camera_id = %camera_id))]
pub async fn upload_frame(
    uploader: &dyn CloudUploader,
    absolute_path: &Path,
    floor_id: &str,
    camera_id: &str,
) -> Option<UploadResult> {
    let folder_key = format!("evacuation_frames/{}", Utc::now().format("%Y/%m/%d"));
    let folder_key = format!("{folder_key}/{floor_id}/{camera_id}");
    match uploader.upload(absolute_path, &folder_key).await {
        Ok(result) => Some(result),
        Err(e) => {
            warn!(error = %e, "upload failed; continuing cycle local-only");
            None
        }
    }
}
