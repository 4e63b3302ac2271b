use std::path::{Path, PathBuf};

use chrono::Utc;
use futures::future::BoxFuture;
use tracing::instrument;

use crate::error::PipelineError;

/// The camera stream decoder is an external black box per scope: "give
/// URL, receive one JPEG". This trait is the seam that lets the cycle run
/// against a real HTTP-backed decoder in production and a canned source
/// in tests.
pub trait FrameSource: Send + Sync {
    fn fetch<'a>(&'a self, stream_url: &'a str) -> BoxFuture<'a, anyhow::Result<Vec<u8>>>;
}

/// Treats the stream URL as directly returning one JPEG payload over
/// HTTP GET, which is the simplest faithful reading of the "black box"
/// contract in §1/§6.
pub struct HttpFrameSource {
    client: reqwest::Client,
}

impl HttpFrameSource {
    pub fn new(client: reqwest::Client) -> Self {
        HttpFrameSource { client }
    }
}

impl FrameSource for HttpFrameSource {
    fn fetch<'a>(&'a self, stream_url: &'a str) -> BoxFuture<'a, anyhow::Result<Vec<u8>>> {
        Box::pin(async move {
            let response = self.client.get(stream_url).send().await?.error_for_status()?;
            Ok(response.bytes().await?.to_vec())
        })
    }
}

/// Fetches exactly one still frame and writes it to
/// `outDir/{nowMillis}-{floorId}-{cameraId}.jpg`, creating `outDir`
/// recursively and overwriting any existing file at that path. No retries
/// at this layer; a single failed call is a single `AcquireError`.
#[instrument(skip(source), fields(camera_id = %camera_id))]
pub async fn acquire_frame(
    source: &dyn FrameSource,
    stream_url: &str,
    floor_id: &str,
    camera_id: &str,
    out_dir: &Path,
) -> Result<PathBuf, PipelineError> {
    let map_err = |source: anyhow::Error| PipelineError::Acquire {
        camera_id: camera_id.to_string(),
        source,
    };

    tokio::fs::create_dir_all(out_dir).await.map_err(|e| map_err(e.into()))?;

    let bytes = source.fetch(stream_url).await.map_err(map_err)?;

    let file_name = format!("{}-{}-{}.jpg", Utc::now().timestamp_millis(), floor_id, camera_id);
    let dest = out_dir.join(file_name);

    tokio::fs::write(&dest, &bytes).await.map_err(|e| map_err(e.into()))?;

    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockSource {
        payload: Vec<u8>,
    }

    impl FrameSource for MockSource {
        fn fetch<'a>(&'a self, _stream_url: &'a str) -> BoxFuture<'a, anyhow::Result<Vec<u8>>> {
            Box::pin(async move { Ok(self.payload.clone()) })
        }
    }

    struct FailingSource;
    impl FrameSource for FailingSource {
        fn fetch<'a>(&'a self, _stream_url: &'a str) -> BoxFuture<'a, anyhow::Result<Vec<u8>>> {
            Box::pin(async move { anyhow::bail!("decoder unavailable") })
        }
    }

    #[tokio::test]
    async fn writes_frame_with_expected_naming_convention() {
        let tmp = tempfile::tempdir().unwrap();
        let source = MockSource {
            payload: vec![0xFF, 0xD8, 0xFF],
        };
        let path = acquire_frame(&source, "rtsp://irrelevant", "F1", "CAM1", tmp.path())
            .await
            .unwrap();
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.ends_with("-F1-CAM1.jpg"));
        assert!(tokio::fs::metadata(&path).await.is_ok());
    }

    #[tokio::test]
    async fn propagates_acquire_error_on_decoder_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let result = acquire_frame(&FailingSource, "rtsp://irrelevant", "F1", "CAM1", tmp.path()).await;
        assert!(matches!(result, Err(PipelineError::Acquire { .. })));
    }
}
