//! Capture queue worker: persists every captured still with a JSON sidecar.

use chrono::{DateTime, Utc};
use facegate_capture::CapturedImage;
use facegate_core::CaptureTrigger;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize metadata: {0}")]
    Json(#[from] serde_json::Error),
}

/// Sidecar written next to each image.
#[derive(Debug, Serialize)]
pub struct CaptureMetadata {
    pub file: String,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
    pub trigger: CaptureTrigger,
    pub captured_at: DateTime<Utc>,
}

/// Spawn the worker. It drains `rx` until every sender is gone and returns
/// the image paths it wrote, in order.
pub fn spawn_writer(
    out_dir: PathBuf,
    mut rx: mpsc::UnboundedReceiver<CapturedImage>,
) -> JoinHandle<Result<Vec<PathBuf>, QueueError>> {
    tokio::spawn(async move {
        let mut written = Vec::new();
        while let Some(image) = rx.recv().await {
            let index = written.len() + 1;
            let path = write_capture(&out_dir, index, &image).await?;
            tracing::info!(path = %path.display(), trigger = ?image.trigger, "capture saved");
            written.push(path);
        }
        tracing::debug!(count = written.len(), "capture queue drained");
        Ok(written)
    })
}

async fn write_capture(
    out_dir: &Path,
    index: usize,
    image: &CapturedImage,
) -> Result<PathBuf, QueueError> {
    let file = format!("capture-{index}.{}", image.format.extension());
    let image_path = out_dir.join(&file);
    let sidecar_path = out_dir.join(format!("capture-{index}.json"));

    let metadata = CaptureMetadata {
        file,
        mime_type: image.format.mime_type(),
        width: image.width,
        height: image.height,
        bytes: image.data.len(),
        trigger: image.trigger,
        captured_at: image.captured_at,
    };
    let json = serde_json::to_vec_pretty(&metadata)?;

    write_file(&image_path, &image.data).await?;
    write_file(&sidecar_path, &json).await?;
    Ok(image_path)
}

async fn write_file(path: &Path, data: &[u8]) -> Result<(), QueueError> {
    tokio::fs::write(path, data)
        .await
        .map_err(|source| QueueError::Io {
            path: path.display().to_string(),
            source,
        })
}
