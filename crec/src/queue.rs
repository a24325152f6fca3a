//! Filesystem import queue for push-based providers.
//!
//! Every enqueued batch becomes one JSON file under
//! `<import_queue_dir>/<provider_id>/`. Files are never removed by ingestion;
//! the queue is the durable store for push content and is re-read on every
//! refresh.

use crate::config::Config;
use crate::content::Content;
use crate::types::{CrecError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

/// Validates `payload` as a JSON array of content and stores it for
/// `provider_id`. Returns the path of the written file.
pub async fn enqueue(config: &Config, provider_id: &str, payload: &[u8]) -> Result<PathBuf> {
    if provider_id.trim().is_empty() || provider_id.contains(['/', '\\']) || provider_id == ".." {
        return Err(CrecError::UnknownProvider {
            id: provider_id.to_string(),
        });
    }

    let items: Vec<Content> = serde_json::from_slice(payload)?;

    let dir = config.provider_queue_dir(provider_id);
    fs::create_dir_all(&dir).await?;

    let path = dir.join(format!("import-{}.json", Uuid::new_v4()));
    fs::write(&path, payload).await?;

    info!(provider = %provider_id, items = items.len(), "Enqueued import {}", path.display());
    Ok(path)
}

/// Files currently queued for a provider, in name order. A missing queue
/// directory means nothing was queued.
pub async fn queued_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No import queue at {}", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
