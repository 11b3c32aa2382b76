// Media artifact path allocation
use std::path::PathBuf;

use chrono::Utc;
use fleetlink_common::Result;
use tokio::fs;

/// Body written at allocation time. The real frame replaces it when the
/// camera's HTTP upload arrives.
const PLACEHOLDER_BODY: &[u8] = b"PLACEHOLDER_MEDIA";

/// Allocates writable artifact paths under the configured upload
/// directory, one per decoded record.
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    /// Open the store, creating the directory if needed.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// Allocate a path for the record at `index` of the current batch and
    /// drop a placeholder body there.
    pub async fn allocate(&self, index: usize) -> Result<String> {
        let name = format!("camera_{}_{}.png", Utc::now().timestamp_millis(), index);
        let path = self.dir.join(name);
        fs::write(&path, PLACEHOLDER_BODY).await?;
        Ok(path.to_string_lossy().into_owned())
    }
}
