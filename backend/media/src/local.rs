use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use chatrelay_core::{MediaStore, UploadError, UploadFile};

use crate::{DEFAULT_MAX_UPLOAD_BYTES, check_upload, stored_file_name};

/// Stores uploads in a local directory that `media_router` serves back.
pub struct LocalMediaStore {
    dir: PathBuf,
    public_base_url: String,
    max_bytes: usize,
}

impl LocalMediaStore {
    /// `public_base_url` is where the directory is reachable, e.g.
    /// `http://localhost:8080/media`.
    pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn upload(&self, file: &UploadFile) -> Result<String, UploadError> {
        check_upload(file, self.max_bytes)?;

        fs::create_dir_all(&self.dir).await?;
        let file_name = stored_file_name(&file.name);
        let path = self.dir.join(&file_name);
        debug!(path = %path.display(), bytes = file.len(), "Writing upload");
        fs::write(&path, &file.bytes).await?;

        info!(file = %file_name, "Stored upload locally");
        Ok(format!("{}/{}", self.public_base_url, file_name))
    }
}
