use crate::{
    codec::PixelCodec,
    media::traits::{
        AuthorizationProvider, AuthorizationStatus, CapabilityScope, MediaStore, WriteFailure,
    },
    models::RawImage,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// Authorization source with a fixed answer, for platforms without a
/// permission prompt.
#[derive(Debug, Clone, Copy)]
pub struct StaticAuthorization {
    status: AuthorizationStatus,
}

impl StaticAuthorization {
    pub fn new(status: AuthorizationStatus) -> Self {
        Self { status }
    }

    pub fn granted() -> Self {
        Self::new(AuthorizationStatus::Authorized)
    }

    pub fn denied() -> Self {
        Self::new(AuthorizationStatus::Denied)
    }
}

#[async_trait]
impl AuthorizationProvider for StaticAuthorization {
    async fn request_authorization(&self, scope: CapabilityScope) -> AuthorizationStatus {
        log::debug!("Authorization for {:?}: {:?}", scope, self.status);
        self.status
    }
}

/// Writes each image as a new PNG file in a directory.
pub struct DirectoryMediaStore {
    dir: PathBuf,
    codec: PixelCodec,
    last_written: Mutex<Option<PathBuf>>,
}

impl DirectoryMediaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            codec: PixelCodec::default(),
            last_written: Mutex::new(None),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn last_written(&self) -> Option<PathBuf> {
        self.last_written
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn next_path(&self) -> PathBuf {
        let id = Uuid::new_v4().simple().to_string();
        self.dir.join(format!(
            "generated_{}_{}.png",
            chrono::Utc::now().format("%Y%m%d_%H%M%S"),
            &id[..8]
        ))
    }
}

#[async_trait]
impl MediaStore for DirectoryMediaStore {
    async fn write(&self, image: &RawImage) -> Result<(), WriteFailure> {
        let bytes = self
            .codec
            .encode_png(image)
            .map_err(|e| WriteFailure::new(e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            WriteFailure::new(format!("Cannot create {}: {}", self.dir.display(), e))
        })?;

        let path = self.next_path();
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| WriteFailure::new(format!("Cannot write {}: {}", path.display(), e)))?;

        log::info!("💾 Image saved to: {}", path.display());
        *self
            .last_written
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(path);
        Ok(())
    }
}
