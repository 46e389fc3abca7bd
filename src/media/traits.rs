use crate::models::RawImage;
use async_trait::async_trait;
use std::fmt;

/// Narrow permission requested from the platform before writing media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityScope {
    /// Add new items to the media library; no read access.
    AddOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorizationStatus {
    Authorized,
    Limited,
    Denied,
    NotDetermined,
}

impl AuthorizationStatus {
    pub fn permits_write(&self) -> bool {
        matches!(
            self,
            AuthorizationStatus::Authorized | AuthorizationStatus::Limited
        )
    }
}

/// Failure reported by a media store; the message is shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteFailure {
    pub message: Option<String>,
}

impl WriteFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

impl fmt::Display for WriteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message.as_deref().unwrap_or("unknown write failure"))
    }
}

#[async_trait]
pub trait AuthorizationProvider: Send + Sync {
    /// Suspends until the platform (or the user) decides.
    async fn request_authorization(&self, scope: CapabilityScope) -> AuthorizationStatus;
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn write(&self, image: &RawImage) -> std::result::Result<(), WriteFailure>;
}
