use crate::{
    media::traits::{AuthorizationProvider, CapabilityScope, MediaStore},
    models::RawImage,
};
use thiserror::Error;

pub const DEFAULT_SAVE_FAILURE: &str = "Failed to save image";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    #[error("Photo library access is required to save images. Please enable it in Settings.")]
    AuthorizationDenied,
    #[error("{0}")]
    OperationFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Success,
    Failure(SaveError),
}

impl SaveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SaveOutcome::Success)
    }

    pub fn into_result(self) -> Result<(), SaveError> {
        match self {
            SaveOutcome::Success => Ok(()),
            SaveOutcome::Failure(e) => Err(e),
        }
    }
}

/// Authorize, then write. One authorization request and at most one write
/// per call.
pub struct PermissionedSaver<A, S> {
    authorization: A,
    store: S,
}

impl<A: AuthorizationProvider, S: MediaStore> PermissionedSaver<A, S> {
    pub fn new(authorization: A, store: S) -> Self {
        Self {
            authorization,
            store,
        }
    }

    pub async fn save(&self, image: &RawImage) -> SaveOutcome {
        let status = self
            .authorization
            .request_authorization(CapabilityScope::AddOnly)
            .await;

        if !status.permits_write() {
            log::warn!("Media write not authorized: {:?}", status);
            return SaveOutcome::Failure(SaveError::AuthorizationDenied);
        }

        match self.store.write(image).await {
            Ok(()) => {
                log::info!("Saved {}x{} image", image.width(), image.height());
                SaveOutcome::Success
            }
            Err(failure) => {
                let message = failure
                    .message
                    .unwrap_or_else(|| DEFAULT_SAVE_FAILURE.to_string());
                log::error!("Failed to save image: {}", message);
                SaveOutcome::Failure(SaveError::OperationFailed(message))
            }
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::traits::{AuthorizationStatus, WriteFailure};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedAuthorization {
        status: AuthorizationStatus,
        requests: Mutex<Vec<CapabilityScope>>,
    }

    impl FixedAuthorization {
        fn new(status: AuthorizationStatus) -> Self {
            Self {
                status,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AuthorizationProvider for FixedAuthorization {
        async fn request_authorization(&self, scope: CapabilityScope) -> AuthorizationStatus {
            self.requests.lock().unwrap().push(scope);
            self.status
        }
    }

    struct CountingStore {
        writes: AtomicUsize,
        failure: Option<WriteFailure>,
    }

    impl CountingStore {
        fn ok() -> Self {
            Self {
                writes: AtomicUsize::new(0),
                failure: None,
            }
        }

        fn failing(failure: WriteFailure) -> Self {
            Self {
                writes: AtomicUsize::new(0),
                failure: Some(failure),
            }
        }
    }

    #[async_trait]
    impl MediaStore for CountingStore {
        async fn write(&self, _image: &RawImage) -> Result<(), WriteFailure> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            match &self.failure {
                Some(failure) => Err(failure.clone()),
                None => Ok(()),
            }
        }
    }

    fn image() -> RawImage {
        RawImage::filled(2, 2, [0, 0, 0, 255])
    }

    #[tokio::test]
    async fn test_denied_never_writes() {
        for status in [AuthorizationStatus::Denied, AuthorizationStatus::NotDetermined] {
            let saver =
                PermissionedSaver::new(FixedAuthorization::new(status), CountingStore::ok());
            let outcome = saver.save(&image()).await;
            assert_eq!(outcome, SaveOutcome::Failure(SaveError::AuthorizationDenied));
            assert_eq!(saver.store().writes.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_full_and_limited_access_both_write() {
        for status in [AuthorizationStatus::Authorized, AuthorizationStatus::Limited] {
            let saver =
                PermissionedSaver::new(FixedAuthorization::new(status), CountingStore::ok());
            assert!(saver.save(&image()).await.is_success());
            assert_eq!(saver.store().writes.load(Ordering::SeqCst), 1);
            assert_eq!(
                *saver.authorization.requests.lock().unwrap(),
                vec![CapabilityScope::AddOnly]
            );
        }
    }

    #[tokio::test]
    async fn test_write_failure_carries_cause() {
        let saver = PermissionedSaver::new(
            FixedAuthorization::new(AuthorizationStatus::Authorized),
            CountingStore::failing(WriteFailure::new("Disk full")),
        );
        let outcome = saver.save(&image()).await;
        assert_eq!(
            outcome,
            SaveOutcome::Failure(SaveError::OperationFailed("Disk full".into()))
        );
        assert_eq!(saver.store().writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_write_failure_without_message_uses_default() {
        let saver = PermissionedSaver::new(
            FixedAuthorization::new(AuthorizationStatus::Limited),
            CountingStore::failing(WriteFailure::default()),
        );
        let err = saver.save(&image()).await.into_result().unwrap_err();
        assert_eq!(err.to_string(), DEFAULT_SAVE_FAILURE);
    }

    #[test]
    fn test_denied_message_is_actionable() {
        assert!(SaveError::AuthorizationDenied
            .to_string()
            .contains("Please enable it in Settings"));
    }
}
