use crate::{
    client::ImageGenerator,
    error::{Result, RetroError},
    models::{GenerationParameters, RawImage},
};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// Backs the "generate" action: one generation at a time, with the result
/// kept in an observable cell.
///
/// Parameter edits made while a generation runs do not cancel it.
pub struct GenerationSession<G: ImageGenerator + 'static> {
    generator: Arc<G>,
    image_tx: watch::Sender<Option<Arc<RawImage>>>,
    loading_tx: watch::Sender<bool>,
    last_error: Mutex<Option<String>>,
    remaining_balance: Mutex<Option<f64>>,
}

/// Clears the loading flag even if the generate future is dropped midway.
struct LoadingGuard<'a>(&'a watch::Sender<bool>);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}

impl<G: ImageGenerator + 'static> GenerationSession<G> {
    pub fn new(generator: Arc<G>) -> Self {
        let (image_tx, _) = watch::channel(None);
        let (loading_tx, _) = watch::channel(false);
        Self {
            generator,
            image_tx,
            loading_tx,
            last_error: Mutex::new(None),
            remaining_balance: Mutex::new(None),
        }
    }

    pub async fn generate(
        &self,
        params: &GenerationParameters,
        source: Option<&RawImage>,
    ) -> Result<Arc<RawImage>> {
        if !params.has_prompt() && source.is_none() {
            return Err(RetroError::InvalidRequest("Prompt is empty".into()));
        }

        let claimed = self.loading_tx.send_if_modified(|loading| {
            if *loading {
                false
            } else {
                *loading = true;
                true
            }
        });
        if !claimed {
            log::debug!("Ignoring generate request while another is running");
            return Err(RetroError::GenerationInProgress);
        }
        let _loading = LoadingGuard(&self.loading_tx);

        match self.generator.generate_detailed(params, source).await {
            Ok(result) => {
                let image = Arc::new(result.image);
                *lock(&self.last_error) = None;
                if result.remaining_balance.is_some() {
                    *lock(&self.remaining_balance) = result.remaining_balance;
                }
                self.image_tx.send_replace(Some(Arc::clone(&image)));
                Ok(image)
            }
            Err(e) => {
                log::error!("Generation failed: {}", e);
                *lock(&self.last_error) = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        *self.loading_tx.borrow()
    }

    pub fn current_image(&self) -> Option<Arc<RawImage>> {
        self.image_tx.borrow().clone()
    }

    /// Message of the most recent failure, cleared by the next success.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.last_error).clone()
    }

    pub fn remaining_balance(&self) -> Option<f64> {
        *lock(&self.remaining_balance)
    }

    pub fn subscribe_image(&self) -> watch::Receiver<Option<Arc<RawImage>>> {
        self.image_tx.subscribe()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading_tx.subscribe()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
