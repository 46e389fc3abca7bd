use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Quiet period used for cost estimation while the user types or drags.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Handle to exactly one scheduled invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DebounceToken(u64);

struct Scheduled {
    id: u64,
    handle: JoinHandle<()>,
}

/// Single-slot delay-then-invoke primitive.
///
/// Scheduling replaces whatever was waiting in the slot, so only the most
/// recently scheduled action can fire. Once an action fires it leaves the
/// slot: later `cancel` calls and later schedules never interrupt it.
///
/// Must be used from inside a tokio runtime.
#[derive(Default)]
pub struct Debouncer {
    slot: Arc<Mutex<Option<Scheduled>>>,
    next_id: AtomicU64,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F>(&self, delay: Duration, action: F) -> DebounceToken
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let slot = Arc::clone(&self.slot);

        // Held across the spawn so the task cannot observe the slot before
        // it has been filled.
        let mut guard = lock(&self.slot);
        if let Some(previous) = guard.take() {
            log::trace!("Debounce {} superseded by {}", previous.id, id);
            previous.handle.abort();
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let fire = {
                let mut guard = lock(&slot);
                let current = matches!(guard.as_ref(), Some(scheduled) if scheduled.id == id);
                if current {
                    *guard = None;
                }
                current
            };

            if fire {
                action.await;
            }
        });

        *guard = Some(Scheduled { id, handle });
        DebounceToken(id)
    }

    /// Prevents `token`'s action from running. Returns `false` when the
    /// action already fired or was superseded.
    pub fn cancel(&self, token: DebounceToken) -> bool {
        let mut guard = lock(&self.slot);
        match guard.take() {
            Some(scheduled) if scheduled.id == token.0 => {
                scheduled.handle.abort();
                true
            }
            other => {
                *guard = other;
                false
            }
        }
    }

    pub fn cancel_all(&self) {
        if let Some(scheduled) = lock(&self.slot).take() {
            scheduled.handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.slot).is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn recorder() -> Arc<Mutex<Vec<usize>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn record(log: &Arc<Mutex<Vec<usize>>>, value: usize) -> impl Future<Output = ()> + Send {
        let log = Arc::clone(log);
        async move {
            log.lock().unwrap().push(value);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_schedules_fire_only_the_last() {
        let debouncer = Debouncer::new();
        let calls = recorder();

        for i in 0..5 {
            debouncer.schedule(DEFAULT_DEBOUNCE, record(&calls, i));
            sleep(Duration::from_millis(100)).await;
        }
        assert!(calls.lock().unwrap().is_empty());

        sleep(Duration::from_secs(2)).await;
        assert_eq!(*calls.lock().unwrap(), vec![4]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_expiry_suppresses_action() {
        let debouncer = Debouncer::new();
        let calls = recorder();

        let token = debouncer.schedule(DEFAULT_DEBOUNCE, record(&calls, 1));
        sleep(Duration::from_millis(200)).await;
        assert!(debouncer.cancel(token));

        sleep(Duration::from_secs(1)).await;
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_firing_is_a_no_op() {
        let debouncer = Debouncer::new();
        let calls = recorder();

        let token = debouncer.schedule(Duration::from_millis(50), record(&calls, 7));
        sleep(Duration::from_millis(100)).await;

        assert!(!debouncer.cancel(token));
        assert_eq!(*calls.lock().unwrap(), vec![7]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_token_does_not_cancel_newer_action() {
        let debouncer = Debouncer::new();
        let calls = recorder();

        let old = debouncer.schedule(DEFAULT_DEBOUNCE, record(&calls, 1));
        debouncer.schedule(DEFAULT_DEBOUNCE, record(&calls, 2));
        assert!(!debouncer.cancel(old));

        sleep(Duration::from_secs(1)).await;
        assert_eq!(*calls.lock().unwrap(), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_action_survives_new_schedule() {
        let debouncer = Debouncer::new();
        let calls = recorder();

        let slow = {
            let calls = Arc::clone(&calls);
            async move {
                sleep(Duration::from_secs(1)).await;
                calls.lock().unwrap().push(1);
            }
        };
        debouncer.schedule(Duration::from_millis(10), slow);
        sleep(Duration::from_millis(50)).await;

        debouncer.schedule(Duration::from_millis(10), record(&calls, 2));
        sleep(Duration::from_secs(2)).await;

        let mut seen = calls.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_action() {
        let calls = recorder();
        {
            let debouncer = Debouncer::new();
            debouncer.schedule(DEFAULT_DEBOUNCE, record(&calls, 1));
        }
        sleep(Duration::from_secs(1)).await;
        assert!(calls.lock().unwrap().is_empty());
    }
}
