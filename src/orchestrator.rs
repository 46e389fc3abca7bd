//! Debounced, single-flight cost estimation driven by parameter edits.
//!
//! Each call to [`CostEstimationOrchestrator::update`] bumps a generation
//! counter. A scheduled or in-flight estimate carries the counter value and
//! the parameters it was issued for; its result is applied only when both
//! still match, so late or out-of-order responses are dropped. The network
//! call itself is left to finish.

use crate::{
    client::CostEstimator,
    config::EstimatorConfig,
    debounce::Debouncer,
    error::Result,
    models::{CostEstimate, GenerationParameters},
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

#[derive(Debug, Clone, PartialEq)]
pub enum EstimateState {
    /// Prompt is empty; nothing scheduled or in flight.
    Idle,
    /// Waiting out the debounce window.
    Pending,
    Estimating {
        params: GenerationParameters,
    },
    Settled {
        params: GenerationParameters,
        estimate: CostEstimate,
    },
}

impl EstimateState {
    pub fn estimate(&self) -> Option<CostEstimate> {
        match self {
            EstimateState::Settled { estimate, .. } => Some(*estimate),
            _ => None,
        }
    }

    pub fn is_checking(&self) -> bool {
        matches!(
            self,
            EstimateState::Pending | EstimateState::Estimating { .. }
        )
    }
}

#[derive(Default)]
struct Tracking {
    generation: u64,
    latest: Option<GenerationParameters>,
    settled: Option<(GenerationParameters, CostEstimate)>,
}

impl Tracking {
    fn is_current(&self, generation: u64, params: &GenerationParameters) -> bool {
        self.generation == generation && self.latest.as_ref() == Some(params)
    }

    /// What to show when in-flight work is abandoned or fails.
    fn resting_state(&self) -> EstimateState {
        match (&self.settled, &self.latest) {
            (Some((params, estimate)), Some(latest)) if params == latest => {
                EstimateState::Settled {
                    params: params.clone(),
                    estimate: *estimate,
                }
            }
            _ => EstimateState::Idle,
        }
    }
}

struct Inner {
    tracking: Mutex<Tracking>,
    state_tx: watch::Sender<EstimateState>,
}

impl Inner {
    fn tracking(&self) -> MutexGuard<'_, Tracking> {
        self.tracking
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, state: EstimateState) {
        self.state_tx.send_replace(state);
    }

    fn begin(&self, generation: u64, params: &GenerationParameters) -> bool {
        let tracking = self.tracking();
        if !tracking.is_current(generation, params) {
            return false;
        }
        self.publish(EstimateState::Estimating {
            params: params.clone(),
        });
        true
    }

    fn finish(&self, generation: u64, params: GenerationParameters, result: Result<CostEstimate>) {
        let mut tracking = self.tracking();
        if !tracking.is_current(generation, &params) {
            log::debug!(
                "Discarding stale estimate for generation {} (current {})",
                generation,
                tracking.generation
            );
            return;
        }

        match result {
            Ok(estimate) => {
                log::debug!("Estimated cost {} for {}x{}", estimate, params.width, params.height);
                tracking.settled = Some((params.clone(), estimate));
                self.publish(EstimateState::Settled { params, estimate });
            }
            Err(e) => {
                log::warn!("Failed to check cost: {}", e);
                self.publish(tracking.resting_state());
            }
        }
    }
}

/// Turns a stream of parameter edits into an observable current estimate.
///
/// Estimation is advisory: failures are logged and never surface to the
/// caller. At most one estimate is scheduled or applied at a time.
pub struct CostEstimationOrchestrator<E: CostEstimator + 'static> {
    estimator: Arc<E>,
    debouncer: Debouncer,
    delay: Duration,
    inner: Arc<Inner>,
}

impl<E: CostEstimator + 'static> CostEstimationOrchestrator<E> {
    pub fn new(estimator: Arc<E>, config: &EstimatorConfig) -> Self {
        Self::with_delay(estimator, config.debounce())
    }

    pub fn with_delay(estimator: Arc<E>, delay: Duration) -> Self {
        let (state_tx, _) = watch::channel(EstimateState::Idle);
        Self {
            estimator,
            debouncer: Debouncer::new(),
            delay,
            inner: Arc::new(Inner {
                tracking: Mutex::new(Tracking::default()),
                state_tx,
            }),
        }
    }

    /// Feeds the latest parameters. Must be called from within a tokio
    /// runtime.
    pub fn update(&self, params: GenerationParameters) {
        let mut tracking = self.inner.tracking();

        if !params.has_prompt() {
            tracking.generation += 1;
            tracking.latest = None;
            tracking.settled = None;
            self.debouncer.cancel_all();
            self.inner.publish(EstimateState::Idle);
            return;
        }

        if tracking.latest.as_ref() == Some(&params) {
            return;
        }

        tracking.generation += 1;
        tracking.latest = Some(params.clone());
        let generation = tracking.generation;
        self.inner.publish(EstimateState::Pending);
        drop(tracking);

        let inner = Arc::clone(&self.inner);
        let estimator = Arc::clone(&self.estimator);
        self.debouncer.schedule(self.delay, async move {
            if !inner.begin(generation, &params) {
                return;
            }
            let result = estimator.estimate_cost(&params).await;
            inner.finish(generation, params, result);
        });
    }

    /// Abandons pending and in-flight work, keeping any estimate that
    /// still matches the latest parameters.
    pub fn cancel(&self) {
        let mut tracking = self.inner.tracking();
        tracking.generation += 1;
        self.debouncer.cancel_all();
        let checking = self.inner.state_tx.borrow().is_checking();
        if checking {
            self.inner.publish(tracking.resting_state());
        }
        // A later update with the same parameters must be able to re-trigger.
        if tracking.resting_state() == EstimateState::Idle {
            tracking.latest = None;
        }
    }

    pub fn state(&self) -> EstimateState {
        self.inner.state_tx.borrow().clone()
    }

    pub fn current_estimate(&self) -> Option<CostEstimate> {
        self.inner.state_tx.borrow().estimate()
    }

    pub fn is_checking(&self) -> bool {
        self.inner.state_tx.borrow().is_checking()
    }

    pub fn subscribe(&self) -> watch::Receiver<EstimateState> {
        self.inner.state_tx.subscribe()
    }

    pub fn updates(&self) -> WatchStream<EstimateState> {
        WatchStream::new(self.subscribe())
    }
}
