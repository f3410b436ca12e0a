// ── Discovery state machine ──
//
// Uninitialized -> Discovering -> Ready. Exactly one caller runs
// discovery; overlapping callers wait for it to finish. A failed or
// cancelled attempt falls back to Uninitialized so the next caller
// retries. Ready is terminal.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::debug;

use super::Registry;
use crate::error::CoreError;

/// Observable discovery phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DiscoveryPhase {
    Uninitialized,
    Discovering,
    Ready,
}

enum State {
    Uninitialized,
    Discovering,
    Ready(Arc<Registry>),
}

pub(crate) struct RegistryCell {
    state: Mutex<State>,
    phase: watch::Sender<DiscoveryPhase>,
}

impl RegistryCell {
    pub(crate) fn new() -> Self {
        let (phase, _) = watch::channel(DiscoveryPhase::Uninitialized);
        Self {
            state: Mutex::new(State::Uninitialized),
            phase,
        }
    }

    pub(crate) fn phase(&self) -> DiscoveryPhase {
        *self.phase.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<DiscoveryPhase> {
        self.phase.subscribe()
    }

    /// The published registry, if discovery has completed.
    pub(crate) fn get(&self) -> Option<Arc<Registry>> {
        match &*self.lock() {
            State::Ready(registry) => Some(Arc::clone(registry)),
            State::Uninitialized | State::Discovering => None,
        }
    }

    /// Return the registry, running `discover` first if nobody has yet.
    pub(crate) async fn get_or_discover<F, Fut>(
        &self,
        discover: F,
    ) -> Result<Arc<Registry>, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Registry, CoreError>>,
    {
        loop {
            let mut rx = {
                let mut state = self.lock();
                match &*state {
                    State::Ready(registry) => return Ok(Arc::clone(registry)),
                    State::Uninitialized => {
                        *state = State::Discovering;
                        self.phase.send_replace(DiscoveryPhase::Discovering);
                        break;
                    }
                    State::Discovering => self.phase.subscribe(),
                }
            };
            debug!("discovery already running, waiting");
            // The sender lives in `self`, so this only errors if `self` is gone.
            let _ = rx
                .wait_for(|phase| *phase != DiscoveryPhase::Discovering)
                .await;
        }

        let guard = ResetOnDrop { cell: self };
        let registry = Arc::new(discover().await?);
        std::mem::forget(guard);

        *self.lock() = State::Ready(Arc::clone(&registry));
        self.phase.send_replace(DiscoveryPhase::Ready);
        Ok(registry)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Puts the cell back to `Uninitialized` if discovery errors or is dropped
/// mid-flight.
struct ResetOnDrop<'a> {
    cell: &'a RegistryCell,
}

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        *self.cell.lock() = State::Uninitialized;
        self.cell.phase.send_replace(DiscoveryPhase::Uninitialized);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn discovers_once() {
        let cell = RegistryCell::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            cell.get_or_discover(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Registry::default())
            })
            .await
            .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cell.phase(), DiscoveryPhase::Ready);
        assert!(cell.get().is_some());
    }

    #[tokio::test]
    async fn failure_returns_to_uninitialized() {
        let cell = RegistryCell::new();
        let result = cell
            .get_or_discover(|| async { Err(CoreError::Internal("boom".into())) })
            .await;
        assert!(result.is_err());
        assert_eq!(cell.phase(), DiscoveryPhase::Uninitialized);
        assert!(cell.get().is_none());

        cell.get_or_discover(|| async { Ok(Registry::default()) })
            .await
            .unwrap();
        assert_eq!(cell.phase(), DiscoveryPhase::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_discovery_resets() {
        let cell = RegistryCell::new();
        let attempt = cell.get_or_discover(|| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Registry::default())
        });
        let timed_out = tokio::time::timeout(Duration::from_secs(1), attempt).await;
        assert!(timed_out.is_err());
        assert_eq!(cell.phase(), DiscoveryPhase::Uninitialized);
        assert!(cell.get().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_callers_share_one_discovery() {
        let cell = Arc::new(RegistryCell::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let run = |cell: Arc<RegistryCell>, calls: Arc<AtomicUsize>| async move {
            cell.get_or_discover(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(Registry::default())
            })
            .await
        };

        let (a, b) = tokio::join!(
            run(Arc::clone(&cell), Arc::clone(&calls)),
            run(Arc::clone(&cell), Arc::clone(&calls))
        );
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
