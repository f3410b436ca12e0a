// ── Controller abstraction ──
//
// Lifecycle management for one appliance: lazy discovery, serialized
// poll cycles under a timeout envelope, the last good snapshot, writes,
// and an optional background refresh loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use windhager_api::{TransportConfig, WindhagerClient};

use crate::climate::{ClimateCommand, ClimateZone};
use crate::config::ControllerConfig;
use crate::discovery::{self, DiscoveryPhase, Registry, RegistryCell};
use crate::error::CoreError;
use crate::model::{FunctionPath, Oid, PointValue, Snapshot};
use crate::poll;
use crate::scan::{self, ScanSummary};

/// Consecutive timeouts after which refresh failures are logged as errors.
pub const TIMEOUT_ESCALATION: u32 = 3;

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Nothing touches the
/// network until the first [`refresh()`](Self::refresh),
/// [`validate()`](Self::validate) or write.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    client: WindhagerClient,
    host: String,
    registry: RegistryCell,
    snapshot: ArcSwapOption<Snapshot>,
    /// Serializes poll cycles.
    cycle: Mutex<()>,
    consecutive_timeouts: AtomicU32,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Create a controller. Does not connect.
    pub fn new(config: ControllerConfig) -> Self {
        let transport = TransportConfig {
            timeout: config.timeout,
            accept_invalid_certs: config.accept_invalid_certs,
        };
        let client = WindhagerClient::new(
            config.url.clone(),
            config.username.clone(),
            config.password.clone(),
            &transport,
        );
        let host = config.host_label();

        Self {
            inner: Arc::new(ControllerInner {
                config,
                client,
                host,
                registry: RegistryCell::new(),
                snapshot: ArcSwapOption::empty(),
                cycle: Mutex::new(()),
                consecutive_timeouts: AtomicU32::new(0),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Access the controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// The underlying API client.
    pub fn client(&self) -> &WindhagerClient {
        &self.inner.client
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Check that the appliance answers and accepts the credentials.
    ///
    /// Returns the number of nodes on the bus.
    pub async fn validate(&self) -> Result<usize, CoreError> {
        let devices = self.inner.client.devices().await?;
        info!(host = %self.inner.host, nodes = devices.len(), "appliance reachable");
        Ok(devices.len())
    }

    /// Spawn the background refresh loop, if an interval is configured.
    pub async fn start(&self) {
        let interval_secs = self.inner.config.refresh_interval_secs;
        if interval_secs == 0 {
            debug!("refresh interval is 0, background refresh disabled");
            return;
        }

        let mut handles = self.inner.task_handles.lock().await;
        if !handles.is_empty() {
            return;
        }
        let ctrl = self.clone();
        let cancel = self.inner.cancel.clone();
        handles.push(tokio::spawn(refresh_task(ctrl, interval_secs, cancel)));
        info!(interval_secs, "background refresh started");
    }

    /// Stop background tasks and release the HTTP session.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner.client.close();
        debug!("controller shut down");
    }

    /// Run `f` against a fresh controller without background refresh,
    /// then shut it down.
    pub async fn oneshot<F, Fut, T>(config: ControllerConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.refresh_interval_secs = 0;

        let controller = Controller::new(cfg);
        let result = f(controller.clone()).await;
        controller.shutdown().await;
        result
    }

    // ── Discovery ────────────────────────────────────────────────

    /// The registry, discovering it on first use.
    pub async fn registry(&self) -> Result<Arc<Registry>, CoreError> {
        let inner = &self.inner;
        inner
            .registry
            .get_or_discover(|| discovery::fetch_and_discover(&inner.client, &inner.host))
            .await
    }

    pub fn discovery_phase(&self) -> DiscoveryPhase {
        self.inner.registry.phase()
    }

    /// Subscribe to discovery phase changes.
    pub fn discovery_events(&self) -> watch::Receiver<DiscoveryPhase> {
        self.inner.registry.subscribe()
    }

    // ── Polling ──────────────────────────────────────────────────

    /// Run one poll cycle (discovering first if needed) and publish it.
    ///
    /// The cycle is bounded by `poll_timeout`. On timeout nothing is
    /// published, the previous snapshot stays current, and
    /// [`CoreError::Timeout`] is returned.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, CoreError> {
        let _cycle = self.inner.cycle.lock().await;
        let timeout = self.inner.config.poll_timeout;

        match tokio::time::timeout(timeout, self.poll_cycle()).await {
            Ok(Ok(snapshot)) => {
                self.inner.consecutive_timeouts.store(0, Ordering::Relaxed);
                self.inner.snapshot.store(Some(Arc::clone(&snapshot)));
                Ok(snapshot)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                let count = self
                    .inner
                    .consecutive_timeouts
                    .fetch_add(1, Ordering::Relaxed)
                    + 1;
                if count >= TIMEOUT_ESCALATION {
                    error!(count, "multiple consecutive poll timeouts");
                } else {
                    warn!(count, timeout_secs = timeout.as_secs(), "poll cycle timed out");
                }
                Err(CoreError::Timeout {
                    timeout_secs: timeout.as_secs(),
                })
            }
        }
    }

    async fn poll_cycle(&self) -> Result<Arc<Snapshot>, CoreError> {
        let registry = self.registry().await?;
        Ok(Arc::new(poll::poll(&self.inner.client, &registry).await))
    }

    /// The last successfully published snapshot.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.snapshot.load_full()
    }

    /// Poll cycles that timed out since the last successful one.
    pub fn consecutive_timeouts(&self) -> u32 {
        self.inner.consecutive_timeouts.load(Ordering::Relaxed)
    }

    /// Read a single OID outside the poll cycle.
    pub async fn read_oid(&self, oid: &Oid) -> Result<Option<PointValue>, CoreError> {
        Ok(poll::read(&self.inner.client, oid).await?)
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Write one datapoint. Errors propagate; the new value is visible
    /// after the next refresh.
    pub async fn write_oid(&self, oid: &Oid, value: &str) -> Result<(), CoreError> {
        debug!(oid = %oid, value, "writing datapoint");
        self.inner.client.write_datapoint(oid.as_str(), value).await?;
        Ok(())
    }

    /// Apply `command` to the zone at `prefix`.
    ///
    /// Whether a manual setpoint is running is read from the last
    /// snapshot; without one it is assumed not to be.
    pub async fn climate(
        &self,
        prefix: FunctionPath,
        command: ClimateCommand,
    ) -> Result<(), CoreError> {
        command.validate()?;

        let custom_active = self.snapshot().is_some_and(|snap| {
            snap.devices
                .iter()
                .filter(|d| d.climate_prefix() == Some(prefix))
                .filter_map(|d| ClimateZone::new(d, &snap))
                .any(|zone| zone.custom_active())
        });

        for (oid, value) in command.writes(prefix, custom_active) {
            self.write_oid(&oid, &value).await?;
        }
        info!(prefix = %prefix, ?command, "climate command applied");
        Ok(())
    }

    // ── Diagnostics ──────────────────────────────────────────────

    /// Walk and log the whole lookup tree.
    pub async fn full_system_scan(&self) -> Result<ScanSummary, CoreError> {
        scan::full_system_scan(&self.inner.client).await
    }
}

// ── Background tasks ─────────────────────────────────────────────

async fn refresh_task(controller: Controller, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = controller.refresh().await {
                    if !e.is_timeout() {
                        warn!(error = %e, "periodic refresh failed");
                    }
                }
            }
        }
    }
}
