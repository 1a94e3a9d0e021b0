// ── Device state coordinator ──
//
// One instance per physical purifier. Owns the device snapshot, runs the
// periodic poll loop, and serializes polls and command writes against the
// snapshot lock. Poll failures keep the previous snapshot (stale but
// available); mutator failures propagate to the caller.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use blueair_api::{ApiClient, CommandValue};

use crate::error::CoreError;
use crate::model::{AttributeValue, DeviceSnapshot, model_name};

/// Poll-loop state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// No cycle in progress; the last one (if any) succeeded.
    Idle,
    /// A cycle is fetching from the cloud.
    Fetching,
    /// The last cycle failed; the previous snapshot is still served.
    Failed { message: String },
}

/// Timing configuration for one coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Interval between scheduled polls.
    pub poll_interval: Duration,
    /// Upper bound on a single poll cycle; exceeding it fails the cycle.
    pub poll_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            poll_timeout: Duration::from_secs(10),
        }
    }
}

/// Per-device polling coordinator.
///
/// Cheaply cloneable via `Arc`; all clones share the same snapshot and
/// poll loop. Construct with [`new`](Self::new), then [`start`](Self::start)
/// the loop; [`shutdown`](Self::shutdown) cancels future polls.
#[derive(Clone)]
pub struct DeviceCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    api: ApiClient,
    uuid: String,
    /// Externally supplied display name; also the info-query path segment.
    device_name: String,
    config: CoordinatorConfig,
    /// Single source of truth for this device. Written atomically: a poll
    /// replaces the whole snapshot, a mutator patches one attribute.
    snapshot: RwLock<DeviceSnapshot>,
    status: watch::Sender<PollStatus>,
    /// Wakes the poll loop for an out-of-band reconcile after a command.
    refresh_notify: Notify,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DeviceCoordinator {
    /// Create a coordinator with an empty snapshot. Does NOT poll --
    /// call [`start()`](Self::start) or [`refresh()`](Self::refresh).
    pub fn new(
        api: ApiClient,
        uuid: impl Into<String>,
        device_name: impl Into<String>,
        config: CoordinatorConfig,
    ) -> Self {
        let (status, _) = watch::channel(PollStatus::Idle);

        Self {
            inner: Arc::new(Inner {
                api,
                uuid: uuid.into(),
                device_name: device_name.into(),
                config,
                snapshot: RwLock::new(DeviceSnapshot::default()),
                status,
                refresh_notify: Notify::new(),
                cancel: CancellationToken::new(),
                task: Mutex::new(None),
            }),
        }
    }

    /// The device uuid.
    pub fn uuid(&self) -> &str {
        &self.inner.uuid
    }

    /// Subscribe to poll-loop state changes.
    pub fn status(&self) -> watch::Receiver<PollStatus> {
        self.inner.status.subscribe()
    }

    // ── Poll loop lifecycle ──────────────────────────────────────────

    /// Spawn the periodic poll loop.
    ///
    /// The first cycle runs immediately; afterwards the loop ticks every
    /// `poll_interval` and also wakes early when a mutator requests an
    /// out-of-band reconcile. Cycle failures are recorded and the loop
    /// keeps its schedule.
    pub async fn start(&self) {
        let mut guard = self.inner.task.lock().await;
        if guard.is_some() {
            return;
        }

        let coordinator = self.clone();
        let cancel = self.inner.cancel.child_token();
        *guard = Some(tokio::spawn(poll_task(coordinator, cancel)));
    }

    /// Stop future polls and wait for the loop to wind down.
    ///
    /// An in-flight cycle completes (bounded by the poll timeout); the
    /// snapshot is only ever written from a fully parsed response, so
    /// teardown cannot leave it half-updated.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(handle) = self.inner.task.lock().await.take() {
            let _ = handle.await;
        }
    }

    /// Run one poll cycle now and surface its outcome.
    ///
    /// On success the whole snapshot is replaced in a single assignment.
    /// On failure (including [`CoreError::PollTimeout`]) the previous
    /// snapshot stays intact and the error propagates to the caller.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let inner = &self.inner;
        let _ = inner.status.send(PollStatus::Fetching);

        let result = tokio::time::timeout(
            inner.config.poll_timeout,
            inner.api.get_device_info(&inner.device_name, &inner.uuid),
        )
        .await;

        let record = match result {
            Ok(Ok(record)) => record,
            Ok(Err(e)) => {
                let _ = inner.status.send(PollStatus::Failed {
                    message: e.to_string(),
                });
                return Err(e.into());
            }
            Err(_elapsed) => {
                let err = CoreError::PollTimeout {
                    timeout_secs: inner.config.poll_timeout.as_secs(),
                };
                let _ = inner.status.send(PollStatus::Failed {
                    message: err.to_string(),
                });
                return Err(err);
            }
        };

        let fresh = DeviceSnapshot::from(record);
        *inner.snapshot.write().await = fresh;

        let _ = inner.status.send(PollStatus::Idle);
        debug!(device = %inner.device_name, "snapshot refreshed");
        Ok(())
    }

    // ── Accessors ────────────────────────────────────────────────────
    //
    // All return `None` for "currently unknown" -- callers must be able
    // to distinguish unknown from false/zero.

    /// A full copy of the current snapshot.
    pub async fn snapshot(&self) -> DeviceSnapshot {
        self.inner.snapshot.read().await.clone()
    }

    /// A named sensor reading.
    pub async fn sensor(&self, name: &str) -> Option<f64> {
        self.inner.snapshot.read().await.sensors.get(name).copied()
    }

    /// A named state attribute.
    pub async fn attribute(&self, name: &str) -> Option<AttributeValue> {
        self.inner
            .snapshot
            .read()
            .await
            .attributes
            .get(name)
            .copied()
    }

    /// Current PM2.5 reading (µg/m³).
    pub async fn pm2_5(&self) -> Option<f64> {
        self.sensor("pm2_5").await
    }

    /// Filter usage percentage.
    pub async fn filter_usage(&self) -> Option<f64> {
        self.numeric_attribute("filterusage").await
    }

    /// Current fan speed.
    pub async fn fan_speed(&self) -> Option<f64> {
        self.numeric_attribute("fanspeed").await
    }

    /// LED brightness.
    pub async fn brightness(&self) -> Option<f64> {
        self.numeric_attribute("brightness").await
    }

    /// Whether the device is powered on: the inverse of `standby`.
    pub async fn is_on(&self) -> Option<bool> {
        self.boolean_attribute("standby").await.map(|standby| !standby)
    }

    pub async fn night_mode(&self) -> Option<bool> {
        self.boolean_attribute("nightmode").await
    }

    pub async fn child_lock(&self) -> Option<bool> {
        self.boolean_attribute("childlock").await
    }

    pub async fn auto_mode(&self) -> Option<bool> {
        self.boolean_attribute("automode").await
    }

    /// Device display name: the cloud-reported name, falling back to the
    /// externally supplied one.
    pub async fn device_name(&self) -> String {
        self.inner
            .snapshot
            .read()
            .await
            .info
            .name
            .clone()
            .unwrap_or_else(|| self.inner.device_name.clone())
    }

    /// Marketing model name from the hardware id, or the uuid when the
    /// hardware id is absent.
    pub async fn model(&self) -> String {
        match self.inner.snapshot.read().await.info.hardware_id.as_deref() {
            Some(hw) => model_name(hw).to_owned(),
            None => self.inner.uuid.clone(),
        }
    }

    async fn numeric_attribute(&self, name: &str) -> Option<f64> {
        self.attribute(name).await.and_then(|v| v.as_f64())
    }

    async fn boolean_attribute(&self, name: &str) -> Option<bool> {
        self.attribute(name).await.and_then(|v| v.as_bool())
    }

    // ── Mutators ─────────────────────────────────────────────────────
    //
    // Each sends the command, applies the optimistic snapshot patch only
    // on success, and nudges the poll loop to reconcile with ground truth.
    // Command failures leave the snapshot untouched and propagate.

    pub async fn set_fan_speed(&self, speed: i64) -> Result<(), CoreError> {
        self.write_attribute("fanspeed", CommandValue::Number(speed))
            .await
    }

    pub async fn set_brightness(&self, brightness: i64) -> Result<(), CoreError> {
        self.write_attribute("brightness", CommandValue::Number(brightness))
            .await
    }

    pub async fn set_auto_mode(&self, enabled: bool) -> Result<(), CoreError> {
        self.write_attribute("automode", CommandValue::Bool(enabled))
            .await
    }

    pub async fn set_night_mode(&self, enabled: bool) -> Result<(), CoreError> {
        self.write_attribute("nightmode", CommandValue::Bool(enabled))
            .await
    }

    pub async fn set_child_lock(&self, locked: bool) -> Result<(), CoreError> {
        self.write_attribute("childlock", CommandValue::Bool(locked))
            .await
    }

    /// Power is expressed on the wire as the inverse `standby` attribute.
    pub async fn set_power(&self, on: bool) -> Result<(), CoreError> {
        self.write_attribute("standby", CommandValue::Bool(!on))
            .await
    }

    async fn write_attribute(
        &self,
        attribute: &str,
        value: CommandValue,
    ) -> Result<(), CoreError> {
        let inner = &self.inner;

        inner
            .api
            .send_command(&inner.uuid, attribute, value)
            .await?;

        // Optimistic update: readers observe the intended value without
        // waiting for the next poll. Applied only after command success.
        inner
            .snapshot
            .write()
            .await
            .attributes
            .insert(attribute.to_owned(), AttributeValue::from(value));

        debug!(device = %inner.device_name, attribute, "optimistic update applied");

        // Out-of-band reconcile; a never-started loop simply ignores it.
        inner.refresh_notify.notify_one();
        Ok(())
    }
}

/// The periodic poll loop: first cycle immediately, then on the interval,
/// waking early for requested reconciles. Failures are recorded and the
/// previous snapshot stays available.
async fn poll_task(coordinator: DeviceCoordinator, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(coordinator.inner.config.poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {}
            () = coordinator.inner.refresh_notify.notified() => {}
        }

        if let Err(e) = coordinator.refresh().await {
            warn!(
                device = %coordinator.inner.device_name,
                error = %e,
                "poll cycle failed; serving previous snapshot"
            );
        }
    }

    debug!(device = %coordinator.inner.device_name, "poll loop stopped");
}
