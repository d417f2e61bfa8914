//! Foreground Service Host Implementation

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    notification::NotificationConfiguration,
    service::{ForegroundServiceLauncher, ServiceIntent, ServiceStatus},
    time::{Clock, SystemClock},
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(30);

/// Tokio-hosted stand-in for an OS foreground service.
///
/// `Start` spawns a keep-alive task that ticks until `Shutdown`; a second
/// `Start` while running only swaps the displayed notification.
pub struct TokioForegroundService {
    running: Arc<RwLock<Option<RunningService>>>,
    heartbeats: Arc<AtomicU64>,
    starts: AtomicU64,
    heartbeat: Duration,
    clock: Arc<dyn Clock>,
}

struct RunningService {
    notification: NotificationConfiguration,
    started_at: i64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl TokioForegroundService {
    pub fn new() -> Self {
        Self::with_heartbeat(DEFAULT_HEARTBEAT)
    }

    /// Service whose keep-alive task ticks every `heartbeat`.
    pub fn with_heartbeat(heartbeat: Duration) -> Self {
        Self::with_heartbeat_and_clock(heartbeat, Arc::new(SystemClock))
    }

    pub fn with_heartbeat_and_clock(heartbeat: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            running: Arc::new(RwLock::new(None)),
            heartbeats: Arc::new(AtomicU64::new(0)),
            starts: AtomicU64::new(0),
            heartbeat,
            clock,
        }
    }

    /// Notification currently shown, if the service is running.
    pub async fn current_notification(&self) -> Option<NotificationConfiguration> {
        let running = self.running.read().await;
        running.as_ref().map(|service| service.notification.clone())
    }

    /// Whether the running service holds a wifi lock.
    pub async fn holds_wifi_lock(&self) -> bool {
        let running = self.running.read().await;
        running
            .as_ref()
            .is_some_and(|service| service.notification.wifi_lock_enabled)
    }

    /// Unix millis at which the current run started.
    pub async fn started_at(&self) -> Option<i64> {
        let running = self.running.read().await;
        running.as_ref().map(|service| service.started_at)
    }

    /// Number of times a fresh keep-alive task was spawned.
    pub fn start_count(&self) -> u64 {
        self.starts.load(Ordering::SeqCst)
    }

    /// Keep-alive ticks observed across all runs.
    pub fn heartbeat_count(&self) -> u64 {
        self.heartbeats.load(Ordering::SeqCst)
    }

    async fn start(&self, notification: NotificationConfiguration) {
        let mut running = self.running.write().await;

        if let Some(service) = running.as_mut() {
            if service.notification.wifi_lock_enabled != notification.wifi_lock_enabled {
                debug!(
                    wifi_lock = notification.wifi_lock_enabled,
                    "Updating wifi lock on running service"
                );
            }
            debug!(title = %notification.title, "Service already running; refreshing notification");
            service.notification = notification;
            return;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(Self::keep_alive(
            cancel.clone(),
            self.heartbeat,
            Arc::clone(&self.heartbeats),
        ));

        info!(
            title = %notification.title,
            importance = ?notification.importance,
            wifi_lock = notification.wifi_lock_enabled,
            service_type = notification.service_type_flags,
            "Foreground service started"
        );

        self.starts.fetch_add(1, Ordering::SeqCst);
        *running = Some(RunningService {
            notification,
            started_at: self.clock.unix_timestamp_millis(),
            cancel,
            handle,
        });
    }

    async fn shutdown(&self) {
        let service = self.running.write().await.take();

        match service {
            Some(service) => {
                service.cancel.cancel();
                if let Err(err) = service.handle.await {
                    debug!(error = %err, "Keep-alive task ended abnormally");
                }
                info!("Foreground service stopped");
            }
            None => debug!("Shutdown requested but service is not running"),
        }
    }

    async fn keep_alive(cancel: CancellationToken, period: Duration, heartbeats: Arc<AtomicU64>) {
        let mut ticker = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let count = heartbeats.fetch_add(1, Ordering::SeqCst) + 1;
                    debug!(heartbeat = count, "Foreground service alive");
                }
            }
        }
    }
}

impl Default for TokioForegroundService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ForegroundServiceLauncher for TokioForegroundService {
    async fn send(&self, intent: ServiceIntent) -> Result<()> {
        debug!(action = intent.action(), "Service intent received");

        match intent {
            ServiceIntent::Start(notification) => self.start(notification).await,
            ServiceIntent::Shutdown => self.shutdown().await,
        }
        Ok(())
    }

    async fn status(&self) -> ServiceStatus {
        if self.running.read().await.is_some() {
            ServiceStatus::Running
        } else {
            ServiceStatus::Stopped
        }
    }
}
