//! Foreground Service Lifecycle
//!
//! Start/shutdown signalling for the long-running execution unit that keeps
//! the host process alive.

use async_trait::async_trait;

use crate::{error::Result, notification::NotificationConfiguration};

pub const ACTION_START: &str = "start";
pub const ACTION_SHUTDOWN: &str = "shutdown";

/// Signal sent to the foreground service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceIntent {
    /// Start (or refresh) the service showing the given notification.
    Start(NotificationConfiguration),
    /// Stop the service and release any held locks.
    Shutdown,
}

impl ServiceIntent {
    /// Action string understood by the host service.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Start(_) => ACTION_START,
            Self::Shutdown => ACTION_SHUTDOWN,
        }
    }
}

/// Last known state of the foreground service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Running,
    Stopped,
    /// The host cannot report service state.
    Unknown,
}

/// Foreground service launcher trait
///
/// Abstracts how the host starts and stops its keep-alive service:
/// - **Android**: `startForegroundService`/`startService` with an intent action
/// - **Desktop**: a Tokio task standing in for the service
///
/// Delivery is asynchronous from the caller's point of view: `Ok(())` means
/// the signal was accepted, not that the service already reached the target
/// state.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::service::{ForegroundServiceLauncher, ServiceIntent};
/// use bridge_traits::NotificationConfiguration;
///
/// async fn keep_alive(launcher: &dyn ForegroundServiceLauncher) -> Result<()> {
///     launcher
///         .send(ServiceIntent::Start(NotificationConfiguration::default()))
///         .await
/// }
/// ```
#[async_trait]
pub trait ForegroundServiceLauncher: Send + Sync {
    /// Deliver a start or shutdown signal to the service.
    async fn send(&self, intent: ServiceIntent) -> Result<()>;

    /// Report the service state, if the host can observe it.
    async fn status(&self) -> ServiceStatus {
        ServiceStatus::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_actions() {
        let start = ServiceIntent::Start(NotificationConfiguration::default());

        assert_eq!(start.action(), ACTION_START);
        assert_eq!(ServiceIntent::Shutdown.action(), ACTION_SHUTDOWN);
    }
}
