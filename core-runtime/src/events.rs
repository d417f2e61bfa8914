//! # Event Bus System
//!
//! Broadcasts what the background bridge does so hosts can observe it without
//! polling: service start/shutdown, the exemption dialog lifecycle, and
//! configuration saves.
//!
//! ## Overview
//!
//! - **Event Types**: `CoreEvent` wrapping per-domain enums
//! - **EventBus**: `tokio::sync::broadcast` channel for publishing events
//! - **EventStream**: receiver wrapper with optional filtering
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, ServiceEvent};
//!
//! let bus = EventBus::new(16);
//! let mut stream = bus.subscribe();
//!
//! bus.emit(CoreEvent::Service(ServiceEvent::StartRequested {
//!     title: "Uploading".to_string(),
//! }))
//! .ok();
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber was too slow and missed `n`
//!   events; it can keep receiving.
//! - **`RecvError::Closed`**: every sender is gone; treat as shutdown.
//!
//! Emitting with no subscribers returns an error that callers ignore.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Foreground service signals
    Service(ServiceEvent),
    /// Permission and exemption dialog events
    Permission(PermissionEvent),
    /// Notification configuration persistence
    Configuration(ConfigurationEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Service(e) => e.description(),
            CoreEvent::Permission(e) => e.description(),
            CoreEvent::Configuration(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Service(ServiceEvent::StartFailed { .. }) => EventSeverity::Error,
            CoreEvent::Service(ServiceEvent::ShutdownFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Configuration(ConfigurationEvent::SaveFailed { .. }) => {
                EventSeverity::Warning
            }
            CoreEvent::Permission(PermissionEvent::ExemptionResolved { granted: false, .. }) => {
                EventSeverity::Warning
            }
            CoreEvent::Permission(PermissionEvent::ExemptionAbandoned { .. }) => {
                EventSeverity::Warning
            }
            CoreEvent::Service(ServiceEvent::StartRequested { .. }) => EventSeverity::Info,
            CoreEvent::Service(ServiceEvent::ShutdownRequested) => EventSeverity::Info,
            CoreEvent::Permission(PermissionEvent::ExemptionResolved { .. }) => {
                EventSeverity::Info
            }
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Service Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ServiceEvent {
    /// The start action was delivered to the service.
    StartRequested {
        /// Notification title shown by the service.
        title: String,
    },
    /// The launcher refused the start action.
    StartFailed { message: String },
    /// The shutdown action was delivered to the service.
    ShutdownRequested,
    /// The launcher refused the shutdown action (reported, never surfaced).
    ShutdownFailed { message: String },
}

impl ServiceEvent {
    fn description(&self) -> &str {
        match self {
            ServiceEvent::StartRequested { .. } => "Foreground service start requested",
            ServiceEvent::StartFailed { .. } => "Foreground service failed to start",
            ServiceEvent::ShutdownRequested => "Foreground service shutdown requested",
            ServiceEvent::ShutdownFailed { .. } => "Foreground service failed to stop",
        }
    }
}

// ============================================================================
// Permission Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PermissionEvent {
    /// An interactive context became available.
    ContextAttached { context: String },
    /// The interactive context went away.
    ContextDetached,
    /// The battery-optimization dialog was shown.
    ExemptionRequested { request_id: String },
    /// The user answered the dialog.
    ExemptionResolved { request_id: String, granted: bool },
    /// The dialog never produced an answer (cancelled, detached or timed out).
    ExemptionAbandoned { request_id: String, reason: String },
}

impl PermissionEvent {
    fn description(&self) -> &str {
        match self {
            PermissionEvent::ContextAttached { .. } => "Interactive context attached",
            PermissionEvent::ContextDetached => "Interactive context detached",
            PermissionEvent::ExemptionRequested { .. } => "Battery optimization exemption requested",
            PermissionEvent::ExemptionResolved { .. } => "Battery optimization exemption answered",
            PermissionEvent::ExemptionAbandoned { .. } => {
                "Battery optimization exemption abandoned"
            }
        }
    }
}

// ============================================================================
// Configuration Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ConfigurationEvent {
    /// The merged configuration was persisted.
    Saved,
    /// Persisting failed; the in-memory configuration is still used.
    SaveFailed { message: String },
}

impl ConfigurationEvent {
    fn description(&self) -> &str {
        match self {
            ConfigurationEvent::Saved => "Notification configuration saved",
            ConfigurationEvent::SaveFailed { .. } => "Notification configuration not saved",
        }
    }
}

impl fmt::Display for CoreEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus built on a broadcast channel.
///
/// Cloning the bus shares the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus holding up to `buffer_size` unread events per
    /// subscriber.
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size.max(1));
        Self { sender }
    }

    /// Publishes an event to every current subscriber.
    ///
    /// Returns the number of subscribers that received it, or an error when
    /// nobody is listening.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Subscribes to all future events.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.sender.subscribe())
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// Receiving side of the bus with optional filtering.
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only yield events matching `predicate`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Waits for the next matching event.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Returns the next matching event if one is already queued.
    pub fn try_recv(&mut self) -> Option<CoreEvent> {
        while let Ok(event) = self.receiver.try_recv() {
            if self.matches(&event) {
                return Some(event);
            }
        }
        None
    }

    fn matches(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }
}
