//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the background-execution core and
//! the platform that actually owns foreground services, permissions and
//! preferences. Each trait represents a capability the core requires but that
//! must be implemented differently per platform (Android, desktop, tests).
//!
//! ## Traits
//!
//! ### Services & Permissions
//! - [`ForegroundServiceLauncher`](service::ForegroundServiceLauncher) - Start/shutdown signals for the long-running service
//! - [`PermissionOracle`](permission::PermissionOracle) - Wake-lock and battery-optimization queries plus the exemption dialog
//!
//! ### Storage
//! - [`SettingsStore`](storage::SettingsStore) - Key-value preferences storage
//!
//! ### Utilities
//! - [`PlatformInfo`](platform::PlatformInfo) - Human-readable platform version
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//! | Android  | host-provided (JNI) | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should convert platform-specific failures into it and keep
//! the message actionable.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks behind `Arc`.
//!
//! ## Example
//!
//! ```ignore
//! use bridge_traits::permission::{ExemptionResponder, InteractiveContext, PermissionOracle};
//! use bridge_traits::error::Result;
//!
//! struct AndroidPermissions { /* JNI handles */ }
//!
//! impl PermissionOracle for AndroidPermissions {
//!     fn is_wake_lock_permission_granted(&self) -> bool { true }
//!     fn is_ignoring_battery_optimizations(&self) -> bool { false }
//!
//!     fn request_battery_optimizations_off(
//!         &self,
//!         context: &InteractiveContext,
//!         responder: ExemptionResponder,
//!     ) -> Result<()> {
//!         // Launch the settings intent, keep `responder` until the activity result arrives.
//!         Ok(())
//!     }
//! }
//! ```

pub mod error;
pub mod notification;
pub mod permission;
pub mod platform;
pub mod service;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use notification::{IconReference, NotificationConfiguration, NotificationImportance};
pub use permission::{
    ExemptionOutcome, ExemptionReceiver, ExemptionResponder, InteractiveContext, PermissionOracle,
};
pub use platform::PlatformInfo;
pub use service::{ForegroundServiceLauncher, ServiceIntent, ServiceStatus};
pub use storage::{SettingsStore, SettingsTransaction};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
