//! # Background Execution Core
//!
//! Keeps a host process alive in the background: decides from the host's
//! wake-lock and battery-optimization facts whether the foreground service
//! may start, asks the user for the exemption when it can, and persists the
//! notification the service shows.
//!
//! ## Components
//!
//! - [`ConfigurationStore`] - notification settings in the host `SettingsStore`
//! - [`PermissionState`] - permission facts and the decision table
//! - [`Attachment`] - interactive context state machine
//! - [`BackgroundExecutionController`] - initialize / enable / disable
//! - [`CommandDispatcher`] - named commands in, one response out
//!
//! ## Usage
//!
//! ```ignore
//! use core_background::{BackgroundExecutionController, CommandDispatcher, MethodCall};
//! use std::sync::Arc;
//!
//! let controller = Arc::new(BackgroundExecutionController::from_config(&config, bus).await);
//! let dispatcher = CommandDispatcher::new(controller, config.platform_info.clone());
//!
//! let response = dispatcher.dispatch(MethodCall::new("hasPermissions")).await;
//! ```

pub mod attachment;
pub mod configuration;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod exemption;
pub mod permissions;

pub use attachment::Attachment;
pub use configuration::{ConfigurationStore, PartialNotificationConfiguration};
pub use controller::BackgroundExecutionController;
pub use dispatcher::{Command, CommandDispatcher, MethodCall, MethodResponse};
pub use error::{BackgroundError, ErrorKind, Result};
pub use exemption::ExemptionState;
pub use permissions::{InitializeDecision, PermissionState};
