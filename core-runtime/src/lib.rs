//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the background bridge crates:
//! - Logging and tracing setup
//! - Bridge configuration and dependency injection
//! - Event bus for service, permission and configuration events

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{BridgeConfig, BridgeConfigBuilder};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventStream};
