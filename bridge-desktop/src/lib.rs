//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! Desktop operating systems have no foreground-service or battery
//! optimization concepts, so these adapters model them:
//! - `SettingsStore` using a SQLite-backed key-value table
//! - `ForegroundServiceLauncher` using a Tokio keep-alive task
//! - `PermissionOracle` that reports (and grants) everything
//! - `PlatformInfo` from the compile-time OS name and kernel release
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{DesktopPermissionOracle, SqliteSettingsStore, TokioForegroundService};
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = SqliteSettingsStore::in_memory().await.unwrap();
//!     let service = TokioForegroundService::new();
//!     let permissions = DesktopPermissionOracle::new();
//!
//!     // Hand them to `core_runtime::config::BridgeConfig::builder()`
//! }
//! ```

mod permission;
mod platform;
mod service;
mod settings;

pub use permission::DesktopPermissionOracle;
pub use platform::DesktopPlatformInfo;
pub use service::TokioForegroundService;
pub use settings::SqliteSettingsStore;
