//! # Bridge Configuration Module
//!
//! Provides configuration management for the background execution bridge.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `BridgeConfig` holding every host capability the core needs plus a few
//! tunables. It fails fast when a required bridge is missing.
//!
//! ## Required Dependencies
//!
//! - `SettingsStore` - Persists the notification configuration
//! - `PermissionOracle` - Wake-lock / battery-optimization facts and dialog
//! - `ForegroundServiceLauncher` - Start/shutdown signals for the service
//!
//! ## Optional Dependencies
//!
//! - `PlatformInfo` - Backs `getPlatformVersion`
//!
//! When the `desktop-shims` feature is enabled, the `bridge-desktop`
//! implementations are injected for anything not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::BridgeConfig;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let config = BridgeConfig::builder()
//!     .settings_store(Arc::new(MySettingsStore))
//!     .permission_oracle(Arc::new(MyPermissionOracle))
//!     .service_launcher(Arc::new(MyServiceLauncher))
//!     .exemption_timeout(Duration::from_secs(60))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{ForegroundServiceLauncher, PermissionOracle, PlatformInfo, SettingsStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// How long an exemption dialog may stay unanswered before the pending
/// `initialize` call fails with a timeout.
pub const DEFAULT_EXEMPTION_TIMEOUT: Duration = Duration::from_secs(120);

/// Shortest accepted exemption timeout.
pub const MIN_EXEMPTION_TIMEOUT: Duration = Duration::from_secs(1);
/// Longest accepted exemption timeout.
pub const MAX_EXEMPTION_TIMEOUT: Duration = Duration::from_secs(3600);
const MAX_EVENT_BUFFER_SIZE: usize = 10_000;

/// Application name used for the default desktop settings location.
pub const DEFAULT_APPLICATION_NAME: &str = "background-bridge";

/// Bridge configuration.
///
/// Holds all host capabilities and tunables. Use [`BridgeConfigBuilder`] to
/// construct instances.
#[derive(Clone)]
pub struct BridgeConfig {
    /// Persistent key-value settings (required)
    pub settings_store: Arc<dyn SettingsStore>,

    /// Permission facts and exemption dialog (required)
    pub permission_oracle: Arc<dyn PermissionOracle>,

    /// Foreground service start/shutdown (required)
    pub service_launcher: Arc<dyn ForegroundServiceLauncher>,

    /// Platform description (optional)
    pub platform_info: Option<Arc<dyn PlatformInfo>>,

    /// Upper bound on an unanswered exemption dialog
    pub exemption_timeout: Duration,

    /// Capacity of the event bus channel
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("settings_store", &"SettingsStore { ... }")
            .field("permission_oracle", &"PermissionOracle { ... }")
            .field("service_launcher", &"ForegroundServiceLauncher { ... }")
            .field(
                "platform_info",
                &self.platform_info.as_ref().map(|info| info.platform_version()),
            )
            .field("exemption_timeout", &self.exemption_timeout)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl BridgeConfig {
    /// Creates a new builder for constructing a `BridgeConfig`.
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// Validates tunables.
    ///
    /// - Exemption timeout must be between 1 second and 1 hour
    /// - Event buffer must hold at least one event and at most 10,000
    pub fn validate(&self) -> Result<()> {
        if self.exemption_timeout < MIN_EXEMPTION_TIMEOUT {
            return Err(Error::Config(
                "Exemption timeout must be at least 1 second".to_string(),
            ));
        }

        if self.exemption_timeout > MAX_EXEMPTION_TIMEOUT {
            return Err(Error::Config(
                "Exemption timeout exceeds maximum of 1 hour".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > MAX_EVENT_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "Event buffer size exceeds maximum of {}",
                MAX_EVENT_BUFFER_SIZE
            )));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn capability_missing(capability: &str, purpose: &str, mobile_hint: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "{} implementation is required {}. \
             Desktop: enable the 'desktop-shims' feature to use the bridge-desktop default. \
             Mobile: inject {}.",
            capability, purpose, mobile_hint
        ),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(path: Option<PathBuf>) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;
    use std::thread;
    use tokio::runtime::{Builder, Handle};

    let open = move || -> Result<SqliteSettingsStore> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::Internal(format!(
                    "Failed to create Tokio runtime for default settings store: {}",
                    e
                ))
            })?;

        runtime
            .block_on(async move {
                match path {
                    Some(path) => SqliteSettingsStore::new(path).await,
                    None => SqliteSettingsStore::for_application(DEFAULT_APPLICATION_NAME).await,
                }
            })
            .map_err(Error::SettingsStore)
    };

    // A runtime cannot be blocked on from inside another one.
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(open).join().map_err(|_| {
            Error::Internal("Thread panicked while creating default SettingsStore".to_string())
        })??,
        Err(_) => open()?,
    };

    Ok(Arc::new(store))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store(_path: Option<PathBuf>) -> Result<Arc<dyn SettingsStore>> {
    Err(capability_missing(
        "SettingsStore",
        "to persist the notification configuration",
        "SharedPreferences/UserDefaults-backed settings",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_permission_oracle() -> Result<Arc<dyn PermissionOracle>> {
    Ok(Arc::new(bridge_desktop::DesktopPermissionOracle::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_permission_oracle() -> Result<Arc<dyn PermissionOracle>> {
    Err(capability_missing(
        "PermissionOracle",
        "to check wake-lock and battery-optimization state",
        "a PowerManager-backed oracle",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_service_launcher() -> Result<Arc<dyn ForegroundServiceLauncher>> {
    Ok(Arc::new(bridge_desktop::TokioForegroundService::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_service_launcher() -> Result<Arc<dyn ForegroundServiceLauncher>> {
    Err(capability_missing(
        "ForegroundServiceLauncher",
        "to start and stop the foreground service",
        "a startForegroundService-backed launcher",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_platform_info() -> Option<Arc<dyn PlatformInfo>> {
    Some(Arc::new(bridge_desktop::DesktopPlatformInfo::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_platform_info() -> Option<Arc<dyn PlatformInfo>> {
    None
}

/// Builder for constructing [`BridgeConfig`] instances.
#[derive(Default)]
pub struct BridgeConfigBuilder {
    settings_path: Option<PathBuf>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    permission_oracle: Option<Arc<dyn PermissionOracle>>,
    service_launcher: Option<Arc<dyn ForegroundServiceLauncher>>,
    platform_info: Option<Arc<dyn PlatformInfo>>,
    exemption_timeout: Option<Duration>,
    event_buffer_size: Option<usize>,
}

impl BridgeConfigBuilder {
    /// Sets where the default desktop settings database lives.
    ///
    /// Ignored when a settings store is injected explicitly.
    pub fn settings_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    /// Sets the settings store implementation (required).
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Sets the permission oracle implementation (required).
    pub fn permission_oracle(mut self, oracle: Arc<dyn PermissionOracle>) -> Self {
        self.permission_oracle = Some(oracle);
        self
    }

    /// Sets the foreground service launcher implementation (required).
    pub fn service_launcher(mut self, launcher: Arc<dyn ForegroundServiceLauncher>) -> Self {
        self.service_launcher = Some(launcher);
        self
    }

    /// Sets the platform info implementation (optional).
    pub fn platform_info(mut self, info: Arc<dyn PlatformInfo>) -> Self {
        self.platform_info = Some(info);
        self
    }

    /// Sets how long an exemption dialog may stay unanswered.
    ///
    /// Default: 120 seconds
    pub fn exemption_timeout(mut self, timeout: Duration) -> Self {
        self.exemption_timeout = Some(timeout);
        self
    }

    /// Sets the event bus capacity.
    ///
    /// Default: 100 events
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds the final `BridgeConfig` instance.
    ///
    /// Returns an error if a required bridge is missing (and no desktop
    /// default is available) or a tunable is out of range.
    pub fn build(self) -> Result<BridgeConfig> {
        let settings_store = match self.settings_store {
            Some(store) => store,
            None => provide_default_settings_store(self.settings_path)?,
        };

        let permission_oracle = match self.permission_oracle {
            Some(oracle) => oracle,
            None => provide_default_permission_oracle()?,
        };

        let service_launcher = match self.service_launcher {
            Some(launcher) => launcher,
            None => provide_default_service_launcher()?,
        };

        let config = BridgeConfig {
            settings_store,
            permission_oracle,
            service_launcher,
            platform_info: self.platform_info.or_else(provide_default_platform_info),
            exemption_timeout: self.exemption_timeout.unwrap_or(DEFAULT_EXEMPTION_TIMEOUT),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}
