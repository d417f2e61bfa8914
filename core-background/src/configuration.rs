//! # Notification Configuration Store
//!
//! Reads and writes the foreground notification settings through the host
//! [`SettingsStore`], and parses partial updates out of command arguments.
//!
//! The keys double as the `initialize` argument names, so values written by
//! an existing host installation are picked up unchanged.
//!
//! ## Failure model
//!
//! - `load` never fails: a missing or unreadable value keeps its default and
//!   the remaining fields are still read.
//! - `save` writes every field in one settings transaction; on any error the
//!   transaction is rolled back and a [`BackgroundError::Persistence`] is
//!   returned for the caller to log.

use crate::error::{BackgroundError, Result};
use bridge_traits::{
    storage::{SettingsStore, SettingsTransaction},
    BridgeError, NotificationConfiguration, NotificationImportance,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub const NOTIFICATION_TITLE_KEY: &str = "android.notificationTitle";
pub const NOTIFICATION_TEXT_KEY: &str = "android.notificationText";
pub const NOTIFICATION_IMPORTANCE_KEY: &str = "android.notificationImportance";
pub const NOTIFICATION_ICON_NAME_KEY: &str = "android.notificationIconName";
pub const NOTIFICATION_ICON_CATEGORY_KEY: &str = "android.notificationIconDefType";
pub const ENABLE_WIFI_LOCK_KEY: &str = "android.enableWifiLock";
pub const REQUIRE_BATTERY_OPTIMIZATIONS_OFF_KEY: &str =
    "android.shouldRequestBatteryOptimizationsOff";
pub const FOREGROUND_SERVICE_TYPE_KEY: &str = "android.foregroundServiceType";

/// Every persisted key, in write order.
pub const CONFIGURATION_KEYS: [&str; 8] = [
    NOTIFICATION_TITLE_KEY,
    NOTIFICATION_TEXT_KEY,
    NOTIFICATION_IMPORTANCE_KEY,
    NOTIFICATION_ICON_NAME_KEY,
    NOTIFICATION_ICON_CATEGORY_KEY,
    ENABLE_WIFI_LOCK_KEY,
    REQUIRE_BATTERY_OPTIMIZATIONS_OFF_KEY,
    FOREGROUND_SERVICE_TYPE_KEY,
];

/// A configuration update where every field is optional.
///
/// Applied field-wise: `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialNotificationConfiguration {
    pub title: Option<String>,
    pub body_text: Option<String>,
    pub importance: Option<NotificationImportance>,
    pub icon_name: Option<String>,
    pub icon_category: Option<String>,
    pub wifi_lock_enabled: Option<bool>,
    pub require_battery_optimizations_off: Option<bool>,
    pub service_type_flags: Option<i64>,
}

impl PartialNotificationConfiguration {
    /// Parse the `initialize` argument map.
    ///
    /// Absent keys and JSON `null` leave a field unset. Importance accepts a
    /// host priority integer or a level name. Unknown keys are ignored.
    pub fn from_arguments(arguments: &Map<String, Value>) -> Result<Self> {
        for key in arguments.keys() {
            if !CONFIGURATION_KEYS.contains(&key.as_str()) {
                debug!(key = %key, "Ignoring unknown configuration argument");
            }
        }

        Ok(Self {
            title: string_argument(arguments, NOTIFICATION_TITLE_KEY)?,
            body_text: string_argument(arguments, NOTIFICATION_TEXT_KEY)?,
            importance: importance_argument(arguments)?,
            icon_name: string_argument(arguments, NOTIFICATION_ICON_NAME_KEY)?,
            icon_category: string_argument(arguments, NOTIFICATION_ICON_CATEGORY_KEY)?,
            wifi_lock_enabled: bool_argument(arguments, ENABLE_WIFI_LOCK_KEY)?,
            require_battery_optimizations_off: bool_argument(
                arguments,
                REQUIRE_BATTERY_OPTIMIZATIONS_OFF_KEY,
            )?,
            service_type_flags: int_argument(arguments, FOREGROUND_SERVICE_TYPE_KEY)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite the fields of `config` that this update carries.
    pub fn apply_to(self, config: &mut NotificationConfiguration) {
        if let Some(title) = self.title {
            config.title = title;
        }
        if let Some(body_text) = self.body_text {
            config.body_text = body_text;
        }
        if let Some(importance) = self.importance {
            config.importance = importance;
        }
        if let Some(name) = self.icon_name {
            config.icon.name = name;
        }
        if let Some(category) = self.icon_category {
            config.icon.category = category;
        }
        if let Some(enabled) = self.wifi_lock_enabled {
            config.wifi_lock_enabled = enabled;
        }
        if let Some(required) = self.require_battery_optimizations_off {
            config.require_battery_optimizations_off = required;
        }
        if let Some(flags) = self.service_type_flags {
            config.service_type_flags = flags;
        }
    }
}

fn present<'a>(arguments: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    arguments.get(key).filter(|value| !value.is_null())
}

fn string_argument(arguments: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match present(arguments, key) {
        None => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(BackgroundError::invalid_argument(
            key,
            format!("expected a string, got {}", other),
        )),
    }
}

fn bool_argument(arguments: &Map<String, Value>, key: &str) -> Result<Option<bool>> {
    match present(arguments, key) {
        None => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(*value)),
        Some(other) => Err(BackgroundError::invalid_argument(
            key,
            format!("expected a boolean, got {}", other),
        )),
    }
}

fn int_argument(arguments: &Map<String, Value>, key: &str) -> Result<Option<i64>> {
    match present(arguments, key) {
        None => Ok(None),
        Some(value) => value.as_i64().map(Some).ok_or_else(|| {
            BackgroundError::invalid_argument(key, format!("expected an integer, got {}", value))
        }),
    }
}

fn importance_argument(arguments: &Map<String, Value>) -> Result<Option<NotificationImportance>> {
    let key = NOTIFICATION_IMPORTANCE_KEY;
    match present(arguments, key) {
        None => Ok(None),
        Some(Value::String(name)) => NotificationImportance::from_name(name)
            .map(Some)
            .ok_or_else(|| {
                BackgroundError::invalid_argument(key, format!("unknown importance '{}'", name))
            }),
        Some(value) => value
            .as_i64()
            .map(|priority| Some(NotificationImportance::from_priority(priority)))
            .ok_or_else(|| {
                BackgroundError::invalid_argument(
                    key,
                    format!("expected an integer or level name, got {}", value),
                )
            }),
    }
}

/// Persists [`NotificationConfiguration`] in the host settings store.
#[derive(Clone)]
pub struct ConfigurationStore {
    settings: Arc<dyn SettingsStore>,
}

impl ConfigurationStore {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    /// Load the stored configuration, falling back to defaults per field.
    #[instrument(skip(self))]
    pub async fn load(&self) -> NotificationConfiguration {
        let mut config = NotificationConfiguration::default();

        if let Some(title) = self.read(
            NOTIFICATION_TITLE_KEY,
            self.settings.get_string(NOTIFICATION_TITLE_KEY).await,
        ) {
            config.title = title;
        }
        if let Some(text) = self.read(
            NOTIFICATION_TEXT_KEY,
            self.settings.get_string(NOTIFICATION_TEXT_KEY).await,
        ) {
            config.body_text = text;
        }
        if let Some(priority) = self.read(
            NOTIFICATION_IMPORTANCE_KEY,
            self.settings.get_i64(NOTIFICATION_IMPORTANCE_KEY).await,
        ) {
            config.importance = NotificationImportance::from_priority(priority);
        }
        if let Some(name) = self.read(
            NOTIFICATION_ICON_NAME_KEY,
            self.settings.get_string(NOTIFICATION_ICON_NAME_KEY).await,
        ) {
            config.icon.name = name;
        }
        if let Some(category) = self.read(
            NOTIFICATION_ICON_CATEGORY_KEY,
            self.settings.get_string(NOTIFICATION_ICON_CATEGORY_KEY).await,
        ) {
            config.icon.category = category;
        }
        if let Some(enabled) = self.read(
            ENABLE_WIFI_LOCK_KEY,
            self.settings.get_bool(ENABLE_WIFI_LOCK_KEY).await,
        ) {
            config.wifi_lock_enabled = enabled;
        }
        if let Some(required) = self.read(
            REQUIRE_BATTERY_OPTIMIZATIONS_OFF_KEY,
            self.settings
                .get_bool(REQUIRE_BATTERY_OPTIMIZATIONS_OFF_KEY)
                .await,
        ) {
            config.require_battery_optimizations_off = required;
        }
        if let Some(flags) = self.read(
            FOREGROUND_SERVICE_TYPE_KEY,
            self.settings.get_i64(FOREGROUND_SERVICE_TYPE_KEY).await,
        ) {
            config.service_type_flags = flags;
        }

        debug!(title = %config.title, importance = ?config.importance, "Loaded notification configuration");
        config
    }

    /// Persist every field atomically.
    #[instrument(skip(self, config), fields(title = %config.title))]
    pub async fn save(&self, config: &NotificationConfiguration) -> Result<()> {
        let mut transaction = self
            .settings
            .begin_transaction()
            .await
            .map_err(persistence)?;

        match write_all(transaction.as_mut(), config).await {
            Ok(()) => transaction.commit().await.map_err(persistence),
            Err(err) => {
                if let Err(rollback_err) = transaction.rollback().await {
                    warn!(error = %rollback_err, "Failed to roll back settings transaction");
                }
                Err(persistence(err))
            }
        }
    }

    fn read<T>(&self, key: &str, value: bridge_traits::error::Result<Option<T>>) -> Option<T> {
        match value {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "Unreadable setting; keeping default");
                None
            }
        }
    }
}

async fn write_all(
    transaction: &mut (dyn SettingsTransaction + Send),
    config: &NotificationConfiguration,
) -> bridge_traits::error::Result<()> {
    transaction
        .set_string(NOTIFICATION_TITLE_KEY, &config.title)
        .await?;
    transaction
        .set_string(NOTIFICATION_TEXT_KEY, &config.body_text)
        .await?;
    transaction
        .set_i64(NOTIFICATION_IMPORTANCE_KEY, config.importance.priority())
        .await?;
    transaction
        .set_string(NOTIFICATION_ICON_NAME_KEY, &config.icon.name)
        .await?;
    transaction
        .set_string(NOTIFICATION_ICON_CATEGORY_KEY, &config.icon.category)
        .await?;
    transaction
        .set_bool(ENABLE_WIFI_LOCK_KEY, config.wifi_lock_enabled)
        .await?;
    transaction
        .set_bool(
            REQUIRE_BATTERY_OPTIMIZATIONS_OFF_KEY,
            config.require_battery_optimizations_off,
        )
        .await?;
    transaction
        .set_i64(FOREGROUND_SERVICE_TYPE_KEY, config.service_type_flags)
        .await
}

fn persistence(err: BridgeError) -> BackgroundError {
    BackgroundError::Persistence(err.to_string())
}
