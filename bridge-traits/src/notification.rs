//! Notification Configuration
//!
//! Value types describing the persistent notification a foreground service
//! shows while it keeps the process alive.

use serde::{Deserialize, Serialize};

pub const DEFAULT_NOTIFICATION_TITLE: &str = "Background service";
pub const DEFAULT_NOTIFICATION_TEXT: &str = "Keeps the app running in the background";
pub const DEFAULT_ICON_NAME: &str = "ic_launcher";
pub const DEFAULT_ICON_CATEGORY: &str = "mipmap";

/// Notification importance.
///
/// Host priorities are integers (`-2..=2` on Android). Values below `-1`
/// collapse into [`Low`](Self::Low) and values above `2` into
/// [`Max`](Self::Max).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum NotificationImportance {
    Low,
    #[default]
    Default,
    High,
    Max,
}

impl NotificationImportance {
    /// Map a host priority integer onto an importance level.
    pub fn from_priority(priority: i64) -> Self {
        match priority {
            i64::MIN..=-1 => Self::Low,
            0 => Self::Default,
            1 => Self::High,
            _ => Self::Max,
        }
    }

    /// Host priority integer for this importance level.
    pub fn priority(self) -> i64 {
        match self {
            Self::Low => -1,
            Self::Default => 0,
            Self::High => 1,
            Self::Max => 2,
        }
    }

    /// Parse a lowercase importance name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "default" => Some(Self::Default),
            "high" => Some(Self::High),
            "max" => Some(Self::Max),
            _ => None,
        }
    }
}

/// Reference to a drawable resource: a name plus its resource category
/// (e.g. `ic_launcher` in `mipmap`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IconReference {
    pub name: String,
    pub category: String,
}

impl IconReference {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
        }
    }
}

impl Default for IconReference {
    fn default() -> Self {
        Self::new(DEFAULT_ICON_NAME, DEFAULT_ICON_CATEGORY)
    }
}

/// Everything the foreground service needs to build its notification and
/// decide which locks to hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationConfiguration {
    /// Notification title
    pub title: String,
    /// Notification body text
    pub body_text: String,
    /// Small icon shown in the status bar
    pub icon: IconReference,
    /// Notification importance / priority
    pub importance: NotificationImportance,
    /// Hold a wifi lock while the service runs
    pub wifi_lock_enabled: bool,
    /// Refuse to run unless the process is exempt from battery optimizations
    pub require_battery_optimizations_off: bool,
    /// Foreground service type bitmask passed through to the host
    pub service_type_flags: i64,
}

impl Default for NotificationConfiguration {
    fn default() -> Self {
        Self {
            title: DEFAULT_NOTIFICATION_TITLE.to_string(),
            body_text: DEFAULT_NOTIFICATION_TEXT.to_string(),
            icon: IconReference::default(),
            importance: NotificationImportance::Default,
            wifi_lock_enabled: false,
            require_battery_optimizations_off: true,
            service_type_flags: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration() {
        let config = NotificationConfiguration::default();

        assert_eq!(config.title, DEFAULT_NOTIFICATION_TITLE);
        assert_eq!(config.icon.name, "ic_launcher");
        assert_eq!(config.icon.category, "mipmap");
        assert_eq!(config.importance, NotificationImportance::Default);
        assert!(!config.wifi_lock_enabled);
        assert!(config.require_battery_optimizations_off);
        assert_eq!(config.service_type_flags, 0);
    }

    #[test]
    fn test_importance_from_priority() {
        assert_eq!(
            NotificationImportance::from_priority(-2),
            NotificationImportance::Low
        );
        assert_eq!(
            NotificationImportance::from_priority(0),
            NotificationImportance::Default
        );
        assert_eq!(
            NotificationImportance::from_priority(1),
            NotificationImportance::High
        );
        assert_eq!(
            NotificationImportance::from_priority(7),
            NotificationImportance::Max
        );
    }

    #[test]
    fn test_importance_priority_is_stable() {
        for importance in [
            NotificationImportance::Low,
            NotificationImportance::Default,
            NotificationImportance::High,
            NotificationImportance::Max,
        ] {
            assert_eq!(
                NotificationImportance::from_priority(importance.priority()),
                importance
            );
        }
    }

    #[test]
    fn test_importance_from_name() {
        assert_eq!(
            NotificationImportance::from_name("HIGH"),
            Some(NotificationImportance::High)
        );
        assert_eq!(NotificationImportance::from_name("urgent"), None);
    }

    #[test]
    fn test_configuration_serializes_camel_case() {
        let json = serde_json::to_value(NotificationConfiguration::default()).unwrap();

        assert_eq!(json["bodyText"], DEFAULT_NOTIFICATION_TEXT);
        assert_eq!(json["importance"], "default");
        assert_eq!(json["requireBatteryOptimizationsOff"], true);
    }
}
