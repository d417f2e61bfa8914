//! Permission facts and the decision table built on them.

use crate::error::{BackgroundError, Result};
use bridge_traits::{NotificationConfiguration, PermissionOracle};

/// Snapshot of the host permission facts, taken per decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionState {
    pub wake_lock_granted: bool,
    pub battery_optimizations_disabled: bool,
}

/// What `initialize` has to do once the configuration is merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializeDecision {
    /// Nothing is missing.
    Ready,
    /// The exemption is required and not granted yet; ask the user.
    RequestExemption,
}

impl PermissionState {
    pub fn query(oracle: &dyn PermissionOracle) -> Self {
        Self {
            wake_lock_granted: oracle.is_wake_lock_permission_granted(),
            battery_optimizations_disabled: oracle.is_ignoring_battery_optimizations(),
        }
    }

    /// Both facts hold, regardless of what the configuration requires.
    pub fn all_granted(&self) -> bool {
        self.wake_lock_granted && self.battery_optimizations_disabled
    }

    pub fn exemption_satisfied(&self, config: &NotificationConfiguration) -> bool {
        !config.require_battery_optimizations_off || self.battery_optimizations_disabled
    }

    /// Gate for starting the service. Never requests anything.
    pub fn ensure_can_enable(&self, config: &NotificationConfiguration) -> Result<()> {
        if !self.wake_lock_granted {
            return Err(BackgroundError::WakeLockNotGranted);
        }
        if !self.exemption_satisfied(config) {
            return Err(BackgroundError::BatteryOptimizationsNotDisabled);
        }
        Ok(())
    }

    pub fn initialize_decision(
        &self,
        config: &NotificationConfiguration,
    ) -> Result<InitializeDecision> {
        if !self.wake_lock_granted {
            return Err(BackgroundError::WakeLockNotGranted);
        }
        if self.exemption_satisfied(config) {
            Ok(InitializeDecision::Ready)
        } else {
            Ok(InitializeDecision::RequestExemption)
        }
    }
}
