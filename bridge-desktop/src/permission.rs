//! Desktop permission oracle.

use bridge_traits::{
    error::Result,
    permission::{ExemptionResponder, InteractiveContext, PermissionOracle},
};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Permission oracle for desktop hosts.
///
/// Desktop kernels neither require a wake-lock declaration nor throttle
/// background processes, so by default everything is granted and exemption
/// requests are answered immediately. The flags stay mutable so a desktop
/// shell can simulate a restricted device.
pub struct DesktopPermissionOracle {
    wake_lock_granted: AtomicBool,
    ignoring_battery_optimizations: AtomicBool,
    grant_on_request: AtomicBool,
}

impl DesktopPermissionOracle {
    /// Oracle reporting every capability as granted.
    pub fn new() -> Self {
        Self::with_state(true, true)
    }

    /// Oracle with explicit permission facts. Requests are granted.
    pub fn with_state(wake_lock_granted: bool, ignoring_battery_optimizations: bool) -> Self {
        Self {
            wake_lock_granted: AtomicBool::new(wake_lock_granted),
            ignoring_battery_optimizations: AtomicBool::new(ignoring_battery_optimizations),
            grant_on_request: AtomicBool::new(true),
        }
    }

    pub fn set_wake_lock_granted(&self, granted: bool) {
        self.wake_lock_granted.store(granted, Ordering::SeqCst);
    }

    pub fn set_ignoring_battery_optimizations(&self, ignoring: bool) {
        self.ignoring_battery_optimizations
            .store(ignoring, Ordering::SeqCst);
    }

    /// Choose how simulated exemption dialogs are answered.
    pub fn set_grant_on_request(&self, grant: bool) {
        self.grant_on_request.store(grant, Ordering::SeqCst);
    }
}

impl Default for DesktopPermissionOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionOracle for DesktopPermissionOracle {
    fn is_wake_lock_permission_granted(&self) -> bool {
        self.wake_lock_granted.load(Ordering::SeqCst)
    }

    fn is_ignoring_battery_optimizations(&self) -> bool {
        self.ignoring_battery_optimizations.load(Ordering::SeqCst)
    }

    fn request_battery_optimizations_off(
        &self,
        context: &InteractiveContext,
        responder: ExemptionResponder,
    ) -> Result<()> {
        let grant = self.grant_on_request.load(Ordering::SeqCst);
        if grant {
            self.set_ignoring_battery_optimizations(true);
        }

        info!(
            context = context.label(),
            request_id = %responder.request_id(),
            granted = grant,
            "Answered simulated battery optimization dialog"
        );

        if !responder.resolve(grant.into()) {
            debug!("Exemption requester went away before the answer arrived");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::permission::ExemptionOutcome;
    use uuid::Uuid;

    #[test]
    fn test_defaults_grant_everything() {
        let oracle = DesktopPermissionOracle::new();

        assert!(oracle.is_wake_lock_permission_granted());
        assert!(oracle.is_ignoring_battery_optimizations());
    }

    #[tokio::test]
    async fn test_request_grants_and_updates_state() {
        let oracle = DesktopPermissionOracle::with_state(true, false);
        let (responder, receiver) = ExemptionResponder::channel(Uuid::new_v4());

        oracle
            .request_battery_optimizations_off(&InteractiveContext::new("window"), responder)
            .unwrap();

        assert_eq!(receiver.await.unwrap(), ExemptionOutcome::Granted);
        assert!(oracle.is_ignoring_battery_optimizations());
    }

    #[tokio::test]
    async fn test_request_can_simulate_denial() {
        let oracle = DesktopPermissionOracle::with_state(true, false);
        oracle.set_grant_on_request(false);
        let (responder, receiver) = ExemptionResponder::channel(Uuid::new_v4());

        oracle
            .request_battery_optimizations_off(&InteractiveContext::new("window"), responder)
            .unwrap();

        assert_eq!(receiver.await.unwrap(), ExemptionOutcome::Denied);
        assert!(!oracle.is_ignoring_battery_optimizations());
    }
}
