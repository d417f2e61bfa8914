//! Permissions and Battery-Optimization Exemptions
//!
//! Query surface over the host's wake-lock permission and battery-optimization
//! exemption, plus the interactive exemption request.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::Result;

/// A foreground UI surface able to present OS dialogs (an Android `Activity`).
///
/// The core never dereferences the surface itself; it only hands the handle
/// back to the [`PermissionOracle`] so the host can find the right window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InteractiveContext {
    id: Uuid,
    label: String,
}

impl InteractiveContext {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Final answer of an exemption dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExemptionOutcome {
    Granted,
    Denied,
}

impl ExemptionOutcome {
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

impl From<bool> for ExemptionOutcome {
    fn from(granted: bool) -> Self {
        if granted {
            Self::Granted
        } else {
            Self::Denied
        }
    }
}

/// Receiving half of an exemption request, held by the core.
pub type ExemptionReceiver = oneshot::Receiver<ExemptionOutcome>;

/// Completion handle for one exemption request.
///
/// Resolving consumes the responder, so a request can be completed at most
/// once. Dropping it unresolved tells the waiting side the dialog was
/// abandoned.
#[derive(Debug)]
pub struct ExemptionResponder {
    request_id: Uuid,
    sender: oneshot::Sender<ExemptionOutcome>,
}

impl ExemptionResponder {
    /// Create a responder and the receiver that observes it.
    pub fn channel(request_id: Uuid) -> (Self, ExemptionReceiver) {
        let (sender, receiver) = oneshot::channel();
        (Self { request_id, sender }, receiver)
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Deliver the dialog result.
    ///
    /// Returns `false` when nobody is waiting anymore (the request was
    /// cancelled or timed out on the core side).
    pub fn resolve(self, outcome: ExemptionOutcome) -> bool {
        self.sender.send(outcome).is_ok()
    }

    pub fn grant(self) -> bool {
        self.resolve(ExemptionOutcome::Granted)
    }

    pub fn deny(self) -> bool {
        self.resolve(ExemptionOutcome::Denied)
    }

    /// True once the waiting side has gone away.
    pub fn is_abandoned(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Permission oracle trait
///
/// Abstracts the host permission surface:
/// - **Android**: `WAKE_LOCK` manifest check, `PowerManager.isIgnoringBatteryOptimizations`,
///   and the `ACTION_REQUEST_IGNORE_BATTERY_OPTIMIZATIONS` settings intent
/// - **Desktop**: no power management restrictions; everything is granted
///
/// The oracle owns no state of its own. Queries are synchronous and cheap;
/// the exemption request returns as soon as the dialog is shown and reports
/// its answer through the [`ExemptionResponder`].
pub trait PermissionOracle: Send + Sync {
    /// Whether the wake-lock capability is declared/granted.
    fn is_wake_lock_permission_granted(&self) -> bool;

    /// Whether the process is currently exempt from battery optimizations.
    fn is_ignoring_battery_optimizations(&self) -> bool;

    /// Present the exemption dialog on `context`.
    ///
    /// Must not block waiting for the user. The host keeps `responder` and
    /// resolves it when the OS reports the result. Returning an error means
    /// the dialog could not be shown and `responder` was dropped.
    fn request_battery_optimizations_off(
        &self,
        context: &InteractiveContext,
        responder: ExemptionResponder,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_responder_delivers_outcome() {
        let (responder, receiver) = ExemptionResponder::channel(Uuid::new_v4());

        assert!(responder.grant());
        assert_eq!(receiver.await.unwrap(), ExemptionOutcome::Granted);
    }

    #[tokio::test]
    async fn test_dropped_responder_closes_receiver() {
        let (responder, receiver) = ExemptionResponder::channel(Uuid::new_v4());
        drop(responder);

        assert!(receiver.await.is_err());
    }

    #[test]
    fn test_resolve_after_receiver_dropped() {
        let (responder, receiver) = ExemptionResponder::channel(Uuid::new_v4());
        drop(receiver);

        assert!(responder.is_abandoned());
        assert!(!responder.deny());
    }

    #[test]
    fn test_interactive_context_identity() {
        let first = InteractiveContext::new("main");
        let second = InteractiveContext::new("main");

        assert_eq!(first.label(), "main");
        assert_ne!(first.id(), second.id());
        assert_eq!(first.clone(), first);
    }

    #[test]
    fn test_outcome_from_bool() {
        assert!(ExemptionOutcome::from(true).is_granted());
        assert!(!ExemptionOutcome::from(false).is_granted());
    }
}
