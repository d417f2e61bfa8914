//! Battery-optimization exemption request lifecycle.
//!
//! ```text
//! Idle ──request──▶ Requested ──answer──▶ Granted | Denied
//!                        │
//!                        └──detach / abandon / timeout──▶ Cancelled
//! ```
//!
//! At most one request is outstanding. `initialize` reserves the slot before
//! it touches the configuration and only enters `Requested` if a dialog is
//! needed. Any terminal state may start a new request.

use crate::error::{BackgroundError, Result};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExemptionState {
    #[default]
    Idle,
    Requested,
    Granted,
    Denied,
    Cancelled,
}

impl ExemptionState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ExemptionState::Requested)
    }
}

#[derive(Debug)]
struct PendingExemption {
    request_id: Uuid,
    cancel: CancellationToken,
}

/// Holds the single outstanding request, if any.
#[derive(Debug, Default)]
pub(crate) struct ExemptionSlot {
    state: ExemptionState,
    pending: Option<PendingExemption>,
}

impl ExemptionSlot {
    pub(crate) fn state(&self) -> ExemptionState {
        self.state
    }

    pub(crate) fn pending_request(&self) -> Option<Uuid> {
        self.pending.as_ref().map(|pending| pending.request_id)
    }

    pub(crate) fn ensure_idle(&self) -> Result<()> {
        match self.pending_request() {
            Some(request_id) => Err(BackgroundError::RequestInProgress { request_id }),
            None => Ok(()),
        }
    }

    /// Claim the slot for `request_id` without entering `Requested`.
    ///
    /// Other callers are rejected until the reservation is released or
    /// finished.
    pub(crate) fn reserve(&mut self, request_id: Uuid) -> Result<CancellationToken> {
        self.ensure_idle()?;

        let cancel = CancellationToken::new();
        self.pending = Some(PendingExemption {
            request_id,
            cancel: cancel.clone(),
        });
        Ok(cancel)
    }

    /// Enter `Requested` and hand back the token that cancels the wait.
    ///
    /// Upgrades a reservation held by `request_id`, or claims a free slot.
    pub(crate) fn begin(&mut self, request_id: Uuid) -> Result<CancellationToken> {
        let cancel = match &self.pending {
            Some(pending) if pending.request_id == request_id => pending.cancel.clone(),
            _ => self.reserve(request_id)?,
        };
        self.state = ExemptionState::Requested;
        Ok(cancel)
    }

    /// Give back a reservation that never showed a dialog. The state is
    /// left as it was. Stale ids are ignored.
    pub(crate) fn release(&mut self, request_id: Uuid) -> bool {
        if self.pending_request() != Some(request_id) {
            return false;
        }
        self.pending = None;
        true
    }

    /// Record the terminal state of `request_id`. Stale ids are ignored.
    pub(crate) fn finish(&mut self, request_id: Uuid, state: ExemptionState) -> bool {
        if self.pending_request() != Some(request_id) {
            return false;
        }
        self.pending = None;
        self.state = state;
        true
    }

    /// Trip the cancellation token of the outstanding request.
    ///
    /// The waiting side observes the token and finishes the slot itself.
    pub(crate) fn cancel(&self) -> Option<Uuid> {
        self.pending.as_ref().map(|pending| {
            pending.cancel.cancel();
            pending.request_id
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_outstanding_request() {
        let mut slot = ExemptionSlot::default();
        let first = Uuid::new_v4();

        slot.begin(first).unwrap();
        assert_eq!(slot.state(), ExemptionState::Requested);

        match slot.begin(Uuid::new_v4()) {
            Err(BackgroundError::RequestInProgress { request_id }) => assert_eq!(request_id, first),
            other => panic!("expected RequestInProgress, got {:?}", other),
        }
    }

    #[test]
    fn test_finish_ignores_stale_request() {
        let mut slot = ExemptionSlot::default();
        let request_id = Uuid::new_v4();
        slot.begin(request_id).unwrap();

        assert!(!slot.finish(Uuid::new_v4(), ExemptionState::Granted));
        assert_eq!(slot.state(), ExemptionState::Requested);

        assert!(slot.finish(request_id, ExemptionState::Denied));
        assert_eq!(slot.state(), ExemptionState::Denied);
        assert!(slot.pending_request().is_none());
        assert!(slot.state().is_terminal());
    }

    #[test]
    fn test_reservation_blocks_other_callers() {
        let mut slot = ExemptionSlot::default();
        let reserved = Uuid::new_v4();
        slot.reserve(reserved).unwrap();

        assert_eq!(slot.state(), ExemptionState::Idle);
        assert!(matches!(
            slot.reserve(Uuid::new_v4()),
            Err(BackgroundError::RequestInProgress { request_id }) if request_id == reserved
        ));
        assert!(slot.begin(Uuid::new_v4()).is_err());

        let token = slot.begin(reserved).unwrap();
        assert_eq!(slot.state(), ExemptionState::Requested);
        assert_eq!(slot.cancel(), Some(reserved));
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_release_keeps_previous_state() {
        let mut slot = ExemptionSlot::default();
        let first = Uuid::new_v4();
        slot.begin(first).unwrap();
        slot.finish(first, ExemptionState::Granted);

        let second = Uuid::new_v4();
        slot.reserve(second).unwrap();
        assert!(!slot.release(Uuid::new_v4()));
        assert!(slot.release(second));

        assert_eq!(slot.state(), ExemptionState::Granted);
        assert!(slot.pending_request().is_none());
        assert!(slot.ensure_idle().is_ok());
    }

    #[test]
    fn test_cancel_trips_token() {
        let mut slot = ExemptionSlot::default();
        assert!(slot.cancel().is_none());

        let request_id = Uuid::new_v4();
        let token = slot.begin(request_id).unwrap();

        assert_eq!(slot.cancel(), Some(request_id));
        assert!(token.is_cancelled());
    }
}
