//! # Background Execution Controller
//!
//! Decides, from the host permission facts and the current notification
//! configuration, whether the foreground service may start, whether the user
//! has to be asked for a battery-optimization exemption, or which error to
//! report.
//!
//! ## Workflow
//!
//! ### initialize
//! 1. Merge the supplied fields into the in-memory configuration and persist it
//!    (a persistence failure is logged, never returned)
//! 2. Fail with a permission error when the wake lock is not granted
//! 3. Succeed with `true` when the exemption is granted or not required
//! 4. With an interactive context attached, show the exemption dialog and
//!    complete with its answer
//! 5. Without one, fail with `NoInteractiveContext`
//!
//! ### enable / disable
//! `enable_background_execution` only checks; it never asks the user.
//! `disable_background_execution` always succeeds.
//!
//! ## Exemption requests
//!
//! Exactly one request may be outstanding. The wait ends with the dialog
//! answer, with `RequestCancelled` when the context is detached or the host
//! drops the responder, or with `RequestTimeout` after the configured
//! timeout.

use crate::{
    attachment::Attachment,
    configuration::{ConfigurationStore, PartialNotificationConfiguration},
    error::{BackgroundError, Result},
    exemption::{ExemptionSlot, ExemptionState},
    permissions::{InitializeDecision, PermissionState},
};
use bridge_traits::{
    ExemptionOutcome, ExemptionResponder, ForegroundServiceLauncher, InteractiveContext,
    NotificationConfiguration, PermissionOracle, ServiceIntent, ServiceStatus,
};
use core_runtime::config::{
    BridgeConfig, DEFAULT_EXEMPTION_TIMEOUT, MAX_EXEMPTION_TIMEOUT, MIN_EXEMPTION_TIMEOUT,
};
use core_runtime::events::{
    ConfigurationEvent, CoreEvent, EventBus, PermissionEvent, ServiceEvent,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Attachment plus the exemption slot; always mutated together.
#[derive(Debug, Default)]
struct Session {
    attachment: Attachment,
    exemption: ExemptionSlot,
}

/// Orchestrates background execution for one host.
pub struct BackgroundExecutionController {
    /// Current notification configuration
    configuration: RwLock<NotificationConfiguration>,

    /// Persistence for the configuration
    store: ConfigurationStore,

    oracle: Arc<dyn PermissionOracle>,

    launcher: Arc<dyn ForegroundServiceLauncher>,

    /// Event bus for service and permission events
    event_bus: EventBus,

    /// Interactive context and outstanding exemption request
    session: Mutex<Session>,

    exemption_timeout: Duration,
}

impl BackgroundExecutionController {
    /// Create a controller and load the stored configuration.
    pub async fn new(
        store: ConfigurationStore,
        oracle: Arc<dyn PermissionOracle>,
        launcher: Arc<dyn ForegroundServiceLauncher>,
        event_bus: EventBus,
    ) -> Self {
        let configuration = store.load().await;
        Self {
            configuration: RwLock::new(configuration),
            store,
            oracle,
            launcher,
            event_bus,
            session: Mutex::new(Session::default()),
            exemption_timeout: DEFAULT_EXEMPTION_TIMEOUT,
        }
    }

    /// Build a controller from a validated [`BridgeConfig`].
    pub async fn from_config(config: &BridgeConfig, event_bus: EventBus) -> Self {
        Self::new(
            ConfigurationStore::new(Arc::clone(&config.settings_store)),
            Arc::clone(&config.permission_oracle),
            Arc::clone(&config.service_launcher),
            event_bus,
        )
        .await
        .with_exemption_timeout(config.exemption_timeout)
    }

    /// Override how long an exemption dialog may stay unanswered.
    ///
    /// Clamped to the range [`BridgeConfig::validate`] accepts (1 s to 1 h).
    pub fn with_exemption_timeout(mut self, exemption_timeout: Duration) -> Self {
        let clamped = exemption_timeout.clamp(MIN_EXEMPTION_TIMEOUT, MAX_EXEMPTION_TIMEOUT);
        if clamped != exemption_timeout {
            warn!(
                requested = ?exemption_timeout,
                applied = ?clamped,
                "Exemption timeout out of range"
            );
        }
        self.exemption_timeout = clamped;
        self
    }

    pub fn exemption_timeout(&self) -> Duration {
        self.exemption_timeout
    }

    /// Snapshot of the in-memory configuration.
    pub async fn configuration(&self) -> NotificationConfiguration {
        self.configuration.read().await.clone()
    }

    pub fn permission_state(&self) -> PermissionState {
        PermissionState::query(self.oracle.as_ref())
    }

    /// Both permission facts hold.
    pub fn has_permissions(&self) -> bool {
        self.permission_state().all_granted()
    }

    pub fn exemption_state(&self) -> ExemptionState {
        self.session().exemption.state()
    }

    pub fn pending_exemption_request(&self) -> Option<Uuid> {
        self.session().exemption.pending_request()
    }

    pub fn is_attached(&self) -> bool {
        self.session().attachment.is_attached()
    }

    pub async fn service_status(&self) -> ServiceStatus {
        self.launcher.status().await
    }

    /// Make `context` available for dialogs. Replaces any attached context
    /// without touching an outstanding request.
    #[instrument(skip(self, context), fields(context = %context.label()))]
    pub fn attach_interactive_context(&self, context: InteractiveContext) {
        let label = context.label().to_string();
        let previous = self.session().attachment.attach(context);
        if let Some(previous) = previous {
            debug!(previous = %previous.label(), "Replacing interactive context");
        }

        info!("Interactive context attached");
        let _ = self
            .event_bus
            .emit(CoreEvent::Permission(PermissionEvent::ContextAttached {
                context: label,
            }));
    }

    /// Drop the interactive context and cancel any outstanding request.
    #[instrument(skip(self))]
    pub fn detach_interactive_context(&self) -> Option<InteractiveContext> {
        let (previous, cancelled) = {
            let mut session = self.session();
            let previous = session.attachment.detach();
            (previous, session.exemption.cancel())
        };

        if let Some(request_id) = cancelled {
            info!(%request_id, "Cancelling exemption request on detach");
        }
        if previous.is_some() {
            info!("Interactive context detached");
            let _ = self
                .event_bus
                .emit(CoreEvent::Permission(PermissionEvent::ContextDetached));
        }
        previous
    }

    /// Cancel the outstanding exemption request, if any.
    #[instrument(skip(self))]
    pub fn cancel_exemption_request(&self) -> Option<Uuid> {
        let cancelled = self.session().exemption.cancel();
        if let Some(request_id) = cancelled {
            info!(%request_id, "Exemption request cancelled");
        }
        cancelled
    }

    /// Merge `update`, persist it, and make sure background execution is
    /// allowed, asking the user for the exemption when needed.
    ///
    /// Returns `false` only when the user denies the exemption dialog.
    ///
    /// # Errors
    ///
    /// - `RequestInProgress` when another `initialize` is still running,
    ///   including one waiting on its dialog (nothing is merged or persisted)
    /// - `WakeLockNotGranted`
    /// - `NoInteractiveContext` when the exemption is missing and no context
    ///   is attached
    /// - `RequestCancelled` / `RequestTimeout` when the dialog never answers
    #[instrument(skip(self, update))]
    pub async fn initialize(&self, update: PartialNotificationConfiguration) -> Result<bool> {
        let request_id = Uuid::new_v4();
        self.session().exemption.reserve(request_id)?;
        let mut reservation = Reservation {
            session: &self.session,
            request_id,
            outcome: None,
        };

        let config = {
            let mut current = self.configuration.write().await;
            update.apply_to(&mut current);
            current.clone()
        };
        self.persist(&config).await;

        let permissions = self.permission_state();
        match permissions.initialize_decision(&config) {
            Ok(InitializeDecision::Ready) => {
                debug!("Permissions already satisfied");
                Ok(true)
            }
            Ok(InitializeDecision::RequestExemption) => {
                self.request_exemption(&mut reservation).await
            }
            Err(err) => {
                warn!(error = %err, "Initialization refused");
                Err(err)
            }
        }
    }

    /// Start the foreground service with the current configuration.
    ///
    /// Does not request any permission; see [`initialize`](Self::initialize).
    #[instrument(skip(self))]
    pub async fn enable_background_execution(&self) -> Result<bool> {
        let config = self.configuration().await;
        self.permission_state().ensure_can_enable(&config)?;

        let title = config.title.clone();
        if let Err(err) = self.launcher.send(ServiceIntent::Start(config)).await {
            error!(error = %err, "Foreground service refused to start");
            let _ = self
                .event_bus
                .emit(CoreEvent::Service(ServiceEvent::StartFailed {
                    message: err.to_string(),
                }));
            return Err(BackgroundError::Service(err.to_string()));
        }

        info!(%title, "Background execution enabled");
        let _ = self
            .event_bus
            .emit(CoreEvent::Service(ServiceEvent::StartRequested { title }));
        Ok(true)
    }

    /// Ask the foreground service to stop. Always succeeds.
    #[instrument(skip(self))]
    pub async fn disable_background_execution(&self) -> Result<bool> {
        match self.launcher.send(ServiceIntent::Shutdown).await {
            Ok(()) => {
                info!("Background execution disabled");
                let _ = self
                    .event_bus
                    .emit(CoreEvent::Service(ServiceEvent::ShutdownRequested));
            }
            Err(err) => {
                warn!(error = %err, "Shutdown signal failed");
                let _ = self
                    .event_bus
                    .emit(CoreEvent::Service(ServiceEvent::ShutdownFailed {
                        message: err.to_string(),
                    }));
            }
        }
        Ok(true)
    }

    async fn persist(&self, config: &NotificationConfiguration) {
        match self.store.save(config).await {
            Ok(()) => {
                let _ = self
                    .event_bus
                    .emit(CoreEvent::Configuration(ConfigurationEvent::Saved));
            }
            Err(err) => {
                warn!(error = %err, "Notification configuration not persisted");
                let _ = self
                    .event_bus
                    .emit(CoreEvent::Configuration(ConfigurationEvent::SaveFailed {
                        message: err.to_string(),
                    }));
            }
        }
    }

    async fn request_exemption(&self, reservation: &mut Reservation<'_>) -> Result<bool> {
        let request_id = reservation.request_id;
        let (context, cancel) = {
            let mut session = self.session();
            let context = session.attachment.require_context()?.clone();
            let cancel = session.exemption.begin(request_id)?;
            (context, cancel)
        };
        reservation.outcome = Some(ExemptionState::Cancelled);

        if cancel.is_cancelled() {
            return Err(self.abandoned(request_id, "request cancelled".to_string()));
        }

        let (responder, receiver) = ExemptionResponder::channel(request_id);
        if let Err(err) = self
            .oracle
            .request_battery_optimizations_off(&context, responder)
        {
            error!(error = %err, "Exemption dialog could not be shown");
            return Err(self.abandoned(
                request_id,
                format!("dialog could not be shown: {}", err),
            ));
        }

        info!(%request_id, context = %context.label(), "Exemption dialog shown");
        let _ = self
            .event_bus
            .emit(CoreEvent::Permission(PermissionEvent::ExemptionRequested {
                request_id: request_id.to_string(),
            }));

        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(self.abandoned(request_id, "request cancelled".to_string()));
            }
            answer = timeout(self.exemption_timeout, receiver) => answer,
        };

        let outcome = match outcome {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => {
                return Err(self.abandoned(request_id, "dialog abandoned".to_string()));
            }
            Err(_) => {
                warn!(%request_id, timeout = ?self.exemption_timeout, "Exemption dialog timed out");
                let _ = self
                    .event_bus
                    .emit(CoreEvent::Permission(PermissionEvent::ExemptionAbandoned {
                        request_id: request_id.to_string(),
                        reason: "timed out".to_string(),
                    }));
                return Err(BackgroundError::RequestTimeout(self.exemption_timeout));
            }
        };

        let granted = outcome.is_granted();
        reservation.outcome = Some(match outcome {
            ExemptionOutcome::Granted => ExemptionState::Granted,
            ExemptionOutcome::Denied => ExemptionState::Denied,
        });

        info!(%request_id, granted, "Exemption dialog answered");
        let _ = self
            .event_bus
            .emit(CoreEvent::Permission(PermissionEvent::ExemptionResolved {
                request_id: request_id.to_string(),
                granted,
            }));
        Ok(granted)
    }

    fn abandoned(&self, request_id: Uuid, reason: String) -> BackgroundError {
        warn!(%request_id, %reason, "Exemption request abandoned");
        let _ = self
            .event_bus
            .emit(CoreEvent::Permission(PermissionEvent::ExemptionAbandoned {
                request_id: request_id.to_string(),
                reason: reason.clone(),
            }));
        BackgroundError::RequestCancelled { reason }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds the exemption slot for one `initialize` call and gives it back when
/// the call ends, including when the caller drops the future.
///
/// Without an outcome the slot is released untouched; once a dialog was
/// requested the outcome becomes the new state.
struct Reservation<'a> {
    session: &'a Mutex<Session>,
    request_id: Uuid,
    outcome: Option<ExemptionState>,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        match self.outcome {
            Some(state) => session.exemption.finish(self.request_id, state),
            None => session.exemption.release(self.request_id),
        };
    }
}
