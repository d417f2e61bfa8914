//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (settings, permission
//! oracle, foreground service launcher, platform info) into the background
//! execution core and exposes a single command channel to the host. Desktop
//! apps typically enable the `desktop-shims` feature (which depends on
//! `bridge-desktop`) so that every capability has a working default.

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{InteractiveContext, NotificationConfiguration};
use core_background::dispatcher::CHANNEL_NAME;
use core_background::{
    BackgroundError, BackgroundExecutionController, CommandDispatcher, MethodCall,
    MethodResponse, PartialNotificationConfiguration,
};
use core_runtime::config::BridgeConfig;
use core_runtime::events::{EventBus, EventStream};
use tracing::{debug, info};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct BackgroundService {
    event_bus: EventBus,
    dispatcher: CommandDispatcher,
}

impl BackgroundService {
    /// Build the service from a bridge configuration.
    ///
    /// Loads the persisted notification configuration before returning.
    pub async fn new(config: BridgeConfig) -> Result<Self> {
        config.validate()?;

        let event_bus = EventBus::new(config.event_buffer_size);
        let controller = Arc::new(
            BackgroundExecutionController::from_config(&config, event_bus.clone()).await,
        );
        let dispatcher = CommandDispatcher::new(controller, config.platform_info.clone());

        info!(channel = CHANNEL_NAME, "Background service ready");
        Ok(Self {
            event_bus,
            dispatcher,
        })
    }

    /// Name of the host channel commands arrive on.
    pub fn channel_name(&self) -> &'static str {
        CHANNEL_NAME
    }

    /// Answer one host command.
    pub async fn dispatch(&self, call: MethodCall) -> MethodResponse {
        self.dispatcher.dispatch(call).await
    }

    /// Answer one JSON-encoded command with a JSON-encoded response.
    ///
    /// A message that is not a valid [`MethodCall`] is answered with an
    /// `InvalidArgumentError` response rather than an `Err`.
    pub async fn dispatch_json(&self, message: &str) -> String {
        let response = match serde_json::from_str::<MethodCall>(message) {
            Ok(call) => self.dispatch(call).await,
            Err(err) => {
                debug!(error = %err, "Malformed command message");
                MethodResponse::from(BackgroundError::InvalidArgument {
                    key: "message".to_string(),
                    message: err.to_string(),
                })
            }
        };

        serde_json::to_string(&response).unwrap_or_else(|err| {
            serde_json::json!({
                "status": "error",
                "code": "InternalError",
                "message": err.to_string(),
            })
            .to_string()
        })
    }

    /// Typed form of the `initialize` command.
    pub async fn initialize(&self, update: PartialNotificationConfiguration) -> Result<bool> {
        Ok(self.controller().initialize(update).await?)
    }

    /// Typed form of the `enableBackgroundExecution` command.
    pub async fn enable(&self) -> Result<bool> {
        Ok(self.controller().enable_background_execution().await?)
    }

    /// Typed form of the `disableBackgroundExecution` command.
    pub async fn disable(&self) -> Result<bool> {
        Ok(self.controller().disable_background_execution().await?)
    }

    pub async fn configuration(&self) -> NotificationConfiguration {
        self.controller().configuration().await
    }

    /// The host gained a foreground UI.
    pub fn attach_interactive_context(&self, context: InteractiveContext) {
        self.controller().attach_interactive_context(context);
    }

    /// The host lost its foreground UI. Cancels any pending exemption dialog.
    pub fn detach_interactive_context(&self) -> Option<InteractiveContext> {
        self.controller().detach_interactive_context()
    }

    /// Subscribe to service, permission and configuration events.
    pub fn events(&self) -> EventStream {
        self.event_bus.subscribe()
    }

    pub fn controller(&self) -> &Arc<BackgroundExecutionController> {
        self.dispatcher.controller()
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Every capability falls back to its `bridge-desktop` implementation and
/// settings live in the per-user configuration directory.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// use core_background::MethodCall;
///
/// let service = core_service::bootstrap_desktop().await?;
/// let response = service.dispatch(MethodCall::new("hasPermissions")).await;
/// assert!(response.is_success());
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop() -> Result<BackgroundService> {
    let config = BridgeConfig::builder().build()?;
    BackgroundService::new(config).await
}
