//! # Command Dispatcher
//!
//! Routes named commands from the host channel to the controller and turns
//! every outcome into exactly one [`MethodResponse`].
//!
//! | Command | Result |
//! |---|---|
//! | `getPlatformVersion` | string |
//! | `hasPermissions` | bool |
//! | `initialize` | bool or error |
//! | `enableBackgroundExecution` | bool or error |
//! | `disableBackgroundExecution` | bool |
//!
//! Anything else answers [`MethodResponse::NotImplemented`].

use crate::configuration::PartialNotificationConfiguration;
use crate::controller::BackgroundExecutionController;
use crate::error::{BackgroundError, Result};
use bridge_traits::PlatformInfo;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Name of the host channel the dispatcher answers on.
pub const CHANNEL_NAME: &str = "background_bridge";

/// Reported by `getPlatformVersion` when the host gave no platform info.
pub const UNKNOWN_PLATFORM_VERSION: &str = "unknown";

/// One incoming command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    /// JSON object of arguments; `null` is treated as empty.
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: Value::Null,
        }
    }

    pub fn with_arguments(method: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            method: method.into(),
            arguments: Value::Object(arguments),
        }
    }

    fn argument_map(&self) -> Result<Map<String, Value>> {
        match &self.arguments {
            Value::Null => Ok(Map::new()),
            Value::Object(map) => Ok(map.clone()),
            other => Err(BackgroundError::InvalidArgument {
                key: "arguments".to_string(),
                message: format!("expected an object, got {}", other),
            }),
        }
    }
}

/// The single answer to a [`MethodCall`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MethodResponse {
    Success {
        result: Value,
    },
    Error {
        code: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    NotImplemented,
}

impl MethodResponse {
    pub fn success(result: impl Into<Value>) -> Self {
        MethodResponse::Success {
            result: result.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MethodResponse::Success { .. })
    }

    /// Error code, for error responses.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            MethodResponse::Error { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<BackgroundError> for MethodResponse {
    fn from(err: BackgroundError) -> Self {
        MethodResponse::Error {
            code: err.code().to_string(),
            message: err.to_string(),
            details: err.details(),
        }
    }
}

impl From<Result<bool>> for MethodResponse {
    fn from(result: Result<bool>) -> Self {
        match result {
            Ok(value) => MethodResponse::success(value),
            Err(err) => err.into(),
        }
    }
}

/// Commands understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    GetPlatformVersion,
    HasPermissions,
    Initialize,
    EnableBackgroundExecution,
    DisableBackgroundExecution,
}

impl Command {
    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            "getPlatformVersion" => Some(Command::GetPlatformVersion),
            "hasPermissions" => Some(Command::HasPermissions),
            "initialize" => Some(Command::Initialize),
            "enableBackgroundExecution" => Some(Command::EnableBackgroundExecution),
            "disableBackgroundExecution" => Some(Command::DisableBackgroundExecution),
            _ => None,
        }
    }

    pub fn method(self) -> &'static str {
        match self {
            Command::GetPlatformVersion => "getPlatformVersion",
            Command::HasPermissions => "hasPermissions",
            Command::Initialize => "initialize",
            Command::EnableBackgroundExecution => "enableBackgroundExecution",
            Command::DisableBackgroundExecution => "disableBackgroundExecution",
        }
    }
}

/// Routes [`MethodCall`]s to the controller.
#[derive(Clone)]
pub struct CommandDispatcher {
    controller: Arc<BackgroundExecutionController>,
    platform_info: Option<Arc<dyn PlatformInfo>>,
}

impl CommandDispatcher {
    pub fn new(
        controller: Arc<BackgroundExecutionController>,
        platform_info: Option<Arc<dyn PlatformInfo>>,
    ) -> Self {
        Self {
            controller,
            platform_info,
        }
    }

    pub fn controller(&self) -> &Arc<BackgroundExecutionController> {
        &self.controller
    }

    #[instrument(skip(self, call), fields(method = %call.method))]
    pub async fn dispatch(&self, call: MethodCall) -> MethodResponse {
        let Some(command) = Command::from_method(&call.method) else {
            debug!("Unknown method");
            return MethodResponse::NotImplemented;
        };

        let response = match command {
            Command::GetPlatformVersion => MethodResponse::success(self.platform_version()),
            Command::HasPermissions => MethodResponse::success(self.controller.has_permissions()),
            Command::Initialize => self.initialize(&call).await.into(),
            Command::EnableBackgroundExecution => {
                self.controller.enable_background_execution().await.into()
            }
            Command::DisableBackgroundExecution => {
                self.controller.disable_background_execution().await.into()
            }
        };

        if let Some(code) = response.error_code() {
            warn!(code, "Command failed");
        }
        response
    }

    fn platform_version(&self) -> String {
        self.platform_info
            .as_ref()
            .map(|info| info.platform_version())
            .unwrap_or_else(|| UNKNOWN_PLATFORM_VERSION.to_string())
    }

    async fn initialize(&self, call: &MethodCall) -> Result<bool> {
        let arguments = call.argument_map()?;
        let update = PartialNotificationConfiguration::from_arguments(&arguments)?;
        self.controller.initialize(update).await
    }
}
