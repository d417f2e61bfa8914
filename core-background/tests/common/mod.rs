//! Hand-written host fakes shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{
    ExemptionResponder, ForegroundServiceLauncher, InteractiveContext, PermissionOracle,
    PlatformInfo, ServiceIntent, ServiceStatus, SettingsStore, SettingsTransaction,
};
use core_background::{BackgroundExecutionController, CommandDispatcher, ConfigurationStore};
use core_runtime::events::EventBus;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Stored {
    Text(String),
    Flag(bool),
    Int(i64),
}

/// HashMap-backed settings with buffered transactions.
#[derive(Default)]
pub struct InMemorySettings {
    values: Arc<Mutex<HashMap<String, Stored>>>,
    fail_writes: AtomicBool,
}

impl InMemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn value(&self, key: &str) -> Option<Stored> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: Stored) {
        self.values.lock().unwrap().insert(key.to_string(), value);
    }

    fn check_writable(&self) -> BridgeResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(BridgeError::StorageError("disk full".to_string()))
        } else {
            Ok(())
        }
    }

    fn typed<T>(
        &self,
        key: &str,
        expected: &'static str,
        extract: impl Fn(&Stored) -> Option<T>,
    ) -> BridgeResult<Option<T>> {
        match self.values.lock().unwrap().get(key) {
            None => Ok(None),
            Some(value) => extract(value)
                .map(Some)
                .ok_or_else(|| BridgeError::TypeMismatch {
                    key: key.to_string(),
                    expected,
                    actual: format!("{:?}", value),
                }),
        }
    }
}

#[async_trait]
impl SettingsStore for InMemorySettings {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.check_writable()?;
        self.insert(key, Stored::Text(value.to_string()));
        Ok(())
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        self.typed(key, "string", |value| match value {
            Stored::Text(text) => Some(text.clone()),
            _ => None,
        })
    }

    async fn set_bool(&self, key: &str, value: bool) -> BridgeResult<()> {
        self.check_writable()?;
        self.insert(key, Stored::Flag(value));
        Ok(())
    }

    async fn get_bool(&self, key: &str) -> BridgeResult<Option<bool>> {
        self.typed(key, "bool", |value| match value {
            Stored::Flag(flag) => Some(*flag),
            _ => None,
        })
    }

    async fn set_i64(&self, key: &str, value: i64) -> BridgeResult<()> {
        self.check_writable()?;
        self.insert(key, Stored::Int(value));
        Ok(())
    }

    async fn get_i64(&self, key: &str) -> BridgeResult<Option<i64>> {
        self.typed(key, "i64", |value| match value {
            Stored::Int(int) => Some(*int),
            _ => None,
        })
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }

    async fn has_key(&self, key: &str) -> BridgeResult<bool> {
        Ok(self.values.lock().unwrap().contains_key(key))
    }

    async fn list_keys(&self) -> BridgeResult<Vec<String>> {
        Ok(self.values.lock().unwrap().keys().cloned().collect())
    }

    async fn clear_all(&self) -> BridgeResult<()> {
        self.values.lock().unwrap().clear();
        Ok(())
    }

    async fn begin_transaction(&self) -> BridgeResult<Box<dyn SettingsTransaction + Send>> {
        Ok(Box::new(InMemoryTransaction {
            target: Arc::clone(&self.values),
            pending: Vec::new(),
            fail_writes: self.fail_writes.load(Ordering::SeqCst),
        }))
    }
}

/// Buffers writes until commit. With `fail_writes` the third write fails, so
/// a partial write would be visible if rollback were broken.
pub struct InMemoryTransaction {
    target: Arc<Mutex<HashMap<String, Stored>>>,
    pending: Vec<(String, Stored)>,
    fail_writes: bool,
}

impl InMemoryTransaction {
    fn stage(&mut self, key: &str, value: Stored) -> BridgeResult<()> {
        if self.fail_writes && self.pending.len() >= 2 {
            return Err(BridgeError::StorageError("disk full".to_string()));
        }
        self.pending.push((key.to_string(), value));
        Ok(())
    }
}

#[async_trait]
impl SettingsTransaction for InMemoryTransaction {
    async fn set_string(&mut self, key: &str, value: &str) -> BridgeResult<()> {
        self.stage(key, Stored::Text(value.to_string()))
    }

    async fn set_bool(&mut self, key: &str, value: bool) -> BridgeResult<()> {
        self.stage(key, Stored::Flag(value))
    }

    async fn set_i64(&mut self, key: &str, value: i64) -> BridgeResult<()> {
        self.stage(key, Stored::Int(value))
    }

    async fn commit(self: Box<Self>) -> BridgeResult<()> {
        let mut target = self.target.lock().unwrap();
        for (key, value) in self.pending {
            target.insert(key, value);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> BridgeResult<()> {
        Ok(())
    }
}

// ============================================================================
// Permissions
// ============================================================================

/// How the fake answers the exemption dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogScript {
    /// Keep the responder until the test answers through [`ScriptedOracle`].
    Hold,
    Grant,
    Deny,
    /// Drop the responder without answering.
    Abandon,
    /// Refuse to show the dialog.
    Fail,
}

pub struct ScriptedOracle {
    wake_lock_granted: AtomicBool,
    ignoring_battery_optimizations: AtomicBool,
    script: Mutex<DialogScript>,
    held: Mutex<Option<ExemptionResponder>>,
    requests: Mutex<Vec<InteractiveContext>>,
    requested: Notify,
}

impl ScriptedOracle {
    pub fn new(wake_lock_granted: bool, ignoring_battery_optimizations: bool) -> Self {
        Self {
            wake_lock_granted: AtomicBool::new(wake_lock_granted),
            ignoring_battery_optimizations: AtomicBool::new(ignoring_battery_optimizations),
            script: Mutex::new(DialogScript::Hold),
            held: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            requested: Notify::new(),
        }
    }

    pub fn with_script(self, script: DialogScript) -> Self {
        *self.script.lock().unwrap() = script;
        self
    }

    pub fn set_wake_lock_granted(&self, granted: bool) {
        self.wake_lock_granted.store(granted, Ordering::SeqCst);
    }

    pub fn set_ignoring_battery_optimizations(&self, ignoring: bool) {
        self.ignoring_battery_optimizations
            .store(ignoring, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_context(&self) -> Option<InteractiveContext> {
        self.requests.lock().unwrap().last().cloned()
    }

    /// Wait until a held dialog is showing.
    pub async fn wait_for_dialog(&self) {
        loop {
            let notified = self.requested.notified();
            if self.held.lock().unwrap().is_some() {
                return;
            }
            notified.await;
        }
    }

    /// Answer the held dialog. Returns whether anybody was still waiting.
    pub fn answer(&self, granted: bool) -> bool {
        let responder = self.held.lock().unwrap().take();
        match responder {
            Some(responder) => {
                if granted {
                    self.set_ignoring_battery_optimizations(true);
                }
                responder.resolve(granted.into())
            }
            None => false,
        }
    }

    pub fn held_responder_abandoned(&self) -> Option<bool> {
        self.held
            .lock()
            .unwrap()
            .as_ref()
            .map(|responder| responder.is_abandoned())
    }
}

impl PermissionOracle for ScriptedOracle {
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
    ) -> BridgeResult<()> {
        let script = *self.script.lock().unwrap();
        if script == DialogScript::Fail {
            return Err(BridgeError::NotAvailable("settings screen missing".to_string()));
        }

        self.requests.lock().unwrap().push(context.clone());
        match script {
            DialogScript::Hold => {
                *self.held.lock().unwrap() = Some(responder);
                self.requested.notify_waiters();
            }
            DialogScript::Grant => {
                self.set_ignoring_battery_optimizations(true);
                responder.grant();
            }
            DialogScript::Deny => {
                responder.deny();
            }
            DialogScript::Abandon | DialogScript::Fail => drop(responder),
        }
        Ok(())
    }
}

// ============================================================================
// Service
// ============================================================================

/// Records every intent it receives.
#[derive(Default)]
pub struct RecordingLauncher {
    intents: Mutex<Vec<ServiceIntent>>,
    refuse_start: AtomicBool,
    refuse_shutdown: AtomicBool,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing_start(self) -> Self {
        self.refuse_start.store(true, Ordering::SeqCst);
        self
    }

    pub fn refusing_shutdown(self) -> Self {
        self.refuse_shutdown.store(true, Ordering::SeqCst);
        self
    }

    pub fn intents(&self) -> Vec<ServiceIntent> {
        self.intents.lock().unwrap().clone()
    }

    pub fn start_count(&self) -> usize {
        self.intents()
            .iter()
            .filter(|intent| matches!(intent, ServiceIntent::Start(_)))
            .count()
    }
}

#[async_trait]
impl ForegroundServiceLauncher for RecordingLauncher {
    async fn send(&self, intent: ServiceIntent) -> BridgeResult<()> {
        let refused = match intent {
            ServiceIntent::Start(_) => self.refuse_start.load(Ordering::SeqCst),
            ServiceIntent::Shutdown => self.refuse_shutdown.load(Ordering::SeqCst),
        };
        if refused {
            return Err(BridgeError::OperationFailed(format!(
                "{} refused",
                intent.action()
            )));
        }
        self.intents.lock().unwrap().push(intent);
        Ok(())
    }

    async fn status(&self) -> ServiceStatus {
        match self.intents.lock().unwrap().last() {
            Some(ServiceIntent::Start(_)) => ServiceStatus::Running,
            _ => ServiceStatus::Stopped,
        }
    }
}

pub struct FixedPlatform;

impl PlatformInfo for FixedPlatform {
    fn platform_name(&self) -> String {
        "Android".to_string()
    }

    fn platform_release(&self) -> String {
        "14".to_string()
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub settings: Arc<InMemorySettings>,
    pub oracle: Arc<ScriptedOracle>,
    pub launcher: Arc<RecordingLauncher>,
    pub event_bus: EventBus,
    pub controller: Arc<BackgroundExecutionController>,
}

impl Harness {
    pub async fn new(oracle: ScriptedOracle) -> Self {
        Self::with_parts(
            Arc::new(InMemorySettings::new()),
            oracle,
            RecordingLauncher::new(),
        )
        .await
    }

    pub async fn with_parts(
        settings: Arc<InMemorySettings>,
        oracle: ScriptedOracle,
        launcher: RecordingLauncher,
    ) -> Self {
        let oracle = Arc::new(oracle);
        let launcher = Arc::new(launcher);
        let event_bus = EventBus::new(64);

        let controller = BackgroundExecutionController::new(
            ConfigurationStore::new(settings.clone()),
            oracle.clone(),
            launcher.clone(),
            event_bus.clone(),
        )
        .await
        .with_exemption_timeout(Duration::from_secs(120));

        Self {
            settings,
            oracle,
            launcher,
            event_bus,
            controller: Arc::new(controller),
        }
    }

    pub fn dispatcher(&self) -> CommandDispatcher {
        CommandDispatcher::new(Arc::clone(&self.controller), Some(Arc::new(FixedPlatform)))
    }

    pub fn attach(&self) -> InteractiveContext {
        let context = InteractiveContext::new("main-activity");
        self.controller.attach_interactive_context(context.clone());
        context
    }
}
