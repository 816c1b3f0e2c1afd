//! FFI module for UniFFI bindings
//!
//! Synchronous surface for the Swift/Kotlin shells. Async work runs on a
//! shared Tokio runtime and is blocked on here; structured inputs cross the
//! boundary as JSON strings, outputs as UniFFI records.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use tokio::sync::mpsc;

use crate::api::BackendClient;
use crate::auth::AppSession;
use crate::config::CoreConfig;
use crate::events::{CoreEvent, EventBus, EventKind, Subscription};
use crate::forms::{FormErrors, ProfileFormWizard};
use crate::ingest::{Delivery, DeliveryChannel, IngestOutcome, IngestionPipeline, LiveListener};
use crate::models::{DeepLink, FormSection, NotificationRecord};
use crate::platform::{BadgeSink, NavigationSink, PlatformError};
use crate::runtime::{MonitorHandle, SessionMonitor};
use crate::storage::{JsonFileStore, SharedStore};
use crate::store::{
    DayGroup, FormCache, HistoryStats, NotificationHistoryStore, SessionValidity,
    SessionValidityStore,
};

mod callback_api;
mod form_api;
mod history_api;
mod ingest_api;
mod lifecycle_api;
mod session_api;

/// Shared Tokio runtime for async operations in FFI
static TOKIO_RUNTIME: OnceLock<Result<tokio::runtime::Runtime, String>> = OnceLock::new();

/// Get or initialize the shared Tokio runtime
fn get_tokio_runtime() -> Result<&'static tokio::runtime::Runtime, McnpError> {
    TOKIO_RUNTIME
        .get_or_init(|| {
            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .thread_name("mcnp-core")
                .build()
                .map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(|message| McnpError::Internal {
            message: format!("Failed to create Tokio runtime: {}", message),
        })
}

// =============================================================================
// ERRORS AND RECORDS
// =============================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum McnpError {
    #[error("Core not initialized")]
    CoreNotInitialized,
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
    #[error("Lock error: failed to acquire lock on {resource}")]
    LockError { resource: String },
    #[error("Internal error: {message}")]
    Internal { message: String },
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct NotificationInfo {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Unix milliseconds
    pub received_at: i64,
    pub read: bool,
    pub notification_type: String,
    pub icon: String,
    pub color: String,
    pub screen: Option<String>,
    pub section: Option<String>,
    /// Raw `data` payload as a JSON object string
    pub data_json: String,
}

impl From<&NotificationRecord> for NotificationInfo {
    fn from(record: &NotificationRecord) -> Self {
        let category = record.category();
        let link = record.deep_link();
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            body: record.body.clone(),
            received_at: record.received_at.timestamp_millis(),
            read: record.read,
            notification_type: record.type_or_default().to_string(),
            icon: category.icon().to_string(),
            color: category.color().to_string(),
            screen: link.as_ref().map(|l| l.screen.clone()),
            section: link.and_then(|l| l.section),
            data_json: serde_json::to_string(&record.data).unwrap_or_else(|_| "{}".to_string()),
        }
    }
}

fn to_infos(records: &[NotificationRecord]) -> Vec<NotificationInfo> {
    records.iter().map(NotificationInfo::from).collect()
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct DayGroupInfo {
    /// `YYYY-MM-DD`, UTC
    pub date: String,
    pub notifications: Vec<NotificationInfo>,
}

impl From<&DayGroup> for DayGroupInfo {
    fn from(group: &DayGroup) -> Self {
        Self {
            date: group.date.format("%Y-%m-%d").to_string(),
            notifications: to_infos(&group.records),
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct HistoryStatsInfo {
    pub total: u32,
    pub unread: u32,
    pub read: u32,
    pub by_type: HashMap<String, u32>,
}

impl From<HistoryStats> for HistoryStatsInfo {
    fn from(stats: HistoryStats) -> Self {
        Self {
            total: stats.total as u32,
            unread: stats.unread as u32,
            read: stats.read as u32,
            by_type: stats
                .by_type
                .into_iter()
                .map(|(k, v)| (k, v as u32))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct SessionInfo {
    pub valid: bool,
    pub session_start_time: Option<i64>,
    pub last_check_time: Option<i64>,
}

impl From<SessionValidity> for SessionInfo {
    fn from(validity: SessionValidity) -> Self {
        Self {
            valid: validity.valid,
            session_start_time: validity.session_start_time.map(|t| t.timestamp_millis()),
            last_check_time: validity.last_check_time.map(|t| t.timestamp_millis()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum NotificationChannel {
    Foreground,
    Background,
    AlreadyPresented,
    Tapped,
}

impl From<NotificationChannel> for DeliveryChannel {
    fn from(channel: NotificationChannel) -> Self {
        match channel {
            NotificationChannel::Foreground => DeliveryChannel::Foreground,
            NotificationChannel::Background => DeliveryChannel::Background,
            NotificationChannel::AlreadyPresented => DeliveryChannel::AlreadyPresented,
            NotificationChannel::Tapped => DeliveryChannel::Tapped,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum IngestOutcomeKind {
    Created,
    MarkedRead,
    Duplicate,
    Failed,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct IngestResult {
    pub outcome: IngestOutcomeKind,
    pub id: String,
    pub screen: Option<String>,
    pub section: Option<String>,
}

impl From<&IngestOutcome> for IngestResult {
    fn from(outcome: &IngestOutcome) -> Self {
        let kind = match outcome {
            IngestOutcome::Created { .. } => IngestOutcomeKind::Created,
            IngestOutcome::MarkedRead { .. } => IngestOutcomeKind::MarkedRead,
            IngestOutcome::Duplicate { .. } => IngestOutcomeKind::Duplicate,
            IngestOutcome::Failed { .. } => IngestOutcomeKind::Failed,
        };
        Self {
            outcome: kind,
            id: outcome.id().to_string(),
            screen: outcome.navigation().map(|l| l.screen.clone()),
            section: outcome.navigation().and_then(|l| l.section.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum ProfileFormStep {
    Personal,
    Professional,
    Additional,
}

impl From<ProfileFormStep> for FormSection {
    fn from(step: ProfileFormStep) -> Self {
        match step {
            ProfileFormStep::Personal => FormSection::Personal,
            ProfileFormStep::Professional => FormSection::Professional,
            ProfileFormStep::Additional => FormSection::Additional,
        }
    }
}

impl From<FormSection> for ProfileFormStep {
    fn from(section: FormSection) -> Self {
        match section {
            FormSection::Personal => ProfileFormStep::Personal,
            FormSection::Professional => ProfileFormStep::Professional,
            FormSection::Additional => ProfileFormStep::Additional,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FieldErrorInfo {
    /// Wire field name, e.g. `conocer_mcnp`
    pub field: String,
    pub message: String,
}

fn to_field_errors(errors: &FormErrors) -> Vec<FieldErrorInfo> {
    errors
        .iter()
        .map(|(field, error)| FieldErrorInfo {
            field: field.name().to_string(),
            message: error.to_string(),
        })
        .collect()
}

// =============================================================================
// CALLBACK INTERFACES
// =============================================================================

/// Push-based updates for the UI layer
#[uniffi::export(callback_interface)]
pub trait EventCallback: Send + Sync {
    /// History changed; `unread_count` is the new counter value
    fn on_history_updated(&self, unread_count: u32);

    /// The session was invalidated and the user must be sent to login
    fn on_session_invalidated(&self, reason: String);
}

/// OS services the core drives
#[uniffi::export(callback_interface)]
pub trait PlatformCallback: Send + Sync {
    fn set_badge_count(&self, count: u32);

    fn navigate(&self, screen: String, section: Option<String>);
}

type CallbackSlot<T> = Arc<RwLock<Option<Arc<T>>>>;

/// Adapts the optional platform callback to the core's collaborator traits.
/// Calls made before a callback is registered are dropped.
struct PlatformBridge {
    callback: CallbackSlot<dyn PlatformCallback>,
}

impl PlatformBridge {
    fn current(&self) -> Option<Arc<dyn PlatformCallback>> {
        self.callback.read().ok().and_then(|guard| guard.clone())
    }
}

impl BadgeSink for PlatformBridge {
    fn set_badge_count(&self, count: u32) -> Result<(), PlatformError> {
        if let Some(callback) = self.current() {
            callback.set_badge_count(count);
        }
        Ok(())
    }
}

impl NavigationSink for PlatformBridge {
    fn navigate(&self, target: DeepLink) {
        match self.current() {
            Some(callback) => callback.navigate(target.screen, target.section),
            None => tracing::debug!(screen = %target.screen, "no platform callback for navigation"),
        }
    }
}

// =============================================================================
// CORE
// =============================================================================

/// Everything built by `init()`
struct CoreServices {
    config: CoreConfig,
    history: Arc<NotificationHistoryStore>,
    session: SessionValidityStore,
    forms: FormCache,
    app: AppSession,
    api: Arc<BackendClient>,
    pipeline: Arc<IngestionPipeline>,
    monitor: Arc<SessionMonitor>,
    live_tx: mpsc::UnboundedSender<Delivery>,
    live_rx: Mutex<Option<mpsc::UnboundedReceiver<Delivery>>>,
    live_listener: Mutex<Option<LiveListener>>,
    monitor_handle: Mutex<Option<MonitorHandle>>,
    wizard: tokio::sync::Mutex<Option<ProfileFormWizard<BackendClient>>>,
    _subscriptions: Vec<Subscription>,
}

/// MCNP client core exposed to foreign languages.
///
/// UniFFI objects are wrapped in Arc, so state uses interior mutability.
#[derive(uniffi::Object)]
pub struct McnpCore {
    initialized: AtomicBool,
    services: Arc<RwLock<Option<Arc<CoreServices>>>>,
    event_callback: CallbackSlot<dyn EventCallback>,
    platform_callback: CallbackSlot<dyn PlatformCallback>,
}

impl McnpCore {
    fn services(&self) -> Result<Arc<CoreServices>, McnpError> {
        let guard = self.services.read().map_err(|_| McnpError::LockError {
            resource: "services".to_string(),
        })?;
        guard.clone().ok_or(McnpError::CoreNotInitialized)
    }

    fn build_services(&self, config: CoreConfig) -> Result<CoreServices, McnpError> {
        let runtime = get_tokio_runtime()?;
        let _enter = runtime.enter();

        let storage: SharedStore = Arc::new(JsonFileStore::open(config.storage_path()));
        let bus = EventBus::new();
        let bridge = Arc::new(PlatformBridge {
            callback: Arc::clone(&self.platform_callback),
        });

        let history = Arc::new(
            NotificationHistoryStore::new(Arc::clone(&storage), Arc::clone(&bus), bridge.clone())
                .with_capacity(config.history_capacity),
        );
        let session = SessionValidityStore::new(Arc::clone(&storage));
        let forms = FormCache::new(Arc::clone(&storage));
        let app = AppSession::new(session.clone(), forms.clone());
        let api = Arc::new(BackendClient::new(config.api_base_url.clone()));

        let pipeline = Arc::new(
            IngestionPipeline::new(
                Arc::clone(&history),
                session.clone(),
                Arc::clone(&bus),
                bridge,
            )
            .with_navigation_delay(config.navigation_delay),
        );

        let subscriptions = self.forward_events(&bus);

        let invalidation_bus = Arc::clone(&bus);
        let invalidation_session = session.clone();
        let monitor = SessionMonitor::new(
            session.clone(),
            Arc::clone(&history),
            Arc::new(move || {
                let reason = invalidation_session
                    .logout_reason()
                    .unwrap_or_else(|| crate::constants::DEFAULT_LOGOUT_REASON.to_string());
                invalidation_bus.publish(CoreEvent::SessionInvalidated { reason });
            }),
        );
        let monitor_handle = monitor.spawn_with_config(&config);

        let (live_tx, live_rx) = mpsc::unbounded_channel();

        Ok(CoreServices {
            config,
            history,
            session,
            forms,
            app,
            api,
            pipeline,
            monitor,
            live_tx,
            live_rx: Mutex::new(Some(live_rx)),
            live_listener: Mutex::new(None),
            monitor_handle: Mutex::new(Some(monitor_handle)),
            wizard: tokio::sync::Mutex::new(None),
            _subscriptions: subscriptions,
        })
    }

    /// Relay bus events to whichever event callback is registered
    fn forward_events(&self, bus: &Arc<EventBus>) -> Vec<Subscription> {
        let history_slot = Arc::clone(&self.event_callback);
        let history_sub = bus.subscribe(EventKind::HistoryUpdated, move |event| {
            if let CoreEvent::HistoryUpdated { unread_count } = event {
                if let Some(callback) = history_slot.read().ok().and_then(|g| g.clone()) {
                    callback.on_history_updated(*unread_count);
                }
            }
        });

        let session_slot = Arc::clone(&self.event_callback);
        let session_sub = bus.subscribe(EventKind::SessionInvalidated, move |event| {
            if let CoreEvent::SessionInvalidated { reason } = event {
                if let Some(callback) = session_slot.read().ok().and_then(|g| g.clone()) {
                    callback.on_session_invalidated(reason.clone());
                }
            }
        });

        vec![history_sub, session_sub]
    }
}

fn data_dir_or_default(data_dir: Option<String>) -> PathBuf {
    data_dir
        .filter(|d| !d.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(crate::config::default_data_dir)
}

fn lock_error(resource: &str) -> McnpError {
    McnpError::LockError {
        resource: resource.to_string(),
    }
}

fn invalid_input(message: impl std::fmt::Display) -> McnpError {
    McnpError::InvalidInput {
        message: message.to_string(),
    }
}
