// UniFFI scaffolding for generating Swift/Kotlin bindings
uniffi::setup_scaffolding!();

pub mod api;
pub mod auth;
pub mod config;
pub mod constants;
pub mod events;
pub mod ffi;
pub mod forms;
pub mod ingest;
pub mod models;
pub mod platform;
pub mod runtime;
pub mod search;
pub mod storage;
pub mod store;
pub mod tracing_setup;

pub use auth::AppSession;
pub use config::CoreConfig;
pub use events::{CoreEvent, EventBus, EventKind, Subscription};
pub use ffi::{McnpCore, McnpError};
pub use ingest::{DeliveryChannel, InboundNotification, IngestOutcome, IngestionPipeline};
pub use store::{FormCache, NotificationHistoryStore, SessionValidityStore};
