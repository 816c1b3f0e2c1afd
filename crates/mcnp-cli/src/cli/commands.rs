use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use mcnp_core::platform::{NoopBadge, NoopNavigator};
use mcnp_core::storage::{JsonFileStore, SharedStore};
use mcnp_core::store::history_queries;
use mcnp_core::{
    CoreConfig, EventBus, FormCache, InboundNotification, IngestionPipeline,
    NotificationHistoryStore, SessionValidityStore,
};

use super::protocol::CliCommand;

/// Stores opened over one data directory
pub struct Workspace {
    history: Arc<NotificationHistoryStore>,
    session: SessionValidityStore,
    forms: FormCache,
    pipeline: IngestionPipeline,
}

impl Workspace {
    pub fn open(config: &CoreConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("Failed to create data directory: {}", config.data_dir.display())
        })?;
        tracing::debug!(path = %config.storage_path().display(), "opening storage");

        let storage: SharedStore = Arc::new(JsonFileStore::open(config.storage_path()));
        let bus = EventBus::new();
        let history = Arc::new(
            NotificationHistoryStore::new(Arc::clone(&storage), Arc::clone(&bus), Arc::new(NoopBadge))
                .with_capacity(config.history_capacity),
        );
        let session = SessionValidityStore::new(Arc::clone(&storage));
        let forms = FormCache::new(Arc::clone(&storage));
        // Nothing to navigate to from a terminal
        let pipeline = IngestionPipeline::new(
            Arc::clone(&history),
            session.clone(),
            bus,
            Arc::new(NoopNavigator),
        )
        .with_navigation_delay(Duration::ZERO);

        Ok(Self {
            history,
            session,
            forms,
            pipeline,
        })
    }
}

/// Run one command and return its JSON result
pub fn execute(command: CliCommand, ws: &Workspace) -> Result<Value> {
    let result = match command {
        CliCommand::HistoryList { unread_only, kind } => {
            let mut records = if unread_only {
                ws.history.filter_by_read(false)
            } else {
                ws.history.history()
            };
            if let Some(kind) = kind {
                records = history_queries::filter_by_type(&records, &kind);
            }
            json!({ "count": records.len(), "notifications": records })
        }
        CliCommand::HistoryStats => serde_json::to_value(ws.history.stats())?,
        CliCommand::HistorySearch { query } => {
            let records = ws.history.search(&query);
            json!({ "query": query, "count": records.len(), "notifications": records })
        }
        CliCommand::HistoryMarkRead { id } => {
            let changed = ws.history.mark_read(&id);
            json!({ "id": id, "changed": changed, "unread": ws.history.unread_count() })
        }
        CliCommand::HistoryMarkAllRead => {
            json!({ "changed": ws.history.mark_all_read() })
        }
        CliCommand::HistoryDelete { ids } => {
            let deleted = ws.history.delete_many(&ids);
            json!({ "deleted": deleted, "unread": ws.history.unread_count() })
        }
        CliCommand::HistoryClear => {
            ws.history.clear_all();
            json!({ "cleared": true })
        }
        CliCommand::HistoryExport { output: None } => serde_json::to_value(ws.history.export())?,
        CliCommand::HistoryExport { output: Some(path) } => {
            let envelope = ws.history.export_json()?;
            std::fs::write(&path, envelope)
                .with_context(|| format!("Failed to write export: {}", path.display()))?;
            json!({ "path": path.display().to_string(), "count": ws.history.history().len() })
        }
        CliCommand::HistoryImport { input } => {
            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read export: {}", input.display()))?;
            let imported = ws
                .history
                .import_json(&content)
                .with_context(|| format!("Failed to import {}", input.display()))?;
            json!({ "imported": imported, "unread": ws.history.unread_count() })
        }
        CliCommand::HistorySync => json!({ "unread": ws.history.sync_unread_count() }),
        CliCommand::HistoryCompress => json!({ "compressed": ws.history.compress() }),
        CliCommand::Ingest { json, channel } => {
            let notification: InboundNotification =
                serde_json::from_str(&json).context("Failed to parse notification payload")?;
            let outcome = ws.pipeline.ingest(&notification, channel.into());
            serde_json::to_value(outcome)?
        }
        CliCommand::SessionStatus => {
            let mut status = serde_json::to_value(ws.session.snapshot())?;
            status["logoutReason"] = json!(ws.session.logout_reason());
            status
        }
        CliCommand::SessionInvalidate { reason } => {
            ws.session.mark_invalid();
            if let Some(reason) = &reason {
                ws.session.set_logout_reason(reason);
            }
            json!({ "valid": false, "logoutReason": reason })
        }
        CliCommand::SessionValidate => {
            ws.session.mark_valid();
            json!({ "valid": true })
        }
        CliCommand::SessionClear => {
            ws.session.clear();
            json!({ "cleared": true })
        }
        CliCommand::FormShow { user_id } => {
            let data = ws.forms.load_data(&user_id).map(|d| d.to_wire());
            json!({
                "userId": user_id,
                "completed": ws.forms.is_completed(&user_id),
                "progress": ws.forms.load_progress(&user_id),
                "data": data,
            })
        }
        CliCommand::FormClear { user_id } => {
            ws.forms.clear_user(&user_id);
            json!({ "userId": user_id, "cleared": true })
        }
    };
    Ok(result)
}
