use super::*;

#[uniffi::export]
impl McnpCore {
    // =========================================================================
    // HISTORY QUERIES
    // =========================================================================

    /// All records, newest first
    pub fn get_history(&self) -> Result<Vec<NotificationInfo>, McnpError> {
        Ok(to_infos(&self.services()?.history.history()))
    }

    pub fn get_notification(&self, id: String) -> Result<Option<NotificationInfo>, McnpError> {
        Ok(self
            .services()?
            .history
            .get_by_id(&id)
            .as_ref()
            .map(NotificationInfo::from))
    }

    pub fn get_unread_count(&self) -> Result<u32, McnpError> {
        Ok(self.services()?.history.unread_count())
    }

    pub fn filter_history_by_read(&self, read: bool) -> Result<Vec<NotificationInfo>, McnpError> {
        Ok(to_infos(&self.services()?.history.filter_by_read(read)))
    }

    pub fn filter_history_by_type(
        &self,
        notification_type: String,
    ) -> Result<Vec<NotificationInfo>, McnpError> {
        Ok(to_infos(
            &self.services()?.history.filter_by_type(&notification_type),
        ))
    }

    /// Records received within `[start_ms, end_ms]`, Unix milliseconds
    pub fn filter_history_by_date_range(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<NotificationInfo>, McnpError> {
        let start = chrono::DateTime::from_timestamp_millis(start_ms)
            .ok_or_else(|| invalid_input(format!("bad start timestamp {}", start_ms)))?;
        let end = chrono::DateTime::from_timestamp_millis(end_ms)
            .ok_or_else(|| invalid_input(format!("bad end timestamp {}", end_ms)))?;
        Ok(to_infos(
            &self.services()?.history.filter_by_date_range(start, end),
        ))
    }

    pub fn search_history(&self, query: String) -> Result<Vec<NotificationInfo>, McnpError> {
        Ok(to_infos(&self.services()?.history.search(&query)))
    }

    pub fn history_grouped_by_day(&self) -> Result<Vec<DayGroupInfo>, McnpError> {
        Ok(self
            .services()?
            .history
            .grouped_by_day()
            .iter()
            .map(DayGroupInfo::from)
            .collect())
    }

    pub fn history_stats(&self) -> Result<HistoryStatsInfo, McnpError> {
        Ok(self.services()?.history.stats().into())
    }

    // =========================================================================
    // HISTORY MUTATIONS
    // =========================================================================

    pub fn mark_notification_read(&self, id: String) -> Result<bool, McnpError> {
        let services = self.services()?;
        let changed = services.history.mark_read(&id);
        if changed {
            services.history.update_badge(None);
        }
        Ok(changed)
    }

    pub fn mark_all_notifications_read(&self) -> Result<u32, McnpError> {
        let services = self.services()?;
        let changed = services.history.mark_all_read();
        services.history.update_badge(Some(0));
        Ok(changed as u32)
    }

    pub fn delete_notification(&self, id: String) -> Result<bool, McnpError> {
        let services = self.services()?;
        let removed = services.history.delete(&id);
        if removed {
            services.history.update_badge(None);
        }
        Ok(removed)
    }

    pub fn delete_notifications(&self, ids: Vec<String>) -> Result<u32, McnpError> {
        let services = self.services()?;
        let removed = services.history.delete_many(&ids);
        if removed > 0 {
            services.history.update_badge(None);
        }
        Ok(removed as u32)
    }

    pub fn clear_history(&self) -> Result<(), McnpError> {
        let services = self.services()?;
        services.history.clear_all();
        services.history.update_badge(Some(0));
        Ok(())
    }

    /// Recompute the unread counter from the list and push it to the badge
    pub fn sync_unread_count(&self) -> Result<u32, McnpError> {
        Ok(self.services()?.history.sync_unread_count())
    }

    pub fn compress_history(&self) -> Result<u32, McnpError> {
        Ok(self.services()?.history.compress() as u32)
    }

    // =========================================================================
    // EXPORT / IMPORT
    // =========================================================================

    /// Versioned JSON envelope of the whole history
    pub fn export_history(&self) -> Result<String, McnpError> {
        self.services()?
            .history
            .export_json()
            .map_err(|e| McnpError::Internal {
                message: e.to_string(),
            })
    }

    /// Replace the history with an exported envelope. Returns the number of
    /// records imported.
    pub fn import_history(&self, json: String) -> Result<u32, McnpError> {
        self.services()?
            .history
            .import_json(&json)
            .map(|n| n as u32)
            .map_err(invalid_input)
    }
}
