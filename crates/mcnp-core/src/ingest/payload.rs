use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{
    DEFAULT_LOGOUT_REASON, DEFAULT_NOTIFICATION_BODY, DEFAULT_NOTIFICATION_TITLE,
    FORCE_LOGOUT_TYPE, LOCAL_ID_PREFIX, NOTIFICATION_ID_PREFIX,
};
use crate::models::{DeepLink, NotificationData, NotificationRecord};

/// Notification as delivered by the push channel. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundNotification {
    /// Transport-level identifier assigned by the push provider
    #[serde(default, alias = "id")]
    pub identifier: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub data: Option<NotificationData>,
}

/// How a notification reached the app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    /// Delivered while the app was in the foreground
    Foreground,
    /// Delivered while the app was backgrounded or terminated
    Background,
    /// Still in the OS tray at app start
    AlreadyPresented,
    /// The user tapped it to open or resume the app
    Tapped,
}

impl DeliveryChannel {
    pub fn is_interaction(&self) -> bool {
        matches!(self, Self::Tapped)
    }

    pub fn received_in_background(&self) -> bool {
        !matches!(self, Self::Foreground)
    }
}

impl InboundNotification {
    pub fn data(&self) -> Option<&NotificationData> {
        self.data.as_ref()
    }

    fn data_str(&self, key: &str) -> Option<&str> {
        self.data
            .as_ref()?
            .get(key)?
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Application-level id carried in `data.notificationId`
    pub fn application_id(&self) -> Option<String> {
        match self.data.as_ref()?.get("notificationId")? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Stable history id: application id, else transport id, else generated
    pub fn logical_id(&self, now: DateTime<Utc>) -> String {
        if let Some(app_id) = self.application_id() {
            return format!("{}{}", NOTIFICATION_ID_PREFIX, app_id);
        }
        if let Some(identifier) = self
            .identifier
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            return identifier.to_string();
        }
        // Millisecond stamp plus a short random suffix so two payloads without
        // ids in the same millisecond do not collapse into one record
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("{}{}_{}", LOCAL_ID_PREFIX, now.timestamp_millis(), &suffix[..8])
    }

    /// Deep-link target for a tap; the history screen when the payload names none
    pub fn deep_link(&self) -> DeepLink {
        self.data
            .as_ref()
            .and_then(DeepLink::from_data)
            .unwrap_or_else(DeepLink::fallback)
    }

    pub fn notification_type(&self) -> Option<&str> {
        self.data_str("type")
    }

    pub fn is_force_logout(&self) -> bool {
        self.notification_type() == Some(FORCE_LOGOUT_TYPE)
    }

    /// Reason shown at next login: `data.reason`, else the body, else a default
    pub fn logout_reason(&self) -> String {
        self.data_str("reason")
            .or_else(|| self.body.as_deref().map(str::trim).filter(|s| !s.is_empty()))
            .unwrap_or(DEFAULT_LOGOUT_REASON)
            .to_string()
    }

    /// Build the history record for a first sighting of this notification
    pub fn to_record(
        &self,
        id: String,
        channel: DeliveryChannel,
        now: DateTime<Utc>,
    ) -> NotificationRecord {
        NotificationRecord {
            id,
            title: non_empty_or(self.title.as_deref(), DEFAULT_NOTIFICATION_TITLE),
            body: non_empty_or(self.body.as_deref(), DEFAULT_NOTIFICATION_BODY),
            data: self.data.clone().unwrap_or_default(),
            received_at: now,
            read: channel.is_interaction(),
            received_in_background: Some(channel.received_in_background()),
        }
    }
}

fn non_empty_or(value: Option<&str>, fallback: &str) -> String {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}
