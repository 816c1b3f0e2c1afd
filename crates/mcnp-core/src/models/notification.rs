use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{
    COMPRESSED_DATA_FIELDS, DEFAULT_NAVIGATION_SCREEN, FORCE_LOGOUT_TYPE, UNTYPED_NOTIFICATION,
};

/// Opaque key-value payload attached to a notification
pub type NotificationData = Map<String, Value>;

/// One entry of the local notification history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: NotificationData,
    pub received_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_in_background: Option<bool>,
}

impl NotificationRecord {
    /// The `data.type` tag, if present and a string
    pub fn notification_type(&self) -> Option<&str> {
        self.data.get("type").and_then(Value::as_str)
    }

    /// Type tag used for grouping and stats; untagged records count as `general`
    pub fn type_or_default(&self) -> &str {
        self.notification_type().unwrap_or(UNTYPED_NOTIFICATION)
    }

    pub fn is_force_logout(&self) -> bool {
        self.notification_type() == Some(FORCE_LOGOUT_TYPE)
    }

    pub fn category(&self) -> NotificationCategory {
        NotificationCategory::from_type(self.notification_type())
    }

    /// Deep-link target carried by the payload
    pub fn deep_link(&self) -> Option<DeepLink> {
        DeepLink::from_data(&self.data)
    }

    /// Drop every `data` field except the navigation and type keys
    pub fn compress(&mut self) {
        self.data
            .retain(|key, _| COMPRESSED_DATA_FIELDS.contains(&key.as_str()));
    }
}

/// Destination for a tapped notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepLink {
    pub screen: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl DeepLink {
    pub fn new(screen: impl Into<String>, section: Option<String>) -> Self {
        Self {
            screen: screen.into(),
            section,
        }
    }

    pub fn from_data(data: &NotificationData) -> Option<Self> {
        let screen = data.get("screen").and_then(Value::as_str)?.trim();
        if screen.is_empty() {
            return None;
        }
        let section = data
            .get("section")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Some(Self::new(screen, section))
    }

    /// The notification history screen
    pub fn fallback() -> Self {
        Self::new(DEFAULT_NAVIGATION_SCREEN, None)
    }
}

/// Icon/colour bucket derived from `data.type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    Event,
    News,
    Reminder,
    Alert,
    ForceLogout,
    General,
}

impl NotificationCategory {
    pub fn from_type(kind: Option<&str>) -> Self {
        match kind.map(|k| k.to_ascii_lowercase()).as_deref() {
            Some("event") | Some("evento") => Self::Event,
            Some("news") | Some("noticia") => Self::News,
            Some("reminder") | Some("recordatorio") => Self::Reminder,
            Some("alert") | Some("alerta") => Self::Alert,
            Some(FORCE_LOGOUT_TYPE) => Self::ForceLogout,
            _ => Self::General,
        }
    }

    /// Icon name understood by the native shells
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Event => "calendar",
            Self::News => "newspaper",
            Self::Reminder => "alarm",
            Self::Alert => "warning",
            Self::ForceLogout => "log-out",
            Self::General => "notifications",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Event => "#1E88E5",
            Self::News => "#43A047",
            Self::Reminder => "#FB8C00",
            Self::Alert | Self::ForceLogout => "#E53935",
            Self::General => "#6D6D6D",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_with_data(data: Value) -> NotificationRecord {
        NotificationRecord {
            id: "mcnp_1".to_string(),
            title: "T".to_string(),
            body: "B".to_string(),
            data: data.as_object().cloned().unwrap_or_default(),
            received_at: Utc::now(),
            read: false,
            received_in_background: None,
        }
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut record = record_with_data(json!({"type": "event"}));
        record.received_in_background = Some(true);
        let value = serde_json::to_value(&record).unwrap();

        assert!(value.get("receivedAt").is_some());
        assert_eq!(value["receivedInBackground"], json!(true));
        assert_eq!(value["data"]["type"], json!("event"));
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let record: NotificationRecord = serde_json::from_value(json!({
            "id": "x",
            "title": "t",
            "body": "b",
            "receivedAt": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert!(!record.read);
        assert!(record.data.is_empty());
        assert_eq!(record.received_in_background, None);
    }

    #[test]
    fn test_deep_link_extraction() {
        let record = record_with_data(json!({"screen": "Events", "section": "agenda"}));
        assert_eq!(
            record.deep_link(),
            Some(DeepLink::new("Events", Some("agenda".to_string())))
        );

        let no_link = record_with_data(json!({"type": "event"}));
        assert_eq!(no_link.deep_link(), None);
        assert_eq!(DeepLink::fallback().screen, DEFAULT_NAVIGATION_SCREEN);
    }

    #[test]
    fn test_compress_keeps_whitelisted_fields() {
        let mut record = record_with_data(json!({
            "type": "news",
            "screen": "News",
            "notificationId": 42,
            "imageUrl": "https://example.com/big.png",
            "html": "<p>long</p>"
        }));
        record.compress();

        let mut keys: Vec<_> = record.data.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["notificationId", "screen", "type"]);
    }

    #[test]
    fn test_category_from_type() {
        assert_eq!(record_with_data(json!({"type": "Event"})).category(), NotificationCategory::Event);
        assert_eq!(
            record_with_data(json!({"type": "force_logout"})).category(),
            NotificationCategory::ForceLogout
        );
        assert_eq!(record_with_data(json!({})).category(), NotificationCategory::General);
        assert_eq!(record_with_data(json!({})).type_or_default(), "general");
    }
}
