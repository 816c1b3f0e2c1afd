//! Application-wide constants
//!
//! Centralized location for storage keys, placeholder strings and timing
//! defaults shared across the stores, the ingestion pipeline and the form
//! workflow.

/// Maximum number of notification records kept in history (newest first)
pub const HISTORY_CAPACITY: usize = 100;

// Notification placeholders
pub const DEFAULT_NOTIFICATION_TITLE: &str = "Sin título";
pub const DEFAULT_NOTIFICATION_BODY: &str = "Sin contenido";

/// Version tag written into exported history envelopes
pub const EXPORT_VERSION: &str = "1.0";

/// Prefix applied to the application-level notification id
pub const NOTIFICATION_ID_PREFIX: &str = "mcnp_";

/// Prefix for ids generated when a payload carries no identifier at all
pub const LOCAL_ID_PREFIX: &str = "local_";

/// `data.type` value that signals a remote force logout
pub const FORCE_LOGOUT_TYPE: &str = "force_logout";

/// Shown at the next login when a force logout carried no reason
pub const DEFAULT_LOGOUT_REASON: &str =
    "Tu sesión fue cerrada de forma remota. Por favor inicia sesión nuevamente.";

/// `data.type` bucket used for records without a type tag
pub const UNTYPED_NOTIFICATION: &str = "general";

/// Screen opened by a tapped notification that names no destination
pub const DEFAULT_NAVIGATION_SCREEN: &str = "NotificationHistory";

/// `data` fields retained by the history compress transform
pub const COMPRESSED_DATA_FIELDS: &[&str] = &["type", "screen", "section", "notificationId"];

// Timing defaults
/// Delay before navigating after a tap, lets the UI settle first
pub const NAVIGATION_DELAY_MS: u64 = 500;
pub const SESSION_POLL_INTERVAL_SECS: u64 = 60;
pub const HISTORY_REPAIR_INTERVAL_SECS: u64 = 5 * 60; // 5 minutes

// Profile form
pub const MIN_PASSWORD_LENGTH: usize = 6;
/// Wire encoding of an accepted consent checkbox
pub const CONSENT_ACCEPTED: &str = "1";

/// Default backend root, overridden by `MCNP_API_URL`
pub const DEFAULT_API_BASE_URL: &str = "https://mcnp.mx";

/// Persisted key-value storage keys
pub mod keys {
    /// Ordered array of notification records
    pub const NOTIFICATION_HISTORY: &str = "@notification_history";
    /// Decimal string mirror of the unread count
    pub const UNREAD_COUNT: &str = "@unread_notifications_count";

    pub const SESSION_VALID: &str = "@session_valid";
    pub const SESSION_START_TIME: &str = "@session_start_time";
    pub const SESSION_LAST_CHECK: &str = "@session_last_check";
    pub const FORCE_LOGOUT_REASON: &str = "@force_logout_reason";

    // Per-user keys, suffixed with the user id
    pub const FORM_DATA_PREFIX: &str = "@profile_form_data_";
    pub const FORM_PROGRESS_PREFIX: &str = "@profile_form_progress_";
    pub const FORM_COMPLETED_PREFIX: &str = "@profile_form_completed_";
}
