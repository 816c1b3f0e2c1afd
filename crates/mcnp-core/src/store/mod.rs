pub mod form_cache;
pub mod history_queries;
pub mod history_store;
pub mod session_store;

pub use form_cache::FormCache;
pub use history_queries::{DayGroup, HistoryStats, SortOrder};
pub use history_store::{HistoryError, HistoryExport, NotificationHistoryStore};
pub use session_store::{SessionValidity, SessionValidityStore};
