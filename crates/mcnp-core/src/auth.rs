use crate::store::{FormCache, SessionValidityStore};

/// Session side effects of logging in and out.
///
/// Credentials and tokens are handled by the host; this only keeps the
/// local validity flag and per-user caches in step with the login state.
#[derive(Clone)]
pub struct AppSession {
    session: SessionValidityStore,
    forms: FormCache,
}

impl AppSession {
    pub fn new(session: SessionValidityStore, forms: FormCache) -> Self {
        Self { session, forms }
    }

    /// Mark the new login valid and hand back any pending force-logout
    /// reason so the login screen can show it once.
    pub fn login(&self, user_id: &str) -> Option<String> {
        self.session.mark_valid();
        let reason = self.session.take_logout_reason();
        tracing::info!(user_id, had_logout_reason = reason.is_some(), "user logged in");
        reason
    }

    /// Clear the session and the user's form caches. History is kept.
    pub fn logout(&self, user_id: Option<&str>) {
        self.session.clear();
        match user_id {
            Some(id) => self.forms.clear_user(id),
            None => self.forms.clear_all_users(),
        }
        tracing::info!(user_id = user_id.unwrap_or("<unknown>"), "user logged out");
    }

    pub fn session(&self) -> &SessionValidityStore {
        &self.session
    }

    pub fn forms(&self) -> &FormCache {
        &self.forms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::keys;
    use crate::models::{FormProgress, FormSection, ProfileFormData};
    use crate::storage::{KeyValueStore, MemoryStore, SharedStore};
    use std::sync::Arc;

    fn setup() -> (AppSession, SharedStore) {
        let storage: SharedStore = Arc::new(MemoryStore::new());
        let app = AppSession::new(
            SessionValidityStore::new(Arc::clone(&storage)),
            FormCache::new(Arc::clone(&storage)),
        );
        (app, storage)
    }

    #[test]
    fn test_login_takes_logout_reason_once() {
        let (app, _storage) = setup();
        app.session().mark_invalid();
        app.session().set_logout_reason("Sesión cerrada por el administrador");

        assert_eq!(
            app.login("42").as_deref(),
            Some("Sesión cerrada por el administrador")
        );
        assert!(app.session().is_valid());
        assert_eq!(app.login("42"), None);
    }

    #[test]
    fn test_logout_clears_session_and_user_forms() {
        let (app, storage) = setup();
        app.login("42");
        storage.set(keys::NOTIFICATION_HISTORY, "[]").unwrap();
        app.forms().save_data("42", &ProfileFormData::new());
        app.forms()
            .save_progress("42", &FormProgress::new(FormSection::Professional));
        app.forms().save_data("7", &ProfileFormData::new());

        app.logout(Some("42"));

        assert!(storage.get(keys::SESSION_VALID).unwrap().is_none());
        assert!(app.forms().load_data("42").is_none());
        assert!(app.forms().load_progress("42").is_none());
        assert!(app.forms().load_data("7").is_some());
        assert!(storage.get(keys::NOTIFICATION_HISTORY).unwrap().is_some());
    }

    #[test]
    fn test_logout_without_user_clears_every_form() {
        let (app, _storage) = setup();
        app.forms().mark_completed("42");
        app.forms().save_data("7", &ProfileFormData::new());

        app.logout(None);

        assert!(!app.forms().is_completed("42"));
        assert!(app.forms().load_data("7").is_none());
    }
}
