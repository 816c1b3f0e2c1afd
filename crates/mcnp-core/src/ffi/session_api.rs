use super::*;

#[uniffi::export]
impl McnpCore {
    /// Record a successful login. Returns the pending force-logout reason,
    /// if any, so the login screen can show it once.
    pub fn login(&self, user_id: String, token: Option<String>) -> Result<Option<String>, McnpError> {
        let services = self.services()?;
        services.api.set_token(token);
        Ok(services.app.login(&user_id))
    }

    /// Clear the session and the user's form caches. History is kept.
    pub fn logout(&self, user_id: Option<String>) -> Result<(), McnpError> {
        let services = self.services()?;
        services.api.set_token(None);
        services.app.logout(user_id.as_deref());
        Ok(())
    }

    pub fn set_auth_token(&self, token: Option<String>) -> Result<(), McnpError> {
        self.services()?.api.set_token(token);
        Ok(())
    }

    pub fn is_session_valid(&self) -> Result<bool, McnpError> {
        Ok(self.services()?.session.is_valid())
    }

    pub fn session_info(&self) -> Result<SessionInfo, McnpError> {
        Ok(self.services()?.session.snapshot().into())
    }

    pub fn take_logout_reason(&self) -> Result<Option<String>, McnpError> {
        Ok(self.services()?.session.take_logout_reason())
    }

    /// App returned to the foreground: check the session and repair the
    /// unread counter now. Returns the session validity.
    pub fn on_foreground(&self) -> Result<bool, McnpError> {
        Ok(self.services()?.monitor.on_foreground())
    }
}
