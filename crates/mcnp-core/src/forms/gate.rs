use crate::api::ProfileFormApi;
use crate::store::FormCache;

/// Decide whether the profile form must be shown after login.
///
/// The local completed flag short-circuits the network. A server "completed"
/// answer is cached. A failed status check does not present the form.
pub async fn should_present_form<A: ProfileFormApi + ?Sized>(
    api: &A,
    cache: &FormCache,
    user_id: &str,
    role_requires_form: bool,
) -> bool {
    if !role_requires_form {
        return false;
    }
    if cache.is_completed(user_id) {
        tracing::debug!(user_id, "profile form already completed locally");
        return false;
    }

    match api.fetch_completion_status(user_id).await {
        Ok(true) => {
            cache.mark_completed(user_id);
            false
        }
        Ok(false) => true,
        Err(e) => {
            tracing::warn!(error = %e, user_id, "profile form status check failed");
            false
        }
    }
}
