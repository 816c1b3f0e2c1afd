//! Remote backend for the profile-completion form.

mod client;

pub use client::BackendClient;

use std::future::Future;

use crate::models::ProfileFormData;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Backend rejected the request: {0}")]
    Rejected(String),
    #[error("Not authenticated")]
    NotAuthenticated,
}

/// Server side of the profile form: completion status and data uploads.
///
/// The form workflow is generic over this trait so tests can swap in an
/// in-process fake.
pub trait ProfileFormApi: Send + Sync {
    /// Whether the server already considers the user's form complete
    fn fetch_completion_status(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<bool, ApiError>> + Send;

    /// Upload the accumulated data; `completed` flags the final submission
    fn save_form_data(
        &self,
        user_id: &str,
        data: &ProfileFormData,
        completed: bool,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}
