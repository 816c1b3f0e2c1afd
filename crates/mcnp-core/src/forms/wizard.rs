use std::sync::Arc;

use super::validation::{validate_section, validate_submission, FormErrors};
use crate::api::ProfileFormApi;
use crate::models::{FieldValue, FormField, FormProgress, FormSection, ProfileFormData};
use crate::store::FormCache;

const SUBMIT_FAILED_ALERT: &str =
    "No se pudo enviar el formulario. Revisa tu conexión e inténtalo de nuevo.";

/// Result of advancing the wizard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Advanced(FormSection),
    Invalid,
    AtFinalStep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Completed,
    Invalid,
    /// Upload failed; `alert` is the blocking message to show
    Failed { alert: String },
    NotOnFinalStep,
}

/// What a hardware/gesture back press did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackAction {
    Previous(FormSection),
    Swallowed,
}

/// Three-step profile completion wizard for one user.
///
/// Each accepted step is persisted locally before it is pushed to the
/// server, so the user can leave and resume on any step.
pub struct ProfileFormWizard<A: ProfileFormApi> {
    user_id: String,
    api: Arc<A>,
    cache: FormCache,
    section: FormSection,
    data: ProfileFormData,
    errors: FormErrors,
    loading: bool,
    completed: bool,
}

impl<A: ProfileFormApi> ProfileFormWizard<A> {
    /// Open the wizard, resuming cached data and the remembered step
    pub fn mount(user_id: impl Into<String>, api: Arc<A>, cache: FormCache) -> Self {
        let user_id = user_id.into();
        let data = cache.load_data(&user_id).unwrap_or_default();
        let section = cache
            .load_progress(&user_id)
            .map(|p| p.current_section)
            .unwrap_or(FormSection::Personal);

        tracing::debug!(
            user_id = %user_id,
            section = ?section,
            fields = data.len(),
            "profile form mounted"
        );

        Self {
            user_id,
            api,
            cache,
            section,
            data,
            errors: FormErrors::new(),
            loading: false,
            completed: false,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn section(&self) -> FormSection {
        self.section
    }

    pub fn data(&self) -> &ProfileFormData {
        &self.data
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn set_value(&mut self, field: FormField, value: FieldValue) {
        self.data.set(field, value);
        self.errors.remove(&field);
    }

    pub fn set_text(&mut self, field: FormField, text: impl Into<String>) {
        self.set_value(field, FieldValue::Text(text.into()));
    }

    pub fn set_list(&mut self, field: FormField, items: Vec<String>) {
        self.set_value(field, FieldValue::List(items));
    }

    pub fn set_consent(&mut self, field: FormField, accepted: bool) {
        self.set_value(field, FieldValue::Consent(accepted));
    }

    /// Validate the current step and move forward
    pub async fn next(&mut self) -> StepOutcome {
        let Some(next) = self.section.next() else {
            return StepOutcome::AtFinalStep;
        };

        self.errors = validate_section(&self.data, self.section);
        if !self.errors.is_empty() {
            tracing::debug!(section = ?self.section, errors = self.errors.len(), "step invalid");
            return StepOutcome::Invalid;
        }

        self.cache.save_data(&self.user_id, &self.data);
        self.cache
            .save_progress(&self.user_id, &FormProgress::new(next));

        self.loading = true;
        if let Err(e) = self.api.save_form_data(&self.user_id, &self.data, false).await {
            tracing::warn!(error = %e, section = ?self.section, "partial form upload failed");
        }
        self.loading = false;

        self.section = next;
        StepOutcome::Advanced(next)
    }

    /// Step back without validating; only the position is persisted
    pub fn previous(&mut self) -> Option<FormSection> {
        let prev = self.section.prev()?;
        self.section = prev;
        self.errors.clear();
        self.cache
            .save_progress(&self.user_id, &FormProgress::new(prev));
        Some(prev)
    }

    pub fn handle_back(&mut self) -> BackAction {
        match self.previous() {
            Some(section) => BackAction::Previous(section),
            None => BackAction::Swallowed,
        }
    }

    /// Final upload. The completed flag is cached only after the server
    /// accepts the data.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if !self.section.is_last() {
            return SubmitOutcome::NotOnFinalStep;
        }

        self.errors = validate_submission(&self.data);
        if !self.errors.is_empty() {
            return SubmitOutcome::Invalid;
        }

        self.cache.save_data(&self.user_id, &self.data);

        self.loading = true;
        let result = self.api.save_form_data(&self.user_id, &self.data, true).await;
        self.loading = false;

        match result {
            Ok(()) => {
                self.cache.mark_completed(&self.user_id);
                self.cache.clear_partial(&self.user_id);
                self.completed = true;
                tracing::info!(user_id = %self.user_id, "profile form completed");
                SubmitOutcome::Completed
            }
            Err(e) => {
                tracing::warn!(error = %e, user_id = %self.user_id, "profile form submission failed");
                SubmitOutcome::Failed {
                    alert: SUBMIT_FAILED_ALERT.to_string(),
                }
            }
        }
    }
}
