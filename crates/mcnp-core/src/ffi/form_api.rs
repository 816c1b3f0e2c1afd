use super::*;

use crate::forms::{self, BackAction, StepOutcome, SubmitOutcome};
use crate::models::{FieldValue, FormField, ProfileFormData};

#[derive(Debug, Clone, uniffi::Record)]
pub struct ProfileFormSnapshot {
    pub user_id: String,
    pub step: ProfileFormStep,
    /// Current data in wire encoding, as a JSON object string
    pub data_json: String,
    pub errors: Vec<FieldErrorInfo>,
    pub loading: bool,
    pub completed: bool,
    /// Blocking alert to show after a failed submission
    pub alert: Option<String>,
}

fn snapshot(wizard: &ProfileFormWizard<BackendClient>, alert: Option<String>) -> ProfileFormSnapshot {
    ProfileFormSnapshot {
        user_id: wizard.user_id().to_string(),
        step: wizard.section().into(),
        data_json: serde_json::to_string(&wizard.data().to_wire())
            .unwrap_or_else(|_| "{}".to_string()),
        errors: to_field_errors(wizard.errors()),
        loading: wizard.is_loading(),
        completed: wizard.is_completed(),
        alert,
    }
}

fn parse_form_data(data_json: &str) -> Result<ProfileFormData, McnpError> {
    serde_json::from_str(data_json).map_err(invalid_input)
}

fn no_wizard() -> McnpError {
    invalid_input("profile form not mounted")
}

#[uniffi::export]
impl McnpCore {
    // =========================================================================
    // VALIDATION
    // =========================================================================

    /// Validate one step of wire-encoded form data
    pub fn validate_profile_section(
        &self,
        step: ProfileFormStep,
        data_json: String,
    ) -> Result<Vec<FieldErrorInfo>, McnpError> {
        let data = parse_form_data(&data_json)?;
        Ok(to_field_errors(&forms::validate_section(&data, step.into())))
    }

    pub fn validate_profile_submission(
        &self,
        data_json: String,
    ) -> Result<Vec<FieldErrorInfo>, McnpError> {
        let data = parse_form_data(&data_json)?;
        Ok(to_field_errors(&forms::validate_submission(&data)))
    }

    // =========================================================================
    // GATE
    // =========================================================================

    /// Whether the profile form must be shown after login
    pub fn should_present_profile_form(
        &self,
        user_id: String,
        role_requires_form: bool,
    ) -> Result<bool, McnpError> {
        let services = self.services()?;
        let runtime = get_tokio_runtime()?;
        Ok(runtime.block_on(forms::should_present_form(
            services.api.as_ref(),
            &services.forms,
            &user_id,
            role_requires_form,
        )))
    }

    pub fn is_profile_form_completed(&self, user_id: String) -> Result<bool, McnpError> {
        Ok(self.services()?.forms.is_completed(&user_id))
    }

    // =========================================================================
    // WIZARD
    // =========================================================================

    /// Open the wizard for `user_id`, resuming any cached progress
    pub fn profile_form_mount(&self, user_id: String) -> Result<ProfileFormSnapshot, McnpError> {
        let services = self.services()?;
        let runtime = get_tokio_runtime()?;
        runtime.block_on(async {
            let wizard =
                ProfileFormWizard::mount(user_id, Arc::clone(&services.api), services.forms.clone());
            let snap = snapshot(&wizard, None);
            *services.wizard.lock().await = Some(wizard);
            Ok::<_, McnpError>(snap)
        })
    }

    pub fn profile_form_unmount(&self) -> Result<(), McnpError> {
        let services = self.services()?;
        get_tokio_runtime()?.block_on(async {
            services.wizard.lock().await.take();
        });
        Ok(())
    }

    /// Set one field from a JSON value (string, array or `"1"` for consent)
    pub fn profile_form_set_field(
        &self,
        field: String,
        value_json: String,
    ) -> Result<ProfileFormSnapshot, McnpError> {
        let field = FormField::from_name(&field)
            .ok_or_else(|| invalid_input(format!("unknown field {}", field)))?;
        let raw: serde_json::Value = serde_json::from_str(&value_json).map_err(invalid_input)?;
        let value = FieldValue::from_wire(field.kind(), &raw)
            .ok_or_else(|| invalid_input(format!("bad value for {}", field)))?;

        let services = self.services()?;
        get_tokio_runtime()?.block_on(async {
            let mut guard = services.wizard.lock().await;
            let wizard = guard.as_mut().ok_or_else(no_wizard)?;
            wizard.set_value(field, value);
            Ok::<_, McnpError>(snapshot(wizard, None))
        })
    }

    pub fn profile_form_next(&self) -> Result<ProfileFormSnapshot, McnpError> {
        let services = self.services()?;
        get_tokio_runtime()?.block_on(async {
            let mut guard = services.wizard.lock().await;
            let wizard = guard.as_mut().ok_or_else(no_wizard)?;
            if let StepOutcome::Advanced(section) = wizard.next().await {
                tracing::debug!(?section, "profile form advanced");
            }
            Ok::<_, McnpError>(snapshot(wizard, None))
        })
    }

    /// Back press. Returns None when the press is swallowed on the first step.
    pub fn profile_form_back(&self) -> Result<Option<ProfileFormSnapshot>, McnpError> {
        let services = self.services()?;
        get_tokio_runtime()?.block_on(async {
            let mut guard = services.wizard.lock().await;
            let wizard = guard.as_mut().ok_or_else(no_wizard)?;
            Ok::<_, McnpError>(match wizard.handle_back() {
                BackAction::Previous(_) => Some(snapshot(wizard, None)),
                BackAction::Swallowed => None,
            })
        })
    }

    pub fn profile_form_submit(&self) -> Result<ProfileFormSnapshot, McnpError> {
        let services = self.services()?;
        get_tokio_runtime()?.block_on(async {
            let mut guard = services.wizard.lock().await;
            let wizard = guard.as_mut().ok_or_else(no_wizard)?;
            let alert = match wizard.submit().await {
                SubmitOutcome::Failed { alert } => Some(alert),
                SubmitOutcome::NotOnFinalStep => {
                    return Err(invalid_input("submit is only allowed on the last step"))
                }
                SubmitOutcome::Completed | SubmitOutcome::Invalid => None,
            };
            Ok::<_, McnpError>(snapshot(wizard, alert))
        })
    }
}
