//! Multi-step profile completion form: validation, wizard and the post-login
//! gate that decides whether to show it.

pub mod gate;
pub mod validation;
pub mod wizard;

pub use gate::should_present_form;
pub use validation::{
    error_messages, validate_field, validate_passwords, validate_section, validate_submission,
    FormErrors, ValidationError,
};
pub use wizard::{BackAction, ProfileFormWizard, StepOutcome, SubmitOutcome};
