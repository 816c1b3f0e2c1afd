//! Profile form validation
//!
//! Errors are returned as a field -> error map, never raised. Messages are
//! Spanish because they are rendered inline by the native forms.

use std::collections::BTreeMap;

use crate::constants::MIN_PASSWORD_LENGTH;
use crate::models::{FieldKind, FormField, FormSection, ProfileFormData};

/// Validation errors for a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Text or select field left empty
    Required,
    /// Multi-select with no option chosen
    EmptySelection,
    /// Consent checkbox not accepted
    ConsentRequired,
    /// New password shorter than the minimum
    PasswordTooShort { min: usize },
    /// Confirmation differs from the new password
    PasswordMismatch,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Required => write!(f, "Este campo es obligatorio"),
            ValidationError::EmptySelection => write!(f, "Selecciona al menos una opción"),
            ValidationError::ConsentRequired => write!(f, "Debes aceptar para continuar"),
            ValidationError::PasswordTooShort { min } => {
                write!(f, "La contraseña debe tener al menos {} caracteres", min)
            }
            ValidationError::PasswordMismatch => write!(f, "Las contraseñas no coinciden"),
        }
    }
}

/// Field -> error map; empty means valid
pub type FormErrors = BTreeMap<FormField, ValidationError>;

/// Check a single required field against its kind's rule
pub fn validate_field(data: &ProfileFormData, field: FormField) -> Option<ValidationError> {
    match field.kind() {
        FieldKind::Text | FieldKind::Select | FieldKind::Password => {
            data.text(field).is_empty().then_some(ValidationError::Required)
        }
        FieldKind::MultiSelect => data
            .list(field)
            .is_empty()
            .then_some(ValidationError::EmptySelection),
        FieldKind::Consent => (!data.consent(field)).then_some(ValidationError::ConsentRequired),
    }
}

/// Optional password pair: when either is filled, enforce length and match
pub fn validate_passwords(data: &ProfileFormData) -> FormErrors {
    let mut errors = FormErrors::new();
    let new_password = data.text(FormField::NuevaContrasena);
    let confirmation = data.text(FormField::ConfirmarContrasena);

    if new_password.is_empty() && confirmation.is_empty() {
        return errors;
    }

    if new_password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.insert(
            FormField::NuevaContrasena,
            ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LENGTH,
            },
        );
    }
    if new_password != confirmation {
        errors.insert(FormField::ConfirmarContrasena, ValidationError::PasswordMismatch);
    }
    errors
}

/// Validate the fields of one wizard step
pub fn validate_section(data: &ProfileFormData, section: FormSection) -> FormErrors {
    let mut errors: FormErrors = section
        .required_fields()
        .filter_map(|field| validate_field(data, field).map(|e| (field, e)))
        .collect();

    if section == FormSection::Personal {
        errors.extend(validate_passwords(data));
    }
    errors
}

/// Final submission check: the last step, every globally required field and
/// both consents, in case an earlier step was cleared after passing
pub fn validate_submission(data: &ProfileFormData) -> FormErrors {
    let mut errors = validate_section(data, FormSection::Additional);

    for field in FormField::ALL.iter().copied().filter(FormField::is_required) {
        if let Some(error) = validate_field(data, field) {
            errors.entry(field).or_insert(error);
        }
    }
    for consent in [FormField::AceptoTerminos, FormField::AceptoPrivacidad] {
        if !data.consent(consent) {
            errors.insert(consent, ValidationError::ConsentRequired);
        }
    }
    errors.extend(validate_passwords(data));
    errors
}

/// Messages keyed by wire field name, for hosts that render by key
pub fn error_messages(errors: &FormErrors) -> BTreeMap<String, String> {
    errors
        .iter()
        .map(|(field, error)| (field.name().to_string(), error.to_string()))
        .collect()
}
