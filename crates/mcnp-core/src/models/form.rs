//! Profile-completion form model.
//!
//! Field values are typed in memory ([`FieldValue`]); the JSON wire/storage
//! form keeps the backend's encoding, where an accepted consent checkbox is the
//! string `"1"` and a declined one is simply absent.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::CONSENT_ACCEPTED;

/// Wizard steps, strictly linear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormSection {
    Personal,
    Professional,
    Additional,
}

impl FormSection {
    pub const ALL: [FormSection; 3] = [Self::Personal, Self::Professional, Self::Additional];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Personal => "Información personal",
            Self::Professional => "Información profesional",
            Self::Additional => "Información adicional",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Personal => 0,
            Self::Professional => 1,
            Self::Additional => 2,
        }
    }

    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Personal => Some(Self::Professional),
            Self::Professional => Some(Self::Additional),
            Self::Additional => None,
        }
    }

    pub fn prev(&self) -> Option<Self> {
        match self {
            Self::Personal => None,
            Self::Professional => Some(Self::Personal),
            Self::Additional => Some(Self::Professional),
        }
    }

    pub fn is_first(&self) -> bool {
        self.prev().is_none()
    }

    pub fn is_last(&self) -> bool {
        self.next().is_none()
    }

    pub fn fields(&self) -> impl Iterator<Item = FormField> + '_ {
        FormField::ALL.iter().copied().filter(move |f| f.section() == *self)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = FormField> + '_ {
        self.fields().filter(FormField::is_required)
    }
}

/// How a field's value is shaped and validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Select,
    MultiSelect,
    Consent,
    Password,
}

/// Every field of the profile form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    // Personal
    Nombre,
    ApellidoPaterno,
    ApellidoMaterno,
    Telefono,
    FechaNacimiento,
    Genero,
    Estado,
    Ciudad,
    NuevaContrasena,
    ConfirmarContrasena,
    // Professional
    Institucion,
    Cargo,
    Especialidad,
    GradoAcademico,
    CedulaProfesional,
    AniosExperiencia,
    AreasInteres,
    // Additional
    ConocerMcnp,
    Alimento,
    Alergias,
    TallaPlayera,
    ContactoEmergencia,
    TelefonoEmergencia,
    AceptoTerminos,
    AceptoPrivacidad,
}

impl FormField {
    pub const ALL: [FormField; 25] = [
        Self::Nombre,
        Self::ApellidoPaterno,
        Self::ApellidoMaterno,
        Self::Telefono,
        Self::FechaNacimiento,
        Self::Genero,
        Self::Estado,
        Self::Ciudad,
        Self::NuevaContrasena,
        Self::ConfirmarContrasena,
        Self::Institucion,
        Self::Cargo,
        Self::Especialidad,
        Self::GradoAcademico,
        Self::CedulaProfesional,
        Self::AniosExperiencia,
        Self::AreasInteres,
        Self::ConocerMcnp,
        Self::Alimento,
        Self::Alergias,
        Self::TallaPlayera,
        Self::ContactoEmergencia,
        Self::TelefonoEmergencia,
        Self::AceptoTerminos,
        Self::AceptoPrivacidad,
    ];

    /// Key used by the backend and the local cache
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nombre => "nombre",
            Self::ApellidoPaterno => "apellido_paterno",
            Self::ApellidoMaterno => "apellido_materno",
            Self::Telefono => "telefono",
            Self::FechaNacimiento => "fecha_nacimiento",
            Self::Genero => "genero",
            Self::Estado => "estado",
            Self::Ciudad => "ciudad",
            Self::NuevaContrasena => "nueva_contrasena",
            Self::ConfirmarContrasena => "confirmar_contrasena",
            Self::Institucion => "institucion",
            Self::Cargo => "cargo",
            Self::Especialidad => "especialidad",
            Self::GradoAcademico => "grado_academico",
            Self::CedulaProfesional => "cedula_profesional",
            Self::AniosExperiencia => "anios_experiencia",
            Self::AreasInteres => "areas_interes",
            Self::ConocerMcnp => "conocer_mcnp",
            Self::Alimento => "alimento",
            Self::Alergias => "alergias",
            Self::TallaPlayera => "talla_playera",
            Self::ContactoEmergencia => "contacto_emergencia",
            Self::TelefonoEmergencia => "telefono_emergencia",
            Self::AceptoTerminos => "acepto_terminos",
            Self::AceptoPrivacidad => "acepto_privacidad",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }

    pub fn section(&self) -> FormSection {
        match self {
            Self::Nombre
            | Self::ApellidoPaterno
            | Self::ApellidoMaterno
            | Self::Telefono
            | Self::FechaNacimiento
            | Self::Genero
            | Self::Estado
            | Self::Ciudad
            | Self::NuevaContrasena
            | Self::ConfirmarContrasena => FormSection::Personal,
            Self::Institucion
            | Self::Cargo
            | Self::Especialidad
            | Self::GradoAcademico
            | Self::CedulaProfesional
            | Self::AniosExperiencia
            | Self::AreasInteres => FormSection::Professional,
            Self::ConocerMcnp
            | Self::Alimento
            | Self::Alergias
            | Self::TallaPlayera
            | Self::ContactoEmergencia
            | Self::TelefonoEmergencia
            | Self::AceptoTerminos
            | Self::AceptoPrivacidad => FormSection::Additional,
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Genero
            | Self::Estado
            | Self::Especialidad
            | Self::GradoAcademico
            | Self::AniosExperiencia
            | Self::Alimento
            | Self::TallaPlayera => FieldKind::Select,
            Self::AreasInteres | Self::ConocerMcnp => FieldKind::MultiSelect,
            Self::AceptoTerminos | Self::AceptoPrivacidad => FieldKind::Consent,
            Self::NuevaContrasena | Self::ConfirmarContrasena => FieldKind::Password,
            _ => FieldKind::Text,
        }
    }

    /// Globally required fields; passwords are optional but paired
    pub fn is_required(&self) -> bool {
        !matches!(
            self,
            Self::ApellidoMaterno
                | Self::NuevaContrasena
                | Self::ConfirmarContrasena
                | Self::CedulaProfesional
                | Self::AniosExperiencia
                | Self::Alergias
        )
    }
}

impl std::fmt::Display for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed value of a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Consent(bool),
}

impl FieldValue {
    fn to_wire(&self) -> Option<Value> {
        match self {
            FieldValue::Text(text) => Some(Value::String(text.clone())),
            FieldValue::List(items) => Some(Value::Array(
                items.iter().cloned().map(Value::String).collect(),
            )),
            FieldValue::Consent(true) => Some(Value::String(CONSENT_ACCEPTED.to_string())),
            FieldValue::Consent(false) => None,
        }
    }

    /// Decode one wire value for a field of `kind`
    pub fn from_wire(kind: FieldKind, value: &Value) -> Option<Self> {
        match kind {
            FieldKind::Consent => Some(FieldValue::Consent(match value {
                Value::String(s) => s == CONSENT_ACCEPTED,
                Value::Bool(b) => *b,
                Value::Number(n) => n.as_u64() == Some(1),
                _ => false,
            })),
            FieldKind::MultiSelect => match value {
                Value::Array(items) => Some(FieldValue::List(
                    items.iter().filter_map(wire_scalar_to_string).collect(),
                )),
                Value::Null => Some(FieldValue::List(Vec::new())),
                other => wire_scalar_to_string(other).map(|s| FieldValue::List(vec![s])),
            },
            FieldKind::Text | FieldKind::Select | FieldKind::Password => {
                wire_scalar_to_string(value).map(FieldValue::Text)
            }
        }
    }
}

fn wire_scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// JSON shape of the form data on the wire and in the local cache
pub type WireFormData = BTreeMap<String, Value>;

/// Sparse, typed profile form data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireFormData", into = "WireFormData")]
pub struct ProfileFormData {
    values: BTreeMap<FormField, FieldValue>,
}

impl ProfileFormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: FormField) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    /// Text content of a text/select/password field, empty when unset
    pub fn text(&self, field: FormField) -> &str {
        match self.values.get(&field) {
            Some(FieldValue::Text(text)) => text,
            _ => "",
        }
    }

    /// Selected options of a multi-select field, empty when unset
    pub fn list(&self, field: FormField) -> &[String] {
        match self.values.get(&field) {
            Some(FieldValue::List(items)) => items,
            _ => &[],
        }
    }

    pub fn consent(&self, field: FormField) -> bool {
        matches!(self.values.get(&field), Some(FieldValue::Consent(true)))
    }

    pub fn set(&mut self, field: FormField, value: FieldValue) {
        self.values.insert(field, value);
    }

    pub fn set_text(&mut self, field: FormField, text: impl Into<String>) {
        self.set(field, FieldValue::Text(text.into()));
    }

    pub fn set_list(&mut self, field: FormField, items: Vec<String>) {
        self.set(field, FieldValue::List(items));
    }

    pub fn set_consent(&mut self, field: FormField, accepted: bool) {
        self.set(field, FieldValue::Consent(accepted));
    }

    pub fn remove(&mut self, field: FormField) -> Option<FieldValue> {
        self.values.remove(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn to_wire(&self) -> WireFormData {
        self.values
            .iter()
            .filter_map(|(field, value)| value.to_wire().map(|v| (field.name().to_string(), v)))
            .collect()
    }

    /// Decode wire data, ignoring unknown keys and malformed values
    pub fn from_wire(wire: &WireFormData) -> Self {
        let mut values = BTreeMap::new();
        for (name, raw) in wire {
            let Some(field) = FormField::from_name(name) else {
                tracing::debug!(field = %name, "ignoring unknown profile form field");
                continue;
            };
            match FieldValue::from_wire(field.kind(), raw) {
                Some(value) => {
                    values.insert(field, value);
                }
                None => tracing::debug!(field = %name, "ignoring malformed profile form value"),
            }
        }
        Self { values }
    }
}

impl From<WireFormData> for ProfileFormData {
    fn from(wire: WireFormData) -> Self {
        Self::from_wire(&wire)
    }
}

impl From<ProfileFormData> for WireFormData {
    fn from(data: ProfileFormData) -> Self {
        data.to_wire()
    }
}

/// Remembered wizard position for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormProgress {
    pub current_section: FormSection,
    pub saved_at: DateTime<Utc>,
}

impl FormProgress {
    pub fn new(current_section: FormSection) -> Self {
        Self {
            current_section,
            saved_at: Utc::now(),
        }
    }
}
