pub mod form;
pub mod notification;

pub use form::{
    FieldKind, FieldValue, FormField, FormProgress, FormSection, ProfileFormData, WireFormData,
};
pub use notification::{DeepLink, NotificationCategory, NotificationData, NotificationRecord};
