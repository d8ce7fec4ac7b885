//! Declarative form schema model, live form values, and the accept matcher.

#![forbid(unsafe_code)]

mod accept;
mod api;
mod field;
mod schema;
mod value;
mod visibility;

pub use accept::{AcceptPatterns, normalize_accept};
pub use api::{ActionApiConfig, ApiEndpointConfig, ContentTypeMode, HttpMethod, KeyValuePair};
pub use field::{
    ButtonActionType, ButtonElement, FieldOption, FieldSchema, FieldType, InfoCard, OptionsSource,
    OptionsSourceMode, RequiredFlag, ResponseMapping, SelectAuthType, SelectOptionsApiConfig,
    TokenFrom, ValidationRules,
};
pub use schema::{FormActions, FormKind, FormSchema, FormSection, FormStep};
pub use value::{FieldValue, FileAttachment, FormValues, form_values_from_json};
pub use visibility::{VisibilityMode, VisibilityOperator, VisibilityRule, VisibilitySchema};
