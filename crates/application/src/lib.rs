//! The Formwright engine: validator sets, the reactive form model, template
//! resolution, visibility evaluation, declarative API execution, and option
//! loading.

#![forbid(unsafe_code)]

mod config;
mod execution;
mod form_model;
mod options;
mod ports;
pub mod resolver;
mod schema_client;
mod session;
mod validators;
mod visibility;

pub use config::FormEngineConfig;
pub use execution::{ApiExecutionEngine, BearerAuth, ExecutionContext, resolve_url};
pub use form_model::{FormControl, FormModel, build_form_model};
pub use options::{OptionsCacheKey, SelectOptionsLoader, map_options};
pub use ports::{
    ApiResponse, HttpTransport, MultipartPart, RequestBody, RequestPlan, TokenStore,
};
pub use schema_client::{FormSchemaClient, parse_schema_body};
pub use session::{FormSession, SubmitOutcome};
pub use validators::{RequiredKind, ValidationIssue, ValidatorRule, build_validators};
pub use visibility::{field_visible, recompute_visibility};
