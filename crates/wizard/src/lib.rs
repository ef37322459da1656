mod controller;
pub mod form;
mod hooks;
mod request;
mod state;
pub mod step;
mod url;

pub use controller::{StepHandler, WizardController};
pub use form::{FieldForm, FieldKind, FieldSpec, FormDescriptor};
pub use hooks::WizardHooks;
pub use request::WizardRequest;
pub use state::WizardSessionState;
pub use step::{load_manifest, StepDefinition, StepSet};
pub use url::url_base;
