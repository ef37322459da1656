use async_trait::async_trait;
use serde_json::Value;
use shared::{
    domain::StepSlug,
    error::WizardError,
    protocol::{FormData, FormInstance, RenderContext, WizardResponse},
};
use storage::SessionStore;

use crate::{controller::WizardController, request::WizardRequest};

/// Extension slots a concrete wizard fills in.
///
/// Every slot except `done` has a usable default. `done` must be provided: it
/// receives the validated data of all steps and is responsible for clearing the
/// wizard's session state (see [`WizardController::clear_session_state`]).
#[async_trait]
pub trait WizardHooks: Send + Sync {
    /// Name reported when a required hook is missing.
    fn wizard_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Extra values made available to the renderer as `extra_context`.
    fn process_show_form(
        &self,
        _request: &WizardRequest,
        _slug: &StepSlug,
        _form: &FormInstance,
    ) -> Option<Value> {
        None
    }

    fn template(&self, _request: &WizardRequest, _slug: &StepSlug, _form: &FormInstance) -> String {
        String::new()
    }

    async fn render_form(
        &self,
        request: &WizardRequest,
        slug: &StepSlug,
        form: FormInstance,
        context: RenderContext,
    ) -> Result<WizardResponse, WizardError> {
        Ok(WizardResponse::Render {
            template: self.template(request, slug, &form),
            form,
            context,
        })
    }

    /// Submission slot. The default accepts nothing and changes nothing;
    /// [`WizardController::accept_submission`] is the usual implementation.
    async fn process_post(
        &self,
        _wizard: &WizardController,
        _store: &dyn SessionStore,
        _request: &WizardRequest,
        _slug: &StepSlug,
    ) -> Result<WizardResponse, WizardError> {
        Ok(WizardResponse::NoContent)
    }

    async fn done(
        &self,
        _wizard: &WizardController,
        _store: &dyn SessionStore,
        _request: &WizardRequest,
        _form_data: FormData,
    ) -> Result<WizardResponse, WizardError> {
        Err(WizardError::NotImplemented {
            wizard: self.wizard_name(),
        })
    }
}
