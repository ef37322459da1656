use async_trait::async_trait;
use serde_json::{json, Value};
use shared::{
    domain::StepSlug,
    error::WizardError,
    protocol::{FormData, FormInstance, WizardResponse},
};
use storage::SessionStore;
use tracing::info;
use wizard::{
    FieldForm, FieldKind, FieldSpec, StepDefinition, WizardController, WizardHooks, WizardRequest,
};

/// Account signup flow served when no manifest is configured.
pub struct SignupWizard;

#[async_trait]
impl WizardHooks for SignupWizard {
    fn process_show_form(
        &self,
        _request: &WizardRequest,
        slug: &StepSlug,
        form: &FormInstance,
    ) -> Option<Value> {
        Some(json!({
            "title": step_title(slug.as_str()),
            "has_errors": !form.errors.is_empty(),
        }))
    }

    fn template(&self, _request: &WizardRequest, slug: &StepSlug, _form: &FormInstance) -> String {
        format!("signup/{slug}.html")
    }

    async fn process_post(
        &self,
        wizard: &WizardController,
        store: &dyn SessionStore,
        request: &WizardRequest,
        slug: &StepSlug,
    ) -> Result<WizardResponse, WizardError> {
        wizard.accept_submission(store, request, slug).await
    }

    async fn done(
        &self,
        wizard: &WizardController,
        store: &dyn SessionStore,
        request: &WizardRequest,
        form_data: FormData,
    ) -> Result<WizardResponse, WizardError> {
        wizard
            .clear_session_state(store, &request.session_id)
            .await?;
        info!(steps = form_data.len(), "signup submitted");
        Ok(WizardResponse::Completed { form_data })
    }
}

fn step_title(slug: &str) -> String {
    let mut chars = slug.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn default_steps() -> Vec<StepDefinition> {
    vec![
        StepDefinition::new(
            "info",
            FieldForm::new(
                "info",
                vec![
                    FieldSpec::text("name").required().max_length(120),
                    FieldSpec::of_kind("email", FieldKind::Email).required(),
                ],
            ),
        ),
        StepDefinition::new(
            "address",
            FieldForm::new(
                "address",
                vec![
                    FieldSpec::text("street").required().max_length(200),
                    FieldSpec::text("city").required().max_length(120),
                    FieldSpec::of_kind("zip", FieldKind::Integer).required(),
                ],
            ),
        ),
        StepDefinition::new(
            "review",
            FieldForm::new(
                "review",
                vec![
                    FieldSpec::of_kind("accept_terms", FieldKind::Boolean).required(),
                    FieldSpec::of_kind("newsletter", FieldKind::Boolean),
                ],
            ),
        ),
    ]
}
