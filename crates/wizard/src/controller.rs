use std::{collections::BTreeMap, sync::Arc};

use shared::{
    domain::{IsolationId, RequestMethod, SessionId, StepSlug},
    error::WizardError,
    protocol::{FormInstance, RenderContext, StepSummary, WizardResponse},
};
use storage::SessionStore;
use tracing::{debug, info, warn};

use crate::{
    hooks::WizardHooks,
    request::WizardRequest,
    state::WizardSessionState,
    step::{StepDefinition, StepSet},
    url::{url_base, with_trailing_separator},
};

/// Built-in request handlers a method can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepHandler {
    ShowForm,
    ProcessSubmission,
}

/// Stateless dispatcher shared by every request of every session.
///
/// All per-session progress lives in the [`SessionStore`] under
/// [`isolation_id`](Self::isolation_id); each call reads it, updates it and writes
/// it back before returning.
pub struct WizardController {
    isolation_id: IsolationId,
    base_steps: StepSet,
    dispatch: BTreeMap<RequestMethod, StepHandler>,
    hooks: Arc<dyn WizardHooks>,
}

impl WizardController {
    pub fn new(
        steps: Vec<StepDefinition>,
        hooks: Arc<dyn WizardHooks>,
    ) -> Result<Self, WizardError> {
        Ok(Self::from_step_set(StepSet::new(steps)?, hooks))
    }

    pub fn from_step_set(base_steps: StepSet, hooks: Arc<dyn WizardHooks>) -> Self {
        let dispatch = BTreeMap::from([
            (RequestMethod::Get, StepHandler::ShowForm),
            (RequestMethod::Post, StepHandler::ProcessSubmission),
        ]);

        Self {
            isolation_id: IsolationId::generate(),
            base_steps,
            dispatch,
            hooks,
        }
    }

    /// Pins the session key, e.g. so several processes behind one store share progress.
    pub fn with_isolation_id(mut self, isolation_id: IsolationId) -> Self {
        self.isolation_id = isolation_id;
        self
    }

    pub fn with_handler(mut self, method: RequestMethod, handler: StepHandler) -> Self {
        self.dispatch.insert(method, handler);
        self
    }

    pub fn isolation_id(&self) -> &IsolationId {
        &self.isolation_id
    }

    pub fn base_steps(&self) -> &StepSet {
        &self.base_steps
    }

    pub fn wizard_name(&self) -> &'static str {
        self.hooks.wizard_name()
    }

    pub fn handler_for(&self, method: &RequestMethod) -> Option<StepHandler> {
        self.dispatch.get(method).copied()
    }

    /// Entry point for one inbound request.
    pub async fn handle(
        &self,
        store: &dyn SessionStore,
        request: &WizardRequest,
        route_slug: Option<&str>,
    ) -> Result<WizardResponse, WizardError> {
        let routed = request.clone().with_route_slug(route_slug);
        let request = &routed;
        let mut state = self
            .ensure_session_state(store, &request.session_id)
            .await?;
        let slug = self.resolve_slug(&state, route_slug);

        let Some(handler) = self.handler_for(&request.method) else {
            warn!(
                method = %request.method,
                wizard = self.wizard_name(),
                "no wizard handler registered for request method"
            );
            return Err(WizardError::not_found(format!(
                "no handler for {} requests",
                request.method
            )));
        };

        match handler {
            StepHandler::ShowForm => self.process_get(store, request, &mut state, &slug).await,
            StepHandler::ProcessSubmission => {
                self.hooks.process_post(self, store, request, &slug).await
            }
        }
    }

    /// Loads this wizard's state for the session, creating it on first use.
    ///
    /// Repeated calls never reset existing progress.
    pub async fn ensure_session_state(
        &self,
        store: &dyn SessionStore,
        session_id: &SessionId,
    ) -> Result<WizardSessionState, WizardError> {
        if let Some(state) = self.session_state(store, session_id).await? {
            return Ok(state);
        }

        let state = WizardSessionState::initial(&self.base_steps);
        self.save_state(store, session_id, &state).await?;
        debug!(
            isolation_id = %self.isolation_id,
            first_step = %state.current_step,
            "initialized wizard session state"
        );
        Ok(state)
    }

    /// Reads the stored state without creating it. Unreadable or stale entries count as absent.
    pub async fn session_state(
        &self,
        store: &dyn SessionStore,
        session_id: &SessionId,
    ) -> Result<Option<WizardSessionState>, WizardError> {
        let Some(raw) = store.get(session_id, self.isolation_id.as_str()).await? else {
            return Ok(None);
        };

        match serde_json::from_value::<WizardSessionState>(raw) {
            Ok(state) if state.is_compatible_with(&self.base_steps) => Ok(Some(state)),
            Ok(_) => {
                warn!(
                    isolation_id = %self.isolation_id,
                    "stored wizard state does not match the configured steps; starting over"
                );
                Ok(None)
            }
            Err(error) => {
                warn!(
                    isolation_id = %self.isolation_id,
                    %error,
                    "stored wizard state is unreadable; starting over"
                );
                Ok(None)
            }
        }
    }

    pub async fn save_state(
        &self,
        store: &dyn SessionStore,
        session_id: &SessionId,
        state: &WizardSessionState,
    ) -> Result<(), WizardError> {
        let value = serde_json::to_value(state).map_err(anyhow::Error::from)?;
        store
            .set(session_id, self.isolation_id.as_str(), value)
            .await?;
        Ok(())
    }

    /// Drops this wizard's entry for the session so the next request starts fresh.
    pub async fn clear_session_state(
        &self,
        store: &dyn SessionStore,
        session_id: &SessionId,
    ) -> Result<(), WizardError> {
        store.remove(session_id, self.isolation_id.as_str()).await?;
        Ok(())
    }

    /// The explicit slug when one is given, else the first step of this session's list.
    pub fn resolve_slug(&self, state: &WizardSessionState, supplied: Option<&str>) -> StepSlug {
        match supplied.filter(|slug| !slug.is_empty()) {
            Some(slug) => StepSlug::from(slug),
            None => state
                .first_slug()
                .cloned()
                .unwrap_or_else(|| self.base_steps.first().slug().clone()),
        }
    }

    pub fn get_steps(&self, state: &WizardSessionState) -> Vec<&StepDefinition> {
        state
            .steps
            .iter()
            .filter_map(|slug| self.base_steps.get(slug))
            .collect()
    }

    pub fn get_step(&self, state: &WizardSessionState, slug: &StepSlug) -> Option<&StepDefinition> {
        self.get_steps(state)
            .into_iter()
            .find(|step| step.slug() == slug)
    }

    pub fn next_step(&self, state: &WizardSessionState, slug: &StepSlug) -> Option<&StepDefinition> {
        let position = state.position(slug)?;
        state
            .steps
            .get(position + 1)
            .and_then(|next| self.base_steps.get(next))
    }

    pub fn previous_step(
        &self,
        state: &WizardSessionState,
        slug: &StepSlug,
    ) -> Option<&StepDefinition> {
        let position = state.position(slug)?.checked_sub(1)?;
        state
            .steps
            .get(position)
            .and_then(|previous| self.base_steps.get(previous))
    }

    /// Makes `slug` the active step of the session and persists the change.
    pub async fn set_current_step(
        &self,
        store: &dyn SessionStore,
        session_id: &SessionId,
        state: &mut WizardSessionState,
        slug: &StepSlug,
    ) -> Result<&StepDefinition, WizardError> {
        let step = self
            .get_step(state, slug)
            .ok_or_else(|| WizardError::not_found(format!("unknown step `{slug}`")))?;
        state.current_step = step.slug().clone();
        self.save_state(store, session_id, state).await?;
        Ok(step)
    }

    /// Validate, store, then advance or finish.
    ///
    /// Invalid input re-renders the step with its errors. Valid input is kept under
    /// the step's slug; the response is a redirect to the next step, to the first
    /// step still missing data, or the result of the `done` hook once every step
    /// has validated data. Redirects are built relative to `request.route_slug`,
    /// which [`handle`](Self::handle) fills in from the route.
    pub async fn accept_submission(
        &self,
        store: &dyn SessionStore,
        request: &WizardRequest,
        slug: &StepSlug,
    ) -> Result<WizardResponse, WizardError> {
        let mut state = self
            .ensure_session_state(store, &request.session_id)
            .await?;
        let step = self
            .get_step(&state, slug)
            .ok_or_else(|| WizardError::not_found(format!("unknown step `{slug}`")))?;

        let cleaned = match step.form().validate(&request.form) {
            Ok(cleaned) => cleaned,
            Err(errors) => {
                debug!(step = %slug, fields = errors.len(), "wizard step rejected submission");
                let form = FormInstance::bound(step.form().form_id(), request.form.clone(), errors);
                return self.show_form(store, request, &mut state, slug, form).await;
            }
        };
        state.form_data.insert(slug.clone(), cleaned);

        let target = match self.next_step(&state, slug) {
            Some(next) => Some(next.slug().clone()),
            None => state.first_incomplete().cloned(),
        };

        if let Some(target) = target {
            state.current_step = target.clone();
            self.save_state(store, &request.session_id, &state).await?;
            return Ok(WizardResponse::Redirect {
                location: self.sibling_url(request, &target),
            });
        }

        self.save_state(store, &request.session_id, &state).await?;
        info!(
            wizard = self.wizard_name(),
            steps = state.form_data.len(),
            "wizard completed"
        );
        self.hooks
            .done(self, store, request, state.form_data)
            .await
    }

    async fn process_get(
        &self,
        store: &dyn SessionStore,
        request: &WizardRequest,
        state: &mut WizardSessionState,
        slug: &StepSlug,
    ) -> Result<WizardResponse, WizardError> {
        let step = self
            .get_step(state, slug)
            .ok_or_else(|| WizardError::not_found(format!("unknown step `{slug}`")))?;

        let form = match state.cleaned_data(slug) {
            Some(saved) => step.form().with_initial(saved),
            None => step.form().blank(),
        };

        self.show_form(store, request, state, slug, form).await
    }

    async fn show_form(
        &self,
        store: &dyn SessionStore,
        request: &WizardRequest,
        state: &mut WizardSessionState,
        slug: &StepSlug,
        form: FormInstance,
    ) -> Result<WizardResponse, WizardError> {
        let extra_context = self.hooks.process_show_form(request, slug, &form);
        let step = self
            .set_current_step(store, &request.session_id, state, slug)
            .await?;

        let context = RenderContext {
            current_step: self.summary(state, step),
            previous_step: None,
            next_step: None,
            url_base: self.step_url_base(request),
            extra_context,
        };

        self.hooks.render_form(request, slug, form, context).await
    }

    fn summary(&self, state: &WizardSessionState, step: &StepDefinition) -> StepSummary {
        StepSummary {
            slug: step.slug().clone(),
            form_id: step.form().form_id().to_string(),
            position: state.position(step.slug()).unwrap_or_default(),
            total: state.steps.len(),
        }
    }

    fn step_url_base(&self, request: &WizardRequest) -> String {
        match &request.route_slug {
            Some(route_slug) => url_base(&request.path, route_slug.as_str()),
            None => with_trailing_separator(&request.path),
        }
    }

    fn sibling_url(&self, request: &WizardRequest, target: &StepSlug) -> String {
        let base = self.step_url_base(request);
        if request.path.ends_with('/') {
            format!("{base}{target}/")
        } else {
            format!("{base}{target}")
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
