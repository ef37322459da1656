use shared::{
    domain::{RequestMethod, SessionId, StepSlug},
    protocol::FieldValues,
};

/// What the wizard needs to know about one inbound request.
#[derive(Debug, Clone)]
pub struct WizardRequest {
    pub method: RequestMethod,
    pub path: String,
    pub session_id: SessionId,
    pub form: FieldValues,
    /// Slug segment the router matched, `None` for the wizard's default route.
    pub route_slug: Option<StepSlug>,
}

impl WizardRequest {
    pub fn new(method: RequestMethod, path: impl Into<String>, session_id: SessionId) -> Self {
        Self {
            method,
            path: path.into(),
            session_id,
            form: FieldValues::new(),
            route_slug: None,
        }
    }

    pub fn get(path: impl Into<String>, session_id: SessionId) -> Self {
        Self::new(RequestMethod::Get, path, session_id)
    }

    pub fn post(path: impl Into<String>, session_id: SessionId, form: FieldValues) -> Self {
        Self::new(RequestMethod::Post, path, session_id).with_form(form)
    }

    pub fn with_form(mut self, form: FieldValues) -> Self {
        self.form = form;
        self
    }

    /// Empty slugs count as the default route.
    pub fn with_route_slug(mut self, slug: Option<&str>) -> Self {
        self.route_slug = slug.filter(|slug| !slug.is_empty()).map(StepSlug::from);
        self
    }
}
