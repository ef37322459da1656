use serde::{Deserialize, Serialize};
use shared::{
    domain::StepSlug,
    protocol::{FieldValues, FormData},
};

use crate::step::StepSet;

/// Per-session progress through one wizard, stored under the controller's isolation id.
///
/// `steps` is this session's own copy of the step order. Definitions stay on the
/// controller and are looked up by slug, so only the ordering is copied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardSessionState {
    pub steps: Vec<StepSlug>,
    pub current_step: StepSlug,
    #[serde(default)]
    pub form_data: FormData,
}

impl WizardSessionState {
    pub fn initial(base: &StepSet) -> Self {
        Self {
            steps: base.slugs(),
            current_step: base.first().slug().clone(),
            form_data: FormData::new(),
        }
    }

    pub fn first_slug(&self) -> Option<&StepSlug> {
        self.steps.first()
    }

    pub fn position(&self, slug: &StepSlug) -> Option<usize> {
        self.steps.iter().position(|candidate| candidate == slug)
    }

    pub fn cleaned_data(&self, slug: &StepSlug) -> Option<&FieldValues> {
        self.form_data.get(slug)
    }

    /// First step, in session order, that has no validated data yet.
    pub fn first_incomplete(&self) -> Option<&StepSlug> {
        self.steps
            .iter()
            .find(|slug| !self.form_data.contains_key(*slug))
    }

    /// A stored state is only reusable while its step list is an ordering of the
    /// current steps, so a step added or removed since it was saved makes it stale.
    pub(crate) fn is_compatible_with(&self, base: &StepSet) -> bool {
        self.steps.len() == base.len()
            && base.iter().all(|step| self.position(step.slug()).is_some())
            && self.position(&self.current_step).is_some()
            && self.form_data.keys().all(|slug| base.get(slug).is_some())
    }
}
