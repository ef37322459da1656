use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::StepSlug;

/// Raw or cleaned field values of a single form, keyed by field name.
pub type FieldValues = BTreeMap<String, String>;

/// Validation messages keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Validated data of every completed step, keyed by step slug.
pub type FormData = BTreeMap<StepSlug, FieldValues>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInstance {
    pub form_id: String,
    /// True when the instance carries submitted data rather than only initial values.
    pub bound: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub initial: FieldValues,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: FieldValues,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: FieldErrors,
}

impl FormInstance {
    pub fn unbound(form_id: impl Into<String>, initial: FieldValues) -> Self {
        Self {
            form_id: form_id.into(),
            bound: false,
            initial,
            data: FieldValues::new(),
            errors: FieldErrors::new(),
        }
    }

    pub fn bound(form_id: impl Into<String>, data: FieldValues, errors: FieldErrors) -> Self {
        Self {
            form_id: form_id.into(),
            bound: true,
            initial: FieldValues::new(),
            data,
            errors,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.bound && self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    pub slug: StepSlug,
    pub form_id: String,
    pub position: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderContext {
    pub current_step: StepSummary,
    pub previous_step: Option<StepSummary>,
    pub next_step: Option<StepSummary>,
    pub url_base: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_context: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum WizardResponse {
    Render {
        template: String,
        form: FormInstance,
        context: RenderContext,
    },
    Redirect {
        location: String,
    },
    Completed {
        form_data: FormData,
    },
    NoContent,
}
