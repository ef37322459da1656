use std::{collections::HashSet, fs, path::Path, sync::Arc};

use anyhow::Context;
use serde_json::Value;
use shared::{domain::StepSlug, error::WizardError};

use crate::form::{FieldForm, FormDescriptor};

#[derive(Debug, Clone)]
pub struct StepDefinition {
    slug: StepSlug,
    form: Arc<dyn FormDescriptor>,
}

impl StepDefinition {
    pub fn new(slug: impl Into<StepSlug>, form: impl FormDescriptor + 'static) -> Self {
        Self::from_shared(slug, Arc::new(form))
    }

    pub fn from_shared(slug: impl Into<StepSlug>, form: Arc<dyn FormDescriptor>) -> Self {
        Self {
            slug: slug.into(),
            form,
        }
    }

    pub fn slug(&self) -> &StepSlug {
        &self.slug
    }

    pub fn form(&self) -> &dyn FormDescriptor {
        self.form.as_ref()
    }
}

/// Ordered, validated step list. Order drives default-step selection and navigation.
#[derive(Debug, Clone)]
pub struct StepSet {
    steps: Vec<StepDefinition>,
}

impl StepSet {
    pub fn new(steps: Vec<StepDefinition>) -> Result<Self, WizardError> {
        if steps.is_empty() {
            return Err(WizardError::Type(
                "a wizard needs at least one step".to_string(),
            ));
        }
        if let Some(position) = steps.iter().position(|step| step.slug.is_empty()) {
            return Err(WizardError::Type(format!(
                "step at position {position} has an empty slug"
            )));
        }

        let mut seen = HashSet::with_capacity(steps.len());
        if let Some(duplicate) = steps
            .iter()
            .map(|step| &step.slug)
            .find(|slug| !seen.insert(*slug))
        {
            return Err(WizardError::DuplicateSlug {
                slug: duplicate.clone(),
            });
        }

        Ok(Self { steps })
    }

    /// Builds steps from an untyped manifest: an array of
    /// `{ "slug": ..., "form": { "id"?: ..., "fields": [...] } }` objects.
    pub fn from_manifest(manifest: &Value) -> Result<Self, WizardError> {
        let Some(items) = manifest.as_array() else {
            return Err(WizardError::Type(format!(
                "steps must be an array, got {}",
                json_kind(manifest)
            )));
        };

        let mut steps = Vec::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            steps.push(step_from_manifest_item(position, item)?);
        }
        Self::new(steps)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepDefinition> {
        self.steps.iter()
    }

    pub fn first(&self) -> &StepDefinition {
        &self.steps[0]
    }

    pub fn get(&self, slug: &StepSlug) -> Option<&StepDefinition> {
        self.steps.iter().find(|step| &step.slug == slug)
    }

    pub fn slugs(&self) -> Vec<StepSlug> {
        self.steps.iter().map(|step| step.slug.clone()).collect()
    }
}

fn step_from_manifest_item(position: usize, item: &Value) -> Result<StepDefinition, WizardError> {
    let Some(object) = item.as_object() else {
        return Err(WizardError::Type(format!(
            "step at position {position} must be an object, got {}",
            json_kind(item)
        )));
    };

    let slug = object
        .get("slug")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            WizardError::Type(format!(
                "step at position {position} must have a string `slug`"
            ))
        })?;

    let form_value = object.get("form").filter(|form| form.is_object()).ok_or_else(|| {
        WizardError::Type(format!(
            "step `{slug}` must have a `form` object"
        ))
    })?;

    let mut form: FieldForm = serde_json::from_value(form_value.clone()).map_err(|error| {
        WizardError::Type(format!("step `{slug}` has an invalid form: {error}"))
    })?;
    if form.id.is_empty() {
        form.id = slug.to_string();
    }

    Ok(StepDefinition::new(slug, form))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Reads a `.json` or `.toml` step manifest and validates it.
///
/// Both formats accept either a bare list or a table with a `steps` list.
pub fn load_manifest(path: &Path) -> anyhow::Result<StepSet> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read step manifest '{}'", path.display()))?;

    let document: Value = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => {
            let table: toml::Value = toml::from_str(&raw)
                .with_context(|| format!("failed to parse TOML manifest '{}'", path.display()))?;
            serde_json::to_value(table)?
        }
        _ => serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse JSON manifest '{}'", path.display()))?,
    };

    let steps = match document {
        Value::Object(mut root) if root.contains_key("steps") => {
            root.remove("steps").unwrap_or(Value::Null)
        }
        other => other,
    };

    StepSet::from_manifest(&steps)
        .with_context(|| format!("invalid step manifest '{}'", path.display()))
}

#[cfg(test)]
#[path = "tests/step_tests.rs"]
mod tests;
