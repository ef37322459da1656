use std::fmt;

use serde::{Deserialize, Serialize};
use shared::protocol::{FieldErrors, FieldValues, FormInstance};

const REQUIRED_MESSAGE: &str = "This field is required.";

/// Schema behind one wizard step: how to build an instance and how to clean input.
pub trait FormDescriptor: Send + Sync + fmt::Debug {
    fn form_id(&self) -> &str;

    fn blank(&self) -> FormInstance {
        FormInstance::unbound(self.form_id(), FieldValues::new())
    }

    fn with_initial(&self, initial: &FieldValues) -> FormInstance {
        FormInstance::unbound(self.form_id(), initial.clone())
    }

    /// Returns the cleaned values, or the per-field messages when input is rejected.
    fn validate(&self, raw: &FieldValues) -> Result<FieldValues, FieldErrors>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    Email,
    Integer,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl FieldSpec {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            required: false,
            kind: FieldKind::Text,
            max_length: None,
        }
    }

    pub fn of_kind(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            kind,
            ..Self::text(name)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    fn clean(&self, raw: Option<&str>) -> Result<Option<String>, String> {
        let value = raw.map(str::trim).unwrap_or_default();

        if self.kind == FieldKind::Boolean {
            let checked = match value.to_ascii_lowercase().as_str() {
                "" | "0" | "false" | "off" | "no" => false,
                "1" | "true" | "on" | "yes" => true,
                _ => return Err("Enter a valid boolean.".to_string()),
            };
            if self.required && !checked {
                return Err(REQUIRED_MESSAGE.to_string());
            }
            return Ok(Some(checked.to_string()));
        }

        if value.is_empty() {
            return if self.required {
                Err(REQUIRED_MESSAGE.to_string())
            } else {
                Ok(None)
            };
        }

        if let Some(max) = self.max_length {
            let length = value.chars().count();
            if length > max {
                return Err(format!(
                    "Ensure this value has at most {max} characters (it has {length})."
                ));
            }
        }

        match self.kind {
            FieldKind::Text | FieldKind::Boolean => Ok(Some(value.to_string())),
            FieldKind::Email => {
                if is_plausible_email(value) {
                    Ok(Some(value.to_string()))
                } else {
                    Err("Enter a valid email address.".to_string())
                }
            }
            FieldKind::Integer => value
                .parse::<i64>()
                .map(|number| Some(number.to_string()))
                .map_err(|_| "Enter a whole number.".to_string()),
        }
    }
}

fn is_plausible_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        && !value.chars().any(char::is_whitespace)
}

/// Field-list form used by manifests and the bundled server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldForm {
    #[serde(default)]
    pub id: String,
    pub fields: Vec<FieldSpec>,
}

impl FieldForm {
    pub fn new(id: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }
}

impl FormDescriptor for FieldForm {
    fn form_id(&self) -> &str {
        &self.id
    }

    fn validate(&self, raw: &FieldValues) -> Result<FieldValues, FieldErrors> {
        let mut cleaned = FieldValues::new();
        let mut errors = FieldErrors::new();

        for field in &self.fields {
            match field.clean(raw.get(&field.name).map(String::as_str)) {
                Ok(Some(value)) => {
                    cleaned.insert(field.name.clone(), value);
                }
                Ok(None) => {}
                Err(message) => errors.entry(field.name.clone()).or_default().push(message),
            }
        }

        if errors.is_empty() {
            Ok(cleaned)
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
