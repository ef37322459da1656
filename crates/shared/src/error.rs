use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::StepSlug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Type,
    DuplicateSlug,
    NotFound,
    NotImplemented,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum WizardError {
    /// The step collection or one of its elements does not have the expected shape.
    #[error("invalid step definitions: {0}")]
    Type(String),
    #[error("step slugs must be unique; `{slug}` appears more than once")]
    DuplicateSlug { slug: StepSlug },
    #[error("not found: {0}")]
    NotFound(String),
    /// A hook the concrete wizard is required to provide was left at its default.
    #[error("{wizard} has not defined a done() hook, which is required")]
    NotImplemented { wizard: &'static str },
    #[error("session store failure: {0}")]
    Store(#[from] anyhow::Error),
}

impl WizardError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Type(_) => ErrorCode::Type,
            Self::DuplicateSlug { .. } => ErrorCode::DuplicateSlug,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::NotImplemented { .. } => ErrorCode::NotImplemented,
            Self::Store(_) => ErrorCode::Internal,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

impl From<WizardError> for ApiError {
    fn from(value: WizardError) -> Self {
        let message = match &value {
            // Store errors can carry backend details; keep them out of responses.
            WizardError::Store(_) => "internal error".to_string(),
            WizardError::NotFound(_) => "not found".to_string(),
            other => other.to_string(),
        };
        Self {
            code: value.code(),
            message,
        }
    }
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
