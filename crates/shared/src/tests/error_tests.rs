use super::*;

#[test]
fn codes_follow_error_kind() {
    assert_eq!(
        WizardError::Type("steps must be an array".into()).code(),
        ErrorCode::Type
    );
    assert_eq!(
        WizardError::DuplicateSlug {
            slug: StepSlug::from("info")
        }
        .code(),
        ErrorCode::DuplicateSlug
    );
    assert_eq!(
        WizardError::not_found("no handler for DELETE").code(),
        ErrorCode::NotFound
    );
    assert_eq!(
        WizardError::NotImplemented { wizard: "demo" }.code(),
        ErrorCode::NotImplemented
    );
    assert_eq!(
        WizardError::Store(anyhow::anyhow!("disk full")).code(),
        ErrorCode::Internal
    );
}

#[test]
fn api_error_hides_not_found_and_store_details() {
    let not_found: ApiError = WizardError::not_found("step `secret` in session abc").into();
    assert_eq!(not_found.message, "not found");

    let store: ApiError = WizardError::Store(anyhow::anyhow!("sqlite locked at /var/db")).into();
    assert_eq!(store.code, ErrorCode::Internal);
    assert!(!store.message.contains("sqlite"));
}

#[test]
fn not_implemented_names_the_wizard() {
    let error = WizardError::NotImplemented {
        wizard: "signup::SignupWizard",
    };
    assert!(error.to_string().contains("signup::SignupWizard"));
    assert!(error.to_string().contains("done()"));
}

#[test]
fn error_code_serializes_snake_case() {
    let body = serde_json::to_value(ApiError::new(ErrorCode::DuplicateSlug, "dup")).expect("json");
    assert_eq!(body["code"], "duplicate_slug");
}

#[test]
fn every_code_is_produced_by_some_error() {
    let codes = [
        ErrorCode::Type,
        ErrorCode::DuplicateSlug,
        ErrorCode::NotFound,
        ErrorCode::NotImplemented,
        ErrorCode::Internal,
    ];
    for code in codes {
        // A new code must have an error that maps to it.
        let error = match code {
            ErrorCode::Type => WizardError::Type("steps".into()),
            ErrorCode::DuplicateSlug => WizardError::DuplicateSlug {
                slug: StepSlug::from("info"),
            },
            ErrorCode::NotFound => WizardError::not_found("step"),
            ErrorCode::NotImplemented => WizardError::NotImplemented { wizard: "demo" },
            ErrorCode::Internal => WizardError::Store(anyhow::anyhow!("store")),
        };
        assert_eq!(error.code(), code);
    }
}
