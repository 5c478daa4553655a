use super::*;

#[test]
fn test_missing_target_message() {
    let error = CoreError::MissingTarget;

    assert!(error.to_string().contains("owner/name"));
    assert!(error.to_string().contains("must be provided"));
}

#[test]
fn test_invalid_repository_names_the_value() {
    let error = CoreError::InvalidRepository {
        value: "just-a-name".to_string(),
    };

    assert!(error.to_string().contains("just-a-name"));
}

#[test]
fn test_client_errors_pass_through_unchanged() {
    let inner = github_app_client::Error::MissingInstallationId;
    let expected = inner.to_string();

    let error = CoreError::from(inner);

    assert_eq!(error.to_string(), expected);
}

#[test]
fn test_error_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CoreError>();
}
