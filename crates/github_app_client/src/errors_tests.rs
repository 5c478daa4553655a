use super::*;
use std::error::Error as StdError;

#[test]
fn test_missing_value_message_names_the_field() {
    let error = Error::MissingValue {
        name: "privateKey".to_string(),
    };

    assert!(error.to_string().contains("privateKey"));
    assert!(error.to_string().contains("must be provided"));
    assert!(error.source().is_none());
}

#[test]
fn test_invalid_key_format_message() {
    let error = Error::InvalidKeyFormat;

    assert_eq!(
        error.to_string(),
        "Unsupported private key data format, need raw key in PEM format or Base64 encoded string"
    );
}

#[test]
fn test_not_connected_message() {
    let error = Error::NotConnected;

    assert!(error.to_string().contains("call connect()"));
}

#[test]
fn test_connect_failure_carries_upstream_message() {
    let error = Error::ConnectFailure {
        status: Some(401),
        message: "status code: 401; Bad credentials".to_string(),
    };

    assert!(error.to_string().contains("connecting as the application"));
    assert!(error.to_string().contains("401"));
    assert!(error.to_string().contains("Bad credentials"));
}

#[test]
fn test_installation_lookup_names_the_target() {
    let error = Error::InstallationLookup {
        target: "repository octo-org/octo-repo".to_string(),
        status: Some(404),
        message: "status code: 404; Not Found".to_string(),
    };

    assert!(error.to_string().contains("octo-org/octo-repo"));
    assert!(error.to_string().contains("404"));
}

#[test]
fn test_missing_installation_id_message() {
    let error = Error::MissingInstallationId;

    assert!(error.to_string().contains("installation id must be provided"));
}

#[test]
fn test_token_revocation_message() {
    let error = Error::TokenRevocation {
        status: Some(401),
        message: "status code: 401; Bad credentials".to_string(),
    };

    assert!(error.to_string().contains("Failed to revoke application token"));
}

#[test]
fn test_error_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Error>();
}
