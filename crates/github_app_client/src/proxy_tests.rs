use super::*;
use serial_test::serial;

const API_URL: &str = "https://api.github.com";

fn environment_with_proxy() -> ProxyEnvironment {
    ProxyEnvironment {
        http_proxy: Some("http://proxy.internal:3128".to_string()),
        https_proxy: None,
        no_proxy: None,
    }
}

#[test]
fn test_no_configuration_resolves_to_direct_connection() {
    let resolved = resolve_proxy(None, false, &ProxyEnvironment::default(), API_URL).unwrap();

    assert!(resolved.is_none());
}

#[test]
fn test_explicit_proxy_is_used() {
    let resolved = resolve_proxy(
        Some("http://explicit.example.com:8080"),
        false,
        &ProxyEnvironment::default(),
        API_URL,
    )
    .unwrap();

    assert_eq!(
        resolved.unwrap().as_str(),
        "http://explicit.example.com:8080/"
    );
}

#[test]
fn test_explicit_proxy_wins_over_no_proxy_exclusion() {
    let environment = ProxyEnvironment {
        no_proxy: Some("api.github.com".to_string()),
        ..environment_with_proxy()
    };

    let resolved = resolve_proxy(
        Some("http://explicit.example.com:8080"),
        false,
        &environment,
        API_URL,
    )
    .unwrap();

    assert_eq!(
        resolved.unwrap().as_str(),
        "http://explicit.example.com:8080/"
    );
}

#[test]
fn test_blank_explicit_proxy_is_ignored() {
    let resolved = resolve_proxy(Some("   "), false, &environment_with_proxy(), API_URL).unwrap();

    assert_eq!(resolved.unwrap().as_str(), "http://proxy.internal:3128/");
}

#[test]
fn test_ignore_environment_proxy_goes_direct() {
    let resolved = resolve_proxy(None, true, &environment_with_proxy(), API_URL).unwrap();

    assert!(resolved.is_none());
}

#[test]
fn test_environment_proxy_is_used_without_no_proxy() {
    let resolved = resolve_proxy(None, false, &environment_with_proxy(), API_URL).unwrap();

    assert_eq!(resolved.unwrap().as_str(), "http://proxy.internal:3128/");
}

#[test]
fn test_https_proxy_is_used_when_http_proxy_is_unset() {
    let environment = ProxyEnvironment {
        https_proxy: Some("http://secure-proxy.internal:3128".to_string()),
        ..Default::default()
    };

    let resolved = resolve_proxy(None, false, &environment, API_URL).unwrap();

    assert_eq!(
        resolved.unwrap().as_str(),
        "http://secure-proxy.internal:3128/"
    );
}

#[test]
fn test_no_proxy_excludes_the_target_host() {
    let environment = ProxyEnvironment {
        no_proxy: Some("localhost, api.github.com".to_string()),
        ..environment_with_proxy()
    };

    let resolved = resolve_proxy(None, false, &environment, API_URL).unwrap();

    assert!(resolved.is_none());
}

#[test]
fn test_no_proxy_with_other_hosts_keeps_the_proxy() {
    let environment = ProxyEnvironment {
        no_proxy: Some("ghe.example.com".to_string()),
        ..environment_with_proxy()
    };

    let resolved = resolve_proxy(None, false, &environment, API_URL).unwrap();

    assert_eq!(resolved.unwrap().as_str(), "http://proxy.internal:3128/");
}

#[test]
fn test_no_proxy_matches_host_with_port() {
    let environment = ProxyEnvironment {
        no_proxy: Some("ghe.example.com:8443".to_string()),
        ..environment_with_proxy()
    };

    let resolved = resolve_proxy(None, false, &environment, "https://ghe.example.com:8443/api/v3")
        .unwrap();

    assert!(resolved.is_none());
}

#[test]
fn test_unparsable_base_url_is_an_error() {
    let environment = ProxyEnvironment {
        no_proxy: Some("api.github.com".to_string()),
        ..environment_with_proxy()
    };

    let result = resolve_proxy(None, false, &environment, "not a url");

    assert!(matches!(result, Err(Error::InvalidUrl { .. })));
}

#[test]
fn test_unparsable_explicit_proxy_is_an_error() {
    let result = resolve_proxy(
        Some("not a proxy uri"),
        false,
        &ProxyEnvironment::default(),
        API_URL,
    );

    assert!(matches!(result, Err(Error::InvalidUrl { .. })));
}

#[test]
#[serial]
fn test_from_env_prefers_lowercase_variables() {
    std::env::set_var("http_proxy", "http://lower.internal:3128");
    std::env::set_var("HTTP_PROXY", "http://upper.internal:3128");

    let environment = ProxyEnvironment::from_env();

    assert_eq!(
        environment.http_proxy.as_deref(),
        Some("http://lower.internal:3128")
    );

    std::env::remove_var("http_proxy");
    std::env::remove_var("HTTP_PROXY");
}

#[test]
#[serial]
fn test_from_env_falls_back_to_uppercase_variables() {
    std::env::remove_var("no_proxy");
    std::env::set_var("NO_PROXY", "api.github.com");

    let environment = ProxyEnvironment::from_env();

    assert_eq!(environment.no_proxy.as_deref(), Some("api.github.com"));

    std::env::remove_var("NO_PROXY");
}

#[test]
#[serial]
fn test_from_env_with_nothing_set_is_empty() {
    for name in [
        "http_proxy",
        "HTTP_PROXY",
        "https_proxy",
        "HTTPS_PROXY",
        "no_proxy",
        "NO_PROXY",
    ] {
        std::env::remove_var(name);
    }

    let environment = ProxyEnvironment::from_env();

    assert!(environment.http_proxy.is_none());
    assert!(environment.https_proxy.is_none());
    assert!(environment.no_proxy.is_none());
}
