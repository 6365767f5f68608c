use std::{collections::HashMap, path::Path};

use k8s_client_factory::{
    ClientRequest, ClientType, Error, Properties, create_client, create_client_with,
    kubernetes::client::Fallbacks,
};
use k8s_openapi::api::core::v1::Pod;
use kube::Api;

const PREFIX: &str = "spark.kubernetes.auth";
const MASTER: &str = "https://host:6443";

fn properties(toml: &str) -> Properties {
    Properties::from_toml_str(toml).expect("valid properties")
}

#[test]
fn token_value_with_namespace() {
    let source = properties(
        r#"
        [spark.kubernetes.auth]
        oauthTokenValue = "tok123"
        "#,
    );

    let handle = create_client(MASTER, Some("ns1"), PREFIX, &source, None, None).unwrap();
    let config = handle.config();

    assert_eq!(config.oauth_token(), Some("tok123"));
    assert_eq!(config.namespace(), Some("ns1"));
    assert_eq!(config.api_version(), "v1");
    assert_eq!(config.websocket_ping_interval(), None);
    assert_eq!(config.ca_cert_file(), None);
    assert_eq!(config.client_cert_file(), None);
    assert_eq!(config.client_key_file(), None);
}

#[test]
fn nothing_configured_builds_an_unauthenticated_client() {
    let source = Properties::new();

    let handle = create_client(MASTER, Some("ns1"), PREFIX, &source, None, None).unwrap();
    let config = handle.config();

    assert_eq!(config.oauth_token(), None);
    assert_eq!(config.oauth_token_file(), None);
    assert_eq!(config.ca_cert_file(), None);
    assert_eq!(config.client_cert_file(), None);
    assert_eq!(config.client_key_file(), None);
    assert_eq!(config.trust_store_file(), None);
    assert_eq!(config.trust_store_passphrase(), None);
    assert_eq!(config.connection_timeout(), None);
    assert_eq!(config.request_timeout(), None);
    assert_eq!(config.master_url().host(), Some("host"));

    let _pods: Api<Pod> = Api::namespaced(handle.client(), "ns1");
    assert_eq!(handle.client().default_namespace(), "ns1");
}

#[test]
fn unscoped_without_namespace() {
    let source = Properties::new();
    let handle = create_client(MASTER, None, PREFIX, &source, None, None).unwrap();
    assert_eq!(handle.namespace(), None);
}

#[test]
fn fallback_token_file_used_when_unconfigured() {
    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token");
    std::fs::write(&token_file, "mounted-token").unwrap();

    let source = Properties::new();
    let handle =
        create_client(MASTER, None, PREFIX, &source, Some(token_file.as_path()), None).unwrap();

    assert_eq!(handle.config().oauth_token_file(), Some(token_file.as_path()));
    assert_eq!(handle.config().oauth_token(), None);
}

#[test]
fn configured_token_file_wins_over_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let configured = dir.path().join("configured");
    std::fs::write(&configured, "configured-token").unwrap();

    let mut source = Properties::new();
    source.set(
        "spark.kubernetes.auth.oauthTokenFile",
        configured.to_str().unwrap(),
    );

    let handle = create_client(
        MASTER,
        None,
        PREFIX,
        &source,
        Some(Path::new("/fallback/token")),
        None,
    )
    .unwrap();
    assert_eq!(handle.config().oauth_token_file(), Some(configured.as_path()));
}

#[test]
fn empty_token_file_suppresses_fallback() {
    let mut source = Properties::new();
    source.set("spark.kubernetes.auth.oauthTokenFile", "");

    let config = ClientRequest::new(MASTER, PREFIX, &source)
        .fallbacks(Fallbacks {
            token_file: Some("/fallback/token".into()),
            ca_cert_file: None,
        })
        .resolve_config()
        .unwrap();

    assert_eq!(config.oauth_token_file(), Some(Path::new("")));
}

#[test]
fn token_file_and_value_conflict() {
    let source = properties(
        r#"
        [spark.kubernetes.auth]
        oauthTokenFile = "/token"
        oauthTokenValue = "tok"
        "#,
    );

    let error = create_client(MASTER, None, PREFIX, &source, None, None).unwrap_err();
    assert!(matches!(error, Error::ConflictingSettings { .. }));
    let message = error.to_string();
    assert!(message.contains("spark.kubernetes.auth.oauthTokenFile"));
    assert!(message.contains("spark.kubernetes.auth.oauthTokenValue"));
}

#[test]
fn trust_store_password_and_file_conflict() {
    let source = properties(
        r#"
        [spark.kubernetes.auth]
        trustStorePassword = "changeit"
        trustStorePasswordFile = "/password"
        "#,
    );

    let error = create_client(MASTER, None, PREFIX, &source, None, None).unwrap_err();
    assert!(matches!(error, Error::ConflictingSettings { .. }));
}

#[test]
fn passphrase_taken_from_password_file() {
    let dir = tempfile::tempdir().unwrap();
    let password_file = dir.path().join("password");
    std::fs::write(&password_file, "pa55 word").unwrap();

    let source: HashMap<String, String> = [(
        "spark.kubernetes.auth.trustStorePasswordFile".to_owned(),
        password_file.to_str().unwrap().to_owned(),
    )]
    .into_iter()
    .collect();

    let config = ClientRequest::new(MASTER, PREFIX, &source)
        .resolve_config()
        .unwrap();
    assert_eq!(config.trust_store_passphrase(), Some("pa55 word"));
}

#[test]
fn missing_password_file_is_an_io_error() {
    let mut source = Properties::new();
    source.set(
        "spark.kubernetes.auth.trustStorePasswordFile",
        "/nonexistent/password",
    );

    let error = create_client(MASTER, None, PREFIX, &source, None, None).unwrap_err();
    assert!(matches!(error, Error::ReadPasswordFile { .. }));
}

#[test]
fn executor_client_from_k8s_master() {
    let source = properties(
        r#"
        [spark.kubernetes.executor]
        connectionTimeout = 1500
        "#,
    );

    let request = ClientRequest::new("k8s://host:6443", PREFIX, &source)
        .namespace(Some("jobs"))
        .client_type(ClientType::Executor);
    let handle = create_client_with(request).unwrap();

    assert_eq!(handle.dispatcher().name(), "executor");
    assert_eq!(
        handle.config().connection_timeout(),
        Some(std::time::Duration::from_millis(1500))
    );
    assert_eq!(handle.config().master_url().scheme_str(), Some("https"));
}
