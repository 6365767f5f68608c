//! Client configuration.
//!
//! [`Config`] holds everything needed to build a transport: the API server
//! address, scope, timeouts and the resolved credentials. It is assembled
//! once through [`ConfigBuilder`] and read-only afterwards.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use http::Uri;
use secrecy::{ExposeSecret, SecretString};
use snafu::{OptionExt, ResultExt};

use super::{Error, LoadCertificatesSnafu, NonUtf8PathSnafu};
use crate::tls::TrustOptions;

pub mod in_cluster;
pub mod keys;

/// The only API group version the client speaks.
pub const API_VERSION: &str = "v1";

/// A complete, immutable client configuration.
#[derive(Clone, Debug)]
pub struct Config {
    master_url: Uri,
    api_version: String,
    namespace: Option<String>,
    websocket_ping_interval: Option<Duration>,
    connection_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    oauth_token: Option<SecretString>,
    oauth_token_file: Option<PathBuf>,
    ca_cert_file: Option<PathBuf>,
    client_key_file: Option<PathBuf>,
    client_cert_file: Option<PathBuf>,
    trust_store_file: Option<PathBuf>,
    trust_store_passphrase: Option<SecretString>,
}

impl Config {
    pub fn builder(master_url: Uri) -> ConfigBuilder {
        ConfigBuilder::new(master_url)
    }

    pub fn master_url(&self) -> &Uri {
        &self.master_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Always `None`: websocket keep-alive pings are disabled.
    pub fn websocket_ping_interval(&self) -> Option<Duration> {
        self.websocket_ping_interval
    }

    pub fn connection_timeout(&self) -> Option<Duration> {
        self.connection_timeout
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    pub fn oauth_token(&self) -> Option<&str> {
        self.oauth_token
            .as_ref()
            .map(|token| token.expose_secret().as_str())
    }

    pub fn oauth_token_file(&self) -> Option<&Path> {
        self.oauth_token_file.as_deref()
    }

    pub fn ca_cert_file(&self) -> Option<&Path> {
        self.ca_cert_file.as_deref()
    }

    pub fn client_key_file(&self) -> Option<&Path> {
        self.client_key_file.as_deref()
    }

    pub fn client_cert_file(&self) -> Option<&Path> {
        self.client_cert_file.as_deref()
    }

    pub fn trust_store_file(&self) -> Option<&Path> {
        self.trust_store_file.as_deref()
    }

    pub fn trust_store_passphrase(&self) -> Option<&str> {
        self.trust_store_passphrase
            .as_ref()
            .map(|pass| pass.expose_secret().as_str())
    }

    /// Translates into the transport's configuration, loading the CA
    /// certificate and trust-store into its root certificates. Client
    /// identity and token files are handed over as paths and read by the
    /// transport itself, so they must be valid UTF-8.
    pub fn to_kube_config(&self) -> Result<kube::Config, Error> {
        let mut config = kube::Config::new(self.master_url.clone());

        if let Some(namespace) = &self.namespace {
            config.default_namespace = namespace.clone();
        }
        if let Some(timeout) = self.connection_timeout {
            config.connect_timeout = Some(timeout);
        }
        if let Some(timeout) = self.request_timeout {
            config.read_timeout = Some(timeout);
        }

        config.root_cert = TrustOptions {
            ca_file: self.ca_cert_file(),
            trust_store: self.trust_store_file(),
            trust_store_pass: self.trust_store_passphrase(),
        }
        .root_certificates()
        .context(LoadCertificatesSnafu)?;

        config.auth_info.token = self.oauth_token.clone();
        config.auth_info.token_file = path_string(self.oauth_token_file())?;
        config.auth_info.client_certificate = path_string(self.client_cert_file())?;
        config.auth_info.client_key = path_string(self.client_key_file())?;

        Ok(config)
    }
}

fn path_string(path: Option<&Path>) -> Result<Option<String>, Error> {
    path.map(|path| {
        path.to_str()
            .map(ToOwned::to_owned)
            .context(NonUtf8PathSnafu { path })
    })
    .transpose()
}

/// One resolved credential field.
#[derive(Clone, Debug)]
pub enum Setting {
    OauthToken(SecretString),
    OauthTokenFile(PathBuf),
    CaCertFile(PathBuf),
    ClientKeyFile(PathBuf),
    ClientCertFile(PathBuf),
    TrustStoreFile(PathBuf),
    TrustStorePassphrase(SecretString),
}

#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new(master_url: Uri) -> Self {
        Self {
            config: Config {
                master_url,
                api_version: API_VERSION.to_owned(),
                namespace: None,
                websocket_ping_interval: None,
                connection_timeout: None,
                request_timeout: None,
                oauth_token: None,
                oauth_token_file: None,
                ca_cert_file: None,
                client_key_file: None,
                client_cert_file: None,
                trust_store_file: None,
                trust_store_passphrase: None,
            },
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = Some(namespace.into());
        self
    }

    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.config.connection_timeout = Some(timeout);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    pub fn oauth_token(mut self, token: SecretString) -> Self {
        self.config.oauth_token = Some(token);
        self
    }

    pub fn oauth_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.oauth_token_file = Some(path.into());
        self
    }

    pub fn ca_cert_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ca_cert_file = Some(path.into());
        self
    }

    pub fn client_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.client_key_file = Some(path.into());
        self
    }

    pub fn client_cert_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.client_cert_file = Some(path.into());
        self
    }

    pub fn trust_store_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.trust_store_file = Some(path.into());
        self
    }

    pub fn trust_store_passphrase(mut self, passphrase: SecretString) -> Self {
        self.config.trust_store_passphrase = Some(passphrase);
        self
    }

    /// Applies a single resolved field through its setter.
    pub fn apply(self, setting: Setting) -> Self {
        match setting {
            Setting::OauthToken(token) => self.oauth_token(token),
            Setting::OauthTokenFile(path) => self.oauth_token_file(path),
            Setting::CaCertFile(path) => self.ca_cert_file(path),
            Setting::ClientKeyFile(path) => self.client_key_file(path),
            Setting::ClientCertFile(path) => self.client_cert_file(path),
            Setting::TrustStoreFile(path) => self.trust_store_file(path),
            Setting::TrustStorePassphrase(pass) => self.trust_store_passphrase(pass),
        }
    }

    pub fn build(self) -> Config {
        self.config
    }
}
