//! Resolution of credential material from a prefixed configuration source.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use snafu::ResultExt;

use super::{
    ConflictingSettingsSnafu, Error, ReadPasswordFileSnafu,
    config::{
        Setting,
        in_cluster::Fallbacks,
        keys::{self, ConfigKeys},
    },
};
use crate::config::ConfigSource;

/// The credential fields resolved for one client, each present or absent
/// independently.
#[derive(Clone, Debug, Default)]
pub struct CredentialBundle {
    pub oauth_token: Option<SecretString>,
    pub oauth_token_file: Option<PathBuf>,
    pub ca_cert_file: Option<PathBuf>,
    pub client_key_file: Option<PathBuf>,
    pub client_cert_file: Option<PathBuf>,
    pub trust_store: Option<PathBuf>,
    pub trust_store_passphrase: Option<SecretString>,
}

impl CredentialBundle {
    /// The present fields, ready to be applied to a config builder.
    pub fn into_settings(self) -> impl Iterator<Item = Setting> {
        [
            self.oauth_token.map(Setting::OauthToken),
            self.oauth_token_file.map(Setting::OauthTokenFile),
            self.ca_cert_file.map(Setting::CaCertFile),
            self.client_key_file.map(Setting::ClientKeyFile),
            self.client_cert_file.map(Setting::ClientCertFile),
            self.trust_store.map(Setting::TrustStoreFile),
            self.trust_store_passphrase.map(Setting::TrustStorePassphrase),
        ]
        .into_iter()
        .flatten()
    }
}

/// A configuration value along with the key it was looked up under.
#[derive(Clone, Debug)]
pub struct Lookup<T = String> {
    pub key: String,
    pub value: Option<T>,
}

impl<T> Lookup<T> {
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        Lookup {
            key: self.key,
            value: self.value.map(f),
        }
    }
}

impl Lookup<PathBuf> {
    /// Fills in `fallback` only when the key was absent. A present key, even
    /// an empty one, keeps its value.
    pub fn or_fallback(mut self, fallback: Option<&Path>) -> Self {
        if self.value.is_none() {
            self.value = fallback.map(Path::to_path_buf);
        }
        self
    }
}

/// Resolves a [`CredentialBundle`] from `<prefix>.<suffix>` keys.
#[derive(Debug)]
pub struct CredentialResolver<'a, S: ?Sized> {
    keys: ConfigKeys<'a>,
    source: &'a S,
    fallbacks: &'a Fallbacks,
}

impl<'a, S: ConfigSource + ?Sized> CredentialResolver<'a, S> {
    pub fn new(prefix: &'a str, source: &'a S, fallbacks: &'a Fallbacks) -> Self {
        Self {
            keys: ConfigKeys::new(prefix),
            source,
            fallbacks,
        }
    }

    pub fn lookup(&self, suffix: &str) -> Lookup {
        let key = self.keys.key(suffix);
        let value = self.source.get(&key);
        Lookup { key, value }
    }

    pub fn resolve(&self) -> Result<CredentialBundle, Error> {
        let token_file = self
            .lookup(keys::OAUTH_TOKEN_FILE)
            .map(PathBuf::from)
            .or_fallback(self.fallbacks.token_file.as_deref());
        let token_value = self.lookup(keys::OAUTH_TOKEN_VALUE);
        require_exclusive(&token_file, &token_value)?;

        let trust_store = self.lookup(keys::TRUST_STORE).value.map(PathBuf::from);
        let password = self.lookup(keys::TRUST_STORE_PASSWORD);
        let password_file = self.lookup(keys::TRUST_STORE_PASSWORD_FILE);
        require_exclusive(&password, &password_file)?;
        let trust_store_passphrase = match (password.value, password_file.value) {
            (Some(password), _) => Some(password),
            (None, Some(path)) => {
                debug!(
                    message = "Reading trust-store passphrase from file.",
                    key = %password_file.key,
                    path = %path
                );
                Some(std::fs::read_to_string(&path).context(ReadPasswordFileSnafu { path })?)
            }
            (None, None) => None,
        };

        let ca_cert_file = self
            .lookup(keys::CA_CERT_FILE)
            .map(PathBuf::from)
            .or_fallback(self.fallbacks.ca_cert_file.as_deref())
            .value;

        let bundle = CredentialBundle {
            oauth_token: token_value.value.map(SecretString::new),
            oauth_token_file: token_file.value,
            ca_cert_file,
            client_key_file: self.lookup(keys::CLIENT_KEY_FILE).value.map(PathBuf::from),
            client_cert_file: self.lookup(keys::CLIENT_CERT_FILE).value.map(PathBuf::from),
            trust_store,
            trust_store_passphrase: trust_store_passphrase.map(SecretString::new),
        };
        debug!(
            message = "Resolved Kubernetes credentials.",
            prefix = self.keys.prefix(),
            oauth_token = bundle.oauth_token.is_some(),
            oauth_token_file = ?bundle.oauth_token_file,
            ca_cert_file = ?bundle.ca_cert_file,
            client_key_file = ?bundle.client_key_file,
            client_cert_file = ?bundle.client_cert_file,
            trust_store = ?bundle.trust_store,
        );
        Ok(bundle)
    }
}

/// Fails when both alternatives of a mutually exclusive pair are set.
pub fn require_exclusive<A, B>(first: &Lookup<A>, second: &Lookup<B>) -> Result<(), Error> {
    if first.is_set() && second.is_set() {
        return ConflictingSettingsSnafu {
            first: &first.key,
            second: &second.key,
        }
        .fail();
    }
    Ok(())
}
