//! Configuration keys credentials are looked up under.
//!
//! Every credential key is `<prefix>.<suffix>`, which lets several
//! independently configured credential sets share one resolution routine.

pub const OAUTH_TOKEN_FILE: &str = "oauthTokenFile";
pub const OAUTH_TOKEN_VALUE: &str = "oauthTokenValue";
pub const TRUST_STORE: &str = "trustStore";
pub const TRUST_STORE_PASSWORD: &str = "trustStorePassword";
pub const TRUST_STORE_PASSWORD_FILE: &str = "trustStorePasswordFile";
pub const CA_CERT_FILE: &str = "caCertFile";
pub const CLIENT_KEY_FILE: &str = "clientKeyFile";
pub const CLIENT_CERT_FILE: &str = "clientCertFile";

/// Derives full lookup keys from a caller supplied prefix.
#[derive(Clone, Copy, Debug)]
pub struct ConfigKeys<'a> {
    prefix: &'a str,
}

impl<'a> ConfigKeys<'a> {
    pub const fn new(prefix: &'a str) -> Self {
        Self { prefix }
    }

    pub const fn prefix(&self) -> &'a str {
        self.prefix
    }

    pub fn key(&self, suffix: &str) -> String {
        format!("{}.{}", self.prefix, suffix)
    }
}
