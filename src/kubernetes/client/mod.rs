//! Building Kubernetes API clients from prefixed credential configuration.

use std::path::{Path, PathBuf};

use snafu::{ResultExt, Snafu};

use crate::{config::ConfigSource, tls::TlsError};

mod client_type;
pub mod config;
mod credentials;
mod dispatcher;
mod master_url;

pub use client_type::ClientType;
pub use config::{Config, ConfigBuilder, Setting, in_cluster::Fallbacks};
pub use credentials::{CredentialBundle, CredentialResolver, Lookup, require_exclusive};
pub use dispatcher::Dispatcher;
pub use master_url::{Error as MasterUrlError, parse_master_url};

/// An error returned when building a client.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// Two mutually exclusive settings were both present.
    #[snafu(display(
        "Only one of {:?} and {:?} may be set, but both are configured",
        first,
        second
    ))]
    ConflictingSettings { first: String, second: String },

    /// The trust-store password file could not be read.
    #[snafu(display("Could not read trust-store password file {:?}: {}", path, source))]
    ReadPasswordFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Invalid value {:?} for {:?}: {}", value, key, source))]
    InvalidTimeout {
        key: String,
        value: String,
        source: std::num::ParseIntError,
    },

    #[snafu(display("{}", source))]
    InvalidMasterUrl { source: MasterUrlError },

    #[snafu(display("Could not load TLS certificates: {}", source))]
    LoadCertificates { source: TlsError },

    /// A token or client identity path the transport must read is not
    /// valid UTF-8.
    #[snafu(display("Path {:?} is not valid UTF-8", path))]
    NonUtf8Path { path: PathBuf },

    #[snafu(display("Could not start request dispatcher: {}", source))]
    BuildDispatcher { source: std::io::Error },

    #[snafu(display("Could not build Kubernetes client: {}", source))]
    BuildClient { source: kube::Error },
}

/// Everything needed to build a client.
#[derive(Debug)]
pub struct ClientRequest<'a, S: ?Sized> {
    /// Address of the API server, optionally `k8s://` prefixed.
    pub master: &'a str,
    /// Namespace to scope the client to; unscoped when `None`.
    pub namespace: Option<&'a str>,
    /// Prefix all credential keys are looked up under.
    pub config_key_prefix: &'a str,
    pub source: &'a S,
    pub fallbacks: Fallbacks,
    pub client_type: ClientType,
}

impl<'a, S: ConfigSource + ?Sized> ClientRequest<'a, S> {
    pub fn new(master: &'a str, config_key_prefix: &'a str, source: &'a S) -> Self {
        Self {
            master,
            namespace: None,
            config_key_prefix,
            source,
            fallbacks: Fallbacks::none(),
            client_type: ClientType::default(),
        }
    }

    pub fn namespace(mut self, namespace: Option<&'a str>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn fallbacks(mut self, fallbacks: Fallbacks) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    pub fn client_type(mut self, client_type: ClientType) -> Self {
        self.client_type = client_type;
        self
    }

    /// Resolves and validates the configuration without building a
    /// transport.
    pub fn resolve_config(&self) -> Result<Config, Error> {
        let credentials =
            CredentialResolver::new(self.config_key_prefix, self.source, &self.fallbacks)
                .resolve()?;
        let master_url = parse_master_url(self.master).context(InvalidMasterUrlSnafu)?;

        let mut builder = Config::builder(master_url);
        if let Some(timeout) = self.client_type.connection_timeout(self.source)? {
            builder = builder.connection_timeout(timeout);
        }
        if let Some(timeout) = self.client_type.request_timeout(self.source)? {
            builder = builder.request_timeout(timeout);
        }
        if let Some(namespace) = self.namespace {
            builder = builder.namespace(namespace);
        }

        Ok(credentials
            .into_settings()
            .fold(builder, ConfigBuilder::apply)
            .build())
    }

    pub fn build(&self) -> Result<ClientHandle, Error> {
        let config = self.resolve_config()?;

        let dispatcher = Dispatcher::new(self.client_type.as_str()).context(BuildDispatcherSnafu)?;
        let kube_config = config.to_kube_config()?;
        // The client's request buffer is spawned onto whatever runtime is
        // current, which must be the dispatcher.
        let client = dispatcher
            .enter(|| kube::Client::try_from(kube_config))
            .context(BuildClientSnafu)?;

        info!(
            message = "Created Kubernetes client.",
            master = %config.master_url(),
            namespace = config.namespace().unwrap_or("<unscoped>"),
            client_type = %self.client_type,
        );
        Ok(ClientHandle {
            client,
            config,
            dispatcher,
        })
    }
}

/// A ready to use client, along with the configuration it was built from
/// and the dispatcher its requests run on.
pub struct ClientHandle {
    // Declared before `dispatcher` so the client is dropped first.
    client: kube::Client,
    config: Config,
    dispatcher: Dispatcher,
}

impl ClientHandle {
    pub fn client(&self) -> kube::Client {
        self.client.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn namespace(&self) -> Option<&str> {
        self.config.namespace()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl std::fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientHandle")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// Builds a driver client for `master`, resolving credentials from
/// `<config_key_prefix>.<suffix>` keys in `source`. The fallback files are
/// used only when their key is absent from `source`.
pub fn create_client<S: ConfigSource + ?Sized>(
    master: &str,
    namespace: Option<&str>,
    config_key_prefix: &str,
    source: &S,
    fallback_token_file: Option<&Path>,
    fallback_ca_cert_file: Option<&Path>,
) -> Result<ClientHandle, Error> {
    ClientRequest::new(master, config_key_prefix, source)
        .namespace(namespace)
        .fallbacks(Fallbacks {
            token_file: fallback_token_file.map(Path::to_path_buf),
            ca_cert_file: fallback_ca_cert_file.map(Path::to_path_buf),
        })
        .build()
}

/// Builds a client from a fully specified request.
pub fn create_client_with<S: ConfigSource + ?Sized>(
    request: ClientRequest<'_, S>,
) -> Result<ClientHandle, Error> {
    request.build()
}
