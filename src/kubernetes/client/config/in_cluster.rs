//! Everything related to the defaults available when running in a k8s cluster.

use std::path::{Path, PathBuf};

use http::Uri;
use snafu::{ResultExt, Snafu};

/// Where the kubelet mounts the pod's service account credentials.
pub const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

const TOKEN_FILE: &str = "token";
const CA_CERT_FILE: &str = "ca.crt";
const NAMESPACE_FILE: &str = "namespace";

/// Default credential locations, used only when the corresponding key is
/// absent from the configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fallbacks {
    pub token_file: Option<PathBuf>,
    pub ca_cert_file: Option<PathBuf>,
}

impl Fallbacks {
    /// No fallbacks, suitable for out-of-cluster clients.
    pub fn none() -> Self {
        Self::default()
    }

    /// The mounted service account credentials, each only if it exists.
    pub fn in_cluster() -> Self {
        Self::from_service_account_dir(SERVICE_ACCOUNT_DIR)
    }

    pub fn from_service_account_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let existing = |name: &str| Some(dir.join(name)).filter(|path| path.is_file());
        let fallbacks = Self {
            token_file: existing(TOKEN_FILE),
            ca_cert_file: existing(CA_CERT_FILE),
        };
        debug!(message = "Resolved service account fallbacks.", ?fallbacks);
        fallbacks
    }
}

/// Reads the namespace the current pod runs in, if mounted.
pub fn namespace() -> Option<String> {
    namespace_from(SERVICE_ACCOUNT_DIR)
}

fn namespace_from(dir: impl AsRef<Path>) -> Option<String> {
    std::fs::read_to_string(dir.as_ref().join(NAMESPACE_FILE))
        .ok()
        .map(|namespace| namespace.trim().to_owned())
        .filter(|namespace| !namespace.is_empty())
}

/// Builds the API server address from the service environment variables
/// the kubelet injects into every pod.
pub fn master_address() -> Result<Uri, Error> {
    let host = std::env::var("KUBERNETES_SERVICE_HOST").context(NotInClusterSnafu {
        missing: "KUBERNETES_SERVICE_HOST",
    })?;
    let port = std::env::var("KUBERNETES_SERVICE_PORT").context(NotInClusterSnafu {
        missing: "KUBERNETES_SERVICE_PORT",
    })?;

    Uri::builder()
        .scheme("https")
        .authority(join_host_port(host.as_str(), port.as_str()).as_str())
        .path_and_query("/")
        .build()
        .context(InvalidUrlSnafu)
}

/// An error returned when building in-cluster defaults.
#[derive(Debug, Snafu)]
pub enum Error {
    /// The in-cluster configuration requested while executing not in a cluster
    /// environment.
    #[snafu(display(
        "unable to load in-cluster configuration, {} must be defined",
        missing
    ))]
    NotInCluster {
        /// The underlying error.
        source: std::env::VarError,

        /// The field that's missing.
        missing: &'static str,
    },

    /// The configuration resulted in an invalid URL.
    #[snafu(display("unable to construct a proper API server URL"))]
    InvalidUrl {
        /// The underlying error.
        source: http::Error,
    },
}

/// This function implements the exact same logic that Go's `net.JoinHostPort`
/// has, which the reference in-cluster config implementation uses:
/// https://github.com/kubernetes/client-go/blob/3d5c80942cce510064da1ab62c579e190a0230fd/rest/config.go#L484
fn join_host_port(host: &str, port: &str) -> String {
    if host.contains(':') {
        // If IPv6 address is used, use a special notation.
        return format!("[{host}]:{port}");
    }
    // Use traditional notation for domain names and IPv4 addresses.
    format!("{host}:{port}")
}
