use http::{Uri, uri::InvalidUri};
use snafu::{ResultExt, Snafu, ensure};

const K8S_SCHEME_PREFIX: &str = "k8s://";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Kubernetes master address must not be empty"))]
    Empty,
    #[snafu(display("Invalid Kubernetes master address {:?}: {}", master, source))]
    Invalid { master: String, source: InvalidUri },
    #[snafu(display("Kubernetes master address {:?} has no host", master))]
    MissingHost { master: String },
    #[snafu(display(
        "Kubernetes master address {:?} must use http or https, not {:?}",
        master,
        scheme
    ))]
    UnsupportedScheme { master: String, scheme: String },
}

/// Normalises a master address into the API server URI.
///
/// An optional `k8s://` prefix is dropped, and addresses without a scheme
/// are assumed to be `https`, so `k8s://host:6443`, `host:6443` and
/// `https://host:6443` all resolve to the same URI.
pub fn parse_master_url(master: &str) -> Result<Uri, Error> {
    let trimmed = master.trim();
    let address = trimmed.strip_prefix(K8S_SCHEME_PREFIX).unwrap_or(trimmed);
    ensure!(!address.is_empty(), EmptySnafu);

    let address = if address.contains("://") {
        address.to_owned()
    } else {
        format!("https://{address}")
    };

    let uri: Uri = address.parse().context(InvalidSnafu { master })?;
    ensure!(uri.host().is_some(), MissingHostSnafu { master });

    match uri.scheme_str() {
        Some("https") | Some("http") => Ok(uri),
        other => UnsupportedSchemeSnafu {
            master,
            scheme: other.unwrap_or_default(),
        }
        .fail(),
    }
}
