use std::path::PathBuf;

use openssl::error::ErrorStack;
use snafu::Snafu;

mod settings;

pub use settings::{TrustOptions, load_authorities, load_trust_store};

pub type Result<T> = std::result::Result<T, TlsError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TlsError {
    #[snafu(display("Could not open {} file {:?}: {}", note, filename, source))]
    FileOpenFailed {
        note: &'static str,
        filename: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Could not read {} file {:?}: {}", note, filename, source))]
    FileReadFailed {
        note: &'static str,
        filename: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Could not parse X509 certificate in {:?}: {}", filename, source))]
    X509ParseError {
        filename: PathBuf,
        source: ErrorStack,
    },
    #[snafu(display("Could not parse PKCS#12 trust-store {:?}: {}", filename, source))]
    ParsePkcs12 {
        filename: PathBuf,
        source: ErrorStack,
    },
    #[snafu(display("Trust-store {:?} contains no certificates", filename))]
    EmptyTrustStore { filename: PathBuf },
    #[snafu(display("Could not export certificate to DER: {}", source))]
    DerExportError { source: ErrorStack },
}
