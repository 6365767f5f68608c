use std::{
    fmt::{self, Formatter},
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use openssl::{pkcs12::Pkcs12, x509::X509};
use snafu::ResultExt;

use super::{
    DerExportSnafu, EmptyTrustStoreSnafu, FileOpenFailedSnafu, FileReadFailedSnafu,
    ParsePkcs12Snafu, Result, X509ParseSnafu,
};

const PEM_START_MARKER: &str = "-----BEGIN ";

/// The certificate authorities a client trusts when verifying the API server.
#[derive(Clone, Copy, Default)]
pub struct TrustOptions<'a> {
    /// PEM or DER encoded CA certificate(s).
    pub ca_file: Option<&'a Path>,
    /// PKCS#12 archive, or a PEM bundle, of trusted certificates.
    pub trust_store: Option<&'a Path>,
    pub trust_store_pass: Option<&'a str>,
}

impl TrustOptions<'_> {
    /// Loads every configured authority and returns them DER encoded, or
    /// `None` when nothing is configured and the system roots apply.
    pub fn root_certificates(&self) -> Result<Option<Vec<Vec<u8>>>> {
        if self.ca_file.is_none() && self.trust_store.is_none() {
            return Ok(None);
        }

        let mut authorities = Vec::new();
        if let Some(ca_file) = self.ca_file {
            authorities.extend(load_authorities(ca_file)?);
        }
        if let Some(trust_store) = self.trust_store {
            authorities.extend(load_trust_store(trust_store, self.trust_store_pass)?);
        }
        debug!(
            message = "Loaded certificate authorities.",
            count = authorities.len()
        );

        authorities
            .iter()
            .map(|cert| cert.to_der().context(DerExportSnafu))
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }
}

impl fmt::Debug for TrustOptions<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustOptions")
            .field("ca_file", &self.ca_file)
            .field("trust_store", &self.trust_store)
            .field("trust_store_pass", &self.trust_store_pass.map(|_| "**REDACTED**"))
            .finish()
    }
}

/// Load one or more CA certificates from a PEM or DER file.
pub fn load_authorities(filename: &Path) -> Result<Vec<X509>> {
    let (data, filename) = open_read(filename, "certificate")?;
    der_or_pem(
        data,
        |der| X509::from_der(&der).map(|x509| vec![x509]),
        |pem| parse_pem_bundle(&pem),
    )
    .with_context(|_| X509ParseSnafu { filename })
}

/// Load the trusted certificates out of a trust-store. A DER file is read as
/// a PKCS#12 archive, unlocked with `pass` (empty when absent); a PEM file is
/// read as a certificate bundle and `pass` is ignored.
pub fn load_trust_store(filename: &Path, pass: Option<&str>) -> Result<Vec<X509>> {
    let (data, filename) = open_read(filename, "trust-store")?;
    let certs = der_or_pem(
        data,
        |der| parse_pkcs12_certs(&der, pass.unwrap_or(""), &filename),
        |pem| parse_pem_bundle(&pem).with_context(|_| X509ParseSnafu { filename: &filename }),
    )?;

    if certs.is_empty() {
        return EmptyTrustStoreSnafu { filename }.fail();
    }
    Ok(certs)
}

fn parse_pkcs12_certs(der: &[u8], pass: &str, filename: &Path) -> Result<Vec<X509>> {
    let parsed = Pkcs12::from_der(der)
        .and_then(|pkcs12| pkcs12.parse2(pass))
        .with_context(|_| ParsePkcs12Snafu { filename })?;

    let mut certs: Vec<X509> = parsed.cert.into_iter().collect();
    if let Some(chain) = parsed.ca {
        certs.extend(chain);
    }
    Ok(certs)
}

fn parse_pem_bundle(pem: &str) -> std::result::Result<Vec<X509>, openssl::error::ErrorStack> {
    pem.match_indices(PEM_START_MARKER)
        .map(|(start, _)| X509::from_pem(pem[start..].as_bytes()))
        .collect()
}

/// Parse the data one way if it looks like a DER file, and the other if
/// it looks like a PEM file. For the content to be treated as PEM, it
/// must parse as valid UTF-8 and contain a PEM start marker.
fn der_or_pem<T>(data: Vec<u8>, der_fn: impl Fn(Vec<u8>) -> T, pem_fn: impl Fn(String) -> T) -> T {
    // None of these steps cause (re)allocations,
    // just parsing and type manipulation
    match String::from_utf8(data) {
        Ok(text) => match text.find(PEM_START_MARKER) {
            Some(_) => pem_fn(text),
            None => der_fn(text.into_bytes()),
        },
        Err(err) => der_fn(err.into_bytes()),
    }
}

/// Open the named file and read its entire contents into memory. If the
/// file "name" contains a PEM start marker, it is assumed to contain
/// inline data and is used directly instead of opening a file.
fn open_read(filename: &Path, note: &'static str) -> Result<(Vec<u8>, PathBuf)> {
    if let Some(filename) = filename.to_str()
        && filename.contains(PEM_START_MARKER)
    {
        return Ok((Vec::from(filename), "inline text".into()));
    }

    let mut text = Vec::<u8>::new();

    File::open(filename)
        .with_context(|_| FileOpenFailedSnafu { note, filename })?
        .read_to_end(&mut text)
        .with_context(|_| FileReadFailedSnafu { note, filename })?;

    Ok((text, filename.into()))
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::tls::{TlsError, test_certs};

    fn write_temp(data: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file
    }

    #[test]
    fn load_pem_ca() {
        let (cert, _) = test_certs::self_signed("ca");
        let file = write_temp(&test_certs::pem(&cert));

        let authorities = load_authorities(file.path()).expect("Failed to load CA");
        assert_eq!(authorities.len(), 1);
        assert_eq!(authorities[0].to_der().unwrap(), cert.to_der().unwrap());
    }

    #[test]
    fn load_der_ca() {
        let (cert, _) = test_certs::self_signed("ca");
        let file = write_temp(&cert.to_der().unwrap());

        let authorities = load_authorities(file.path()).expect("Failed to load CA");
        assert_eq!(authorities.len(), 1);
    }

    #[test]
    fn load_multi_ca() {
        let (first, _) = test_certs::self_signed("first");
        let (second, _) = test_certs::self_signed("second");
        let mut bundle = test_certs::pem(&first);
        bundle.extend(test_certs::pem(&second));
        let file = write_temp(&bundle);

        let authorities = load_authorities(file.path()).expect("Failed to load CA bundle");
        assert_eq!(authorities.len(), 2);
    }

    #[test]
    fn load_inline_ca() {
        let (cert, _) = test_certs::self_signed("inline");
        let pem = String::from_utf8(test_certs::pem(&cert)).unwrap();

        let authorities = load_authorities(Path::new(&pem)).expect("Failed to load inline CA");
        assert_eq!(authorities.len(), 1);
    }

    #[test]
    fn load_bad_certificate() {
        let file = write_temp(b"-----BEGIN CERTIFICATE-----\nnope\n-----END CERTIFICATE-----\n");
        let error = load_authorities(file.path()).unwrap_err();
        assert!(matches!(error, TlsError::X509ParseError { .. }));
    }

    #[test]
    fn load_missing_file() {
        let error = load_authorities(Path::new("/nonexistent/ca.crt")).unwrap_err();
        assert!(matches!(
            error,
            TlsError::FileOpenFailed {
                note: "certificate",
                ..
            }
        ));
    }

    #[test]
    fn load_pkcs12_trust_store() {
        let (entry, key) = test_certs::self_signed("entry");
        let (ca, _) = test_certs::self_signed("chain");
        let file = write_temp(&test_certs::pkcs12(&entry, &key, &[ca], "changeit"));

        let certs = load_trust_store(file.path(), Some("changeit")).expect("Failed to load");
        assert_eq!(certs.len(), 2);
    }

    #[test]
    fn pkcs12_trust_store_wrong_pass() {
        let (entry, key) = test_certs::self_signed("entry");
        let file = write_temp(&test_certs::pkcs12(&entry, &key, &[], "changeit"));

        let error = load_trust_store(file.path(), Some("wrong")).unwrap_err();
        assert!(matches!(error, TlsError::ParsePkcs12 { .. }));
    }

    #[test]
    fn pem_trust_store_ignores_pass() {
        let (cert, _) = test_certs::self_signed("ca");
        let file = write_temp(&test_certs::pem(&cert));

        let certs = load_trust_store(file.path(), Some("ignored")).expect("Failed to load");
        assert_eq!(certs.len(), 1);
    }

    #[test]
    fn root_certificates_none_when_unset() {
        let roots = TrustOptions::default().root_certificates().unwrap();
        assert!(roots.is_none());
    }

    #[test]
    fn root_certificates_combine_ca_and_trust_store() {
        let (ca, _) = test_certs::self_signed("ca");
        let ca_file = write_temp(&test_certs::pem(&ca));
        let (entry, key) = test_certs::self_signed("entry");
        let store = write_temp(&test_certs::pkcs12(&entry, &key, &[], ""));

        let roots = TrustOptions {
            ca_file: Some(ca_file.path()),
            trust_store: Some(store.path()),
            trust_store_pass: None,
        }
        .root_certificates()
        .unwrap()
        .unwrap();

        assert_eq!(
            roots,
            vec![ca.to_der().unwrap(), entry.to_der().unwrap()]
        );
    }
}
