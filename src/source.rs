use std::path::Path;

use tracing::debug;

use crate::config::{CertificateSource, SecurityConfig};
use crate::error::{BrokerKitError, Result};
use crate::pem_utils::{encode_as_pem, wrap_as_certificate_pem};

/// PEM label given to inline CA material.
pub const CA_LABEL: &str = "CERTIFICATE";
/// PEM label given to inline client key material.
///
/// Only a frame; the key encoding is detected from the DER payload.
pub const KEY_LABEL: &str = "RSA PRIVATE KEY";

/// Raw PEM buffers for the trust pool and the optional client identity.
///
/// An empty buffer means the corresponding material was not configured.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CertificateMaterial {
    pub ca: Vec<u8>,
    pub cert: Vec<u8>,
    pub key: Vec<u8>,
}

impl CertificateMaterial {
    /// Obtain CA, client certificate and client key bytes from the source
    /// selected by `config.certificate_source`.
    ///
    /// Fields belonging to the other source are ignored. In file mode the CA
    /// path is always read, so an empty or unreadable `ca_file` is an error.
    pub fn resolve(config: &SecurityConfig) -> Result<Self> {
        let material = match config.certificate_source {
            CertificateSource::InlineText => Self::from_inline(config)?,
            CertificateSource::File => Self::from_files(config)?,
        };

        debug!(
            source = ?config.certificate_source,
            ca_len = material.ca.len(),
            cert_len = material.cert.len(),
            has_key = !material.key.is_empty(),
            "resolved certificate material"
        );
        Ok(material)
    }

    fn from_inline(config: &SecurityConfig) -> Result<Self> {
        let mut material = Self::default();
        if !config.ca_pem.is_empty() {
            material.ca = encode_as_pem(&config.ca_pem, CA_LABEL)?;
        }
        // cert and key travel as a pair; one without the other is not decoded
        if !config.cert_pem.is_empty() && !config.key_pem.is_empty() {
            material.cert = wrap_as_certificate_pem(&config.cert_pem);
            material.key = encode_as_pem(&config.key_pem, KEY_LABEL)?;
        }
        Ok(material)
    }

    fn from_files(config: &SecurityConfig) -> Result<Self> {
        let mut material = Self {
            ca: read_file(&config.ca_file)?,
            ..Self::default()
        };
        if !config.cert_file.as_os_str().is_empty() {
            material.cert = read_file(&config.cert_file)?;
        }
        if !config.key_file.as_os_str().is_empty() {
            material.key = read_file(&config.key_file)?;
        }
        Ok(material)
    }

    /// Returns true when both halves of a client identity are present.
    pub fn has_client_identity(&self) -> bool {
        !self.cert.is_empty() && !self.key.is_empty()
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| BrokerKitError::Io {
        path: path.display().to_string(),
        source,
    })
}
