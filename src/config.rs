use std::fmt;
use std::path::PathBuf;

use bon::Builder;
use serde::Deserialize;

use crate::error::{BrokerKitError, Result};

/// SASL mechanism shape used when credentials are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MechanismKind {
    /// SASL/PLAIN, credentials sent verbatim.
    #[default]
    Plain,
    /// SASL/SCRAM-SHA-512 challenge-response.
    ScramSha512,
}

impl MechanismKind {
    /// The IANA-registered mechanism name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MechanismKind::Plain => "PLAIN",
            MechanismKind::ScramSha512 => "SCRAM-SHA-512",
        }
    }
}

impl TryFrom<i8> for MechanismKind {
    type Error = BrokerKitError;

    /// Maps the declarative `SASL_WAY` code (1 = PLAIN, 2 = SCRAM-SHA-512).
    fn try_from(code: i8) -> Result<Self> {
        match code {
            1 => Ok(MechanismKind::Plain),
            2 => Ok(MechanismKind::ScramSha512),
            other => Err(BrokerKitError::Config(format!(
                "SASL_WAY must be 1 or 2, got {other}"
            ))),
        }
    }
}

impl fmt::Display for MechanismKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where CA, client certificate and client key bytes come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CertificateSource {
    /// Read from `ca_file`, `cert_file` and `key_file`.
    #[default]
    File,
    /// Decode from `ca_pem`, `cert_pem` and `key_pem`.
    InlineText,
}

impl TryFrom<i8> for CertificateSource {
    type Error = BrokerKitError;

    /// Maps the declarative `CA_WAY` code (1 = FILE, 2 = INLINE-TEXT).
    fn try_from(code: i8) -> Result<Self> {
        match code {
            1 => Ok(CertificateSource::File),
            2 => Ok(CertificateSource::InlineText),
            other => Err(BrokerKitError::Config(format!(
                "CA_WAY must be 1 or 2, got {other}"
            ))),
        }
    }
}

/// Connection security configuration.
///
/// Immutable input to [`crate::tls::build_tls_config`] and
/// [`crate::sasl::select_mechanism`]. Empty strings and empty paths mean
/// "not set".
///
/// # Fields
/// * `username`, `password` - SASL credentials; both must be non-empty to enable SASL.
/// * `mechanism` - SASL mechanism used when credentials are present.
/// * `certificate_source` - selects which of the two field groups below is read.
/// * `ca_file`, `cert_file`, `key_file` - filesystem paths (FILE mode).
/// * `ca_pem`, `cert_pem`, `key_pem` - base64 text (INLINE-TEXT mode).
/// * `verify_server_identity` - verify the broker certificate chain and hostname.
#[derive(Clone, Default, Builder)]
pub struct SecurityConfig {
    #[builder(into, default)]
    pub username: String,
    #[builder(into, default)]
    pub password: String,
    #[builder(default)]
    pub mechanism: MechanismKind,
    #[builder(default)]
    pub certificate_source: CertificateSource,
    #[builder(into, default)]
    pub ca_file: PathBuf,
    #[builder(into, default)]
    pub cert_file: PathBuf,
    #[builder(into, default)]
    pub key_file: PathBuf,
    #[builder(into, default)]
    pub ca_pem: String,
    #[builder(into, default)]
    pub cert_pem: String,
    #[builder(into, default)]
    pub key_pem: String,
    #[builder(default)]
    pub verify_server_identity: bool,
}

impl SecurityConfig {
    /// Returns true when both username and password are set.
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// Returns true when either CA source is set, which is what enables TLS.
    pub fn has_ca(&self) -> bool {
        !self.ca_file.as_os_str().is_empty() || !self.ca_pem.is_empty()
    }
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "<redacted>" }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("mechanism", &self.mechanism)
            .field("certificate_source", &self.certificate_source)
            .field("ca_file", &self.ca_file)
            .field("cert_file", &self.cert_file)
            .field("key_file", &self.key_file)
            .field("ca_pem_len", &self.ca_pem.len())
            .field("cert_pem_len", &self.cert_pem.len())
            .field("key_pem", &redacted(&self.key_pem))
            .field("verify_server_identity", &self.verify_server_identity)
            .finish()
    }
}

/// The security section as written in a declarative configuration file.
///
/// Key names and integer option codes follow the consumer/producer
/// configuration format; unknown keys are ignored so the section can be
/// flattened into a larger queue configuration.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SecuritySection {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "SASL_WAY")]
    pub sasl_way: i8,
    #[serde(rename = "CA_WAY")]
    pub ca_way: i8,
    #[serde(rename = "CaFile")]
    pub ca_file: String,
    #[serde(rename = "CertFile")]
    pub cert_file: String,
    #[serde(rename = "KeyFile")]
    pub key_file: String,
    #[serde(rename = "CaPEM")]
    pub ca_pem: String,
    #[serde(rename = "CertPEM")]
    pub cert_pem: String,
    #[serde(rename = "KeyPEM")]
    pub key_pem: String,
    #[serde(rename = "VerifyServer")]
    pub verify_server: bool,
}

impl Default for SecuritySection {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            sasl_way: 1,
            ca_way: 1,
            ca_file: String::new(),
            cert_file: String::new(),
            key_file: String::new(),
            ca_pem: String::new(),
            cert_pem: String::new(),
            key_pem: String::new(),
            verify_server: false,
        }
    }
}

impl fmt::Debug for SecuritySection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecuritySection")
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("sasl_way", &self.sasl_way)
            .field("ca_way", &self.ca_way)
            .field("ca_file", &self.ca_file)
            .field("cert_file", &self.cert_file)
            .field("key_file", &self.key_file)
            .field("verify_server", &self.verify_server)
            .finish_non_exhaustive()
    }
}

impl TryFrom<SecuritySection> for SecurityConfig {
    type Error = BrokerKitError;

    fn try_from(section: SecuritySection) -> Result<Self> {
        Ok(SecurityConfig {
            username: section.username,
            password: section.password,
            mechanism: MechanismKind::try_from(section.sasl_way)?,
            certificate_source: CertificateSource::try_from(section.ca_way)?,
            ca_file: PathBuf::from(section.ca_file),
            cert_file: PathBuf::from(section.cert_file),
            key_file: PathBuf::from(section.key_file),
            ca_pem: section.ca_pem,
            cert_pem: section.cert_pem,
            key_pem: section.key_pem,
            verify_server_identity: section.verify_server,
        })
    }
}
