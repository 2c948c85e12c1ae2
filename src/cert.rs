use std::fmt::Write as _;

use der::{Decode, Encode};
use rustls::pki_types::CertificateDer;
use time::OffsetDateTime;
use tracing::{info, warn};
use x509_cert::certificate::CertificateInner;

use crate::error::{BrokerKitError, Result};
use crate::pem_utils::der_to_pem;

/// PEM label of X.509 certificate blocks.
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Represents an X.509 certificate decoded from PEM or DER.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// The parsed certificate structure.
    pub inner: CertificateInner,
    der: Vec<u8>,
}

impl Certificate {
    /// Parses a DER-encoded X.509 certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertificateInner::from_der(der)?;
        Ok(Self {
            inner,
            der: der.to_vec(),
        })
    }

    /// The DER encoding this certificate was parsed from.
    pub fn to_der(&self) -> &[u8] {
        &self.der
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> String {
        der_to_pem(&self.der, CERTIFICATE_LABEL)
    }

    /// The subject distinguished name in RFC 4514 form.
    pub fn subject(&self) -> String {
        self.inner.tbs_certificate.subject.to_string()
    }

    /// DER encoding of the SubjectPublicKeyInfo.
    pub fn public_key_info_der(&self) -> Result<Vec<u8>> {
        Ok(self.inner.tbs_certificate.subject_public_key_info.to_der()?)
    }

    /// Extracts the fields shown to operators.
    pub fn summary(&self) -> Result<CertificateSummary> {
        let tbs = &self.inner.tbs_certificate;
        Ok(CertificateSummary {
            subject: tbs.subject.to_string(),
            issuer: tbs.issuer.to_string(),
            serial: hex_serial(tbs.serial_number.as_bytes()),
            not_before: to_offset_date_time(&tbs.validity.not_before)?,
            not_after: to_offset_date_time(&tbs.validity.not_after)?,
        })
    }

    /// Converts into the form rustls consumes.
    pub fn into_rustls(self) -> CertificateDer<'static> {
        CertificateDer::from(self.der)
    }
}

/// Operator-facing description of a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSummary {
    pub subject: String,
    pub issuer: String,
    /// Colon-separated uppercase hex.
    pub serial: String,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl CertificateSummary {
    /// Returns true if `at` falls inside the validity window.
    pub fn is_valid_at(&self, at: OffsetDateTime) -> bool {
        self.not_before <= at && at <= self.not_after
    }
}

fn to_offset_date_time(t: &x509_cert::time::Time) -> Result<OffsetDateTime> {
    let secs = i64::try_from(t.to_unix_duration().as_secs())
        .map_err(|e| BrokerKitError::Certificate(e.to_string()))?;
    OffsetDateTime::from_unix_timestamp(secs)
        .map_err(|e| BrokerKitError::Certificate(e.to_string()))
}

fn hex_serial(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(':');
        }
        let _ = write!(out, "{b:02X}");
    }
    out
}

/// Returns the DER payloads of every PEM block labelled `CERTIFICATE`, in order.
///
/// Blocks with other labels are skipped. Nothing is parsed as X.509 here.
pub fn certificate_blocks(pem_bytes: &[u8]) -> Result<Vec<CertificateDer<'static>>> {
    let blocks = pem::parse_many(pem_bytes)?;
    Ok(blocks
        .into_iter()
        .filter(|block| block.tag() == CERTIFICATE_LABEL)
        .map(|block| CertificateDer::from(block.into_contents()))
        .collect())
}

/// Parses every `CERTIFICATE` block in `pem_bytes` as X.509.
///
/// Fails if any block is not a valid certificate or if there are none.
pub fn parse_certificates(pem_bytes: &[u8]) -> Result<Vec<Certificate>> {
    let certs = certificate_blocks(pem_bytes)?
        .iter()
        .map(|der| Certificate::from_der(der.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    if certs.is_empty() {
        return Err(BrokerKitError::Certificate(
            "no CERTIFICATE block found".to_string(),
        ));
    }
    Ok(certs)
}

/// Decodes the first PEM block in `pem_str` as an X.509 certificate and summarizes it.
pub fn inspect_certificate_text(pem_str: &str) -> Result<CertificateSummary> {
    let block = pem::parse(pem_str)?;
    Certificate::from_der(block.contents())?.summary()
}

/// Checks that `pem_str` holds a PEM block decoding to a valid X.509 certificate.
///
/// Both a missing PEM block and an unparseable certificate yield `false`.
/// On success the certificate subject is logged.
pub fn verify_certificate_text(pem_str: &str) -> bool {
    match inspect_certificate_text(pem_str) {
        Ok(summary) => {
            info!(
                subject = %summary.subject,
                issuer = %summary.issuer,
                not_after = %summary.not_after,
                "certificate subject"
            );
            true
        }
        Err(err) => {
            warn!(error = %err, "certificate text rejected");
            false
        }
    }
}
