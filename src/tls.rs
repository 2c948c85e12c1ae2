//! TLS client configuration for broker connections.
//!
//! TLS is opt-in: it is enabled only when CA material is configured. The trust
//! pool is always built from that material, and a client identity is added when
//! both a certificate and a key resolve.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, ring};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tracing::{debug, warn};

use crate::cert::{Certificate, certificate_blocks, parse_certificates};
use crate::config::SecurityConfig;
use crate::error::{BrokerKitError, Result};
use crate::key::ClientKey;
use crate::source::CertificateMaterial;

/// TLS material ready to hand to a transport layer.
///
/// Immutable once built; share it across connections by cloning the inner
/// `Arc<ClientConfig>`.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    client_config: Arc<ClientConfig>,
    roots: Arc<RootCertStore>,
    client_subject: Option<String>,
    verify_server_identity: bool,
}

impl TlsConfig {
    /// The rustls client configuration.
    pub fn client_config(&self) -> Arc<ClientConfig> {
        Arc::clone(&self.client_config)
    }

    /// The trust pool built from the configured CA material.
    pub fn root_store(&self) -> &RootCertStore {
        &self.roots
    }

    /// Number of trust anchors in the pool.
    pub fn trust_anchor_count(&self) -> usize {
        self.roots.len()
    }

    /// Returns true when a client certificate is installed.
    pub fn has_client_certificate(&self) -> bool {
        self.client_subject.is_some()
    }

    /// Subject of the installed client certificate.
    pub fn client_certificate_subject(&self) -> Option<&str> {
        self.client_subject.as_deref()
    }

    /// Returns true when the broker's certificate chain and name are verified.
    pub fn verifies_server_identity(&self) -> bool {
        self.verify_server_identity
    }
}

/// Build the TLS client configuration for `config`.
///
/// Returns `Ok(None)` when neither `ca_file` nor `ca_pem` is set.
///
/// # Errors
///
/// Returns an error if:
/// - CA, certificate or key material cannot be read or decoded
/// - the CA material yields no trust anchors
/// - the client certificate and key do not parse or do not match
/// - rustls rejects the resulting configuration
pub fn build_tls_config(config: &SecurityConfig) -> Result<Option<TlsConfig>> {
    if !config.has_ca() {
        debug!("no CA material configured, TLS disabled");
        return Ok(None);
    }

    let material = CertificateMaterial::resolve(config)?;
    let roots = Arc::new(build_root_store(&material.ca)?);
    let identity = load_client_identity(&material)?;

    let provider = Arc::new(ring::default_provider());
    let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()?;

    let builder = if config.verify_server_identity {
        builder.with_root_certificates(Arc::clone(&roots))
    } else {
        warn!("server certificate verification disabled; broker identity will not be checked");
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoServerVerification::new(provider)))
    };

    let (client_config, client_subject) = match identity {
        Some(identity) => {
            debug!(subject = %identity.subject, "installing client certificate");
            let client_config = builder.with_client_auth_cert(identity.chain, identity.key)?;
            (client_config, Some(identity.subject))
        }
        None => (builder.with_no_client_auth(), None),
    };

    Ok(Some(TlsConfig {
        client_config: Arc::new(client_config),
        roots,
        client_subject,
        verify_server_identity: config.verify_server_identity,
    }))
}

/// Build the trust pool from PEM bytes.
///
/// Unparseable certificates are skipped; an empty result or malformed PEM
/// framing is reported as [`BrokerKitError::InvalidCaBundle`].
pub fn build_root_store(ca_pem: &[u8]) -> Result<RootCertStore> {
    let certs =
        certificate_blocks(ca_pem).map_err(|e| BrokerKitError::InvalidCaBundle(e.to_string()))?;
    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(certs);

    if ignored > 0 {
        warn!(ignored, "skipped unparseable CA certificates");
    }
    if added == 0 {
        return Err(BrokerKitError::InvalidCaBundle(
            "no certificate could be added to the trust pool".to_string(),
        ));
    }

    debug!(added, "built trust pool");
    Ok(roots)
}

struct ClientIdentity {
    chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
    subject: String,
}

fn load_client_identity(material: &CertificateMaterial) -> Result<Option<ClientIdentity>> {
    if !material.has_client_identity() {
        if !material.cert.is_empty() || !material.key.is_empty() {
            warn!("client certificate and key must both be configured; ignoring the lone half");
        }
        return Ok(None);
    }

    let chain = parse_certificates(&material.cert)?;
    let leaf = chain
        .first()
        .ok_or_else(|| BrokerKitError::Certificate("empty certificate chain".to_string()))?;
    let key = ClientKey::from_pem(&material.key)?;
    key.ensure_matches(leaf)?;

    Ok(Some(ClientIdentity {
        subject: leaf.subject(),
        chain: chain.into_iter().map(Certificate::into_rustls).collect(),
        key: key.into_der(),
    }))
}

/// Accepts any server certificate while still checking handshake signatures.
#[derive(Debug)]
struct NoServerVerification(Arc<CryptoProvider>);

impl NoServerVerification {
    fn new(provider: Arc<CryptoProvider>) -> Self {
        Self(provider)
    }
}

impl ServerCertVerifier for NoServerVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
