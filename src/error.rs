//! use brokerkit::error::BrokerKitError;

use thiserror::Error;

/// Represents errors that can occur while assembling connection security material.
///
/// Every variant describes a setup failure. Nothing in this crate recovers from
/// one locally; the caller decides whether to abort or reload its configuration.
#[derive(Debug, Error)]
pub enum BrokerKitError {
    /// Inline material was not valid base64.
    #[error("Invalid base64 input: {0}")]
    Base64(String),

    /// A PEM block could not be decoded.
    #[error("Failed to decode PEM: {0}")]
    Pem(String),

    /// Reading a certificate or key file failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The CA material produced an empty trust pool.
    #[error("CA bundle contains no usable certificates: {0}")]
    InvalidCaBundle(String),

    /// A certificate could not be parsed as X.509.
    #[error("Certificate error: {0}")]
    Certificate(String),

    /// The client private key could not be decoded.
    #[error("Private key error: {0}")]
    PrivateKey(String),

    /// The client certificate and private key do not belong together.
    #[error("Client certificate does not match private key")]
    KeyMismatch,

    /// rustls rejected the assembled configuration.
    #[error("TLS configuration error: {0}")]
    Tls(String),

    /// SASL mechanism construction or exchange failure.
    #[error("SASL error: {0}")]
    Sasl(String),

    /// The declarative configuration contained an unsupported value.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BrokerKitError>;

impl From<der::Error> for BrokerKitError {
    /// Converts a `der::Error` into a `BrokerKitError`.
    fn from(err: der::Error) -> Self {
        BrokerKitError::Certificate(err.to_string())
    }
}

impl From<pem::PemError> for BrokerKitError {
    fn from(err: pem::PemError) -> Self {
        BrokerKitError::Pem(err.to_string())
    }
}

impl From<base64::DecodeError> for BrokerKitError {
    fn from(err: base64::DecodeError) -> Self {
        BrokerKitError::Base64(err.to_string())
    }
}

impl From<rustls::Error> for BrokerKitError {
    fn from(err: rustls::Error) -> Self {
        BrokerKitError::Tls(err.to_string())
    }
}
