//! # BrokerKit - Connection Security Material for Message Brokers
//!
//! BrokerKit assembles what a transport layer needs to open an authenticated,
//! optionally encrypted connection to a message-broker cluster:
//!
//! - a [`rustls`] client configuration with a trust pool and an optional client
//!   certificate, built from files or inline base64 PEM material;
//! - a SASL mechanism (PLAIN or SCRAM-SHA-512) chosen from declarative settings.
//!
//! It performs no network I/O. The TLS and SASL handshakes themselves belong to
//! the transport layer.
//!
//! ## Certificate Sources
//!
//! - **File**: CA, client certificate and client key are read from paths.
//! - **Inline text**: the CA and key are base64 DER, decoded and framed as PEM;
//!   the client certificate is a base64 body that is only re-wrapped at 64 columns.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use brokerkit::config::{CertificateSource, MechanismKind, SecurityConfig};
//! use brokerkit::sasl::{Mechanism, select_mechanism};
//! use brokerkit::tls::build_tls_config;
//!
//! # fn main() -> Result<(), brokerkit::error::BrokerKitError> {
//! let config = SecurityConfig::builder()
//!     .username("app")
//!     .password("secret")
//!     .mechanism(MechanismKind::ScramSha512)
//!     .certificate_source(CertificateSource::File)
//!     .ca_file("/etc/kafka/ca.pem")
//!     .build();
//!
//! let tls = build_tls_config(&config)?;
//! let sasl = select_mechanism(&config)?;
//!
//! if let Some(tls) = &tls {
//!     println!("trust anchors: {}", tls.trust_anchor_count());
//! }
//! if let Some(mechanism) = &sasl {
//!     println!("SASL mechanism: {}", mechanism.name());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Declarative Configuration
//!
//! ```rust
//! use brokerkit::config::{MechanismKind, SecurityConfig, SecuritySection};
//!
//! let section = SecuritySection {
//!     username: "app".to_string(),
//!     password: "secret".to_string(),
//!     sasl_way: 2,
//!     ..SecuritySection::default()
//! };
//! let config = SecurityConfig::try_from(section).unwrap();
//! assert_eq!(config.mechanism, MechanismKind::ScramSha512);
//! ```
//!
//! ## Error Handling
//!
//! Every builder returns [`error::Result`]. Malformed material is reported, never
//! recovered from, and missing optional material is not an error:
//!
//! ```rust
//! use brokerkit::{error::BrokerKitError, pem_utils::encode_as_pem};
//!
//! match encode_as_pem("not base64!", "CERTIFICATE") {
//!     Ok(_) => println!("encoded"),
//!     Err(BrokerKitError::Base64(msg)) => println!("bad input: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`config`]: connection security settings and the declarative adapter
//! - [`pem_utils`]: base64 to PEM conversion
//! - [`source`]: resolving CA/cert/key bytes from files or inline text
//! - [`cert`]: certificate parsing and the operator-facing verifier
//! - [`key`]: client private key decoding
//! - [`tls`]: TLS client configuration
//! - [`sasl`]: SASL mechanism selection and client mechanisms
//! - [`error`]: error types

pub mod cert;
pub mod config;
pub mod error;
pub mod key;
pub mod pem_utils;
pub mod sasl;
pub mod source;
pub mod tls;

pub use cert::verify_certificate_text;
pub use config::{CertificateSource, MechanismKind, SecurityConfig};
pub use error::{BrokerKitError, Result};
pub use sasl::{SaslMechanism, select_mechanism};
pub use tls::{TlsConfig, build_tls_config};
