//! SASL mechanism selection.
//!
//! A mechanism is chosen purely from configuration. The transport layer drives
//! the exchange: it sends the initial response from [`Mechanism::start`] and
//! feeds every server challenge to [`SaslConversation::next`] until it reports
//! `done`. Whether the broker accepts the mechanism is only known at that point.

pub mod plain;
pub mod scram;

use tracing::debug;

pub use plain::PlainMechanism;
pub use scram::ScramMechanism;

use crate::config::{MechanismKind, SecurityConfig};
use crate::error::Result;

/// One step of a client-side SASL exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// No further server input is expected.
    pub done: bool,
    /// Bytes to send to the server; may be empty.
    pub response: Vec<u8>,
}

/// Client-side SASL mechanism.
pub trait Mechanism: Send + Sync {
    /// The mechanism name sent in the SASL handshake.
    fn name(&self) -> &'static str;

    /// Begins an exchange, returning its state machine and the initial client response.
    fn start(&self) -> Result<(Box<dyn SaslConversation>, Vec<u8>)>;
}

/// State of an exchange in progress.
pub trait SaslConversation: Send {
    /// Processes a server challenge and produces the next client message.
    fn next(&mut self, challenge: &[u8]) -> Result<Step>;
}

/// The mechanism selected for a connection configuration.
#[derive(Debug, Clone)]
pub enum SaslMechanism {
    Plain(PlainMechanism),
    ScramSha512(ScramMechanism),
}

impl SaslMechanism {
    /// Which mechanism shape this is.
    pub fn kind(&self) -> MechanismKind {
        match self {
            SaslMechanism::Plain(_) => MechanismKind::Plain,
            SaslMechanism::ScramSha512(_) => MechanismKind::ScramSha512,
        }
    }

    /// The username the mechanism authenticates as.
    pub fn username(&self) -> &str {
        match self {
            SaslMechanism::Plain(m) => m.username(),
            SaslMechanism::ScramSha512(m) => m.username(),
        }
    }
}

impl Mechanism for SaslMechanism {
    fn name(&self) -> &'static str {
        match self {
            SaslMechanism::Plain(m) => m.name(),
            SaslMechanism::ScramSha512(m) => m.name(),
        }
    }

    fn start(&self) -> Result<(Box<dyn SaslConversation>, Vec<u8>)> {
        match self {
            SaslMechanism::Plain(m) => m.start(),
            SaslMechanism::ScramSha512(m) => m.start(),
        }
    }
}

/// Select the SASL mechanism for `config`.
///
/// Returns `Ok(None)` unless both username and password are set. With
/// credentials, `MechanismKind::ScramSha512` yields a SCRAM mechanism and
/// anything else a PLAIN one.
///
/// # Errors
///
/// Returns an error if the credentials cannot be used for SCRAM.
pub fn select_mechanism(config: &SecurityConfig) -> Result<Option<SaslMechanism>> {
    if !config.has_credentials() {
        debug!("no SASL credentials configured");
        return Ok(None);
    }

    let mechanism = match config.mechanism {
        MechanismKind::ScramSha512 => SaslMechanism::ScramSha512(ScramMechanism::new(
            &config.username,
            &config.password,
        )?),
        MechanismKind::Plain => {
            SaslMechanism::Plain(PlainMechanism::new(&config.username, &config.password))
        }
    };

    debug!(
        mechanism = mechanism.name(),
        username = %mechanism.username(),
        "selected SASL mechanism"
    );
    Ok(Some(mechanism))
}
