//! SASL/PLAIN client mechanism.
//!
//! The single client message is `\0username\0password`; credentials travel in
//! cleartext and should only be used over TLS.

use std::fmt;

use super::{Mechanism, SaslConversation, Step};
use crate::error::Result;

/// SASL/PLAIN credentials, carried verbatim.
#[derive(Clone, PartialEq, Eq)]
pub struct PlainMechanism {
    username: String,
    password: String,
}

impl PlainMechanism {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// The initial client response.
    pub fn initial_response(&self) -> Vec<u8> {
        let mut message = Vec::with_capacity(self.username.len() + self.password.len() + 2);
        message.push(0);
        message.extend_from_slice(self.username.as_bytes());
        message.push(0);
        message.extend_from_slice(self.password.as_bytes());
        message
    }
}

impl fmt::Debug for PlainMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlainMechanism")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Mechanism for PlainMechanism {
    fn name(&self) -> &'static str {
        "PLAIN"
    }

    fn start(&self) -> Result<(Box<dyn SaslConversation>, Vec<u8>)> {
        Ok((Box::new(PlainConversation), self.initial_response()))
    }
}

/// PLAIN completes as soon as the server answers.
struct PlainConversation;

impl SaslConversation for PlainConversation {
    fn next(&mut self, _challenge: &[u8]) -> Result<Step> {
        Ok(Step {
            done: true,
            response: Vec::new(),
        })
    }
}
