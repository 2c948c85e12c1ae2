//! SASL/SCRAM-SHA-512 client mechanism (RFC 5802, RFC 7677).
//!
//! The exchange is three messages:
//! 1. client-first: `n,,n=<user>,r=<client-nonce>`
//! 2. client-final, answering server-first: `c=biws,r=<nonce>,p=<proof>`
//! 3. verification of server-final: `v=<server-signature>`

use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha512};
use tracing::debug;

use super::{Mechanism, SaslConversation, Step};
use crate::error::{BrokerKitError, Result};

/// Minimum PBKDF2 iteration count accepted from a server.
pub const MIN_ITERATIONS: u32 = 4096;

/// Client nonce length in bytes, before base64.
pub const NONCE_LENGTH: usize = 24;

const GS2_HEADER: &str = "n,,";
/// base64("n,,")
const CHANNEL_BINDING: &str = "biws";
const OUTPUT_LEN: usize = 64;

/// SCRAM-SHA-512 credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct ScramMechanism {
    username: String,
    password: String,
}

impl ScramMechanism {
    /// Create a mechanism for `username`/`password`.
    ///
    /// # Errors
    ///
    /// Fails if either value is empty or contains control characters, which
    /// SASLprep prohibits.
    pub fn new(username: &str, password: &str) -> Result<Self> {
        Ok(Self {
            username: prepare("username", username)?,
            password: prepare("password", password)?,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn start_with_nonce(&self, client_nonce: String) -> (ScramConversation, Vec<u8>) {
        let client_first_bare = format!("n={},r={}", escape_username(&self.username), client_nonce);
        let message = format!("{GS2_HEADER}{client_first_bare}");
        let conversation = ScramConversation {
            password: self.password.clone(),
            client_nonce,
            state: State::AwaitingServerFirst { client_first_bare },
        };
        (conversation, message.into_bytes())
    }
}

impl fmt::Debug for ScramMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScramMechanism")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Mechanism for ScramMechanism {
    fn name(&self) -> &'static str {
        "SCRAM-SHA-512"
    }

    fn start(&self) -> Result<(Box<dyn SaslConversation>, Vec<u8>)> {
        let nonce: [u8; NONCE_LENGTH] = rand::random();
        let (conversation, message) = self.start_with_nonce(BASE64.encode(nonce));
        Ok((Box::new(conversation), message))
    }
}

fn prepare(field: &str, value: &str) -> Result<String> {
    if value.is_empty() {
        return Err(BrokerKitError::Sasl(format!("SCRAM {field} is empty")));
    }
    if value.chars().any(char::is_control) {
        return Err(BrokerKitError::Sasl(format!(
            "SCRAM {field} contains prohibited control characters"
        )));
    }
    Ok(value.to_string())
}

/// Escape `=` and `,` as required for the `n=` attribute.
fn escape_username(username: &str) -> String {
    username.replace('=', "=3D").replace(',', "=2C")
}

enum State {
    AwaitingServerFirst { client_first_bare: String },
    AwaitingServerFinal { server_signature: Vec<u8> },
    Done,
}

struct ScramConversation {
    password: String,
    client_nonce: String,
    state: State,
}

/// Fields of a server-first message.
#[derive(Debug, PartialEq, Eq)]
struct ServerFirst {
    nonce: String,
    salt: Vec<u8>,
    iterations: u32,
}

fn parse_server_first(message: &str) -> Result<ServerFirst> {
    let mut nonce = None;
    let mut salt = None;
    let mut iterations = None;

    for part in message.split(',') {
        if let Some(value) = part.strip_prefix("r=") {
            nonce = Some(value.to_string());
        } else if let Some(value) = part.strip_prefix("s=") {
            salt = Some(
                BASE64
                    .decode(value)
                    .map_err(|e| BrokerKitError::Sasl(format!("invalid salt encoding: {e}")))?,
            );
        } else if let Some(value) = part.strip_prefix("i=") {
            iterations = Some(
                value
                    .parse::<u32>()
                    .map_err(|e| BrokerKitError::Sasl(format!("invalid iteration count: {e}")))?,
            );
        } else if let Some(value) = part.strip_prefix("e=") {
            return Err(BrokerKitError::Sasl(format!("server error: {value}")));
        } else if part.starts_with("m=") {
            return Err(BrokerKitError::Sasl(
                "server requires an unsupported SCRAM extension".to_string(),
            ));
        }
    }

    Ok(ServerFirst {
        nonce: nonce.ok_or_else(|| BrokerKitError::Sasl("server-first missing nonce".to_string()))?,
        salt: salt.ok_or_else(|| BrokerKitError::Sasl("server-first missing salt".to_string()))?,
        iterations: iterations
            .ok_or_else(|| BrokerKitError::Sasl("server-first missing iterations".to_string()))?,
    })
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = Hmac::<Sha512>::new_from_slice(key)
        .map_err(|e| BrokerKitError::Sasl(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn salted_password(password: &str, salt: &[u8], iterations: u32) -> [u8; OUTPUT_LEN] {
    let mut output = [0u8; OUTPUT_LEN];
    pbkdf2_hmac::<Sha512>(password.as_bytes(), salt, iterations, &mut output);
    output
}

impl ScramConversation {
    fn client_final(&mut self, client_first_bare: &str, server_first: &str) -> Result<Step> {
        let parsed = parse_server_first(server_first)?;
        if !parsed.nonce.starts_with(&self.client_nonce)
            || parsed.nonce.len() == self.client_nonce.len()
        {
            return Err(BrokerKitError::Sasl(
                "server nonce does not extend the client nonce".to_string(),
            ));
        }
        if parsed.iterations < MIN_ITERATIONS {
            return Err(BrokerKitError::Sasl(format!(
                "iteration count {} below minimum {MIN_ITERATIONS}",
                parsed.iterations
            )));
        }

        let salted = salted_password(&self.password, &parsed.salt, parsed.iterations);
        let client_key = hmac(&salted, b"Client Key")?;
        let stored_key = Sha512::digest(&client_key);
        let server_key = hmac(&salted, b"Server Key")?;

        let without_proof = format!("c={CHANNEL_BINDING},r={}", parsed.nonce);
        let auth_message = format!("{client_first_bare},{server_first},{without_proof}");

        let client_signature = hmac(&stored_key, auth_message.as_bytes())?;
        let proof: Vec<u8> = client_key
            .iter()
            .zip(client_signature.iter())
            .map(|(k, s)| k ^ s)
            .collect();
        let server_signature = hmac(&server_key, auth_message.as_bytes())?;

        debug!(iterations = parsed.iterations, "answering SCRAM server-first");
        self.state = State::AwaitingServerFinal { server_signature };
        Ok(Step {
            done: false,
            response: format!("{without_proof},p={}", BASE64.encode(proof)).into_bytes(),
        })
    }
}

fn verify_server_final(server_final: &str, expected: &[u8]) -> Result<()> {
    for part in server_final.split(',') {
        if let Some(value) = part.strip_prefix("e=") {
            return Err(BrokerKitError::Sasl(format!("server error: {value}")));
        }
        if let Some(value) = part.strip_prefix("v=") {
            let signature = BASE64
                .decode(value)
                .map_err(|e| BrokerKitError::Sasl(format!("invalid server signature: {e}")))?;
            if signature != expected {
                return Err(BrokerKitError::Sasl("server signature mismatch".to_string()));
            }
            return Ok(());
        }
    }
    Err(BrokerKitError::Sasl("server-final missing verifier".to_string()))
}

impl SaslConversation for ScramConversation {
    fn next(&mut self, challenge: &[u8]) -> Result<Step> {
        let challenge = std::str::from_utf8(challenge)
            .map_err(|e| BrokerKitError::Sasl(format!("challenge is not UTF-8: {e}")))?;

        match std::mem::replace(&mut self.state, State::Done) {
            State::AwaitingServerFirst { client_first_bare } => {
                self.client_final(&client_first_bare, challenge)
            }
            State::AwaitingServerFinal { server_signature } => {
                verify_server_final(challenge, &server_signature)?;
                Ok(Step {
                    done: true,
                    response: Vec::new(),
                })
            }
            State::Done => Err(BrokerKitError::Sasl(
                "SCRAM exchange already finished".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: &[u8] = b"brokerkit-salt!!";

    /// Plays the broker side: returns server-first for the given client-first.
    fn server_first_for(client_first: &[u8], iterations: u32) -> (String, String) {
        let client_first = std::str::from_utf8(client_first).unwrap();
        let bare = client_first.strip_prefix(GS2_HEADER).unwrap().to_string();
        let client_nonce = bare.split(',').find_map(|p| p.strip_prefix("r=")).unwrap();
        let server_first = format!(
            "r={client_nonce}srvnonce,s={},i={iterations}",
            BASE64.encode(SALT)
        );
        (bare, server_first)
    }

    #[test]
    fn full_exchange_verifies_on_both_sides() {
        let mechanism = ScramMechanism::new("alice", "pencil").unwrap();
        let (mut conversation, client_first) = mechanism.start().unwrap();
        let (bare, server_first) = server_first_for(&client_first, 4096);

        let step = conversation.next(server_first.as_bytes()).unwrap();
        assert!(!step.done);
        let client_final = String::from_utf8(step.response).unwrap();
        let (without_proof, proof_b64) = client_final.rsplit_once(",p=").unwrap();
        assert!(without_proof.starts_with("c=biws,r="));

        // Server recomputes the proof from its stored key.
        let salted = salted_password("pencil", SALT, 4096);
        let client_key = hmac(&salted, b"Client Key").unwrap();
        let stored_key = Sha512::digest(&client_key);
        let auth_message = format!("{bare},{server_first},{without_proof}");
        let client_signature = hmac(&stored_key, auth_message.as_bytes()).unwrap();
        let proof = BASE64.decode(proof_b64).unwrap();
        let recovered: Vec<u8> = proof
            .iter()
            .zip(client_signature.iter())
            .map(|(p, s)| p ^ s)
            .collect();
        assert_eq!(Sha512::digest(&recovered).as_slice(), stored_key.as_slice());

        let server_key = hmac(&salted, b"Server Key").unwrap();
        let server_signature = hmac(&server_key, auth_message.as_bytes()).unwrap();
        let server_final = format!("v={}", BASE64.encode(server_signature));
        let step = conversation.next(server_final.as_bytes()).unwrap();
        assert!(step.done);
        assert!(step.response.is_empty());

        assert!(conversation.next(b"v=").is_err());
    }

    #[test]
    fn client_first_escapes_username() {
        let mechanism = ScramMechanism::new("a=b,c", "p").unwrap();
        let (_, message) = mechanism.start_with_nonce("fixednonce".to_string());
        assert_eq!(message, b"n,,n=a=3Db=2Cc,r=fixednonce".to_vec());
    }

    #[test]
    fn rejects_foreign_nonce() {
        let mechanism = ScramMechanism::new("alice", "pencil").unwrap();
        let (mut conversation, _) = mechanism.start_with_nonce("abc".to_string());
        let err = conversation.next(b"r=xyz123,s=c2FsdA==,i=4096");
        assert!(matches!(err, Err(BrokerKitError::Sasl(_))));
    }

    #[test]
    fn rejects_low_iteration_count() {
        let mechanism = ScramMechanism::new("alice", "pencil").unwrap();
        let (mut conversation, _) = mechanism.start_with_nonce("abc".to_string());
        assert!(conversation.next(b"r=abcdef,s=c2FsdA==,i=1").is_err());
    }

    #[test]
    fn rejects_tampered_server_signature() {
        let mechanism = ScramMechanism::new("alice", "pencil").unwrap();
        let (mut conversation, _) = mechanism.start_with_nonce("abc".to_string());
        conversation
            .next(format!("r=abcdef,s={},i=4096", BASE64.encode(SALT)).as_bytes())
            .unwrap();
        let forged = format!("v={}", BASE64.encode([0u8; OUTPUT_LEN]));
        assert!(conversation.next(forged.as_bytes()).is_err());
    }

    #[test]
    fn surfaces_server_error() {
        let mechanism = ScramMechanism::new("alice", "pencil").unwrap();
        let (mut conversation, _) = mechanism.start_with_nonce("abc".to_string());
        match conversation.next(b"e=unknown-user") {
            Err(BrokerKitError::Sasl(msg)) => assert!(msg.contains("unknown-user")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn parses_server_first() {
        let parsed = parse_server_first("r=abc,s=c2FsdA==,i=4096").unwrap();
        assert_eq!(
            parsed,
            ServerFirst {
                nonce: "abc".to_string(),
                salt: b"salt".to_vec(),
                iterations: 4096,
            }
        );
        assert!(parse_server_first("r=abc,i=4096").is_err());
    }

    #[test]
    fn rejects_control_characters() {
        assert!(ScramMechanism::new("bad\u{0}user", "p").is_err());
        assert!(ScramMechanism::new("u", "bad\npass").is_err());
    }
}
