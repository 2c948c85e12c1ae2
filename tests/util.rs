#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;

// Generated with OpenSSL: an RSA-2048 CA and a client certificate it signed.
pub const CA_PEM: &str = include_str!("fixtures/ca.pem");
pub const CLIENT_CERT_PEM: &str = include_str!("fixtures/client.pem");
pub const CLIENT_KEY_PEM: &str = include_str!("fixtures/client.key");
pub const CLIENT_KEY_PKCS8_PEM: &str = include_str!("fixtures/client.pkcs8.key");
pub const OTHER_KEY_PEM: &str = include_str!("fixtures/other.key");

// Single-line base64 of the DER encodings, as supplied in inline configuration.
pub const CA_B64: &str = include_str!("fixtures/ca.b64");
pub const CLIENT_CERT_B64: &str = include_str!("fixtures/client.b64");
pub const CLIENT_KEY_B64: &str = include_str!("fixtures/client.key.b64");

// A self-signed P-256 certificate and its SEC1 key, plus an unrelated P-256 key.
pub const EC_CERT_PEM: &str = include_str!("fixtures/ec_client.pem");
pub const EC_CERT_B64: &str = include_str!("fixtures/ec_client.b64");
pub const EC_KEY_B64: &str = include_str!("fixtures/ec_client.key.b64");
pub const EC_OTHER_KEY_PEM: &str = include_str!("fixtures/ec_other.key");

pub const CA_SUBJECT_CN: &str = "CN=brokerkit-test-ca";
pub const CLIENT_SUBJECT_CN: &str = "CN=brokerkit-client";
pub const EC_SUBJECT_CN: &str = "CN=brokerkit-ec-client";

pub fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn path_of(file: &NamedTempFile) -> PathBuf {
    file.path().to_path_buf()
}
