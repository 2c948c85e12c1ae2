mod util;

use brokerkit::cert::{inspect_certificate_text, parse_certificates, verify_certificate_text};
use time::OffsetDateTime;

#[test]
fn valid_certificate_text_verifies() {
    assert!(verify_certificate_text(util::CA_PEM));
    assert!(verify_certificate_text(util::CLIENT_CERT_PEM));
}

#[test]
fn text_without_pem_block_is_rejected() {
    assert!(!verify_certificate_text("MIIDUzCCAjugAwIBAgIU"));
    assert!(!verify_certificate_text(""));
}

#[test]
fn unparseable_certificate_is_rejected_without_panicking() {
    let bogus = "-----BEGIN CERTIFICATE-----\naGVsbG8gd29ybGQ=\n-----END CERTIFICATE-----\n";
    assert!(!verify_certificate_text(bogus));
    assert!(!verify_certificate_text(util::CLIENT_KEY_PEM));
}

#[test]
fn summary_reports_subject_and_validity() {
    let summary = inspect_certificate_text(util::CLIENT_CERT_PEM).unwrap();
    assert!(summary.subject.contains(util::CLIENT_SUBJECT_CN), "{}", summary.subject);
    assert!(summary.issuer.contains(util::CA_SUBJECT_CN), "{}", summary.issuer);
    assert!(!summary.serial.is_empty());
    assert!(summary.not_before < summary.not_after);
    assert!(summary.is_valid_at(OffsetDateTime::now_utc()));
}

#[test]
fn parse_certificates_skips_other_blocks() {
    let bundle = format!("{}{}", util::CLIENT_KEY_PEM, util::CA_PEM);
    let certs = parse_certificates(bundle.as_bytes()).unwrap();
    assert_eq!(certs.len(), 1);
    assert!(certs[0].subject().contains(util::CA_SUBJECT_CN));
    assert_eq!(certs[0].to_pem(), util::CA_PEM);
}

#[test]
fn parse_certificates_requires_one_certificate() {
    assert!(parse_certificates(util::CLIENT_KEY_PEM.as_bytes()).is_err());
}
