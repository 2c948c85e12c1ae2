use base64::{Engine, engine::general_purpose::STANDARD as BASE64};

use crate::error::Result;

/// Number of base64 characters per PEM body line.
pub const PEM_LINE_WIDTH: usize = 64;

const CERTIFICATE_HEADER: &str = "-----BEGIN CERTIFICATE-----\n";
const CERTIFICATE_FOOTER: &str = "\n-----END CERTIFICATE-----";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Convert a PEM‑encoded string to DER‑encoded bytes.
pub fn pem_to_der(pem_str: &str) -> Result<Vec<u8>> {
    let pem = pem::parse(pem_str)?;
    Ok(pem.contents().to_vec())
}

/// Decode base64 text and frame the resulting bytes as a PEM block.
///
/// Line breaks inside `base64_text` are ignored; any other character outside
/// the standard alphabet is an error.
///
/// # Arguments
/// * `base64_text` - standard (padded) base64 of the DER payload.
/// * `label` - PEM block label, e.g. `CERTIFICATE` or `RSA PRIVATE KEY`.
///
/// # Returns
/// The canonical PEM encoding: 64-column body, LF line endings, trailing newline.
pub fn encode_as_pem(base64_text: &str, label: &str) -> Result<Vec<u8>> {
    let compact: String = base64_text
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .collect();
    let der = BASE64.decode(compact.as_bytes())?;
    Ok(der_to_pem(&der, label).into_bytes())
}

/// Frame a base64 certificate body as a `CERTIFICATE` PEM block without decoding it.
///
/// The body is split into 64-character lines (the last may be shorter) between
/// a literal header and footer. No newline follows the footer.
///
/// This is not interchangeable with [`encode_as_pem`]: the input is embedded
/// byte for byte, so it is never validated or re-encoded here.
pub fn wrap_as_certificate_pem(base64_cert_body: &str) -> Vec<u8> {
    let body = base64_cert_body.as_bytes();
    let line_count = body.len().div_ceil(PEM_LINE_WIDTH);
    let mut out = Vec::with_capacity(
        CERTIFICATE_HEADER.len() + body.len() + line_count + CERTIFICATE_FOOTER.len(),
    );

    out.extend_from_slice(CERTIFICATE_HEADER.as_bytes());
    for (i, line) in body.chunks(PEM_LINE_WIDTH).enumerate() {
        if i > 0 {
            out.push(b'\n');
        }
        out.extend_from_slice(line);
    }
    out.extend_from_slice(CERTIFICATE_FOOTER.as_bytes());
    out
}
