use const_oid::ObjectIdentifier;
use const_oid::db::rfc5912::{ID_EC_PUBLIC_KEY, RSA_ENCRYPTION};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use rustls::pki_types::{
    PrivateKeyDer, PrivatePkcs1KeyDer, PrivatePkcs8KeyDer, PrivateSec1KeyDer,
};
use der::Decode;

use crate::cert::Certificate;
use crate::error::{BrokerKitError, Result};

/// Returns true for `PRIVATE KEY` and any `<ALGORITHM> PRIVATE KEY` label.
pub fn is_private_key_label(label: &str) -> bool {
    label == "PRIVATE KEY" || label.ends_with(" PRIVATE KEY")
}

/// A client private key decoded from PEM.
///
/// The encoding is detected from the DER payload rather than trusted from the
/// PEM label: PKCS#1, then PKCS#8, then SEC1. A PKCS#8 or EC key framed as
/// `RSA PRIVATE KEY` is still accepted.
pub struct ClientKey {
    der: PrivateKeyDer<'static>,
    algorithm: ObjectIdentifier,
    rsa_public: Option<RsaPublicKey>,
    /// SEC1 encoded point, when the key carries it.
    ec_public: Option<Vec<u8>>,
}

impl ClientKey {
    /// Decode the first private key block in `pem_bytes`.
    pub fn from_pem(pem_bytes: &[u8]) -> Result<Self> {
        let block = pem::parse_many(pem_bytes)?
            .into_iter()
            .find(|block| is_private_key_label(block.tag()))
            .ok_or_else(|| {
                BrokerKitError::PrivateKey("no private key block found".to_string())
            })?;
        Self::from_der(block.into_contents())
    }

    /// Decode a DER private key in PKCS#1, PKCS#8 or SEC1 form.
    pub fn from_der(der: Vec<u8>) -> Result<Self> {
        if let Ok(private) = RsaPrivateKey::from_pkcs1_der(&der) {
            return Ok(Self {
                der: PrivateKeyDer::Pkcs1(PrivatePkcs1KeyDer::from(der)),
                algorithm: RSA_ENCRYPTION,
                rsa_public: Some(private.to_public_key()),
                ec_public: None,
            });
        }

        if let Ok(info) = pkcs8::PrivateKeyInfo::try_from(der.as_slice()) {
            let algorithm = info.algorithm.oid;
            let rsa_public = if algorithm == RSA_ENCRYPTION {
                let private = RsaPrivateKey::from_pkcs8_der(&der)
                    .map_err(|e| BrokerKitError::PrivateKey(e.to_string()))?;
                Some(private.to_public_key())
            } else {
                None
            };
            return Ok(Self {
                der: PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(der)),
                algorithm,
                rsa_public,
                ec_public: None,
            });
        }

        if let Ok(ec) = sec1::EcPrivateKey::from_der(&der) {
            // rustls validates the curve when the key is loaded
            let ec_public = ec.public_key.map(<[u8]>::to_vec);
            return Ok(Self {
                der: PrivateKeyDer::Sec1(PrivateSec1KeyDer::from(der)),
                algorithm: ID_EC_PUBLIC_KEY,
                rsa_public: None,
                ec_public,
            });
        }

        Err(BrokerKitError::PrivateKey(
            "key is neither PKCS#1, PKCS#8 nor SEC1".to_string(),
        ))
    }

    /// OID of the key's public key algorithm.
    pub fn algorithm(&self) -> ObjectIdentifier {
        self.algorithm
    }

    /// Check that `cert` carries the public half of this key.
    ///
    /// Algorithms must agree. For RSA the modulus and exponent are compared; for
    /// SEC1 keys that embed their public point, the point is compared.
    pub fn ensure_matches(&self, cert: &Certificate) -> Result<()> {
        let spki = &cert.inner.tbs_certificate.subject_public_key_info;
        if spki.algorithm.oid != self.algorithm {
            return Err(BrokerKitError::KeyMismatch);
        }
        if let Some(key_public) = &self.rsa_public {
            let cert_public = RsaPublicKey::from_public_key_der(&cert.public_key_info_der()?)
                .map_err(|e| BrokerKitError::Certificate(e.to_string()))?;
            if &cert_public != key_public {
                return Err(BrokerKitError::KeyMismatch);
            }
        }
        if let Some(point) = &self.ec_public {
            if spki.subject_public_key.raw_bytes() != point.as_slice() {
                return Err(BrokerKitError::KeyMismatch);
            }
        }
        Ok(())
    }

    /// Converts into the form rustls consumes.
    pub fn into_der(self) -> PrivateKeyDer<'static> {
        self.der
    }
}

impl std::fmt::Debug for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientKey")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_key_labels() {
        assert!(is_private_key_label("PRIVATE KEY"));
        assert!(is_private_key_label("RSA PRIVATE KEY"));
        assert!(is_private_key_label("EC PRIVATE KEY"));
        assert!(!is_private_key_label("ENCRYPTED PRIVATE KEYS"));
        assert!(!is_private_key_label("CERTIFICATE"));
    }

    #[test]
    fn unknown_der_is_rejected() {
        assert!(matches!(
            ClientKey::from_der(vec![0x30, 0x03, 0x02, 0x01, 0x00]),
            Err(BrokerKitError::PrivateKey(_))
        ));
    }
}
