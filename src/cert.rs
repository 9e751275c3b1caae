//! Certificate model: DER-backed X.509 certificates identified by a
//! content fingerprint.

use der::asn1::{ObjectIdentifier, OctetString};
use der::pem::LineEnding;
use der::{Decode, Encode, EncodePem};
use sha2::{Digest, Sha256};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;

use crate::error::Result;

const SUBJECT_KEY_ID_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.14");

/// SHA-256 of the certificate's DER bytes, lowercase hex.
///
/// Used as the dedup key and as the output file name stem. The classified
/// chain role (leaf/intermediate/root) is deliberately not part of a
/// certificate's identity; it is assigned per chain build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(der: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(der)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An X.509 certificate, parsed once at construction and carrying its
/// original DER bytes.
#[derive(Debug, Clone)]
pub struct Certificate {
    der: Vec<u8>,
    parsed: x509_cert::Certificate,
    fingerprint: Fingerprint,
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl Eq for Certificate {}

impl Certificate {
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let parsed = x509_cert::Certificate::from_der(der)?;
        Ok(Self {
            der: der.to_vec(),
            parsed,
            fingerprint: Fingerprint::of(der),
        })
    }

    /// Wrap an already-decoded certificate, re-encoding it to recover the
    /// canonical DER bytes.
    pub fn from_x509(parsed: x509_cert::Certificate) -> Result<Self> {
        let der = parsed.to_der()?;
        let fingerprint = Fingerprint::of(&der);
        Ok(Self {
            der,
            parsed,
            fingerprint,
        })
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn subject(&self) -> &Name {
        &self.parsed.tbs_certificate.subject
    }

    pub fn issuer(&self) -> &Name {
        &self.parsed.tbs_certificate.issuer
    }

    pub fn serial_number(&self) -> &SerialNumber {
        &self.parsed.tbs_certificate.serial_number
    }

    /// Subject Key Identifier extension value, when present.
    pub fn subject_key_id(&self) -> Option<Vec<u8>> {
        let extensions = self.parsed.tbs_certificate.extensions.as_ref()?;
        let ext = extensions.iter().find(|e| e.extn_id == SUBJECT_KEY_ID_OID)?;
        // The extension value is an OCTET STRING wrapping the key identifier.
        let key_id = OctetString::from_der(ext.extn_value.as_bytes()).ok()?;
        Some(key_id.as_bytes().to_vec())
    }

    /// A self-signed certificate terminates a chain.
    pub fn is_self_signed(&self) -> bool {
        self.subject() == self.issuer()
    }

    pub fn to_der(&self) -> &[u8] {
        &self.der
    }

    pub fn to_pem(&self) -> Result<String> {
        Ok(self.parsed.to_pem(LineEnding::LF)?)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::Certificate;

    pub const ROOT_DER: &[u8] = include_bytes!("../tests/fixtures/certs/root.cer");
    pub const INTER_DER: &[u8] = include_bytes!("../tests/fixtures/certs/inter.cer");
    pub const LEAF_DER: &[u8] = include_bytes!("../tests/fixtures/certs/leaf.cer");
    pub const OTHER_DER: &[u8] = include_bytes!("../tests/fixtures/certs/other.cer");

    /// Self-signed fixture CA.
    pub fn root() -> Certificate {
        Certificate::from_der(ROOT_DER).unwrap()
    }

    /// Intermediate CA issued by `root`.
    pub fn inter() -> Certificate {
        Certificate::from_der(INTER_DER).unwrap()
    }

    /// Code-signing end entity issued by `inter`.
    pub fn leaf() -> Certificate {
        Certificate::from_der(LEAF_DER).unwrap()
    }

    /// Standalone self-signed certificate unrelated to the chain.
    pub fn other() -> Certificate {
        Certificate::from_der(OTHER_DER).unwrap()
    }
}
