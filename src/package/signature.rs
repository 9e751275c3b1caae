//! CMS/PKCS#7 parsing of package signature blobs.
//!
//! A package signature is a CMS `SignedData` structure. The signer's role
//! is carried by the CAdES commitment-type-indication signed attribute,
//! the repository countersignature by an unsigned countersignature
//! attribute on the primary signer, and timestamps by unsigned
//! signature-time-stamp-token attributes whose values are nested CMS
//! structures.

use cms::cert::CertificateChoices;
use cms::content_info::ContentInfo;
use cms::signed_data::{SignedData, SignerIdentifier, SignerInfo};
use der::asn1::ObjectIdentifier;
use der::{Any, Decode, Encode, Sequence};

use crate::cert::Certificate;
use crate::error::{ExtractError, Result};

const OID_COMMITMENT_TYPE_INDICATION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.2.16");
const OID_PROOF_OF_ORIGIN: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.6.1");
const OID_PROOF_OF_RECEIPT: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.6.2");
const OID_COUNTERSIGNATURE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.6");
const OID_SIGNATURE_TIMESTAMP_TOKEN: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.2.14");

/// CommitmentTypeIndication ::= SEQUENCE {
///     commitmentTypeId OBJECT IDENTIFIER,
///     commitmentTypeQualifier SEQUENCE OPTIONAL }
#[derive(Clone, Debug, Sequence)]
struct CommitmentTypeIndication {
    commitment_type_id: ObjectIdentifier,
    #[asn1(optional = "true")]
    qualifiers: Option<Any>,
}

/// Role a signature asserts over the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureRole {
    Author,
    Repository,
    Unknown,
}

impl std::fmt::Display for SignatureRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Author => f.write_str("author"),
            Self::Repository => f.write_str("repository"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// A nested signature over the time of signing, issued by a timestamping
/// authority. Carries its own certificate set and signer.
#[derive(Debug, Clone)]
pub struct TimestampSignature {
    pub signer_certificate: Certificate,
    pub embedded_certificates: Vec<Certificate>,
}

/// A package signature: one signer, its embedded certificate set, nested
/// timestamps in attribute order, and an optional repository
/// countersignature sharing the primary's certificate set.
#[derive(Debug, Clone)]
pub struct Signature {
    pub role: SignatureRole,
    pub signer_certificate: Certificate,
    pub embedded_certificates: Vec<Certificate>,
    pub timestamps: Vec<TimestampSignature>,
    pub countersignature: Option<Box<Signature>>,
}

/// Parse a primary package signature from raw CMS bytes.
pub fn parse_signature_blob(blob: &[u8]) -> Result<Signature> {
    let content_info = ContentInfo::from_der(blob)?;
    let signed_data = signed_data_of(&content_info)?;

    let embedded = embedded_certificates(&signed_data)?;
    let signer_info = first_signer_info(&signed_data)?;
    let signer_certificate = resolve_signer_certificate(signer_info, &embedded)?;

    let countersignature = parse_countersignature(signer_info, &embedded)?;

    Ok(Signature {
        role: role_of(signer_info),
        signer_certificate,
        embedded_certificates: embedded.clone(),
        timestamps: parse_timestamps(signer_info)?,
        countersignature: countersignature.map(Box::new),
    })
}

fn signed_data_of(content_info: &ContentInfo) -> Result<SignedData> {
    // ContentInfo.content holds the SignedData SEQUENCE.
    Ok(SignedData::from_der(&content_info.content.to_der()?)?)
}

fn first_signer_info(signed_data: &SignedData) -> Result<&SignerInfo> {
    signed_data
        .signer_infos
        .0
        .iter()
        .next()
        .ok_or(ExtractError::MissingSignerInfo)
}

fn embedded_certificates(signed_data: &SignedData) -> Result<Vec<Certificate>> {
    let Some(set) = &signed_data.certificates else {
        return Ok(Vec::new());
    };
    let mut certs = Vec::new();
    for choice in set.0.iter() {
        // Attribute certificates and other choices are not chain material.
        if let CertificateChoices::Certificate(cert) = choice {
            certs.push(Certificate::from_x509(cert.clone())?);
        }
    }
    Ok(certs)
}

/// Match the signer identifier against the embedded certificate set.
fn resolve_signer_certificate(
    signer_info: &SignerInfo,
    embedded: &[Certificate],
) -> Result<Certificate> {
    let found = match &signer_info.sid {
        SignerIdentifier::IssuerAndSerialNumber(ias) => embedded.iter().find(|cert| {
            cert.issuer() == &ias.issuer && cert.serial_number() == &ias.serial_number
        }),
        SignerIdentifier::SubjectKeyIdentifier(ski) => {
            let key_id = ski.0.as_bytes();
            embedded
                .iter()
                .find(|cert| cert.subject_key_id().as_deref() == Some(key_id))
        }
    };
    found.cloned().ok_or(ExtractError::MissingSignerCertificate)
}

/// Role from the commitment-type-indication signed attribute. Absent or
/// ambiguous commitments map to `Unknown`.
fn role_of(signer_info: &SignerInfo) -> SignatureRole {
    let Some(attrs) = &signer_info.signed_attrs else {
        return SignatureRole::Unknown;
    };

    let mut origin = false;
    let mut receipt = false;
    for attr in attrs.iter() {
        if attr.oid != OID_COMMITMENT_TYPE_INDICATION {
            continue;
        }
        for value in attr.values.iter() {
            let Ok(der) = value.to_der() else { continue };
            let Ok(indication) = CommitmentTypeIndication::from_der(&der) else {
                continue;
            };
            if indication.commitment_type_id == OID_PROOF_OF_ORIGIN {
                origin = true;
            } else if indication.commitment_type_id == OID_PROOF_OF_RECEIPT {
                receipt = true;
            }
        }
    }

    match (origin, receipt) {
        (true, false) => SignatureRole::Author,
        (false, true) => SignatureRole::Repository,
        _ => SignatureRole::Unknown,
    }
}

/// Nested timestamp signatures from the unsigned
/// signature-time-stamp-token attributes, preserving attribute order.
fn parse_timestamps(signer_info: &SignerInfo) -> Result<Vec<TimestampSignature>> {
    let Some(attrs) = &signer_info.unsigned_attrs else {
        return Ok(Vec::new());
    };

    let mut timestamps = Vec::new();
    for attr in attrs.iter() {
        if attr.oid != OID_SIGNATURE_TIMESTAMP_TOKEN {
            continue;
        }
        for value in attr.values.iter() {
            let token = ContentInfo::from_der(&value.to_der()?)?;
            let signed_data = signed_data_of(&token)?;
            let embedded = embedded_certificates(&signed_data)?;
            let ts_signer = first_signer_info(&signed_data)?;
            timestamps.push(TimestampSignature {
                signer_certificate: resolve_signer_certificate(ts_signer, &embedded)?,
                embedded_certificates: embedded,
            });
        }
    }
    Ok(timestamps)
}

/// Repository countersignature from the unsigned countersignature
/// attribute. The countersigner shares the primary's certificate set and
/// carries its own timestamps.
fn parse_countersignature(
    signer_info: &SignerInfo,
    primary_embedded: &[Certificate],
) -> Result<Option<Signature>> {
    let Some(attrs) = &signer_info.unsigned_attrs else {
        return Ok(None);
    };

    for attr in attrs.iter() {
        if attr.oid != OID_COUNTERSIGNATURE {
            continue;
        }
        if let Some(value) = attr.values.iter().next() {
            let counter_signer = SignerInfo::from_der(&value.to_der()?)?;
            let signer_certificate =
                resolve_signer_certificate(&counter_signer, primary_embedded)?;
            return Ok(Some(Signature {
                role: role_of(&counter_signer),
                signer_certificate,
                embedded_certificates: primary_embedded.to_vec(),
                timestamps: parse_timestamps(&counter_signer)?,
                countersignature: None,
            }));
        }
    }
    Ok(None)
}
