//! Package container access.
//!
//! A `.nupkg` is a ZIP archive; a signed package carries its CMS
//! signature in the `.signature.p7s` entry at the archive root.

pub mod signature;

use std::fs::File;
use std::io::Read;
use std::path::Path;

pub use signature::{Signature, SignatureRole, TimestampSignature};

use crate::error::{ExtractError, Result};

/// Name of the package signature entry inside the archive.
pub const SIGNATURE_ENTRY: &str = ".signature.p7s";

/// Read access to a package's signature structure. Pluggable so the
/// traversal can be tested against scripted signatures.
pub trait PackageReader {
    fn is_signed(&self) -> bool;

    fn primary_signature(&self) -> Result<Signature>;

    /// The repository countersignature derived from the primary
    /// signature, when one is present.
    fn repository_countersignature(&self, primary: &Signature) -> Option<Signature> {
        primary.countersignature.as_deref().cloned()
    }
}

/// ZIP-backed reader for `.nupkg` files. The signature blob is read once
/// at open time.
#[derive(Debug)]
pub struct NupkgReader {
    signature_blob: Option<Vec<u8>>,
}

impl NupkgReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut archive = zip::ZipArchive::new(file)?;

        let signature_blob = match archive.by_name(SIGNATURE_ENTRY) {
            Ok(mut entry) => {
                let mut blob = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut blob)?;
                Some(blob)
            }
            Err(zip::result::ZipError::FileNotFound) => None,
            Err(err) => return Err(err.into()),
        };

        Ok(Self { signature_blob })
    }
}

impl PackageReader for NupkgReader {
    fn is_signed(&self) -> bool {
        self.signature_blob.is_some()
    }

    fn primary_signature(&self) -> Result<Signature> {
        let blob = self
            .signature_blob
            .as_deref()
            .ok_or(ExtractError::NotSigned)?;
        signature::parse_signature_blob(blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::fixtures;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from("tests/fixtures/packages").join(name)
    }

    #[test]
    fn signed_package_exposes_its_signature() {
        let reader = NupkgReader::open(&fixture("signed.nupkg")).unwrap();
        assert!(reader.is_signed());

        let primary = reader.primary_signature().unwrap();
        assert_eq!(primary.signer_certificate, fixtures::leaf());
        assert_eq!(primary.embedded_certificates.len(), 3);
    }

    #[test]
    fn unsigned_package_has_no_signature() {
        let reader = NupkgReader::open(&fixture("unsigned.nupkg")).unwrap();
        assert!(!reader.is_signed());
        assert!(matches!(
            reader.primary_signature(),
            Err(ExtractError::NotSigned)
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = NupkgReader::open(&fixture("nope.nupkg")).unwrap_err();
        assert!(matches!(err, ExtractError::Io(_)));
    }
}
