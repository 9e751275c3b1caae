//! nupkg-certs — extract X.509 certificates from signed NuGet packages.
//!
//! Walks a package's signature tree (primary signature, repository
//! countersignature, nested timestamps), classifies each signer's trust
//! chain structurally, and writes the selected certificates to
//! fingerprint-named files.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//! use nupkg_certs::{extract, ExtractOptions};
//! use nupkg_certs::filter::FilterSelection;
//!
//! let options = ExtractOptions {
//!     filter: FilterSelection { all: true, ..Default::default() },
//!     ..Default::default()
//! };
//! let report = extract(Path::new("package.nupkg"), Path::new("certs"), &options).unwrap();
//! println!("wrote {} certificate files", report.written.len());
//! ```

pub mod cert;
pub mod chain;
pub mod error;
pub mod extract;
pub mod filter;
pub mod package;
pub mod pool;
pub mod writer;

use std::path::{Path, PathBuf};

use chain::StructuralChainBuilder;
use error::Result;
use extract::Extraction;
use filter::FilterSelection;
use package::NupkgReader;
use writer::{CertificateFormat, CertificateWriter, DiskFs};

/// Options for one extraction run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Export format for certificate files.
    pub format: CertificateFormat,
    /// Which certificates to extract. With every flag unset, nothing is.
    pub filter: FilterSelection,
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct ExtractReport {
    /// Output paths produced this run, in emission order.
    pub written: Vec<PathBuf>,
}

/// Extract certificates from the package at `package` into `out_dir`.
///
/// Fails with [`error::ExtractError::NotSigned`] when the package carries
/// no signature. A signed package that matches none of the selection
/// flags is a success with an empty report.
pub fn extract(package: &Path, out_dir: &Path, options: &ExtractOptions) -> Result<ExtractReport> {
    let reader = NupkgReader::open(package)?;
    let chain_builder = StructuralChainBuilder;
    let mut writer = CertificateWriter::new(
        out_dir.to_path_buf(),
        options.format,
        Box::new(DiskFs),
    );

    let written = Extraction::new(options.filter, &chain_builder, &mut writer).run(&reader)?;
    Ok(ExtractReport { written })
}
