//! Idempotent certificate file output.
//!
//! Files are named `<fingerprint>.<ext>` inside the output directory. A
//! path is written at most once per run, and files that already exist on
//! disk are never clobbered.

use std::path::{Path, PathBuf};

use crate::cert::Certificate;
use crate::error::Result;

/// Export format for certificate files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CertificateFormat {
    /// Binary DER encoding, written as `.cer`.
    #[default]
    Cer,
    /// PEM text (base64 DER with armor lines), written as `.pem`.
    Pem,
}

impl CertificateFormat {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cer" | "der" => Some(Self::Cer),
            "pem" => Some(Self::Pem),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Cer => "cer",
            Self::Pem => "pem",
        }
    }
}

impl std::fmt::Display for CertificateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Filesystem capability behind the writer, so tests can substitute an
/// in-memory double.
pub trait Filesystem {
    fn exists(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> std::io::Result<()>;
    fn write(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()>;
}

/// Real filesystem.
#[derive(Debug, Default)]
pub struct DiskFs;

impl Filesystem for DiskFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        std::fs::write(path, bytes)
    }
}

/// Writes accepted certificates under the output directory, deduplicating
/// by target path within one run.
pub struct CertificateWriter {
    out_dir: PathBuf,
    format: CertificateFormat,
    fs: Box<dyn Filesystem>,
    written: Vec<PathBuf>,
}

impl CertificateWriter {
    pub fn new(out_dir: PathBuf, format: CertificateFormat, fs: Box<dyn Filesystem>) -> Self {
        Self {
            out_dir,
            format,
            fs,
            written: Vec::new(),
        }
    }

    /// Paths recorded so far this run, in emission order.
    pub fn written_paths(&self) -> &[PathBuf] {
        &self.written
    }

    /// Persist one certificate. The label is for logging only.
    ///
    /// Repeat requests for the same fingerprint+format are no-ops, as are
    /// writes to paths that already exist on disk from an earlier run.
    /// Filesystem errors are fatal and propagate.
    pub fn save(&mut self, label: &str, cert: &Certificate) -> Result<()> {
        tracing::info!(
            label,
            fingerprint = %cert.fingerprint(),
            "saving certificate"
        );

        let file_name = format!("{}.{}", cert.fingerprint(), self.format.extension());
        let path = self.out_dir.join(file_name);
        if self.written.contains(&path) {
            return Ok(());
        }

        if !self.fs.exists(&self.out_dir) {
            self.fs.create_dir_all(&self.out_dir)?;
        }

        self.written.push(path.clone());

        if self.fs.exists(&path) {
            tracing::debug!(path = %path.display(), "skipping write because the file exists");
            return Ok(());
        }

        let bytes = match self.format {
            CertificateFormat::Cer => cert.to_der().to_vec(),
            CertificateFormat::Pem => cert.to_pem()?.into_bytes(),
        };
        self.fs.write(&path, &bytes)?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::memfs::MemFs;
    use super::*;
    use crate::cert::fixtures;
    use pretty_assertions::assert_eq;

    fn writer(format: CertificateFormat, fs: &MemFs) -> CertificateWriter {
        CertificateWriter::new(PathBuf::from("out"), format, Box::new(fs.clone()))
    }

    #[test]
    fn writes_der_bytes_under_fingerprint_name() {
        let fs = MemFs::new();
        let mut writer = writer(CertificateFormat::Cer, &fs);
        let leaf = fixtures::leaf();

        writer.save("author code signing leaf", &leaf).unwrap();

        let path = PathBuf::from("out").join(format!("{}.cer", leaf.fingerprint()));
        assert_eq!(fs.file(&path).unwrap(), leaf.to_der());
        assert_eq!(writer.written_paths(), &[path]);
    }

    #[test]
    fn pem_format_writes_armored_text() {
        let fs = MemFs::new();
        let mut writer = writer(CertificateFormat::Pem, &fs);
        let root = fixtures::root();

        writer.save("author code signing root", &root).unwrap();

        let path = PathBuf::from("out").join(format!("{}.pem", root.fingerprint()));
        let text = String::from_utf8(fs.file(&path).unwrap()).unwrap();
        assert!(text.starts_with("-----BEGIN CERTIFICATE-----"));
    }

    #[test]
    fn repeat_saves_are_single_writes() {
        let fs = MemFs::new();
        let mut writer = writer(CertificateFormat::Cer, &fs);
        let leaf = fixtures::leaf();

        writer.save("author code signing leaf", &leaf).unwrap();
        writer.save("author timestamper leaf", &leaf).unwrap();

        assert_eq!(fs.file_count(), 1);
        assert_eq!(writer.written_paths().len(), 1);
    }

    #[test]
    fn preexisting_files_are_left_untouched() {
        let fs = MemFs::new();
        let leaf = fixtures::leaf();
        let path = PathBuf::from("out").join(format!("{}.cer", leaf.fingerprint()));
        fs.seed_file(&path, b"sentinel from a previous run");

        let mut writer = writer(CertificateFormat::Cer, &fs);
        writer.save("author code signing leaf", &leaf).unwrap();

        assert_eq!(fs.file(&path).unwrap(), b"sentinel from a previous run");
        // Still counted as produced for this run.
        assert_eq!(writer.written_paths(), &[path]);
    }

    #[test]
    fn format_parsing_is_lenient() {
        assert_eq!(
            CertificateFormat::from_str_lenient("CER"),
            Some(CertificateFormat::Cer)
        );
        assert_eq!(
            CertificateFormat::from_str_lenient("Pem"),
            Some(CertificateFormat::Pem)
        );
        assert_eq!(CertificateFormat::from_str_lenient("p12"), None);
    }
}
