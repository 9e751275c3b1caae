//! Signature traversal: walks a package's signature tree and drives
//! classification and output.
//!
//! Order is fixed: primary signature first, then the optional repository
//! countersignature, then each signature's timestamps in the order they
//! appear. All of it feeds one accumulating certificate pool.

use std::path::PathBuf;

use crate::cert::Certificate;
use crate::chain::ChainBuilder;
use crate::error::{ExtractError, Result};
use crate::filter::FilterSelection;
use crate::package::{PackageReader, Signature, SignatureRole};
use crate::pool::CertificatePool;
use crate::writer::CertificateWriter;

/// One extraction run over a single package.
pub struct Extraction<'a> {
    filter: FilterSelection,
    pool: CertificatePool,
    chain_builder: &'a dyn ChainBuilder,
    writer: &'a mut CertificateWriter,
}

impl<'a> Extraction<'a> {
    pub fn new(
        filter: FilterSelection,
        chain_builder: &'a dyn ChainBuilder,
        writer: &'a mut CertificateWriter,
    ) -> Self {
        Self {
            filter: filter.expanded(),
            pool: CertificatePool::new(),
            chain_builder,
            writer,
        }
    }

    /// Walk the package's signatures and write every selected
    /// certificate. Returns the paths produced this run.
    pub fn run(&mut self, reader: &dyn PackageReader) -> Result<Vec<PathBuf>> {
        if !reader.is_signed() {
            tracing::warn!("the package is not signed; no certificates will be extracted");
            return Err(ExtractError::NotSigned);
        }

        let primary = reader.primary_signature()?;
        self.pool
            .extend(primary.embedded_certificates.iter().cloned());
        self.process_signature(&primary)?;

        // The countersignature shares the pool already enriched by the
        // primary signature.
        if let Some(counter) = reader.repository_countersignature(&primary) {
            self.process_signature(&counter)?;
        }

        if self.writer.written_paths().is_empty() {
            tracing::warn!(
                "no certificates were written; consider using --all or a combination of the \
                 more specific selection flags"
            );
        }

        Ok(self.writer.written_paths().to_vec())
    }

    fn process_signature(&mut self, signature: &Signature) -> Result<()> {
        let role = match signature.role {
            SignatureRole::Author => {
                if !self.filter.author {
                    return Ok(());
                }
                tracing::debug!("reading the author signature");
                "author"
            }
            SignatureRole::Repository => {
                if !self.filter.repository {
                    return Ok(());
                }
                tracing::debug!("reading the repository signature");
                "repository"
            }
            SignatureRole::Unknown => {
                tracing::warn!("ignoring a package signature with an unknown role");
                return Ok(());
            }
        };

        if self.filter.code_signing {
            tracing::debug!("reading a code signing signature");
            self.extract_signer(
                &format!("{role} code signing"),
                &signature.signer_certificate,
            )?;
        }

        if self.filter.timestamping {
            for timestamp in &signature.timestamps {
                self.pool
                    .extend(timestamp.embedded_certificates.iter().cloned());
                tracing::debug!("reading a timestamper signature");
                self.extract_signer(
                    &format!("{role} timestamper"),
                    &timestamp.signer_certificate,
                )?;
            }
        }

        Ok(())
    }

    /// Classify around one signer's leaf certificate and emit what the
    /// filter selects.
    fn extract_signer(&mut self, label: &str, leaf: &Certificate) -> Result<()> {
        // The leaf is emitted whether or not the chain can be built.
        if self.filter.leaf {
            self.writer.save(&format!("{label} leaf"), leaf)?;
        }

        let chain = match self.chain_builder.build(leaf, &self.pool) {
            Ok(chain) => chain,
            Err(err) => {
                tracing::warn!(
                    fingerprint = %leaf.fingerprint(),
                    error = %err,
                    "the chain for this leaf certificate could not be built; no intermediate \
                     or root certificates in its chain will be checked"
                );
                return Ok(());
            }
        };

        let Some(root) = chain.last().cloned() else {
            return Ok(());
        };

        for cert in &chain {
            if cert == leaf {
                continue;
            }
            if cert == &root && self.filter.root {
                self.writer.save(&format!("{label} root"), cert)?;
                continue;
            }
            // When the root flag is unset the chain root falls through to
            // the intermediate gate. Long-standing behavior, kept as is;
            // pinned by root_without_root_flag_is_emitted_as_intermediate.
            if self.filter.intermediate {
                self.writer.save(&format!("{label} intermediate"), cert)?;
            }
        }

        Ok(())
    }
}
