//! Accumulating pool of every certificate observed in the signature
//! structure so far.
//!
//! The pool only grows during a run: certificates discovered while
//! processing the primary signature stay available when the repository
//! countersignature and each timestamp are processed.

use std::collections::HashSet;

use crate::cert::{Certificate, Fingerprint};

#[derive(Debug, Default)]
pub struct CertificatePool {
    certs: Vec<Certificate>,
    seen: HashSet<Fingerprint>,
}

impl CertificatePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a certificate, keyed by content. Returns false if it was
    /// already present.
    pub fn add(&mut self, cert: Certificate) -> bool {
        if !self.seen.insert(cert.fingerprint().clone()) {
            return false;
        }
        self.certs.push(cert);
        true
    }

    pub fn extend<I: IntoIterator<Item = Certificate>>(&mut self, certs: I) {
        for cert in certs {
            self.add(cert);
        }
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.seen.contains(fingerprint)
    }

    /// Find a candidate issuer for `cert`: a pooled certificate whose
    /// subject matches `cert`'s issuer. The certificate itself is never
    /// its own issuer here.
    pub fn find_issuer(&self, cert: &Certificate) -> Option<&Certificate> {
        self.certs
            .iter()
            .find(|c| c.fingerprint() != cert.fingerprint() && c.subject() == cert.issuer())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Certificate> {
        self.certs.iter()
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::fixtures;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_dedups_by_fingerprint() {
        let mut pool = CertificatePool::new();
        assert!(pool.add(fixtures::leaf()));
        assert!(!pool.add(fixtures::leaf()));
        assert!(pool.add(fixtures::root()));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn find_issuer_walks_subject_links() {
        let mut pool = CertificatePool::new();
        pool.extend([fixtures::leaf(), fixtures::inter(), fixtures::root()]);

        let issuer = pool.find_issuer(&fixtures::leaf()).unwrap();
        assert_eq!(issuer, &fixtures::inter());
        let issuer = pool.find_issuer(&fixtures::inter()).unwrap();
        assert_eq!(issuer, &fixtures::root());
    }

    #[test]
    fn self_signed_cert_is_not_its_own_issuer() {
        let mut pool = CertificatePool::new();
        pool.add(fixtures::other());
        assert!(pool.find_issuer(&fixtures::other()).is_none());
    }

    #[test]
    fn missing_issuer_yields_none() {
        let mut pool = CertificatePool::new();
        pool.extend([fixtures::leaf(), fixtures::root()]);
        assert!(pool.find_issuer(&fixtures::leaf()).is_none());
    }
}
