//! Best-effort, trust-disabled chain building.
//!
//! Chain construction here is purely structural: it discovers a path from
//! a leaf certificate to a self-signed terminator using only the
//! certificates accumulated in the pool. No trust evaluation, no
//! revocation checks, no network fetches.

use thiserror::Error;

use crate::cert::{Certificate, Fingerprint};
use crate::pool::CertificatePool;

/// Issuer chains longer than this are rejected as malformed.
const MAX_CHAIN_DEPTH: usize = 16;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("no pooled certificate issues {fingerprint}")]
    MissingIssuer { fingerprint: Fingerprint },

    #[error("issuer cycle detected at {fingerprint}")]
    Cycle { fingerprint: Fingerprint },

    #[error("certificate chain exceeds the maximum depth")]
    DepthExceeded,
}

/// Builds an ordered leaf-to-root path from a leaf certificate and the
/// current pool. Pluggable so tests can script chains and failures.
pub trait ChainBuilder {
    fn build(
        &self,
        leaf: &Certificate,
        pool: &CertificatePool,
    ) -> Result<Vec<Certificate>, ChainError>;
}

/// Offline path discovery by issuer/subject matching against the pool.
///
/// A build succeeds only when it reaches a self-signed certificate; a
/// missing issuer is a per-signer failure, never fatal to the run. The
/// returned chain always has at least one element and its last element is
/// the root for that chain.
#[derive(Debug, Default)]
pub struct StructuralChainBuilder;

impl ChainBuilder for StructuralChainBuilder {
    fn build(
        &self,
        leaf: &Certificate,
        pool: &CertificatePool,
    ) -> Result<Vec<Certificate>, ChainError> {
        let mut chain = vec![leaf.clone()];
        let mut current = leaf.clone();

        loop {
            if current.is_self_signed() {
                return Ok(chain);
            }
            if chain.len() >= MAX_CHAIN_DEPTH {
                return Err(ChainError::DepthExceeded);
            }

            let issuer = pool
                .find_issuer(&current)
                .ok_or_else(|| ChainError::MissingIssuer {
                    fingerprint: current.fingerprint().clone(),
                })?
                .clone();

            if chain.iter().any(|c| c.fingerprint() == issuer.fingerprint()) {
                return Err(ChainError::Cycle {
                    fingerprint: issuer.fingerprint().clone(),
                });
            }
            chain.push(issuer.clone());
            current = issuer;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::fixtures;
    use pretty_assertions::assert_eq;

    fn full_pool() -> CertificatePool {
        let mut pool = CertificatePool::new();
        pool.extend([fixtures::leaf(), fixtures::inter(), fixtures::root()]);
        pool
    }

    #[test]
    fn builds_leaf_to_root() {
        let chain = StructuralChainBuilder
            .build(&fixtures::leaf(), &full_pool())
            .unwrap();
        assert_eq!(
            chain,
            vec![fixtures::leaf(), fixtures::inter(), fixtures::root()]
        );
        assert!(chain.last().unwrap().is_self_signed());
    }

    #[test]
    fn self_signed_leaf_is_a_single_element_chain() {
        let mut pool = CertificatePool::new();
        pool.add(fixtures::other());
        let chain = StructuralChainBuilder
            .build(&fixtures::other(), &pool)
            .unwrap();
        assert_eq!(chain, vec![fixtures::other()]);
    }

    #[test]
    fn missing_intermediate_fails_the_build() {
        let mut pool = CertificatePool::new();
        pool.extend([fixtures::leaf(), fixtures::root()]);

        let err = StructuralChainBuilder
            .build(&fixtures::leaf(), &pool)
            .unwrap_err();
        match err {
            ChainError::MissingIssuer { fingerprint } => {
                assert_eq!(fingerprint, fixtures::leaf().fingerprint().clone());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unrelated_pool_certs_do_not_join_the_chain() {
        let mut pool = full_pool();
        pool.add(fixtures::other());
        let chain = StructuralChainBuilder
            .build(&fixtures::leaf(), &pool)
            .unwrap();
        assert_eq!(chain.len(), 3);
        assert!(!chain.contains(&fixtures::other()));
    }
}
