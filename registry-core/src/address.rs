//! Deterministic address derivation.
//!
//! Every record lives at an address computed purely from a namespace tag and
//! an ordered list of byte strings, scoped by the registry's program id.
//! Clients derive the same address locally before submitting a request, so
//! the registry never has to scan storage.
//!
//! ## Derivation Rule
//! For `bump` from 255 down to 0:
//!
//! ```text
//! h = SHA-256( len(ns) || ns || len(p0) || p0 || ... || bump || program_id || "ProgramDerivedAddress" )
//! ```
//!
//! The first `h` that is not a valid Ed25519 point is the address. Length
//! prefixes keep `["ab", "c"]` and `["a", "bc"]` apart.

use crate::crypto::is_on_curve;
use crate::types::{Address, Identity};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Maximum length of a single seed (namespace or part), in bytes.
pub const MAX_SEED_LEN: usize = 32;

/// Maximum number of seeds, namespace included.
pub const MAX_SEEDS: usize = 16;

/// Domain separator appended to every derivation.
const DERIVATION_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Namespace for authority records.
pub const AUTHORITY_NAMESPACE: &[u8] = b"authority";

/// Namespace for schema records.
pub const SCHEMA_NAMESPACE: &[u8] = b"schema";

/// Namespace for the process-wide registry state record.
pub const REGISTRY_NAMESPACE: &[u8] = b"registry";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerivationError {
    #[error("Seed {index} is {len} bytes, maximum is {}", MAX_SEED_LEN)]
    SeedTooLong { index: usize, len: usize },

    #[error("Too many seeds: {0}, maximum is {}", MAX_SEEDS)]
    TooManySeeds(usize),

    #[error("No bump seed yields an off-curve address")]
    NoViableBump,
}

/// Derives record addresses for one program id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressDerivator {
    program_id: Address,
}

impl AddressDerivator {
    pub fn new(program_id: Address) -> Self {
        Self { program_id }
    }

    pub fn program_id(&self) -> &Address {
        &self.program_id
    }

    /// Derive the address for `namespace` + `parts`.
    pub fn derive(&self, namespace: &[u8], parts: &[&[u8]]) -> Result<Address, DerivationError> {
        self.find(namespace, parts).map(|(address, _)| address)
    }

    /// Derive the address together with the bump seed that produced it.
    pub fn find(&self, namespace: &[u8], parts: &[&[u8]]) -> Result<(Address, u8), DerivationError> {
        validate_seeds(namespace, parts)?;

        for bump in (0..=u8::MAX).rev() {
            let candidate = self.hash_seeds(namespace, parts, bump);
            if !is_on_curve(&candidate) {
                tracing::debug!(
                    "Derived {} under namespace {:?} with bump {}",
                    hex::encode(candidate),
                    String::from_utf8_lossy(namespace),
                    bump
                );
                return Ok((Address(candidate), bump));
            }
        }

        Err(DerivationError::NoViableBump)
    }

    /// Address of the authority record for `authority`.
    pub fn authority(&self, authority: &Identity) -> Result<Address, DerivationError> {
        self.derive(AUTHORITY_NAMESPACE, &[authority.as_bytes()])
    }

    /// Address (UID) of the schema `name` registered by `deployer`.
    pub fn schema(&self, deployer: &Identity, name: &str) -> Result<Address, DerivationError> {
        self.derive(SCHEMA_NAMESPACE, &[deployer.as_bytes(), name.as_bytes()])
    }

    /// Address of the registry state record.
    pub fn registry_state(&self) -> Result<Address, DerivationError> {
        self.derive(REGISTRY_NAMESPACE, &[])
    }

    fn hash_seeds(&self, namespace: &[u8], parts: &[&[u8]], bump: u8) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for seed in std::iter::once(namespace).chain(parts.iter().copied()) {
            // Seeds are bounded by MAX_SEED_LEN, so the length fits a byte.
            hasher.update([seed.len() as u8]);
            hasher.update(seed);
        }
        hasher.update([bump]);
        hasher.update(self.program_id.as_bytes());
        hasher.update(DERIVATION_MARKER);
        hasher.finalize().into()
    }
}

fn validate_seeds(namespace: &[u8], parts: &[&[u8]]) -> Result<(), DerivationError> {
    let count = parts.len() + 1;
    if count > MAX_SEEDS {
        return Err(DerivationError::TooManySeeds(count));
    }

    for (index, seed) in std::iter::once(namespace).chain(parts.iter().copied()).enumerate() {
        if seed.len() > MAX_SEED_LEN {
            return Err(DerivationError::SeedTooLong { index, len: seed.len() });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn derivator() -> AddressDerivator {
        AddressDerivator::new(Address([7u8; 32]))
    }

    #[test]
    fn test_schema_address_determinism() {
        let d = derivator();
        let deployer = Identity([1u8; 32]);

        let a = d.schema(&deployer, "s1").unwrap();
        let b = d.schema(&deployer, "s1").unwrap();
        let c = d.schema(&deployer, "s2").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_namespaces_are_separated() {
        let d = derivator();
        let id = Identity([9u8; 32]);

        let as_authority = d.authority(&id).unwrap();
        let as_schema_part = d.derive(SCHEMA_NAMESPACE, &[id.as_bytes()]).unwrap();

        assert_ne!(as_authority, as_schema_part);
    }

    #[test]
    fn test_part_boundaries_matter() {
        let d = derivator();
        let a = d.derive(b"ns", &[b"ab", b"c"]).unwrap();
        let b = d.derive(b"ns", &[b"a", b"bc"]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_program_id_scopes_addresses() {
        let id = Identity([3u8; 32]);
        let a = AddressDerivator::new(Address([1u8; 32])).authority(&id).unwrap();
        let b = AddressDerivator::new(Address([2u8; 32])).authority(&id).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_derived_address_is_off_curve() {
        let (address, _bump) = derivator().find(b"schema", &[b"anything"]).unwrap();
        assert!(!is_on_curve(address.as_bytes()));
    }

    #[test]
    fn test_seed_too_long() {
        let long_name = "x".repeat(MAX_SEED_LEN + 1);
        let err = derivator().schema(&Identity([1u8; 32]), &long_name).unwrap_err();
        assert_eq!(err, DerivationError::SeedTooLong { index: 2, len: MAX_SEED_LEN + 1 });
    }

    #[test]
    fn test_seed_at_limit_is_accepted() {
        let name = "x".repeat(MAX_SEED_LEN);
        assert!(derivator().schema(&Identity([1u8; 32]), &name).is_ok());
    }

    #[test]
    fn test_limit_errors_report_constants() {
        let err = DerivationError::SeedTooLong { index: 1, len: 40 };
        assert_eq!(err.to_string(), format!("Seed 1 is 40 bytes, maximum is {MAX_SEED_LEN}"));

        let err = DerivationError::TooManySeeds(20);
        assert_eq!(err.to_string(), format!("Too many seeds: 20, maximum is {MAX_SEEDS}"));
    }

    #[test]
    fn test_too_many_seeds() {
        let parts: Vec<&[u8]> = vec![&b"p"[..]; MAX_SEEDS];
        let err = derivator().derive(b"ns", &parts).unwrap_err();
        assert_eq!(err, DerivationError::TooManySeeds(MAX_SEEDS + 1));
    }

    proptest! {
        #[test]
        fn prop_derivation_is_deterministic(
            ns in proptest::collection::vec(any::<u8>(), 0..=MAX_SEED_LEN),
            part in proptest::collection::vec(any::<u8>(), 0..=MAX_SEED_LEN),
        ) {
            let d = derivator();
            let first = d.find(&ns, &[part.as_slice()]).unwrap();
            let second = d.find(&ns, &[part.as_slice()]).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_distinct_names_give_distinct_addresses(
            a in "[a-z0-9-]{1,32}",
            b in "[a-z0-9-]{1,32}",
        ) {
            prop_assume!(a != b);
            let d = derivator();
            let deployer = Identity([5u8; 32]);
            prop_assert_ne!(d.schema(&deployer, &a).unwrap(), d.schema(&deployer, &b).unwrap());
        }
    }
}
