//! Key-value ledger the registry stores its records in.
//!
//! The host execution layer owns the real ledger and serializes transactions
//! against it. The registry only needs exact-address reads and writes plus an
//! atomic insert-if-absent, which is what find-or-create and one-shot schema
//! registration are built on.

use crate::types::Address;
use std::collections::BTreeMap;
use thiserror::Error;

/// Largest record the ledger accepts, in bytes.
pub const MAX_RECORD_LEN: usize = 10 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Address {0} is already occupied")]
    Occupied(Address),

    #[error("Record of {len} bytes exceeds the {}-byte limit", MAX_RECORD_LEN)]
    RecordTooLarge { len: usize },
}

/// Storage interface consumed by the registry.
///
/// Lookups are address-exact; there is no enumeration.
pub trait Ledger {
    /// Read the record stored at `address`.
    fn get(&self, address: &Address) -> Option<Vec<u8>>;

    /// Overwrite (or create) the record at `address`.
    fn put(&mut self, address: Address, data: Vec<u8>) -> Result<(), LedgerError>;

    /// Whether a record exists at `address`.
    fn exists(&self, address: &Address) -> bool;

    /// Store `data` at `address` only if nothing is there yet.
    ///
    /// Must be a single atomic check-and-insert.
    fn create(&mut self, address: Address, data: Vec<u8>) -> Result<(), LedgerError>;
}

/// In-process ledger backed by a `BTreeMap`.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedger {
    records: BTreeMap<Address, Vec<u8>>,
    allocations: usize,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times storage was allocated for a new address.
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn check_size(data: &[u8]) -> Result<(), LedgerError> {
    if data.len() > MAX_RECORD_LEN {
        return Err(LedgerError::RecordTooLarge { len: data.len() });
    }
    Ok(())
}

impl Ledger for InMemoryLedger {
    fn get(&self, address: &Address) -> Option<Vec<u8>> {
        self.records.get(address).cloned()
    }

    fn put(&mut self, address: Address, data: Vec<u8>) -> Result<(), LedgerError> {
        check_size(&data)?;
        if self.records.insert(address, data).is_none() {
            self.allocations += 1;
        }
        Ok(())
    }

    fn exists(&self, address: &Address) -> bool {
        self.records.contains_key(address)
    }

    fn create(&mut self, address: Address, data: Vec<u8>) -> Result<(), LedgerError> {
        use std::collections::btree_map::Entry;

        check_size(&data)?;
        match self.records.entry(address) {
            Entry::Occupied(_) => Err(LedgerError::Occupied(address)),
            Entry::Vacant(slot) => {
                slot.insert(data);
                self.allocations += 1;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_is_one_shot() {
        let mut ledger = InMemoryLedger::new();
        let address = Address([1u8; 32]);

        ledger.create(address, vec![1]).unwrap();
        let err = ledger.create(address, vec![2]).unwrap_err();

        assert_eq!(err, LedgerError::Occupied(address));
        assert_eq!(ledger.get(&address), Some(vec![1]));
        assert_eq!(ledger.allocations(), 1);
    }

    #[test]
    fn test_put_overwrites_without_new_allocation() {
        let mut ledger = InMemoryLedger::new();
        let address = Address([2u8; 32]);

        ledger.put(address, vec![1]).unwrap();
        ledger.put(address, vec![2]).unwrap();

        assert_eq!(ledger.get(&address), Some(vec![2]));
        assert_eq!(ledger.allocations(), 1);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_oversized_record_rejected() {
        let mut ledger = InMemoryLedger::new();
        let address = Address([3u8; 32]);

        let err = ledger.create(address, vec![0u8; MAX_RECORD_LEN + 1]).unwrap_err();

        assert_eq!(err, LedgerError::RecordTooLarge { len: MAX_RECORD_LEN + 1 });
        assert!(!ledger.exists(&address));
        assert!(ledger.is_empty());
    }
}
