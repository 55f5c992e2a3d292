// Copyright 2023 Colin Finck <colin@reactos.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use zerocopy::{FromBytes, LittleEndian, Unaligned, U32};

use crate::contract_entry::ContractEntry;

/// A record of the hash table of an [`ApiSetNamespace`].
///
/// The table is returned by [`ApiSetNamespace::hash_table`] and sorted by [`hash`](Self::hash).
///
/// [`ApiSetNamespace`]: crate::namespace::ApiSetNamespace
/// [`ApiSetNamespace::hash_table`]: crate::namespace::ApiSetNamespace::hash_table
#[derive(Debug, FromBytes, Unaligned)]
#[repr(packed)]
pub struct HashTableEntry {
    hash: U32<LittleEndian>,
    index: U32<LittleEndian>,
}

impl HashTableEntry {
    /// Returns the [`contract_hash`] of the contract name up to its last hyphen.
    pub fn hash(&self) -> u32 {
        self.hash.get()
    }

    /// Returns the position of the hashed contract in [`ApiSetNamespace::contract_entries`].
    ///
    /// [`ApiSetNamespace::contract_entries`]: crate::namespace::ApiSetNamespace::contract_entries
    pub fn index(&self) -> u32 {
        self.index.get()
    }
}

/// Result of [`ApiSetNamespace::lookup_contract`].
///
/// Besides a hit, this tells apart the ways a corrupt hash table can lead the lookup astray.
///
/// [`ApiSetNamespace::lookup_contract`]: crate::namespace::ApiSetNamespace::lookup_contract
#[derive(Debug)]
pub enum ContractLookup<'a> {
    /// The hash table points to this contract and its name matches.
    Found {
        /// Position of the contract in the contract entries.
        index: u32,
        /// The contract itself.
        contract_entry: ContractEntry<'a>,
    },
    /// No record of the hash table carries the hash of the name.
    NotFound,
    /// A record carries the hash of the name, but the contract it points to has another name.
    HashCollision {
        /// Position of the contract the record points to.
        index: u32,
    },
    /// A record carries the hash of the name, but points past the last contract.
    IndexOutOfRange {
        /// The index stored in the record.
        index: u32,
    },
}

impl<'a> ContractLookup<'a> {
    /// Returns the contract if it was found.
    pub fn into_contract_entry(self) -> Option<ContractEntry<'a>> {
        match self {
            Self::Found { contract_entry, .. } => Some(contract_entry),
            _ => None,
        }
    }

    /// Returns `true` for [`ContractLookup::Found`].
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

/// Hashes `hashed_name` the way the hash table of a namespace does.
///
/// Pass the lowercase contract name up to its last hyphen and [`ApiSetNamespace::hash_factor`].
///
/// [`ApiSetNamespace::hash_factor`]: crate::namespace::ApiSetNamespace::hash_factor
pub fn contract_hash(hashed_name: &str, hash_factor: u32) -> u32 {
    hashed_name.encode_utf16().fold(0u32, |hash, unit| {
        hash.wrapping_mul(hash_factor).wrapping_add(u32::from(unit))
    })
}
