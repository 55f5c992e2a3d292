// Copyright 2023 Colin Finck <colin@reactos.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::iter::FusedIterator;
use core::mem;
use core::ops::Range;

use bitflags::bitflags;
use nt_string::u16strle::U16StrLe;
use zerocopy::{FromBytes, LayoutVerified, LittleEndian, Unaligned, U32};

use crate::error::{ApiSetError, Result};
use crate::helpers::{array_range, byte_range};
use crate::value_entry::{ValueEntries, ValueEntryHeader};

#[derive(Debug, FromBytes, Unaligned)]
#[repr(packed)]
pub(crate) struct ContractEntryHeader {
    /// See [`ContractEntryFlags`]
    flags: U32<LittleEndian>,
    name_offset: U32<LittleEndian>,
    name_length: U32<LittleEndian>,
    hashed_length: U32<LittleEndian>,
    value_offset: U32<LittleEndian>,
    value_count: U32<LittleEndian>,
}

bitflags! {
    /// Flags returned by [`ContractEntry::flags`].
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct ContractEntryFlags: u32 {
        /// This contract is sealed, meaning the loader shall not look for a schema extension.
        const SEALED = 1 << 0;
        /// This contract is an extension (begins with "ext-" and not with "api-").
        const IS_EXTENSION = 1 << 1;
    }
}

/// Iterator over the [`ContractEntry`]s of an [`ApiSetNamespace`].
///
/// This iterator is returned by [`ApiSetNamespace::contract_entries`].
/// The count stored in the namespace header is authoritative: there is no terminating entry.
///
/// Contract Entries are sorted case-insensitively by the contract name.
///
/// [`ApiSetNamespace`]: crate::namespace::ApiSetNamespace
/// [`ApiSetNamespace::contract_entries`]: crate::namespace::ApiSetNamespace::contract_entries
#[derive(Clone, Debug)]
pub struct ContractEntries<'a> {
    namespace_bytes: &'a [u8],
    range: Range<usize>,
}

impl<'a> ContractEntries<'a> {
    pub(crate) const fn new(namespace_bytes: &'a [u8], range: Range<usize>) -> Self {
        Self {
            namespace_bytes,
            range,
        }
    }
}

impl<'a> Iterator for ContractEntries<'a> {
    type Item = ContractEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (header, _) = LayoutVerified::<_, ContractEntryHeader>::new_unaligned_from_prefix(
            self.namespace_bytes.get(self.range.clone())?,
        )?;
        let entry = ContractEntry {
            namespace_bytes: self.namespace_bytes,
            position: self.range.start,
            header,
        };
        self.range.start += mem::size_of::<ContractEntryHeader>();

        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.range.len() / mem::size_of::<ContractEntryHeader>();
        (size, Some(size))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        // `n` may come from an untrusted hash entry index.
        let bytes_to_skip = n.checked_mul(mem::size_of::<ContractEntryHeader>())?;
        self.range.start = self.range.start.checked_add(bytes_to_skip)?;
        self.next()
    }
}

impl<'a> ExactSizeIterator for ContractEntries<'a> {}
impl<'a> FusedIterator for ContractEntries<'a> {}

/// A single contract of an [`ApiSetNamespace`], e.g. `api-ms-win-core-sysinfo-l1-2-0`.
///
/// Such entries are returned by the [`ContractEntries`] iterator as well as [`ApiSetNamespace::lookup_contract`].
///
/// [`ApiSetNamespace`]: crate::namespace::ApiSetNamespace
/// [`ApiSetNamespace::lookup_contract`]: crate::namespace::ApiSetNamespace::lookup_contract
#[derive(Debug)]
pub struct ContractEntry<'a> {
    namespace_bytes: &'a [u8],
    position: usize,
    header: LayoutVerified<&'a [u8], ContractEntryHeader>,
}

impl<'a> ContractEntry<'a> {
    /// Returns flags set for this [`ContractEntry`] as specified by [`ContractEntryFlags`].
    pub fn flags(&self) -> ContractEntryFlags {
        ContractEntryFlags::from_bits_truncate(self.header.flags.get())
    }

    /// Returns the name of this contract.
    ///
    /// This name begins with either "api-" or "ext-".
    /// It does not end with a file extension.
    pub fn name(&self) -> Result<U16StrLe<'a>> {
        self.name_prefix(self.header.name_length.get())
    }

    /// Returns the part of the name that goes into the hash, i.e. the name up to its last hyphen.
    pub fn hashed_name(&self) -> Result<U16StrLe<'a>> {
        self.name_prefix(self.header.hashed_length.get())
    }

    /// Returns the number of [`ValueEntry`]s of this contract.
    ///
    /// [`ValueEntry`]: crate::value_entry::ValueEntry
    pub fn value_count(&self) -> u32 {
        self.header.value_count.get()
    }

    /// Returns an iterator over the [`ValueEntry`]s of this [`ContractEntry`].
    ///
    /// The whole array is checked against the namespace bounds before iteration starts.
    ///
    /// [`ValueEntry`]: crate::value_entry::ValueEntry
    pub fn value_entries(&self) -> Result<ValueEntries<'a>> {
        let range = array_range(
            self.header.value_offset.get(),
            mem::size_of::<ValueEntryHeader>(),
            self.value_count(),
        );

        self.namespace_bytes
            .get(range.clone())
            .ok_or(ApiSetError::ValueEntriesOutOfBounds {
                range: range.clone(),
                entry_offset: self.position,
                actual: self.namespace_bytes.len(),
            })?;

        Ok(ValueEntries::new(self.namespace_bytes, range))
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    fn name_prefix(&self, length: u32) -> Result<U16StrLe<'a>> {
        let range = byte_range(self.header.name_offset.get(), length);

        let name_bytes =
            self.namespace_bytes
                .get(range.clone())
                .ok_or(ApiSetError::NameOutOfBounds {
                    name_range: range,
                    entry_offset: self.position,
                    actual: self.namespace_bytes.len(),
                })?;

        Ok(U16StrLe(name_bytes))
    }
}
