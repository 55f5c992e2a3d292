// Copyright 2023 Colin Finck <colin@reactos.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::iter::FusedIterator;
use core::mem;
use core::ops::Range;

use nt_string::u16strle::U16StrLe;
use zerocopy::{FromBytes, LayoutVerified, LittleEndian, Unaligned, U32};

use crate::error::{ApiSetError, Result};
use crate::helpers::byte_range;

#[derive(Debug, FromBytes, Unaligned)]
#[repr(packed)]
pub(crate) struct ValueEntryHeader {
    flags: U32<LittleEndian>,
    name_offset: U32<LittleEndian>,
    name_length: U32<LittleEndian>,
    value_offset: U32<LittleEndian>,
    value_length: U32<LittleEndian>,
}

/// Iterator over the [`ValueEntry`]s of a [`ContractEntry`].
///
/// This iterator is returned by [`ContractEntry::value_entries`].
/// It yields exactly as many entries as the contract entry announces, in the order they are laid out.
///
/// The first entry is the default mapping without an alias.
/// Further entries redirect the contract for the importing module named by their alias.
///
/// [`ContractEntry`]: crate::contract_entry::ContractEntry
/// [`ContractEntry::value_entries`]: crate::contract_entry::ContractEntry::value_entries
#[derive(Clone, Debug)]
pub struct ValueEntries<'a> {
    namespace_bytes: &'a [u8],
    range: Range<usize>,
}

impl<'a> ValueEntries<'a> {
    pub(crate) const fn new(namespace_bytes: &'a [u8], range: Range<usize>) -> Self {
        Self {
            namespace_bytes,
            range,
        }
    }
}

impl<'a> Iterator for ValueEntries<'a> {
    type Item = ValueEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (header, _) = LayoutVerified::<_, ValueEntryHeader>::new_unaligned_from_prefix(
            self.namespace_bytes.get(self.range.clone())?,
        )?;
        let entry = ValueEntry {
            namespace_bytes: self.namespace_bytes,
            position: self.range.start,
            header,
        };
        self.range.start += mem::size_of::<ValueEntryHeader>();

        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.range.len() / mem::size_of::<ValueEntryHeader>();
        (size, Some(size))
    }
}

impl<'a> ExactSizeIterator for ValueEntries<'a> {}
impl<'a> FusedIterator for ValueEntries<'a> {}

/// A single implementation of a [`ContractEntry`].
///
/// Such entries are returned by the [`ValueEntries`] iterator.
/// Each entry carries its own offsets and lengths for both the alias and the target name.
///
/// [`ContractEntry`]: crate::contract_entry::ContractEntry
#[derive(Debug)]
pub struct ValueEntry<'a> {
    namespace_bytes: &'a [u8],
    position: usize,
    header: LayoutVerified<&'a [u8], ValueEntryHeader>,
}

impl<'a> ValueEntry<'a> {
    /// Returns flags set for this [`ValueEntry`].
    ///
    /// These flags are undocumented, so a plain [`u32`] is returned.
    pub fn flags(&self) -> u32 {
        self.header.flags.get()
    }

    /// Returns `true` if this entry carries an alias.
    pub fn has_alias(&self) -> bool {
        self.header.name_length.get() != 0
    }

    /// Returns the alias of this mapping, i.e. the name of the importing module it applies to.
    ///
    /// The alias is empty if the entry stores a zero length for it.
    /// The offset is not looked at in that case.
    pub fn alias(&self) -> Result<U16StrLe<'a>> {
        if !self.has_alias() {
            return Ok(U16StrLe(&[]));
        }

        self.string_at(self.header.name_offset.get(), self.header.name_length.get())
    }

    /// Returns the name of the real DLL this contract is mapped to.
    ///
    /// It ends with the file extension of that DLL.
    pub fn target(&self) -> Result<U16StrLe<'a>> {
        self.string_at(
            self.header.value_offset.get(),
            self.header.value_length.get(),
        )
    }

    fn string_at(&self, offset: u32, length: u32) -> Result<U16StrLe<'a>> {
        let range = byte_range(offset, length);

        let bytes = self
            .namespace_bytes
            .get(range.clone())
            .ok_or(ApiSetError::NameOutOfBounds {
                name_range: range,
                entry_offset: self.position,
                actual: self.namespace_bytes.len(),
            })?;

        Ok(U16StrLe(bytes))
    }
}
