// Copyright 2023 Colin Finck <colin@reactos.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::mem;

use bitflags::bitflags;
use zerocopy::{FromBytes, LayoutVerified, LittleEndian, Unaligned, U32};

use crate::contract_entry::{ContractEntries, ContractEntry, ContractEntryHeader};
use crate::error::{ApiSetError, Result};
use crate::hash_table::{contract_hash, ContractLookup, HashTableEntry};
use crate::helpers::array_range;

#[derive(Debug, FromBytes, Unaligned)]
#[repr(packed)]
struct NamespaceHeader {
    version: U32<LittleEndian>,
    size: U32<LittleEndian>,
    /// See [`NamespaceFlags`]
    flags: U32<LittleEndian>,
    count: U32<LittleEndian>,
    entry_offset: U32<LittleEndian>,
    hash_offset: U32<LittleEndian>,
    hash_factor: U32<LittleEndian>,
}

/// Layout version of an API Set Namespace.
///
/// The layouts differ structurally between versions.
/// See <https://www.geoffchappell.com/studies/windows/win32/apisetschema/index.htm>
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum SchemaVersion {
    /// Version 6, used since Windows 10.
    V6,
}

impl SchemaVersion {
    /// Returns the version number as stored in the namespace header.
    pub const fn raw(self) -> u32 {
        match self {
            Self::V6 => 6,
        }
    }
}

impl TryFrom<u32> for SchemaVersion {
    type Error = ApiSetError;

    fn try_from(version: u32) -> Result<Self> {
        match version {
            6 => Ok(Self::V6),
            _ => Err(ApiSetError::UnsupportedVersion { version }),
        }
    }
}

bitflags! {
    /// Flags returned by [`ApiSetNamespace::flags`].
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct NamespaceFlags: u32 {
        /// This namespace is sealed, meaning the loader shall not look for schema extensions.
        const SEALED = 1 << 0;
        /// This namespace is a schema extension.
        const IS_EXTENSION = 1 << 1;
    }
}

/// Bounds-checked view of an API Set Namespace.
///
/// All offsets inside the namespace are relative to its first byte.
/// Every access through this view and the entries it hands out is checked against the namespace bytes,
/// so a corrupt offset results in an [`ApiSetError`] instead of a read outside of them.
#[derive(Debug)]
pub struct ApiSetNamespace<'a> {
    namespace_bytes: &'a [u8],
    header: LayoutVerified<&'a [u8], NamespaceHeader>,
}

impl<'a> ApiSetNamespace<'a> {
    /// Returns the number of contracts in this namespace.
    pub fn count(&self) -> u32 {
        self.header.count.get()
    }

    /// Returns the multiplier of the [`contract_hash`] used by the hash table.
    pub fn hash_factor(&self) -> u32 {
        self.header.hash_factor.get()
    }

    /// Returns flags set for this [`ApiSetNamespace`] as specified by [`NamespaceFlags`].
    pub fn flags(&self) -> NamespaceFlags {
        NamespaceFlags::from_bits_truncate(self.header.flags.get())
    }

    /// Returns the size in bytes of the namespace as stored in its header.
    pub fn size(&self) -> u32 {
        self.header.size.get()
    }

    /// Returns the layout version of this namespace.
    pub fn version(&self) -> SchemaVersion {
        // Checked in `try_from_namespace_bytes`.
        SchemaVersion::V6
    }

    /// Returns the raw bytes this view covers.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.namespace_bytes
    }

    /// Returns an iterator over the [`ContractEntry`] elements of this [`ApiSetNamespace`].
    ///
    /// Alternatively, you can look up a specific contract via [`lookup_contract`](Self::lookup_contract).
    pub fn contract_entries(&self) -> Result<ContractEntries<'a>> {
        let range = array_range(
            self.header.entry_offset.get(),
            mem::size_of::<ContractEntryHeader>(),
            self.count(),
        );

        self.namespace_bytes.get(range.clone()).ok_or(
            ApiSetError::ContractEntriesOutOfBounds {
                range: range.clone(),
                actual: self.namespace_bytes.len(),
            },
        )?;

        Ok(ContractEntries::new(self.namespace_bytes, range))
    }

    /// Returns the hash table of this [`ApiSetNamespace`], one [`HashTableEntry`] per contract.
    pub fn hash_table(&self) -> Result<&'a [HashTableEntry]> {
        let range = array_range(
            self.header.hash_offset.get(),
            mem::size_of::<HashTableEntry>(),
            self.count(),
        );
        let out_of_bounds = || ApiSetError::HashTableOutOfBounds {
            range: range.clone(),
            actual: self.namespace_bytes.len(),
        };

        let table_bytes = self
            .namespace_bytes
            .get(range.clone())
            .ok_or_else(out_of_bounds)?;
        let table = LayoutVerified::<_, [HashTableEntry]>::new_slice_unaligned(table_bytes)
            .ok_or_else(out_of_bounds)?;

        Ok(table.into_slice())
    }

    /// Looks up a contract through the hash table of the namespace, without walking all contracts.
    ///
    /// `contract_name` is compared case-insensitively and may carry a ".dll" extension.
    /// Like the loader, only the part up to the last hyphen is significant, so
    /// `api-ms-win-core-sysinfo-l1-2-0` also finds a contract stored as `api-ms-win-core-sysinfo-l1-2-3`.
    /// A name without any hyphen is never found.
    pub fn lookup_contract(&self, contract_name: &str) -> Result<ContractLookup<'a>> {
        let lowercase_name = contract_name.to_ascii_lowercase();
        let name = lowercase_name
            .strip_suffix(".dll")
            .unwrap_or(&lowercase_name);

        let hashed_name = match name.rsplit_once('-') {
            Some((hashed_name, _)) => hashed_name,
            None => return Ok(ContractLookup::NotFound),
        };

        let hash = contract_hash(hashed_name, self.hash_factor());
        let hash_table = self.hash_table()?;
        let index = match hash_table.binary_search_by_key(&hash, HashTableEntry::hash) {
            Ok(position) => hash_table[position].index(),
            Err(_) => return Ok(ContractLookup::NotFound),
        };

        let contract_entry = match self.contract_entries()?.nth(index as usize) {
            Some(contract_entry) => contract_entry,
            None => return Ok(ContractLookup::IndexOutOfRange { index }),
        };

        if contract_entry.hashed_name()? == hashed_name {
            Ok(ContractLookup::Found {
                index,
                contract_entry,
            })
        } else {
            Ok(ContractLookup::HashCollision { index })
        }
    }

    /// Reads the raw version number from the header of the namespace in `namespace_bytes`.
    ///
    /// Use this to pick a decoder before constructing a view.
    pub fn read_version(namespace_bytes: &[u8]) -> Result<u32> {
        let header = header_from_prefix(namespace_bytes)?;
        Ok(header.version.get())
    }

    /// Creates an [`ApiSetNamespace`] from an API Set Map file opened via the `pelite` crate.
    ///
    /// The namespace is stored in the `.apiset` section of `apisetschema.dll`.
    /// If you already have the raw bytes of the namespace, use [`try_from_namespace_bytes`](Self::try_from_namespace_bytes).
    #[cfg(feature = "pelite")]
    #[cfg_attr(docsrs, doc(cfg(feature = "pelite")))]
    pub fn try_from_pe64<T>(pe64: T) -> Result<Self>
    where
        T: pelite::pe64::Pe<'a>,
    {
        let apiset_section_header = pe64
            .section_headers()
            .by_name(".apiset")
            .ok_or(ApiSetError::ApiSetSectionNotFound)?;
        let section_bytes = pe64
            .get_section_bytes(apiset_section_header)
            .map_err(|_| ApiSetError::ApiSetSectionOutOfBounds)?;
        Self::try_from_namespace_bytes(section_bytes)
    }

    /// Creates an [`ApiSetNamespace`] from the raw bytes of a namespace, starting with its header.
    ///
    /// If the header announces a size smaller than `namespace_bytes`, the view is limited to that size.
    /// A size that does not even cover the header is ignored.
    pub fn try_from_namespace_bytes(namespace_bytes: &'a [u8]) -> Result<Self> {
        let header = header_from_prefix(namespace_bytes)?;
        SchemaVersion::try_from(header.version.get())?;

        let size = header.size.get() as usize;
        let namespace_bytes = if size >= mem::size_of::<NamespaceHeader>() {
            namespace_bytes.get(..size).unwrap_or(namespace_bytes)
        } else {
            namespace_bytes
        };

        Ok(Self {
            namespace_bytes,
            header,
        })
    }
}

fn header_from_prefix(namespace_bytes: &[u8]) -> Result<LayoutVerified<&[u8], NamespaceHeader>> {
    let (header, _) = LayoutVerified::<_, NamespaceHeader>::new_unaligned_from_prefix(
        namespace_bytes,
    )
    .ok_or(ApiSetError::InvalidHeaderSize {
        expected: mem::size_of::<NamespaceHeader>(),
        actual: namespace_bytes.len(),
    })?;

    Ok(header)
}
