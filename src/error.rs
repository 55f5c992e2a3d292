// Copyright 2023 Colin Finck <colin@reactos.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::ops::Range;

use displaydoc::Display;

/// Central result type of apiset-namespace.
pub type Result<T, E = ApiSetError> = core::result::Result<T, E>;

/// Central error type of apiset-namespace.
///
/// Every offset read from the namespace is checked against the supplied bytes.
/// A variant of this type is returned instead of touching memory outside of them.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum ApiSetError {
    /// Did not find the ".apiset" section in the PE file
    ApiSetSectionNotFound,
    /// The ".apiset" section in the PE file references data that is out of bounds
    ApiSetSectionOutOfBounds,
    /// Tried to read the contract entries from byte range {range:?}, but the namespace only has a size of {actual} bytes
    ContractEntriesOutOfBounds {
        /// Start..end range where the contract entries were expected, as byte offsets relative to the start of the namespace.
        range: Range<usize>,
        /// Actual size of the namespace.
        actual: usize,
    },
    /// Tried to read the hash table from byte range {range:?}, but the namespace only has a size of {actual} bytes
    HashTableOutOfBounds {
        /// Start..end range where the hash table was expected, as byte offsets relative to the start of the namespace.
        range: Range<usize>,
        /// Actual size of the namespace.
        actual: usize,
    },
    /// Tried to read {expected} bytes for the namespace header, but only {actual} bytes are available
    InvalidHeaderSize {
        /// Size in bytes of the namespace header.
        expected: usize,
        /// Actual size in bytes of the provided slice.
        actual: usize,
    },
    /// Tried to read the name at byte range {name_range:?} of the entry at byte {entry_offset}, but the namespace only has a size of {actual} bytes
    NameOutOfBounds {
        /// Range of bytes where the name was expected.
        name_range: Range<usize>,
        /// Byte offset of the entry inside the namespace.
        entry_offset: usize,
        /// Actual size of the namespace.
        actual: usize,
    },
    /// The namespace schema version ({version}) is unsupported
    UnsupportedVersion {
        /// Version number reported by the namespace header.
        version: u32,
    },
    /// Tried to read the value entries of the contract entry at byte {entry_offset} from byte range {range:?}, but the namespace only has a size of {actual} bytes
    ValueEntriesOutOfBounds {
        /// Start..end range where the value entries were expected, as byte offsets relative to the start of the namespace.
        range: Range<usize>,
        /// Byte offset of the owning contract entry inside the namespace.
        entry_offset: usize,
        /// Actual size of the namespace.
        actual: usize,
    },
}

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
impl std::error::Error for ApiSetError {}
