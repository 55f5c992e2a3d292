// Copyright 2023 Colin Finck <colin@reactos.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::ops::Range;

/// Byte range of `length` bytes at `offset`.
///
/// Offsets come straight from untrusted headers, so the end saturates instead of wrapping.
/// A saturated range is always rejected by a subsequent `get`.
/// Zero bytes are an empty range at the start of the namespace, whatever `offset` says.
pub(crate) fn byte_range(offset: u32, length: u32) -> Range<usize> {
    if length == 0 {
        return 0..0;
    }

    let start = offset as usize;
    let end = start.saturating_add(length as usize);
    start..end
}

/// Byte range of an array of `count` records of `record_size` bytes each at `offset`.
///
/// An array without records is an empty range at the start of the namespace, like in [`byte_range`].
pub(crate) fn array_range(offset: u32, record_size: usize, count: u32) -> Range<usize> {
    if count == 0 {
        return 0..0;
    }

    let start = offset as usize;
    let end = start.saturating_add(record_size.saturating_mul(count as usize));
    start..end
}
