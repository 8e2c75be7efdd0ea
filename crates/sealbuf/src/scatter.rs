// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! ScatterList - ordered (region, offset, length) entries of one export.
//!
//! Entry order is request order. Entry `k` starts at the sum of the lengths
//! of entries `0..k` in the exported range. Entries are never merged,
//! reordered, or deduplicated, even when they overlap in the same region.

use std::sync::Arc;

use sealbuf_region::SealedRegion;

use crate::validate::ValidatedItem;

/// One contiguous range of a source region.
#[derive(Debug, Clone)]
pub struct ScatterEntry {
    region: Arc<SealedRegion>,
    offset: u64,
    length: u64,
}

impl ScatterEntry {
    /// The source region.
    pub fn region(&self) -> &SealedRegion {
        &self.region
    }

    /// Byte offset into the source region.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Length in bytes.
    pub fn length(&self) -> u64 {
        self.length
    }
}

/// Ordered scatter-gather list with a prefix-sum table.
#[derive(Debug, Clone)]
pub struct ScatterList {
    entries: Vec<ScatterEntry>,
    starts: Vec<u64>,
    total_size: u64,
}

impl ScatterList {
    /// Builds the list from validated items, in order.
    ///
    /// Items are validated, so lengths are non-zero and their sum fits the
    /// configured size limit.
    pub(crate) fn assemble(items: Vec<ValidatedItem>) -> Self {
        let mut entries = Vec::with_capacity(items.len());
        let mut starts = Vec::with_capacity(items.len());
        let mut total_size = 0u64;

        for item in items {
            starts.push(total_size);
            total_size += item.size;

            entries.push(ScatterEntry {
                region: item.region,
                offset: item.offset,
                length: item.size,
            });
        }

        Self {
            entries,
            starts,
            total_size,
        }
    }

    /// Entries in exported order.
    pub fn entries(&self) -> &[ScatterEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all entry lengths.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Offset of entry `index` within the exported range.
    pub fn virtual_offset(&self, index: usize) -> Option<u64> {
        self.starts.get(index).copied()
    }

    /// Maps an exported offset to `(entry index, offset within that entry)`.
    pub fn locate(&self, virtual_offset: u64) -> Option<(usize, u64)> {
        locate(&self.starts, self.total_size, virtual_offset)
    }
}

/// Binary search over strictly increasing entry start offsets.
pub(crate) fn locate(starts: &[u64], total_size: u64, virtual_offset: u64) -> Option<(usize, u64)> {
    if virtual_offset >= total_size {
        return None;
    }

    let index = starts.partition_point(|&start| start <= virtual_offset) - 1;

    Some((index, virtual_offset - starts[index]))
}
