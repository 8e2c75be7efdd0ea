// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Error types for sealbuf.
use thiserror::Error;

use sealbuf_region::RegionError;

/// Why a request was rejected as a whole.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum RequestFailure {
    /// The request names no item.
    #[error("item list is empty")]
    EmptyList,

    /// The request names more items than the configured list limit.
    #[error("{count} items exceed the limit of {limit}")]
    TooManyItems {
        /// Items in the request.
        count: usize,
        /// Configured limit.
        limit: usize,
    },

    /// The request carries flag bits the broker does not know.
    #[error("unknown flag bits {0:#x}")]
    UnknownFlags(u32),

    /// The summed item sizes exceed the configured size limit.
    #[error("total size exceeds the limit of {limit} bytes")]
    SizeLimit {
        /// Configured limit in bytes.
        limit: u64,
    },
}

/// Why a pin could not be acquired.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum PinFailure {
    /// Pinning would exceed the broker's pin limit.
    #[error("pin budget of {limit} bytes exhausted")]
    BudgetExhausted {
        /// Configured limit in bytes.
        limit: u64,
    },

    /// Mapping the entry's range failed.
    #[error("mapping entry {index} failed: {source}")]
    Map {
        /// Entry index.
        index: usize,
        /// Underlying region error.
        source: RegionError,
    },

    /// Locking the entry's range failed.
    #[error("locking entry {index} failed: {source}")]
    Lock {
        /// Entry index.
        index: usize,
        /// Underlying region error.
        source: RegionError,
    },
}

/// Why a view could not be established.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum MapFailure {
    /// The handle no longer holds a reference.
    #[error("buffer handle was released")]
    Released,

    /// Reserving `total_size` bytes of address space failed.
    #[error("reserving the virtual range failed")]
    Reserve,

    /// Installing an entry over the reservation failed.
    #[error("installing entry {index} failed")]
    Install {
        /// Entry index.
        index: usize,
    },
}

/// Errors returned by the broker.
///
/// Item-level variants carry the index of the first offending item.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum ExportError {
    /// The source descriptor is not a sealable shared memory file.
    #[error("item {index}: source is not a shareable memory region ({source})")]
    InvalidHandle {
        /// Item index.
        index: usize,
        /// Why the descriptor was refused.
        source: RegionError,
    },

    /// The source region lacks the shrink seal.
    #[error("item {index}: region is not sealed against shrinking")]
    UnsealedRegion {
        /// Item index.
        index: usize,
    },

    /// The source region is write-sealed and cannot back a read/write view.
    #[error("item {index}: region is sealed against writes")]
    WriteSealedRegion {
        /// Item index.
        index: usize,
    },

    /// The item offset is not a multiple of the region's page size.
    #[error("item {index}: offset {offset} is not aligned to page size {page_size}")]
    MisalignedOffset {
        /// Item index.
        index: usize,
        /// Requested offset.
        offset: u64,
        /// Page size of the source region.
        page_size: u64,
    },

    /// The item size is zero or not a multiple of the region's page size.
    #[error("item {index}: size {size} is zero or not aligned to page size {page_size}")]
    MisalignedSize {
        /// Item index.
        index: usize,
        /// Requested size.
        size: u64,
        /// Page size of the source region.
        page_size: u64,
    },

    /// The item range does not fit inside the region.
    #[error("item {index}: range {offset}+{size} exceeds region size {region_size}")]
    OutOfBounds {
        /// Item index.
        index: usize,
        /// Requested offset.
        offset: u64,
        /// Requested size.
        size: u64,
        /// Current size of the region.
        region_size: u64,
    },

    /// The item would start at a view offset its region's page size cannot be mapped at.
    #[error("item {index}: view offset {view_offset} is not aligned to page size {page_size}")]
    MisalignedPlacement {
        /// Item index.
        index: usize,
        /// Sum of the sizes of the items before it.
        view_offset: u64,
        /// Page size of the source region.
        page_size: u64,
    },

    /// The request as a whole is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(RequestFailure),

    /// An entry could not be pinned; nothing stays pinned.
    #[error("pinning failed: {0}")]
    PinningFailed(PinFailure),

    /// The view could not be established; nothing stays mapped.
    #[error("mapping failed: {0}")]
    MappingFailed(MapFailure),

    /// The handle value has already given up its reference.
    #[error("handle already released")]
    Released,
}
