// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! MappingView - one linear read/write range over a scattered export.
//!
//! Establishing a view takes two steps:
//! 1. Reserve `total_size` bytes of address space as PROT_NONE, aligned to
//!    the largest page size among the entries.
//! 2. Install every entry over its slice of the reservation with
//!    `MAP_SHARED | MAP_FIXED`, at the entry's prefix-sum offset.
//!
//! The view is handed out only after step 2 completes for every entry. On
//! any failure the whole reservation is unmapped before returning.
//!
//! Entries are shared mappings of the source memfds, so the view aliases the
//! source pages: writes through any mapping of a region are visible here and
//! the other way round, whatever the page granularity behind them.

use core::ptr;
use std::os::fd::{AsFd, AsRawFd};
use std::sync::Arc;

use sealbuf_region::system_page_size;

use crate::buffer::Shared;
use crate::error::MapFailure;

/// PROT_NONE address space reservation, unmapped on drop.
struct Reservation {
    ptr: *mut u8,
    len: usize,
}

impl Reservation {
    fn new(len: usize, align: usize) -> Result<Self, MapFailure> {
        let padded = len.checked_add(align).ok_or(MapFailure::Reserve)?;

        let raw = unsafe {
            libc::mmap(
                ptr::null_mut(),
                padded,
                libc::PROT_NONE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | libc::MAP_NORESERVE,
                -1,
                0,
            )
        };

        if raw == libc::MAP_FAILED {
            return Err(MapFailure::Reserve);
        }

        let raw = raw as usize;
        let start = raw.next_multiple_of(align);
        let head = start - raw;
        let tail = padded - head - len;

        // Trim the padding on both sides so only [start, start + len) remains.
        unsafe {
            if head > 0 {
                libc::munmap(raw as *mut libc::c_void, head);
            }
            if tail > 0 {
                libc::munmap((start + len) as *mut libc::c_void, tail);
            }
        }

        Ok(Self {
            ptr: start as *mut u8,
            len,
        })
    }

    fn into_raw(self) -> (*mut u8, usize) {
        let parts = (self.ptr, self.len);
        core::mem::forget(self);
        parts
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        unsafe { libc::munmap(self.ptr as *mut libc::c_void, self.len) };
    }
}

/// A consumer's linear view of an exported buffer.
pub struct MappingView {
    shared: Arc<Shared>,
    ptr: *mut u8,
    len: usize,
}

// Safety: the view is plain shared memory; callers synchronize access to contents.
unsafe impl Send for MappingView {}
unsafe impl Sync for MappingView {}

impl MappingView {
    pub(crate) fn establish(shared: Arc<Shared>) -> Result<Self, MapFailure> {
        let scatter = shared.scatter();
        let len = usize::try_from(scatter.total_size()).map_err(|_| MapFailure::Reserve)?;

        let align = scatter
            .entries()
            .iter()
            .map(|entry| entry.region().page_size())
            .fold(system_page_size(), u64::max);
        let align = usize::try_from(align).map_err(|_| MapFailure::Reserve)?;

        let reservation = Reservation::new(len, align)?;

        for (index, entry) in scatter.entries().iter().enumerate() {
            let start = scatter
                .virtual_offset(index)
                .ok_or(MapFailure::Install { index })?;
            let offset =
                libc::off_t::try_from(entry.offset()).map_err(|_| MapFailure::Install { index })?;

            let target = unsafe { reservation.ptr.add(start as usize) };
            let installed = unsafe {
                libc::mmap(
                    target as *mut libc::c_void,
                    entry.length() as usize,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_SHARED | libc::MAP_FIXED,
                    entry.region().as_fd().as_raw_fd(),
                    offset,
                )
            };

            if installed == libc::MAP_FAILED || installed as *mut u8 != target {
                return Err(MapFailure::Install { index });
            }
        }

        let (ptr, len) = reservation.into_raw();

        Ok(Self { shared, ptr, len })
    }

    /// Identifier of the mapped export.
    pub fn buffer_id(&self) -> u64 {
        self.shared.id()
    }

    /// Length in bytes; always the export's total size.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the view has zero length.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Start address of the view.
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    /// Maps a view offset to `(entry index, offset within that entry)`.
    pub fn translate(&self, offset: u64) -> Option<(usize, u64)> {
        self.shared.scatter().locate(offset)
    }

    /// Returns the viewed bytes.
    ///
    /// Other mappings of the source regions may write concurrently; the
    /// slice observes those writes.
    pub fn as_slice(&self) -> &[u8] {
        unsafe { core::slice::from_raw_parts(self.ptr, self.len) }
    }

    /// Returns the viewed bytes mutably. Writes land in the source regions.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { core::slice::from_raw_parts_mut(self.ptr, self.len) }
    }

    /// Releases the virtual range. The export's refcount is unaffected.
    pub fn unmap(self) {
        drop(self);
    }
}

impl core::fmt::Debug for MappingView {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MappingView")
            .field("buffer_id", &self.buffer_id())
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl Drop for MappingView {
    fn drop(&mut self) {
        unsafe { libc::munmap(self.ptr as *mut libc::c_void, self.len) };
    }
}
