// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! SharedMapping - a `MAP_SHARED` read/write window onto a region.
//!
//! Wraps one mmap'd range with mlock/madvise operations.
//! Each syscall is exposed separately for granular testing.

use core::ptr;
use core::sync::atomic::{AtomicBool, Ordering};
use std::os::fd::{AsRawFd, BorrowedFd};

use crate::error::RegionError;

/// A shared read/write mapping of a file range.
///
/// Unmapped on drop. Tracks lock state internally via AtomicBool so the
/// matching `munlock` is issued exactly when a lock was taken.
#[derive(Debug)]
pub struct SharedMapping {
    ptr: *mut u8,
    len: usize,
    is_locked: AtomicBool,
}

// Safety: the mapping is plain shared memory; callers synchronize access to contents.
unsafe impl Send for SharedMapping {}
unsafe impl Sync for SharedMapping {}

impl SharedMapping {
    /// Maps `len` bytes of `fd` starting at `offset`, PROT_READ | PROT_WRITE, MAP_SHARED.
    pub fn new(fd: BorrowedFd<'_>, offset: u64, len: usize) -> Result<Self, RegionError> {
        let offset = libc::off_t::try_from(offset).map_err(|_| RegionError::OutOfRange)?;

        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd.as_raw_fd(),
                offset,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(RegionError::Map);
        }

        Ok(Self {
            ptr: ptr as *mut u8,
            len,
            is_locked: AtomicBool::new(false),
        })
    }

    /// Locks the mapped pages in RAM (prevents swapping to disk).
    pub fn lock(&self) -> Result<(), RegionError> {
        let failed = unsafe { libc::mlock(self.ptr as *const _, self.len) } != 0;

        if failed {
            return Err(RegionError::Lock);
        }

        self.is_locked.store(true, Ordering::Release);

        Ok(())
    }

    /// Unlocks the mapped pages. No-op if never locked.
    pub fn munlock(&self) {
        if self.is_locked.swap(false, Ordering::AcqRel) {
            unsafe { libc::munlock(self.ptr as *const _, self.len) };
        }
    }

    /// Returns true if `lock()` succeeded and `munlock()` has not run since.
    pub fn is_locked(&self) -> bool {
        self.is_locked.load(Ordering::Acquire)
    }

    /// Hints the kernel to back this range with transparent huge pages.
    ///
    /// Promotion itself is performed by the memory manager whenever it sees fit;
    /// contents and every other mapping of the same pages stay coherent.
    pub fn advise_huge(&self) -> Result<(), RegionError> {
        let failed =
            unsafe { libc::madvise(self.ptr as *mut _, self.len, libc::MADV_HUGEPAGE) } != 0;

        if failed {
            return Err(RegionError::Advise);
        }

        Ok(())
    }

    /// Length of the mapping in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the mapping has zero length.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Start address of the mapping.
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    /// Returns the mapped bytes.
    ///
    /// Other mappings of the same region may write concurrently; the slice
    /// observes those writes.
    pub fn as_slice(&self) -> &[u8] {
        unsafe { core::slice::from_raw_parts(self.ptr, self.len) }
    }

    /// Returns the mapped bytes mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { core::slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl Drop for SharedMapping {
    fn drop(&mut self) {
        self.munlock();
        unsafe { libc::munmap(self.ptr as *mut libc::c_void, self.len) };
    }
}
