// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! SealedRegion - an anonymous memfd segment with seal inspection.
//!
//! A region either creates its own memfd or resolves a caller's descriptor.
//! In both cases it owns a private descriptor, so closing the caller's copy
//! never invalidates the region.

use core::ffi::CStr;
use core::mem::MaybeUninit;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd};

use crate::error::RegionError;
use crate::mapping::SharedMapping;
use crate::seals::Seals;

/// Returns the base page size of the running system.
pub fn system_page_size() -> u64 {
    unsafe { libc::sysconf(libc::_SC_PAGESIZE) as u64 }
}

/// Options for [`SealedRegion::create`].
#[derive(Debug, Clone, Copy)]
pub struct RegionOptions {
    /// Debug name shown in `/proc/<pid>/fd`.
    pub name: &'static CStr,
    /// Back the region with hugetlbfs pages (`MFD_HUGETLB`).
    pub huge_pages: bool,
    /// Seals applied once the region has its final size.
    pub seals: Seals,
}

impl Default for RegionOptions {
    fn default() -> Self {
        Self {
            name: c"sealbuf-region",
            huge_pages: false,
            seals: Seals::SHRINK,
        }
    }
}

impl RegionOptions {
    /// Request hugetlbfs backing.
    pub fn with_huge_pages(mut self, huge_pages: bool) -> Self {
        self.huge_pages = huge_pages;
        self
    }

    /// Replace the seal set applied after sizing.
    pub fn with_seals(mut self, seals: Seals) -> Self {
        self.seals = seals;
        self
    }

    /// Create the region without any seal.
    pub fn unsealed(self) -> Self {
        self.with_seals(Seals::NONE)
    }
}

/// A shareable memory segment backed by a memfd.
#[derive(Debug)]
pub struct SealedRegion {
    fd: OwnedFd,
    id: u64,
    page_size: u64,
}

impl SealedRegion {
    /// Creates a memfd of `size` bytes and applies `options.seals`.
    pub fn create(size: u64, options: &RegionOptions) -> Result<Self, RegionError> {
        let mut flags = libc::MFD_CLOEXEC | libc::MFD_ALLOW_SEALING;

        if options.huge_pages {
            flags |= libc::MFD_HUGETLB;
        }

        let raw = unsafe { libc::memfd_create(options.name.as_ptr(), flags) };

        if raw < 0 {
            return Err(RegionError::Create);
        }

        // Safety: memfd_create returned a fresh descriptor we exclusively own.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };
        let region = Self::from_owned(fd)?;

        region.set_len(size)?;

        if !options.seals.is_empty() {
            region.add_seals(options.seals)?;
        }

        Ok(region)
    }

    /// Resolves an arbitrary descriptor into a region.
    ///
    /// Fails unless `fd` is a regular file that answers `F_GET_SEALS`
    /// (shmem or hugetlbfs). The region keeps its own duplicate of `fd`.
    pub fn resolve(fd: BorrowedFd<'_>) -> Result<Self, RegionError> {
        let stat = fstat(fd)?;

        if stat.st_mode & libc::S_IFMT != libc::S_IFREG {
            return Err(RegionError::NotRegularFile);
        }

        get_seals(fd)?;

        let owned = fd.try_clone_to_owned().map_err(|_| RegionError::Duplicate)?;

        Self::from_owned(owned)
    }

    fn from_owned(fd: OwnedFd) -> Result<Self, RegionError> {
        let stat = fstat(fd.as_fd())?;

        let page_size = if stat.st_blksize > 0 {
            stat.st_blksize as u64
        } else {
            system_page_size()
        };

        Ok(Self {
            fd,
            id: stat.st_ino as u64,
            page_size,
        })
    }

    /// Identity of the backing file (its inode number).
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Allocation granularity of the backing file system.
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Current size in bytes, read from the descriptor.
    pub fn byte_size(&self) -> Result<u64, RegionError> {
        let stat = fstat(self.fd.as_fd())?;
        Ok(stat.st_size as u64)
    }

    /// Current seal set, read from the descriptor.
    pub fn seals(&self) -> Result<Seals, RegionError> {
        get_seals(self.fd.as_fd())
    }

    /// Adds `seals` to the region. Seals can never be removed.
    pub fn add_seals(&self, seals: Seals) -> Result<(), RegionError> {
        let failed = unsafe {
            libc::fcntl(
                self.fd.as_raw_fd(),
                libc::F_ADD_SEALS,
                seals.bits() as libc::c_int,
            )
        } < 0;

        if failed {
            return Err(RegionError::AddSeals);
        }

        Ok(())
    }

    /// Resizes the region. Fails once a conflicting seal is set.
    pub fn set_len(&self, size: u64) -> Result<(), RegionError> {
        let size = libc::off_t::try_from(size).map_err(|_| RegionError::OutOfRange)?;
        let failed = unsafe { libc::ftruncate(self.fd.as_raw_fd(), size) } != 0;

        if failed {
            return Err(RegionError::Truncate);
        }

        Ok(())
    }

    /// Maps `len` bytes starting at `offset`, shared and read/write.
    pub fn map(&self, offset: u64, len: u64) -> Result<SharedMapping, RegionError> {
        let len = usize::try_from(len).map_err(|_| RegionError::OutOfRange)?;
        SharedMapping::new(self.fd.as_fd(), offset, len)
    }

    /// Maps the whole region.
    pub fn map_all(&self) -> Result<SharedMapping, RegionError> {
        self.map(0, self.byte_size()?)
    }
}

impl AsFd for SealedRegion {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

fn fstat(fd: BorrowedFd<'_>) -> Result<libc::stat, RegionError> {
    let mut stat = MaybeUninit::<libc::stat>::uninit();
    let failed = unsafe { libc::fstat(fd.as_raw_fd(), stat.as_mut_ptr()) } != 0;

    if failed {
        return Err(RegionError::Stat);
    }

    // Safety: fstat succeeded and filled the struct.
    Ok(unsafe { stat.assume_init() })
}

fn get_seals(fd: BorrowedFd<'_>) -> Result<Seals, RegionError> {
    let bits = unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_GET_SEALS) };

    if bits < 0 {
        return Err(RegionError::GetSeals);
    }

    Ok(Seals::from_bits(bits as u32))
}
