// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Error types for sealbuf-region.
use thiserror::Error;

/// Errors from region syscalls.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
#[repr(u8)]
pub enum RegionError {
    /// memfd_create failed.
    #[error("memfd_create failed")]
    Create = 0,

    /// Adding seals failed.
    #[error("fcntl(F_ADD_SEALS) failed")]
    AddSeals = 1,

    /// Reading seals failed; the descriptor does not support sealing.
    #[error("fcntl(F_GET_SEALS) failed")]
    GetSeals = 2,

    /// Resizing failed, e.g. against a shrink or grow seal.
    #[error("ftruncate failed")]
    Truncate = 3,

    /// fstat failed.
    #[error("fstat failed")]
    Stat = 4,

    /// Duplicating the descriptor failed.
    #[error("fcntl(F_DUPFD_CLOEXEC) failed")]
    Duplicate = 5,

    /// mmap failed.
    #[error("mmap failed")]
    Map = 6,

    /// madvise failed.
    #[error("madvise(MADV_HUGEPAGE) failed")]
    Advise = 7,

    /// mlock failed.
    #[error("mlock failed")]
    Lock = 8,

    /// The descriptor is not a regular file.
    #[error("descriptor is not a regular file")]
    NotRegularFile = 9,

    /// An offset or length does not fit the platform types.
    #[error("range is outside the region")]
    OutOfRange = 10,
}
