// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Creation requests.
//!
//! Source regions are referenced by borrowed descriptors. Nothing is resolved
//! here; the validator decides whether a descriptor is usable.

use std::os::fd::BorrowedFd;

use crate::flags::CreateFlags;

/// One (source, offset, size) triple of a list request.
#[derive(Debug, Clone, Copy)]
pub struct CreateItem<'fd> {
    /// Descriptor of the source region.
    pub fd: BorrowedFd<'fd>,
    /// Byte offset into the source region.
    pub offset: u64,
    /// Bytes to export from the source region.
    pub size: u64,
}

impl<'fd> CreateItem<'fd> {
    /// Creates an item.
    pub fn new(fd: BorrowedFd<'fd>, offset: u64, size: u64) -> Self {
        Self { fd, offset, size }
    }
}

/// Single-region creation request.
#[derive(Debug, Clone, Copy)]
pub struct CreateRequest<'fd> {
    /// Descriptor of the source region.
    pub fd: BorrowedFd<'fd>,
    /// Creation flags.
    pub flags: CreateFlags,
    /// Byte offset into the source region.
    pub offset: u64,
    /// Bytes to export.
    pub size: u64,
}

impl<'fd> CreateRequest<'fd> {
    /// Creates a request without flags.
    pub fn new(fd: BorrowedFd<'fd>, offset: u64, size: u64) -> Self {
        Self {
            fd,
            flags: CreateFlags::NONE,
            offset,
            size,
        }
    }

    /// Replace the creation flags.
    pub fn with_flags(mut self, flags: CreateFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Multi-region creation request. Item order defines the exported layout.
#[derive(Debug, Clone, Default)]
pub struct CreateRequestList<'fd> {
    /// Creation flags.
    pub flags: CreateFlags,
    /// Ordered items.
    pub items: Vec<CreateItem<'fd>>,
}

impl<'fd> CreateRequestList<'fd> {
    /// Creates an empty list with `flags`.
    pub fn new(flags: CreateFlags) -> Self {
        Self {
            flags,
            items: Vec::new(),
        }
    }

    /// Appends an item.
    pub fn push(&mut self, item: CreateItem<'fd>) -> &mut Self {
        self.items.push(item);
        self
    }

    /// Appends an item, builder style.
    pub fn with_item(mut self, fd: BorrowedFd<'fd>, offset: u64, size: u64) -> Self {
        self.items.push(CreateItem::new(fd, offset, size));
        self
    }
}

impl<'fd> From<CreateRequest<'fd>> for CreateRequestList<'fd> {
    fn from(request: CreateRequest<'fd>) -> Self {
        Self {
            flags: request.flags,
            items: vec![CreateItem::new(request.fd, request.offset, request.size)],
        }
    }
}
