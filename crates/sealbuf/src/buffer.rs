// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! ExportedBuffer - reference-counted handle over a pinned scatter list.
//!
//! Each `ExportedBuffer` value holds exactly one reference. `retain()` hands
//! out another value, `release()` (or drop) gives this value's reference back
//! exactly once. When the last reference goes, every pin is dropped.

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering, fence};
use std::sync::{Arc, Mutex};

use crate::error::{ExportError, MapFailure};
use crate::flags::CreateFlags;
use crate::pin::PinSet;
use crate::scatter::{ScatterEntry, ScatterList};

/// State shared by every handle of one export.
#[derive(Debug)]
pub(crate) struct Shared {
    id: u64,
    scatter: ScatterList,
    refcount: AtomicUsize,
    pins: Mutex<Option<PinSet>>,
}

impl Shared {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn scatter(&self) -> &ScatterList {
        &self.scatter
    }

    fn drop_ref(&self) {
        if self.refcount.fetch_sub(1, Ordering::Release) != 1 {
            return;
        }

        // Pairs with the Release above on every other holder.
        fence(Ordering::Acquire);

        let pins = self
            .pins
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        if let Some(pins) = pins {
            tracing::debug!(
                buffer_id = self.id,
                entries = pins.len(),
                "last reference released, unpinning"
            );
        }
    }
}

/// A handle to an exported buffer.
#[derive(Debug)]
pub struct ExportedBuffer {
    shared: Arc<Shared>,
    flags: CreateFlags,
    released: AtomicBool,
}

impl ExportedBuffer {
    pub(crate) fn new(id: u64, scatter: ScatterList, pins: PinSet, flags: CreateFlags) -> Self {
        let shared = Shared {
            id,
            scatter,
            refcount: AtomicUsize::new(1),
            pins: Mutex::new(Some(pins)),
        };

        Self {
            shared: Arc::new(shared),
            flags,
            released: AtomicBool::new(false),
        }
    }

    /// Takes another reference. The new handle inherits this handle's flags.
    pub fn retain(&self) -> Result<ExportedBuffer, ExportError> {
        if self.released.load(Ordering::Acquire) {
            return Err(ExportError::Released);
        }

        // A concurrent release() on this handle may have dropped the count
        // to zero after the check above; never raise it from zero.
        let mut current = self.shared.refcount.load(Ordering::Relaxed);
        loop {
            if current == 0 {
                return Err(ExportError::Released);
            }

            match self.shared.refcount.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }

        Ok(Self {
            shared: Arc::clone(&self.shared),
            flags: self.flags,
            released: AtomicBool::new(false),
        })
    }

    /// Gives this handle's reference back. The last release unpins every entry.
    ///
    /// A handle releases at most once; later calls return [`ExportError::Released`].
    pub fn release(&self) -> Result<(), ExportError> {
        if self.released.swap(true, Ordering::AcqRel) {
            return Err(ExportError::Released);
        }

        self.shared.drop_ref();

        Ok(())
    }

    /// Copy of this handle as inherited across a process boundary.
    ///
    /// `None` when the handle carries [`CreateFlags::CLOSE_ON_HANDOFF`].
    pub fn handoff(&self) -> Result<Option<ExportedBuffer>, ExportError> {
        if self.flags.contains(CreateFlags::CLOSE_ON_HANDOFF) {
            if self.released.load(Ordering::Acquire) {
                return Err(ExportError::Released);
            }
            return Ok(None);
        }

        self.retain().map(Some)
    }

    /// Sets or clears close-on-handoff on this handle only.
    pub fn set_close_on_handoff(&mut self, enabled: bool) {
        self.flags = self.flags.with(CreateFlags::CLOSE_ON_HANDOFF, enabled);
    }

    /// Flags of this handle.
    pub fn flags(&self) -> CreateFlags {
        self.flags
    }

    /// Identifier shared by every handle of this export.
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Exported size; a mapping covers exactly this many bytes.
    pub fn total_size(&self) -> u64 {
        self.shared.scatter.total_size()
    }

    /// Scatter entries in exported order.
    pub fn entries(&self) -> &[ScatterEntry] {
        self.shared.scatter.entries()
    }

    /// The scatter list.
    pub fn scatter(&self) -> &ScatterList {
        &self.shared.scatter
    }

    /// References currently held across all handles of this export.
    pub fn refcount(&self) -> usize {
        self.shared.refcount.load(Ordering::Acquire)
    }

    /// Returns true until this handle is released.
    pub fn is_live(&self) -> bool {
        !self.released.load(Ordering::Acquire)
    }

    /// Returns true while the export's pins are held.
    pub fn is_pinned(&self) -> bool {
        self.shared
            .pins
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    /// Returns true if every pin of this export holds its pages locked.
    pub fn is_locked(&self) -> bool {
        self.shared
            .pins
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .is_some_and(PinSet::is_locked)
    }

    pub(crate) fn shared(&self) -> Result<Arc<Shared>, ExportError> {
        if !self.is_live() {
            return Err(ExportError::MappingFailed(MapFailure::Released));
        }

        Ok(Arc::clone(&self.shared))
    }
}

impl Drop for ExportedBuffer {
    fn drop(&mut self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            self.shared.drop_ref();
        }
    }
}
