// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Pinning - keeps the pages of every scatter entry referenced (and, in
//! locked mode, resident) for the lifetime of an export.
//!
//! A pin is a shared mapping of the entry's byte range, optionally mlock'd.
//! Pins are tracked by byte range only, so the memory manager is free to
//! promote the backing pages to huge pages afterwards. Pins are additive:
//! any number of exports may pin overlapping ranges of one region.
//!
//! Every pin reserves its length from a [`PinBudget`] shared by the broker.
//! Dropping a pin unlocks, unmaps and returns the reservation, in that order.

use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sealbuf_region::SharedMapping;

use crate::config::PinMode;
use crate::error::PinFailure;
use crate::scatter::{ScatterEntry, ScatterList};

/// Bytes pinned across all live exports of one broker.
#[derive(Debug)]
pub(crate) struct PinBudget {
    limit: Option<u64>,
    pinned: AtomicU64,
}

impl PinBudget {
    pub(crate) fn new(limit: Option<u64>) -> Self {
        Self {
            limit,
            pinned: AtomicU64::new(0),
        }
    }

    pub(crate) fn pinned(&self) -> u64 {
        self.pinned.load(Ordering::Acquire)
    }

    fn reserve(self: &Arc<Self>, bytes: u64) -> Result<Reservation, PinFailure> {
        let mut current = self.pinned.load(Ordering::Relaxed);

        loop {
            let next = current.checked_add(bytes);
            let next = match (next, self.limit) {
                (Some(next), Some(limit)) if next <= limit => next,
                (Some(next), None) => next,
                (_, limit) => {
                    return Err(PinFailure::BudgetExhausted {
                        limit: limit.unwrap_or(u64::MAX),
                    });
                }
            };

            match self.pinned.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    return Ok(Reservation {
                        budget: Arc::clone(self),
                        bytes,
                    });
                }
                Err(observed) => current = observed,
            }
        }
    }
}

#[derive(Debug)]
struct Reservation {
    budget: Arc<PinBudget>,
    bytes: u64,
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.budget.pinned.fetch_sub(self.bytes, Ordering::AcqRel);
    }
}

/// Pin on one scatter entry.
#[derive(Debug)]
struct Pin {
    // Declaration order is drop order: unmap before returning the budget.
    mapping: SharedMapping,
    _reservation: Reservation,
}

/// Pins of every entry of one export, in entry order.
#[derive(Debug)]
pub(crate) struct PinSet {
    pins: Vec<Pin>,
}

impl PinSet {
    pub(crate) fn len(&self) -> usize {
        self.pins.len()
    }

    pub(crate) fn is_locked(&self) -> bool {
        self.pins.iter().all(|pin| pin.mapping.is_locked())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PinningCoordinator {
    mode: PinMode,
    budget: Arc<PinBudget>,
}

impl PinningCoordinator {
    pub(crate) fn new(mode: PinMode, budget: Arc<PinBudget>) -> Self {
        Self { mode, budget }
    }

    /// Pins every entry or none: on failure, pins already taken are dropped
    /// before the error is returned.
    pub(crate) fn pin_all(&self, list: &ScatterList) -> Result<PinSet, PinFailure> {
        let mut pins = Vec::with_capacity(list.len());

        for (index, entry) in list.entries().iter().enumerate() {
            match self.pin_entry(index, entry) {
                Ok(pin) => pins.push(pin),
                Err(e) => {
                    tracing::warn!(
                        index,
                        error = %e,
                        rolled_back = pins.len(),
                        "pin failed, releasing pins of this request"
                    );
                    drop(pins);
                    return Err(e);
                }
            }
        }

        Ok(PinSet { pins })
    }

    fn pin_entry(&self, index: usize, entry: &ScatterEntry) -> Result<Pin, PinFailure> {
        let reservation = self.budget.reserve(entry.length())?;

        let mapping = entry
            .region()
            .map(entry.offset(), entry.length())
            .map_err(|source| PinFailure::Map { index, source })?;

        if self.mode == PinMode::Locked {
            mapping
                .lock()
                .map_err(|source| PinFailure::Lock { index, source })?;
        }

        Ok(Pin {
            mapping,
            _reservation: reservation,
        })
    }
}
