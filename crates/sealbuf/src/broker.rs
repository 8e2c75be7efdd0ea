// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Broker - request → validation → assembly → pinning → handle → mapping.

use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::buffer::ExportedBuffer;
use crate::config::BrokerConfig;
use crate::error::ExportError;
use crate::pin::{PinBudget, PinningCoordinator};
use crate::request::{CreateRequest, CreateRequestList};
use crate::scatter::ScatterList;
use crate::validate::Validator;
use crate::view::MappingView;

/// Turns sealed memory regions into exported buffers.
///
/// A broker holds no state beyond its configuration, its pin budget and an
/// id counter; any number of brokers may coexist in one process.
#[derive(Debug)]
pub struct Broker {
    config: BrokerConfig,
    validator: Validator,
    pinning: PinningCoordinator,
    budget: Arc<PinBudget>,
    next_id: AtomicU64,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new(BrokerConfig::default())
    }
}

impl Broker {
    /// Creates a broker with `config`.
    pub fn new(config: BrokerConfig) -> Self {
        let budget = Arc::new(PinBudget::new(config.pin_limit));

        Self {
            validator: Validator::new(&config),
            pinning: PinningCoordinator::new(config.pin_mode, Arc::clone(&budget)),
            budget,
            config,
            next_id: AtomicU64::new(1),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Bytes currently pinned by live exports of this broker.
    pub fn pinned_bytes(&self) -> u64 {
        self.budget.pinned()
    }

    /// Exports one range of one region.
    pub fn create(&self, request: CreateRequest<'_>) -> Result<ExportedBuffer, ExportError> {
        self.create_from_list(&CreateRequestList::from(request))
    }

    /// Exports the items of `request` as one buffer, in item order.
    ///
    /// All-or-nothing: on error no pin, mapping or handle survives the call.
    pub fn create_from_list(
        &self,
        request: &CreateRequestList<'_>,
    ) -> Result<ExportedBuffer, ExportError> {
        let items = self.validator.validate(request).inspect_err(|e| {
            tracing::debug!(error = %e, "rejected export request");
        })?;

        let scatter = ScatterList::assemble(items);

        let pins = self
            .pinning
            .pin_all(&scatter)
            .map_err(ExportError::PinningFailed)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            buffer_id = id,
            entries = scatter.len(),
            total_size = scatter.total_size(),
            flags = request.flags.bits(),
            "created export"
        );

        Ok(ExportedBuffer::new(id, scatter, pins, request.flags))
    }

    /// Takes another reference on `buffer`.
    pub fn retain(&self, buffer: &ExportedBuffer) -> Result<ExportedBuffer, ExportError> {
        buffer.retain()
    }

    /// Gives `buffer`'s reference back.
    pub fn release(&self, buffer: &ExportedBuffer) -> Result<(), ExportError> {
        buffer.release()
    }

    /// Maps `buffer` as one linear read/write range of `total_size` bytes.
    pub fn map(&self, buffer: &ExportedBuffer) -> Result<MappingView, ExportError> {
        let shared = buffer.shared()?;

        let view = MappingView::establish(shared).map_err(|e| {
            tracing::warn!(buffer_id = buffer.id(), error = %e, "mapping failed");
            ExportError::MappingFailed(e)
        })?;

        tracing::debug!(buffer_id = view.buffer_id(), len = view.len(), "mapped export");

        Ok(view)
    }

    /// Releases `view`'s virtual range.
    pub fn unmap(&self, view: MappingView) {
        view.unmap();
    }
}
