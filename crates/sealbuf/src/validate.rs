// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Validator - structural checks on creation requests.
//!
//! Request-level checks run first (flags, item count), then each item in
//! order: resolvable handle, shrink seal, no write seal, offset alignment,
//! size alignment, bounds, placement in the view. The first failure rejects
//! the whole request.
//! Nothing is pinned or mapped here.

use std::os::fd::{AsRawFd, RawFd};
use std::sync::Arc;

use sealbuf_region::{SealedRegion, Seals};

use crate::config::BrokerConfig;
use crate::error::{ExportError, RequestFailure};
use crate::request::{CreateItem, CreateRequestList};

/// An item that passed every check, holding its resolved region.
#[derive(Debug, Clone)]
pub(crate) struct ValidatedItem {
    pub(crate) region: Arc<SealedRegion>,
    pub(crate) offset: u64,
    pub(crate) size: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct Validator {
    list_limit: usize,
    size_limit: u64,
}

impl Validator {
    pub(crate) fn new(config: &BrokerConfig) -> Self {
        Self {
            list_limit: config.list_limit,
            size_limit: config.size_limit,
        }
    }

    pub(crate) fn validate(
        &self,
        request: &CreateRequestList<'_>,
    ) -> Result<Vec<ValidatedItem>, ExportError> {
        let unknown = request.flags.unknown_bits();
        if unknown != 0 {
            return Err(ExportError::InvalidRequest(RequestFailure::UnknownFlags(
                unknown,
            )));
        }

        let count = request.items.len();
        if count == 0 {
            return Err(ExportError::InvalidRequest(RequestFailure::EmptyList));
        }
        if count > self.list_limit {
            return Err(ExportError::InvalidRequest(RequestFailure::TooManyItems {
                count,
                limit: self.list_limit,
            }));
        }

        // Items naming the same descriptor share one resolved region.
        let mut resolved: Vec<(RawFd, Arc<SealedRegion>)> = Vec::new();
        let mut validated = Vec::with_capacity(count);
        let mut total: u64 = 0;

        for (index, item) in request.items.iter().enumerate() {
            let region = resolve(&mut resolved, index, item)?;
            check_item(index, item, &region)?;

            // The view installs this item at `total`; huge pages need a huge-aligned slot.
            if total % region.page_size() != 0 {
                return Err(ExportError::MisalignedPlacement {
                    index,
                    view_offset: total,
                    page_size: region.page_size(),
                });
            }

            total = total
                .checked_add(item.size)
                .filter(|total| *total <= self.size_limit)
                .ok_or(ExportError::InvalidRequest(RequestFailure::SizeLimit {
                    limit: self.size_limit,
                }))?;

            validated.push(ValidatedItem {
                region,
                offset: item.offset,
                size: item.size,
            });
        }

        Ok(validated)
    }
}

fn resolve(
    resolved: &mut Vec<(RawFd, Arc<SealedRegion>)>,
    index: usize,
    item: &CreateItem<'_>,
) -> Result<Arc<SealedRegion>, ExportError> {
    let raw = item.fd.as_raw_fd();

    if let Some((_, region)) = resolved.iter().find(|(fd, _)| *fd == raw) {
        return Ok(Arc::clone(region));
    }

    let region = SealedRegion::resolve(item.fd)
        .map(Arc::new)
        .map_err(|source| ExportError::InvalidHandle { index, source })?;

    resolved.push((raw, Arc::clone(&region)));

    Ok(region)
}

fn check_item(
    index: usize,
    item: &CreateItem<'_>,
    region: &SealedRegion,
) -> Result<(), ExportError> {
    let seals = region
        .seals()
        .map_err(|source| ExportError::InvalidHandle { index, source })?;

    if !seals.contains(Seals::SHRINK) {
        return Err(ExportError::UnsealedRegion { index });
    }
    if seals.contains(Seals::WRITE) {
        return Err(ExportError::WriteSealedRegion { index });
    }

    let page_size = region.page_size();

    if item.offset % page_size != 0 {
        return Err(ExportError::MisalignedOffset {
            index,
            offset: item.offset,
            page_size,
        });
    }
    if item.size == 0 || item.size % page_size != 0 {
        return Err(ExportError::MisalignedSize {
            index,
            size: item.size,
            page_size,
        });
    }

    let region_size = region
        .byte_size()
        .map_err(|source| ExportError::InvalidHandle { index, source })?;

    let end = item.offset.checked_add(item.size);
    if end.is_none_or(|end| end > region_size) {
        return Err(ExportError::OutOfBounds {
            index,
            offset: item.offset,
            size: item.size,
            region_size,
        });
    }

    Ok(())
}
