// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Export sealed memfd regions as one pinned, linearly mappable buffer.
//!
//! A [`Broker`] takes one or more ranges of shrink-sealed memfds and turns
//! them into an [`ExportedBuffer`]: an ordered scatter-gather list whose
//! pages stay pinned for as long as any handle references it. A
//! [`MappingView`] presents that list as one contiguous read/write range
//! aliasing the source pages.
//!
//! # Pipeline
//!
//! 1. **Validate**: every item must name a sealable shmem/hugetlbfs file
//!    carrying `F_SEAL_SHRINK`, with page-aligned offset and size inside the
//!    region. The first failure rejects the whole request.
//! 2. **Assemble**: items become scatter entries in request order. Entry `k`
//!    starts where entries `0..k` end.
//! 3. **Pin**: each entry's range is mapped shared (and mlock'd in
//!    [`PinMode::Locked`]). A failed pin drops every pin of the request.
//! 4. **Handle**: the pinned list is wrapped in a reference-counted
//!    [`ExportedBuffer`]. The last release unpins.
//! 5. **Map**: a view reserves `total_size` bytes and installs each entry at
//!    its prefix offset.
//!
//! # Huge pages
//!
//! Alignment is checked against each region's own page size, which for a
//! hugetlbfs memfd is the huge page size. A view maps whole file pages, so
//! a hugetlb item must cover whole huge pages and must start at a
//! huge-aligned offset within the view:
//!
//! - Slicing a hugetlb region into base-page items is rejected with
//!   [`ExportError::MisalignedSize`].
//! - A hugetlb item placed after items that do not sum to a multiple of its
//!   huge page size is rejected with [`ExportError::MisalignedPlacement`].
//!
//! Shmem regions promoted to transparent huge pages keep base-page
//! granularity and are not affected.
//!
//! # Example
//!
//! ```rust
//! # #[cfg(target_os = "linux")]
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     use std::os::fd::AsFd;
//!
//!     use sealbuf::{Broker, BrokerConfig, CreateFlags, CreateRequestList, PinMode};
//!     use sealbuf_region::{RegionOptions, SealedRegion, system_page_size};
//!
//!     let chunk = system_page_size() * 4;
//!     let first = SealedRegion::create(chunk, &RegionOptions::default())?;
//!     let second = SealedRegion::create(chunk, &RegionOptions::default())?;
//!
//!     first.map_all()?.as_mut_slice().fill(b'a');
//!     second.map_all()?.as_mut_slice().fill(b'b');
//!
//!     let broker = Broker::new(BrokerConfig::default().with_pin_mode(PinMode::Mapped));
//!     let request = CreateRequestList::new(CreateFlags::CLOSE_ON_HANDOFF)
//!         .with_item(second.as_fd(), 0, chunk)
//!         .with_item(first.as_fd(), 0, chunk);
//!
//!     let buffer = broker.create_from_list(&request)?;
//!     let view = broker.map(&buffer)?;
//!
//!     // Request order, not region order.
//!     assert_eq!(view.as_slice()[0], b'b');
//!     assert_eq!(view.as_slice()[chunk as usize], b'a');
//!
//!     broker.unmap(view);
//!     broker.release(&buffer)?;
//!     assert_eq!(broker.pinned_bytes(), 0);
//!     Ok(())
//! }
//! # #[cfg(target_os = "linux")]
//! # example().unwrap();
//! ```

#![warn(missing_docs)]

#[cfg(all(test, target_os = "linux"))]
mod tests;

mod config;
mod error;
mod flags;

#[cfg(target_os = "linux")]
mod broker;
#[cfg(target_os = "linux")]
mod buffer;
#[cfg(target_os = "linux")]
mod pin;
#[cfg(target_os = "linux")]
mod request;
#[cfg(target_os = "linux")]
mod scatter;
#[cfg(target_os = "linux")]
mod validate;
#[cfg(target_os = "linux")]
mod view;

pub use config::{
    BrokerConfig, ConfigError, DEFAULT_LIST_LIMIT, DEFAULT_SIZE_LIMIT, ENV_LIST_LIMIT,
    ENV_PIN_LIMIT, ENV_PIN_MODE, ENV_SIZE_LIMIT_MB, PinMode,
};
pub use error::{ExportError, MapFailure, PinFailure, RequestFailure};
pub use flags::CreateFlags;

#[cfg(target_os = "linux")]
pub use broker::Broker;
#[cfg(target_os = "linux")]
pub use buffer::ExportedBuffer;
#[cfg(target_os = "linux")]
pub use request::{CreateItem, CreateRequest, CreateRequestList};
#[cfg(target_os = "linux")]
pub use scatter::{ScatterEntry, ScatterList};
#[cfg(target_os = "linux")]
pub use view::MappingView;
