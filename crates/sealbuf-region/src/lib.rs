// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Sealed memfd regions and shared mappings.
//!
//! This crate is the memory-manager side of `sealbuf`: it creates or resolves
//! anonymous shared memory segments, reads their live size and seal state, and
//! maps ranges of them read/write and shared.
//!
//! # Types
//!
//! - [`SealedRegion`]: a memfd (shmem or hugetlbfs) owned through a private
//!   descriptor. Size and seals are always read live from the kernel.
//! - [`Seals`]: the `F_SEAL_*` bit set.
//! - [`SharedMapping`]: a `MAP_SHARED` window with optional `mlock` and a
//!   transparent huge page hint.
//!
//! # Example
//!
//! ```rust
//! # #[cfg(target_os = "linux")]
//! fn example() -> Result<(), sealbuf_region::RegionError> {
//!     use sealbuf_region::{RegionOptions, SealedRegion, Seals, system_page_size};
//!
//!     let size = system_page_size() * 4;
//!     let region = SealedRegion::create(size, &RegionOptions::default())?;
//!     assert!(region.seals()?.contains(Seals::SHRINK));
//!
//!     let mut writer = region.map_all()?;
//!     writer.as_mut_slice()[0] = 0x61;
//!
//!     let reader = region.map(0, size)?;
//!     assert_eq!(reader.as_slice()[0], 0x61);
//!     Ok(())
//! }
//! # #[cfg(target_os = "linux")]
//! # example().unwrap();
//! ```

#![warn(missing_docs)]

#[cfg(all(test, target_os = "linux"))]
mod tests;

mod error;

#[cfg(target_os = "linux")]
mod mapping;
#[cfg(target_os = "linux")]
mod region;
#[cfg(target_os = "linux")]
mod seals;

pub use error::RegionError;

#[cfg(target_os = "linux")]
pub use mapping::SharedMapping;
#[cfg(target_os = "linux")]
pub use region::{RegionOptions, SealedRegion, system_page_size};
#[cfg(target_os = "linux")]
pub use seals::Seals;
