// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Test utilities for sealbuf crates.
//!
//! ## License
//!
//! GPL-3.0-only

#[cfg(target_os = "linux")]
mod fixtures;
#[cfg(target_os = "linux")]
mod seccomp;
mod subprocess;

#[cfg(target_os = "linux")]
pub use fixtures::{
    HUGE_PAGE_FACTOR, NUM_ENTRIES, NUM_PAGES, assert_chunk_filled, huge_page_size,
    page_size, pattern_for, sealed_region, sealed_region_filled, try_huge_region,
    write_page_markers,
};
#[cfg(target_os = "linux")]
pub use seccomp::{
    block_madvise, block_mlock, block_mmap, block_mmap_of_fd, is_seccomp_available,
};
pub use subprocess::run_test_as_subprocess;
