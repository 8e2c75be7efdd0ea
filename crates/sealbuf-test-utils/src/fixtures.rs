// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Region fixtures shared by the broker tests and benches.

use sealbuf_region::{RegionOptions, SealedRegion, system_page_size};

/// Pages per scatter entry in the standard scenarios.
pub const NUM_PAGES: u64 = 4;

/// Scatter entries per list in the standard scenarios.
pub const NUM_ENTRIES: usize = 4;

/// Base pages per 2 MiB huge page on 4 KiB systems.
pub const HUGE_PAGE_FACTOR: u64 = 512;

/// Base page size of the running system.
pub fn page_size() -> u64 {
    system_page_size()
}

/// Size of a PMD-level huge page.
pub fn huge_page_size() -> u64 {
    page_size() * HUGE_PAGE_FACTOR
}

/// Fill byte used for chunk `index` in ordering scenarios.
pub fn pattern_for(index: usize) -> u8 {
    (index % 255) as u8
}

/// Creates a shrink-sealed shmem region of `pages` base pages.
pub fn sealed_region(pages: u64) -> SealedRegion {
    SealedRegion::create(pages * page_size(), &RegionOptions::default())
        .expect("Failed to create sealed region")
}

/// Creates a shrink-sealed region of `size` bytes whose every byte is `fill`.
pub fn sealed_region_filled(size: u64, fill: u8, options: &RegionOptions) -> SealedRegion {
    let region = SealedRegion::create(size, options).expect("Failed to create sealed region");

    let mut mapping = region.map_all().expect("Failed to map_all()");
    mapping.as_mut_slice().fill(fill);

    region
}

/// Creates a hugetlbfs-backed sealed region, or `None` when the host has no
/// huge pages reserved.
pub fn try_huge_region(size: u64) -> Option<SealedRegion> {
    let options = RegionOptions::default().with_huge_pages(true);

    let region = match SealedRegion::create(size, &options) {
        Ok(region) => region,
        Err(e) => {
            eprintln!("skipping: hugetlb memfd unavailable ({e})");
            return None;
        }
    };

    // hugetlbfs reserves pages at mmap time; a failed probe means no pool.
    if let Err(e) = region.map_all() {
        eprintln!("skipping: hugetlb pages not reserved ({e})");
        return None;
    }

    Some(region)
}

/// Writes `marker` into the first byte of every `stride`-sized page of `bytes`.
pub fn write_page_markers(bytes: &mut [u8], stride: usize, marker: u8) {
    for page in bytes.chunks_mut(stride) {
        page[0] = marker;
    }
}

/// Asserts every byte of `chunk` equals `expected`.
pub fn assert_chunk_filled(chunk: &[u8], expected: u8, label: usize) {
    if let Some(offset) = chunk.iter().position(|&b| b != expected) {
        panic!(
            "Data mismatch at scatter {label}, offset {offset}. Expected {expected}, got {}",
            chunk[offset]
        );
    }
}
