// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! End-to-end export scenarios: ordering, coherence across writes, and
//! huge-page backed or promoted regions.

use std::os::fd::AsFd;

use sealbuf_region::{RegionOptions, SealedRegion};
use sealbuf_test_utils::{
    NUM_ENTRIES, NUM_PAGES, assert_chunk_filled, huge_page_size, page_size, pattern_for,
    sealed_region, sealed_region_filled, try_huge_region, write_page_markers,
};

use crate::flags::CreateFlags;
use crate::request::{CreateRequest, CreateRequestList};
use crate::view::MappingView;

use super::mapped_broker;

fn assert_chunks(view: &MappingView, chunk: u64, expected: impl Fn(usize) -> u8) {
    for (k, bytes) in view.as_slice().chunks(chunk as usize).enumerate() {
        assert_chunk_filled(bytes, expected(k), k);
    }
}

fn split_evenly(region: &SealedRegion, size: u64) -> CreateRequestList<'_> {
    let chunk = size / NUM_ENTRIES as u64;

    (0..NUM_ENTRIES as u64).fold(CreateRequestList::new(CreateFlags::CLOSE_ON_HANDOFF), |list, i| {
        list.with_item(region.as_fd(), i * chunk, chunk)
    })
}

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn test_single_region_full_range() {
    let broker = mapped_broker();
    let region = sealed_region(NUM_PAGES);

    let buffer = broker
        .create(CreateRequest::new(region.as_fd(), 0, page_size() * NUM_PAGES))
        .expect("Failed to create(..)");
    let view = broker.map(&buffer).expect("Failed to map(..)");

    assert_eq!(view.len() as u64, page_size() * NUM_PAGES);
}

#[test]
fn test_list_of_regions_preserves_order() {
    let broker = mapped_broker();
    let chunk = page_size() * NUM_PAGES;

    let regions: Vec<SealedRegion> = (0..NUM_ENTRIES)
        .map(|k| sealed_region_filled(chunk, pattern_for(k), &RegionOptions::default()))
        .collect();

    let request = regions
        .iter()
        .fold(CreateRequestList::new(CreateFlags::CLOSE_ON_HANDOFF), |list, region| {
            list.with_item(region.as_fd(), 0, chunk)
        });

    let buffer = broker
        .create_from_list(&request)
        .expect("Failed to create_from_list(..)");
    let view = broker.map(&buffer).expect("Failed to map(..)");

    assert_eq!(view.len() as u64, chunk * NUM_ENTRIES as u64);
    assert_chunks(&view, chunk, pattern_for);
}

#[test]
fn test_reversed_list_of_regions() {
    let broker = mapped_broker();
    let chunk = page_size() * NUM_PAGES;

    let regions: Vec<SealedRegion> = (0..NUM_ENTRIES)
        .map(|k| sealed_region_filled(chunk, pattern_for(k), &RegionOptions::default()))
        .collect();

    let request = regions
        .iter()
        .rev()
        .fold(CreateRequestList::new(CreateFlags::NONE), |list, region| {
            list.with_item(region.as_fd(), 0, chunk)
        });

    let buffer = broker
        .create_from_list(&request)
        .expect("Failed to create_from_list(..)");
    let view = broker.map(&buffer).expect("Failed to map(..)");

    assert_chunks(&view, chunk, |k| pattern_for(NUM_ENTRIES - 1 - k));
}

// =============================================================================
// Coherence
// =============================================================================

#[test]
fn test_writes_before_and_after_export_are_visible() {
    let broker = mapped_broker();
    let size = page_size() * NUM_PAGES * NUM_ENTRIES as u64;
    let region = sealed_region_filled(size, b'a', &RegionOptions::default());

    let buffer = broker
        .create_from_list(&split_evenly(&region, size))
        .expect("Failed to create_from_list(..)");
    let view = broker.map(&buffer).expect("Failed to map(..)");

    assert_chunks(&view, size / NUM_ENTRIES as u64, |_| b'a');

    region
        .map_all()
        .expect("Failed to map_all()")
        .as_mut_slice()
        .fill(b'b');

    assert_chunks(&view, size / NUM_ENTRIES as u64, |_| b'b');
}

#[test]
fn test_pin_before_first_write() {
    let broker = mapped_broker();
    let size = page_size() * NUM_PAGES * NUM_ENTRIES as u64;
    let region = sealed_region(NUM_PAGES * NUM_ENTRIES as u64);

    let buffer = broker
        .create_from_list(&split_evenly(&region, size))
        .expect("Failed to create_from_list(..)");

    {
        let mut source = region.map_all().expect("Failed to map_all()");
        for (k, chunk) in source
            .as_mut_slice()
            .chunks_mut((size / NUM_ENTRIES as u64) as usize)
            .enumerate()
        {
            chunk.fill(pattern_for(k + 1));
        }
    }

    let view = broker.map(&buffer).expect("Failed to map(..)");

    assert_chunks(&view, size / NUM_ENTRIES as u64, |k| pattern_for(k + 1));
}

// =============================================================================
// Huge pages
// =============================================================================

#[test]
fn test_hugetlb_region_split_into_entries() {
    let Some(region) = try_huge_region(huge_page_size() * NUM_ENTRIES as u64) else {
        return;
    };
    let broker = mapped_broker();
    let size = region.page_size() * NUM_ENTRIES as u64;
    let chunk = region.page_size();

    {
        let mut source = region.map_all().expect("Failed to map_all()");
        for (k, bytes) in source.as_mut_slice().chunks_mut(chunk as usize).enumerate() {
            bytes.fill(pattern_for(k + 7));
        }
    }

    // Reversed, so every entry lands away from its source offset.
    let request = (0..NUM_ENTRIES as u64)
        .rev()
        .fold(CreateRequestList::new(CreateFlags::NONE), |list, i| {
            list.with_item(region.as_fd(), i * chunk, chunk)
        });

    let buffer = broker
        .create_from_list(&request)
        .expect("Failed to create_from_list(..)");
    let view = broker.map(&buffer).expect("Failed to map(..)");

    assert_eq!(view.len() as u64, size);
    assert_eq!(view.as_ptr() as u64 % chunk, 0);
    assert_chunks(&view, chunk, |k| pattern_for(NUM_ENTRIES - 1 - k + 7));
}

#[test]
fn test_hugetlb_pin_then_write() {
    let Some(region) = try_huge_region(huge_page_size() * NUM_ENTRIES as u64) else {
        return;
    };
    let broker = mapped_broker();
    let size = region.page_size() * NUM_ENTRIES as u64;

    let buffer = broker
        .create_from_list(&split_evenly(&region, size))
        .expect("Failed to create_from_list(..)");

    region
        .map_all()
        .expect("Failed to map_all()")
        .as_mut_slice()
        .fill(b'h');

    let view = broker.map(&buffer).expect("Failed to map(..)");

    assert_chunks(&view, region.page_size(), |_| b'h');
}

#[test]
fn test_promotion_after_pin_keeps_view_coherent() {
    let broker = mapped_broker();
    let size = huge_page_size() * 2;
    let region = sealed_region(size / page_size());
    let stride = page_size() as usize;

    let buffer = broker
        .create_from_list(&split_evenly(&region, size))
        .expect("Failed to create_from_list(..)");
    let view = broker.map(&buffer).expect("Failed to map(..)");

    let mut source = region.map_all().expect("Failed to map_all()");
    write_page_markers(source.as_mut_slice(), stride, b'p');

    // THP may be disabled on the host; the hint is best-effort.
    let _ = source.advise_huge();
    write_page_markers(source.as_mut_slice(), stride, b'q');

    for (page, bytes) in view.as_slice().chunks(stride).enumerate() {
        assert_eq!(bytes[0], b'q', "Marker mismatch at page {page}");
        assert!(bytes[1..].iter().all(|&b| b == 0));
    }
}
