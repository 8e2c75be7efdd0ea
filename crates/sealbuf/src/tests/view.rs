// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Tests for MappingView.

use std::os::fd::AsFd;

use sealbuf_region::RegionOptions;
use sealbuf_test_utils::{NUM_PAGES, page_size, sealed_region, sealed_region_filled};

use crate::error::{ExportError, MapFailure};
use crate::flags::CreateFlags;
use crate::request::{CreateRequest, CreateRequestList};

use super::mapped_broker;

#[test]
fn test_view_covers_total_size() {
    let broker = mapped_broker();
    let region = sealed_region(NUM_PAGES);

    let buffer = broker
        .create(CreateRequest::new(region.as_fd(), 0, page_size() * NUM_PAGES))
        .expect("Failed to create(..)");
    let view = broker.map(&buffer).expect("Failed to map(..)");

    assert_eq!(view.len() as u64, page_size() * NUM_PAGES);
    assert_eq!(view.len() as u64, buffer.total_size());
    assert_eq!(view.buffer_id(), buffer.id());
    assert!(!view.is_empty());
}

#[test]
fn test_view_is_aligned_to_page_size() {
    let broker = mapped_broker();
    let region = sealed_region(NUM_PAGES);

    let buffer = broker
        .create(CreateRequest::new(region.as_fd(), page_size(), page_size()))
        .expect("Failed to create(..)");
    let view = broker.map(&buffer).expect("Failed to map(..)");

    assert_eq!(view.as_ptr() as u64 % page_size(), 0);
}

#[test]
fn test_entry_offset_selects_source_pages() {
    let broker = mapped_broker();
    let region = sealed_region(NUM_PAGES);
    let stride = page_size() as usize;

    {
        let mut source = region.map_all().expect("Failed to map_all()");
        for (page, chunk) in source.as_mut_slice().chunks_mut(stride).enumerate() {
            chunk.fill(page as u8 + 1);
        }
    }

    // Pages 2 then 0.
    let request = CreateRequestList::new(CreateFlags::NONE)
        .with_item(region.as_fd(), page_size() * 2, page_size())
        .with_item(region.as_fd(), 0, page_size());

    let buffer = broker
        .create_from_list(&request)
        .expect("Failed to create_from_list(..)");
    let view = broker.map(&buffer).expect("Failed to map(..)");

    assert!(view.as_slice()[..stride].iter().all(|&b| b == 3));
    assert!(view.as_slice()[stride..].iter().all(|&b| b == 1));
}

#[test]
fn test_writes_through_view_reach_source() {
    let broker = mapped_broker();
    let region = sealed_region(NUM_PAGES);

    let buffer = broker
        .create(CreateRequest::new(region.as_fd(), page_size(), page_size() * 2))
        .expect("Failed to create(..)");
    let mut view = broker.map(&buffer).expect("Failed to map(..)");

    view.as_mut_slice().fill(0xC3);

    let source = region.map_all().expect("Failed to map_all()");
    let stride = page_size() as usize;

    assert!(source.as_slice()[..stride].iter().all(|&b| b == 0));
    assert!(source.as_slice()[stride..stride * 3].iter().all(|&b| b == 0xC3));
    assert!(source.as_slice()[stride * 3..].iter().all(|&b| b == 0));
}

#[test]
fn test_two_views_alias() {
    let broker = mapped_broker();
    let region = sealed_region(NUM_PAGES);

    let buffer = broker
        .create(CreateRequest::new(region.as_fd(), 0, page_size()))
        .expect("Failed to create(..)");
    let mut writer = broker.map(&buffer).expect("Failed to map(..)");
    let reader = broker.map(&buffer).expect("Failed to map(..)");

    assert_ne!(writer.as_ptr(), reader.as_ptr());

    writer.as_mut_slice()[17] = 0x42;

    assert_eq!(reader.as_slice()[17], 0x42);
}

#[test]
fn test_overlapping_entries_alias_within_view() {
    let broker = mapped_broker();
    let region = sealed_region(NUM_PAGES);

    let request = CreateRequestList::new(CreateFlags::NONE)
        .with_item(region.as_fd(), 0, page_size())
        .with_item(region.as_fd(), 0, page_size());

    let buffer = broker
        .create_from_list(&request)
        .expect("Failed to create_from_list(..)");
    let mut view = broker.map(&buffer).expect("Failed to map(..)");

    view.as_mut_slice()[5] = 0x99;

    assert_eq!(view.as_slice()[page_size() as usize + 5], 0x99);
}

#[test]
fn test_export_outlives_source_descriptor() {
    let broker = mapped_broker();
    let region = sealed_region_filled(page_size() * NUM_PAGES, 0x5A, &RegionOptions::default());

    let buffer = broker
        .create(CreateRequest::new(region.as_fd(), 0, page_size() * NUM_PAGES))
        .expect("Failed to create(..)");

    drop(region);

    let view = broker.map(&buffer).expect("Failed to map(..)");

    assert!(view.as_slice().iter().all(|&b| b == 0x5A));
}

#[test]
fn test_translate() {
    let broker = mapped_broker();
    let region = sealed_region(NUM_PAGES);

    let request = CreateRequestList::new(CreateFlags::NONE)
        .with_item(region.as_fd(), page_size() * 3, page_size())
        .with_item(region.as_fd(), 0, page_size() * 2);

    let buffer = broker
        .create_from_list(&request)
        .expect("Failed to create_from_list(..)");
    let view = broker.map(&buffer).expect("Failed to map(..)");

    assert_eq!(view.translate(0), Some((0, 0)));
    assert_eq!(view.translate(page_size() + 1), Some((1, 1)));
    assert_eq!(view.translate(page_size() * 3), None);
}

#[test]
fn test_unmap_keeps_export_alive() {
    let broker = mapped_broker();
    let region = sealed_region(NUM_PAGES);

    let buffer = broker
        .create(CreateRequest::new(region.as_fd(), 0, page_size()))
        .expect("Failed to create(..)");
    let view = broker.map(&buffer).expect("Failed to map(..)");

    broker.unmap(view);

    assert_eq!(buffer.refcount(), 1);
    assert!(buffer.is_pinned());
    assert!(broker.map(&buffer).is_ok());
}

mod seccomp_map {
    use super::*;
    use sealbuf_test_utils::{block_mmap, is_seccomp_available, run_test_as_subprocess};

    #[test]
    #[ignore]
    fn subprocess_test_map_fails_when_mmap_blocked() {
        let broker = mapped_broker();
        let region = sealed_region(NUM_PAGES);
        let buffer = broker
            .create(CreateRequest::new(region.as_fd(), 0, page_size()))
            .expect("Failed to create(..)");

        block_mmap();

        let result = broker.map(&buffer);

        assert!(matches!(
            result,
            Err(ExportError::MappingFailed(MapFailure::Reserve))
        ));
        assert!(buffer.is_pinned());

        // The harness may need mmap to report; leave before it does.
        std::process::exit(0);
    }

    #[test]
    #[serial_test::serial(seccomp)]
    fn test_map_fails_when_mmap_blocked() {
        if !is_seccomp_available() {
            eprintln!("skipping: seccomp unavailable");
            return;
        }

        let exit_code = run_test_as_subprocess(
            "tests::view::seccomp_map::subprocess_test_map_fails_when_mmap_blocked",
        );

        assert_eq!(
            exit_code,
            Some(0),
            "Subprocess should exit cleanly after assertion"
        );
    }
}

mod seccomp_install {
    use std::os::fd::AsRawFd;

    use super::*;
    use sealbuf_test_utils::{block_mmap_of_fd, is_seccomp_available, run_test_as_subprocess};

    /// Live mappings of any region created with the default name.
    fn region_mappings() -> usize {
        std::fs::read_to_string("/proc/self/maps")
            .expect("Failed to read /proc/self/maps")
            .lines()
            .filter(|line| line.contains("memfd:sealbuf-region"))
            .count()
    }

    #[test]
    #[ignore]
    fn subprocess_test_failed_install_unmaps_installed_entries() {
        let broker = mapped_broker();
        let first = sealed_region(NUM_PAGES);
        let second = sealed_region(NUM_PAGES);

        let request = CreateRequestList::new(CreateFlags::NONE)
            .with_item(first.as_fd(), 0, page_size() * 2)
            .with_item(second.as_fd(), 0, page_size() * 2);
        let buffer = broker
            .create_from_list(&request)
            .expect("Failed to create_from_list(..)");

        let before = region_mappings();

        // Entry 0 installs over the reservation, entry 1 cannot.
        block_mmap_of_fd(buffer.entries()[1].region().as_fd().as_raw_fd());

        let result = broker.map(&buffer);

        assert!(matches!(
            result,
            Err(ExportError::MappingFailed(MapFailure::Install { index: 1 }))
        ));
        assert_eq!(region_mappings(), before);
        assert!(buffer.is_pinned());
    }

    #[test]
    #[serial_test::serial(seccomp)]
    fn test_failed_install_unmaps_installed_entries() {
        if !is_seccomp_available() {
            eprintln!("skipping: seccomp unavailable");
            return;
        }

        let exit_code = run_test_as_subprocess(
            "tests::view::seccomp_install::subprocess_test_failed_install_unmaps_installed_entries",
        );

        assert_eq!(
            exit_code,
            Some(0),
            "Subprocess should exit cleanly after assertion"
        );
    }
}
