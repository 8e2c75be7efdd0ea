// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use crate::seals::Seals;

#[test]
fn test_contains() {
    let seals = Seals::SHRINK | Seals::GROW;

    assert!(seals.contains(Seals::SHRINK));
    assert!(seals.contains(Seals::GROW));
    assert!(seals.contains(Seals::SHRINK | Seals::GROW));
    assert!(!seals.contains(Seals::WRITE));
    assert!(seals.contains(Seals::NONE));
}

#[test]
fn test_bits_roundtrip_raw_fcntl_values() {
    let raw = (libc::F_SEAL_SHRINK | libc::F_SEAL_SEAL) as u32;
    let seals = Seals::from_bits(raw);

    assert_eq!(seals.bits(), raw);
    assert_eq!(seals, Seals::SHRINK | Seals::SEAL);
}

#[test]
fn test_bitor_assign() {
    let mut seals = Seals::NONE;
    assert!(seals.is_empty());

    seals |= Seals::WRITE;

    assert!(!seals.is_empty());
    assert!(seals.contains(Seals::WRITE));
}

#[test]
fn test_debug_lists_names() {
    let rendered = format!("{:?}", Seals::SHRINK | Seals::SEAL);

    assert!(rendered.contains("SHRINK"));
    assert!(rendered.contains("SEAL"));
    assert!(!rendered.contains("WRITE"));
    assert_eq!(format!("{:?}", Seals::NONE), "{}");
}
