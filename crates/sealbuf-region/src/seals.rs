// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Seals - typed view over the `F_SEAL_*` bits of a memfd.

use core::fmt;
use core::ops::{BitOr, BitOrAssign};

/// A set of memfd seals.
#[derive(Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct Seals(u32);

impl Seals {
    /// No seals.
    pub const NONE: Seals = Seals(0);
    /// Further seals cannot be added.
    pub const SEAL: Seals = Seals(libc::F_SEAL_SEAL as u32);
    /// The file cannot shrink.
    pub const SHRINK: Seals = Seals(libc::F_SEAL_SHRINK as u32);
    /// The file cannot grow.
    pub const GROW: Seals = Seals(libc::F_SEAL_GROW as u32);
    /// The contents cannot be modified.
    pub const WRITE: Seals = Seals(libc::F_SEAL_WRITE as u32);

    /// Builds a seal set from raw `F_GET_SEALS` bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if every seal in `other` is present.
    pub const fn contains(self, other: Seals) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if no seal is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Seals {
    type Output = Seals;

    fn bitor(self, rhs: Seals) -> Seals {
        Seals(self.0 | rhs.0)
    }
}

impl BitOrAssign for Seals {
    fn bitor_assign(&mut self, rhs: Seals) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Seals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Seals::SEAL, "SEAL"),
            (Seals::SHRINK, "SHRINK"),
            (Seals::GROW, "GROW"),
            (Seals::WRITE, "WRITE"),
        ];

        let mut set = f.debug_set();
        for (seal, name) in names {
            if self.contains(seal) {
                set.entry(&format_args!("{name}"));
            }
        }
        set.finish()
    }
}
