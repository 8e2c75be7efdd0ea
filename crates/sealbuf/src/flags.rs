// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use core::ops::{BitOr, BitOrAssign};

/// Creation flags carried by a request and by every handle derived from it.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct CreateFlags(u32);

impl CreateFlags {
    /// No flags.
    pub const NONE: CreateFlags = CreateFlags(0);

    /// Copies of the handle handed across a process boundary are not kept.
    pub const CLOSE_ON_HANDOFF: CreateFlags = CreateFlags(0x01);

    /// Every bit the broker understands.
    pub const ALL: CreateFlags = CreateFlags(Self::CLOSE_ON_HANDOFF.0);

    /// Builds flags from raw bits without checking them.
    pub const fn from_bits_retain(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns the bits outside [`CreateFlags::ALL`].
    pub const fn unknown_bits(self) -> u32 {
        self.0 & !Self::ALL.0
    }

    /// Returns true if every flag in `other` is set.
    pub const fn contains(self, other: CreateFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns a copy with `other` set or cleared.
    pub const fn with(self, other: CreateFlags, enabled: bool) -> Self {
        if enabled {
            Self(self.0 | other.0)
        } else {
            Self(self.0 & !other.0)
        }
    }
}

impl BitOr for CreateFlags {
    type Output = CreateFlags;

    fn bitor(self, rhs: CreateFlags) -> CreateFlags {
        CreateFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for CreateFlags {
    fn bitor_assign(&mut self, rhs: CreateFlags) {
        self.0 |= rhs.0;
    }
}
