// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

mod scenarios;
mod view;

use crate::{Broker, BrokerConfig, PinMode};

/// Broker whose pins map without mlock, so bulk scenarios do not depend on RLIMIT_MEMLOCK.
pub(crate) fn mapped_broker() -> Broker {
    Broker::new(BrokerConfig::default().with_pin_mode(PinMode::Mapped))
}
