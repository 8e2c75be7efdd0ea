// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Broker configuration.
//!
//! Defaults match the limits of the Linux udmabuf driver: at most 1024
//! scatter entries and 64 MiB per export.

use thiserror::Error;

/// Default maximum number of items in one list request.
pub const DEFAULT_LIST_LIMIT: usize = 1024;

/// Default maximum exported size: 64 MiB.
pub const DEFAULT_SIZE_LIMIT: u64 = 64 * 1024 * 1024;

/// Environment variable overriding [`BrokerConfig::list_limit`].
pub const ENV_LIST_LIMIT: &str = "SEALBUF_LIST_LIMIT";
/// Environment variable overriding [`BrokerConfig::size_limit`], in MiB.
pub const ENV_SIZE_LIMIT_MB: &str = "SEALBUF_SIZE_LIMIT_MB";
/// Environment variable overriding [`BrokerConfig::pin_mode`].
pub const ENV_PIN_MODE: &str = "SEALBUF_PIN_MODE";
/// Environment variable overriding [`BrokerConfig::pin_limit`], in bytes.
pub const ENV_PIN_LIMIT: &str = "SEALBUF_PIN_LIMIT";

/// How pinned ranges are held.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PinMode {
    /// Shared mapping + mlock (resident, never swapped)
    Locked,
    /// Shared mapping only (referenced, swappable)
    Mapped,
}

/// Errors parsing configuration overrides.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// The value is not an unsigned integer that fits the field.
    #[error("{key}: expected an unsigned integer, got {value:?}")]
    NotANumber {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
    },

    /// The value names no pin mode.
    #[error("{key}: expected `locked` or `mapped`, got {value:?}")]
    UnknownPinMode {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
    },

    /// The value is zero where a limit is expected.
    #[error("{key}: must be greater than zero")]
    Zero {
        /// Variable name.
        key: &'static str,
    },
}

/// Limits and pin policy for a [`Broker`](crate::Broker).
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Maximum items in one list request.
    pub list_limit: usize,
    /// Maximum total size of one export in bytes.
    pub size_limit: u64,
    /// How pins hold their pages.
    pub pin_mode: PinMode,
    /// Maximum bytes pinned at once across all live exports, if bounded.
    pub pin_limit: Option<u64>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            list_limit: DEFAULT_LIST_LIMIT,
            size_limit: DEFAULT_SIZE_LIMIT,
            pin_mode: PinMode::Locked,
            pin_limit: None,
        }
    }
}

impl BrokerConfig {
    /// Defaults overridden by `SEALBUF_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `SEALBUF_*` key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_LIST_LIMIT) {
            let limit = parse_nonzero(ENV_LIST_LIMIT, &value)?;
            config.list_limit =
                usize::try_from(limit).map_err(|_| ConfigError::NotANumber {
                    key: ENV_LIST_LIMIT,
                    value,
                })?;
        }

        if let Some(value) = lookup(ENV_SIZE_LIMIT_MB) {
            let mib = parse_nonzero(ENV_SIZE_LIMIT_MB, &value)?;
            config.size_limit = mib.saturating_mul(1024 * 1024);
        }

        if let Some(value) = lookup(ENV_PIN_MODE) {
            config.pin_mode = match value.trim().to_ascii_lowercase().as_str() {
                "locked" => PinMode::Locked,
                "mapped" => PinMode::Mapped,
                _ => {
                    return Err(ConfigError::UnknownPinMode {
                        key: ENV_PIN_MODE,
                        value,
                    });
                }
            };
        }

        if let Some(value) = lookup(ENV_PIN_LIMIT) {
            config.pin_limit = Some(parse_nonzero(ENV_PIN_LIMIT, &value)?);
        }

        Ok(config)
    }

    /// Set the maximum number of items in one list request.
    pub fn with_list_limit(mut self, list_limit: usize) -> Self {
        self.list_limit = list_limit;
        self
    }

    /// Set the maximum exported size in bytes.
    pub fn with_size_limit(mut self, size_limit: u64) -> Self {
        self.size_limit = size_limit;
        self
    }

    /// Set how pins hold their pages.
    pub fn with_pin_mode(mut self, pin_mode: PinMode) -> Self {
        self.pin_mode = pin_mode;
        self
    }

    /// Bound the bytes pinned at once (`None` for unbounded).
    pub fn with_pin_limit(mut self, pin_limit: Option<u64>) -> Self {
        self.pin_limit = pin_limit;
        self
    }
}

fn parse_nonzero(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    let parsed = value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::NotANumber {
            key,
            value: value.to_owned(),
        })?;

    if parsed == 0 {
        return Err(ConfigError::Zero { key });
    }

    Ok(parsed)
}
