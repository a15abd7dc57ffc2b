// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Brightness type for dimmable devices.
//!
//! This module provides a type-safe representation of brightness values,
//! ensuring values are always within the valid range of 0-100%, and the
//! request type accepted by a brightness control.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Brightness level as a percentage (0-100).
///
/// # Examples
///
/// ```
/// use cmdswitch_lib::types::Brightness;
///
/// let level = Brightness::new(75).unwrap();
/// assert_eq!(level.value(), 75);
///
/// assert_eq!(Brightness::MIN.value(), 0);
/// assert_eq!(Brightness::MAX.value(), 100);
///
/// // Invalid values return error
/// assert!(Brightness::new(101).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Brightness(u8);

impl Brightness {
    /// Minimum brightness value (0%).
    pub const MIN: Self = Self(0);

    /// Maximum brightness value (100%).
    pub const MAX: Self = Self(100);

    /// Creates a new brightness value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value exceeds 100.
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if value > 100 {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: 100,
                actual: u16::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a brightness value, clamping to the valid range.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdswitch_lib::types::Brightness;
    ///
    /// assert_eq!(Brightness::clamped(150).value(), 100);
    /// ```
    #[must_use]
    pub const fn clamped(value: u8) -> Self {
        if value > 100 { Self(100) } else { Self(value) }
    }

    /// Creates a brightness value from any unsigned integer, clamping to
    /// the valid range.
    #[must_use]
    pub fn saturating_from(value: u64) -> Self {
        Self::clamped(u8::try_from(value.min(100)).unwrap_or(100))
    }

    /// Scans text for the first run of ASCII digits and reads it as a
    /// percentage.
    ///
    /// Values above 100 are clamped. Returns `None` when the text holds no
    /// digits.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdswitch_lib::types::Brightness;
    ///
    /// assert_eq!(Brightness::scan("75%\n").map(|b| b.value()), Some(75));
    /// assert_eq!(Brightness::scan("level=40 of 100").map(|b| b.value()), Some(40));
    /// assert!(Brightness::scan("standby").is_none());
    /// ```
    #[must_use]
    pub fn scan(text: &str) -> Option<Self> {
        let start = text.find(|c: char| c.is_ascii_digit())?;
        let digits = &text[start..];
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        // A run too long for u64 is still far above 100.
        let value = digits[..end].parse::<u64>().unwrap_or(u64::MAX);
        Some(Self::saturating_from(value))
    }

    /// Returns the brightness percentage value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<u8> for Brightness {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Brightness> for u8 {
    fn from(value: Brightness) -> Self {
        value.0
    }
}

/// A write coming through a brightness control.
///
/// Hosts drive a dimmer's power toggle and its level slider through the
/// same handler, so a request is either a power flag or a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrightnessRequest {
    /// Power toggle routed through the brightness control.
    Power(bool),
    /// Explicit brightness level.
    Level(Brightness),
}

impl From<bool> for BrightnessRequest {
    fn from(value: bool) -> Self {
        Self::Power(value)
    }
}

impl From<Brightness> for BrightnessRequest {
    fn from(value: Brightness) -> Self {
        Self::Level(value)
    }
}
