// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State change representation.
//!
//! State changes describe a single observed update to a
//! [`DeviceState`](super::DeviceState). They are applied to the cache and
//! forwarded to the host whenever the change was observed rather than
//! requested (a poll result, a pulse revert, the registration refresh).

use serde::{Deserialize, Serialize};

use crate::types::{Brightness, PowerState};

/// Represents a change in device state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateChange {
    /// Power state changed.
    Power(PowerState),
    /// Brightness level changed.
    Brightness(Brightness),
}

impl StateChange {
    /// Creates a power change from a boolean.
    #[must_use]
    pub fn power(on: bool) -> Self {
        Self::Power(PowerState::from(on))
    }

    /// Returns `true` if this is a power change.
    #[must_use]
    pub fn is_power(&self) -> bool {
        matches!(self, Self::Power(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_constructor() {
        assert_eq!(StateChange::power(true), StateChange::Power(PowerState::On));
        assert!(StateChange::power(false).is_power());
        assert!(!StateChange::Brightness(Brightness::MAX).is_power());
    }
}
