// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cached device state.

use serde::{Deserialize, Serialize};

use crate::types::{Brightness, PowerState};

use super::StateChange;

/// Last known (or assumed) state of a command-driven device.
///
/// There is no "unknown" state: a device that was never queried carries
/// its configured default.
///
/// # Examples
///
/// ```
/// use cmdswitch_lib::state::{DeviceState, StateChange};
/// use cmdswitch_lib::types::PowerState;
///
/// let mut state = DeviceState::new();
/// assert!(state.apply(&StateChange::Power(PowerState::On)));
/// assert!(state.is_on());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    power: PowerState,
    brightness: Brightness,
}

impl DeviceState {
    /// Creates a state that is off at 0% brightness.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state with the given values.
    #[must_use]
    pub fn with(power: PowerState, brightness: Brightness) -> Self {
        Self { power, brightness }
    }

    /// Gets the power state.
    #[must_use]
    pub fn power(&self) -> PowerState {
        self.power
    }

    /// Returns `true` if the device is on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.power.is_on()
    }

    /// Sets the power state.
    pub fn set_power(&mut self, power: PowerState) {
        self.power = power;
    }

    /// Gets the brightness level.
    #[must_use]
    pub fn brightness(&self) -> Brightness {
        self.brightness
    }

    /// Sets the brightness level.
    pub fn set_brightness(&mut self, brightness: Brightness) {
        self.brightness = brightness;
    }

    /// Applies a state change and returns whether the state actually changed.
    pub fn apply(&mut self, change: &StateChange) -> bool {
        match change {
            StateChange::Power(power) => {
                let changed = self.power != *power;
                self.power = *power;
                changed
            }
            StateChange::Brightness(level) => {
                let changed = self.brightness != *level;
                self.brightness = *level;
                changed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_off() {
        let state = DeviceState::new();
        assert_eq!(state.power(), PowerState::Off);
        assert_eq!(state.brightness(), Brightness::MIN);
    }

    #[test]
    fn apply_power_change() {
        let mut state = DeviceState::new();
        let change = StateChange::Power(PowerState::On);

        assert!(state.apply(&change));
        assert!(state.is_on());

        // Applying same state returns false
        assert!(!state.apply(&change));
    }

    #[test]
    fn apply_brightness_change() {
        let mut state = DeviceState::new();
        let change = StateChange::Brightness(Brightness::clamped(40));

        assert!(state.apply(&change));
        assert_eq!(state.brightness().value(), 40);
        assert!(!state.apply(&change));
        assert!(!state.is_on());
    }

    #[test]
    fn with_sets_both_fields() {
        let state = DeviceState::with(PowerState::On, Brightness::MAX);
        assert!(state.is_on());
        assert_eq!(state.brightness(), Brightness::MAX);
    }
}
