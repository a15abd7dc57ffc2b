// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device capabilities detection.
//!
//! A command-driven device can do exactly what its configured commands let
//! it do. Capabilities are therefore never configured directly: they are
//! derived from which commands are present.

use crate::bridge::AccessoryKind;
use crate::manager::DeviceSettings;
use crate::types::PowerState;

/// What a device can do, derived from its commands.
///
/// # Examples
///
/// ```
/// use cmdswitch_lib::Capabilities;
/// use cmdswitch_lib::bridge::AccessoryKind;
/// use cmdswitch_lib::types::PowerState;
///
/// // A doorbell-style button: one command, no way to query it
/// let button = Capabilities {
///     power_on: true,
///     power_off: false,
///     state_query: false,
///     dimmer: false,
/// };
/// assert!(button.reverts_after(PowerState::On));
/// assert_eq!(button.kind(), AccessoryKind::Switch);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
// Each flag mirrors one independently optional command.
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    /// Has an `on_cmd`.
    pub power_on: bool,

    /// Has an `off_cmd`.
    pub power_off: bool,

    /// Has a `state_cmd`.
    pub state_query: bool,

    /// Has a `dim_cmd`.
    pub dimmer: bool,
}

impl Capabilities {
    /// Detects capabilities from normalized settings.
    #[must_use]
    pub fn from_settings(settings: &DeviceSettings) -> Self {
        Self {
            power_on: settings.on_cmd.is_some(),
            power_off: settings.off_cmd.is_some(),
            state_query: settings.state_cmd.is_some(),
            dimmer: settings.dim_cmd.is_some(),
        }
    }

    /// Returns the accessory shape the host should see.
    #[must_use]
    pub const fn kind(&self) -> AccessoryKind {
        if self.dimmer {
            AccessoryKind::Lightbulb
        } else {
            AccessoryKind::Switch
        }
    }

    /// Returns whether the device can be driven to `state` by a command.
    #[must_use]
    pub const fn can_switch_to(&self, state: PowerState) -> bool {
        match state {
            PowerState::On => self.power_on,
            PowerState::Off => self.power_off,
        }
    }

    /// Returns whether a successful switch to `target` must be undone.
    ///
    /// True when nothing can bring the device back from `target` and
    /// nothing can report its real state: the command is a one-shot
    /// trigger and the cached state falls back after a short delay.
    #[must_use]
    pub const fn reverts_after(&self, target: PowerState) -> bool {
        let back = match target {
            PowerState::On => PowerState::Off,
            PowerState::Off => PowerState::On,
        };
        !self.state_query && !self.can_switch_to(back)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::SwitchConfig;

    fn detect(config: SwitchConfig) -> Capabilities {
        let settings = DeviceSettings::try_from(config).unwrap();
        Capabilities::from_settings(&settings)
    }

    #[test]
    fn full_switch() {
        let caps = detect(
            SwitchConfig::new("TV")
                .with_on_cmd("tv on")
                .with_off_cmd("tv off")
                .with_state_cmd("tv status"),
        );

        assert!(caps.power_on && caps.power_off && caps.state_query);
        assert!(!caps.reverts_after(PowerState::On));
        assert!(!caps.reverts_after(PowerState::Off));
        assert_eq!(caps.kind(), AccessoryKind::Switch);
    }

    #[test]
    fn dimmer_is_lightbulb() {
        let caps = detect(SwitchConfig::new("Lamp").with_dim_cmd("lamp dim"));
        assert_eq!(caps.kind(), AccessoryKind::Lightbulb);
    }

    #[test]
    fn blank_command_is_absent() {
        let caps = detect(SwitchConfig::new("Lamp").with_on_cmd("   "));
        assert!(!caps.power_on);
    }

    #[test]
    fn on_only_button_reverts_after_on() {
        let caps = detect(SwitchConfig::new("Bell").with_on_cmd("ring"));

        assert!(caps.reverts_after(PowerState::On));
        assert!(!caps.reverts_after(PowerState::Off));
    }

    #[test]
    fn state_query_prevents_revert() {
        let caps = detect(
            SwitchConfig::new("Bell")
                .with_on_cmd("ring")
                .with_state_cmd("ringing"),
        );
        assert!(!caps.reverts_after(PowerState::On));
    }
}
