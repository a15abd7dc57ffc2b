// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device event types.

use crate::bridge::AccessoryInfo;
use crate::state::{DeviceState, StateChange};

use super::DeviceId;

/// Events emitted towards the host.
///
/// Each variant mirrors one call of the [`Bridge`](crate::bridge::Bridge)
/// trait, so a host can follow registry activity by subscribing to an
/// [`EventBus`](super::EventBus).
#[derive(Debug, Clone)]
pub enum DeviceEvent {
    /// A device was registered with the host.
    Registered {
        /// The ID of the device.
        device_id: DeviceId,
        /// Display metadata.
        info: AccessoryInfo,
    },

    /// A device's display metadata was refreshed.
    Updated {
        /// The ID of the device.
        device_id: DeviceId,
        /// Display metadata.
        info: AccessoryInfo,
    },

    /// A device was unregistered from the host.
    Unregistered {
        /// The ID of the device.
        device_id: DeviceId,
    },

    /// A device's reachability changed.
    ReachabilityChanged {
        /// The ID of the device.
        device_id: DeviceId,
        /// Whether the device is reachable.
        reachable: bool,
    },

    /// An externally observed state change.
    StateChanged {
        /// The ID of the device.
        device_id: DeviceId,
        /// The specific change that occurred.
        change: StateChange,
        /// The complete new state of the device.
        new_state: DeviceState,
    },
}

impl DeviceEvent {
    /// Returns the device ID associated with this event.
    #[must_use]
    pub fn device_id(&self) -> DeviceId {
        match self {
            Self::Registered { device_id, .. }
            | Self::Updated { device_id, .. }
            | Self::Unregistered { device_id }
            | Self::ReachabilityChanged { device_id, .. }
            | Self::StateChanged { device_id, .. } => *device_id,
        }
    }

    /// Returns `true` if this is a registration lifecycle event.
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::Registered { .. } | Self::Unregistered { .. }
        )
    }

    /// Returns `true` if this is a state change event.
    #[must_use]
    pub fn is_state_change(&self) -> bool {
        matches!(self, Self::StateChanged { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PowerState;

    #[test]
    fn device_id_accessor() {
        let device_id = DeviceId::from_name("TV");
        let event = DeviceEvent::Unregistered { device_id };
        assert_eq!(event.device_id(), device_id);
        assert!(event.is_lifecycle());
        assert!(!event.is_state_change());
    }

    #[test]
    fn state_changed_is_not_lifecycle() {
        let event = DeviceEvent::StateChanged {
            device_id: DeviceId::from_name("TV"),
            change: StateChange::Power(PowerState::On),
            new_state: DeviceState::new(),
        };
        assert!(event.is_state_change());
        assert!(!event.is_lifecycle());
    }
}
