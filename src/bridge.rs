// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outward interface towards the home-automation host.
//!
//! The registry never talks to a host API directly. Everything it needs from
//! the host (announcing accessories, withdrawing them, flagging them
//! reachable, pushing observed state) goes through the [`Bridge`] trait.
//! [`EventBus`](crate::event::EventBus) is the stock implementation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::DeviceId;
use crate::state::{DeviceState, StateChange};

/// Manufacturer shown when none is configured.
pub const DEFAULT_MANUFACTURER: &str = "Default-Manufacturer";
/// Model shown when none is configured.
pub const DEFAULT_MODEL: &str = "Default-Model";
/// Serial number shown when none is configured.
pub const DEFAULT_SERIAL: &str = "Default-SerialNumber";

/// Calls the registry makes towards its host.
///
/// Implementations must not block: they are invoked from registry methods
/// and from background poll tasks.
pub trait Bridge: Send + Sync {
    /// Announces a new accessory.
    fn register(&self, device_id: DeviceId, info: &AccessoryInfo);

    /// Refreshes the display metadata of a registered accessory.
    fn update_accessory(&self, device_id: DeviceId, info: &AccessoryInfo);

    /// Withdraws an accessory.
    fn unregister(&self, device_id: DeviceId);

    /// Flags an accessory as reachable or not.
    fn set_reachable(&self, device_id: DeviceId, reachable: bool);

    /// Reports a state change the host did not ask for.
    fn state_changed(&self, device_id: DeviceId, change: StateChange, new_state: DeviceState);
}

/// Shape of an accessory as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessoryKind {
    /// On/off switch.
    Switch,
    /// Dimmable light.
    Lightbulb,
}

impl fmt::Display for AccessoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Switch => write!(f, "switch"),
            Self::Lightbulb => write!(f, "lightbulb"),
        }
    }
}

/// Display metadata handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryInfo {
    /// Device name.
    pub name: String,
    /// Accessory shape.
    pub kind: AccessoryKind,
    /// Manufacturer string.
    pub manufacturer: String,
    /// Model string.
    pub model: String,
    /// Serial number string.
    pub serial: String,
}

impl AccessoryInfo {
    /// Creates metadata with the default manufacturer, model and serial.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: AccessoryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            manufacturer: DEFAULT_MANUFACTURER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            serial: DEFAULT_SERIAL.to_string(),
        }
    }
}
