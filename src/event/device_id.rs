// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identifier type.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for name-based device identifiers.
const DEVICE_NAMESPACE: Uuid = Uuid::from_u128(0x6c1f_4a2e_93d5_5b70_a8c4_2e19_f0d3_7b61);

/// Identifier a host uses to address a device.
///
/// Identifiers are derived from the device name (UUID v5), so a configured
/// name maps to the same identifier across restarts and the host can match
/// it against accessories it cached earlier.
///
/// # Examples
///
/// ```
/// use cmdswitch_lib::event::DeviceId;
///
/// assert_eq!(DeviceId::from_name("TV"), DeviceId::from_name("TV"));
/// assert_ne!(DeviceId::from_name("TV"), DeviceId::from_name("Lamp"));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(Uuid);

impl DeviceId {
    /// Derives the identifier for a device name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self(Uuid::new_v5(&DEVICE_NAMESPACE, name.as_bytes()))
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Show only first 8 characters for readability
        let short = &self.0.to_string()[..8];
        write!(f, "DeviceId({short}...)")
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<DeviceId> for Uuid {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}
