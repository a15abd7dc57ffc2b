// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for host notifications.
//!
//! The [`EventBus`] uses tokio's broadcast channel to fan out every call the
//! registry makes towards its host as a [`DeviceEvent`].
//!
//! # Examples
//!
//! ```
//! use cmdswitch_lib::event::{DeviceEvent, DeviceId, EventBus};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(DeviceEvent::Unregistered {
//!     device_id: DeviceId::from_name("TV"),
//! });
//! ```

mod device_event;
mod device_id;
mod event_bus;

pub use device_event::DeviceEvent;
pub use device_id::DeviceId;
pub use event_bus::EventBus;
