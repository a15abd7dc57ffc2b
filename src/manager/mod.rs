// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device registry for command-driven switches and dimmers.
//!
//! # Overview
//!
//! The [`DeviceRegistry`] owns every configured device. It provides:
//!
//! - **Reconciliation**: apply a configured list, creating, updating and
//!   removing devices so the registry matches it
//! - **Host registration**: announce, refresh and withdraw accessories
//!   through a [`Bridge`](crate::bridge::Bridge)
//! - **Polling**: one background task per polled device, reporting observed
//!   changes to the host
//! - **Host calls**: get and set power and brightness by device name
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cmdswitch_lib::event::{DeviceEvent, EventBus};
//! use cmdswitch_lib::manager::{DeviceRegistry, PlatformConfig, SwitchConfig};
//! use cmdswitch_lib::types::PowerState;
//!
//! #[tokio::main]
//! async fn main() -> cmdswitch_lib::Result<()> {
//!     let bus = Arc::new(EventBus::new());
//!     let mut events = bus.subscribe();
//!     let registry = DeviceRegistry::from_config(&PlatformConfig::default(), bus);
//!
//!     registry
//!         .reconcile([SwitchConfig::new("Fan")
//!             .with_on_cmd("fanctl on")
//!             .with_off_cmd("fanctl off")
//!             .with_state_cmd("fanctl status")
//!             .with_polling(30)])
//!         .await;
//!
//!     registry.set_power("Fan", PowerState::On).await?;
//!
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             if let DeviceEvent::StateChanged { device_id, change, .. } = event {
//!                 println!("{device_id} changed: {change:?}");
//!             }
//!         }
//!     });
//!     Ok(())
//! }
//! ```

mod device_config;
mod device_record;
mod device_registry;
mod poller;

pub use device_config::{DEFAULT_PLATFORM, DeviceSettings, PlatformConfig, SwitchConfig};
pub use device_record::DeviceRecord;
pub use device_registry::{DeviceRegistry, ReconcileReport};
