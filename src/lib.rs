// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `cmdswitch_lib` - Switches and dimmers driven by shell commands.
//!
//! Each device is a set of shell commands: one to turn it on, one to turn it
//! off, one whose exit status tells whether it is on, and one that sets its
//! brightness. The library keeps a cached state per device and reconciles it
//! with whatever those commands report, however slow or unreliable they are.
//!
//! # Supported Features
//!
//! - **Power control**: On/off commands raced against a timeout, with
//!   optimistic success when a command hangs
//! - **Brightness control**: Target level passed to the dim command through
//!   the `HB_BRIGHTNESS` environment variable
//! - **State polling**: Periodic state reads, with changes reported to the host
//! - **Momentary switches**: One-shot commands whose state falls back after a
//!   second
//! - **Serialized execution**: Optionally run every command through a single
//!   FIFO
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cmdswitch_lib::event::EventBus;
//! use cmdswitch_lib::manager::{DeviceRegistry, PlatformConfig};
//! use cmdswitch_lib::types::{Brightness, PowerState};
//!
//! #[tokio::main]
//! async fn main() -> cmdswitch_lib::Result<()> {
//!     let config = PlatformConfig::from_json(r#"{
//!         "switches": [
//!             { "name": "TV", "on_cmd": "tvctl on", "off_cmd": "tvctl off",
//!               "state_cmd": "tvctl status", "timeout": 3 },
//!             { "name": "Lamp", "on_cmd": "lampctl on", "off_cmd": "lampctl off",
//!               "dim_cmd": "lampctl dim $HB_BRIGHTNESS" }
//!         ]
//!     }"#)?;
//!
//!     let registry = DeviceRegistry::from_config(&config, Arc::new(EventBus::new()));
//!     registry.reconcile(config.switches.clone()).await;
//!
//!     registry.set_power("TV", PowerState::On).await?;
//!     registry.set_brightness("Lamp", Brightness::new(40)?).await?;
//!
//!     let on = registry.get_power("TV").await?;
//!     println!("TV is {on}");
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`runner`]: starts processes, concurrently or one at a time
//! - [`controller`]: per-device get/set logic and the timeout race
//! - [`manager`]: the device registry, configuration and polling
//! - [`bridge`] and [`event`]: what the registry tells its host

pub mod bridge;
mod capabilities;
pub mod controller;
pub mod error;
pub mod event;
pub mod manager;
pub mod runner;
pub mod state;
pub mod types;

pub use bridge::{AccessoryInfo, AccessoryKind, Bridge};
pub use capabilities::Capabilities;
pub use controller::{DimmingPolicy, SetOutcome, StateController};
pub use error::{ConfigError, Error, ParseError, ProcessError, Result, ValueError};
pub use manager::{DeviceRegistry, PlatformConfig, SwitchConfig};
pub use runner::{CommandRunner, ExecutionMode};
pub use types::{Brightness, BrightnessRequest, PowerState};
