// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state management types.
//!
//! The [`DeviceState`] struct holds the cached power and brightness of a
//! device, while [`StateChange`] represents an individual update that can be
//! applied to it.
//!
//! # Examples
//!
//! ```
//! use cmdswitch_lib::state::{DeviceState, StateChange};
//! use cmdswitch_lib::types::{Brightness, PowerState};
//!
//! let mut state = DeviceState::new();
//! state.apply(&StateChange::Brightness(Brightness::clamped(60)));
//!
//! assert_eq!(state.brightness().value(), 60);
//! assert_eq!(state.power(), PowerState::Off);
//! ```

mod device_state;
mod state_change;

pub use device_state::DeviceState;
pub use state_change::StateChange;
