// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for device control.
//!
//! # Types
//!
//! - [`PowerState`] - On/Off state of a device
//! - [`Brightness`] - Brightness level (0-100%)
//! - [`BrightnessRequest`] - A write coming through a brightness control

mod brightness;
mod power;

pub use brightness::{Brightness, BrightnessRequest};
pub use power::PowerState;
