// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device configuration types for the device registry.
//!
//! [`SwitchConfig`] is the raw, user-edited form and deserializes leniently.
//! [`DeviceSettings`] is the normalized form the rest of the crate works
//! with; converting one into the other is the only place a configuration
//! entry can be rejected.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::Capabilities;
use crate::bridge::AccessoryInfo;
use crate::controller::DimmingPolicy;
use crate::error::ConfigError;
use crate::runner::ExecutionMode;
use crate::state::DeviceState;
use crate::types::{Brightness, PowerState};

/// Platform identifier written by default.
pub const DEFAULT_PLATFORM: &str = "cmdSwitch2";

/// Smallest accepted poll interval and command timeout, in seconds.
const MIN_SECONDS: u64 = 1;

/// Top-level configuration: runner options plus the list of switches.
///
/// # Examples
///
/// ```
/// use cmdswitch_lib::manager::PlatformConfig;
/// use cmdswitch_lib::runner::ExecutionMode;
///
/// let config = PlatformConfig::from_json(r#"{
///     "platform": "cmdSwitch2",
///     "synchronous": true,
///     "switches": [
///         { "name": "TV", "on_cmd": "tv on", "off_cmd": "tv off", "timeout": "3" }
///     ]
/// }"#).unwrap();
///
/// assert_eq!(config.execution_mode(), ExecutionMode::Serialized);
/// assert_eq!(config.switches[0].timeout, Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Platform identifier.
    #[serde(default = "default_platform")]
    pub platform: String,
    /// Run every command through a single FIFO.
    #[serde(default)]
    pub synchronous: bool,
    /// Apply the command timeout to brightness commands as well.
    #[serde(default, alias = "optimisticDimming")]
    pub optimistic_dimming: bool,
    /// Configured switches.
    #[serde(default)]
    pub switches: Vec<SwitchConfig>,
}

fn default_platform() -> String {
    DEFAULT_PLATFORM.to_string()
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            platform: default_platform(),
            synchronous: false,
            optimistic_dimming: false,
            switches: Vec::new(),
        }
    }
}

impl PlatformConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, or
    /// `ConfigError::Json` if it is malformed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serializes the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns the runner mode selected by `synchronous`.
    #[must_use]
    pub fn execution_mode(&self) -> ExecutionMode {
        if self.synchronous {
            ExecutionMode::Serialized
        } else {
            ExecutionMode::Concurrent
        }
    }

    /// Returns the dimming policy selected by `optimistic_dimming`.
    #[must_use]
    pub fn dimming_policy(&self) -> DimmingPolicy {
        if self.optimistic_dimming {
            DimmingPolicy::OptimisticTimeout
        } else {
            DimmingPolicy::AwaitCompletion
        }
    }
}

/// Raw configuration of one switch, as written by the user.
///
/// Deserialization never fails on a field's value: numbers given as
/// strings are parsed, display strings accept any scalar, and anything
/// unusable falls back to the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchConfig {
    /// Unique device name.
    #[serde(default)]
    pub name: String,
    /// Command that turns the device on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_cmd: Option<String>,
    /// Command that turns the device off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub off_cmd: Option<String>,
    /// Command whose exit status tells whether the device is on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_cmd: Option<String>,
    /// Command that sets the brightness.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim_cmd: Option<String>,
    /// Poll `state_cmd` periodically.
    #[serde(default, deserialize_with = "strict_true")]
    pub polling: bool,
    /// Poll interval in seconds.
    #[serde(
        default,
        deserialize_with = "lenient_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub interval: Option<u64>,
    /// On/off command timeout in seconds.
    #[serde(
        default,
        deserialize_with = "lenient_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<u64>,
    /// Manufacturer shown by the host.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub manufacturer: Option<String>,
    /// Model shown by the host.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub model: Option<String>,
    /// Serial number shown by the host.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub serial: Option<String>,
    /// Initial brightness.
    #[serde(
        default,
        deserialize_with = "lenient_brightness",
        skip_serializing_if = "Option::is_none"
    )]
    pub brightness: Option<Brightness>,
}

impl SwitchConfig {
    /// Creates a configuration with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the on command.
    #[must_use]
    pub fn with_on_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.on_cmd = Some(cmd.into());
        self
    }

    /// Sets the off command.
    #[must_use]
    pub fn with_off_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.off_cmd = Some(cmd.into());
        self
    }

    /// Sets the state command.
    #[must_use]
    pub fn with_state_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.state_cmd = Some(cmd.into());
        self
    }

    /// Sets the brightness command.
    #[must_use]
    pub fn with_dim_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.dim_cmd = Some(cmd.into());
        self
    }

    /// Enables polling every `interval_secs` seconds.
    #[must_use]
    pub fn with_polling(mut self, interval_secs: u64) -> Self {
        self.polling = true;
        self.interval = Some(interval_secs);
        self
    }

    /// Sets the on/off command timeout.
    #[must_use]
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(secs);
        self
    }

    /// Sets the initial brightness.
    #[must_use]
    pub fn with_brightness(mut self, brightness: Brightness) -> Self {
        self.brightness = Some(brightness);
        self
    }

    /// Sets the manufacturer string.
    #[must_use]
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Sets the model string.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the serial number string.
    #[must_use]
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }
}

/// Normalized configuration of one device.
///
/// Blank commands are dropped, durations are at least one second, and the
/// name is guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSettings {
    /// Unique device name.
    pub name: String,
    /// Command that turns the device on.
    pub on_cmd: Option<String>,
    /// Command that turns the device off.
    pub off_cmd: Option<String>,
    /// Command whose exit status tells whether the device is on.
    pub state_cmd: Option<String>,
    /// Command that sets the brightness.
    pub dim_cmd: Option<String>,
    /// Polling requested.
    pub polling: bool,
    /// Poll interval.
    pub interval: Duration,
    /// On/off command timeout.
    pub timeout: Duration,
    /// Manufacturer shown by the host.
    pub manufacturer: Option<String>,
    /// Model shown by the host.
    pub model: Option<String>,
    /// Serial number shown by the host.
    pub serial: Option<String>,
    /// Configured brightness.
    pub brightness: Option<Brightness>,
}

impl TryFrom<SwitchConfig> for DeviceSettings {
    type Error = ConfigError;

    fn try_from(config: SwitchConfig) -> Result<Self, Self::Error> {
        if config.name.trim().is_empty() {
            return Err(ConfigError::MissingName);
        }

        Ok(Self {
            name: config.name,
            on_cmd: non_blank(config.on_cmd),
            off_cmd: non_blank(config.off_cmd),
            state_cmd: non_blank(config.state_cmd),
            dim_cmd: non_blank(config.dim_cmd),
            polling: config.polling,
            interval: seconds(config.interval),
            timeout: seconds(config.timeout),
            manufacturer: config.manufacturer,
            model: config.model,
            serial: config.serial,
            brightness: config.brightness,
        })
    }
}

impl DeviceSettings {
    /// Returns the command that drives the device to `state`.
    #[must_use]
    pub fn command_for(&self, state: PowerState) -> Option<&str> {
        match state {
            PowerState::On => self.on_cmd.as_deref(),
            PowerState::Off => self.off_cmd.as_deref(),
        }
    }

    /// Returns whether a poll timer should run for this device.
    #[must_use]
    pub fn polls(&self) -> bool {
        self.polling && self.state_cmd.is_some()
    }

    /// Returns the state a freshly created record starts in.
    ///
    /// A device with only an off command is assumed to be on.
    #[must_use]
    pub fn initial_state(&self) -> DeviceState {
        let power = PowerState::from(self.off_cmd.is_some() && self.on_cmd.is_none());
        DeviceState::with(power, self.brightness.unwrap_or_default())
    }

    /// Detects capabilities from the configured commands.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::from_settings(self)
    }

    /// Builds the metadata shown by the host.
    #[must_use]
    pub fn accessory_info(&self) -> AccessoryInfo {
        let mut info = AccessoryInfo::new(self.name.clone(), self.capabilities().kind());
        if let Some(manufacturer) = &self.manufacturer {
            info.manufacturer.clone_from(manufacturer);
        }
        if let Some(model) = &self.model {
            info.model.clone_from(model);
        }
        if let Some(serial) = &self.serial {
            info.serial.clone_from(serial);
        }
        info
    }

    /// Converts back to the raw form, with normalized values.
    #[must_use]
    pub fn to_config(&self) -> SwitchConfig {
        SwitchConfig {
            name: self.name.clone(),
            on_cmd: self.on_cmd.clone(),
            off_cmd: self.off_cmd.clone(),
            state_cmd: self.state_cmd.clone(),
            dim_cmd: self.dim_cmd.clone(),
            polling: self.polling,
            interval: Some(self.interval.as_secs()),
            timeout: Some(self.timeout.as_secs()),
            manufacturer: self.manufacturer.clone(),
            model: self.model.clone(),
            serial: self.serial.clone(),
            brightness: self.brightness,
        }
    }
}

fn non_blank(cmd: Option<String>) -> Option<String> {
    cmd.filter(|c| !c.trim().is_empty())
}

fn seconds(value: Option<u64>) -> Duration {
    Duration::from_secs(value.unwrap_or(MIN_SECONDS).max(MIN_SECONDS))
}

/// Parses the leading integer of a string, allowing surrounding whitespace
/// before it and anything after it.
fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

#[allow(clippy::cast_possible_truncation)]
fn value_as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|v| i64::try_from(v).unwrap_or(i64::MAX)))
            // "2.5" reads as 2, like the leading integer of a string.
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => leading_integer(s),
        _ => None,
    }
}

fn strict_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(matches!(value, Some(Value::Bool(true))))
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(value_as_integer)
        .and_then(|v| u64::try_from(v).ok())
        .filter(|&v| v > 0))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(true)) => Some("true".to_string()),
        _ => None,
    })
}

fn lenient_brightness<'de, D>(deserializer: D) -> Result<Option<Brightness>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(value_as_integer)
        .map(|v| Brightness::saturating_from(u64::try_from(v).unwrap_or(0))))
}
