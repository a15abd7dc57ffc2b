// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `cmdswitch` library.
//!
//! This module provides the error hierarchy for the library: value
//! validation, shell command execution, configuration loading, and
//! registry lookups.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// A shell command could not be run or exited unsuccessfully.
    #[error("process error: {0}")]
    Process(#[from] ProcessError),

    /// The configuration is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// No device with this name is registered.
    #[error("device not found: {0}")]
    DeviceNotFound(String),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// An invalid power state string was provided.
    #[error("invalid power state: {0}")]
    InvalidPowerState(String),
}

/// Errors raised while running a shell command.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The shell could not be started.
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        /// The command line.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The command ran but did not exit successfully.
    #[error("`{command}` exited with {}", describe_code(.code.as_ref()))]
    Exited {
        /// The command line.
        command: String,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// The runner went away before reporting a result.
    #[error("`{command}` was dropped before it completed")]
    Abandoned {
        /// The command line.
        command: String,
    },
}

impl ProcessError {
    /// Returns the command line that failed.
    #[must_use]
    pub fn command(&self) -> &str {
        match self {
            Self::Spawn { command, .. }
            | Self::Exited { command, .. }
            | Self::Abandoned { command } => command,
        }
    }
}

fn describe_code(code: Option<&i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Errors related to parsing command output.
///
/// These are recovered internally (the cached value is kept) and never
/// returned from the public API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The output does not contain any digits.
    #[error("no brightness value in output {0:?}")]
    NoDigits(String),
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A switch entry has no name.
    #[error("switch name is missing")]
    MissingName,

    /// The configuration is not valid JSON for this schema.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for this library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::OutOfRange {
            min: 0,
            max: 100,
            actual: 150,
        };
        assert_eq!(err.to_string(), "value 150 is out of range [0, 100]");
    }

    #[test]
    fn exited_error_display() {
        let err = ProcessError::Exited {
            command: "wakeonlan aa:bb".to_string(),
            code: Some(2),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "`wakeonlan aa:bb` exited with status 2");

        let err = ProcessError::Exited {
            command: "sleep 10".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "`sleep 10` exited with a signal");
    }

    #[test]
    fn process_error_command() {
        let err = ProcessError::Abandoned {
            command: "true".to_string(),
        };
        assert_eq!(err.command(), "true");
    }

    #[test]
    fn error_from_config_error() {
        let err: Error = ConfigError::MissingName.into();
        assert!(matches!(err, Error::Config(ConfigError::MissingName)));
        assert_eq!(err.to_string(), "config error: switch name is missing");
    }

    #[test]
    fn device_not_found_display() {
        let err = Error::DeviceNotFound("TV".to_string());
        assert_eq!(err.to_string(), "device not found: TV");
    }
}
