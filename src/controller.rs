// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device state logic on top of the command runner.
//!
//! The [`StateController`] reads and changes a device's state by running its
//! configured commands, and keeps the record's cached state consistent with
//! what those commands report. It holds no per-device data of its own: every
//! operation receives the [`DeviceRecord`] it acts on.
//!
//! # Timeouts
//!
//! Switching on or off races the command against the device's timeout. If
//! the deadline elapses first, the switch is assumed to have worked: the
//! cache takes the target state, success is reported, and the command is
//! left running with its eventual result discarded.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bridge::Bridge;
use crate::error::{ParseError, ProcessError};
use crate::manager::DeviceRecord;
use crate::runner::{CommandOutput, CommandRunner, Completion, Invocation};
use crate::state::StateChange;
use crate::types::{Brightness, BrightnessRequest, PowerState};

/// Delay after which a momentary switch falls back to its resting state.
pub const PULSE_REVERT_DELAY: Duration = Duration::from_secs(1);

/// Environment variable carrying the target brightness to `dim_cmd`.
pub const BRIGHTNESS_ENV_VAR: &str = "HB_BRIGHTNESS";

/// Whether brightness commands are raced against the device timeout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimmingPolicy {
    /// Wait for the brightness command to finish and report its result.
    #[default]
    AwaitCompletion,
    /// Report success once the timeout elapses, like on/off commands.
    OptimisticTimeout,
}

/// How a successful set operation came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// No command is configured; only the cache was updated.
    CacheOnly,
    /// The command finished successfully.
    Confirmed,
    /// The command failed, but the device was already in the target state.
    ToleratedFailure,
    /// The command did not finish before the timeout and success was assumed.
    AssumedAfterTimeout,
    /// Nothing had to be done.
    Unchanged,
}

/// First of the command's completion and its deadline.
enum Settled {
    Completed(Result<CommandOutput, ProcessError>),
    TimedOut,
}

async fn settle(completion: Completion, deadline: Option<Duration>) -> Settled {
    let Some(deadline) = deadline else {
        return Settled::Completed(completion.await);
    };

    tokio::select! {
        biased;
        result = completion => Settled::Completed(result),
        () = tokio::time::sleep(deadline) => Settled::TimedOut,
    }
}

/// Reads and changes device state through shell commands.
///
/// Cloning is cheap; clones share the runner and the bridge.
#[derive(Clone)]
pub struct StateController {
    runner: CommandRunner,
    bridge: Arc<dyn Bridge>,
    dimming: DimmingPolicy,
}

impl fmt::Debug for StateController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateController")
            .field("runner", &self.runner)
            .field("dimming", &self.dimming)
            .finish_non_exhaustive()
    }
}

impl StateController {
    /// Creates a controller that reports unrequested changes to `bridge`.
    #[must_use]
    pub fn new(runner: CommandRunner, bridge: Arc<dyn Bridge>) -> Self {
        Self {
            runner,
            bridge,
            dimming: DimmingPolicy::default(),
        }
    }

    /// Sets the dimming policy.
    #[must_use]
    pub fn with_dimming_policy(mut self, policy: DimmingPolicy) -> Self {
        self.dimming = policy;
        self
    }

    /// Returns the command runner.
    #[must_use]
    pub fn runner(&self) -> &CommandRunner {
        &self.runner
    }

    /// Returns the host bridge.
    #[must_use]
    pub fn bridge(&self) -> &Arc<dyn Bridge> {
        &self.bridge
    }

    /// Returns the dimming policy.
    #[must_use]
    pub fn dimming_policy(&self) -> DimmingPolicy {
        self.dimming
    }

    /// Reads the power state.
    ///
    /// Without a state command the cached value is returned and no process
    /// is started. Otherwise the device is on if the state command exits
    /// successfully. The cache is not updated.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError` if the state command could not be run.
    pub async fn get_state(&self, device: &DeviceRecord) -> Result<PowerState, ProcessError> {
        let Some(cmd) = device.settings().state_cmd.as_deref() else {
            return Ok(device.state().power());
        };

        let output = self
            .runner
            .submit(Invocation::new(cmd))
            .await
            .inspect_err(|e| {
                warn!(device = %device.name(), error = %e, "Failed to read state");
            })?;
        log_stderr(device, &output);

        Ok(PowerState::from(output.success()))
    }

    /// Switches the device on or off.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError` if the command fails and the cached state
    /// differs from `target`. A failure while already in `target` is
    /// tolerated.
    pub async fn set_state(
        &self,
        device: &DeviceRecord,
        target: PowerState,
    ) -> Result<SetOutcome, ProcessError> {
        let settings = device.settings();
        let name = device.name();

        let Some(cmd) = settings.command_for(target) else {
            device.apply(&StateChange::Power(target));
            debug!(device = %name, state = %target, "No command configured, state cached");
            return Ok(SetOutcome::CacheOnly);
        };

        let previous = device.state().power();
        let completion = self.runner.submit(Invocation::new(cmd));

        let outcome = match settle(completion, Some(settings.timeout)).await {
            Settled::Completed(result) => match result.and_then(|output| output.check(cmd)) {
                Ok(_) => {
                    info!(device = %name, state = %target, "{name} is turned {target}");
                    SetOutcome::Confirmed
                }
                Err(e) if target != previous => {
                    warn!(device = %name, state = %target, error = %e, "Failed to turn {target} {name}");
                    return Err(e);
                }
                Err(e) => {
                    debug!(device = %name, state = %target, error = %e, "Command failed, already {target}");
                    SetOutcome::ToleratedFailure
                }
            },
            Settled::TimedOut => {
                warn!(
                    device = %name,
                    state = %target,
                    timeout_secs = settings.timeout.as_secs(),
                    "Turning {target} {name} took too long, assuming success"
                );
                SetOutcome::AssumedAfterTimeout
            }
        };

        device.apply(&StateChange::Power(target));

        if device.capabilities().reverts_after(target) {
            self.schedule_revert(device, target);
        }

        Ok(outcome)
    }

    /// Sets the brightness, or switches the device through its brightness
    /// control.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError` if the command fails.
    pub async fn set_brightness(
        &self,
        device: &DeviceRecord,
        request: BrightnessRequest,
    ) -> Result<SetOutcome, ProcessError> {
        match request {
            BrightnessRequest::Power(false) => self.set_state(device, PowerState::Off).await,
            BrightnessRequest::Power(true) if device.state().is_on() => Ok(SetOutcome::Unchanged),
            BrightnessRequest::Power(true) => {
                device.apply(&StateChange::Power(PowerState::On));
                let level = device.state().brightness();
                self.dim(device, level).await
            }
            BrightnessRequest::Level(level) => {
                device.apply(&StateChange::Brightness(level));
                self.dim(device, level).await
            }
        }
    }

    async fn dim(
        &self,
        device: &DeviceRecord,
        level: Brightness,
    ) -> Result<SetOutcome, ProcessError> {
        let settings = device.settings();
        let name = device.name();

        let Some(cmd) = settings.dim_cmd.as_deref() else {
            debug!(device = %name, brightness = level.value(), "No dim command, brightness cached");
            return Ok(SetOutcome::CacheOnly);
        };

        let invocation =
            Invocation::new(cmd).with_env(BRIGHTNESS_ENV_VAR, level.value().to_string());
        let deadline = match self.dimming {
            DimmingPolicy::AwaitCompletion => None,
            DimmingPolicy::OptimisticTimeout => Some(settings.timeout),
        };

        match settle(self.runner.submit(invocation), deadline).await {
            Settled::Completed(result) => {
                result.and_then(|output| output.check(cmd)).inspect_err(|e| {
                    warn!(device = %name, error = %e, "Failed to dim {name}");
                })?;
                info!(device = %name, brightness = level.value(), "{name} dimmed to {level}");
                Ok(SetOutcome::Confirmed)
            }
            Settled::TimedOut => {
                warn!(
                    device = %name,
                    brightness = level.value(),
                    "Dimming {name} took too long, assuming success"
                );
                Ok(SetOutcome::AssumedAfterTimeout)
            }
        }
    }

    /// Reads the brightness from the state command's output.
    ///
    /// The first run of digits in standard output is taken as the level and
    /// cached. Output without digits leaves the cache alone, and the cached
    /// level is returned. Without a state command the cached level is
    /// returned directly.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError` if the state command could not be run.
    pub async fn get_brightness(&self, device: &DeviceRecord) -> Result<Brightness, ProcessError> {
        let Some(cmd) = device.settings().state_cmd.as_deref() else {
            return Ok(device.state().brightness());
        };

        let output = self
            .runner
            .submit(Invocation::new(cmd))
            .await
            .inspect_err(|e| {
                warn!(device = %device.name(), error = %e, "Failed to read brightness");
            })?;
        log_stderr(device, &output);

        if let Some(level) = Brightness::scan(&output.stdout) {
            device.apply(&StateChange::Brightness(level));
            return Ok(level);
        }

        let e = ParseError::NoDigits(output.stdout.trim().to_string());
        debug!(device = %device.name(), error = %e, "Keeping cached brightness");
        Ok(device.state().brightness())
    }

    /// Re-reads the power state and reports a difference to the host.
    ///
    /// Returns the observed state, or `None` if it could not be read (the
    /// failure is logged and the cache kept).
    pub async fn sync_power(&self, device: &DeviceRecord) -> Option<PowerState> {
        let power = self.get_state(device).await.ok()?;
        let change = StateChange::Power(power);

        if device.apply(&change) {
            info!(device = %device.name(), state = %power, "{} is turned {power}", device.name());
            self.bridge.state_changed(device.id(), change, device.state());
        }
        Some(power)
    }

    /// Re-reads the brightness and reports a difference to the host.
    pub async fn sync_brightness(&self, device: &DeviceRecord) -> Option<Brightness> {
        let before = device.state().brightness();
        let level = self.get_brightness(device).await.ok()?;

        if level != before {
            self.bridge
                .state_changed(device.id(), StateChange::Brightness(level), device.state());
        }
        Some(level)
    }

    fn schedule_revert(&self, device: &DeviceRecord, target: PowerState) {
        let id = device.id();
        let name = device.name().to_string();
        let state = device.shared_state();
        let bridge = Arc::clone(&self.bridge);

        let task = tokio::spawn(async move {
            tokio::time::sleep(PULSE_REVERT_DELAY).await;

            let resting = !target;
            let change = StateChange::Power(resting);
            let new_state = {
                let mut state = state.write();
                state.apply(&change);
                *state
            };
            debug!(device = %name, state = %resting, "Momentary switch reverted");
            bridge.state_changed(id, change, new_state);
        });
        device.track_revert(task);
    }
}

fn log_stderr(device: &DeviceRecord, output: &CommandOutput) {
    let stderr = output.stderr.trim();
    if !stderr.is_empty() {
        warn!(device = %device.name(), stderr = %stderr, "State command wrote to stderr");
    }
}
