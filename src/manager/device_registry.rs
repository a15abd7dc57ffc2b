// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device registry for coordinating command-driven devices.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::bridge::Bridge;
use crate::controller::{DimmingPolicy, SetOutcome, StateController};
use crate::error::{ConfigError, Error, Result};
use crate::event::DeviceId;
use crate::runner::{CommandRunner, ExecutionMode};
use crate::state::{DeviceState, StateChange};
use crate::types::{Brightness, BrightnessRequest, PowerState};

use super::device_config::{DEFAULT_PLATFORM, DeviceSettings, PlatformConfig, SwitchConfig};
use super::device_record::DeviceRecord;
use super::poller::Poller;

/// Records keyed by device name, shared with the poll tasks.
pub(crate) type DeviceMap = Arc<RwLock<HashMap<String, DeviceRecord>>>;

/// Outcome of [`DeviceRegistry::reconcile`].
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Devices created or updated, in configuration order.
    pub applied: Vec<DeviceId>,
    /// Names of devices removed because they were not configured any more.
    pub removed: Vec<String>,
    /// Configuration entries that were rejected.
    pub rejected: Vec<ConfigError>,
}

/// Registry owning every configured device.
///
/// The `DeviceRegistry` keeps device records in sync with the configured
/// list, drives the host [`Bridge`] as devices come and go, runs the poll
/// tasks, and serves the calls the host makes on a device by name.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use cmdswitch_lib::event::EventBus;
/// use cmdswitch_lib::manager::{DeviceRegistry, PlatformConfig};
/// use cmdswitch_lib::types::PowerState;
///
/// #[tokio::main]
/// async fn main() -> cmdswitch_lib::Result<()> {
///     let config = PlatformConfig::from_file("config.json")?;
///     let bus = Arc::new(EventBus::new());
///     let mut events = bus.subscribe();
///
///     let registry = DeviceRegistry::from_config(&config, bus);
///     let report = registry.reconcile(config.switches.clone()).await;
///     println!("{} devices configured", report.applied.len());
///
///     registry.set_power("TV", PowerState::On).await?;
///
///     while let Ok(event) = events.recv().await {
///         println!("Event: {event:?}");
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct DeviceRegistry {
    devices: DeviceMap,
    controller: StateController,
    poller: Poller,
}

impl DeviceRegistry {
    /// Creates an empty registry around a controller.
    #[must_use]
    pub fn new(controller: StateController) -> Self {
        let devices: DeviceMap = Arc::new(RwLock::new(HashMap::new()));
        let poller = Poller::new(Arc::clone(&devices), controller.clone());
        Self {
            devices,
            controller,
            poller,
        }
    }

    /// Creates an empty registry with the runner mode and dimming policy
    /// selected by `config`.
    ///
    /// The switches in `config` are not applied; pass them to
    /// [`reconcile`](Self::reconcile).
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime when `config` selects
    /// serialized execution.
    #[must_use]
    pub fn from_config(config: &PlatformConfig, bridge: Arc<dyn Bridge>) -> Self {
        let runner = CommandRunner::new(config.execution_mode());
        let controller =
            StateController::new(runner, bridge).with_dimming_policy(config.dimming_policy());
        Self::new(controller)
    }

    /// Returns the controller used for every device.
    #[must_use]
    pub fn controller(&self) -> &StateController {
        &self.controller
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Creates a device or updates it in place, and marks it reachable.
    ///
    /// A device whose shape changes (a brightness command added or removed)
    /// is unregistered and registered again. Polling is started or stopped
    /// to match the new settings; a device that does not poll gets one
    /// immediate state refresh instead.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingName` if the entry has no name.
    pub async fn add_or_update(&self, config: SwitchConfig) -> Result<DeviceId, ConfigError> {
        let settings = DeviceSettings::try_from(config)?;
        let name = settings.name.clone();
        let bridge = self.controller.bridge();

        let record = {
            let mut devices = self.devices.write().await;

            let reshaped = devices.get(&name).is_some_and(|existing| {
                existing.capabilities().kind() != settings.capabilities().kind()
            });
            if reshaped && let Some(old) = devices.remove(&name) {
                self.poller.stop(&name);
                old.cancel_revert();
                bridge.unregister(old.id());
                info!(device = %name, "{name} changed shape, registering again");
            }

            if let Some(existing) = devices.get_mut(&name) {
                existing.update_settings(settings);
                debug!(device = %name, "Updating {name}");
                existing.clone()
            } else {
                let record = DeviceRecord::new(settings);
                bridge.register(record.id(), &record.accessory_info());
                info!(device = %name, "Adding {name}");
                devices.insert(name.clone(), record.clone());
                record
            }
        };

        record.set_reachable(true);
        bridge.update_accessory(record.id(), &record.accessory_info());
        bridge.set_reachable(record.id(), true);

        if record.settings().polls() {
            self.poller.start(&name);
        } else {
            self.poller.stop(&name);
            if !record.settings().polling {
                self.spawn_refresh(record.clone());
            }
        }

        Ok(record.id())
    }

    /// Applies a configured list: every entry is added or updated, then
    /// every device missing from the list is removed.
    ///
    /// A rejected entry does not affect the others.
    pub async fn reconcile<I>(&self, configs: I) -> ReconcileReport
    where
        I: IntoIterator<Item = SwitchConfig>,
    {
        for record in self.devices.read().await.values() {
            record.set_reachable(false);
        }

        let mut report = ReconcileReport::default();
        for config in configs {
            match self.add_or_update(config).await {
                Ok(id) => report.applied.push(id),
                Err(e) => {
                    warn!(error = %e, "Rejected switch configuration");
                    report.rejected.push(e);
                }
            }
        }

        let stale: Vec<String> = self
            .devices
            .read()
            .await
            .values()
            .filter(|record| !record.is_reachable())
            .map(|record| record.name().to_string())
            .collect();
        for name in stale {
            if self.remove(&name).await {
                report.removed.push(name);
            }
        }

        report
    }

    /// Removes a device: stops its polling, drops a pending momentary
    /// revert and unregisters it.
    ///
    /// Returns `true` if the device existed.
    pub async fn remove(&self, name: &str) -> bool {
        let Some(record) = self.devices.write().await.remove(name) else {
            return false;
        };

        self.poller.stop(name);
        record.cancel_revert();
        self.controller.bridge().unregister(record.id());
        info!(device = %name, "Removing {name}");
        true
    }

    /// Seeds a device the host already knows, with its cached state.
    ///
    /// The device is not registered again and stays unreachable until a
    /// [`reconcile`](Self::reconcile) lists it; one that is not listed is
    /// removed then. A name that is already present is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingName` if the entry has no name.
    pub async fn restore(
        &self,
        config: SwitchConfig,
        state: DeviceState,
    ) -> Result<DeviceId, ConfigError> {
        let settings = DeviceSettings::try_from(config)?;
        let mut devices = self.devices.write().await;

        if let Some(existing) = devices.get(&settings.name) {
            return Ok(existing.id());
        }

        let record = DeviceRecord::restored(settings, state);
        let id = record.id();
        debug!(device = %record.name(), "Restored from host cache");
        devices.insert(record.name().to_string(), record);
        Ok(id)
    }

    /// Returns the configuration equivalent to the current registry.
    pub async fn export_config(&self) -> PlatformConfig {
        let devices = self.devices.read().await;
        let mut switches: Vec<SwitchConfig> = devices
            .values()
            .map(|record| record.settings().to_config())
            .collect();
        switches.sort_by(|a, b| a.name.cmp(&b.name));

        PlatformConfig {
            platform: DEFAULT_PLATFORM.to_string(),
            synchronous: self.controller.runner().mode() == ExecutionMode::Serialized,
            optimistic_dimming: self.controller.dimming_policy()
                == DimmingPolicy::OptimisticTimeout,
            switches,
        }
    }

    // =========================================================================
    // Host calls
    // =========================================================================

    /// Reads the power state for the host.
    ///
    /// A polled device answers from the cache. Otherwise the state command
    /// runs and its answer is cached.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` for an unknown name, or
    /// `Error::Process` if the state command could not be run.
    pub async fn get_power(&self, name: &str) -> Result<PowerState> {
        let device = self.lookup(name).await?;

        if device.settings().polling {
            return Ok(device.state().power());
        }

        let power = self.controller.get_state(&device).await?;
        if device.settings().state_cmd.is_some() {
            device.apply(&StateChange::Power(power));
        }
        Ok(power)
    }

    /// Switches a device on or off.
    ///
    /// A lightbulb is switched through its brightness control, so turning
    /// it on runs `dim_cmd` with the cached level.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` for an unknown name, or
    /// `Error::Process` if the command failed.
    pub async fn set_power(&self, name: &str, power: PowerState) -> Result<SetOutcome> {
        let device = self.lookup(name).await?;

        if device.capabilities().dimmer {
            let request = BrightnessRequest::Power(power.is_on());
            return Ok(self.controller.set_brightness(&device, request).await?);
        }
        Ok(self.controller.set_state(&device, power).await?)
    }

    /// Reads the brightness for the host.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` for an unknown name, or
    /// `Error::Process` if the state command could not be run.
    pub async fn get_brightness(&self, name: &str) -> Result<Brightness> {
        let device = self.lookup(name).await?;
        Ok(self.controller.get_brightness(&device).await?)
    }

    /// Sets the brightness, or switches through the brightness control.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` for an unknown name, or
    /// `Error::Process` if the command failed.
    pub async fn set_brightness(
        &self,
        name: &str,
        request: impl Into<BrightnessRequest>,
    ) -> Result<SetOutcome> {
        let device = self.lookup(name).await?;
        Ok(self
            .controller
            .set_brightness(&device, request.into())
            .await?)
    }

    /// Acknowledges an identify request.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` for an unknown name.
    pub async fn identify(&self, name: &str) -> Result<()> {
        self.lookup(name).await?;
        info!(device = %name, "{name} identify requested");
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns a handle to a device record.
    pub async fn device(&self, name: &str) -> Option<DeviceRecord> {
        self.devices.read().await.get(name).cloned()
    }

    /// Returns a snapshot of a device's cached state.
    pub async fn state(&self, name: &str) -> Option<DeviceState> {
        self.devices.read().await.get(name).map(DeviceRecord::state)
    }

    /// Returns all device names, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.devices.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of devices.
    pub async fn device_count(&self) -> usize {
        self.devices.read().await.len()
    }

    /// Returns whether a poll task is running for a device.
    #[must_use]
    pub fn is_polling(&self, name: &str) -> bool {
        self.poller.is_polling(name)
    }

    async fn lookup(&self, name: &str) -> Result<DeviceRecord> {
        self.device(name)
            .await
            .ok_or_else(|| Error::DeviceNotFound(name.to_string()))
    }

    fn spawn_refresh(&self, record: DeviceRecord) {
        let controller = self.controller.clone();
        tokio::spawn(async move {
            controller.sync_power(&record).await;
            if record.capabilities().dimmer {
                controller.sync_brightness(&record).await;
            }
        });
    }
}
