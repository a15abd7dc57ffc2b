// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device record held by the registry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::Capabilities;
use crate::bridge::AccessoryInfo;
use crate::event::DeviceId;
use crate::state::{DeviceState, StateChange};

use super::device_config::DeviceSettings;

/// One configured device and its cached state.
///
/// Clones share the cached state and reachability flag, so a clone handed
/// to a background task observes and makes the same updates as the
/// registry's copy. Settings are replaced as a whole on update and are not
/// shared between clones taken before and after.
#[derive(Debug, Clone)]
pub struct DeviceRecord {
    id: DeviceId,
    settings: Arc<DeviceSettings>,
    state: Arc<RwLock<DeviceState>>,
    reachable: Arc<AtomicBool>,
    revert: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl DeviceRecord {
    /// Creates a record in its configured initial state.
    #[must_use]
    pub fn new(settings: DeviceSettings) -> Self {
        let state = settings.initial_state();
        Self::restored(settings, state)
    }

    /// Creates a record seeded with a previously cached state.
    ///
    /// The record starts unreachable until the next reconcile adopts it.
    #[must_use]
    pub fn restored(settings: DeviceSettings, state: DeviceState) -> Self {
        Self {
            id: DeviceId::from_name(&settings.name),
            settings: Arc::new(settings),
            state: Arc::new(RwLock::new(state)),
            reachable: Arc::new(AtomicBool::new(false)),
            revert: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the host identifier.
    #[must_use]
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Returns the device name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.settings.name
    }

    /// Returns the normalized settings.
    #[must_use]
    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    /// Returns a snapshot of the cached state.
    #[must_use]
    pub fn state(&self) -> DeviceState {
        *self.state.read()
    }

    /// Returns the capabilities derived from the settings.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.settings.capabilities()
    }

    /// Returns the host display metadata.
    #[must_use]
    pub fn accessory_info(&self) -> AccessoryInfo {
        self.settings.accessory_info()
    }

    /// Returns whether the record was present in the latest configuration.
    #[must_use]
    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::Acquire)
    }

    /// Sets the reachability flag.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::Release);
    }

    /// Replaces the settings, keeping the cached state.
    ///
    /// A brightness given in the new settings overrides the cached one.
    pub fn update_settings(&mut self, settings: DeviceSettings) {
        if let Some(brightness) = settings.brightness {
            self.state.write().set_brightness(brightness);
        }
        self.settings = Arc::new(settings);
    }

    /// Applies a change to the cached state.
    ///
    /// Returns `true` if the cached state changed.
    pub fn apply(&self, change: &StateChange) -> bool {
        self.state.write().apply(change)
    }

    /// Returns a handle to the cached state for tasks that outlive a call.
    pub(crate) fn shared_state(&self) -> Arc<RwLock<DeviceState>> {
        Arc::clone(&self.state)
    }

    /// Tracks a pending momentary revert, replacing any earlier one.
    pub(crate) fn track_revert(&self, task: JoinHandle<()>) {
        if let Some(previous) = self.revert.lock().replace(task) {
            previous.abort();
        }
    }

    /// Cancels a pending momentary revert.
    ///
    /// Returns `true` if one was still pending.
    pub(crate) fn cancel_revert(&self) -> bool {
        self.revert.lock().take().is_some_and(|task| {
            let pending = !task.is_finished();
            task.abort();
            pending
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::SwitchConfig;
    use crate::types::{Brightness, PowerState};

    fn settings(config: SwitchConfig) -> DeviceSettings {
        DeviceSettings::try_from(config).unwrap()
    }

    #[test]
    fn new_record_uses_initial_state() {
        let record = DeviceRecord::new(settings(
            SwitchConfig::new("Heater")
                .with_off_cmd("heater off")
                .with_brightness(Brightness::clamped(30)),
        ));

        assert_eq!(record.name(), "Heater");
        assert_eq!(record.id(), DeviceId::from_name("Heater"));
        assert!(record.state().is_on());
        assert_eq!(record.state().brightness().value(), 30);
        assert!(!record.is_reachable());
    }

    #[test]
    fn clones_share_state() {
        let record = DeviceRecord::new(settings(SwitchConfig::new("TV")));
        let clone = record.clone();

        assert!(clone.apply(&StateChange::Power(PowerState::On)));
        assert!(record.state().is_on());

        clone.set_reachable(true);
        assert!(record.is_reachable());
    }

    #[test]
    fn update_keeps_state_and_applies_brightness() {
        let mut record = DeviceRecord::new(settings(SwitchConfig::new("Lamp")));
        record.apply(&StateChange::Power(PowerState::On));

        record.update_settings(settings(
            SwitchConfig::new("Lamp")
                .with_dim_cmd("dim")
                .with_brightness(Brightness::clamped(80)),
        ));

        assert!(record.state().is_on());
        assert_eq!(record.state().brightness().value(), 80);
        assert!(record.capabilities().dimmer);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_revert_aborts_tracked_task() {
        let record = DeviceRecord::new(settings(SwitchConfig::new("Bell")));
        let state = record.shared_state();
        record.track_revert(tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            state.write().apply(&StateChange::Power(PowerState::On));
        }));

        assert!(record.clone().cancel_revert());
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;

        assert!(!record.state().is_on());
        assert!(!record.cancel_revert());
    }

    #[test]
    fn restored_record_keeps_given_state() {
        let state = DeviceState::with(PowerState::On, Brightness::clamped(55));
        let record = DeviceRecord::restored(settings(SwitchConfig::new("Lamp")), state);

        assert_eq!(record.state(), state);
        assert!(!record.is_reachable());
    }
}
