// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic state polling.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::controller::StateController;

use super::device_registry::DeviceMap;

/// One background poll task per polled device.
///
/// A task looks its device up by name on every tick, so it always sees the
/// latest settings, and exits on its own once the device is gone or no
/// longer polls. A failed read never stops it.
#[derive(Debug)]
pub(crate) struct Poller {
    devices: DeviceMap,
    controller: StateController,
    timers: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl Poller {
    pub(crate) fn new(devices: DeviceMap, controller: StateController) -> Self {
        Self {
            devices,
            controller,
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Starts polling `name`, replacing any task already running for it.
    ///
    /// The first read happens immediately.
    pub(crate) fn start(&self, name: &str) {
        let task = tokio::spawn(poll_loop(
            self.devices.clone(),
            self.controller.clone(),
            name.to_string(),
        ));

        if let Some(previous) = self.timers.lock().insert(name.to_string(), task) {
            previous.abort();
        }
    }

    /// Stops polling `name`.
    ///
    /// Returns `true` if a task was running.
    pub(crate) fn stop(&self, name: &str) -> bool {
        match self.timers.lock().remove(name) {
            Some(task) => {
                task.abort();
                debug!(device = %name, "Polling stopped");
                true
            }
            None => false,
        }
    }

    /// Returns whether a poll task is live for `name`.
    pub(crate) fn is_polling(&self, name: &str) -> bool {
        self.timers
            .lock()
            .get(name)
            .is_some_and(|task| !task.is_finished())
    }

    /// Stops every poll task.
    pub(crate) fn stop_all(&self) {
        for (_, task) in self.timers.lock().drain() {
            task.abort();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop_all();
    }
}

async fn poll_loop(devices: DeviceMap, controller: StateController, name: String) {
    debug!(device = %name, "Polling started");

    loop {
        let Some(device) = devices.read().await.get(&name).cloned() else {
            debug!(device = %name, "Device removed, polling ends");
            return;
        };
        if !device.settings().polls() {
            debug!(device = %name, "Polling disabled, polling ends");
            return;
        }

        debug!(device = %name, "Polling state");
        controller.sync_power(&device).await;

        tokio::time::sleep(device.settings().interval).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::RwLock;

    use super::*;
    use crate::event::EventBus;
    use crate::manager::{DeviceRecord, DeviceSettings, SwitchConfig};
    use crate::runner::scripted::{Script, ScriptedShell};
    use crate::runner::{CommandRunner, ExecutionMode};

    fn setup(shell: &Arc<ScriptedShell>, configs: Vec<SwitchConfig>) -> Poller {
        let devices: DeviceMap = Arc::new(RwLock::new(
            configs
                .into_iter()
                .map(|config| {
                    let record = DeviceRecord::new(DeviceSettings::try_from(config).unwrap());
                    (record.name().to_string(), record)
                })
                .collect(),
        ));
        let runner = CommandRunner::with_shell(ExecutionMode::Concurrent, shell.clone());
        let controller = StateController::new(runner, Arc::new(EventBus::new()));
        Poller::new(devices, controller)
    }

    fn polled(name: &str, state_cmd: &str, interval: u64) -> SwitchConfig {
        SwitchConfig::new(name)
            .with_state_cmd(state_cmd)
            .with_polling(interval)
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_stop_polling() {
        let shell = Arc::new(ScriptedShell::new().script("probe", Script::unspawnable()));
        let poller = setup(&shell, vec![polled("TV", "probe", 2)]);

        poller.start("TV");
        tokio::time::sleep(Duration::from_secs(5)).await;

        // Ticks at 0s, 2s and 4s.
        assert_eq!(shell.calls("probe"), 3);
        assert!(poller.is_polling("TV"));
    }

    #[tokio::test(start_paused = true)]
    async fn poll_updates_cache() {
        let shell = Arc::new(ScriptedShell::new());
        let poller = setup(&shell, vec![polled("TV", "probe", 1)]);

        poller.start("TV");
        tokio::time::sleep(Duration::from_millis(10)).await;

        let devices = poller.devices.read().await;
        assert!(devices["TV"].state().is_on());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_previous_task() {
        let shell = Arc::new(ScriptedShell::new());
        let poller = setup(&shell, vec![polled("TV", "probe", 10)]);

        poller.start("TV");
        poller.start("TV");
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(shell.calls("probe"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_task() {
        let shell = Arc::new(ScriptedShell::new());
        let poller = setup(&shell, vec![polled("TV", "probe", 1)]);

        poller.start("TV");
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(poller.stop("TV"));
        assert!(!poller.stop("TV"));

        let calls = shell.calls("probe");
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(shell.calls("probe"), calls);
        assert!(!poller.is_polling("TV"));
    }

    #[tokio::test(start_paused = true)]
    async fn task_ends_when_device_removed() {
        let shell = Arc::new(ScriptedShell::new());
        let poller = setup(&shell, vec![polled("TV", "probe", 1)]);

        poller.start("TV");
        tokio::time::sleep(Duration::from_millis(10)).await;
        poller.devices.write().await.remove("TV");
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(!poller.is_polling("TV"));
        assert_eq!(shell.calls("probe"), 1);
    }
}
