// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus for broadcasting device events.

use tokio::sync::broadcast;

use crate::bridge::{AccessoryInfo, Bridge};
use crate::state::{DeviceState, StateChange};

use super::{DeviceEvent, DeviceId};

/// Default channel capacity for the event bus.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Broadcasts every bridge call as a [`DeviceEvent`].
///
/// The bus is the stock [`Bridge`] implementation: a host subscribes and
/// mirrors registrations, reachability and observed state changes into its
/// own accessory model. Slow subscribers may miss events
/// (`RecvError::Lagged`) once the capacity is exceeded.
///
/// # Examples
///
/// ```
/// use cmdswitch_lib::bridge::Bridge;
/// use cmdswitch_lib::event::{DeviceEvent, DeviceId, EventBus};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.unregister(DeviceId::from_name("TV"));
/// assert!(matches!(rx.try_recv(), Ok(DeviceEvent::Unregistered { .. })));
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DeviceEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a new event bus with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to device events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event to all subscribers.
    ///
    /// If there are no subscribers, the event is silently discarded.
    pub fn publish(&self, event: DeviceEvent) {
        // Ignore errors (no subscribers)
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bridge for EventBus {
    fn register(&self, device_id: DeviceId, info: &AccessoryInfo) {
        self.publish(DeviceEvent::Registered {
            device_id,
            info: info.clone(),
        });
    }

    fn update_accessory(&self, device_id: DeviceId, info: &AccessoryInfo) {
        self.publish(DeviceEvent::Updated {
            device_id,
            info: info.clone(),
        });
    }

    fn unregister(&self, device_id: DeviceId) {
        self.publish(DeviceEvent::Unregistered { device_id });
    }

    fn set_reachable(&self, device_id: DeviceId, reachable: bool) {
        self.publish(DeviceEvent::ReachabilityChanged {
            device_id,
            reachable,
        });
    }

    fn state_changed(&self, device_id: DeviceId, change: StateChange, new_state: DeviceState) {
        self.publish(DeviceEvent::StateChanged {
            device_id,
            change,
            new_state,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::AccessoryKind;
    use crate::types::PowerState;

    #[test]
    fn new_bus_has_no_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn drop_subscriber_decrements_count() {
        let bus = EventBus::new();

        let rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        drop(rx);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn register_delivers_to_multiple_subscribers() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let device_id = DeviceId::from_name("Lamp");
        bus.register(device_id, &AccessoryInfo::new("Lamp", AccessoryKind::Lightbulb));

        for rx in [&mut rx1, &mut rx2] {
            match rx.recv().await.unwrap() {
                DeviceEvent::Registered { device_id: id, info } => {
                    assert_eq!(id, device_id);
                    assert_eq!(info.kind, AccessoryKind::Lightbulb);
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn state_changed_carries_new_state() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        let mut state = DeviceState::new();
        state.set_power(PowerState::On);
        bus.state_changed(
            DeviceId::from_name("TV"),
            StateChange::Power(PowerState::On),
            state,
        );

        let event = rx.recv().await.unwrap();
        assert!(matches!(
            event,
            DeviceEvent::StateChanged { new_state, .. } if new_state.is_on()
        ));
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = EventBus::new();
        bus.set_reachable(DeviceId::from_name("TV"), false);
    }

    #[test]
    fn clone_shares_same_channel() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();

        let _rx = bus1.subscribe();
        assert_eq!(bus2.subscriber_count(), 1);
    }
}
