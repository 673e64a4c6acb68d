//! # calswitch-adapter-virtual
//!
//! Simulated switchable devices, for running the scheduler without real
//! hardware and for end-to-end tests.
//!
//! [`VirtualDevices`] is both the [`TargetResolver`] and the [`Dispatcher`]:
//! summary references resolve against its devices, and fired commands flip
//! their recorded state.
//!
//! ## Resolution order
//!
//! | Step | Matches when |
//! |------|--------------|
//! | 1 | the reference equals an entity id |
//! | 2 | the reference equals a device name |
//! | 3 | the reference starts with an area name and the rest equals the name of a device in that area |
//!
//! Comparisons are case-insensitive and ignore surrounding whitespace.
//!
//! ## Dependency rule
//!
//! Depends on `calswitch-app` (port traits) and `calswitch-domain` only.

mod device;

pub use device::{DeviceState, VirtualDevice};

use calswitch_app::ports::{DispatchError, Dispatcher, TargetResolver};
use calswitch_domain::action::ActionKind;
use calswitch_domain::target::{Target, TargetId};

/// Registry of virtual devices, in declaration order.
#[derive(Debug, Default)]
pub struct VirtualDevices {
    devices: Vec<VirtualDevice>,
}

impl VirtualDevices {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device. A later device with an already registered entity id
    /// replaces the earlier one.
    #[must_use]
    pub fn with_device(mut self, device: VirtualDevice) -> Self {
        self.devices.retain(|d| d.entity_id() != device.entity_id());
        self.devices.push(device);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Current state of the device with `entity_id`.
    #[must_use]
    pub fn state_of(&self, entity_id: &TargetId) -> Option<DeviceState> {
        self.get(entity_id).map(VirtualDevice::state)
    }

    fn get(&self, entity_id: &TargetId) -> Option<&VirtualDevice> {
        self.devices.iter().find(|d| d.entity_id() == entity_id)
    }

    fn find(&self, reference: &str) -> Option<&VirtualDevice> {
        let reference = reference.trim().to_lowercase();
        if reference.is_empty() {
            return None;
        }

        self.devices
            .iter()
            .find(|d| d.entity_id().as_str().to_lowercase() == reference)
            .or_else(|| {
                self.devices
                    .iter()
                    .find(|d| d.name().trim().to_lowercase() == reference)
            })
            .or_else(|| {
                self.devices.iter().find(|d| {
                    d.area().is_some_and(|area| {
                        reference
                            .strip_prefix(&area.trim().to_lowercase())
                            .is_some_and(|rest| rest.trim() == d.name().trim().to_lowercase())
                    })
                })
            })
    }
}

impl FromIterator<VirtualDevice> for VirtualDevices {
    fn from_iter<I: IntoIterator<Item = VirtualDevice>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::with_device)
    }
}

impl TargetResolver for VirtualDevices {
    async fn resolve(&self, reference: &str) -> Option<Target> {
        let target = self.find(reference).map(VirtualDevice::target);
        if target.is_none() {
            tracing::trace!(reference, "no virtual device matches reference");
        }
        target
    }
}

impl Dispatcher for VirtualDevices {
    async fn invoke(&self, target: &TargetId, action: ActionKind) -> Result<(), DispatchError> {
        let device = self
            .get(target)
            .ok_or_else(|| DispatchError::UnknownTarget(target.clone()))?;
        let state = device.handle_action(action);
        tracing::info!(target_id = %target, %action, %state, "virtual device switched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices() -> VirtualDevices {
        [
            VirtualDevice::new("light.kitchen", "Kitchen Light").in_area("Kitchen"),
            VirtualDevice::new("light.ceiling_kitchen", "Ceiling").in_area("Kitchen"),
            VirtualDevice::new("light.ceiling_bedroom", "Ceiling").in_area("Bedroom"),
            VirtualDevice::new("switch.pump", "Pump"),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn should_resolve_by_entity_id() {
        let target = devices().resolve("switch.pump").await.unwrap();
        assert_eq!(target, Target::new("switch.pump", "Pump"));
    }

    #[tokio::test]
    async fn should_resolve_by_name_ignoring_case_and_whitespace() {
        let target = devices().resolve("  kitchen LIGHT ").await.unwrap();
        assert_eq!(target.id, TargetId::new("light.kitchen"));
        assert_eq!(target.label, "Kitchen Light");
    }

    #[tokio::test]
    async fn should_resolve_by_area_and_name() {
        let devices = devices();

        let bedroom = devices.resolve("Bedroom Ceiling").await.unwrap();
        assert_eq!(bedroom.id, TargetId::new("light.ceiling_bedroom"));

        let kitchen = devices.resolve("kitchen ceiling").await.unwrap();
        assert_eq!(kitchen.id, TargetId::new("light.ceiling_kitchen"));
    }

    #[tokio::test]
    async fn should_prefer_name_over_area_match() {
        // "Ceiling" is a plain name match: the first declared wins.
        let target = devices().resolve("Ceiling").await.unwrap();
        assert_eq!(target.id, TargetId::new("light.ceiling_kitchen"));
    }

    #[tokio::test]
    async fn should_not_resolve_unknown_reference() {
        assert!(devices().resolve("Garage Door").await.is_none());
        assert!(devices().resolve("   ").await.is_none());
    }

    #[tokio::test]
    async fn should_record_state_when_dispatched() {
        let devices = devices();
        let pump = TargetId::new("switch.pump");

        devices.invoke(&pump, ActionKind::TurnOn).await.unwrap();
        assert_eq!(devices.state_of(&pump), Some(DeviceState::On));

        devices.invoke(&pump, ActionKind::TurnOff).await.unwrap();
        assert_eq!(devices.state_of(&pump), Some(DeviceState::Off));
    }

    #[tokio::test]
    async fn should_fail_dispatch_to_unknown_target() {
        let result = devices()
            .invoke(&TargetId::new("cover.garage"), ActionKind::TurnOn)
            .await;
        assert!(matches!(result, Err(DispatchError::UnknownTarget(_))));
    }

    #[test]
    fn should_replace_device_with_same_entity_id() {
        let devices = VirtualDevices::new()
            .with_device(VirtualDevice::new("switch.pump", "Pump"))
            .with_device(VirtualDevice::new("switch.pump", "Garden Pump"));
        assert_eq!(devices.len(), 1);
        assert_eq!(devices.get(&TargetId::new("switch.pump")).unwrap().name(), "Garden Pump");
    }
}
