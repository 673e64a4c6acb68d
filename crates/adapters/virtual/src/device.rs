//! Virtual device: a named on/off switch that remembers its last command.

use std::sync::Mutex;

use calswitch_domain::action::ActionKind;
use calswitch_domain::target::{Target, TargetId};

/// Power state of a virtual device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeviceState {
    On,
    #[default]
    Off,
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}

/// A simulated device that can be turned on and off.
pub struct VirtualDevice {
    entity_id: TargetId,
    name: String,
    area: Option<String>,
    state: Mutex<DeviceState>,
}

impl VirtualDevice {
    /// Create a device, initially off.
    #[must_use]
    pub fn new(entity_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            entity_id: TargetId::new(entity_id),
            name: name.into(),
            area: None,
            state: Mutex::new(DeviceState::Off),
        }
    }

    /// Place the device in an area.
    #[must_use]
    pub fn in_area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }

    #[must_use]
    pub fn entity_id(&self) -> &TargetId {
        &self.entity_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn area(&self) -> Option<&str> {
        self.area.as_deref()
    }

    /// The [`Target`] this device resolves to.
    #[must_use]
    pub fn target(&self) -> Target {
        Target {
            id: self.entity_id.clone(),
            label: self.name.clone(),
        }
    }

    #[must_use]
    pub fn state(&self) -> DeviceState {
        *self.lock_state()
    }

    /// Apply a command, returning the resulting state.
    pub fn handle_action(&self, action: ActionKind) -> DeviceState {
        let mut state = self.lock_state();
        *state = match action {
            ActionKind::TurnOn => DeviceState::On,
            ActionKind::TurnOff => DeviceState::Off,
        };
        *state
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, DeviceState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl std::fmt::Debug for VirtualDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualDevice")
            .field("entity_id", &self.entity_id)
            .field("name", &self.name)
            .field("area", &self.area)
            .field("state", &self.state())
            .finish()
    }
}
