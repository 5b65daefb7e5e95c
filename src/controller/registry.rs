//! Controller Registry - live bindings and their players
//!
//! Owns every live [`ControllerBinding`], keyed by transient device id, plus a
//! descriptor index so players (which only remember a descriptor) can find
//! their controller again after a reconnect with a new device id.
//!
//! Two binding disciplines exist side by side and a session uses one:
//!
//! - multi controller: [`ControllerRegistry::bind_or_rebind`] / [`ControllerRegistry::unbind`]
//! - single controller: [`ControllerRegistry::set_primary`]

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use super::binding::{ControllerBinding, DeviceInfo};
use super::input_mapper::DeviceId;
use crate::game::display::DisplayContext;
use crate::game::objects::PlayerRoster;

/// What a bind attempt did to the player roster
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindOutcome {
    /// Neither gamepad nor touchscreen
    Unsupported,
    /// A new player was created at this roster index
    NewPlayer(usize),
    /// An existing player got the new binding
    Rebound(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BindingResult {
    pub outcome: BindOutcome,
    pub controller_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnbindResult {
    pub removed: bool,
    pub controller_count: usize,
}

impl UnbindResult {
    /// A removal interrupts play
    pub fn should_pause(&self) -> bool {
        self.removed
    }
}

#[derive(Debug, Default)]
pub struct ControllerRegistry {
    bindings: BTreeMap<DeviceId, ControllerBinding>,
    by_descriptor: HashMap<String, DeviceId>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn controller_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Live bindings in device id order
    pub fn bindings(&self) -> impl Iterator<Item = &ControllerBinding> {
        self.bindings.values()
    }

    pub fn find_by_device_id(&self, device_id: DeviceId) -> Option<&ControllerBinding> {
        self.bindings.get(&device_id)
    }

    pub fn find_by_device_id_mut(&mut self, device_id: DeviceId) -> Option<&mut ControllerBinding> {
        self.bindings.get_mut(&device_id)
    }

    pub fn find_by_descriptor(&self, descriptor: &str) -> Option<&ControllerBinding> {
        self.by_descriptor
            .get(descriptor)
            .and_then(|device_id| self.bindings.get(device_id))
    }

    fn insert(&mut self, binding: ControllerBinding) {
        let device_id = binding.device_id();
        if let Some(previous) = self.bindings.insert(device_id, binding) {
            debug!(
                "Replaced binding for device {} ({})",
                device_id,
                previous.descriptor()
            );
            if self.by_descriptor.get(previous.descriptor()) == Some(&device_id) {
                self.by_descriptor.remove(previous.descriptor());
            }
        }
        if let Some(binding) = self.bindings.get(&device_id) {
            self.by_descriptor
                .insert(binding.descriptor().to_string(), device_id);
        }
    }

    /// Binds a device, reattaching it to the player that already owns its descriptor.
    pub fn bind_or_rebind(
        &mut self,
        device: &DeviceInfo,
        display: DisplayContext,
        roster: &mut PlayerRoster,
    ) -> BindingResult {
        let Some(binding) = ControllerBinding::for_device(device, display) else {
            debug!(
                "Device {} ({}) is neither gamepad nor touchscreen, ignoring",
                device.device_id, device.descriptor
            );
            return BindingResult {
                outcome: BindOutcome::Unsupported,
                controller_count: self.controller_count(),
            };
        };

        self.insert(binding);

        let outcome = match roster.index_of(&device.descriptor) {
            Some(index) => {
                roster.rebind(index, &device.descriptor);
                info!(
                    "Controller {} reconnected as device {}, rebound to player {}",
                    device.descriptor,
                    device.device_id,
                    index + 1
                );
                BindOutcome::Rebound(index)
            }
            None => {
                let index = roster.spawn(display, &device.descriptor);
                info!(
                    "Controller {} (device {}) joined as player {}",
                    device.descriptor,
                    device.device_id,
                    index + 1
                );
                BindOutcome::NewPlayer(index)
            }
        };

        BindingResult {
            outcome,
            controller_count: self.controller_count(),
        }
    }

    /// Removes every binding of `device_id`; players are kept.
    pub fn unbind(&mut self, device_id: DeviceId) -> UnbindResult {
        let removed = match self.bindings.remove(&device_id) {
            Some(binding) => {
                if self.by_descriptor.get(binding.descriptor()) == Some(&device_id) {
                    self.by_descriptor.remove(binding.descriptor());
                }
                info!(
                    "Controller {} (device {}) disconnected",
                    binding.descriptor(),
                    device_id
                );
                true
            }
            None => {
                debug!("No binding for removed device {}", device_id);
                false
            }
        };

        let controller_count = self.controller_count();
        debug!("Controller count: {}", controller_count);
        UnbindResult {
            removed,
            controller_count,
        }
    }

    /// Single-controller path: the device becomes the only binding and drives the first player.
    pub fn set_primary(
        &mut self,
        device: &DeviceInfo,
        display: DisplayContext,
        roster: &mut PlayerRoster,
    ) -> BindingResult {
        let Some(binding) = ControllerBinding::for_device(device, display) else {
            debug!(
                "Device {} ({}) cannot be the primary controller",
                device.device_id, device.descriptor
            );
            return BindingResult {
                outcome: BindOutcome::Unsupported,
                controller_count: self.controller_count(),
            };
        };

        self.bindings.clear();
        self.by_descriptor.clear();
        self.insert(binding);

        let outcome = if roster.is_empty() {
            BindOutcome::NewPlayer(roster.spawn(display, &device.descriptor))
        } else {
            roster.rebind(0, &device.descriptor);
            BindOutcome::Rebound(0)
        };
        info!(
            "Primary controller set to {} (device {})",
            device.descriptor, device.device_id
        );

        BindingResult {
            outcome,
            controller_count: self.controller_count(),
        }
    }

    /// Pushes new display geometry into touchscreen bindings
    pub fn set_display(&mut self, display: DisplayContext) {
        for binding in self.bindings.values_mut() {
            binding.set_display(display);
        }
    }

    /// Drops everything, used at teardown
    pub fn clear(&mut self) {
        if !self.bindings.is_empty() {
            warn!("Dropping {} live controller bindings", self.bindings.len());
        }
        self.bindings.clear();
        self.by_descriptor.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::input_mapper::SourceFlags;

    fn display() -> DisplayContext {
        DisplayContext::new(800, 600)
    }

    #[test]
    fn reconnect_by_descriptor_rebinds_existing_player() {
        let mut registry = ControllerRegistry::new();
        let mut roster = PlayerRoster::new();

        let first = registry.bind_or_rebind(
            &DeviceInfo::new(5, "D1", SourceFlags::GAMEPAD),
            display(),
            &mut roster,
        );
        assert_eq!(first.outcome, BindOutcome::NewPlayer(0));
        assert_eq!(first.controller_count, 1);
        assert_eq!(roster.get(0).unwrap().controller_descriptor(), "D1");

        let removed = registry.unbind(5);
        assert!(removed.should_pause());
        assert_eq!(removed.controller_count, 0);
        assert_eq!(roster.len(), 1);

        let again = registry.bind_or_rebind(
            &DeviceInfo::new(8, "D1", SourceFlags::GAMEPAD),
            display(),
            &mut roster,
        );
        assert_eq!(again.outcome, BindOutcome::Rebound(0));
        assert_eq!(again.controller_count, 1);
        assert_eq!(roster.len(), 1);
        assert_eq!(registry.find_by_descriptor("D1").unwrap().device_id(), 8);
    }

    #[test]
    fn unsupported_device_keeps_count() {
        let mut registry = ControllerRegistry::new();
        let mut roster = PlayerRoster::new();
        registry.bind_or_rebind(
            &DeviceInfo::new(1, "pad", SourceFlags::JOYSTICK),
            display(),
            &mut roster,
        );

        let result = registry.bind_or_rebind(
            &DeviceInfo::new(2, "kbd", SourceFlags::KEYBOARD),
            display(),
            &mut roster,
        );
        assert_eq!(result.outcome, BindOutcome::Unsupported);
        assert_eq!(result.controller_count, 1);
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn unknown_device_lookups_are_no_ops() {
        let mut registry = ControllerRegistry::new();
        assert!(registry.find_by_device_id(42).is_none());
        assert!(registry.find_by_device_id_mut(42).is_none());

        let result = registry.unbind(42);
        assert!(!result.removed);
        assert_eq!(result.controller_count, 0);
    }

    #[test]
    fn set_primary_replaces_all_bindings() {
        let mut registry = ControllerRegistry::new();
        let mut roster = PlayerRoster::new();
        registry.bind_or_rebind(
            &DeviceInfo::new(1, "a", SourceFlags::GAMEPAD),
            display(),
            &mut roster,
        );
        registry.bind_or_rebind(
            &DeviceInfo::new(2, "b", SourceFlags::GAMEPAD),
            display(),
            &mut roster,
        );

        let result = registry.set_primary(
            &DeviceInfo::new(3, "touch", SourceFlags::TOUCHSCREEN),
            display(),
            &mut roster,
        );
        assert_eq!(result.outcome, BindOutcome::Rebound(0));
        assert_eq!(result.controller_count, 1);
        assert!(registry.find_by_device_id(1).is_none());
        assert!(registry.find_by_device_id(3).unwrap().is_touchscreen());
        assert_eq!(roster.get(0).unwrap().controller_descriptor(), "touch");
    }

    #[test]
    fn set_primary_on_empty_roster_adds_a_player() {
        let mut registry = ControllerRegistry::new();
        let mut roster = PlayerRoster::new();
        let result = registry.set_primary(
            &DeviceInfo::new(7, "pad", SourceFlags::GAMEPAD),
            display(),
            &mut roster,
        );
        assert_eq!(result.outcome, BindOutcome::NewPlayer(0));
        assert_eq!(roster.len(), 1);
    }
}
