//! Shared scaffolding for the integration suites: hubs driven by the
//! scriptable virtual backend.

#![allow(dead_code)]

use inputhub::backend::{GamepadItem, GamepadReading, ReadingInput};
use inputhub::backends::virtual_input::{VirtualBackend, VirtualDevice};
use inputhub::{Button, DeviceId, DeviceKind, Hub};

pub struct Rig {
    pub hub: Hub,
    pub backend: VirtualBackend,
}

impl Rig {
    pub fn new() -> Self {
        let backend = VirtualBackend::new();
        let hub = Hub::new(backend.clone());
        Rig { hub, backend }
    }

    /// Discover everything currently attached and run the connecting update.
    pub fn start(&mut self) {
        self.hub.discover().unwrap();
        self.hub.update_all().unwrap();
    }

    pub fn device_of_kind(&self, kind: DeviceKind) -> DeviceId {
        self.hub
            .devices()
            .find(|d| d.kind() == kind && !d.is_aggregate())
            .expect("device registered")
            .id()
    }
}

/// One gamepad reading group made of raw items.
pub fn gamepad_reading(items: Vec<GamepadItem>) -> ReadingInput {
    ReadingInput::Gamepad(GamepadReading { items })
}

/// Digital transition of one portable gamepad button.
pub fn button_item(button: Button, pressed: bool) -> GamepadItem {
    GamepadItem::Button { button, pressed }
}

/// Convenience: a rig with one virtual gamepad, already connected.
pub fn gamepad_rig() -> (Rig, VirtualDevice, DeviceId) {
    let mut rig = Rig::new();
    let pad = rig.backend.add_gamepad("Test Pad 0");
    rig.start();
    let id = rig.device_of_kind(DeviceKind::Gamepad);
    (rig, pad, id)
}
