//! Software-emulated input devices.
//!
//! The virtual backend is a fully scriptable provider: tests and host
//! applications queue readings, trigger overruns, and toggle connectivity,
//! then observe how the hub folds it all. Force primitives are recorded
//! instead of executed, so rumble submissions and effect commands can be
//! asserted on.
//!
//! ```no_run
//! use inputhub::backends::virtual_input::VirtualBackend;
//! use inputhub::Hub;
//!
//! let backend = VirtualBackend::new();
//! let pad = backend.add_gamepad("Virtual Pad 0");
//! let mut hub = Hub::new(backend.clone());
//! hub.discover().unwrap();
//! # let _ = pad;
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::backend::{
    AbsAxis, Backend, Capabilities, DeviceIo, Discovered, EffectHandle, HardwareId, MotorCaps,
    PollEvent, Reading, ReadingInput, StateSnapshot,
};
use crate::codes::{DeviceKind, KeySet, NUM_BUTTONS};
use crate::error::{Error, IoFailure};
use crate::force::{ForceKind, ForceParams, ForceStatus};
use crate::metadata::DeviceMeta;
use crate::state::Timestamp;

/// Recorded state of one allocated effect slot.
#[derive(Clone, Debug)]
pub struct EffectRecord {
    pub handle: EffectHandle,
    pub kind: ForceKind,
    pub uploads: Vec<ForceParams>,
    pub playing: bool,
    pub destroyed: bool,
}

#[derive(Debug)]
struct Slot {
    hardware: HardwareId,
    kind: DeviceKind,
    name: String,
    caps: Capabilities,
    /// Discoverable/openable and alive. Clearing it makes the next update
    /// observe a disconnect; setting it again allows reconnection.
    present: bool,
    queue: Vec<PollEvent>,
    snapshot: StateSnapshot,
    rumble_log: Vec<(f32, f32)>,
    gain_log: Vec<(u32, f32)>,
    effects: HashMap<u32, EffectRecord>,
    next_effect: u32,
}

#[derive(Debug, Default)]
struct World {
    slots: Vec<Slot>,
    clock: Timestamp,
}

fn default_caps(kind: DeviceKind) -> Capabilities {
    match kind {
        DeviceKind::Mouse => Capabilities { mouse_buttons: 5, ..Default::default() },
        DeviceKind::Keyboard => Capabilities { max_simultaneous_keys: 16, ..Default::default() },
        DeviceKind::Gamepad => Capabilities {
            thumbsticks: 2,
            axis_ranges: vec![
                (AbsAxis::LeftX, -32768, 32767),
                (AbsAxis::LeftY, -32768, 32767),
                (AbsAxis::RightX, -32768, 32767),
                (AbsAxis::RightY, -32768, 32767),
                (AbsAxis::TriggerL2, 0, 255),
                (AbsAxis::TriggerR2, 0, 255),
            ],
            motors: vec![MotorCaps { kinds: [ForceKind::Rumble].into_iter().collect() }],
            synthetic_rumble: true,
            ..Default::default()
        },
    }
}

fn empty_snapshot(kind: DeviceKind) -> StateSnapshot {
    match kind {
        DeviceKind::Mouse => StateSnapshot::Mouse { buttons: 0 },
        DeviceKind::Keyboard => StateSnapshot::Keyboard { keys: KeySet::EMPTY },
        DeviceKind::Gamepad => StateSnapshot::Gamepad { buttons: [false; NUM_BUTTONS], axes: Vec::new() },
    }
}

/// Scriptable backend. Clones share one device world, so keep a clone around
/// for scripting after handing one to the hub.
#[derive(Clone, Default)]
pub struct VirtualBackend {
    world: Rc<RefCell<World>>,
}

impl VirtualBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&self, kind: DeviceKind, name: &str) -> VirtualDevice {
        let mut world = self.world.borrow_mut();
        let index = world.slots.len();
        world.slots.push(Slot {
            hardware: HardwareId::Unique(format!("virtual:{index}")),
            kind,
            name: name.to_string(),
            caps: default_caps(kind),
            present: true,
            queue: Vec::new(),
            snapshot: empty_snapshot(kind),
            rumble_log: Vec::new(),
            gain_log: Vec::new(),
            effects: HashMap::new(),
            next_effect: 1,
        });
        VirtualDevice { world: Rc::clone(&self.world), index }
    }

    /// Add a virtual mouse (5 buttons).
    pub fn add_mouse(&self, name: &str) -> VirtualDevice {
        self.add(DeviceKind::Mouse, name)
    }

    /// Add a virtual keyboard.
    pub fn add_keyboard(&self, name: &str) -> VirtualDevice {
        self.add(DeviceKind::Keyboard, name)
    }

    /// Add a virtual gamepad (2 sticks, analog triggers, synthetic rumble
    /// motor).
    pub fn add_gamepad(&self, name: &str) -> VirtualDevice {
        self.add(DeviceKind::Gamepad, name)
    }

    /// Advance the shared provider clock (microseconds).
    pub fn set_now(&self, now: Timestamp) {
        self.world.borrow_mut().clock = now;
    }
}

impl Backend for VirtualBackend {
    fn name(&self) -> &str {
        "virtual"
    }

    fn discover(&mut self) -> Result<Vec<Discovered>, Error> {
        let world = self.world.borrow();
        Ok(world
            .slots
            .iter()
            .filter(|slot| slot.present)
            .map(|slot| Discovered { hardware: slot.hardware.clone(), kind: slot.kind })
            .collect())
    }

    fn open(&mut self, hardware: &HardwareId, kind: DeviceKind) -> Option<Box<dyn DeviceIo>> {
        let world = self.world.borrow();
        let index = world
            .slots
            .iter()
            .position(|slot| slot.present && slot.kind == kind && slot.hardware == *hardware)?;
        let caps = world.slots[index].caps.clone();
        drop(world);
        Some(Box::new(VirtualIo { world: Rc::clone(&self.world), index, caps }))
    }
}

/// Scripting handle for one virtual device.
#[derive(Clone)]
pub struct VirtualDevice {
    world: Rc<RefCell<World>>,
    index: usize,
}

impl VirtualDevice {
    fn with<R>(&self, f: impl FnOnce(&mut Slot) -> R) -> R {
        f(&mut self.world.borrow_mut().slots[self.index])
    }

    /// Attach or detach the device. Detaching disconnects it on the next
    /// update; re-attaching allows reconnection.
    pub fn set_present(&self, present: bool) {
        self.with(|slot| slot.present = present);
    }

    /// Replace the capabilities used by subsequent opens.
    pub fn set_capabilities(&self, caps: Capabilities) {
        self.with(|slot| slot.caps = caps);
    }

    /// Queue a reading group for the next poll.
    pub fn push_reading(&self, timestamp: Timestamp, input: ReadingInput) {
        self.with(|slot| slot.queue.push(PollEvent::Reading(Reading { timestamp, input })));
    }

    /// Queue a buffer-overrun sentinel.
    pub fn push_overrun(&self, timestamp: Timestamp) {
        self.with(|slot| slot.queue.push(PollEvent::Overrun { timestamp }));
    }

    /// Set the whole-device state returned by overrun resyncs.
    pub fn set_snapshot(&self, snapshot: StateSnapshot) {
        self.with(|slot| slot.snapshot = snapshot);
    }

    /// All rumble submissions so far, oldest first.
    pub fn rumble_log(&self) -> Vec<(f32, f32)> {
        self.with(|slot| slot.rumble_log.clone())
    }

    /// All gain pushes so far, oldest first.
    pub fn gain_log(&self) -> Vec<(u32, f32)> {
        self.with(|slot| slot.gain_log.clone())
    }

    /// Snapshot of every effect slot ever allocated.
    pub fn effects(&self) -> Vec<EffectRecord> {
        self.with(|slot| slot.effects.values().cloned().collect())
    }
}

struct VirtualIo {
    world: Rc<RefCell<World>>,
    index: usize,
    caps: Capabilities,
}

impl VirtualIo {
    fn with<R>(&self, f: impl FnOnce(&mut Slot) -> R) -> R {
        f(&mut self.world.borrow_mut().slots[self.index])
    }
}

impl DeviceIo for VirtualIo {
    fn connected(&self) -> bool {
        self.with(|slot| slot.present)
    }

    fn display_name(&self) -> Option<String> {
        self.with(|slot| Some(slot.name.clone()))
    }

    fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    fn metadata(&self) -> DeviceMeta {
        self.with(|slot| DeviceMeta {
            bus: Some("virtual".to_string()),
            product_string: Some(slot.name.clone()),
            ..Default::default()
        })
    }

    fn now(&self) -> Timestamp {
        self.world.borrow().clock
    }

    fn poll(&mut self, since: Timestamp, out: &mut Vec<PollEvent>) -> Result<(), IoFailure> {
        self.with(|slot| {
            for event in slot.queue.drain(..) {
                let stale = matches!(&event, PollEvent::Reading(r) if r.timestamp < since);
                if !stale {
                    out.push(event);
                }
            }
            Ok(())
        })
    }

    fn snapshot(&mut self) -> Result<StateSnapshot, IoFailure> {
        self.with(|slot| Ok(slot.snapshot.clone()))
    }

    fn submit_rumble(&mut self, low: f32, high: f32) -> bool {
        self.with(|slot| {
            slot.rumble_log.push((low, high));
            true
        })
    }

    fn create_effect(&mut self, _motor: u32, kind: ForceKind) -> Option<EffectHandle> {
        self.with(|slot| {
            let handle = EffectHandle(slot.next_effect);
            slot.next_effect += 1;
            slot.effects.insert(
                handle.0,
                EffectRecord { handle, kind, uploads: Vec::new(), playing: false, destroyed: false },
            );
            Some(handle)
        })
    }

    fn upload_effect(&mut self, effect: EffectHandle, _kind: ForceKind, params: &ForceParams) -> bool {
        self.with(|slot| match slot.effects.get_mut(&effect.0) {
            Some(record) if !record.destroyed => {
                record.uploads.push(*params);
                true
            }
            _ => false,
        })
    }

    fn play_effect(&mut self, effect: EffectHandle, _kind: ForceKind) -> bool {
        self.with(|slot| match slot.effects.get_mut(&effect.0) {
            Some(record) if !record.destroyed => {
                record.playing = true;
                true
            }
            _ => false,
        })
    }

    fn stop_effect(&mut self, effect: EffectHandle) -> bool {
        self.with(|slot| match slot.effects.get_mut(&effect.0) {
            Some(record) if !record.destroyed => {
                record.playing = false;
                true
            }
            _ => false,
        })
    }

    fn destroy_effect(&mut self, effect: EffectHandle) {
        self.with(|slot| {
            if let Some(record) = slot.effects.get_mut(&effect.0) {
                record.playing = false;
                record.destroyed = true;
            }
        });
    }

    fn set_motor_gain(&mut self, motor: u32, gain: f32) -> bool {
        self.with(|slot| {
            slot.gain_log.push((motor, gain));
            true
        })
    }

    fn effect_status(&self, effect: EffectHandle) -> ForceStatus {
        self.with(|slot| match slot.effects.get(&effect.0) {
            Some(record) if !record.destroyed => {
                if record.playing {
                    ForceStatus::Active
                } else {
                    ForceStatus::Inactive
                }
            }
            _ => ForceStatus::Unknown,
        })
    }
}
