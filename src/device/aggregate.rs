//! Aggregate devices.
//!
//! An aggregate composes several same-kind member devices (possibly other
//! aggregates) into one logical device. Updating an aggregate updates its
//! members first, then merges their state: button/key values merge as the
//! per-input maximum, mouse motion merges as the sum of per-member deltas
//! against per-member baselines, and thumbsticks are concatenated in member
//! order rather than merged.
//!
//! Aggregates have their own state cells (and therefore their own thresholds
//! and transition timestamps) fed through the regular modify path, so the
//! hysteresis and event semantics match native devices exactly.

use crate::codes::{Button, DeviceKind, Key, NUM_BUTTONS, NUM_KEYS};
use crate::device::gamepad::GamepadCore;
use crate::device::keyboard::KeyboardCore;
use crate::device::mouse::MouseCore;
use crate::dispatch::EventData;
use crate::event::{MouseMoveEvent, MouseScrollEvent, ThumbstickEvent};
use crate::hub::Hub;
use crate::id::DeviceId;
use crate::state::Timestamp;

/// Kind-specific merge state.
#[derive(Debug)]
pub(crate) enum AggregatePipeline {
    Mouse {
        core: MouseCore,
        /// Last observed (x, y, sx, sy) per member; `None` until the member
        /// has been sampled once after (re-)connect.
        baselines: Vec<Option<(i64, i64, i64, i64)>>,
    },
    Keyboard {
        core: KeyboardCore,
    },
    Gamepad {
        core: GamepadCore,
    },
}

pub(crate) struct AggregateDevice {
    pub members: Vec<DeviceId>,
    pub connected: bool,
    pub last_update: Timestamp,
    pub pipeline: AggregatePipeline,
    /// Aggregate motor index -> (member, member motor). Rebuilt every update.
    pub motor_map: Vec<(DeviceId, u32)>,
    /// Member display names cached at the last update, composing the
    /// aggregate's own display name.
    pub member_names: Vec<String>,
    /// Forces created through this aggregate, so destroying "all forces" of
    /// the aggregate reaches exactly the forces it forwarded to members.
    pub created_forces: Vec<crate::id::ForceId>,
}

impl AggregateDevice {
    pub fn new(kind: DeviceKind, members: Vec<DeviceId>) -> Self {
        let member_count = members.len();
        let pipeline = match kind {
            DeviceKind::Mouse => AggregatePipeline::Mouse {
                core: MouseCore::new(),
                baselines: vec![None; member_count],
            },
            DeviceKind::Keyboard => AggregatePipeline::Keyboard { core: KeyboardCore::new() },
            DeviceKind::Gamepad => AggregatePipeline::Gamepad { core: GamepadCore::new() },
        };
        Self {
            members,
            connected: false,
            last_update: 0,
            pipeline,
            motor_map: Vec::new(),
            member_names: Vec::new(),
            created_forces: Vec::new(),
        }
    }

    pub fn display_name(&self) -> String {
        if !self.connected {
            return String::new();
        }
        let mut name = String::from("Aggregate{");
        for member in &self.member_names {
            name.push_str(member);
            name.push(';');
        }
        name.push('}');
        name
    }

    /// Update all members, then merge. An aggregate is connected iff every
    /// member was connected at the end of this pass.
    pub fn update(&mut self, id: DeviceId, hub: &mut Hub) {
        let mut connected = true;
        for i in 0..self.members.len() {
            let member = self.members[i];
            hub.update_one(member);
            if !hub.device(member).map(|d| d.connected()).unwrap_or(false) {
                connected = false;
                break;
            }
        }

        if connected != self.connected {
            self.connected = connected;
            if !connected {
                self.last_update = 0;
                self.motor_map.clear();
                self.member_names.clear();
                match &mut self.pipeline {
                    AggregatePipeline::Mouse { core, baselines } => {
                        core.reset_runtime();
                        core.rebuild_cells(0);
                        baselines.iter_mut().for_each(|b| *b = None);
                    }
                    AggregatePipeline::Keyboard { core } => core.reset_runtime(),
                    AggregatePipeline::Gamepad { core } => core.reset_runtime(),
                }
            }
        }

        if !connected {
            return;
        }

        self.motor_map.clear();
        self.member_names.clear();
        for &member in &self.members {
            for motor in 0..hub.motor_count(member) {
                self.motor_map.push((member, motor));
            }
        }
        for &member in &self.members {
            let name = hub.device(member).map(|d| d.display_name()).unwrap_or_default();
            self.member_names.push(name);
        }

        self.last_update = wall_clock_micros();

        match &mut self.pipeline {
            AggregatePipeline::Mouse { core, baselines } => {
                merge_mouse(core, baselines, &self.members, self.last_update, id, hub)
            }
            AggregatePipeline::Keyboard { core } => {
                merge_keyboard(core, &self.members, self.last_update, id, hub)
            }
            AggregatePipeline::Gamepad { core } => {
                merge_gamepad(core, &self.members, self.last_update, id, hub)
            }
        }
    }
}

/// Microseconds on the wall clock; aggregates have no provider clock of their
/// own, and their cells only ever compare against this one.
fn wall_clock_micros() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as Timestamp)
        .unwrap_or(0)
}

fn merge_mouse(
    core: &mut MouseCore,
    baselines: &mut [Option<(i64, i64, i64, i64)>],
    members: &[DeviceId],
    ts: Timestamp,
    id: DeviceId,
    hub: &mut Hub,
) {
    // button count is the max across members; a change rebuilds the cells
    let mut bc = 0u32;
    for &member in members {
        if let Some(dev) = hub.device(member) {
            bc = bc.max(dev.mouse_button_count());
        }
    }
    if bc != core.button_count(true) {
        core.rebuild_cells(bc);
    }

    let mut new_values = vec![0.0f32; bc as usize];
    let (mut dx, mut dy, mut sdx, mut sdy) = (0i64, 0i64, 0i64, 0i64);

    for (i, &member) in members.iter().enumerate() {
        let Some(dev) = hub.device(member) else { continue };
        let (x, y) = dev.position();
        let (sx, sy) = dev.scroll();

        // a member's contribution is its movement since the previous pass
        if let Some((bx, by, bsx, bsy)) = baselines[i] {
            dx += x - bx;
            dy += y - by;
            sdx += sx - bsx;
            sdy += sy - bsy;
        }
        baselines[i] = Some((x, y, sx, sy));

        let maxb = bc.min(dev.mouse_button_count());
        for b in 0..maxb {
            new_values[b as usize] = new_values[b as usize].max(dev.mouse_button_value(b));
        }
    }

    core.data.x += dx;
    core.data.y += dy;
    core.data.dx = dx;
    core.data.dy = dy;
    core.data.sx += sdx;
    core.data.sy += sdy;
    core.data.sdx = sdx;
    core.data.sdy = sdy;

    if dx != 0 || dy != 0 {
        let (x, y) = (core.data.x, core.data.y);
        hub.emit(EventData::MouseMove(MouseMoveEvent { device: id, x, y, dx, dy }));
    }
    if sdx != 0 || sdy != 0 {
        let (x, y) = (core.data.sx, core.data.sy);
        hub.emit(EventData::MouseScroll(MouseScrollEvent { device: id, x, y, dx: sdx, dy: sdy }));
    }

    for b in 0..bc {
        core.apply_button(b, new_values[b as usize], ts, id, hub);
    }
}

fn merge_keyboard(core: &mut KeyboardCore, members: &[DeviceId], ts: Timestamp, id: DeviceId, hub: &mut Hub) {
    let mut new_values = [0.0f32; NUM_KEYS];
    for &member in members {
        let Some(dev) = hub.device(member) else { continue };
        for key in Key::all() {
            let value = dev.key_value(key);
            if value > new_values[key.index()] {
                new_values[key.index()] = value;
            }
        }
    }
    core.apply_values(&new_values, ts, id, hub);
}

fn merge_gamepad(core: &mut GamepadCore, members: &[DeviceId], ts: Timestamp, id: DeviceId, hub: &mut Hub) {
    // thumbsticks concatenate in member order; a count change resets all
    // sticks and re-fires every stick as changed
    let mut tc = 0u32;
    for &member in members {
        if let Some(dev) = hub.device(member) {
            tc += dev.thumbstick_count();
        }
    }
    let reset = tc != core.thumbstick_count(true);
    if reset {
        core.set_stick_count(tc);
    }

    let mut new_values = [0.0f32; NUM_BUTTONS];
    let mut stick_index = 0u32;

    for &member in members {
        let member_sticks = hub.device(member).map(|d| d.thumbstick_count()).unwrap_or(0);
        for t in 0..member_sticks {
            let (x, y) = hub.device(member).map(|d| d.thumbstick(t)).unwrap_or((0.0, 0.0));
            let current = core.thumbstick(stick_index, true);
            if x != current.0 || y != current.1 || reset {
                hub.emit(EventData::Thumbstick(ThumbstickEvent { device: id, index: stick_index, x, y }));
            }
            if let Some(slot) = core.stick_slot(stick_index) {
                *slot = (x, y);
            }
            stick_index += 1;
        }

        if let Some(dev) = hub.device(member) {
            for button in Button::all() {
                let value = dev.button_value(button);
                if value > new_values[button.index()] {
                    new_values[button.index()] = value;
                }
            }
        }
    }

    for button in Button::all() {
        core.apply_button(button, new_values[button.index()], ts, id, hub);
    }
}
