//! Devices.
//!
//! A [`Device`] is either backed directly by a platform provider or an
//! aggregate of same-kind members. Both present the same querying surface:
//! identity, connectivity, and the per-kind input state (mouse counters,
//! key/button values and digital states with timestamps, thumbstick vectors).
//!
//! Accessors follow one uniform out-of-domain policy: queries against an
//! invalid index/key/button — or against the wrong device kind — return
//! `0` / `false` / `+∞`, and setters no-op. While a device is disconnected,
//! all values read as zero, digital states as false, time-since-change as
//! `+∞`, and the display name as empty.
//!
//! Mutating lifecycle operations (update, destroy, aggregation) and the force
//! API live on [`Hub`](crate::Hub), the ownership root.

pub(crate) mod aggregate;
pub(crate) mod gamepad;
pub(crate) mod keyboard;
pub(crate) mod mouse;
pub(crate) mod native;

use crate::codes::{Button, DeviceKind, Key};
use crate::hub::Hub;
use crate::id::DeviceId;
use crate::metadata::DeviceMeta;

use aggregate::{AggregateDevice, AggregatePipeline};
use native::{NativeDevice, Pipeline};

pub(crate) enum Inner {
    Native(NativeDevice),
    Aggregate(AggregateDevice),
}

/// One registered input device.
pub struct Device {
    pub(crate) id: DeviceId,
    pub(crate) kind: DeviceKind,
    pub(crate) inner: Inner,
    /// Callback ids registered against this device; erased when the device is
    /// destroyed.
    pub(crate) attached_callbacks: Vec<u64>,
}

impl Device {
    pub(crate) fn native(id: DeviceId, kind: DeviceKind, native: NativeDevice) -> Self {
        Self { id, kind, inner: Inner::Native(native), attached_callbacks: Vec::new() }
    }

    pub(crate) fn aggregate(id: DeviceId, kind: DeviceKind, agg: AggregateDevice) -> Self {
        Self { id, kind, inner: Inner::Aggregate(agg), attached_callbacks: Vec::new() }
    }

    /// Runtime-unique id. Not related to the underlying hardware and not
    /// meaningful beyond this process.
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Device kind, fixed at creation.
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// True when this device merges several member devices.
    pub fn is_aggregate(&self) -> bool {
        matches!(self.inner, Inner::Aggregate(_))
    }

    /// Member ids of an aggregate, empty for native devices.
    pub fn members(&self) -> &[DeviceId] {
        match &self.inner {
            Inner::Native(_) => &[],
            Inner::Aggregate(agg) => &agg.members,
        }
    }

    /// Connectivity at the end of the last update. Aggregates are connected
    /// iff every member was.
    pub fn connected(&self) -> bool {
        match &self.inner {
            Inner::Native(n) => n.connected,
            Inner::Aggregate(a) => a.connected,
        }
    }

    /// Driver-reported display name; empty while disconnected. Aggregates
    /// compose `Aggregate{<member>;…}` from names cached at the last update.
    pub fn display_name(&self) -> String {
        match &self.inner {
            Inner::Native(n) => n.display_name(),
            Inner::Aggregate(a) => a.display_name(),
        }
    }

    /// Metadata snapshot captured at the last connect; `None` before the
    /// first connection and for aggregates.
    pub fn metadata(&self) -> Option<&DeviceMeta> {
        match &self.inner {
            Inner::Native(n) => n.meta.as_ref(),
            Inner::Aggregate(_) => None,
        }
    }

    fn last_update(&self) -> u64 {
        match &self.inner {
            Inner::Native(n) => n.last_update,
            Inner::Aggregate(a) => a.last_update,
        }
    }

    pub(crate) fn update(&mut self, hub: &mut Hub) {
        let id = self.id;
        match &mut self.inner {
            Inner::Native(n) => n.update(id, hub),
            Inner::Aggregate(a) => a.update(id, hub),
        }
    }

    // ---- mouse surface ----

    fn mouse_core(&self) -> Option<(&mouse::MouseCore, bool)> {
        match &self.inner {
            Inner::Native(n) => match &n.pipeline {
                Pipeline::Mouse(p) => Some((&p.core, n.connected)),
                _ => None,
            },
            Inner::Aggregate(a) => match &a.pipeline {
                AggregatePipeline::Mouse { core, .. } => Some((core, a.connected)),
                _ => None,
            },
        }
    }

    fn mouse_core_mut(&mut self) -> Option<&mut mouse::MouseCore> {
        match &mut self.inner {
            Inner::Native(n) => match &mut n.pipeline {
                Pipeline::Mouse(p) => Some(&mut p.core),
                _ => None,
            },
            Inner::Aggregate(a) => match &mut a.pipeline {
                AggregatePipeline::Mouse { core, .. } => Some(core),
                _ => None,
            },
        }
    }

    /// Cumulative cursor position in provider counts; (0, 0) while
    /// disconnected or for non-mice.
    pub fn position(&self) -> (i64, i64) {
        match self.mouse_core() {
            Some((core, true)) => (core.data.x, core.data.y),
            _ => (0, 0),
        }
    }

    /// Cursor movement between the last two updates.
    pub fn delta(&self) -> (i64, i64) {
        match self.mouse_core() {
            Some((core, true)) => (core.data.dx, core.data.dy),
            _ => (0, 0),
        }
    }

    /// Cumulative scroll in provider counts.
    pub fn scroll(&self) -> (i64, i64) {
        match self.mouse_core() {
            Some((core, true)) => (core.data.sx, core.data.sy),
            _ => (0, 0),
        }
    }

    /// Scroll change between the last two updates.
    pub fn scroll_delta(&self) -> (i64, i64) {
        match self.mouse_core() {
            Some((core, true)) => (core.data.sdx, core.data.sdy),
            _ => (0, 0),
        }
    }

    /// Number of addressable mouse buttons; 0 while disconnected.
    pub fn mouse_button_count(&self) -> u32 {
        match self.mouse_core() {
            Some((core, connected)) => core.button_count(connected),
            None => 0,
        }
    }

    /// Analog value of a mouse button in [0, 1]. Digital buttons read 1 or 0.
    pub fn mouse_button_value(&self, index: u32) -> f32 {
        match self.mouse_core() {
            Some((core, connected)) => core.button_value(index, connected),
            None => 0.0,
        }
    }

    /// Digital state of a mouse button (0 = left, 1 = right, 2 = middle).
    pub fn mouse_button_state(&self, index: u32) -> bool {
        self.mouse_button_state_timed(index).0
    }

    /// Digital state plus seconds since the last transition.
    pub fn mouse_button_state_timed(&self, index: u32) -> (bool, f32) {
        let now = self.last_update();
        match self.mouse_core() {
            Some((core, connected)) => core.button_state(index, connected, now),
            None => (false, f32::INFINITY),
        }
    }

    /// Press threshold of a mouse button; default 0.
    pub fn mouse_button_threshold(&self, index: u32) -> f32 {
        match self.mouse_core() {
            Some((core, _)) => core.button_threshold(index),
            None => 0.0,
        }
    }

    /// Set one mouse button threshold, clamped to [0, 1].
    pub fn set_mouse_button_threshold(&mut self, index: u32, threshold: f32) {
        if let Some(core) = self.mouse_core_mut() {
            core.set_button_threshold(index, threshold);
        }
    }

    // ---- keyboard surface ----

    fn keyboard_core(&self) -> Option<(&keyboard::KeyboardCore, bool)> {
        match &self.inner {
            Inner::Native(n) => match &n.pipeline {
                Pipeline::Keyboard(p) => Some((&p.core, n.connected)),
                _ => None,
            },
            Inner::Aggregate(a) => match &a.pipeline {
                AggregatePipeline::Keyboard { core } => Some((core, a.connected)),
                _ => None,
            },
        }
    }

    fn keyboard_core_mut(&mut self) -> Option<&mut keyboard::KeyboardCore> {
        match &mut self.inner {
            Inner::Native(n) => match &mut n.pipeline {
                Pipeline::Keyboard(p) => Some(&mut p.core),
                _ => None,
            },
            Inner::Aggregate(a) => match &mut a.pipeline {
                AggregatePipeline::Keyboard { core } => Some(core),
                _ => None,
            },
        }
    }

    /// Number of portable keys currently pressed.
    pub fn num_keys_pressed(&self) -> u32 {
        match self.keyboard_core() {
            Some((core, connected)) => core.num_pressed(connected),
            None => 0,
        }
    }

    /// Analog value of a key in [0, 1].
    pub fn key_value(&self, key: Key) -> f32 {
        match self.keyboard_core() {
            Some((core, connected)) => core.key_value(key, connected),
            None => 0.0,
        }
    }

    /// Digital state of a key.
    pub fn key_state(&self, key: Key) -> bool {
        self.key_state_timed(key).0
    }

    /// Digital state plus seconds since the last transition.
    pub fn key_state_timed(&self, key: Key) -> (bool, f32) {
        let now = self.last_update();
        match self.keyboard_core() {
            Some((core, connected)) => core.key_state(key, connected, now),
            None => (false, f32::INFINITY),
        }
    }

    /// Press threshold of a key; default 0.
    pub fn key_threshold(&self, key: Key) -> f32 {
        match self.keyboard_core() {
            Some((core, _)) => core.key_threshold(key),
            None => 0.0,
        }
    }

    /// Set one key threshold, clamped to [0, 1].
    pub fn set_key_threshold(&mut self, key: Key, threshold: f32) {
        if let Some(core) = self.keyboard_core_mut() {
            core.set_key_threshold(key, threshold);
        }
    }

    // ---- gamepad surface ----

    fn gamepad_core(&self) -> Option<(&gamepad::GamepadCore, bool)> {
        match &self.inner {
            Inner::Native(n) => match &n.pipeline {
                Pipeline::Gamepad(p) => Some((&p.core, n.connected)),
                _ => None,
            },
            Inner::Aggregate(a) => match &a.pipeline {
                AggregatePipeline::Gamepad { core } => Some((core, a.connected)),
                _ => None,
            },
        }
    }

    fn gamepad_core_mut(&mut self) -> Option<&mut gamepad::GamepadCore> {
        match &mut self.inner {
            Inner::Native(n) => match &mut n.pipeline {
                Pipeline::Gamepad(p) => Some(&mut p.core),
                _ => None,
            },
            Inner::Aggregate(a) => match &mut a.pipeline {
                AggregatePipeline::Gamepad { core } => Some(core),
                _ => None,
            },
        }
    }

    /// Analog value of a button or trigger in [0, 1].
    pub fn button_value(&self, button: Button) -> f32 {
        match self.gamepad_core() {
            Some((core, connected)) => core.button_value(button, connected),
            None => 0.0,
        }
    }

    /// Digital state of a button or trigger.
    pub fn button_state(&self, button: Button) -> bool {
        self.button_state_timed(button).0
    }

    /// Digital state plus seconds since the last transition.
    pub fn button_state_timed(&self, button: Button) -> (bool, f32) {
        let now = self.last_update();
        match self.gamepad_core() {
            Some((core, connected)) => core.button_state(button, connected, now),
            None => (false, f32::INFINITY),
        }
    }

    /// Press threshold of a button or trigger; default 0.
    pub fn button_threshold(&self, button: Button) -> f32 {
        match self.gamepad_core() {
            Some((core, _)) => core.button_threshold(button),
            None => 0.0,
        }
    }

    /// Set one button/trigger threshold, clamped to [0, 1].
    pub fn set_button_threshold(&mut self, button: Button, threshold: f32) {
        if let Some(core) = self.gamepad_core_mut() {
            core.set_button_threshold(button, threshold);
        }
    }

    /// Number of thumbsticks; aggregates expose the concatenation of their
    /// members' sticks.
    pub fn thumbstick_count(&self) -> u32 {
        match self.gamepad_core() {
            Some((core, connected)) => core.thumbstick_count(connected),
            None => 0,
        }
    }

    /// Thumbstick position, axes in [-1, +1] with Y positive up. The vector
    /// magnitude may slightly exceed 1. (0, 0) for invalid indices.
    pub fn thumbstick(&self, index: u32) -> (f32, f32) {
        match self.gamepad_core() {
            Some((core, connected)) => core.thumbstick(index, connected),
            None => (0.0, 0.0),
        }
    }

    // ---- shared ----

    /// Set the threshold of every input this device has, clamped to [0, 1].
    pub fn set_global_threshold(&mut self, threshold: f32) {
        match &mut self.inner {
            Inner::Native(n) => match &mut n.pipeline {
                Pipeline::Mouse(p) => p.core.set_global_threshold(threshold),
                Pipeline::Keyboard(p) => p.core.set_global_threshold(threshold),
                Pipeline::Gamepad(p) => p.core.set_global_threshold(threshold),
            },
            Inner::Aggregate(a) => match &mut a.pipeline {
                AggregatePipeline::Mouse { core, .. } => core.set_global_threshold(threshold),
                AggregatePipeline::Keyboard { core } => core.set_global_threshold(threshold),
                AggregatePipeline::Gamepad { core } => core.set_global_threshold(threshold),
            },
        }
    }
}
