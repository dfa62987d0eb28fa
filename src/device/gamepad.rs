//! Gamepad state core, axis normalization, and reading pipeline.
//!
//! The pipeline unifies three raw shapes into the portable button/thumbstick
//! model:
//! - digital button transitions, suppressed for buttons that also have an
//!   analog source (some devices send both for the same physical input);
//! - analog trigger axes, normalized per-axis into the trigger buttons;
//! - the absolute D-pad hat, normalized to [-1, 1] and split into two
//!   opposing digital buttons via `max(0, ±value)`;
//! - thumbstick axes, staged per reading group so an X/Y pair arriving in the
//!   same group lands together, with the missing axis preserved from the
//!   previous state. Y is negated so positive Y means up.

use crate::backend::{AbsAxis, Capabilities, GamepadItem, GamepadReading};
use crate::codes::{Button, NUM_BUTTONS};
use crate::dispatch::EventData;
use crate::event::{GamepadButtonEvent, ThumbstickEvent};
use crate::hub::Hub;
use crate::id::DeviceId;
use crate::state::{StateCell, Timestamp};

/// Normalizes a provider `(min, max, raw)` absolute-axis range: the negative
/// half maps `[min, min(max, 0)] -> [-1, 0]` and the non-negative half maps
/// `[max(min, 0), max] -> [0, +1]`. Inverse deltas are precomputed and may be
/// zero, which collapses the corresponding half-axis to 0.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct AxisNorm {
    min: i32,
    max: i32,
    inv_neg: f64,
    inv_pos: f64,
}

impl AxisNorm {
    pub fn new(min: i32, max: i32) -> Self {
        let neg_span = (max.min(0) - min) as f64;
        let pos_span = (max - min.max(0)) as f64;
        Self {
            min,
            max,
            inv_neg: if neg_span > 0.0 { 1.0 / neg_span } else { 0.0 },
            inv_pos: if pos_span > 0.0 { 1.0 / pos_span } else { 0.0 },
        }
    }

    pub fn normalize(&self, raw: i32) -> f32 {
        let raw = raw.clamp(self.min, self.max);
        if raw < 0 {
            let floor = self.max.min(0);
            (((raw - floor) as f64 * self.inv_neg) as f32).clamp(-1.0, 0.0)
        } else {
            let floor = self.min.max(0);
            (((raw - floor) as f64 * self.inv_pos) as f32).clamp(0.0, 1.0)
        }
    }
}

/// Button cells plus thumbstick values, shared between native gamepads and
/// gamepad aggregates.
#[derive(Debug)]
pub(crate) struct GamepadCore {
    cells: [StateCell; NUM_BUTTONS],
    sticks: Vec<(f32, f32)>,
    stick_count: u32,
}

impl GamepadCore {
    pub fn new() -> Self {
        Self { cells: [StateCell::default(); NUM_BUTTONS], sticks: Vec::new(), stick_count: 0 }
    }

    pub fn button_value(&self, button: Button, connected: bool) -> f32 {
        if connected {
            self.cells[button.index()].value()
        } else {
            0.0
        }
    }

    pub fn button_state(&self, button: Button, connected: bool, now: Timestamp) -> (bool, f32) {
        if connected {
            let cell = &self.cells[button.index()];
            (cell.state(), cell.time_since(now))
        } else {
            (false, f32::INFINITY)
        }
    }

    pub fn button_threshold(&self, button: Button) -> f32 {
        self.cells[button.index()].threshold()
    }

    pub fn set_button_threshold(&mut self, button: Button, threshold: f32) {
        self.cells[button.index()].set_threshold(threshold);
    }

    pub fn set_global_threshold(&mut self, threshold: f32) {
        for cell in &mut self.cells {
            cell.set_threshold(threshold);
        }
    }

    pub fn thumbstick_count(&self, connected: bool) -> u32 {
        if connected {
            self.stick_count
        } else {
            0
        }
    }

    pub fn thumbstick(&self, index: u32, connected: bool) -> (f32, f32) {
        if connected && (index as usize) < self.sticks.len() {
            self.sticks[index as usize]
        } else {
            (0.0, 0.0)
        }
    }

    pub fn set_stick_count(&mut self, count: u32) {
        self.stick_count = count;
        self.sticks.clear();
        self.sticks.resize(count as usize, (0.0, 0.0));
    }

    pub fn stick_slot(&mut self, index: u32) -> Option<&mut (f32, f32)> {
        self.sticks.get_mut(index as usize)
    }

    pub fn apply_button(
        &mut self,
        button: Button,
        value: f32,
        ts: Timestamp,
        device: DeviceId,
        hub: &mut Hub,
    ) {
        let (changed, state) = self.cells[button.index()].modify(value, ts);
        if changed {
            hub.emit(EventData::GamepadButton(GamepadButtonEvent { device, button, value, state }));
        }
    }

    pub fn reset_runtime(&mut self) {
        for cell in &mut self.cells {
            cell.reset_runtime();
        }
        self.sticks.clear();
        self.stick_count = 0;
    }
}

/// Per-group thumbstick staging: axes of the same stick arriving in one
/// reading group are applied together.
#[derive(Clone, Copy, Debug, Default)]
struct StickStaging {
    target: u32,
    x: Option<i32>,
    y: Option<i32>,
    active: bool,
}

impl StickStaging {
    fn set(&mut self, index: u32, raw: i32, is_x: bool) {
        if self.active && self.target != index {
            // different stick in one group: keep the newest target only
            *self = StickStaging::default();
        }
        self.active = true;
        self.target = index;
        if is_x {
            self.x = Some(raw);
        } else {
            self.y = Some(raw);
        }
    }
}

/// Native gamepad pipeline: the core plus the per-axis normalizers and the
/// digital-suppression mask built from the device's analog capabilities.
#[derive(Debug)]
pub(crate) struct GamepadPipeline {
    pub core: GamepadCore,
    /// LeftX, LeftY, RightX, RightY.
    stick_norms: [AxisNorm; 4],
    /// L1, R1, L2, R2.
    trigger_norms: [AxisNorm; 4],
    dpad_norm: (AxisNorm, AxisNorm),
    /// Buttons with a registered analog source; duplicate digital updates for
    /// these are dropped.
    analog_button: [bool; NUM_BUTTONS],
}

impl GamepadPipeline {
    pub fn new() -> Self {
        Self {
            core: GamepadCore::new(),
            stick_norms: [AxisNorm::default(); 4],
            trigger_norms: [AxisNorm::default(); 4],
            dpad_norm: (AxisNorm::default(), AxisNorm::default()),
            analog_button: [false; NUM_BUTTONS],
        }
    }

    /// Build normalizers and the suppression mask from the advertised axis
    /// ranges.
    pub fn on_connected(&mut self, caps: &Capabilities) {
        self.core.set_stick_count(caps.thumbsticks);

        let mut norm_for = |axis: AbsAxis| caps.axis_range(axis).map(|(min, max)| AxisNorm::new(min, max));

        self.stick_norms[0] = norm_for(AbsAxis::LeftX).unwrap_or_default();
        self.stick_norms[1] = norm_for(AbsAxis::LeftY).unwrap_or_default();
        self.stick_norms[2] = norm_for(AbsAxis::RightX).unwrap_or_default();
        self.stick_norms[3] = norm_for(AbsAxis::RightY).unwrap_or_default();

        if let Some(norm) = norm_for(AbsAxis::HatX) {
            self.dpad_norm.0 = norm;
            self.analog_button[Button::DpadRight.index()] = true;
            self.analog_button[Button::DpadLeft.index()] = true;
        }
        if let Some(norm) = norm_for(AbsAxis::HatY) {
            self.dpad_norm.1 = norm;
            self.analog_button[Button::DpadUp.index()] = true;
            self.analog_button[Button::DpadDown.index()] = true;
        }

        for (slot, axis) in [
            (0, AbsAxis::TriggerL1),
            (1, AbsAxis::TriggerR1),
            (2, AbsAxis::TriggerL2),
            (3, AbsAxis::TriggerR2),
        ] {
            if let Some(norm) = norm_for(axis) {
                self.trigger_norms[slot] = norm;
                self.analog_button[axis.trigger_button().unwrap().index()] = true;
            }
        }
    }

    pub fn fold(&mut self, r: &GamepadReading, ts: Timestamp, device: DeviceId, hub: &mut Hub) {
        let mut staging = StickStaging::default();

        for item in &r.items {
            match *item {
                GamepadItem::Button { button, pressed } => {
                    // analog presence suppresses duplicate digital updates
                    if self.analog_button[button.index()] {
                        continue;
                    }
                    let value = if pressed { 1.0 } else { 0.0 };
                    self.core.apply_button(button, value, ts, device, hub);
                }
                GamepadItem::Axis { axis, raw } => match axis {
                    AbsAxis::HatX => {
                        let value = self.dpad_norm.0.normalize(raw);
                        self.split_dpad(value, ts, Button::DpadRight, Button::DpadLeft, device, hub);
                    }
                    AbsAxis::HatY => {
                        let value = self.dpad_norm.1.normalize(raw);
                        self.split_dpad(value, ts, Button::DpadUp, Button::DpadDown, device, hub);
                    }
                    AbsAxis::TriggerL1 | AbsAxis::TriggerR1 | AbsAxis::TriggerL2 | AbsAxis::TriggerR2 => {
                        let slot = match axis {
                            AbsAxis::TriggerL1 => 0,
                            AbsAxis::TriggerR1 => 1,
                            AbsAxis::TriggerL2 => 2,
                            _ => 3,
                        };
                        let value = self.trigger_norms[slot].normalize(raw);
                        let button = axis.trigger_button().unwrap();
                        self.core.apply_button(button, value, ts, device, hub);
                    }
                    AbsAxis::LeftX => staging.set(0, raw, true),
                    AbsAxis::LeftY => staging.set(0, raw, false),
                    AbsAxis::RightX => staging.set(1, raw, true),
                    AbsAxis::RightY => staging.set(1, raw, false),
                },
            }
        }

        if staging.active {
            self.apply_stick(&staging, device, hub);
        }
    }

    fn apply_stick(&mut self, staging: &StickStaging, device: DeviceId, hub: &mut Hub) {
        let index = staging.target;
        let Some(slot) = self.core.stick_slot(index) else { return };
        let mut changed = false;
        let (mut x, mut y) = *slot;

        if let Some(raw) = staging.x {
            let value = self.stick_norms[(index as usize * 2).min(2)].normalize(raw);
            changed |= value != x;
            x = value;
        }
        if let Some(raw) = staging.y {
            // positive Y is up
            let value = -self.stick_norms[(index as usize * 2 + 1).min(3)].normalize(raw);
            changed |= value != y;
            y = value;
        }

        *slot = (x, y);
        if changed {
            hub.emit(EventData::Thumbstick(ThumbstickEvent { device, index, x, y }));
        }
    }

    /// Split a normalized hat axis into two opposing digital buttons.
    fn split_dpad(
        &mut self,
        value: f32,
        ts: Timestamp,
        positive: Button,
        negative: Button,
        device: DeviceId,
        hub: &mut Hub,
    ) {
        self.core.apply_button(positive, value.max(0.0), ts, device, hub);
        self.core.apply_button(negative, (-value).max(0.0), ts, device, hub);
    }

    /// Overrun recovery from a whole-device query: axes that have an analog
    /// source are re-derived from their raw values, everything else falls
    /// back to the digital button states.
    pub fn apply_snapshot(
        &mut self,
        buttons: &[bool; NUM_BUTTONS],
        axes: &[(AbsAxis, i32)],
        ts: Timestamp,
        device: DeviceId,
        hub: &mut Hub,
    ) {
        let raw_of = |axis: AbsAxis| axes.iter().find(|(a, _)| *a == axis).map(|&(_, raw)| raw);

        // dpad
        match raw_of(AbsAxis::HatX) {
            Some(raw) => {
                let value = self.dpad_norm.0.normalize(raw);
                self.split_dpad(value, ts, Button::DpadRight, Button::DpadLeft, device, hub);
            }
            None => {
                self.apply_digital(Button::DpadRight, buttons, ts, device, hub);
                self.apply_digital(Button::DpadLeft, buttons, ts, device, hub);
            }
        }
        match raw_of(AbsAxis::HatY) {
            Some(raw) => {
                let value = self.dpad_norm.1.normalize(raw);
                self.split_dpad(value, ts, Button::DpadUp, Button::DpadDown, device, hub);
            }
            None => {
                self.apply_digital(Button::DpadUp, buttons, ts, device, hub);
                self.apply_digital(Button::DpadDown, buttons, ts, device, hub);
            }
        }

        // triggers
        for (slot, axis) in [
            (0, AbsAxis::TriggerL1),
            (1, AbsAxis::TriggerR1),
            (2, AbsAxis::TriggerL2),
            (3, AbsAxis::TriggerR2),
        ] {
            let button = axis.trigger_button().unwrap();
            match raw_of(axis) {
                Some(raw) => {
                    let value = self.trigger_norms[slot].normalize(raw);
                    self.core.apply_button(button, value, ts, device, hub);
                }
                None => self.apply_digital(button, buttons, ts, device, hub),
            }
        }

        // thumbsticks, absolute
        for index in 0..self.core.thumbstick_count(true) {
            let x_axis = if index == 0 { AbsAxis::LeftX } else { AbsAxis::RightX };
            let y_axis = if index == 0 { AbsAxis::LeftY } else { AbsAxis::RightY };
            let x = raw_of(x_axis)
                .map(|raw| self.stick_norms[(index as usize * 2).min(2)].normalize(raw))
                .unwrap_or(0.0);
            let y = raw_of(y_axis)
                .map(|raw| -self.stick_norms[(index as usize * 2 + 1).min(3)].normalize(raw))
                .unwrap_or(0.0);
            if let Some(slot) = self.core.stick_slot(index) {
                if *slot != (x, y) {
                    *slot = (x, y);
                    hub.emit(EventData::Thumbstick(ThumbstickEvent { device, index, x, y }));
                }
            }
        }

        // remaining digital buttons
        for button in [
            Button::North,
            Button::South,
            Button::West,
            Button::East,
            Button::ThumbstickL,
            Button::ThumbstickR,
            Button::Select,
            Button::Start,
        ] {
            self.apply_digital(button, buttons, ts, device, hub);
        }
    }

    fn apply_digital(
        &mut self,
        button: Button,
        buttons: &[bool; NUM_BUTTONS],
        ts: Timestamp,
        device: DeviceId,
        hub: &mut Hub,
    ) {
        let value = if buttons[button.index()] { 1.0 } else { 0.0 };
        self.core.apply_button(button, value, ts, device, hub);
    }

    pub fn on_disconnected(&mut self) {
        self.core.reset_runtime();
        self.stick_norms = [AxisNorm::default(); 4];
        self.trigger_norms = [AxisNorm::default(); 4];
        self.dpad_norm = (AxisNorm::default(), AxisNorm::default());
        self.analog_button = [false; NUM_BUTTONS];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_range_normalizes_to_unit_interval() {
        let norm = AxisNorm::new(-32768, 32767);
        assert_eq!(norm.normalize(-32768), -1.0);
        assert_eq!(norm.normalize(0), 0.0);
        assert_eq!(norm.normalize(32767), 1.0);
        assert!(norm.normalize(16384) > 0.49 && norm.normalize(16384) < 0.51);
    }

    #[test]
    fn positive_only_range_collapses_negative_half() {
        let norm = AxisNorm::new(0, 255);
        assert_eq!(norm.normalize(0), 0.0);
        assert_eq!(norm.normalize(255), 1.0);
        assert_eq!(norm.normalize(-50), 0.0, "raw clamps into the range");
    }

    #[test]
    fn degenerate_range_collapses_to_zero() {
        let norm = AxisNorm::new(0, 0);
        assert_eq!(norm.normalize(12345), 0.0);
    }

    #[test]
    fn out_of_range_raw_is_clamped() {
        let norm = AxisNorm::new(-100, 100);
        assert_eq!(norm.normalize(1000), 1.0);
        assert_eq!(norm.normalize(-1000), -1.0);
    }
}
