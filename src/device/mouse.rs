//! Mouse state core and reading pipeline.
//!
//! Providers report position and wheel as monotonic cumulative counters. The
//! pipeline keeps an offset baseline from the first reading after a connect
//! and folds `current - baseline` into the per-update deltas and cumulative
//! totals, so the very first reading contributes zero motion.

use crate::backend::MouseReading;
use crate::dispatch::EventData;
use crate::event::{MouseButtonEvent, MouseMoveEvent, MouseScrollEvent};
use crate::hub::Hub;
use crate::id::DeviceId;
use crate::state::{MouseData, StateCell, Timestamp};

/// Buttons a mouse core can address before the first connection reports a
/// real count.
pub(crate) const DEFAULT_MOUSE_BUTTONS: u32 = 8;

/// Button cells plus the cumulative/delta counters, shared between native
/// mice and mouse aggregates.
#[derive(Debug)]
pub(crate) struct MouseCore {
    pub data: MouseData,
    cells: Vec<StateCell>,
    button_count: u32,
}

impl MouseCore {
    pub fn new() -> Self {
        Self {
            data: MouseData::default(),
            cells: vec![StateCell::default(); DEFAULT_MOUSE_BUTTONS as usize],
            button_count: DEFAULT_MOUSE_BUTTONS,
        }
    }

    /// Adopt a provider-reported button count, growing the cell table as
    /// needed. Existing thresholds are kept.
    pub fn set_button_count(&mut self, count: u32) {
        if count as usize > self.cells.len() {
            self.cells.resize(count as usize, StateCell::default());
        }
        self.button_count = count;
    }

    /// Replace the cell table outright (aggregate path: a member-count change
    /// resizes and resets the cells).
    pub fn rebuild_cells(&mut self, count: u32) {
        self.cells.clear();
        self.cells.resize(count as usize, StateCell::default());
        self.button_count = count;
    }

    pub fn button_count(&self, connected: bool) -> u32 {
        if connected {
            self.button_count
        } else {
            0
        }
    }

    pub fn button_value(&self, index: u32, connected: bool) -> f32 {
        if connected && index < self.button_count {
            self.cells[index as usize].value()
        } else {
            0.0
        }
    }

    pub fn button_state(&self, index: u32, connected: bool, now: Timestamp) -> (bool, f32) {
        if connected && index < self.button_count {
            let cell = &self.cells[index as usize];
            (cell.state(), cell.time_since(now))
        } else {
            (false, f32::INFINITY)
        }
    }

    pub fn button_threshold(&self, index: u32) -> f32 {
        if index < self.button_count {
            self.cells[index as usize].threshold()
        } else {
            0.0
        }
    }

    pub fn set_button_threshold(&mut self, index: u32, threshold: f32) {
        if index < self.button_count {
            self.cells[index as usize].set_threshold(threshold);
        }
    }

    pub fn set_global_threshold(&mut self, threshold: f32) {
        for cell in &mut self.cells {
            cell.set_threshold(threshold);
        }
    }

    /// Modify one button cell, emitting a button event on change.
    pub fn apply_button(
        &mut self,
        index: u32,
        value: f32,
        ts: Timestamp,
        device: DeviceId,
        hub: &mut Hub,
    ) {
        if index >= self.button_count {
            return;
        }
        let (changed, state) = self.cells[index as usize].modify(value, ts);
        if changed {
            hub.emit(EventData::MouseButton(MouseButtonEvent { device, index, value, state }));
        }
    }

    /// Clear runtime state but keep thresholds and the cell table.
    pub fn reset_runtime(&mut self) {
        for cell in &mut self.cells {
            cell.reset_runtime();
        }
        self.data = MouseData::default();
    }
}

/// Native mouse pipeline: the core plus the provider counter baseline.
#[derive(Debug)]
pub(crate) struct MousePipeline {
    pub core: MouseCore,
    offset: Option<(i64, i64, i64, i64)>,
}

impl MousePipeline {
    pub fn new() -> Self {
        Self { core: MouseCore::new(), offset: None }
    }

    /// Per-update deltas are relative to the previous update.
    pub fn pre_update(&mut self) {
        self.core.data.dx = 0;
        self.core.data.dy = 0;
        self.core.data.sdx = 0;
        self.core.data.sdy = 0;
    }

    pub fn fold(&mut self, r: &MouseReading, ts: Timestamp, device: DeviceId, hub: &mut Hub) {
        let (dx, dy, sdx, sdy) = match self.offset {
            Some((ox, oy, osx, osy)) => (r.x - ox, r.y - oy, r.scroll_x - osx, r.scroll_y - osy),
            None => (0, 0, 0, 0),
        };
        self.offset = Some((r.x, r.y, r.scroll_x, r.scroll_y));

        let data = &mut self.core.data;
        data.x += dx;
        data.y += dy;
        data.dx += dx;
        data.dy += dy;
        data.sx += sdx;
        data.sy += sdy;
        data.sdx += sdx;
        data.sdy += sdy;

        if dx != 0 || dy != 0 {
            let (x, y) = (data.x, data.y);
            hub.emit(EventData::MouseMove(MouseMoveEvent { device, x, y, dx, dy }));
        }
        if sdx != 0 || sdy != 0 {
            let (x, y) = (self.core.data.sx, self.core.data.sy);
            hub.emit(EventData::MouseScroll(MouseScrollEvent { device, x, y, dx: sdx, dy: sdy }));
        }

        let count = self.core.button_count(true);
        for index in 0..count {
            let value = if r.buttons & (1 << index) != 0 { 1.0 } else { 0.0 };
            self.core.apply_button(index, value, ts, device, hub);
        }
    }

    /// Overrun recovery: the button bitmap is ground truth; counters keep
    /// their last folded values (motion lost in the overrun is gone).
    pub fn apply_snapshot(&mut self, buttons: u32, ts: Timestamp, device: DeviceId, hub: &mut Hub) {
        let count = self.core.button_count(true);
        for index in 0..count {
            let value = if buttons & (1 << index) != 0 { 1.0 } else { 0.0 };
            self.core.apply_button(index, value, ts, device, hub);
        }
    }

    pub fn on_connected(&mut self, button_count: u32) {
        self.core.set_button_count(button_count);
    }

    pub fn on_disconnected(&mut self) {
        self.core.reset_runtime();
        self.offset = None;
    }
}
