//! Keyboard state core and reading pipeline.

use crate::backend::KeyboardReading;
use crate::codes::{Key, KeySet, NUM_KEYS};
use crate::dispatch::EventData;
use crate::event::KeyEvent;
use crate::hub::Hub;
use crate::id::DeviceId;
use crate::state::{StateCell, Timestamp};

/// Key cells plus the pressed counter, shared between native keyboards and
/// keyboard aggregates. The counter is maintained by the counted modify path,
/// so it always equals the number of cells whose digital state is true.
#[derive(Debug)]
pub(crate) struct KeyboardCore {
    cells: [StateCell; NUM_KEYS],
    pressed: u32,
}

impl KeyboardCore {
    pub fn new() -> Self {
        Self { cells: [StateCell::default(); NUM_KEYS], pressed: 0 }
    }

    pub fn num_pressed(&self, connected: bool) -> u32 {
        if connected {
            self.pressed
        } else {
            0
        }
    }

    pub fn key_value(&self, key: Key, connected: bool) -> f32 {
        if connected {
            self.cells[key.index()].value()
        } else {
            0.0
        }
    }

    pub fn key_state(&self, key: Key, connected: bool, now: Timestamp) -> (bool, f32) {
        if connected {
            let cell = &self.cells[key.index()];
            (cell.state(), cell.time_since(now))
        } else {
            (false, f32::INFINITY)
        }
    }

    pub fn key_threshold(&self, key: Key) -> f32 {
        self.cells[key.index()].threshold()
    }

    pub fn set_key_threshold(&mut self, key: Key, threshold: f32) {
        self.cells[key.index()].set_threshold(threshold);
    }

    pub fn set_global_threshold(&mut self, threshold: f32) {
        for cell in &mut self.cells {
            cell.set_threshold(threshold);
        }
    }

    /// Fold a full pressed-set into the 112 cells, firing key events for
    /// every cell whose value or state moved.
    pub fn apply_set(&mut self, keys: &KeySet, ts: Timestamp, device: DeviceId, hub: &mut Hub) {
        for key in Key::all() {
            let value = if keys.contains(key) { 1.0 } else { 0.0 };
            let (changed, state) = self.cells[key.index()].modify_counted(value, ts, &mut self.pressed);
            if changed {
                hub.emit(EventData::Key(KeyEvent { device, key, value, state }));
            }
        }
    }

    /// Fold a per-key max across members (aggregate path).
    pub fn apply_values(&mut self, values: &[f32; NUM_KEYS], ts: Timestamp, device: DeviceId, hub: &mut Hub) {
        for key in Key::all() {
            let value = values[key.index()];
            let (changed, state) = self.cells[key.index()].modify_counted(value, ts, &mut self.pressed);
            if changed {
                hub.emit(EventData::Key(KeyEvent { device, key, value, state }));
            }
        }
    }

    pub fn reset_runtime(&mut self) {
        for cell in &mut self.cells {
            cell.reset_runtime();
        }
        self.pressed = 0;
    }
}

/// Native keyboard pipeline. Thin: a reading already carries the full
/// pressed-set, which is exactly what the core folds.
#[derive(Debug)]
pub(crate) struct KeyboardPipeline {
    pub core: KeyboardCore,
}

impl KeyboardPipeline {
    pub fn new() -> Self {
        Self { core: KeyboardCore::new() }
    }

    pub fn fold(&mut self, r: &KeyboardReading, ts: Timestamp, device: DeviceId, hub: &mut Hub) {
        self.core.apply_set(&r.keys, ts, device, hub);
    }

    pub fn on_disconnected(&mut self) {
        self.core.reset_runtime();
    }
}
