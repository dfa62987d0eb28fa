//! Native (backend-backed) device: connection lifecycle, the update
//! protocol, and the per-device force table.

use std::collections::HashMap;

use log::{debug, warn};

use crate::backend::{Capabilities, DeviceIo, PollEvent, Reading, ReadingInput, StateSnapshot};
use crate::codes::DeviceKind;
use crate::device::gamepad::GamepadPipeline;
use crate::device::keyboard::KeyboardPipeline;
use crate::device::mouse::MousePipeline;
use crate::dispatch::EventData;
use crate::error::Error;
use crate::event::{DeviceStatusChange, StatusEvent};
use crate::force::{ForceKind, ForceParams, ForceRecord, ForceStatus};
use crate::backend::HardwareId;
use crate::hub::Hub;
use crate::id::{DeviceId, ForceId};
use crate::metadata::DeviceMeta;
use crate::state::Timestamp;

/// Kind-specific folding state.
#[derive(Debug)]
pub(crate) enum Pipeline {
    Mouse(MousePipeline),
    Keyboard(KeyboardPipeline),
    Gamepad(GamepadPipeline),
}

impl Pipeline {
    fn new(kind: DeviceKind) -> Self {
        match kind {
            DeviceKind::Mouse => Pipeline::Mouse(MousePipeline::new()),
            DeviceKind::Keyboard => Pipeline::Keyboard(KeyboardPipeline::new()),
            DeviceKind::Gamepad => Pipeline::Gamepad(GamepadPipeline::new()),
        }
    }
}

pub(crate) struct NativeDevice {
    pub kind: DeviceKind,
    pub hardware: HardwareId,
    pub connected: bool,
    pub last_update: Timestamp,
    /// Highest reading timestamp consumed so far; the next poll drains
    /// strictly newer readings.
    watermark: Timestamp,
    io: Option<Box<dyn DeviceIo>>,
    pub caps: Capabilities,
    pub pipeline: Pipeline,
    pub meta: Option<DeviceMeta>,
    pub motor_gains: Vec<f32>,
    pub forces: HashMap<ForceId, ForceRecord>,
    rumble_force: Option<ForceId>,
    poll_buf: Vec<PollEvent>,
    queue: Vec<Reading>,
}

impl NativeDevice {
    pub fn new(kind: DeviceKind, hardware: HardwareId) -> Self {
        Self {
            kind,
            hardware,
            connected: false,
            last_update: 0,
            watermark: 0,
            io: None,
            caps: Capabilities::default(),
            pipeline: Pipeline::new(kind),
            meta: None,
            motor_gains: Vec::new(),
            forces: HashMap::new(),
            rumble_force: None,
            poll_buf: Vec::new(),
            queue: Vec::new(),
        }
    }

    pub fn display_name(&self) -> String {
        if self.connected {
            self.io
                .as_ref()
                .and_then(|io| io.display_name())
                .unwrap_or_default()
        } else {
            String::new()
        }
    }

    /// The full update protocol. The device is detached from the registry
    /// while this runs, so callbacks invoked from `hub` cannot observe it
    /// half-folded.
    pub fn update(&mut self, id: DeviceId, hub: &mut Hub) {
        if !self.connected && !self.try_connect(id, hub) {
            return;
        }

        let mut io = self.io.take().expect("connected device must hold a handle");
        if !io.connected() {
            self.disconnect(id, hub);
            return;
        }

        io.flush_hint();

        if let Pipeline::Mouse(mouse) = &mut self.pipeline {
            mouse.pre_update();
        }

        let mut events = std::mem::take(&mut self.poll_buf);
        events.clear();
        if let Err(failure) = io.poll(self.watermark.wrapping_add(1), &mut events) {
            warn!("device {id}: poll failed ({failure:?}); disconnecting");
            self.poll_buf = events;
            drop(io);
            self.disconnect(id, hub);
            return;
        }

        let mut queue = std::mem::take(&mut self.queue);
        queue.clear();
        let mut highest: Timestamp = 0;
        let mut lost_handle = false;

        for ev in events.drain(..) {
            match ev {
                PollEvent::Reading(reading) => queue.push(reading),
                PollEvent::Overrun { timestamp } => {
                    // Pre-overrun readings describe history the provider
                    // already dropped; ground truth replaces them.
                    queue.clear();
                    match io.snapshot() {
                        Ok(snapshot) => {
                            debug!("device {id}: buffer overrun, resynced from device state");
                            self.apply_snapshot(&snapshot, timestamp, id, hub);
                            highest = highest.max(timestamp);
                        }
                        Err(failure) => {
                            warn!("device {id}: overrun resync failed ({failure:?}); disconnecting");
                            lost_handle = true;
                            break;
                        }
                    }
                }
            }
        }

        if lost_handle {
            self.poll_buf = events;
            self.queue = queue;
            drop(io);
            self.disconnect(id, hub);
            return;
        }

        for reading in queue.drain(..) {
            highest = highest.max(reading.timestamp);
            self.handle_reading(&reading, id, hub);
        }

        self.watermark = self.watermark.max(highest);
        self.last_update = io.now().max(highest);
        self.poll_buf = events;
        self.queue = queue;
        self.io = Some(io);
    }

    fn handle_reading(&mut self, reading: &Reading, id: DeviceId, hub: &mut Hub) {
        let ts = reading.timestamp;
        match (&mut self.pipeline, &reading.input) {
            (Pipeline::Mouse(p), ReadingInput::Mouse(r)) => p.fold(r, ts, id, hub),
            (Pipeline::Keyboard(p), ReadingInput::Keyboard(r)) => p.fold(r, ts, id, hub),
            (Pipeline::Gamepad(p), ReadingInput::Gamepad(r)) => p.fold(r, ts, id, hub),
            _ => {}
        }
    }

    fn apply_snapshot(&mut self, snapshot: &StateSnapshot, ts: Timestamp, id: DeviceId, hub: &mut Hub) {
        match (&mut self.pipeline, snapshot) {
            (Pipeline::Mouse(p), StateSnapshot::Mouse { buttons }) => {
                p.apply_snapshot(*buttons, ts, id, hub)
            }
            (Pipeline::Keyboard(p), StateSnapshot::Keyboard { keys }) => {
                p.core.apply_set(keys, ts, id, hub)
            }
            (Pipeline::Gamepad(p), StateSnapshot::Gamepad { buttons, axes }) => {
                p.apply_snapshot(buttons, axes, ts, id, hub)
            }
            _ => {}
        }
    }

    fn try_connect(&mut self, id: DeviceId, hub: &mut Hub) -> bool {
        let Some(io) = hub.backend.open(&self.hardware, self.kind) else {
            return false;
        };

        self.caps = io.capabilities().clone();
        self.meta = Some(io.metadata());
        self.connected = true;
        self.io = Some(io);

        let io = self.io.as_mut().unwrap();
        self.motor_gains = vec![1.0; self.caps.motors.len()];
        for motor in 0..self.caps.motors.len() as u32 {
            io.set_motor_gain(motor, 1.0);
        }
        io.disable_autocenter();

        match &mut self.pipeline {
            Pipeline::Mouse(p) => p.on_connected(self.caps.mouse_buttons),
            Pipeline::Keyboard(_) => {}
            Pipeline::Gamepad(p) => p.on_connected(&self.caps),
        }

        debug!("device {id}: connected ({})", self.hardware);
        hub.emit(EventData::Status(StatusEvent { device: id, change: DeviceStatusChange::Connected }));
        true
    }

    /// Disconnect transition: orphan forces, drop the session caches, release
    /// the handle. Thresholds persist.
    pub fn disconnect(&mut self, id: DeviceId, hub: &mut Hub) {
        if !self.connected {
            return;
        }

        self.connected = false;
        self.last_update = 0;
        self.watermark = 0;

        if let Some(io) = self.io.as_mut() {
            for record in self.forces.values() {
                if let Some(handle) = record.effect {
                    io.destroy_effect(handle);
                }
            }
        }
        for record in self.forces.values_mut() {
            record.orphaned = true;
            record.effect = None;
            record.rumble_active = false;
        }
        self.rumble_force = None;

        self.motor_gains.clear();
        self.caps = Capabilities::default();
        self.io = None;

        match &mut self.pipeline {
            Pipeline::Mouse(p) => p.on_disconnected(),
            Pipeline::Keyboard(p) => p.on_disconnected(),
            Pipeline::Gamepad(p) => p.on_disconnected(),
        }

        debug!("device {id}: disconnected");
        hub.emit(EventData::Status(StatusEvent { device: id, change: DeviceStatusChange::Disconnected }));
    }

    // ---- forces ----

    pub fn motor_count(&self) -> u32 {
        if self.connected {
            self.caps.motors.len() as u32
        } else {
            0
        }
    }

    pub fn gain(&self, motor: u32) -> f32 {
        if self.connected {
            self.motor_gains.get(motor as usize).copied().unwrap_or(0.0)
        } else {
            0.0
        }
    }

    pub fn set_gain(&mut self, motor: u32, gain: f32) {
        if !self.connected || motor as usize >= self.motor_gains.len() {
            return;
        }
        let gain = gain.clamp(0.0, 1.0);
        self.motor_gains[motor as usize] = gain;

        let Some(io) = self.io.as_mut() else { return };
        io.set_motor_gain(motor, gain);

        // A synthetic rumble slot has no provider-side gain; recommit the
        // active rumble so the audible effect tracks the new gain without an
        // explicit parameter write.
        if motor == 0 && self.caps.synthetic_rumble {
            if let Some(fid) = self.rumble_force {
                if let Some(record) = self.forces.get(&fid) {
                    if record.rumble_active && !record.orphaned {
                        if let ForceParams::Rumble(p) = record.params {
                            io.submit_rumble(p.low.clamp(0.0, 1.0) * gain, p.high.clamp(0.0, 1.0) * gain);
                        }
                    }
                }
            }
        }
    }

    pub fn supports_force(&self, motor: u32, kind: ForceKind) -> bool {
        self.connected
            && self
                .caps
                .motors
                .get(motor as usize)
                .is_some_and(|m| m.kinds.contains(kind))
    }

    pub fn create_force(&mut self, fid: ForceId, motor: u32, kind: ForceKind) -> Result<(), Error> {
        if !self.supports_force(motor, kind) {
            return Err(Error::CapabilityMismatch);
        }
        // at most one rumble force per device
        if kind == ForceKind::Rumble && self.rumble_force.is_some() {
            return Err(Error::CapabilityMismatch);
        }
        let io = self.io.as_mut().ok_or(Error::CapabilityMismatch)?;

        let effect = if kind == ForceKind::Rumble && self.caps.synthetic_rumble {
            None
        } else {
            Some(io.create_effect(motor, kind).ok_or(Error::CapabilityMismatch)?)
        };

        self.forces.insert(
            fid,
            ForceRecord {
                id: fid,
                kind,
                motor,
                params: ForceParams::default_for(kind),
                effect,
                orphaned: false,
                rumble_active: false,
            },
        );
        if kind == ForceKind::Rumble {
            self.rumble_force = Some(fid);
        }
        Ok(())
    }

    pub fn start_force(&mut self, fid: ForceId) -> bool {
        let Some(record) = self.forces.get_mut(&fid) else { return false };
        if record.orphaned || !record.params.matches(record.kind) {
            return false;
        }
        let Some(io) = self.io.as_mut() else { return false };

        match record.effect {
            None => {
                let ForceParams::Rumble(p) = record.params else { return false };
                let gain = self.motor_gains.get(record.motor as usize).copied().unwrap_or(0.0);
                if io.submit_rumble(p.low.clamp(0.0, 1.0) * gain, p.high.clamp(0.0, 1.0) * gain) {
                    record.rumble_active = true;
                    true
                } else {
                    false
                }
            }
            Some(handle) => {
                // starting implicitly re-uploads the current parameters
                if !io.upload_effect(handle, record.kind, &record.params) {
                    return false;
                }
                if io.play_effect(handle, record.kind) {
                    if record.kind == ForceKind::Rumble {
                        record.rumble_active = true;
                    }
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn stop_force(&mut self, fid: ForceId) -> bool {
        let Some(record) = self.forces.get_mut(&fid) else { return false };
        if record.orphaned {
            return false;
        }
        let Some(io) = self.io.as_mut() else { return false };

        match record.effect {
            None => {
                io.submit_rumble(0.0, 0.0);
                record.rumble_active = false;
                true
            }
            Some(handle) => {
                io.stop_effect(handle);
                if record.kind == ForceKind::Rumble {
                    record.rumble_active = false;
                }
                true
            }
        }
    }

    pub fn write_force_params(&mut self, fid: ForceId) -> bool {
        let Some(record) = self.forces.get_mut(&fid) else { return false };
        if record.orphaned || !record.params.matches(record.kind) {
            return false;
        }
        let Some(io) = self.io.as_mut() else { return false };

        match record.effect {
            None => {
                // the direct rumble path has no stored effect to retarget;
                // only an active rumble can pick up new parameters
                if !record.rumble_active {
                    return false;
                }
                let ForceParams::Rumble(p) = record.params else { return false };
                let gain = self.motor_gains.get(record.motor as usize).copied().unwrap_or(0.0);
                io.submit_rumble(p.low.clamp(0.0, 1.0) * gain, p.high.clamp(0.0, 1.0) * gain)
            }
            Some(handle) => io.upload_effect(handle, record.kind, &record.params),
        }
    }

    pub fn force_status(&self, fid: ForceId) -> Option<ForceStatus> {
        let record = self.forces.get(&fid)?;
        Some(if record.orphaned {
            ForceStatus::Inactive
        } else if record.kind == ForceKind::Rumble {
            // rumble self-reports its last commanded state
            if record.rumble_active {
                ForceStatus::Active
            } else {
                ForceStatus::Inactive
            }
        } else {
            match (record.effect, self.io.as_ref()) {
                (Some(handle), Some(io)) => io.effect_status(handle),
                _ => ForceStatus::Unknown,
            }
        })
    }

    pub fn destroy_force(&mut self, fid: ForceId) -> bool {
        let Some(record) = self.forces.remove(&fid) else { return false };
        if !record.orphaned {
            if let Some(io) = self.io.as_mut() {
                match record.effect {
                    // destruction of an active-capable rumble forces silence
                    None => {
                        io.submit_rumble(0.0, 0.0);
                    }
                    Some(handle) => {
                        io.stop_effect(handle);
                        io.destroy_effect(handle);
                    }
                }
            }
        }
        if self.rumble_force == Some(fid) {
            self.rumble_force = None;
        }
        true
    }

    pub fn destroy_all_forces(&mut self) -> Vec<ForceId> {
        let ids: Vec<ForceId> = self.forces.keys().copied().collect();
        for fid in &ids {
            self.destroy_force(*fid);
        }
        ids
    }

    /// Release everything backend-side before the device object is dropped.
    pub fn teardown(&mut self) {
        self.destroy_all_forces();
        self.io = None;
    }
}
