//! The hub: ownership root and public façade.
//!
//! A [`Hub`] owns one backend, the device registry, the callback dispatcher,
//! the aggregate back-references, and the id allocator. All structural
//! mutation — discovery, updates, destruction, aggregation, callback
//! (un)registration — goes through it, which is also where the reentrancy
//! guard lives: while an event handler runs, those entry points fail fast
//! with [`Error::ReentrantMutation`] instead of corrupting the structures the
//! dispatch is iterating.
//!
//! The hub is deliberately single-threaded; it is not `Send` and none of its
//! state is internally synchronized. Drive it from one thread and fan
//! results out yourself if needed.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::{debug, info};

use crate::backend::{Backend, HardwareId};
use crate::codes::{Button, DeviceKind, Key};
use crate::device::aggregate::AggregateDevice;
use crate::device::native::NativeDevice;
use crate::device::{Device, Inner};
use crate::dispatch::{DispatchKey, Dispatcher, EventData, Handler, KindTag};
use crate::error::Error;
use crate::event::{
    DeviceStatusChange, GamepadButtonEvent, KeyEvent, MouseButtonEvent, MouseMoveEvent,
    MouseScrollEvent, StatusEvent, ThumbstickEvent,
};
use crate::force::{Force, ForceKind, ForceParams, ForceStatus};
use crate::id::{CallbackId, DeviceId, ForceId, IdAllocator};

/// RAII guard for the reentrancy flag: armed on handler entry, cleared
/// unconditionally on exit, including unwinds.
struct CallbackScope(Rc<Cell<bool>>);

impl CallbackScope {
    fn arm(flag: &Rc<Cell<bool>>) -> Self {
        flag.set(true);
        CallbackScope(Rc::clone(flag))
    }
}

impl Drop for CallbackScope {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Central registry and entry point. See the module docs.
pub struct Hub {
    pub(crate) backend: Box<dyn Backend>,
    devices: HashMap<u64, Device>,
    /// Hardware identities with a live registry entry; discovery dedups
    /// against this set.
    known_hardware: HashSet<HardwareId>,
    pub(crate) dispatcher: Dispatcher,
    /// device id -> aggregates it is a member of. Lookup relation, not
    /// ownership.
    member_of: HashMap<u64, Vec<u64>>,
    force_owner: HashMap<ForceId, u64>,
    ids: IdAllocator,
    in_callback: Rc<Cell<bool>>,
}

impl Hub {
    /// Create a hub over an explicit backend. Useful with the virtual
    /// backend for tests and scripted input.
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            devices: HashMap::new(),
            known_hardware: HashSet::new(),
            dispatcher: Dispatcher::default(),
            member_of: HashMap::new(),
            force_owner: HashMap::new(),
            ids: IdAllocator::new(),
            in_callback: Rc::new(Cell::new(false)),
        }
    }

    /// Create a hub over the platform backend.
    #[cfg(target_os = "linux")]
    pub fn native() -> Self {
        Self::new(crate::backends::evdev::EvdevBackend::new())
    }

    /// Create a hub over the platform backend.
    #[cfg(windows)]
    pub fn native() -> Self {
        Self::new(crate::backends::xinput::XInputBackend::new())
    }

    fn guard(&self) -> Result<(), Error> {
        if self.in_callback.get() {
            Err(Error::ReentrantMutation)
        } else {
            Ok(())
        }
    }

    // ---- discovery & updates ----

    /// Search for hardware that has no registry entry yet. New devices start
    /// out disconnected until their first update. Returns the number of
    /// devices created.
    pub fn discover(&mut self) -> Result<usize, Error> {
        self.guard()?;

        let found = self.backend.discover()?;
        let mut created = 0;
        for entry in found {
            if self.known_hardware.contains(&entry.hardware) {
                continue;
            }
            let id = DeviceId(self.ids.reserve());
            info!("discovered {:?} {} as device {id}", entry.kind, entry.hardware);
            let native = NativeDevice::new(entry.kind, entry.hardware.clone());
            self.known_hardware.insert(entry.hardware);
            self.devices.insert(id.0, Device::native(id, entry.kind, native));
            self.emit(EventData::Status(StatusEvent { device: id, change: DeviceStatusChange::Discovered }));
            created += 1;
        }
        Ok(created)
    }

    /// Update every registered device. Devices that are members of an
    /// aggregate are skipped here, because their aggregates update them.
    pub fn update_all(&mut self) -> Result<(), Error> {
        self.guard()?;

        let ids: Vec<u64> = self.devices.keys().copied().collect();
        for id in ids {
            let is_member = self.member_of.get(&id).is_some_and(|aggs| !aggs.is_empty());
            if !is_member {
                self.update_one(DeviceId(id));
            }
        }
        Ok(())
    }

    /// Update a single device (and, for aggregates, its members).
    pub fn update_device(&mut self, id: DeviceId) -> Result<(), Error> {
        self.guard()?;
        self.update_one(id);
        Ok(())
    }

    /// Detach the device from the registry for the duration of its update so
    /// handlers running against `self` never observe it half-folded.
    pub(crate) fn update_one(&mut self, id: DeviceId) {
        let Some(mut device) = self.devices.remove(&id.0) else { return };
        device.update(self);
        self.devices.insert(id.0, device);
    }

    // ---- registry access ----

    /// Number of registered devices, optionally counting only connected ones.
    pub fn device_count(&self, ignore_disconnected: bool) -> usize {
        if ignore_disconnected {
            self.devices.values().filter(|d| d.connected()).count()
        } else {
            self.devices.len()
        }
    }

    /// All registered devices, aggregates included. Order is unspecified.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn mice(&self) -> impl Iterator<Item = &Device> {
        self.devices.values().filter(|d| d.kind() == DeviceKind::Mouse)
    }

    pub fn keyboards(&self) -> impl Iterator<Item = &Device> {
        self.devices.values().filter(|d| d.kind() == DeviceKind::Keyboard)
    }

    pub fn gamepads(&self) -> impl Iterator<Item = &Device> {
        self.devices.values().filter(|d| d.kind() == DeviceKind::Gamepad)
    }

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        if id.0 == 0 {
            return None;
        }
        self.devices.get(&id.0)
    }

    /// Mutable device access, for threshold configuration.
    pub fn device_mut(&mut self, id: DeviceId) -> Option<&mut Device> {
        if id.0 == 0 {
            return None;
        }
        self.devices.get_mut(&id.0)
    }

    // ---- destruction ----

    /// Remove a device and delete everything that depends on it: its forces,
    /// its attached callbacks, and transitively every aggregate it is a
    /// member of. Does nothing for unknown ids.
    pub fn destroy_device(&mut self, id: DeviceId) -> Result<(), Error> {
        self.guard()?;

        if id.0 == 0 || !self.devices.contains_key(&id.0) {
            return Ok(());
        }

        if !self.member_of.get(&id.0).is_some_and(|aggs| !aggs.is_empty()) {
            self.finalize_destroy(id.0);
            return Ok(());
        }

        // gather the closure of aggregates transitively depending on the
        // target
        let mut targets = vec![id.0];
        let mut seen: HashSet<u64> = targets.iter().copied().collect();
        let mut stack = vec![id.0];
        while let Some(current) = stack.pop() {
            if let Some(aggs) = self.member_of.get(&current) {
                for &agg in aggs {
                    if seen.insert(agg) {
                        targets.push(agg);
                        stack.push(agg);
                    }
                }
            }
        }

        self.destroy_hierarchy(targets)
    }

    /// Remove every device, aggregates first where required.
    pub fn destroy_all(&mut self) -> Result<(), Error> {
        self.guard()?;

        if self.devices.is_empty() {
            return Ok(());
        }
        let targets: Vec<u64> = self.devices.keys().copied().collect();
        let result = self.destroy_hierarchy(targets);
        self.member_of.clear();
        result
    }

    /// Destroy in dependency order: ids that are not members of any live
    /// aggregate go first, freeing their dependents for the next pass. A pass
    /// that makes no progress means a cycle.
    fn destroy_hierarchy(&mut self, mut targets: Vec<u64>) -> Result<(), Error> {
        while !targets.is_empty() {
            let before = targets.len();
            let mut remaining = Vec::with_capacity(before);
            for id in targets {
                if self.member_of.get(&id).is_some_and(|aggs| !aggs.is_empty()) {
                    remaining.push(id);
                } else {
                    self.finalize_destroy(id);
                }
            }
            if remaining.len() == before {
                return Err(Error::CyclicAggregation);
            }
            targets = remaining;
        }
        Ok(())
    }

    fn finalize_destroy(&mut self, raw: u64) {
        if !self.devices.contains_key(&raw) {
            return;
        }

        self.emit(EventData::Status(StatusEvent {
            device: DeviceId(raw),
            change: DeviceStatusChange::Destroyed,
        }));

        let Some(mut device) = self.devices.remove(&raw) else { return };
        for cb in device.attached_callbacks.drain(..) {
            self.dispatcher.remove(cb);
        }

        match device.inner {
            Inner::Native(mut native) => {
                let fids: Vec<ForceId> = native.forces.keys().copied().collect();
                for fid in fids {
                    self.force_owner.remove(&fid);
                }
                native.teardown();
                self.known_hardware.remove(&native.hardware);
            }
            Inner::Aggregate(agg) => {
                for member in agg.members {
                    if let Some(aggs) = self.member_of.get_mut(&member.0) {
                        aggs.retain(|&a| a != raw);
                        if aggs.is_empty() {
                            self.member_of.remove(&member.0);
                        }
                    }
                }
            }
        }
        debug!("destroyed device {raw}");
    }

    // ---- aggregation ----

    /// Compose member devices of one kind into a single logical device.
    ///
    /// Returns the existing aggregate when the exact same member multiset was
    /// aggregated before, and the member itself when only one id is given.
    /// `hint` forces the aggregate's kind; mismatches fail. Duplicate member
    /// ids are not rejected but produce an aggregate that double-counts the
    /// member — undefined input, as is any circular membership.
    pub fn aggregate(&mut self, members: &[DeviceId], hint: Option<DeviceKind>) -> Result<DeviceId, Error> {
        self.guard()?;

        if members.is_empty() {
            return Err(Error::InvalidAggregation);
        }

        if members.len() == 1 {
            let device = self.device(members[0]).ok_or(Error::InvalidAggregation)?;
            return if hint.map_or(true, |h| h == device.kind()) {
                Ok(members[0])
            } else {
                Err(Error::InvalidAggregation)
            };
        }

        // memoization: an aggregate containing every requested member is a
        // candidate; it matches when its member multiset is exactly the
        // request
        let mut candidates: Option<HashSet<u64>> = None;
        for member in members {
            let containing: HashSet<u64> = self
                .member_of
                .get(&member.0)
                .map(|v| v.iter().copied().collect())
                .unwrap_or_default();
            candidates = Some(match candidates {
                None => containing,
                Some(previous) => previous.intersection(&containing).copied().collect(),
            });
            if candidates.as_ref().is_some_and(|c| c.is_empty()) {
                break;
            }
        }
        if let Some(candidates) = candidates {
            let mut requested: Vec<u64> = members.iter().map(|m| m.0).collect();
            requested.sort_unstable();
            for candidate in candidates {
                if let Some(existing) = self.devices.get(&candidate) {
                    let mut have: Vec<u64> = existing.members().iter().map(|m| m.0).collect();
                    have.sort_unstable();
                    if have == requested {
                        return Ok(DeviceId(candidate));
                    }
                }
            }
        }

        // all members must exist and share one kind
        let mut kind = hint;
        for member in members {
            let device = self.device(*member).ok_or(Error::InvalidAggregation)?;
            match kind {
                None => kind = Some(device.kind()),
                Some(k) if k != device.kind() => return Err(Error::InvalidAggregation),
                _ => {}
            }
        }
        let kind = kind.expect("members is non-empty");

        let id = DeviceId(self.ids.reserve());
        let aggregate = AggregateDevice::new(kind, members.to_vec());
        for member in members {
            self.member_of.entry(member.0).or_default().push(id.0);
        }
        self.devices.insert(id.0, Device::aggregate(id, kind, aggregate));
        debug!("aggregated {} members into device {id}", members.len());
        Ok(id)
    }

    // ---- callbacks ----

    fn register(
        &mut self,
        scope: Option<DeviceId>,
        tag: KindTag,
        filter: Option<u64>,
        handler: Handler,
    ) -> Result<CallbackId, Error> {
        self.guard()?;

        let device_raw = match scope {
            Some(id) => {
                if !self.devices.contains_key(&id.0) {
                    return Err(Error::UnknownDevice);
                }
                id.0
            }
            None => 0,
        };

        let cb = self.ids.reserve();
        let key = match filter {
            Some(f) => DispatchKey::filtered(device_raw, tag, f),
            None => DispatchKey::unfiltered(device_raw, tag),
        };
        self.dispatcher.insert(cb, key, handler);
        if device_raw != 0 {
            self.devices
                .get_mut(&device_raw)
                .expect("checked above")
                .attached_callbacks
                .push(cb);
        }
        Ok(CallbackId(cb))
    }

    /// Observe device lifecycle changes. `scope` of `None` means any device;
    /// `filter` narrows to one [`DeviceStatusChange`].
    pub fn on_status(
        &mut self,
        scope: Option<DeviceId>,
        filter: Option<DeviceStatusChange>,
        f: impl FnMut(&mut Hub, &StatusEvent) + 'static,
    ) -> Result<CallbackId, Error> {
        self.register(scope, KindTag::Status, filter.map(|c| c as u64), Handler::Status(Box::new(f)))
    }

    /// Observe mouse movement.
    pub fn on_mouse_move(
        &mut self,
        scope: Option<DeviceId>,
        f: impl FnMut(&mut Hub, &MouseMoveEvent) + 'static,
    ) -> Result<CallbackId, Error> {
        self.register(scope, KindTag::MouseMove, None, Handler::MouseMove(Box::new(f)))
    }

    /// Observe mouse scrolling.
    pub fn on_mouse_scroll(
        &mut self,
        scope: Option<DeviceId>,
        f: impl FnMut(&mut Hub, &MouseScrollEvent) + 'static,
    ) -> Result<CallbackId, Error> {
        self.register(scope, KindTag::MouseScroll, None, Handler::MouseScroll(Box::new(f)))
    }

    /// Observe mouse button changes, optionally of one button index.
    pub fn on_mouse_button(
        &mut self,
        scope: Option<DeviceId>,
        filter: Option<u32>,
        f: impl FnMut(&mut Hub, &MouseButtonEvent) + 'static,
    ) -> Result<CallbackId, Error> {
        self.register(scope, KindTag::MouseButton, filter.map(u64::from), Handler::MouseButton(Box::new(f)))
    }

    /// Observe key changes, optionally of one key.
    pub fn on_key(
        &mut self,
        scope: Option<DeviceId>,
        filter: Option<Key>,
        f: impl FnMut(&mut Hub, &KeyEvent) + 'static,
    ) -> Result<CallbackId, Error> {
        self.register(scope, KindTag::Key, filter.map(|k| k.index() as u64), Handler::Key(Box::new(f)))
    }

    /// Observe gamepad button/trigger changes, optionally of one button.
    pub fn on_gamepad_button(
        &mut self,
        scope: Option<DeviceId>,
        filter: Option<Button>,
        f: impl FnMut(&mut Hub, &GamepadButtonEvent) + 'static,
    ) -> Result<CallbackId, Error> {
        self.register(
            scope,
            KindTag::GamepadButton,
            filter.map(|b| b.index() as u64),
            Handler::GamepadButton(Box::new(f)),
        )
    }

    /// Observe thumbstick movement, optionally of one stick index.
    pub fn on_thumbstick(
        &mut self,
        scope: Option<DeviceId>,
        filter: Option<u32>,
        f: impl FnMut(&mut Hub, &ThumbstickEvent) + 'static,
    ) -> Result<CallbackId, Error> {
        self.register(scope, KindTag::Thumbstick, filter.map(u64::from), Handler::Thumbstick(Box::new(f)))
    }

    /// Unregister one callback of any kind. Unknown ids are ignored.
    pub fn unregister(&mut self, callback: CallbackId) -> Result<(), Error> {
        self.guard()?;
        self.dispatcher.remove(callback.0);
        Ok(())
    }

    /// Unregister every callback, global and device-scoped.
    pub fn unregister_all(&mut self) -> Result<(), Error> {
        self.guard()?;
        self.dispatcher.clear();
        Ok(())
    }

    /// Fan an event out: device+filter, device, global+filter, global. Within
    /// a bucket the order is unspecified; dangling bindings are purged as
    /// they are encountered.
    pub(crate) fn emit(&mut self, data: EventData) {
        if self.dispatcher.is_empty() {
            return;
        }

        let tag = data.tag();
        let device = data.device().0;
        let filter = data.filter_value();

        if let Some(filter) = filter {
            self.run_bucket(DispatchKey::filtered(device, tag, filter), &data);
        }
        self.run_bucket(DispatchKey::unfiltered(device, tag), &data);
        if let Some(filter) = filter {
            self.run_bucket(DispatchKey::filtered(0, tag, filter), &data);
        }
        self.run_bucket(DispatchKey::unfiltered(0, tag), &data);
    }

    fn run_bucket(&mut self, key: DispatchKey, data: &EventData) {
        let Some(ids) = self.dispatcher.targets(&key) else { return };
        for cb in ids {
            match self.dispatcher.take_handler(cb) {
                Some(mut handler) => {
                    let scope = CallbackScope::arm(&self.in_callback);
                    handler.invoke(self, data);
                    drop(scope);
                    self.dispatcher.put_back(cb, handler);
                }
                // the callback was unregistered; drop the stale binding
                None => self.dispatcher.purge(&key, cb),
            }
        }
    }

    // ---- forces ----

    /// Resolve an (device, motor) pair through aggregates down to the owning
    /// native device.
    fn resolve_motor(&self, device: DeviceId, motor: u32) -> Option<(u64, u32)> {
        let mut current = device.0;
        let mut motor = motor;
        loop {
            let device = self.devices.get(&current)?;
            match &device.inner {
                Inner::Native(_) => return Some((current, motor)),
                Inner::Aggregate(agg) => {
                    if !agg.connected {
                        return None;
                    }
                    let &(member, member_motor) = agg.motor_map.get(motor as usize)?;
                    current = member.0;
                    motor = member_motor;
                }
            }
        }
    }

    /// Number of force motors; 0 while disconnected. Aggregates report the
    /// concatenated total across members.
    pub fn motor_count(&self, device: DeviceId) -> u32 {
        match self.devices.get(&device.0).map(|d| &d.inner) {
            Some(Inner::Native(native)) => native.motor_count(),
            Some(Inner::Aggregate(agg)) => {
                if agg.connected {
                    agg.motor_map.len() as u32
                } else {
                    0
                }
            }
            None => 0,
        }
    }

    /// Gain in [0, 1] applied to forces on a motor; 0 while disconnected or
    /// for invalid motors. Reset to 1 on every (re-)connect.
    pub fn gain(&self, device: DeviceId, motor: u32) -> f32 {
        let Some((owner, motor)) = self.resolve_motor(device, motor) else { return 0.0 };
        match &self.devices[&owner].inner {
            Inner::Native(native) => native.gain(motor),
            Inner::Aggregate(_) => 0.0,
        }
    }

    /// Set a motor gain, clamped to [0, 1]. On a device whose rumble motor is
    /// synthetic, changing motor 0 recommits an active rumble immediately.
    pub fn set_gain(&mut self, device: DeviceId, motor: u32, gain: f32) {
        let Some((owner, motor)) = self.resolve_motor(device, motor) else { return };
        if let Some(Inner::Native(native)) = self.devices.get_mut(&owner).map(|d| &mut d.inner) {
            native.set_gain(motor, gain);
        }
    }

    /// Whether a motor supports a force kind. Always false while
    /// disconnected.
    pub fn supports_force(&self, device: DeviceId, motor: u32, kind: ForceKind) -> bool {
        let Some((owner, motor)) = self.resolve_motor(device, motor) else { return false };
        match &self.devices[&owner].inner {
            Inner::Native(native) => native.supports_force(motor, kind),
            Inner::Aggregate(_) => false,
        }
    }

    /// Create a force of `kind` on a motor. Through an aggregate, the motor
    /// index resolves to the owning member; the returned force reports the
    /// member as its device. Fails with [`Error::CapabilityMismatch`] when
    /// the motor cannot play the kind, the device is disconnected, or a
    /// rumble force already exists on the device.
    pub fn create_force(&mut self, device: DeviceId, motor: u32, kind: ForceKind) -> Result<ForceId, Error> {
        if !self.devices.contains_key(&device.0) {
            return Err(Error::UnknownDevice);
        }
        let (owner, owner_motor) = self.resolve_motor(device, motor).ok_or(Error::CapabilityMismatch)?;

        let fid = ForceId(self.ids.reserve());
        {
            let entry = self.devices.get_mut(&owner).ok_or(Error::UnknownDevice)?;
            let Inner::Native(native) = &mut entry.inner else {
                return Err(Error::CapabilityMismatch);
            };
            native.create_force(fid, owner_motor, kind)?;
        }
        self.force_owner.insert(fid, owner);

        if owner != device.0 {
            if let Some(Inner::Aggregate(agg)) = self.devices.get_mut(&device.0).map(|d| &mut d.inner) {
                agg.created_forces.push(fid);
            }
        }
        Ok(fid)
    }

    fn native_of_force(&self, fid: ForceId) -> Option<(&NativeDevice, u64)> {
        let owner = *self.force_owner.get(&fid)?;
        match &self.devices.get(&owner)?.inner {
            Inner::Native(native) => Some((native, owner)),
            Inner::Aggregate(_) => None,
        }
    }

    fn native_of_force_mut(&mut self, fid: ForceId) -> Option<&mut NativeDevice> {
        let owner = *self.force_owner.get(&fid)?;
        match &mut self.devices.get_mut(&owner)?.inner {
            Inner::Native(native) => Some(native),
            Inner::Aggregate(_) => None,
        }
    }

    /// Look up a force by id. Works for orphaned forces until they are
    /// destroyed.
    pub fn force(&self, fid: ForceId) -> Option<Force<'_>> {
        let (native, owner) = self.native_of_force(fid)?;
        let status = native.force_status(fid)?;
        let record = native.forces.get(&fid)?;
        Some(Force { record, owner: DeviceId(owner), status })
    }

    /// Current playback status; [`ForceStatus::Inactive`] once orphaned.
    pub fn force_status(&self, fid: ForceId) -> ForceStatus {
        self.native_of_force(fid)
            .and_then(|(native, _)| native.force_status(fid))
            .unwrap_or(ForceStatus::Unknown)
    }

    /// Mutable access to a force's parameters. Call
    /// [`write_force_params`](Self::write_force_params) (or restart the
    /// force) to push changes to the hardware.
    pub fn force_params_mut(&mut self, fid: ForceId) -> Option<&mut ForceParams> {
        let native = self.native_of_force_mut(fid)?;
        native.forces.get_mut(&fid).map(|record| &mut record.params)
    }

    /// Start applying a force, implicitly uploading its current parameters.
    /// Returns false for orphaned forces and upload failures.
    pub fn start_force(&mut self, fid: ForceId) -> bool {
        self.native_of_force_mut(fid).map(|n| n.start_force(fid)).unwrap_or(false)
    }

    /// Stop applying a force. Returns false for orphaned forces.
    pub fn stop_force(&mut self, fid: ForceId) -> bool {
        self.native_of_force_mut(fid).map(|n| n.stop_force(fid)).unwrap_or(false)
    }

    /// Upload the current parameters. Fails when the parameter variant no
    /// longer matches the force's kind, or the force is orphaned.
    pub fn write_force_params(&mut self, fid: ForceId) -> bool {
        self.native_of_force_mut(fid).map(|n| n.write_force_params(fid)).unwrap_or(false)
    }

    /// Destroy a force, stopping it and freeing its backend slot. Orphaned
    /// forces can always be destroyed. Unknown ids are ignored.
    pub fn destroy_force(&mut self, fid: ForceId) {
        if let Some(native) = self.native_of_force_mut(fid) {
            native.destroy_force(fid);
        }
        self.force_owner.remove(&fid);
    }

    /// Destroy all forces of a device. For aggregates this reaches exactly
    /// the forces created through the aggregate.
    pub fn destroy_device_forces(&mut self, device: DeviceId) {
        let fids: Vec<ForceId> = match self.devices.get_mut(&device.0).map(|d| &mut d.inner) {
            Some(Inner::Native(native)) => native.forces.keys().copied().collect(),
            Some(Inner::Aggregate(agg)) => std::mem::take(&mut agg.created_forces),
            None => return,
        };
        for fid in fids {
            self.destroy_force(fid);
        }
    }
}
