//! Callback registry.
//!
//! Handlers are type-erased once, at registration: each callback is stored as
//! a kind-tagged boxed closure in `handlers`, and a keyed multimap `bindings`
//! fans events out to the callback ids interested in them. A dispatch key is
//! `(device, kind, has_filter, filter)` — device `0` is the global scope, and
//! the filter narrows to one key/button/index when present.
//!
//! Unregistration only removes the handler; the binding entry is purged
//! lazily the next time a dispatch walks over the dangling id. Invocation
//! order across fan-out buckets is device-then-global, filtered-then-
//! unfiltered; order within a bucket is unspecified.

use std::collections::HashMap;

use crate::event::{
    GamepadButtonEvent, KeyEvent, MouseButtonEvent, MouseMoveEvent, MouseScrollEvent, StatusEvent,
    ThumbstickEvent,
};
use crate::hub::Hub;
use crate::id::DeviceId;

/// Discriminates the seven callback kinds inside dispatch keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum KindTag {
    Status,
    MouseMove,
    MouseScroll,
    MouseButton,
    Key,
    GamepadButton,
    Thumbstick,
}

/// Lookup key of the binding multimap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct DispatchKey {
    /// Raw device id; 0 = global scope.
    pub device: u64,
    pub tag: KindTag,
    pub has_filter: bool,
    pub filter: u64,
}

impl DispatchKey {
    pub fn unfiltered(device: u64, tag: KindTag) -> Self {
        Self { device, tag, has_filter: false, filter: 0 }
    }

    pub fn filtered(device: u64, tag: KindTag, filter: u64) -> Self {
        Self { device, tag, has_filter: true, filter }
    }
}

/// Type-erased handler. The closure receives the hub so it can run read-only
/// queries (and force operations) from inside the callback; structural
/// mutation APIs reject calls while the reentrancy flag is armed.
pub(crate) enum Handler {
    Status(Box<dyn FnMut(&mut Hub, &StatusEvent)>),
    MouseMove(Box<dyn FnMut(&mut Hub, &MouseMoveEvent)>),
    MouseScroll(Box<dyn FnMut(&mut Hub, &MouseScrollEvent)>),
    MouseButton(Box<dyn FnMut(&mut Hub, &MouseButtonEvent)>),
    Key(Box<dyn FnMut(&mut Hub, &KeyEvent)>),
    GamepadButton(Box<dyn FnMut(&mut Hub, &GamepadButtonEvent)>),
    Thumbstick(Box<dyn FnMut(&mut Hub, &ThumbstickEvent)>),
}

impl Handler {
    /// Reconstruct the concrete call signature from the erased pair. A
    /// tag/payload mismatch cannot happen through the registration API and is
    /// ignored if it does.
    pub fn invoke(&mut self, hub: &mut Hub, data: &EventData) {
        match (self, data) {
            (Handler::Status(f), EventData::Status(ev)) => f(hub, ev),
            (Handler::MouseMove(f), EventData::MouseMove(ev)) => f(hub, ev),
            (Handler::MouseScroll(f), EventData::MouseScroll(ev)) => f(hub, ev),
            (Handler::MouseButton(f), EventData::MouseButton(ev)) => f(hub, ev),
            (Handler::Key(f), EventData::Key(ev)) => f(hub, ev),
            (Handler::GamepadButton(f), EventData::GamepadButton(ev)) => f(hub, ev),
            (Handler::Thumbstick(f), EventData::Thumbstick(ev)) => f(hub, ev),
            _ => {}
        }
    }
}

/// Uniform event envelope used by the fan-out path.
#[derive(Clone, Copy, Debug)]
pub(crate) enum EventData {
    Status(StatusEvent),
    MouseMove(MouseMoveEvent),
    MouseScroll(MouseScrollEvent),
    MouseButton(MouseButtonEvent),
    Key(KeyEvent),
    GamepadButton(GamepadButtonEvent),
    Thumbstick(ThumbstickEvent),
}

impl EventData {
    pub fn tag(&self) -> KindTag {
        match self {
            EventData::Status(_) => KindTag::Status,
            EventData::MouseMove(_) => KindTag::MouseMove,
            EventData::MouseScroll(_) => KindTag::MouseScroll,
            EventData::MouseButton(_) => KindTag::MouseButton,
            EventData::Key(_) => KindTag::Key,
            EventData::GamepadButton(_) => KindTag::GamepadButton,
            EventData::Thumbstick(_) => KindTag::Thumbstick,
        }
    }

    pub fn device(&self) -> DeviceId {
        match self {
            EventData::Status(ev) => ev.device,
            EventData::MouseMove(ev) => ev.device,
            EventData::MouseScroll(ev) => ev.device,
            EventData::MouseButton(ev) => ev.device,
            EventData::Key(ev) => ev.device,
            EventData::GamepadButton(ev) => ev.device,
            EventData::Thumbstick(ev) => ev.device,
        }
    }

    /// Filter value the event matches against, for the filterable kinds.
    pub fn filter_value(&self) -> Option<u64> {
        match self {
            EventData::Status(ev) => Some(ev.change as u64),
            EventData::MouseButton(ev) => Some(ev.index as u64),
            EventData::Key(ev) => Some(ev.key.index() as u64),
            EventData::GamepadButton(ev) => Some(ev.button.index() as u64),
            EventData::Thumbstick(ev) => Some(ev.index as u64),
            EventData::MouseMove(_) | EventData::MouseScroll(_) => None,
        }
    }
}

/// Handler storage plus the binding multimap.
#[derive(Default)]
pub(crate) struct Dispatcher {
    handlers: HashMap<u64, Handler>,
    bindings: HashMap<DispatchKey, Vec<u64>>,
}

impl Dispatcher {
    pub fn insert(&mut self, id: u64, key: DispatchKey, handler: Handler) {
        self.handlers.insert(id, handler);
        self.bindings.entry(key).or_default().push(id);
    }

    /// Remove a handler. Its binding entries are purged lazily by dispatch.
    pub fn remove(&mut self, id: u64) -> bool {
        self.handlers.remove(&id).is_some()
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
        self.bindings.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Callback ids bound to `key`, cloned so the caller can invoke handlers
    /// while the maps stay mutable.
    pub fn targets(&self, key: &DispatchKey) -> Option<Vec<u64>> {
        self.bindings.get(key).map(|ids| ids.clone())
    }

    /// Take a handler out for the duration of its invocation.
    pub fn take_handler(&mut self, id: u64) -> Option<Handler> {
        self.handlers.remove(&id)
    }

    pub fn put_back(&mut self, id: u64, handler: Handler) {
        self.handlers.insert(id, handler);
    }

    /// Drop a dangling id from a binding entry.
    pub fn purge(&mut self, key: &DispatchKey, id: u64) {
        if let Some(ids) = self.bindings.get_mut(key) {
            ids.retain(|&existing| existing != id);
            if ids.is_empty() {
                self.bindings.remove(key);
            }
        }
    }
}
