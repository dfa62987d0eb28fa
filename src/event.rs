//! Event payloads delivered to registered callbacks.
//!
//! Every payload carries the id of the source device rather than a reference:
//! events fire while the source device is mid-update, so the values in the
//! payload are the authoritative snapshot for the handler. Values may be
//! intermediates — a button that is pressed and released between two updates
//! produces two events even though the final polled state is unchanged.

use crate::codes::{Button, Key};
use crate::id::DeviceId;

/// A change in a device's lifecycle status. Filterable at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceStatusChange {
    /// Device has been discovered and registered with the hub.
    Discovered,
    /// Device (re-)connected to the underlying hardware/driver.
    Connected,
    /// Device disconnected, either physically or due to an error.
    Disconnected,
    /// Device is about to be removed from the hub; its id becomes invalid.
    Destroyed,
}

/// Payload for device status callbacks.
#[derive(Clone, Copy, Debug)]
pub struct StatusEvent {
    pub device: DeviceId,
    pub change: DeviceStatusChange,
}

/// Payload for mouse movement callbacks. Positions are cumulative provider
/// counts; deltas are the increments of this reading group, which may be finer
/// than the per-update delta.
#[derive(Clone, Copy, Debug)]
pub struct MouseMoveEvent {
    pub device: DeviceId,
    pub x: i64,
    pub y: i64,
    pub dx: i64,
    pub dy: i64,
}

/// Payload for mouse scroll callbacks.
#[derive(Clone, Copy, Debug)]
pub struct MouseScrollEvent {
    pub device: DeviceId,
    pub x: i64,
    pub y: i64,
    pub dx: i64,
    pub dy: i64,
}

/// Payload for mouse button callbacks. Fires when the analog value or the
/// digital state of the button changes.
#[derive(Clone, Copy, Debug)]
pub struct MouseButtonEvent {
    pub device: DeviceId,
    pub index: u32,
    pub value: f32,
    pub state: bool,
}

/// Payload for keyboard key callbacks.
#[derive(Clone, Copy, Debug)]
pub struct KeyEvent {
    pub device: DeviceId,
    pub key: Key,
    pub value: f32,
    pub state: bool,
}

/// Payload for gamepad button/trigger callbacks.
#[derive(Clone, Copy, Debug)]
pub struct GamepadButtonEvent {
    pub device: DeviceId,
    pub button: Button,
    pub value: f32,
    pub state: bool,
}

/// Payload for thumbstick callbacks. Axes are in [-1, +1], Y positive up.
#[derive(Clone, Copy, Debug)]
pub struct ThumbstickEvent {
    pub device: DeviceId,
    pub index: u32,
    pub x: f32,
    pub y: f32,
}
