//! inputhub — unified input device hub.
//!
//! Presents mice, keyboards, and gamepads through one polling interface,
//! independent of the underlying OS input stack. Raw platform events are
//! normalized into a stable, queryable state model — cumulative positions and
//! deltas, key/button values and hysteresis-derived digital states with
//! transition timestamps, thumbstick vectors — with optional change
//! callbacks, force feedback, and composition of several devices into one
//! logical device.
//!
//! # Quick start
//! ```no_run
//! use inputhub::{Hub, Key};
//!
//! let mut hub = Hub::native();
//! hub.discover().unwrap();
//! loop {
//!     hub.update_all().unwrap();
//!     for keyboard in hub.keyboards() {
//!         if keyboard.key_state(Key::Esc) {
//!             return;
//!         }
//!     }
//! }
//! ```
//!
//! # Model
//! - [`Hub`] owns everything: discovery, the device registry, updates,
//!   callbacks, forces, and aggregation.
//! - [`Device`] is the uniform querying surface; its id stays valid across
//!   disconnects and reconnects of the underlying hardware.
//! - Updating is explicit and single-threaded: nothing changes between two
//!   [`Hub::update_all`] calls.
//!
//! # Platform backends
//! Linux reads `/dev/input/event*` (the user needs access to the event
//! nodes); Windows polls the XInput slots. The scriptable
//! [`backends::virtual_input`] backend runs everywhere.

pub mod backend;
pub mod backends;
mod codes;
mod device;
mod dispatch;
mod error;
mod event;
mod force;
mod hub;
mod id;
mod metadata;
mod profile;
mod state;

pub use codes::{Button, DeviceKind, Key, KeySet, NUM_BUTTONS, NUM_KEYS};
pub use device::Device;
pub use error::{Error, IoFailure};
pub use event::{
    DeviceStatusChange, GamepadButtonEvent, KeyEvent, MouseButtonEvent, MouseMoveEvent,
    MouseScrollEvent, StatusEvent, ThumbstickEvent,
};
pub use force::{
    ConditionParams, ConstantParams, Force, ForceEnvelope, ForceKind, ForceKindSet, ForceParams,
    ForceStatus, PeriodicParams, RampParams, RumbleParams, NUM_FORCE_KINDS,
};
pub use hub::Hub;
pub use id::{CallbackId, DeviceId, ForceId};
pub use metadata::DeviceMeta;
pub use profile::ThresholdProfile;
pub use state::{MouseData, Timestamp};
