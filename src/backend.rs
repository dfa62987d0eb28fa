//! Backend provider interface.
//!
//! A backend adapts one platform input stack to the hub: it enumerates
//! hardware, opens live handles, produces timestamped readings, and executes
//! force primitives. The hub and the device pipelines never touch platform
//! APIs directly — everything flows through [`Backend`] and [`DeviceIo`].
//!
//! Backends translate native codes into portable [`Key`]/[`Button`] values
//! through their own fixed tables (codes without a portable counterpart are
//! dropped), but leave analog values raw: absolute-axis readings carry the
//! provider's integer values, and the pipeline normalizes them with the
//! ranges advertised in [`Capabilities`].

use std::fmt;

use crate::codes::{Button, DeviceKind, KeySet, NUM_BUTTONS};
use crate::error::IoFailure;
use crate::force::{ForceKind, ForceKindSet, ForceParams, ForceStatus};
use crate::metadata::DeviceMeta;
use crate::state::Timestamp;

/// Stable identity of a piece of hardware, used to pair a registered device
/// with its provider across reconnects and to deduplicate discovery.
///
/// Identity is tiered: providers report the strongest tier they can, and
/// equality is only meaningful within a tier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HardwareId {
    /// Driver-supplied unique id string (strongest tier).
    Unique(String),
    /// Physical location plus the device descriptor tuple.
    Physical {
        location: String,
        bus: u16,
        vendor: u16,
        product: u16,
        version: u16,
    },
    /// Ephemeral enumeration index (weakest tier; only stable while the
    /// device stays attached).
    Index(u32),
    /// Fixed-size opaque id blob compared byte-wise (vendor-runtime family).
    Opaque([u8; 32]),
}

impl fmt::Display for HardwareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwareId::Unique(uid) => write!(f, "uid:{uid}"),
            HardwareId::Physical { location, bus, vendor, product, version } => {
                write!(f, "phys:{location}/{bus:04x}:{vendor:04x}:{product:04x}:{version:04x}")
            }
            HardwareId::Index(x) => write!(f, "index:{x}"),
            HardwareId::Opaque(bytes) => {
                write!(f, "opaque:")?;
                for b in &bytes[..8] {
                    write!(f, "{b:02x}")?;
                }
                write!(f, "…")
            }
        }
    }
}

/// Absolute axes a gamepad provider can report. Thumbstick and hat axes feed
/// the pipeline's normalizers; trigger axes double as analog sources for the
/// shoulder/trigger buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AbsAxis {
    LeftX,
    LeftY,
    RightX,
    RightY,
    /// D-pad hat, positive towards the right.
    HatX,
    /// D-pad hat, positive towards the bottom (provider convention).
    HatY,
    TriggerL1,
    TriggerR1,
    TriggerL2,
    TriggerR2,
}

impl AbsAxis {
    /// The button an analog trigger axis drives, if any.
    pub(crate) fn trigger_button(self) -> Option<Button> {
        match self {
            AbsAxis::TriggerL1 => Some(Button::L1),
            AbsAxis::TriggerR1 => Some(Button::R1),
            AbsAxis::TriggerL2 => Some(Button::L2),
            AbsAxis::TriggerR2 => Some(Button::R2),
            _ => None,
        }
    }
}

/// Per-motor force capability: which kinds of force the motor can play.
#[derive(Clone, Debug, Default)]
pub struct MotorCaps {
    pub kinds: ForceKindSet,
}

/// Capabilities of an opened device, queried once per (re-)connection.
#[derive(Clone, Debug, Default)]
pub struct Capabilities {
    /// Number of addressable mouse buttons (0 = left, 1 = right, 2 = middle,
    /// then extras).
    pub mouse_buttons: u32,
    /// Upper limit of simultaneously reported keys, when the provider caps it.
    pub max_simultaneous_keys: u32,
    /// Number of thumbsticks a gamepad exposes.
    pub thumbsticks: u32,
    /// Raw integer ranges for the absolute axes the device reports. Axes
    /// absent here have no analog source; the pipeline falls back to digital
    /// events for the corresponding buttons.
    pub axis_ranges: Vec<(AbsAxis, i32, i32)>,
    /// Motors addressable for force feedback, in index order.
    pub motors: Vec<MotorCaps>,
    /// True when motor 0 is a synthetic slot for direct rumble submission
    /// (the provider does not model rumble as an effect object).
    pub synthetic_rumble: bool,
    /// Provider supports an input-synchronization/latency hint.
    pub supports_sync: bool,
    /// Provider supports a device-level gain control.
    pub supports_gain: bool,
    /// Provider supports autocenter control (disabled on connect).
    pub supports_autocenter: bool,
}

impl Capabilities {
    pub(crate) fn axis_range(&self, axis: AbsAxis) -> Option<(i32, i32)> {
        self.axis_ranges
            .iter()
            .find(|(a, _, _)| *a == axis)
            .map(|&(_, min, max)| (min, max))
    }
}

/// One timestamped reading group from a provider, oldest-first in the poll
/// stream.
#[derive(Clone, Debug)]
pub struct Reading {
    /// Microseconds on the provider clock (same clock as
    /// [`DeviceIo::now`]).
    pub timestamp: Timestamp,
    pub input: ReadingInput,
}

/// Kind-specific payload of one reading group.
#[derive(Clone, Debug)]
pub enum ReadingInput {
    Mouse(MouseReading),
    Keyboard(KeyboardReading),
    Gamepad(GamepadReading),
}

/// Mouse reading: monotonic cumulative counters plus the full button bitmap.
/// Providers with relative motion accumulate into the counters themselves;
/// the pipeline derives deltas against its own baseline.
#[derive(Clone, Copy, Debug, Default)]
pub struct MouseReading {
    pub x: i64,
    pub y: i64,
    pub scroll_x: i64,
    pub scroll_y: i64,
    /// Bit `i` set = button `i` currently held.
    pub buttons: u32,
}

/// Keyboard reading: the set of portable keys currently held.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyboardReading {
    pub keys: KeySet,
}

/// Gamepad reading: the ordered raw items of one reading group.
#[derive(Clone, Debug, Default)]
pub struct GamepadReading {
    pub items: Vec<GamepadItem>,
}

/// One raw gamepad input within a reading group.
#[derive(Clone, Copy, Debug)]
pub enum GamepadItem {
    /// Digital transition of a portable button.
    Button { button: Button, pressed: bool },
    /// Raw absolute-axis value; normalized by the pipeline.
    Axis { axis: AbsAxis, raw: i32 },
}

/// Element of the poll stream.
#[derive(Clone, Debug)]
pub enum PollEvent {
    Reading(Reading),
    /// The provider dropped events. The pipeline discards queued readings and
    /// resynchronizes from a whole-device [`StateSnapshot`] stamped with this
    /// timestamp.
    Overrun { timestamp: Timestamp },
}

/// Whole-device ground truth used to recover from a buffer overrun.
#[derive(Clone, Debug)]
pub enum StateSnapshot {
    Mouse {
        /// Current button bitmap; counters are left untouched by a resync.
        buttons: u32,
    },
    Keyboard {
        keys: KeySet,
    },
    Gamepad {
        /// Digital state per portable button.
        buttons: [bool; NUM_BUTTONS],
        /// Current raw values of the axes the device reports.
        axes: Vec<(AbsAxis, i32)>,
    },
}

/// Handle to a backend effect slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EffectHandle(pub u32);

/// Result of enumerating attached hardware.
#[derive(Clone, Debug)]
pub struct Discovered {
    pub hardware: HardwareId,
    pub kind: DeviceKind,
}

/// Platform adapter: hardware enumeration and handle acquisition.
pub trait Backend {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Enumerate currently attached, recognizable hardware. The hub
    /// deduplicates against devices it already knows.
    fn discover(&mut self) -> Result<Vec<Discovered>, crate::Error>;

    /// Obtain a live handle for previously discovered hardware. Fails when
    /// the hardware is currently absent; the device stays registered and the
    /// next update retries.
    fn open(&mut self, hardware: &HardwareId, kind: DeviceKind) -> Option<Box<dyn DeviceIo>>;
}

/// An open provider handle for one device.
///
/// All force operations return `false`/`None` on failure; the force manager
/// treats that as a capability mismatch or a lost handle, never as a fatal
/// error.
pub trait DeviceIo {
    /// Live connectivity of the underlying hardware.
    fn connected(&self) -> bool;

    /// Display name as reported by the driver; `None` when unavailable.
    fn display_name(&self) -> Option<String>;

    /// Capabilities queried at open time.
    fn capabilities(&self) -> &Capabilities;

    /// Metadata snapshot for UI/diagnostics.
    fn metadata(&self) -> DeviceMeta {
        DeviceMeta::default()
    }

    /// Current time on the reading clock, microseconds.
    fn now(&self) -> Timestamp;

    /// Hint the provider to flush coalesced input before polling (latency
    /// reduction). No-op when unsupported.
    fn flush_hint(&mut self) {}

    /// Drain readings newer than or equal to `since` into `out`, oldest
    /// first. Overruns appear in-stream as [`PollEvent::Overrun`].
    fn poll(&mut self, since: Timestamp, out: &mut Vec<PollEvent>) -> Result<(), IoFailure>;

    /// Whole-device ground-truth query for overrun recovery.
    fn snapshot(&mut self) -> Result<StateSnapshot, IoFailure>;

    // Force primitives.

    /// Directly command the rumble actuators (synthetic-rumble providers).
    fn submit_rumble(&mut self, _low: f32, _high: f32) -> bool {
        false
    }

    /// Allocate an effect slot for `kind` on `motor`.
    fn create_effect(&mut self, _motor: u32, _kind: ForceKind) -> Option<EffectHandle> {
        None
    }

    /// Upload parameters into an allocated effect slot.
    fn upload_effect(&mut self, _effect: EffectHandle, _kind: ForceKind, _params: &ForceParams) -> bool {
        false
    }

    /// Start playing an uploaded effect.
    fn play_effect(&mut self, _effect: EffectHandle, _kind: ForceKind) -> bool {
        false
    }

    /// Stop a playing effect.
    fn stop_effect(&mut self, _effect: EffectHandle) -> bool {
        false
    }

    /// Release an effect slot.
    fn destroy_effect(&mut self, _effect: EffectHandle) {}

    /// Push a motor gain in [0, 1] to the provider.
    fn set_motor_gain(&mut self, _motor: u32, _gain: f32) -> bool {
        false
    }

    /// Disable any autocenter behavior. Called once per connection.
    fn disable_autocenter(&mut self) {}

    /// Playback status of an effect, when the provider can introspect it.
    fn effect_status(&self, _effect: EffectHandle) -> ForceStatus {
        ForceStatus::Unknown
    }
}
