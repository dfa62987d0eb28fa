#![cfg(windows)]

//! Windows XInput backend.
//!
//! XInput is a slot-based polling runtime: up to four controllers live in
//! slots 0–3 and every `XInputGetState` call returns the complete current
//! reading plus a packet number that increments when anything changed. This
//! backend turns each packet into one reading group carrying the full button
//! and axis state; the packet number gate keeps idle polls from producing
//! readings.
//!
//! # Conventions
//! - Hardware identity is a fixed-size opaque blob synthesized from the slot
//!   index, compared byte-wise.
//! - XInput has no reading timestamps; readings are stamped from a monotonic
//!   microsecond clock owned by the handle, the same clock [`DeviceIo::now`]
//!   reports.
//! - Thumbstick Y is reported up-positive by XInput while the portable
//!   pipeline expects the provider convention of down-positive (it negates Y
//!   itself), so raw Y values are flipped here.
//! - Rumble does not exist as an effect object; the synthetic motor 0 takes
//!   direct `(low, high)` submissions via `XInputSetState`.

use std::time::Instant;

use windows_sys::Win32::UI::Input::XboxController::{
    XInputGetState, XInputSetState, XINPUT_GAMEPAD, XINPUT_GAMEPAD_A, XINPUT_GAMEPAD_B,
    XINPUT_GAMEPAD_BACK, XINPUT_GAMEPAD_DPAD_DOWN, XINPUT_GAMEPAD_DPAD_LEFT,
    XINPUT_GAMEPAD_DPAD_RIGHT, XINPUT_GAMEPAD_DPAD_UP, XINPUT_GAMEPAD_LEFT_SHOULDER,
    XINPUT_GAMEPAD_LEFT_THUMB, XINPUT_GAMEPAD_RIGHT_SHOULDER, XINPUT_GAMEPAD_RIGHT_THUMB,
    XINPUT_GAMEPAD_START, XINPUT_GAMEPAD_X, XINPUT_GAMEPAD_Y, XINPUT_STATE, XINPUT_VIBRATION,
};

use crate::backend::{
    AbsAxis, Backend, Capabilities, DeviceIo, Discovered, GamepadItem, GamepadReading, HardwareId,
    MotorCaps, PollEvent, Reading, ReadingInput, StateSnapshot,
};
use crate::codes::{Button, DeviceKind, NUM_BUTTONS};
use crate::error::{Error, IoFailure};
use crate::force::ForceKind;
use crate::metadata::DeviceMeta;
use crate::state::Timestamp;

const ERROR_SUCCESS: u32 = 0;
const MAX_SLOTS: u32 = 4;

/// Digital button bits in XINPUT_GAMEPAD::wButtons and their portable
/// counterparts. Cardinal names follow physical position: XInput Y sits
/// north, A south, X west, B east.
const BUTTON_MAP: [(u16, Button); 14] = [
    (XINPUT_GAMEPAD_Y, Button::North),
    (XINPUT_GAMEPAD_A, Button::South),
    (XINPUT_GAMEPAD_X, Button::West),
    (XINPUT_GAMEPAD_B, Button::East),
    (XINPUT_GAMEPAD_DPAD_UP, Button::DpadUp),
    (XINPUT_GAMEPAD_DPAD_DOWN, Button::DpadDown),
    (XINPUT_GAMEPAD_DPAD_LEFT, Button::DpadLeft),
    (XINPUT_GAMEPAD_DPAD_RIGHT, Button::DpadRight),
    (XINPUT_GAMEPAD_LEFT_SHOULDER, Button::L1),
    (XINPUT_GAMEPAD_RIGHT_SHOULDER, Button::R1),
    (XINPUT_GAMEPAD_LEFT_THUMB, Button::ThumbstickL),
    (XINPUT_GAMEPAD_RIGHT_THUMB, Button::ThumbstickR),
    (XINPUT_GAMEPAD_BACK, Button::Select),
    (XINPUT_GAMEPAD_START, Button::Start),
];

fn slot_id(slot: u32) -> HardwareId {
    let mut blob = [0u8; 32];
    blob[..12].copy_from_slice(b"xinput-slot:");
    blob[12] = slot as u8;
    HardwareId::Opaque(blob)
}

fn slot_of(hardware: &HardwareId) -> Option<u32> {
    match hardware {
        HardwareId::Opaque(blob) if blob[..12] == *b"xinput-slot:" => Some(blob[12] as u32),
        _ => None,
    }
}

fn get_state(slot: u32) -> Option<XINPUT_STATE> {
    let mut state: XINPUT_STATE = unsafe { std::mem::zeroed() };
    (unsafe { XInputGetState(slot, &mut state) } == ERROR_SUCCESS).then_some(state)
}

/// Flip a thumb Y into the down-positive provider convention. Widening to
/// i32 first keeps `-(-32768)` representable; the advertised range accounts
/// for it.
#[inline]
fn flip_y(value: i16) -> i32 {
    -(value as i32)
}

fn gamepad_items(gp: &XINPUT_GAMEPAD) -> Vec<GamepadItem> {
    let mut items = Vec::with_capacity(BUTTON_MAP.len() + 6);
    for (mask, button) in BUTTON_MAP {
        items.push(GamepadItem::Button { button, pressed: gp.wButtons & mask != 0 });
    }
    items.push(GamepadItem::Axis { axis: AbsAxis::TriggerL2, raw: gp.bLeftTrigger as i32 });
    items.push(GamepadItem::Axis { axis: AbsAxis::TriggerR2, raw: gp.bRightTrigger as i32 });
    items.push(GamepadItem::Axis { axis: AbsAxis::LeftX, raw: gp.sThumbLX as i32 });
    items.push(GamepadItem::Axis { axis: AbsAxis::LeftY, raw: flip_y(gp.sThumbLY) });
    items.push(GamepadItem::Axis { axis: AbsAxis::RightX, raw: gp.sThumbRX as i32 });
    items.push(GamepadItem::Axis { axis: AbsAxis::RightY, raw: flip_y(gp.sThumbRY) });
    items
}

fn capabilities() -> Capabilities {
    Capabilities {
        thumbsticks: 2,
        axis_ranges: vec![
            (AbsAxis::LeftX, i16::MIN as i32, i16::MAX as i32),
            (AbsAxis::LeftY, i16::MIN as i32, i16::MAX as i32 + 1),
            (AbsAxis::RightX, i16::MIN as i32, i16::MAX as i32),
            (AbsAxis::RightY, i16::MIN as i32, i16::MAX as i32 + 1),
            (AbsAxis::TriggerL2, 0, u8::MAX as i32),
            (AbsAxis::TriggerR2, 0, u8::MAX as i32),
        ],
        motors: vec![MotorCaps { kinds: [ForceKind::Rumble].into_iter().collect() }],
        synthetic_rumble: true,
        ..Default::default()
    }
}

/// Backend over the XInput slots.
#[derive(Default)]
pub struct XInputBackend {
    _priv: (),
}

impl XInputBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for XInputBackend {
    fn name(&self) -> &str {
        "xinput"
    }

    fn discover(&mut self) -> Result<Vec<Discovered>, Error> {
        let mut found = Vec::new();
        for slot in 0..MAX_SLOTS {
            if get_state(slot).is_some() {
                found.push(Discovered { hardware: slot_id(slot), kind: DeviceKind::Gamepad });
            }
        }
        Ok(found)
    }

    fn open(&mut self, hardware: &HardwareId, kind: DeviceKind) -> Option<Box<dyn DeviceIo>> {
        if kind != DeviceKind::Gamepad {
            return None;
        }
        let slot = slot_of(hardware).filter(|&slot| slot < MAX_SLOTS)?;
        get_state(slot)?;
        Some(Box::new(XInputIo {
            slot,
            caps: capabilities(),
            epoch: Instant::now(),
            last_packet: None,
        }))
    }
}

struct XInputIo {
    slot: u32,
    caps: Capabilities,
    /// Origin of the reading clock for this handle.
    epoch: Instant,
    last_packet: Option<u32>,
}

impl XInputIo {
    fn clock(&self) -> Timestamp {
        self.epoch.elapsed().as_micros() as Timestamp
    }
}

impl DeviceIo for XInputIo {
    fn connected(&self) -> bool {
        get_state(self.slot).is_some()
    }

    fn display_name(&self) -> Option<String> {
        Some(format!("XInput Controller {}", self.slot))
    }

    fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    fn metadata(&self) -> DeviceMeta {
        DeviceMeta {
            bus: Some("xinput".to_string()),
            product_string: self.display_name(),
            path: Some(format!("xinput:{}", self.slot)),
            ..Default::default()
        }
    }

    fn now(&self) -> Timestamp {
        self.clock()
    }

    fn poll(&mut self, since: Timestamp, out: &mut Vec<PollEvent>) -> Result<(), IoFailure> {
        let Some(state) = get_state(self.slot) else {
            return Err(IoFailure::Transient);
        };
        if self.last_packet == Some(state.dwPacketNumber) {
            return Ok(());
        }
        self.last_packet = Some(state.dwPacketNumber);

        let timestamp = self.clock();
        if timestamp < since {
            return Ok(());
        }
        out.push(PollEvent::Reading(Reading {
            timestamp,
            input: ReadingInput::Gamepad(GamepadReading { items: gamepad_items(&state.Gamepad) }),
        }));
        Ok(())
    }

    fn snapshot(&mut self) -> Result<StateSnapshot, IoFailure> {
        let Some(state) = get_state(self.slot) else {
            return Err(IoFailure::Transient);
        };
        let gp = &state.Gamepad;

        let mut buttons = [false; NUM_BUTTONS];
        for (mask, button) in BUTTON_MAP {
            buttons[button.index()] = gp.wButtons & mask != 0;
        }
        let axes = vec![
            (AbsAxis::TriggerL2, gp.bLeftTrigger as i32),
            (AbsAxis::TriggerR2, gp.bRightTrigger as i32),
            (AbsAxis::LeftX, gp.sThumbLX as i32),
            (AbsAxis::LeftY, flip_y(gp.sThumbLY)),
            (AbsAxis::RightX, gp.sThumbRX as i32),
            (AbsAxis::RightY, flip_y(gp.sThumbRY)),
        ];
        Ok(StateSnapshot::Gamepad { buttons, axes })
    }

    fn submit_rumble(&mut self, low: f32, high: f32) -> bool {
        let mut vibration = XINPUT_VIBRATION {
            wLeftMotorSpeed: (low.clamp(0.0, 1.0) * u16::MAX as f32) as u16,
            wRightMotorSpeed: (high.clamp(0.0, 1.0) * u16::MAX as f32) as u16,
        };
        unsafe { XInputSetState(self.slot, &mut vibration) } == ERROR_SUCCESS
    }
}
