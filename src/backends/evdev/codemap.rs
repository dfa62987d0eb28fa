//! Fixed translation tables between kernel input codes and portable codes.
//!
//! Key codes translate through a 256-entry mapping (kernel keycodes above 255
//! have no portable counterpart here); gamepad buttons translate through the
//! contiguous `BTN_SOUTH..=BTN_THUMBR` and `BTN_DPAD_*` regions. Codes
//! without a portable counterpart are dropped. Reverse maps are derived from
//! the forward maps once, on first use.

use std::sync::OnceLock;

use super::sys::{self, ff_envelope, ff_effect, ff_effect_union};
use crate::backend::AbsAxis;
use crate::codes::{Button, Key, NUM_BUTTONS, NUM_KEYS};
use crate::force::{ConditionParams, ForceEnvelope, ForceKind, ForceParams, PeriodicParams, period_ms};

/// Kernel keycode -> portable key. Covers the 256-entry translation range.
pub fn key_from_code(code: u16) -> Option<Key> {
    Some(match code {
        1 => Key::Esc,
        2 => Key::NumRow1,
        3 => Key::NumRow2,
        4 => Key::NumRow3,
        5 => Key::NumRow4,
        6 => Key::NumRow5,
        7 => Key::NumRow6,
        8 => Key::NumRow7,
        9 => Key::NumRow8,
        10 => Key::NumRow9,
        11 => Key::NumRow0,
        12 => Key::Minus,
        13 => Key::Equal,
        14 => Key::Backspace,
        15 => Key::Tab,
        16 => Key::Q,
        17 => Key::W,
        18 => Key::E,
        19 => Key::R,
        20 => Key::T,
        21 => Key::Y,
        22 => Key::U,
        23 => Key::I,
        24 => Key::O,
        25 => Key::P,
        26 => Key::BraceL,
        27 => Key::BraceR,
        28 => Key::Enter,
        29 => Key::CtrlL,
        30 => Key::A,
        31 => Key::S,
        32 => Key::D,
        33 => Key::F,
        34 => Key::G,
        35 => Key::H,
        36 => Key::J,
        37 => Key::K,
        38 => Key::L,
        39 => Key::Semicolon,
        40 => Key::Apostrophe,
        41 => Key::Grave,
        42 => Key::ShiftL,
        43 => Key::Backslash,
        44 => Key::Z,
        45 => Key::X,
        46 => Key::C,
        47 => Key::V,
        48 => Key::B,
        49 => Key::N,
        50 => Key::M,
        51 => Key::Comma,
        52 => Key::Dot,
        53 => Key::Slash,
        54 => Key::ShiftR,
        55 => Key::NumpadMultiply,
        56 => Key::AltL,
        57 => Key::Space,
        58 => Key::CapsLock,
        59 => Key::F1,
        60 => Key::F2,
        61 => Key::F3,
        62 => Key::F4,
        63 => Key::F5,
        64 => Key::F6,
        65 => Key::F7,
        66 => Key::F8,
        67 => Key::F9,
        68 => Key::F10,
        69 => Key::NumLock,
        70 => Key::ScrollLock,
        71 => Key::Numpad7,
        72 => Key::Numpad8,
        73 => Key::Numpad9,
        74 => Key::NumpadMinus,
        75 => Key::Numpad4,
        76 => Key::Numpad5,
        77 => Key::Numpad6,
        78 => Key::NumpadPlus,
        79 => Key::Numpad1,
        80 => Key::Numpad2,
        81 => Key::Numpad3,
        82 => Key::Numpad0,
        83 => Key::NumpadDecimal,
        86 => Key::Key102,
        87 => Key::F11,
        88 => Key::F12,
        // KEY_KPENTER and the obsolete KEY_LINEFEED both fold into Enter
        96 => Key::Enter,
        97 => Key::CtrlR,
        98 => Key::NumpadSlash,
        100 => Key::AltR,
        101 => Key::Enter,
        102 => Key::Home,
        103 => Key::Up,
        104 => Key::PageUp,
        105 => Key::Left,
        106 => Key::Right,
        107 => Key::End,
        108 => Key::Down,
        109 => Key::PageDown,
        110 => Key::Insert,
        111 => Key::Delete,
        117 => Key::Enter,
        119 => Key::Pause,
        // KEY_KPCOMMA is the intl. variant of the numpad decimal
        121 => Key::NumpadDecimal,
        183 => Key::F13,
        184 => Key::F14,
        185 => Key::F15,
        186 => Key::F16,
        187 => Key::F17,
        188 => Key::F18,
        189 => Key::F19,
        190 => Key::F20,
        191 => Key::F21,
        192 => Key::F22,
        193 => Key::F23,
        194 => Key::F24,
        _ => return None,
    })
}

/// Portable key -> kernel keycode, derived by inverting the forward map.
/// Keys with several kernel sources keep the lowest code.
pub fn key_to_code(key: Key) -> u16 {
    static REVERSE: OnceLock<[u16; NUM_KEYS]> = OnceLock::new();
    REVERSE.get_or_init(|| {
        let mut table = [0u16; NUM_KEYS];
        for code in (0..=255u16).rev() {
            if let Some(key) = key_from_code(code) {
                table[key.index()] = code;
            }
        }
        table
    })[key.index()]
}

/// Kernel gamepad keycode -> portable button.
pub fn button_from_code(code: u16) -> Option<Button> {
    Some(match code {
        sys::BTN_SOUTH => Button::South,
        sys::BTN_EAST => Button::East,
        sys::BTN_NORTH => Button::North,
        sys::BTN_WEST => Button::West,
        sys::BTN_TL => Button::L1,
        sys::BTN_TR => Button::R1,
        sys::BTN_TL2 => Button::L2,
        sys::BTN_TR2 => Button::R2,
        sys::BTN_SELECT => Button::Select,
        sys::BTN_START => Button::Start,
        sys::BTN_THUMBL => Button::ThumbstickL,
        sys::BTN_THUMBR => Button::ThumbstickR,
        sys::BTN_DPAD_UP => Button::DpadUp,
        sys::BTN_DPAD_DOWN => Button::DpadDown,
        sys::BTN_DPAD_LEFT => Button::DpadLeft,
        sys::BTN_DPAD_RIGHT => Button::DpadRight,
        _ => None?,
    })
}

/// Portable button -> kernel keycode.
pub fn button_to_code(button: Button) -> u16 {
    static REVERSE: OnceLock<[u16; NUM_BUTTONS]> = OnceLock::new();
    REVERSE.get_or_init(|| {
        let mut table = [0u16; NUM_BUTTONS];
        for code in sys::BTN_SOUTH..=sys::BTN_THUMBR {
            if let Some(button) = button_from_code(code) {
                table[button.index()] = code;
            }
        }
        for code in sys::BTN_DPAD_UP..=sys::BTN_DPAD_RIGHT {
            if let Some(button) = button_from_code(code) {
                table[button.index()] = code;
            }
        }
        table
    })[button.index()]
}

/// Keycodes that identify mouse hardware during type deduction.
pub const MOUSE_RECOG: [u16; 8] = [
    sys::BTN_LEFT,
    sys::BTN_RIGHT,
    sys::BTN_MIDDLE,
    sys::BTN_SIDE,
    sys::BTN_EXTRA,
    sys::BTN_FORWARD,
    sys::BTN_BACK,
    sys::BTN_TASK,
];

/// Keycodes that are usually only found on digitizers, styluses, and touch
/// hardware; matching capabilities count against every supported type.
pub const AVOID_RECOG: [u16; 19] = [
    sys::BTN_DIGI,
    sys::BTN_TOOL_AIRBRUSH,
    sys::BTN_TOOL_BRUSH,
    sys::BTN_TOOL_FINGER,
    sys::BTN_TOOL_LENS,
    sys::BTN_TOOL_PEN,
    sys::BTN_TOOL_PENCIL,
    sys::BTN_TOOL_RUBBER,
    sys::BTN_STYLUS,
    sys::BTN_STYLUS2,
    sys::BTN_STYLUS3,
    sys::BTN_TOUCH,
    sys::BTN_TOOL_DOUBLETAP,
    sys::BTN_TOOL_TRIPLETAP,
    sys::BTN_TOOL_QUADTAP,
    sys::BTN_TOOL_QUINTTAP,
    sys::BTN_WHEEL,
    sys::BTN_GEAR_DOWN,
    sys::BTN_GEAR_UP,
];

/// Absolute-axis code for a portable axis. Triggers follow the HAT1/HAT2
/// convention (Y is left, X is right).
pub fn abs_code(axis: AbsAxis) -> u16 {
    match axis {
        AbsAxis::LeftX => sys::ABS_X,
        AbsAxis::LeftY => sys::ABS_Y,
        AbsAxis::RightX => sys::ABS_RX,
        AbsAxis::RightY => sys::ABS_RY,
        AbsAxis::HatX => sys::ABS_HAT0X,
        AbsAxis::HatY => sys::ABS_HAT0Y,
        AbsAxis::TriggerL1 => sys::ABS_HAT1Y,
        AbsAxis::TriggerR1 => sys::ABS_HAT1X,
        AbsAxis::TriggerL2 => sys::ABS_HAT2Y,
        AbsAxis::TriggerR2 => sys::ABS_HAT2X,
    }
}

/// Portable axis for an absolute-axis code.
pub fn axis_from_abs(code: u16) -> Option<AbsAxis> {
    Some(match code {
        sys::ABS_X => AbsAxis::LeftX,
        sys::ABS_Y => AbsAxis::LeftY,
        sys::ABS_RX => AbsAxis::RightX,
        sys::ABS_RY => AbsAxis::RightY,
        sys::ABS_HAT0X => AbsAxis::HatX,
        sys::ABS_HAT0Y => AbsAxis::HatY,
        sys::ABS_HAT1Y => AbsAxis::TriggerL1,
        sys::ABS_HAT1X => AbsAxis::TriggerR1,
        sys::ABS_HAT2Y => AbsAxis::TriggerL2,
        sys::ABS_HAT2X => AbsAxis::TriggerR2,
        _ => None?,
    })
}

/// Kernel effect type for a portable force kind.
pub fn ff_type(kind: ForceKind) -> u16 {
    match kind {
        ForceKind::Rumble => sys::FF_RUMBLE,
        ForceKind::Constant => sys::FF_CONSTANT,
        ForceKind::Ramp => sys::FF_RAMP,
        ForceKind::Sine | ForceKind::Triangle | ForceKind::Square | ForceKind::SawUp | ForceKind::SawDown => {
            sys::FF_PERIODIC
        }
        ForceKind::Spring => sys::FF_SPRING,
        ForceKind::Friction => sys::FF_FRICTION,
        ForceKind::Damper => sys::FF_DAMPER,
        ForceKind::Inertia => sys::FF_INERTIA,
    }
}

fn waveform(kind: ForceKind) -> u16 {
    match kind {
        ForceKind::Sine => sys::FF_SINE,
        ForceKind::Triangle => sys::FF_TRIANGLE,
        ForceKind::Square => sys::FF_SQUARE,
        ForceKind::SawUp => sys::FF_SAW_UP,
        ForceKind::SawDown => sys::FF_SAW_DOWN,
        _ => 0,
    }
}

/// Magnitudes map ±1.0 onto a mille scale clamped into the i16 wire range.
fn magnitude(value: f32) -> i16 {
    const LIMIT: f32 = i16::MAX as f32 / 1e3;
    (value.clamp(-LIMIT, LIMIT) * 1e3) as i16
}

/// Envelope translation: times rescale uniformly into the 32 s budget and
/// land on the wire in milliseconds; gains map onto the 0..0x7fff levels.
/// Returns the scaled sustain duration for the effect's replay length.
fn envelope(env: &ForceEnvelope) -> (ff_envelope, u16) {
    let m = env.time_scale();
    let wire = ff_envelope {
        attack_length: (env.attack_time.max(0.0) * m * 1e3) as u16,
        attack_level: (env.attack_gain.clamp(0.0, 1.0) * 0x7fff as f32) as u16,
        fade_length: (env.release_time.max(0.0) * m * 1e3) as u16,
        fade_level: (env.release_gain.clamp(0.0, 1.0) * 0x7fff as f32) as u16,
    };
    (wire, (env.sustain_time.max(0.0) * m * 1e3) as u16)
}

fn periodic(kind: ForceKind, params: &PeriodicParams) -> (ff_effect_union, u16) {
    let (env, duration) = envelope(&params.envelope);
    let periodic = sys::ff_periodic_effect {
        waveform: waveform(kind),
        period: period_ms(params.frequency),
        magnitude: magnitude(params.magnitude),
        offset: magnitude(params.offset),
        phase: (params.phase.clamp(0.0, 1.0) * 0xffff as f32) as u16,
        envelope: env,
        custom_len: 0,
        custom_data: std::ptr::null_mut(),
    };
    (ff_effect_union { periodic }, duration)
}

/// The kernel models every condition effect with two symmetric halves; the
/// portable single-sided parameters are duplicated into both.
fn condition(params: &ConditionParams) -> ff_effect_union {
    let half = sys::ff_condition_effect {
        right_saturation: magnitude(params.right_saturation).max(0) as u16,
        left_saturation: magnitude(params.left_saturation).max(0) as u16,
        right_coeff: (params.right_coefficient.clamp(-1.0, 1.0) * 0x7fff as f32) as i16,
        left_coeff: (params.left_coefficient.clamp(-1.0, 1.0) * 0x7fff as f32) as i16,
        deadband: (params.deadzone.clamp(0.0, 1.0) * 0xffff as f32) as u16,
        center: (params.center.clamp(-1.0, 1.0) * 0x7fff as f32) as i16,
    };
    ff_effect_union { condition: [half, half] }
}

/// Build the full kernel effect for an upload. The caller fills in the
/// allocated effect id.
pub fn translate_effect(kind: ForceKind, params: &ForceParams) -> ff_effect {
    let mut effect = ff_effect {
        type_: ff_type(kind),
        id: -1,
        replay: sys::ff_replay {
            length: (ForceEnvelope::MAX_TIME * 1e3) as u16,
            delay: 0,
        },
        ..Default::default()
    };

    match params {
        ForceParams::Rumble(p) => {
            effect.u = ff_effect_union {
                rumble: sys::ff_rumble_effect {
                    strong_magnitude: (p.low.clamp(0.0, 1.0) * 0xffff as f32) as u16,
                    weak_magnitude: (p.high.clamp(0.0, 1.0) * 0xffff as f32) as u16,
                },
            };
        }
        ForceParams::Constant(p) => {
            let (env, duration) = envelope(&p.envelope);
            effect.u = ff_effect_union {
                constant: sys::ff_constant_effect { level: magnitude(p.magnitude), envelope: env },
            };
            effect.replay.length = duration;
        }
        ForceParams::Ramp(p) => {
            let (env, duration) = envelope(&p.envelope);
            effect.u = ff_effect_union {
                ramp: sys::ff_ramp_effect {
                    start_level: magnitude(p.magnitude_start),
                    end_level: magnitude(p.magnitude_end),
                    envelope: env,
                },
            };
            effect.replay.length = duration;
        }
        ForceParams::Periodic(p) => {
            let (u, duration) = periodic(kind, p);
            effect.u = u;
            effect.replay.length = duration;
        }
        ForceParams::Condition(p) => {
            effect.u = condition(p);
        }
    }

    effect
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keycode_round_trip_over_the_table() {
        let mut mapped = 0;
        for code in 0..=255u16 {
            if let Some(key) = key_from_code(code) {
                mapped += 1;
                // a reverse lookup always lands on a code mapping back to
                // the same key (aliases like Enter collapse)
                assert_eq!(key_from_code(key_to_code(key)), Some(key));
            }
        }
        assert!(mapped >= NUM_KEYS, "every portable key has at least one source code");
    }

    #[test]
    fn every_button_round_trips() {
        for button in Button::all() {
            assert_eq!(button_from_code(button_to_code(button)), Some(button));
        }
    }

    #[test]
    fn magnitude_is_mille_scaled_and_clamped() {
        assert_eq!(magnitude(1.0), 1000);
        assert_eq!(magnitude(-1.0), -1000);
        // the clamp limit truncates just shy of i16::MAX
        assert!(magnitude(1e6) >= i16::MAX - 1);
    }

    #[test]
    fn condition_halves_are_symmetric() {
        let u = condition(&ConditionParams {
            right_coefficient: 0.5,
            left_coefficient: -0.5,
            deadzone: 0.25,
            ..Default::default()
        });
        let halves = unsafe { u.condition };
        assert_eq!(halves[0].right_coeff, halves[1].right_coeff);
        assert_eq!(halves[0].left_coeff, halves[1].left_coeff);
        assert_eq!(halves[0].deadband, halves[1].deadband);
    }
}
