//! Device pipeline behavior over the virtual backend: discovery, reading
//! folding, overrun recovery, and the disconnect contract.

mod common;

use common::{button_item, gamepad_reading, gamepad_rig, Rig};
use inputhub::backend::{AbsAxis, GamepadItem, KeyboardReading, MouseReading, ReadingInput, StateSnapshot};
use inputhub::{Button, DeviceKind, Key, KeySet, NUM_BUTTONS};

/// Running discovery twice without hardware changes creates zero additional
/// devices.
#[test]
fn rediscovery_is_idempotent() {
    let mut rig = Rig::new();
    rig.backend.add_mouse("Mouse 0");
    rig.backend.add_keyboard("Keyboard 0");

    assert_eq!(rig.hub.discover().unwrap(), 2);
    assert_eq!(rig.hub.discover().unwrap(), 0);
    assert_eq!(rig.hub.device_count(false), 2);
}

/// A destroyed device's hardware becomes discoverable again, under a fresh
/// id.
#[test]
fn destroyed_devices_can_be_rediscovered() {
    let mut rig = Rig::new();
    rig.backend.add_mouse("Mouse 0");
    rig.start();

    let first = rig.device_of_kind(DeviceKind::Mouse);
    rig.hub.destroy_device(first).unwrap();
    assert_eq!(rig.hub.device_count(false), 0);

    assert_eq!(rig.hub.discover().unwrap(), 1);
    let second = rig.device_of_kind(DeviceKind::Mouse);
    assert_ne!(first, second, "ids are never reused");
}

/// Devices appear disconnected after discovery; the first update connects.
#[test]
fn devices_connect_on_first_update() {
    let mut rig = Rig::new();
    rig.backend.add_gamepad("Pad");
    rig.hub.discover().unwrap();

    let id = rig.device_of_kind(DeviceKind::Gamepad);
    assert!(!rig.hub.device(id).unwrap().connected());

    rig.hub.update_all().unwrap();
    assert!(rig.hub.device(id).unwrap().connected());
    assert_eq!(rig.hub.device(id).unwrap().display_name(), "Pad");
}

/// Mouse counters fold into per-update deltas against the offset baseline:
/// the first reading contributes zero, later readings contribute their
/// counter movement, and an empty update zeroes the delta while keeping the
/// position.
#[test]
fn mouse_delta_accumulation() {
    let mut rig = Rig::new();
    let mouse = rig.backend.add_mouse("Mouse 0");
    rig.start();
    let id = rig.device_of_kind(DeviceKind::Mouse);

    // baseline reading
    mouse.push_reading(
        1_000,
        ReadingInput::Mouse(MouseReading { x: 100, y: 0, ..Default::default() }),
    );
    rig.hub.update_all().unwrap();
    assert_eq!(rig.hub.device(id).unwrap().delta(), (0, 0));

    mouse.push_reading(
        2_000,
        ReadingInput::Mouse(MouseReading { x: 100, y: 50, ..Default::default() }),
    );
    mouse.push_reading(
        3_000,
        ReadingInput::Mouse(MouseReading { x: 140, y: 50, ..Default::default() }),
    );
    rig.hub.update_all().unwrap();

    let device = rig.hub.device(id).unwrap();
    assert_eq!(device.delta(), (40, 50));
    assert_eq!(device.position(), (40, 50));

    // an update with no readings: delta resets, position holds
    rig.hub.update_all().unwrap();
    let device = rig.hub.device(id).unwrap();
    assert_eq!(device.delta(), (0, 0));
    assert_eq!(device.position(), (40, 50));
}

/// Mouse button bitmaps drive the state cells through the ordinary modify
/// path.
#[test]
fn mouse_buttons_follow_the_bitmap() {
    let mut rig = Rig::new();
    let mouse = rig.backend.add_mouse("Mouse 0");
    rig.start();
    let id = rig.device_of_kind(DeviceKind::Mouse);

    mouse.push_reading(
        1_000,
        ReadingInput::Mouse(MouseReading { buttons: 0b101, ..Default::default() }),
    );
    rig.hub.update_all().unwrap();

    let device = rig.hub.device(id).unwrap();
    assert!(device.mouse_button_state(0));
    assert!(!device.mouse_button_state(1));
    assert!(device.mouse_button_state(2));
    assert_eq!(device.mouse_button_value(0), 1.0);
}

/// The pressed counter tracks digital transitions across reading groups.
#[test]
fn keyboard_pressed_counter() {
    let mut rig = Rig::new();
    let keyboard = rig.backend.add_keyboard("Keyboard 0");
    rig.start();
    let id = rig.device_of_kind(DeviceKind::Keyboard);

    let set = |keys: &[Key]| KeyboardReading { keys: keys.iter().copied().collect::<KeySet>() };
    keyboard.push_reading(1_000, ReadingInput::Keyboard(set(&[Key::A])));
    keyboard.push_reading(1_100, ReadingInput::Keyboard(set(&[Key::A, Key::B])));
    keyboard.push_reading(1_200, ReadingInput::Keyboard(set(&[Key::B])));
    rig.backend.set_now(1_200);
    rig.hub.update_all().unwrap();

    let device = rig.hub.device(id).unwrap();
    assert_eq!(device.num_keys_pressed(), 1);
    assert!(!device.key_state(Key::A));
    assert!(device.key_state(Key::B));

    let (_, time_a) = device.key_state_timed(Key::A);
    assert_eq!(time_a, 0.0, "key A transitioned at the update's newest timestamp");
}

/// Provider raw `-32768` on a full-range Y axis normalizes to -1 and lands as
/// +1 after the up-positive negation.
#[test]
fn thumbstick_y_negation() {
    let (mut rig, pad, id) = gamepad_rig();

    pad.push_reading(
        1_000,
        gamepad_reading(vec![GamepadItem::Axis { axis: AbsAxis::LeftY, raw: -32768 }]),
    );
    rig.hub.update_all().unwrap();

    assert_eq!(rig.hub.device(id).unwrap().thumbstick(0), (0.0, 1.0));
}

/// Both axes of one stick arriving in the same reading group land together;
/// a later group with only one axis preserves the other.
#[test]
fn thumbstick_axes_stage_per_group() {
    let (mut rig, pad, id) = gamepad_rig();

    pad.push_reading(
        1_000,
        gamepad_reading(vec![
            GamepadItem::Axis { axis: AbsAxis::LeftX, raw: 32767 },
            GamepadItem::Axis { axis: AbsAxis::LeftY, raw: 32767 },
        ]),
    );
    rig.hub.update_all().unwrap();
    assert_eq!(rig.hub.device(id).unwrap().thumbstick(0), (1.0, -1.0));

    pad.push_reading(
        2_000,
        gamepad_reading(vec![GamepadItem::Axis { axis: AbsAxis::LeftX, raw: 0 }]),
    );
    rig.hub.update_all().unwrap();
    assert_eq!(rig.hub.device(id).unwrap().thumbstick(0), (0.0, -1.0));
}

/// Analog triggers normalize through their advertised range, and the analog
/// presence suppresses duplicate digital updates of the same button.
#[test]
fn analog_trigger_suppresses_digital_duplicates() {
    let (mut rig, pad, id) = gamepad_rig();

    pad.push_reading(
        1_000,
        gamepad_reading(vec![GamepadItem::Axis { axis: AbsAxis::TriggerL2, raw: 255 }]),
    );
    rig.hub.update_all().unwrap();
    assert_eq!(rig.hub.device(id).unwrap().button_value(Button::L2), 1.0);

    // a digital release for the same physical input must be dropped
    pad.push_reading(2_000, gamepad_reading(vec![button_item(Button::L2, false)]));
    rig.hub.update_all().unwrap();
    assert_eq!(rig.hub.device(id).unwrap().button_value(Button::L2), 1.0);
}

/// Readings queued before an overrun sentinel are discarded; the button state
/// afterwards reflects exactly the whole-device ground truth plus the
/// post-overrun readings.
#[test]
fn overrun_recovery_discards_stale_readings() {
    let (mut rig, pad, id) = gamepad_rig();

    let east_events = std::rc::Rc::new(std::cell::Cell::new(0u32));
    let counter = east_events.clone();
    rig.hub
        .on_gamepad_button(None, Some(Button::East), move |_, _| counter.set(counter.get() + 1))
        .unwrap();

    // three pre-overrun presses that the provider then drops
    pad.push_reading(1_000, gamepad_reading(vec![button_item(Button::South, true)]));
    pad.push_reading(2_000, gamepad_reading(vec![button_item(Button::East, true)]));
    pad.push_reading(3_000, gamepad_reading(vec![button_item(Button::West, true)]));
    pad.push_overrun(4_000);

    // ground truth at the overrun: only South is held
    let mut buttons = [false; NUM_BUTTONS];
    buttons[Button::South.index()] = true;
    pad.set_snapshot(StateSnapshot::Gamepad { buttons, axes: Vec::new() });

    // post-overrun release
    pad.push_reading(5_000, gamepad_reading(vec![button_item(Button::South, false)]));
    rig.hub.update_all().unwrap();

    let device = rig.hub.device(id).unwrap();
    assert!(!device.button_state(Button::South));
    assert!(!device.button_state(Button::East));
    assert!(!device.button_state(Button::West));
    assert_eq!(device.button_value(Button::East), 0.0);
    assert_eq!(east_events.get(), 0, "discarded readings must not fire events");
}

/// The disconnect contract: all session state reads as zero, thresholds
/// survive, and a reconnect restores the device.
#[test]
fn disconnect_zeroes_state_but_keeps_thresholds() {
    let (mut rig, pad, id) = gamepad_rig();

    rig.hub.device_mut(id).unwrap().set_button_threshold(Button::South, 0.5);
    pad.push_reading(
        1_000,
        gamepad_reading(vec![
            button_item(Button::South, true),
            GamepadItem::Axis { axis: AbsAxis::LeftX, raw: 32767 },
        ]),
    );
    rig.hub.update_all().unwrap();
    assert!(rig.hub.device(id).unwrap().button_state(Button::South));

    pad.set_present(false);
    rig.hub.update_all().unwrap();

    let device = rig.hub.device(id).unwrap();
    assert!(!device.connected());
    assert_eq!(device.display_name(), "");
    assert_eq!(device.button_value(Button::South), 0.0);
    let (state, time) = device.button_state_timed(Button::South);
    assert!(!state);
    assert_eq!(time, f32::INFINITY);
    assert_eq!(device.thumbstick_count(), 0);
    assert_eq!(rig.hub.motor_count(id), 0);
    assert_eq!(rig.hub.gain(id, 0), 0.0);
    assert_eq!(device.button_threshold(Button::South), 0.5, "user configuration persists");

    pad.set_present(true);
    rig.hub.update_all().unwrap();
    let device = rig.hub.device(id).unwrap();
    assert!(device.connected());
    assert_eq!(rig.hub.gain(id, 0), 1.0, "gains reset to 1 on reconnect");
}

/// A threshold profile applies the global value first, then the per-input
/// overrides, and the result round-trips through the accessors clamped.
#[test]
fn threshold_profiles_apply_and_round_trip() {
    let (mut rig, _pad, id) = gamepad_rig();

    let profile = inputhub::ThresholdProfile {
        name: "heavy triggers".to_string(),
        global: Some(0.1),
        buttons: [(Button::L2, 0.6), (Button::R2, 2.0)].into_iter().collect(),
        ..Default::default()
    };
    profile.apply(rig.hub.device_mut(id).unwrap());

    let device = rig.hub.device(id).unwrap();
    assert_eq!(device.button_threshold(Button::South), 0.1);
    assert_eq!(device.button_threshold(Button::L2), 0.6);
    assert_eq!(device.button_threshold(Button::R2), 1.0, "thresholds clamp to [0, 1]");
}

/// Invalid indices follow the documented out-of-domain policy.
#[test]
fn invalid_accessors_return_defaults() {
    let (mut rig, _pad, id) = gamepad_rig();
    rig.hub.update_all().unwrap();

    let device = rig.hub.device(id).unwrap();
    assert_eq!(device.thumbstick(99), (0.0, 0.0));
    assert_eq!(device.mouse_button_value(0), 0.0, "wrong-kind queries read zero");
    assert_eq!(device.key_value(Key::A), 0.0);
    let (state, time) = device.mouse_button_state_timed(0);
    assert!(!state);
    assert_eq!(time, f32::INFINITY);
}
