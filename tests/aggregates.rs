//! Aggregate devices: identity, merge semantics, motor concatenation, and
//! the destruction cascade.

mod common;

use common::{button_item, gamepad_reading, Rig};
use inputhub::backend::{AbsAxis, GamepadItem, KeyboardReading, MouseReading, ReadingInput};
use inputhub::{Button, DeviceId, DeviceKind, Error, ForceKind, Key, KeySet};

fn two_gamepad_rig() -> (Rig, inputhub::backends::virtual_input::VirtualDevice, inputhub::backends::virtual_input::VirtualDevice, DeviceId, DeviceId) {
    let mut rig = Rig::new();
    let pad_a = rig.backend.add_gamepad("Pad A");
    let pad_b = rig.backend.add_gamepad("Pad B");
    rig.start();
    let a = rig.hub.gamepads().find(|d| d.display_name() == "Pad A").unwrap().id();
    let b = rig.hub.gamepads().find(|d| d.display_name() == "Pad B").unwrap().id();
    (rig, pad_a, pad_b, a, b)
}

/// Aggregating a single member returns the member itself.
#[test]
fn single_member_aggregation_returns_member() {
    let (mut rig, _pa, _pb, a, _b) = two_gamepad_rig();

    assert_eq!(rig.hub.aggregate(&[a], None).unwrap(), a);
    assert!(matches!(
        rig.hub.aggregate(&[a], Some(DeviceKind::Mouse)),
        Err(Error::InvalidAggregation)
    ));
}

/// The same member multiset aggregates to the same object; a different
/// multiset gets a fresh aggregate.
#[test]
fn aggregation_is_memoized_per_member_multiset() {
    let mut rig = Rig::new();
    rig.backend.add_gamepad("Pad A");
    rig.backend.add_gamepad("Pad B");
    rig.backend.add_gamepad("Pad C");
    rig.start();
    let ids: Vec<DeviceId> = {
        let mut named: Vec<_> = rig.hub.gamepads().map(|d| (d.display_name(), d.id())).collect();
        named.sort();
        named.into_iter().map(|(_, id)| id).collect()
    };
    let (a, b, c) = (ids[0], ids[1], ids[2]);

    let ab = rig.hub.aggregate(&[a, b], None).unwrap();
    assert_eq!(rig.hub.aggregate(&[a, b], None).unwrap(), ab);

    let abc = rig.hub.aggregate(&[a, b, c], None).unwrap();
    assert_ne!(abc, ab);
    // the superset aggregate must not satisfy the pair request
    assert_eq!(rig.hub.aggregate(&[a, b], None).unwrap(), ab);
}

/// Members of different kinds refuse to aggregate.
#[test]
fn mixed_kinds_refuse_to_aggregate() {
    let mut rig = Rig::new();
    rig.backend.add_gamepad("Pad");
    rig.backend.add_mouse("Mouse");
    rig.start();
    let pad = rig.device_of_kind(DeviceKind::Gamepad);
    let mouse = rig.device_of_kind(DeviceKind::Mouse);

    assert!(matches!(rig.hub.aggregate(&[pad, mouse], None), Err(Error::InvalidAggregation)));
}

/// An aggregate is connected iff all members were connected at the last
/// update.
#[test]
fn aggregate_connectivity_requires_all_members() {
    let (mut rig, _pa, pad_b, a, b) = two_gamepad_rig();

    let agg = rig.hub.aggregate(&[a, b], None).unwrap();
    rig.hub.update_all().unwrap();
    assert!(rig.hub.device(agg).unwrap().connected());
    assert!(rig.hub.device(agg).unwrap().is_aggregate());

    pad_b.set_present(false);
    rig.hub.update_all().unwrap();
    assert!(!rig.hub.device(agg).unwrap().connected());
    assert_eq!(rig.hub.device(agg).unwrap().display_name(), "");

    pad_b.set_present(true);
    rig.hub.update_all().unwrap();
    assert!(rig.hub.device(agg).unwrap().connected());
}

/// Per-button values merge as the maximum across members.
#[test]
fn button_values_merge_as_max() {
    let (mut rig, pad_a, pad_b, a, b) = two_gamepad_rig();
    let agg = rig.hub.aggregate(&[a, b], None).unwrap();

    pad_a.push_reading(1_000, gamepad_reading(vec![button_item(Button::South, true)]));
    pad_b.push_reading(1_000, gamepad_reading(vec![button_item(Button::Start, true)]));
    rig.hub.update_all().unwrap();

    let device = rig.hub.device(agg).unwrap();
    assert_eq!(device.button_value(Button::South), 1.0);
    assert_eq!(device.button_value(Button::Start), 1.0);
    assert!(device.button_state(Button::South));

    // releasing on one member releases the merged value too
    pad_a.push_reading(2_000, gamepad_reading(vec![button_item(Button::South, false)]));
    rig.hub.update_all().unwrap();
    assert_eq!(rig.hub.device(agg).unwrap().button_value(Button::South), 0.0);
}

/// The keyboard merge keeps the pressed counter consistent: one key held on
/// several members counts once.
#[test]
fn keyboard_aggregate_counts_merged_keys_once() {
    let mut rig = Rig::new();
    let kb_a = rig.backend.add_keyboard("KB A");
    let kb_b = rig.backend.add_keyboard("KB B");
    rig.start();
    let a = rig.hub.keyboards().find(|d| d.display_name() == "KB A").unwrap().id();
    let b = rig.hub.keyboards().find(|d| d.display_name() == "KB B").unwrap().id();
    let agg = rig.hub.aggregate(&[a, b], None).unwrap();

    let set = |keys: &[Key]| ReadingInput::Keyboard(KeyboardReading { keys: keys.iter().copied().collect::<KeySet>() });
    kb_a.push_reading(1_000, set(&[Key::A]));
    kb_b.push_reading(1_000, set(&[Key::A, Key::B]));
    rig.hub.update_all().unwrap();

    let device = rig.hub.device(agg).unwrap();
    assert_eq!(device.num_keys_pressed(), 2);
    assert!(device.key_state(Key::A));
    assert!(device.key_state(Key::B));
}

/// Mouse aggregates sum member contributions against per-member baselines.
#[test]
fn mouse_aggregate_sums_member_deltas() {
    let mut rig = Rig::new();
    let mouse_a = rig.backend.add_mouse("Mouse A");
    let mouse_b = rig.backend.add_mouse("Mouse B");
    rig.start();
    let a = rig.hub.mice().find(|d| d.display_name() == "Mouse A").unwrap().id();
    let b = rig.hub.mice().find(|d| d.display_name() == "Mouse B").unwrap().id();
    let agg = rig.hub.aggregate(&[a, b], None).unwrap();

    // establish member baselines (first reading contributes nothing)
    mouse_a.push_reading(1_000, ReadingInput::Mouse(MouseReading { x: 10, y: 0, ..Default::default() }));
    mouse_b.push_reading(1_000, ReadingInput::Mouse(MouseReading { x: 0, y: 5, ..Default::default() }));
    rig.hub.update_all().unwrap();

    mouse_a.push_reading(2_000, ReadingInput::Mouse(MouseReading { x: 30, y: 0, ..Default::default() }));
    mouse_b.push_reading(2_000, ReadingInput::Mouse(MouseReading { x: 0, y: 12, ..Default::default() }));
    rig.hub.update_all().unwrap();

    let device = rig.hub.device(agg).unwrap();
    assert_eq!(device.delta(), (20, 7));
    assert_eq!(device.position(), (20, 7));
}

/// Thumbsticks concatenate in member order instead of merging.
#[test]
fn thumbsticks_concatenate_in_member_order() {
    let (mut rig, _pa, pad_b, a, b) = two_gamepad_rig();
    let agg = rig.hub.aggregate(&[a, b], None).unwrap();
    rig.hub.update_all().unwrap();

    assert_eq!(rig.hub.device(agg).unwrap().thumbstick_count(), 4);

    pad_b.push_reading(
        1_000,
        gamepad_reading(vec![GamepadItem::Axis { axis: AbsAxis::LeftX, raw: 32767 }]),
    );
    rig.hub.update_all().unwrap();

    let device = rig.hub.device(agg).unwrap();
    assert_eq!(device.thumbstick(0), (0.0, 0.0), "pad A's stick is untouched");
    assert_eq!(device.thumbstick(2), (1.0, 0.0), "pad B's first stick sits after pad A's two");
}

/// Aggregate motors are the concatenation of member motors; forces created
/// through the aggregate belong to the resolved member.
#[test]
fn aggregate_motors_resolve_to_members() {
    let (mut rig, _pa, pad_b, a, b) = two_gamepad_rig();
    let agg = rig.hub.aggregate(&[a, b], None).unwrap();
    rig.hub.update_all().unwrap();

    assert_eq!(rig.hub.motor_count(agg), 2);
    assert!(rig.hub.supports_force(agg, 1, ForceKind::Rumble));

    let force = rig.hub.create_force(agg, 1, ForceKind::Rumble).unwrap();
    assert_eq!(rig.hub.force(force).unwrap().device(), Some(b));
    assert_eq!(rig.hub.force(force).unwrap().motor_index(), 0);

    // starting through the hub reaches pad B's actuators
    assert!(rig.hub.start_force(force));
    assert_eq!(pad_b.rumble_log().len(), 1);

    // destroying all aggregate-created forces reaches exactly that force
    rig.hub.destroy_device_forces(agg);
    assert!(rig.hub.force(force).is_none());
}

/// Destroying any member cascades to every aggregate transitively depending
/// on it, leaves first.
#[test]
fn destroying_a_member_cascades() {
    let (mut rig, _pa, _pb, a, b) = two_gamepad_rig();
    let agg = rig.hub.aggregate(&[a, b], None).unwrap();
    let super_agg = rig.hub.aggregate(&[agg, a], None).unwrap();
    assert_eq!(rig.hub.device_count(false), 4);

    rig.hub.destroy_device(a).unwrap();

    assert!(rig.hub.device(a).is_none());
    assert!(rig.hub.device(agg).is_none());
    assert!(rig.hub.device(super_agg).is_none());
    assert!(rig.hub.device(b).is_some(), "unrelated members survive");

    // pad B is updatable afterwards
    rig.hub.update_all().unwrap();
}

/// `update_all` skips aggregate members (their aggregates update them), so a
/// reading is folded exactly once per update.
#[test]
fn members_update_exactly_once_per_pass() {
    let (mut rig, pad_a, _pb, a, b) = two_gamepad_rig();
    let _agg = rig.hub.aggregate(&[a, b], None).unwrap();

    let events = std::rc::Rc::new(std::cell::Cell::new(0u32));
    let counter = events.clone();
    rig.hub
        .on_gamepad_button(Some(a), Some(Button::South), move |_, _| counter.set(counter.get() + 1))
        .unwrap();

    pad_a.push_reading(1_000, gamepad_reading(vec![button_item(Button::South, true)]));
    rig.hub.update_all().unwrap();
    assert_eq!(events.get(), 1);
}
