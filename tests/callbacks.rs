//! Event dispatch: fan-out order, filters, unregistration, and the
//! reentrancy guard.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{button_item, gamepad_reading, gamepad_rig, Rig};
use inputhub::{Button, DeviceKind, DeviceStatusChange, Error};

/// Fan-out order is device+filter, device, global+filter, global.
#[test]
fn dispatch_order_is_device_then_global_filtered_first() {
    let (mut rig, pad, id) = gamepad_rig();

    let order: Rc<RefCell<Vec<&'static str>>> = Rc::default();
    let log = |tag: &'static str| {
        let order = order.clone();
        move |_: &mut inputhub::Hub, _: &inputhub::GamepadButtonEvent| {
            order.borrow_mut().push(tag);
        }
    };

    // registered deliberately out of dispatch order
    rig.hub.on_gamepad_button(None, None, log("global")).unwrap();
    rig.hub.on_gamepad_button(Some(id), None, log("device")).unwrap();
    rig.hub.on_gamepad_button(None, Some(Button::South), log("global+filter")).unwrap();
    rig.hub.on_gamepad_button(Some(id), Some(Button::South), log("device+filter")).unwrap();

    pad.push_reading(1_000, gamepad_reading(vec![button_item(Button::South, true)]));
    rig.hub.update_all().unwrap();

    assert_eq!(*order.borrow(), vec!["device+filter", "device", "global+filter", "global"]);
}

/// A filter narrows delivery to one input.
#[test]
fn filtered_callbacks_ignore_other_inputs() {
    let (mut rig, pad, _id) = gamepad_rig();

    let hits = Rc::new(RefCell::new(0u32));
    let counter = hits.clone();
    rig.hub
        .on_gamepad_button(None, Some(Button::Start), move |_, _| *counter.borrow_mut() += 1)
        .unwrap();

    pad.push_reading(1_000, gamepad_reading(vec![button_item(Button::South, true)]));
    pad.push_reading(2_000, gamepad_reading(vec![button_item(Button::Start, true)]));
    rig.hub.update_all().unwrap();

    assert_eq!(*hits.borrow(), 1);
}

/// Status callbacks filter on the change kind.
#[test]
fn status_filter_narrows_to_one_change() {
    let mut rig = Rig::new();
    let pad = rig.backend.add_gamepad("Pad");

    let disconnects = Rc::new(RefCell::new(0u32));
    let counter = disconnects.clone();
    rig.hub
        .on_status(None, Some(DeviceStatusChange::Disconnected), move |_, _| {
            *counter.borrow_mut() += 1
        })
        .unwrap();

    rig.start(); // discovered + connected, neither matches the filter
    assert_eq!(*disconnects.borrow(), 0);

    pad.set_present(false);
    rig.hub.update_all().unwrap();
    assert_eq!(*disconnects.borrow(), 1);
}

/// Unregistered callbacks stop firing even though their binding is purged
/// lazily.
#[test]
fn unregistered_callbacks_do_not_fire() {
    let (mut rig, pad, _id) = gamepad_rig();

    let hits = Rc::new(RefCell::new(0u32));
    let counter = hits.clone();
    let cb = rig
        .hub
        .on_gamepad_button(None, None, move |_, _| *counter.borrow_mut() += 1)
        .unwrap();

    pad.push_reading(1_000, gamepad_reading(vec![button_item(Button::South, true)]));
    rig.hub.update_all().unwrap();
    assert_eq!(*hits.borrow(), 1);

    rig.hub.unregister(cb).unwrap();
    pad.push_reading(2_000, gamepad_reading(vec![button_item(Button::South, false)]));
    rig.hub.update_all().unwrap();
    assert_eq!(*hits.borrow(), 1);
}

/// Destroying a device erases the callbacks registered against it.
#[test]
fn device_scoped_callbacks_die_with_the_device() {
    let mut rig = Rig::new();
    rig.backend.add_gamepad("Pad A");
    let pad_b = rig.backend.add_gamepad("Pad B");
    rig.start();

    let a = rig.hub.gamepads().find(|d| d.display_name() == "Pad A").unwrap().id();
    let b = rig.hub.gamepads().find(|d| d.display_name() == "Pad B").unwrap().id();

    let hits = Rc::new(RefCell::new(0u32));
    let counter = hits.clone();
    rig.hub.on_gamepad_button(Some(a), None, move |_, _| *counter.borrow_mut() += 1).unwrap();

    rig.hub.destroy_device(a).unwrap();

    // pad B still works; the dead device's callback must never fire
    pad_b.push_reading(1_000, gamepad_reading(vec![button_item(Button::South, true)]));
    rig.hub.update_all().unwrap();
    assert_eq!(*hits.borrow(), 0);
    assert!(rig.hub.device(b).is_some());
}

/// Every mutation entry point invoked from a handler fails with
/// `ReentrantMutation`, and the guard clears once dispatch returns.
#[test]
fn reentrancy_guard_blocks_mutation_and_clears() {
    let (mut rig, pad, id) = gamepad_rig();

    let entered = Rc::new(RefCell::new(false));
    let flag = entered.clone();
    rig.hub
        .on_gamepad_button(None, None, move |hub, ev| {
            assert!(matches!(hub.update_all(), Err(Error::ReentrantMutation)));
            assert!(matches!(hub.update_device(ev.device), Err(Error::ReentrantMutation)));
            assert!(matches!(hub.discover(), Err(Error::ReentrantMutation)));
            assert!(matches!(hub.destroy_device(ev.device), Err(Error::ReentrantMutation)));
            assert!(matches!(hub.destroy_all(), Err(Error::ReentrantMutation)));
            assert!(matches!(hub.aggregate(&[ev.device], None), Err(Error::ReentrantMutation)));
            assert!(matches!(hub.unregister_all(), Err(Error::ReentrantMutation)));
            assert!(matches!(
                hub.on_status(None, None, |_, _| {}),
                Err(Error::ReentrantMutation)
            ));
            *flag.borrow_mut() = true;
        })
        .unwrap();

    pad.push_reading(1_000, gamepad_reading(vec![button_item(Button::South, true)]));
    rig.hub.update_all().unwrap();
    assert!(*entered.borrow(), "handler ran");

    // the guard must not stick
    rig.hub.update_all().unwrap();
    assert_eq!(rig.hub.device(id).unwrap().kind(), DeviceKind::Gamepad);
    rig.hub.aggregate(&[id], None).unwrap();
}
