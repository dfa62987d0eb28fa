//! Force feedback: rumble lifecycle and gain recommit, effect uploads,
//! capability checks, and orphaning.

mod common;

use common::{gamepad_rig, Rig};
use inputhub::backend::{Capabilities, MotorCaps};
use inputhub::{DeviceKind, Error, ForceKind, ForceParams, ForceStatus, RumbleParams};

/// Starting rumble submits `(low * gain, high * gain)`, and changing motor
/// 0's gain on a synthetic-rumble device recommits the active rumble without
/// an explicit parameter write.
#[test]
fn rumble_gain_change_recommits() {
    let (mut rig, pad, id) = gamepad_rig();

    let force = rig.hub.create_force(id, 0, ForceKind::Rumble).unwrap();
    *rig.hub.force_params_mut(force).unwrap() = ForceParams::Rumble(RumbleParams { low: 1.0, high: 1.0 });
    assert!(rig.hub.start_force(force));
    assert_eq!(rig.hub.force_status(force), ForceStatus::Active);

    rig.hub.set_gain(id, 0, 0.5);

    let log = pad.rumble_log();
    assert_eq!(log, vec![(1.0, 1.0), (0.5, 0.5)]);

    assert!(rig.hub.stop_force(force));
    assert_eq!(*pad.rumble_log().last().unwrap(), (0.0, 0.0));
    assert_eq!(rig.hub.force_status(force), ForceStatus::Inactive);
}

/// At most one rumble force exists per device at a time.
#[test]
fn rumble_is_a_singleton() {
    let (mut rig, _pad, id) = gamepad_rig();

    let first = rig.hub.create_force(id, 0, ForceKind::Rumble).unwrap();
    assert!(matches!(
        rig.hub.create_force(id, 0, ForceKind::Rumble),
        Err(Error::CapabilityMismatch)
    ));

    // destroying the singleton frees the slot
    rig.hub.destroy_force(first);
    rig.hub.create_force(id, 0, ForceKind::Rumble).unwrap();
}

/// Creation fails without allocating anything when the motor cannot play the
/// kind, and on disconnected devices.
#[test]
fn capability_mismatch_refuses_creation() {
    let (mut rig, pad, id) = gamepad_rig();

    assert!(matches!(
        rig.hub.create_force(id, 0, ForceKind::Sine),
        Err(Error::CapabilityMismatch)
    ));
    assert!(matches!(
        rig.hub.create_force(id, 7, ForceKind::Rumble),
        Err(Error::CapabilityMismatch)
    ));
    assert!(pad.effects().is_empty());

    pad.set_present(false);
    rig.hub.update_all().unwrap();
    assert!(matches!(
        rig.hub.create_force(id, 0, ForceKind::Rumble),
        Err(Error::CapabilityMismatch)
    ));
}

/// A rig whose gamepad exposes one effect-object motor instead of synthetic
/// rumble.
fn effect_rig() -> (Rig, inputhub::backends::virtual_input::VirtualDevice, inputhub::DeviceId) {
    let mut rig = Rig::new();
    let pad = rig.backend.add_gamepad("FFB Pad");
    pad.set_capabilities(Capabilities {
        thumbsticks: 2,
        motors: vec![MotorCaps {
            kinds: [ForceKind::Sine, ForceKind::Constant, ForceKind::Spring].into_iter().collect(),
        }],
        synthetic_rumble: false,
        ..Default::default()
    });
    rig.start();
    let id = rig.device_of_kind(DeviceKind::Gamepad);
    (rig, pad, id)
}

/// Starting an effect force implicitly re-uploads its parameters; explicit
/// writes upload without starting.
#[test]
fn effect_start_uploads_parameters() {
    let (mut rig, pad, id) = effect_rig();

    let force = rig.hub.create_force(id, 0, ForceKind::Sine).unwrap();
    let effects = pad.effects();
    assert_eq!(effects.len(), 1);
    assert_eq!(effects[0].kind, ForceKind::Sine);
    assert!(effects[0].uploads.is_empty(), "creation alone uploads nothing");

    match rig.hub.force_params_mut(force).unwrap() {
        ForceParams::Periodic(periodic) => {
            periodic.magnitude = 0.75;
            periodic.frequency = 50.0;
        }
        other => panic!("sine force carries periodic params, got {other:?}"),
    }

    assert!(rig.hub.start_force(force));
    let effects = pad.effects();
    assert_eq!(effects[0].uploads.len(), 1);
    assert!(effects[0].playing);
    assert_eq!(rig.hub.force_status(force), ForceStatus::Active);

    assert!(rig.hub.write_force_params(force));
    assert_eq!(pad.effects()[0].uploads.len(), 2);

    assert!(rig.hub.stop_force(force));
    assert!(!pad.effects()[0].playing);
}

/// Replacing the parameter variant with one that does not match the force's
/// kind makes writes fail.
#[test]
fn mismatched_params_variant_refuses_to_write() {
    let (mut rig, _pad, id) = effect_rig();

    let force = rig.hub.create_force(id, 0, ForceKind::Sine).unwrap();
    *rig.hub.force_params_mut(force).unwrap() = ForceParams::Rumble(RumbleParams::default());

    assert!(!rig.hub.write_force_params(force));
    assert!(!rig.hub.start_force(force));
}

/// Disconnecting orphans the device's forces: they stay queryable and
/// destroyable but refuse operations and report a sticky Inactive status.
#[test]
fn disconnect_orphans_forces() {
    let (mut rig, pad, id) = effect_rig();

    let force = rig.hub.create_force(id, 0, ForceKind::Spring).unwrap();
    assert!(rig.hub.start_force(force));

    pad.set_present(false);
    rig.hub.update_all().unwrap();

    let view = rig.hub.force(force).expect("orphaned forces stay queryable");
    assert!(view.is_orphaned());
    assert_eq!(view.device(), None);
    assert_eq!(view.status(), ForceStatus::Inactive);
    assert_eq!(view.kind(), ForceKind::Spring);

    assert!(!rig.hub.start_force(force));
    assert!(!rig.hub.stop_force(force));
    assert!(!rig.hub.write_force_params(force));

    // reconnecting does not revive old forces; new ones can be created
    pad.set_present(true);
    rig.hub.update_all().unwrap();
    assert!(rig.hub.force(force).unwrap().is_orphaned());
    let fresh = rig.hub.create_force(id, 0, ForceKind::Sine).unwrap();
    assert_ne!(fresh, force);

    rig.hub.destroy_force(force);
    assert!(rig.hub.force(force).is_none());
}

/// Destroying a device destroys its forces with it.
#[test]
fn device_destruction_removes_forces() {
    let (mut rig, _pad, id) = gamepad_rig();

    let force = rig.hub.create_force(id, 0, ForceKind::Rumble).unwrap();
    rig.hub.destroy_device(id).unwrap();
    assert!(rig.hub.force(force).is_none());
}
