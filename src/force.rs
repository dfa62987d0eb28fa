//! Force-feedback model.
//!
//! A force is one haptic effect bound to one motor of one device: classic
//! rumble, a constant/ramp push, a periodic wave, or a condition effect
//! (spring/friction/damper/inertia). The portable parameter set here is
//! translated by each backend into its native actuator primitives; the
//! clamping and envelope normalization rules live in this module so every
//! backend applies the same limits.
//!
//! Forces outlive their device's connection: when the owning device
//! disconnects, its forces are *orphaned* — they keep their id and parameters
//! and may still be queried and destroyed, but report a sticky
//! [`ForceStatus::Inactive`] and refuse start/stop/write operations.

use crate::backend::EffectHandle;
use crate::id::{DeviceId, ForceId};

/// Kind of force applied to a motor. Fixed at force creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ForceKind {
    /// Classic rumble vibration. Little customization, but the widest
    /// hardware support; useful as a fallback.
    Rumble = 0,
    /// Constant amount of force.
    Constant,
    /// Force that changes linearly over time.
    Ramp,
    /// Periodic force — sine wave.
    Sine,
    /// Periodic force — triangle wave.
    Triangle,
    /// Periodic force — square wave.
    Square,
    /// Periodic force — upward sawtooth wave.
    SawUp,
    /// Periodic force — downward sawtooth wave.
    SawDown,
    /// Condition force applied in opposition to a set state.
    Spring,
    /// Condition force mimicking friction.
    Friction,
    /// Condition force mimicking damping.
    Damper,
    /// Condition force mimicking inertia.
    Inertia,
}

/// Total number of portable force kinds.
pub const NUM_FORCE_KINDS: usize = 12;

impl ForceKind {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// True for the four condition-effect kinds.
    #[inline]
    pub fn is_condition(self) -> bool {
        matches!(
            self,
            ForceKind::Spring | ForceKind::Friction | ForceKind::Damper | ForceKind::Inertia
        )
    }

    /// True for the five periodic-wave kinds.
    #[inline]
    pub fn is_periodic(self) -> bool {
        matches!(
            self,
            ForceKind::Sine
                | ForceKind::Triangle
                | ForceKind::Square
                | ForceKind::SawUp
                | ForceKind::SawDown
        )
    }
}

/// Dense set of supported force kinds, one bit per [`ForceKind`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ForceKindSet(u16);

impl ForceKindSet {
    pub const EMPTY: ForceKindSet = ForceKindSet(0);

    #[inline]
    pub fn insert(&mut self, kind: ForceKind) {
        self.0 |= 1 << kind.index();
    }

    #[inline]
    pub fn contains(&self, kind: ForceKind) -> bool {
        self.0 & (1 << kind.index()) != 0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<ForceKind> for ForceKindSet {
    fn from_iter<T: IntoIterator<Item = ForceKind>>(iter: T) -> Self {
        let mut set = ForceKindSet::EMPTY;
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

/// Status of the physical effect behind a force.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForceStatus {
    /// The backing runtime cannot report whether the effect is playing.
    Unknown,
    /// The effect is known to be stopped.
    Inactive,
    /// The effect is known to be playing.
    Active,
}

/// Duration and gain-over-time shape of a force.
///
/// Gains are in [0, 1]; times are seconds. The sum of the three times may
/// never exceed [`MAX_TIME`](Self::MAX_TIME) on the wire — backends rescale
/// all three uniformly via [`time_scale`](Self::time_scale) when the caller
/// exceeds it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ForceEnvelope {
    pub attack_time: f32,
    pub attack_gain: f32,
    pub sustain_time: f32,
    pub sustain_gain: f32,
    pub release_time: f32,
    pub release_gain: f32,
}

impl ForceEnvelope {
    /// Maximum total active time of any force, in seconds.
    pub const MAX_TIME: f32 = 32.0;

    /// Uniform factor that brings attack + sustain + release within
    /// [`MAX_TIME`]. Returns 1.0 when the envelope already fits.
    pub(crate) fn time_scale(&self) -> f32 {
        let total = self.attack_time.max(0.0) + self.sustain_time.max(0.0) + self.release_time.max(0.0);
        1.0 / 1.0f32.max(total * (1.0 / Self::MAX_TIME))
    }
}

/// Parameters for [`ForceKind::Rumble`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RumbleParams {
    /// Intensity of the low-frequency rumble motor in [0, 1], if present.
    pub low: f32,
    /// Intensity of the high-frequency rumble motor in [0, 1], if present.
    pub high: f32,
}

/// Parameters for [`ForceKind::Constant`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConstantParams {
    pub envelope: ForceEnvelope,
    /// Raw amount of force applied (affected by gain).
    pub magnitude: f32,
}

/// Parameters for [`ForceKind::Ramp`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RampParams {
    pub envelope: ForceEnvelope,
    /// Force at the beginning of the ramp (affected by gain).
    pub magnitude_start: f32,
    /// Force at the end of the ramp (affected by gain).
    pub magnitude_end: f32,
}

/// Parameters for the periodic wave kinds. The waveform itself is the force's
/// [`ForceKind`], not part of the parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PeriodicParams {
    pub envelope: ForceEnvelope,
    /// Peak force of the wave (affected by gain).
    pub magnitude: f32,
    /// Wave frequency in Hz.
    pub frequency: f32,
    /// Horizontal shift of the wave in [0, 1].
    pub phase: f32,
    /// Vertical shift of the wave, in magnitude terms.
    pub offset: f32,
}

/// Parameters for the condition kinds (spring/friction/damper/inertia).
/// Backends without asymmetric support duplicate the sides.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConditionParams {
    /// Raw amount of force (affected by gain, saturation, coefficients,
    /// deadzone).
    pub magnitude: f32,
    /// Maximum force in the left/negative area.
    pub left_saturation: f32,
    /// Maximum force in the right/positive area.
    pub right_saturation: f32,
    /// Force multiplier for the left/negative area, in [-1, 1].
    pub left_coefficient: f32,
    /// Force multiplier for the right/positive area, in [-1, 1].
    pub right_coefficient: f32,
    /// Area around the center with no force, in [0, 1].
    pub deadzone: f32,
    /// Deadzone offset, in [-1, 1].
    pub center: f32,
}

/// Tagged force parameters. The variant is fixed by the force's kind at
/// creation; replacing it with a mismatched variant makes
/// [`Hub::write_force_params`](crate::Hub::write_force_params) fail.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ForceParams {
    Rumble(RumbleParams),
    Constant(ConstantParams),
    Ramp(RampParams),
    Periodic(PeriodicParams),
    Condition(ConditionParams),
}

impl ForceParams {
    /// Zeroed parameters of the variant matching `kind`.
    pub fn default_for(kind: ForceKind) -> ForceParams {
        match kind {
            ForceKind::Rumble => ForceParams::Rumble(RumbleParams::default()),
            ForceKind::Constant => ForceParams::Constant(ConstantParams::default()),
            ForceKind::Ramp => ForceParams::Ramp(RampParams::default()),
            k if k.is_periodic() => ForceParams::Periodic(PeriodicParams::default()),
            _ => ForceParams::Condition(ConditionParams::default()),
        }
    }

    /// Whether this variant is the one a force of `kind` carries.
    pub fn matches(&self, kind: ForceKind) -> bool {
        match self {
            ForceParams::Rumble(_) => kind == ForceKind::Rumble,
            ForceParams::Constant(_) => kind == ForceKind::Constant,
            ForceParams::Ramp(_) => kind == ForceKind::Ramp,
            ForceParams::Periodic(_) => kind.is_periodic(),
            ForceParams::Condition(_) => kind.is_condition(),
        }
    }
}

/// Wave frequency (Hz) to a millisecond period, clamped to the u16 wire range
/// with a 1 ms floor.
#[inline]
pub(crate) fn period_ms(frequency: f32) -> u16 {
    (1e3 / frequency).min(65535.0).max(1.0) as u16
}

/// One force owned by a device. Records stay in the owner's table until
/// destroyed explicitly, including after the owner disconnects (orphaned).
#[derive(Debug)]
pub(crate) struct ForceRecord {
    pub id: ForceId,
    pub kind: ForceKind,
    pub motor: u32,
    pub params: ForceParams,
    /// Backend effect slot; `None` for synthetic rumble, which goes through
    /// the direct rumble submission path instead of an effect object.
    pub effect: Option<EffectHandle>,
    pub orphaned: bool,
    /// Last commanded rumble activity; rumble self-reports its status.
    pub rumble_active: bool,
}

/// Read-only view of a force, resolved through the hub.
#[derive(Clone, Copy, Debug)]
pub struct Force<'a> {
    pub(crate) record: &'a ForceRecord,
    pub(crate) owner: DeviceId,
    pub(crate) status: ForceStatus,
}

impl<'a> Force<'a> {
    pub fn id(&self) -> ForceId {
        self.record.id
    }

    pub fn kind(&self) -> ForceKind {
        self.record.kind
    }

    /// The device the force acts on. A force created through an aggregate
    /// reports the underlying member. `None` once the force is orphaned.
    pub fn device(&self) -> Option<DeviceId> {
        (!self.record.orphaned).then_some(self.owner)
    }

    /// True once the owning device has disconnected since creation.
    pub fn is_orphaned(&self) -> bool {
        self.record.orphaned
    }

    /// Current physical status. Always [`ForceStatus::Inactive`] when
    /// orphaned.
    pub fn status(&self) -> ForceStatus {
        self.status
    }

    /// Motor slot on the owning device. Forces created through an aggregate
    /// report the member's motor index, not the aggregate's.
    pub fn motor_index(&self) -> u32 {
        self.record.motor
    }

    pub fn params(&self) -> &ForceParams {
        &self.record.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_within_limit_is_unscaled() {
        let env = ForceEnvelope {
            attack_time: 1.0,
            sustain_time: 2.0,
            release_time: 3.0,
            ..Default::default()
        };
        assert_eq!(env.time_scale(), 1.0);
    }

    #[test]
    fn envelope_over_limit_rescales_uniformly() {
        let env = ForceEnvelope {
            attack_time: 32.0,
            sustain_time: 16.0,
            release_time: 16.0,
            ..Default::default()
        };
        let m = env.time_scale();
        let total = (env.attack_time + env.sustain_time + env.release_time) * m;
        assert!((total - ForceEnvelope::MAX_TIME).abs() < 1e-3);
    }

    #[test]
    fn negative_times_do_not_inflate_the_budget() {
        let env = ForceEnvelope {
            attack_time: -5.0,
            sustain_time: 10.0,
            release_time: 0.0,
            ..Default::default()
        };
        assert_eq!(env.time_scale(), 1.0);
    }

    #[test]
    fn period_from_frequency_clamps_to_wire_range() {
        assert_eq!(period_ms(1000.0), 1);
        assert_eq!(period_ms(4000.0), 1);
        assert_eq!(period_ms(2.0), 500);
        assert_eq!(period_ms(0.001), 65535);
    }

    #[test]
    fn params_variant_matches_kind_family() {
        assert!(ForceParams::default_for(ForceKind::Sine).matches(ForceKind::Square));
        assert!(!ForceParams::default_for(ForceKind::Sine).matches(ForceKind::Rumble));
        assert!(ForceParams::default_for(ForceKind::Spring).matches(ForceKind::Inertia));
        assert!(ForceParams::default_for(ForceKind::Rumble).matches(ForceKind::Rumble));
    }
}
