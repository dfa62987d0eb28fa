//! Serializable threshold profiles.
//!
//! A [`ThresholdProfile`] captures a user's press-threshold configuration —
//! one optional global value plus per-input overrides — in a form that can be
//! persisted (e.g. as JSON or TOML via serde) and re-applied after a restart
//! or onto a freshly discovered device. Thresholds survive reconnects on the
//! device itself; the profile exists so they can also survive the process.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::codes::{Button, Key};
use crate::device::Device;

/// Persistent press-threshold configuration for one device (or one class of
/// devices — profiles are not tied to a hardware identity).
///
/// Entries that do not apply to the target device's kind are ignored, so a
/// single profile can safely carry keyboard, mouse, and gamepad sections.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ThresholdProfile {
    /// Profile label for UI and file naming.
    pub name: String,

    /// Optional human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Threshold applied to every input before the per-input overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<f32>,

    /// Per-key overrides (keyboards).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub keys: HashMap<Key, f32>,

    /// Per-button overrides (gamepads).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub buttons: HashMap<Button, f32>,

    /// Per-button-index overrides (mice; 0 = left, 1 = right, 2 = middle).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub mouse_buttons: HashMap<u32, f32>,
}

impl ThresholdProfile {
    /// Apply this profile to a device: the global threshold first (when set),
    /// then the overrides matching the device's kind. Values are clamped to
    /// [0, 1] by the device, same as direct threshold setters.
    pub fn apply(&self, device: &mut Device) {
        if let Some(global) = self.global {
            device.set_global_threshold(global);
        }

        for (&key, &threshold) in &self.keys {
            device.set_key_threshold(key, threshold);
        }
        for (&button, &threshold) in &self.buttons {
            device.set_button_threshold(button, threshold);
        }
        for (&index, &threshold) in &self.mouse_buttons {
            device.set_mouse_button_threshold(index, threshold);
        }
    }
}
