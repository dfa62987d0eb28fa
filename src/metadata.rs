//! Device metadata snapshot.
//!
//! [`DeviceMeta`] is a lightweight, cloneable description of a device suitable
//! for UI display, logging, and persistence. Backends populate what they know
//! when a device connects; unknown fields remain `None`.
//!
//! # Conventions
//! - `bus` is a short, human-readable transport hint like `"usb"`,
//!   `"bluetooth"`, or `"xinput"`.
//! - `product_string` should be a friendly, user-facing name when available.
//! - `path` is an OS/topology path (opaque string) useful for diagnostics; it
//!   may change across ports, drivers, and reconnects, so treat it as
//!   diagnostic first, identity second.
//! - `vendor_id`/`product_id`/`version` come from the device descriptor when
//!   the platform reports them and are generally stable across reconnects.
//!
//! The snapshot is retained after a disconnect so callers can still label the
//! (now unreachable) device; [`Device::display_name`](crate::Device::display_name)
//! by contrast is live data and goes empty while disconnected.

use serde::{Deserialize, Serialize};

/// Snapshot of metadata describing a single device.
///
/// All fields are optional; backends populate what is known on the current
/// platform.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DeviceMeta {
    /// High-level transport classification (e.g. `"usb"`, `"bluetooth"`).
    pub bus: Option<String>,

    /// Vendor ID from the device descriptor, if known.
    pub vendor_id: Option<u16>,

    /// Product ID from the device descriptor, if known.
    pub product_id: Option<u16>,

    /// Device/firmware version word, if known.
    pub version: Option<u16>,

    /// Human-readable product name from the driver/firmware.
    pub product_string: Option<String>,

    /// Physical location string reported by the driver, if present.
    pub physical_location: Option<String>,

    /// OS/topological path to the device node. Platform-specific and opaque.
    pub path: Option<String>,
}
