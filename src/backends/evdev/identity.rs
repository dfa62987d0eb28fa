//! Tiered hardware identity for event devices.
//!
//! Identity strength falls through three tiers:
//! 1. the driver-supplied unique id string (`EVIOCGUNIQ`), when non-empty;
//! 2. the physical location string (`EVIOCGPHYS`) plus the
//!    `(bustype, vendor, product, version)` descriptor (`EVIOCGID`);
//! 3. the ephemeral `eventX` index, which only holds while the device stays
//!    attached.
//!
//! Equality is only defined within a tier, which is what the derived
//! [`HardwareId`] equality gives us for free.

use std::os::unix::io::RawFd;

use super::sys;
use crate::backend::HardwareId;

fn ioctl_string(fd: RawFd, request: libc::c_ulong) -> Option<String> {
    let mut buf = [0u8; 128];
    let ok = unsafe { sys::ioctl(fd, request, buf.as_mut_ptr()) };
    if !ok {
        return None;
    }
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Some(String::from_utf8_lossy(&buf[..len]).into_owned())
}

/// Identify an open event device, falling through the tiers.
pub fn hardware_id(fd: RawFd, index: u32) -> HardwareId {
    if let Some(unique) = ioctl_string(fd, sys::eviocguniq(127)) {
        if !unique.is_empty() {
            return HardwareId::Unique(unique);
        }
    }

    let location = ioctl_string(fd, sys::eviocgphys(127));
    let mut id = sys::input_id::default();
    let have_id = unsafe { sys::ioctl(fd, sys::eviocgid(), &mut id) };
    if let (Some(location), true) = (location, have_id) {
        return HardwareId::Physical {
            location,
            bus: id.bustype,
            vendor: id.vendor,
            product: id.product,
            version: id.version,
        };
    }

    HardwareId::Index(index)
}
