//! Runtime-unique identifiers.
//!
//! Devices, callbacks, and forces all draw their identifiers from a single
//! monotonically increasing 64-bit counter owned by the [`Hub`](crate::Hub).
//! The raw value `0` is reserved as the "invalid / global" sentinel and is
//! never handed out, so a zeroed id can always be used as a wildcard in
//! dispatch keys. Identifiers are never reused within a process.

use serde::{Deserialize, Serialize};

/// Identifier of a device (native or aggregate).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(pub(crate) u64);

/// Identifier of a registered event callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallbackId(pub(crate) u64);

/// Identifier of a force created on a device motor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForceId(pub(crate) u64);

impl DeviceId {
    /// Raw numeric value, useful for logging and persistence keys.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl CallbackId {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl ForceId {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Process-unique id counter. Starts at 1, post-increments on every
/// reservation, never recycles. Overflow is not handled; a 64-bit counter
/// outlives any realistic process.
#[derive(Debug)]
pub(crate) struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub(crate) fn new() -> Self {
        Self { next: 1 }
    }

    pub(crate) fn reserve(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_and_skip_zero() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.reserve(), 1);
        assert_eq!(alloc.reserve(), 2);
        assert_eq!(alloc.reserve(), 3);
    }
}
