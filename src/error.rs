//! Error types crossing the public API.
//!
//! Transient provider faults never surface here: a failed read or poll marks
//! the affected device disconnected and the next update retries the
//! connection. Buffer overruns are likewise recovered internally through a
//! whole-device state query.

use std::path::PathBuf;

/// Errors surfaced by [`Hub`](crate::Hub) operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Insufficient OS permissions to enumerate or open an input device.
    #[error("access to {path:?} denied; is the current user allowed to read input devices (e.g. in the \"input\" group)?")]
    AccessDenied { path: PathBuf },

    /// The platform input runtime failed to initialize.
    #[error("input backend failed to initialize: {0}")]
    BackendInit(String),

    /// A mutation entry point was invoked from inside an event callback.
    #[error("illegal access to a hub mutation API from within a callback")]
    ReentrantMutation,

    /// Force creation was requested for a motor/kind pair the device does not
    /// support, or the device has exhausted its effect slots.
    #[error("device does not support the requested force on this motor")]
    CapabilityMismatch,

    /// Aggregation failed: no members, unknown member id, or mismatched
    /// member device kinds.
    #[error("invalid aggregation request")]
    InvalidAggregation,

    /// The referenced device id is not (or no longer) registered.
    #[error("no device with the given id is registered")]
    UnknownDevice,

    /// The destruction hierarchy could not make progress, which indicates a
    /// circular chain of aggregated devices (undefined input).
    #[error("cyclic device aggregation detected during destruction")]
    CyclicAggregation,
}

/// Classification of provider faults reported by a
/// [`DeviceIo`](crate::backend::DeviceIo). Both flavors release the device
/// handle and mark the device disconnected; `Fatal` additionally tells the
/// pipeline not to bother flushing pending work on the handle. Neither
/// crosses the public API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoFailure {
    /// Retryable fault (e.g. EIO on a wobbly hotplug); reconnect next update.
    Transient,
    /// The handle is gone for good (e.g. ENODEV).
    Fatal,
}
