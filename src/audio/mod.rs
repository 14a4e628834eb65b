//! Audio module for the hardware service boundary.
//!
//! This module provides the device data model, the [`AudioHost`] trait the
//! directory is written against, and the CoreAudio implementation on macOS.

pub mod device;
pub mod host;

#[cfg(target_os = "macos")]
pub mod coreaudio;

#[cfg(test)]
pub(crate) mod mock;

pub use device::{
    AudioDevice, AudioError, DeviceEntry, DeviceId, Direction, HostEvent, OsStatus, Snapshot,
};
pub use host::{create_host, AudioHost, ChangeSubscription};
