//! Audio Switcher - Library
//!
//! The device directory and switch controller behind a macOS audio
//! switching utility.
//!
//! ## Features
//!
//! - Enumerate input- and output-capable audio devices with active flags
//! - Switch the system default device for either direction
//! - Read and set the default output device's virtual main volume
//! - React to default-device and volume change notifications with
//!   idempotent refreshes, published to registered observers on a single
//!   owner thread

pub mod audio;
pub mod directory;

pub use audio::{
    create_host, AudioDevice, AudioError, AudioHost, ChangeSubscription, DeviceEntry, DeviceId,
    Direction, HostEvent, Snapshot,
};
pub use directory::DeviceDirectory;
