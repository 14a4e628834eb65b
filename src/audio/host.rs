//! The audio hardware service boundary as a trait.
//!
//! The directory is written against [`AudioHost`], so the CoreAudio
//! implementation stays behind a seam and tests run against a scripted
//! host on any platform.

use super::device::{AudioDevice, AudioError, DeviceId, Direction, HostEvent};
use std::sync::mpsc::Sender;

/// Operations the OS audio hardware service provides.
///
/// All calls are synchronous bounded queries or writes; none cache results
/// between calls. Implementations log their own diagnostics at the failure
/// site.
pub trait AudioHost {
    /// Enumerate every device the hardware service reports, freshly on each
    /// call. Handles whose name cannot be read are skipped; a failing
    /// top-level query is an error the caller degrades to an empty list.
    fn list_devices(&self) -> Result<Vec<AudioDevice>, AudioError>;

    /// The current default device for `direction`, or `0` when the query
    /// fails or no default exists. Callers treat `0` as "none" and never
    /// match it against a real device.
    fn default_device(&self, direction: Direction) -> DeviceId;

    /// Write `id` as the new default for `direction`.
    fn set_default_device(&self, id: DeviceId, direction: Direction) -> Result<(), AudioError>;

    /// Read the virtual main volume of the current default output device,
    /// re-resolved at call time.
    fn volume(&self) -> Result<f32, AudioError>;

    /// Write the virtual main volume of the current default output device,
    /// re-resolved at call time. `value` is already clamped by the caller.
    fn set_volume(&self, value: f32) -> Result<(), AudioError>;

    /// Register the two change listeners (default output device, output
    /// volume). Callbacks may fire on any thread and only send on `events`.
    /// Dropping the returned handle deregisters both listeners.
    fn subscribe(&self, events: Sender<HostEvent>)
        -> Result<Box<dyn ChangeSubscription>, AudioError>;
}

/// Scoped handle for the registered change listeners.
///
/// Deterministic teardown: dropping the handle unregisters the listeners
/// and reclaims their callback context, so no callback can fire into a
/// destroyed controller.
pub trait ChangeSubscription {
    /// Re-attach the volume listener to the current default output device.
    ///
    /// The volume listener is bound to a specific device, so the owner
    /// thread calls this after handling a default-device change.
    fn retarget_volume(&mut self);
}

/// Create the platform host.
#[cfg(target_os = "macos")]
pub fn create_host() -> Result<Box<dyn AudioHost>, AudioError> {
    Ok(Box::new(super::coreaudio::CoreAudioHost::new()))
}

/// Create the platform host.
#[cfg(not(target_os = "macos"))]
pub fn create_host() -> Result<Box<dyn AudioHost>, AudioError> {
    Err(AudioError::Query {
        context: "create_host: no audio hardware service on this platform",
        status: 0,
    })
}
