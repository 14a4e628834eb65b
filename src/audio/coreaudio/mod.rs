//! CoreAudio implementation of the audio hardware service boundary.
//!
//! Thin safe wrappers over the AudioObject property API: enumeration with
//! per-scope channel classification, default device get/set, virtual main
//! volume get/set, and change listener registration with deterministic
//! teardown.

mod listener;
mod properties;

use super::device::{AudioDevice, AudioError, DeviceId, Direction, HostEvent, OsStatus};
use super::host::{AudioHost, ChangeSubscription};
use core_foundation::base::TCFType;
use core_foundation::string::CFString;
use coreaudio_sys::{
    kAudioHardwareUnknownPropertyError, kAudioObjectSystemObject, AudioBufferList, AudioDeviceID,
    AudioObjectGetPropertyData, AudioObjectGetPropertyDataSize, AudioObjectID,
    AudioObjectPropertyAddress, AudioObjectSetPropertyData, CFStringRef,
};
use listener::ListenerGuard;
use properties::{
    DEFAULT_INPUT_DEVICE_PROPERTY_ADDRESS, DEFAULT_OUTPUT_DEVICE_PROPERTY_ADDRESS,
    DEVICES_PROPERTY_ADDRESS, DEVICE_NAME_PROPERTY_ADDRESS,
    INPUT_STREAM_CONFIGURATION_PROPERTY_ADDRESS, OUTPUT_STREAM_CONFIGURATION_PROPERTY_ADDRESS,
    VIRTUAL_MAIN_VOLUME_PROPERTY_ADDRESS,
};
use std::mem;
use std::os::raw::c_void;
use std::ptr;
use std::sync::mpsc::Sender;
use tracing::{debug, warn};

/// Read a fixed-size property value from an audio object.
fn get_property<T: Sized>(
    object: AudioObjectID,
    address: &AudioObjectPropertyAddress,
    context: &'static str,
) -> Result<T, AudioError> {
    let mut size = mem::size_of::<T>() as u32;
    let mut data = mem::MaybeUninit::<T>::uninit();

    let status = unsafe {
        AudioObjectGetPropertyData(
            object,
            address,
            0,
            ptr::null(),
            &mut size,
            data.as_mut_ptr() as *mut c_void,
        )
    };

    if status == 0 {
        Ok(unsafe { data.assume_init() })
    } else {
        Err(AudioError::Query { context, status })
    }
}

/// Write a fixed-size property value to an audio object.
fn set_property<T: Sized>(
    object: AudioObjectID,
    address: &AudioObjectPropertyAddress,
    value: &T,
    context: &'static str,
) -> Result<(), AudioError> {
    let status = unsafe {
        AudioObjectSetPropertyData(
            object,
            address,
            0,
            ptr::null(),
            mem::size_of::<T>() as u32,
            value as *const T as *const c_void,
        )
    };

    if status == 0 {
        Ok(())
    } else {
        Err(AudioError::Write { context, status })
    }
}

/// The system object's scoped default device, with the `0` sentinel on
/// failure.
fn system_default_device(direction: Direction) -> DeviceId {
    let (address, context) = match direction {
        Direction::Output => (
            &DEFAULT_OUTPUT_DEVICE_PROPERTY_ADDRESS,
            "default output device",
        ),
        Direction::Input => (
            &DEFAULT_INPUT_DEVICE_PROPERTY_ADDRESS,
            "default input device",
        ),
    };

    match get_property::<AudioDeviceID>(kAudioObjectSystemObject, address, context) {
        Ok(id) => id,
        Err(e) => {
            warn!(%direction, error = %e, "default device query failed");
            0
        }
    }
}

/// Channel count of the first buffer of a device's stream configuration in
/// one scope. Zero when the query fails or the scope has no streams.
fn channel_count(id: AudioDeviceID, address: &AudioObjectPropertyAddress) -> u32 {
    let mut size: u32 = 0;
    let status =
        unsafe { AudioObjectGetPropertyDataSize(id, address, 0, ptr::null(), &mut size) };
    if status != 0 || (size as usize) < mem::size_of::<AudioBufferList>() {
        return 0;
    }

    // AudioBufferList is variable-length and carries a pointer field, so
    // the backing buffer must be at least pointer-aligned before it can be
    // reborrowed as a reference.
    let mut buf = vec![0u64; (size as usize).div_ceil(8)];
    let status = unsafe {
        AudioObjectGetPropertyData(
            id,
            address,
            0,
            ptr::null(),
            &mut size,
            buf.as_mut_ptr() as *mut c_void,
        )
    };
    if status != 0 {
        return 0;
    }

    let list = unsafe { &*(buf.as_ptr() as *const AudioBufferList) };
    if list.mNumberBuffers == 0 {
        0
    } else {
        list.mBuffers[0].mNumberChannels
    }
}

/// The display name of a device. `None` skips the handle from enumeration.
fn device_name(id: AudioDeviceID) -> Option<String> {
    let string_ref = match get_property::<CFStringRef>(id, &DEVICE_NAME_PROPERTY_ADDRESS, "device name") {
        Ok(r) => r,
        Err(e) => {
            warn!(device = id, error = %e, "skipping device without a readable name");
            return None;
        }
    };
    if string_ref.is_null() {
        return None;
    }

    // The property returns a retained CFString; the wrapper releases it.
    let name = unsafe {
        CFString::wrap_under_create_rule(string_ref as core_foundation::string::CFStringRef)
    };
    Some(name.to_string())
}

/// Whether a status means the property does not exist on the object.
fn is_unknown_property(status: OsStatus) -> bool {
    status == kAudioHardwareUnknownPropertyError as OsStatus
}

/// CoreAudio-backed [`AudioHost`].
pub struct CoreAudioHost;

impl CoreAudioHost {
    pub fn new() -> Self {
        Self
    }

    /// The full set of device handles the hardware service reports.
    fn device_ids(&self) -> Result<Vec<AudioDeviceID>, AudioError> {
        let mut size: u32 = 0;
        let status = unsafe {
            AudioObjectGetPropertyDataSize(
                kAudioObjectSystemObject,
                &DEVICES_PROPERTY_ADDRESS,
                0,
                ptr::null(),
                &mut size,
            )
        };
        if status != 0 {
            return Err(AudioError::Query {
                context: "device list size",
                status,
            });
        }

        let count = size as usize / mem::size_of::<AudioDeviceID>();
        let mut ids = vec![0 as AudioDeviceID; count];
        let status = unsafe {
            AudioObjectGetPropertyData(
                kAudioObjectSystemObject,
                &DEVICES_PROPERTY_ADDRESS,
                0,
                ptr::null(),
                &mut size,
                ids.as_mut_ptr() as *mut c_void,
            )
        };
        if status != 0 {
            return Err(AudioError::Query {
                context: "device list",
                status,
            });
        }

        // The service may report fewer entries than the size probe did.
        ids.truncate(size as usize / mem::size_of::<AudioDeviceID>());
        Ok(ids)
    }
}

impl Default for CoreAudioHost {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioHost for CoreAudioHost {
    fn list_devices(&self) -> Result<Vec<AudioDevice>, AudioError> {
        let ids = self.device_ids()?;
        let mut devices = Vec::with_capacity(ids.len());

        for id in ids {
            // A handle without a readable name is skipped, not fatal.
            let Some(name) = device_name(id) else {
                continue;
            };

            devices.push(AudioDevice {
                id,
                name,
                input_channels: channel_count(id, &INPUT_STREAM_CONFIGURATION_PROPERTY_ADDRESS),
                output_channels: channel_count(id, &OUTPUT_STREAM_CONFIGURATION_PROPERTY_ADDRESS),
            });
        }

        debug!(count = devices.len(), "enumerated audio devices");
        Ok(devices)
    }

    fn default_device(&self, direction: Direction) -> DeviceId {
        system_default_device(direction)
    }

    fn set_default_device(&self, id: DeviceId, direction: Direction) -> Result<(), AudioError> {
        let (address, context) = match direction {
            Direction::Output => (
                &DEFAULT_OUTPUT_DEVICE_PROPERTY_ADDRESS,
                "set default output device",
            ),
            Direction::Input => (
                &DEFAULT_INPUT_DEVICE_PROPERTY_ADDRESS,
                "set default input device",
            ),
        };
        set_property(kAudioObjectSystemObject, address, &id, context)
    }

    fn volume(&self) -> Result<f32, AudioError> {
        let id = system_default_device(Direction::Output);
        if id == 0 {
            return Err(AudioError::NoDefaultDevice {
                direction: Direction::Output,
            });
        }

        get_property::<f32>(id, &VIRTUAL_MAIN_VOLUME_PROPERTY_ADDRESS, "read output volume")
            .map_err(|e| match e {
                AudioError::Query { status, .. } if is_unknown_property(status) => {
                    AudioError::VolumeUnavailable { id }
                }
                other => other,
            })
    }

    fn set_volume(&self, value: f32) -> Result<(), AudioError> {
        let id = system_default_device(Direction::Output);
        if id == 0 {
            return Err(AudioError::NoDefaultDevice {
                direction: Direction::Output,
            });
        }

        set_property(
            id,
            &VIRTUAL_MAIN_VOLUME_PROPERTY_ADDRESS,
            &value,
            "write output volume",
        )
        .map_err(|e| match e {
            AudioError::Write { status, .. } if is_unknown_property(status) => {
                AudioError::VolumeUnavailable { id }
            }
            other => other,
        })
    }

    fn subscribe(
        &self,
        events: Sender<HostEvent>,
    ) -> Result<Box<dyn ChangeSubscription>, AudioError> {
        let default_listener = ListenerGuard::register(
            kAudioObjectSystemObject,
            DEFAULT_OUTPUT_DEVICE_PROPERTY_ADDRESS,
            events.clone(),
            HostEvent::DefaultDeviceChanged,
        )
        .map_err(|status| AudioError::Query {
            context: "register default device listener",
            status,
        })?;

        let mut subscription = CoreAudioSubscription {
            events,
            _default_listener: default_listener,
            volume_listener: None,
        };
        subscription.retarget_volume();

        Ok(Box::new(subscription))
    }
}

/// Registered CoreAudio listeners, removed on drop.
struct CoreAudioSubscription {
    events: Sender<HostEvent>,
    _default_listener: ListenerGuard,
    volume_listener: Option<ListenerGuard>,
}

impl ChangeSubscription for CoreAudioSubscription {
    fn retarget_volume(&mut self) {
        // Drop the old registration before attaching to the new device.
        self.volume_listener = None;

        let id = system_default_device(Direction::Output);
        if id == 0 {
            debug!("no default output device; volume listener detached");
            return;
        }

        match ListenerGuard::register(
            id,
            VIRTUAL_MAIN_VOLUME_PROPERTY_ADDRESS,
            self.events.clone(),
            HostEvent::VolumeChanged,
        ) {
            Ok(guard) => {
                debug!(device = id, "volume listener attached");
                self.volume_listener = Some(guard);
            }
            Err(status) => {
                warn!(device = id, status, "could not attach volume listener");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_configuration_buffer_is_aligned_for_buffer_list() {
        // channel_count reads the stream configuration into a u64 buffer
        // and reborrows it as &AudioBufferList; that is only sound while
        // the buffer's alignment covers the struct's.
        assert!(mem::align_of::<AudioBufferList>() <= mem::align_of::<u64>());
    }
}
