//! Audio device data models.
//!
//! Defines the core data structures for representing audio devices,
//! their direction capabilities, published state, and related events.

use thiserror::Error;

/// Opaque hardware device handle.
///
/// Process-lifetime-unique, not stable across reboots or unplug. `0` is the
/// "no device" sentinel reported when a default cannot be resolved; it never
/// matches a real device.
pub type DeviceId = u32;

/// Raw status code from the audio hardware service.
pub type OsStatus = i32;

/// Direction capability of a device or operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Capture side (microphones)
    Input,

    /// Render side (speakers, headphones)
    Output,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

/// An audio device as reported by one enumeration pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Hardware handle (opaque, see [`DeviceId`])
    pub id: DeviceId,

    /// Human-readable device name
    pub name: String,

    /// Channel count of the input stream configuration
    pub input_channels: u32,

    /// Channel count of the output stream configuration
    pub output_channels: u32,
}

impl AudioDevice {
    /// Whether this device can appear in the list for `direction`.
    pub fn supports(&self, direction: Direction) -> bool {
        match direction {
            Direction::Input => self.input_channels > 0,
            Direction::Output => self.output_channels > 0,
        }
    }
}

/// One row of a published device list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    /// Hardware handle
    pub id: DeviceId,

    /// Human-readable device name
    pub name: String,

    /// Whether this device is the current default for the list's direction
    pub is_active: bool,
}

/// Published state, replaced wholesale on every refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Output-capable devices, at most one entry active
    pub output_devices: Vec<DeviceEntry>,

    /// Input-capable devices, at most one entry active
    pub input_devices: Vec<DeviceEntry>,

    /// Virtual main volume of the default output device (0.0 to 1.0)
    pub volume: f32,
}

impl Snapshot {
    /// The active entry of the list for `direction`, if any.
    pub fn active(&self, direction: Direction) -> Option<&DeviceEntry> {
        let list = match direction {
            Direction::Input => &self.input_devices,
            Direction::Output => &self.output_devices,
        };
        list.iter().find(|e| e.is_active)
    }
}

/// Events from the hardware service change notifications.
///
/// Listener callbacks fire on an arbitrary thread and only send one of
/// these; the owner thread performs the actual refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The default output device changed
    DefaultDeviceChanged,

    /// The default output device's volume changed
    VolumeChanged,
}

/// Audio service error types.
///
/// None of these are fatal to the process: queries degrade to empty or
/// partial results, writes leave published state unchanged, and the next
/// refresh is the implicit retry.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio hardware query failed in {context} (status {status})")]
    Query {
        context: &'static str,
        status: OsStatus,
    },

    #[error("audio property write rejected in {context} (status {status})")]
    Write {
        context: &'static str,
        status: OsStatus,
    },

    #[error("device {id} is not {direction}-capable in the current enumeration")]
    StaleHandle { id: DeviceId, direction: Direction },

    #[error("no default {direction} device")]
    NoDefaultDevice { direction: Direction },

    #[error("device {id} exposes no scalar volume control")]
    VolumeUnavailable { id: DeviceId },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(input: u32, output: u32) -> AudioDevice {
        AudioDevice {
            id: 7,
            name: "USB Interface".to_string(),
            input_channels: input,
            output_channels: output,
        }
    }

    #[test]
    fn test_direction_support() {
        let mic = device(1, 0);
        assert!(mic.supports(Direction::Input));
        assert!(!mic.supports(Direction::Output));

        let duplex = device(2, 2);
        assert!(duplex.supports(Direction::Input));
        assert!(duplex.supports(Direction::Output));
    }

    #[test]
    fn test_snapshot_active_lookup() {
        let snapshot = Snapshot {
            output_devices: vec![
                DeviceEntry {
                    id: 1,
                    name: "Speakers".to_string(),
                    is_active: false,
                },
                DeviceEntry {
                    id: 2,
                    name: "Headphones".to_string(),
                    is_active: true,
                },
            ],
            input_devices: Vec::new(),
            volume: 0.5,
        };

        assert_eq!(snapshot.active(Direction::Output).map(|e| e.id), Some(2));
        assert!(snapshot.active(Direction::Input).is_none());
    }

    #[test]
    fn test_error_display_names_direction() {
        let err = AudioError::StaleHandle {
            id: 42,
            direction: Direction::Output,
        };
        assert!(err.to_string().contains("output"));
        assert!(err.to_string().contains("42"));
    }
}
