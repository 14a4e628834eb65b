//! Scripted host for the behavioral tests.
//!
//! State lives behind an `Arc<Mutex<_>>` so a test keeps a handle to it
//! after boxing the host, and can flip failure switches or rewrite the
//! device table between operations.

use super::device::{AudioDevice, AudioError, DeviceId, Direction, HostEvent};
use super::host::{AudioHost, ChangeSubscription};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub(crate) struct MockState {
    pub devices: Vec<AudioDevice>,
    pub default_output: DeviceId,
    pub default_input: DeviceId,
    pub volume: f32,
    pub fail_enumeration: bool,
    pub fail_switch: bool,
    pub fail_volume_read: bool,
    pub fail_volume_write: bool,
    pub retarget_count: usize,
}

pub(crate) struct MockHost {
    pub state: Arc<Mutex<MockState>>,
}

impl MockHost {
    pub fn new(state: MockState) -> (Self, Arc<Mutex<MockState>>) {
        let state = Arc::new(Mutex::new(state));
        (
            Self {
                state: state.clone(),
            },
            state,
        )
    }
}

impl AudioHost for MockHost {
    fn list_devices(&self) -> Result<Vec<AudioDevice>, AudioError> {
        let state = self.state.lock().unwrap();
        if state.fail_enumeration {
            return Err(AudioError::Query {
                context: "device list",
                status: -1,
            });
        }
        Ok(state.devices.clone())
    }

    fn default_device(&self, direction: Direction) -> DeviceId {
        let state = self.state.lock().unwrap();
        match direction {
            Direction::Output => state.default_output,
            Direction::Input => state.default_input,
        }
    }

    fn set_default_device(&self, id: DeviceId, direction: Direction) -> Result<(), AudioError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_switch {
            return Err(AudioError::Write {
                context: "set default device",
                status: -1,
            });
        }
        match direction {
            Direction::Output => state.default_output = id,
            Direction::Input => state.default_input = id,
        }
        Ok(())
    }

    fn volume(&self) -> Result<f32, AudioError> {
        let state = self.state.lock().unwrap();
        if state.fail_volume_read {
            return Err(AudioError::VolumeUnavailable {
                id: state.default_output,
            });
        }
        Ok(state.volume)
    }

    fn set_volume(&self, value: f32) -> Result<(), AudioError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_volume_write {
            return Err(AudioError::Write {
                context: "write output volume",
                status: -1,
            });
        }
        state.volume = value;
        Ok(())
    }

    fn subscribe(
        &self,
        _events: Sender<HostEvent>,
    ) -> Result<Box<dyn ChangeSubscription>, AudioError> {
        Ok(Box::new(MockSubscription {
            state: self.state.clone(),
        }))
    }
}

struct MockSubscription {
    state: Arc<Mutex<MockState>>,
}

impl ChangeSubscription for MockSubscription {
    fn retarget_volume(&mut self) {
        self.state.lock().unwrap().retarget_count += 1;
    }
}

/// Shorthand for building the device table.
pub(crate) fn device(id: DeviceId, name: &str, input: u32, output: u32) -> AudioDevice {
    AudioDevice {
        id,
        name: name.to_string(),
        input_channels: input,
        output_channels: output,
    }
}
