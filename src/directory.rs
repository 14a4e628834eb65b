//! Device directory and switch controller.
//!
//! [`DeviceDirectory`] owns the published state: the classified device
//! lists with their active flags, and the output volume. All mutation
//! happens on the thread that owns the directory; hardware change
//! listeners only post [`HostEvent`]s through a channel the owner thread
//! drains.

use crate::audio::{
    AudioDevice, AudioError, AudioHost, ChangeSubscription, DeviceEntry, DeviceId, Direction,
    HostEvent, Snapshot,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, warn};

type Observer = Box<dyn FnMut(&Snapshot)>;

/// The audio device directory, switch controller, and volume controller.
///
/// The directory is deliberately not shareable across threads: published
/// state has a single owner thread, and everything else talks to it through
/// the event channel.
pub struct DeviceDirectory {
    host: Box<dyn AudioHost>,
    snapshot: Snapshot,
    observers: Vec<Observer>,
    subscription: Option<Box<dyn ChangeSubscription>>,
}

impl DeviceDirectory {
    /// Create a directory over `host` with empty published state. Call
    /// [`refresh`](Self::refresh) to populate it.
    pub fn new(host: Box<dyn AudioHost>) -> Self {
        Self {
            host,
            snapshot: Snapshot::default(),
            observers: Vec::new(),
            subscription: None,
        }
    }

    /// The currently published state.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Register an observer invoked on the owner thread after every
    /// publish.
    pub fn observe(&mut self, observer: impl FnMut(&Snapshot) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Register the hardware change listeners and return the channel the
    /// owner thread drains. The subscription is torn down when the
    /// directory is dropped.
    pub fn subscribe_changes(&mut self) -> Result<Receiver<HostEvent>, AudioError> {
        let (sender, receiver) = channel();
        self.subscription = Some(self.host.subscribe(sender)?);
        Ok(receiver)
    }

    /// Recompute the published state wholesale: re-enumerate, re-query both
    /// defaults, re-read the volume, and publish the fresh snapshot.
    ///
    /// Running this twice in a row yields the same state as running it
    /// once, which is what makes the switch-triggered refresh harmless when
    /// it races the notification-triggered one.
    pub fn refresh(&mut self) {
        let devices = match self.host.list_devices() {
            Ok(devices) => devices,
            Err(e) => {
                // Degrade to an empty directory; the next refresh retries.
                warn!(error = %e, "device enumeration failed");
                Vec::new()
            }
        };

        let default_output = self.host.default_device(Direction::Output);
        let default_input = self.host.default_device(Direction::Input);

        self.snapshot.output_devices = classify(&devices, Direction::Output, default_output);
        self.snapshot.input_devices = classify(&devices, Direction::Input, default_input);
        self.read_volume();
        self.publish();
    }

    /// Re-read the default output volume and publish.
    pub fn refresh_volume(&mut self) {
        self.read_volume();
        self.publish();
    }

    /// Make `id` the default device for `direction`.
    ///
    /// The target is validated against a fresh enumeration first: an id
    /// that is gone, or that has no channels in `direction`, fails as
    /// [`AudioError::StaleHandle`] with published state untouched. On a
    /// successful write the directory refreshes immediately; the hardware
    /// notification will trigger a second, idempotent refresh.
    pub fn switch_default(&mut self, id: DeviceId, direction: Direction) -> Result<(), AudioError> {
        let devices = self.host.list_devices()?;
        let known = devices
            .iter()
            .any(|d| d.id == id && d.supports(direction));
        if !known {
            return Err(AudioError::StaleHandle { id, direction });
        }

        self.host.set_default_device(id, direction)?;
        debug!(device = id, %direction, "switched default device");
        self.refresh();
        Ok(())
    }

    /// Set the default output device's volume, clamped to [0.0, 1.0].
    ///
    /// On a rejected write the hardware volume is re-read and republished,
    /// so the published value never reports an intent that did not take.
    pub fn set_volume(&mut self, value: f32) -> Result<(), AudioError> {
        let clamped = value.clamp(0.0, 1.0);

        match self.host.set_volume(clamped) {
            Ok(()) => {
                self.snapshot.volume = clamped;
                self.publish();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "volume write rejected; resynchronizing");
                self.refresh_volume();
                Err(e)
            }
        }
    }

    /// Handle one hardware change event on the owner thread.
    pub fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::DefaultDeviceChanged => {
                self.refresh();
                // The volume listener follows the new default output.
                if let Some(subscription) = &mut self.subscription {
                    subscription.retarget_volume();
                }
            }
            HostEvent::VolumeChanged => self.refresh_volume(),
        }
    }

    /// Drain change events until `stop` is set or the channel closes.
    pub fn run(&mut self, events: &Receiver<HostEvent>, stop: &AtomicBool) {
        while !stop.load(Ordering::Relaxed) {
            match events.recv_timeout(Duration::from_millis(200)) {
                Ok(event) => self.handle_event(event),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn read_volume(&mut self) {
        match self.host.volume() {
            Ok(volume) => self.snapshot.volume = volume,
            // Keep the previous published value; not every output device
            // exposes a scalar volume control.
            Err(e) => warn!(error = %e, "volume read failed"),
        }
    }

    fn publish(&mut self) {
        let snapshot = &self.snapshot;
        for observer in &mut self.observers {
            observer(snapshot);
        }
    }
}

/// Partition one direction's view of the device set, stamping the active
/// flag from the reported default. A `0` default marks nothing active.
fn classify(devices: &[AudioDevice], direction: Direction, default_id: DeviceId) -> Vec<DeviceEntry> {
    devices
        .iter()
        .filter(|d| d.supports(direction))
        .map(|d| DeviceEntry {
            id: d.id,
            name: d.name.clone(),
            is_active: default_id != 0 && d.id == default_id,
        })
        .collect()
}
