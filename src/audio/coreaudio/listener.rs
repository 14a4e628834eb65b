//! Scoped property listener registration.
//!
//! The hardware service takes a free callback plus an opaque context
//! pointer; [`ListenerGuard`] owns both and deregisters on drop, so no
//! callback can fire after the subscription is gone.

use crate::audio::device::{HostEvent, OsStatus};
use coreaudio_sys::{
    AudioObjectAddPropertyListener, AudioObjectID, AudioObjectPropertyAddress,
    AudioObjectRemovePropertyListener,
};
use std::os::raw::c_void;
use std::sync::mpsc::Sender;
use tracing::warn;

/// Callback context handed to the hardware service as an opaque pointer.
struct ListenerCtx {
    events: Sender<HostEvent>,
    event: HostEvent,
}

/// Fires on an arbitrary hardware service thread. Only posts the event;
/// the owner thread runs the refresh.
unsafe extern "C" fn property_listener(
    _object: AudioObjectID,
    _address_count: u32,
    _addresses: *const AudioObjectPropertyAddress,
    client_data: *mut c_void,
) -> coreaudio_sys::OSStatus {
    let ctx = &*(client_data as *const ListenerCtx);
    let _ = ctx.events.send(ctx.event);
    0
}

/// A registered property listener, deregistered on drop.
pub(crate) struct ListenerGuard {
    object: AudioObjectID,
    address: AudioObjectPropertyAddress,
    ctx: *mut ListenerCtx,
}

impl ListenerGuard {
    /// Register `event` to be posted to `events` whenever `address` changes
    /// on `object`.
    pub(crate) fn register(
        object: AudioObjectID,
        address: AudioObjectPropertyAddress,
        events: Sender<HostEvent>,
        event: HostEvent,
    ) -> Result<Self, OsStatus> {
        let ctx = Box::into_raw(Box::new(ListenerCtx { events, event }));

        let status = unsafe {
            AudioObjectAddPropertyListener(
                object,
                &address,
                Some(property_listener),
                ctx as *mut c_void,
            )
        };

        if status != 0 {
            // Nothing was registered; reclaim the context.
            unsafe { drop(Box::from_raw(ctx)) };
            warn!(object, status, "failed to register property listener");
            return Err(status);
        }

        Ok(Self {
            object,
            address,
            ctx,
        })
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let status = unsafe {
            AudioObjectRemovePropertyListener(
                self.object,
                &self.address,
                Some(property_listener),
                self.ctx as *mut c_void,
            )
        };
        if status != 0 {
            warn!(
                object = self.object,
                status, "failed to deregister property listener"
            );
        }

        // After removal the hardware service no longer dispatches with the
        // context pointer, but the C API does not state that removal waits
        // for a callback already in flight on its dispatch queue. The
        // callback only posts on the channel sender held in the context, so
        // the exposure window is a single send; there is no fence the API
        // offers to close it.
        unsafe { drop(Box::from_raw(self.ctx)) };
    }
}
