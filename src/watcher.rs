// Device snapshot/diff engine for plug-event detection
//
// The watcher keeps an ordered snapshot of all native handles. On every
// native device-list notification it re-snapshots, diffs against the
// previous snapshot with an ordered set difference, emits one event per
// portable id, and only then replaces the retained snapshot. Removal events
// are replayed from the ids cached in the previous snapshot: a departed
// handle can no longer answer uid queries. Addition events are derived
// fresh from the new snapshot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::backend::AudioBackend;
use crate::error::{DeviceError, Result};
use crate::identity::{encode_device_id, PortableDeviceId};
use crate::subscription::{BackendSubscription, CallbackHandle};
use crate::types::{DeviceDirection, PlugEvent};

/// Invoked once per portable id on device arrival or removal.
pub type PlugEventCallback = Box<dyn Fn(PlugEvent, &str) + Send + Sync>;

/// Ordered capture of all native handles present at one instant, plus the
/// portable ids each handle expanded to at capture time.
pub(crate) struct DeviceSnapshot<H> {
    /// Canonically sorted; the ordering exists only to make the set
    /// difference deterministic.
    handles: Vec<H>,
    ids: HashMap<H, Vec<PortableDeviceId>>,
}

pub(crate) fn capture_snapshot<B: AudioBackend>(backend: &B) -> DeviceSnapshot<B::Handle> {
    let mut handles = backend.list_handles();
    handles.sort_unstable();
    handles.dedup();

    let mut ids = HashMap::with_capacity(handles.len());
    for &handle in &handles {
        let mut handle_ids = Vec::new();
        for direction in DeviceDirection::ALL {
            if !backend.supports_direction(handle, direction) {
                continue;
            }
            // A handle that cannot produce an id for a direction simply
            // contributes nothing for that direction.
            if let Ok(id) = encode_device_id(backend, handle, direction) {
                handle_ids.push(id);
            }
        }
        ids.insert(handle, handle_ids);
    }

    DeviceSnapshot { handles, ids }
}

/// Elements of `a` not present in `b`. Both inputs must be sorted and
/// deduplicated; the merge walk is O(n).
pub(crate) fn sorted_difference<H: Copy + Ord>(a: &[H], b: &[H]) -> Vec<H> {
    let mut out = Vec::new();
    let mut rhs = b.iter().peekable();

    for &item in a {
        loop {
            match rhs.peek() {
                Some(&&other) if other < item => {
                    rhs.next();
                }
                Some(&&other) if other == item => break,
                _ => {
                    out.push(item);
                    break;
                }
            }
        }
    }
    out
}

/// Watcher state shared between the public handle and the native listener.
struct PlugWatcher<B: AudioBackend> {
    backend: Arc<B>,
    callback: PlugEventCallback,
    /// Guards the diff-and-replace critical section: native notifications
    /// may arrive concurrently, but each round must diff against a
    /// consistent prior snapshot.
    snapshot: Mutex<DeviceSnapshot<B::Handle>>,
    /// Present once registration succeeds; dropped (and thereby
    /// unregistered) when the last public handle goes away.
    subscription: Mutex<Option<BackendSubscription<B>>>,
}

impl<B: AudioBackend> PlugWatcher<B> {
    fn on_devices_changed(&self) {
        let mut retained = self.snapshot.lock().unwrap();
        let fresh = capture_snapshot(&*self.backend);

        let removed = sorted_difference(&retained.handles, &fresh.handles);
        let added = sorted_difference(&fresh.handles, &retained.handles);

        for handle in added {
            // Freshly derived ids; the new handle is live and answering.
            if let Some(ids) = fresh.ids.get(&handle) {
                for id in ids {
                    debug!(id, "device added");
                    (self.callback)(PlugEvent::Added, id);
                }
            }
        }
        for handle in removed {
            // Replayed from the previous snapshot; the handle is gone.
            if let Some(ids) = retained.ids.get(&handle) {
                for id in ids {
                    debug!(id, "device removed");
                    (self.callback)(PlugEvent::Removed, id);
                }
            }
        }

        // Replace only after every event for this round is out.
        *retained = fresh;
    }
}

/// Take the initial snapshot, register for device-list changes, and hand
/// ownership of the registration to the returned handle.
pub(crate) fn watch_plug_events<B: AudioBackend>(
    backend: Arc<B>,
    callback: PlugEventCallback,
) -> Result<CallbackHandle> {
    let watcher = Arc::new(PlugWatcher {
        backend: Arc::clone(&backend),
        callback,
        snapshot: Mutex::new(capture_snapshot(&*backend)),
        subscription: Mutex::new(None),
    });

    let weak = Arc::downgrade(&watcher);
    let subscription = BackendSubscription::register(backend, |b| {
        b.subscribe_device_list(Box::new(move || {
            if let Some(watcher) = weak.upgrade() {
                watcher.on_devices_changed();
            }
        }))
    })
    .map_err(|error| {
        warn!(%error, "plug-event registration rejected");
        DeviceError::OperationUnsupported
    })?;
    *watcher.subscription.lock().unwrap() = Some(subscription);

    debug!("watching device plug events");
    Ok(CallbackHandle::new(watcher))
}
