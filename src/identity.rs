// Portable device identity codec
//
// A portable device id is the only cross-call-stable device reference this
// crate hands out: `"<direction>/<uid>"`, where the uid is whatever
// platform-stable unique identifier the backend reports. Encoding reads the
// uid from the backend; decoding splits the string and resolves the uid back
// to a live handle through a process-wide, lock-guarded, append-only cache.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use crate::backend::AudioBackend;
use crate::error::{DeviceError, Result};
use crate::types::DeviceDirection;

/// A `"<direction>/<uid>"` device identity string.
pub type PortableDeviceId = String;

/// Encode a native handle plus direction into a portable id.
///
/// Fails with [`DeviceError::DeviceNotAvailable`] when the backend cannot
/// supply a unique identifier for the handle.
pub fn encode_device_id<B: AudioBackend>(
    backend: &B,
    handle: B::Handle,
    direction: DeviceDirection,
) -> Result<PortableDeviceId> {
    let uid = backend
        .device_uid(handle)
        .map_err(|_| DeviceError::DeviceNotAvailable)?;
    Ok(format!("{}/{}", direction.id_prefix(), uid))
}

/// Split a portable id into its direction and uid parts.
///
/// Decoding is deliberately lenient: the text before the first `/` selects
/// the direction, with `"input"` meaning input and anything else meaning
/// output. An id with no separator at all is compared whole against
/// `"input"` and its whole text doubles as the uid.
pub fn split_device_id(id: &str) -> (DeviceDirection, &str) {
    let (prefix, uid) = match id.split_once('/') {
        Some((prefix, uid)) => (prefix, uid),
        None => (id, id),
    };
    let direction = if prefix == "input" {
        DeviceDirection::Input
    } else {
        DeviceDirection::Output
    };
    (direction, uid)
}

/// Process-wide id-to-handle resolution cache.
///
/// Keyed by the full portable id string, append-only for the process
/// lifetime: entries are never invalidated when a device disappears, so a
/// stale entry resolves to a handle whose subsequent native calls fail with
/// [`DeviceError::DeviceNotAvailable`]. Lock-guarded because decode runs on
/// OS-owned notification threads as well as caller threads.
pub struct IdentityCache<H> {
    entries: Mutex<HashMap<PortableDeviceId, H>>,
}

impl<H: Copy> IdentityCache<H> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Decode a portable id into a live `(handle, direction)` pair.
    ///
    /// Fails with [`DeviceError::DeviceNotAvailable`] when the uid resolves
    /// to no device; native lookup failures propagate already classified.
    pub fn resolve<B: AudioBackend<Handle = H>>(
        &self,
        backend: &B,
        id: &str,
    ) -> Result<(H, DeviceDirection)> {
        let (direction, uid) = split_device_id(id);

        if let Some(handle) = self.entries.lock().unwrap().get(id) {
            return Ok((*handle, direction));
        }

        let handle = backend
            .handle_for_uid(uid)?
            .ok_or(DeviceError::DeviceNotAvailable)?;
        debug!(id, "cached device identity");
        self.entries.lock().unwrap().insert(id.to_string(), handle);
        Ok((handle, direction))
    }
}

impl<H: Copy> Default for IdentityCache<H> {
    fn default() -> Self {
        Self::new()
    }
}
