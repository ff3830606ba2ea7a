// Device discovery and enumeration
//
// Builds fresh snapshot-time info records from the backend's raw handle
// list. Devices that cannot supply a uid or any usable name are skipped
// rather than failing the whole enumeration.

use std::collections::BTreeMap;

use tracing::debug;

use crate::backend::AudioBackend;
use crate::identity::{encode_device_id, IdentityCache, PortableDeviceId};
use crate::state::classify_device_state;
use crate::types::{AudioDeviceInfo, DeviceDirection};

/// Enumerate all devices supporting the given direction, keyed by portable id.
///
/// The native device list always contains both directions; filtering happens
/// here, per handle. Records are created fresh on every call and never cached.
pub fn list_devices<B: AudioBackend>(
    backend: &B,
    identities: &IdentityCache<B::Handle>,
    direction: DeviceDirection,
) -> BTreeMap<PortableDeviceId, AudioDeviceInfo> {
    let mut out = BTreeMap::new();

    for handle in backend.list_handles() {
        if !backend.supports_direction(handle, direction) {
            continue;
        }

        let Ok(id) = encode_device_id(backend, handle, direction) else {
            debug!(?handle, "skipping device without a stable uid");
            continue;
        };

        let Ok(interface_name) = backend.interface_name(handle) else {
            debug!(id, "skipping device without an interface name");
            continue;
        };

        // Prefer the endpoint-level name for display; fall back to the
        // device-level name, leaving the endpoint field empty.
        let (endpoint_name, display_name) = match backend.endpoint_name(handle, direction) {
            Ok(name) if !name.is_empty() => (name.clone(), name),
            _ => {
                let Ok(name) = backend.display_name(handle) else {
                    debug!(id, "skipping device without a display name");
                    continue;
                };
                (String::new(), name)
            }
        };

        let state = classify_device_state(backend, identities, &id);

        out.insert(
            id.clone(),
            AudioDeviceInfo {
                id,
                interface_name,
                endpoint_name,
                display_name,
                direction,
                state,
            },
        );
    }

    out
}
