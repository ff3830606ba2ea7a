// Device connection state classification
//
// Derives a coarse state from native transport and jack-presence facts.
// Classification never fails outward: every failure path collapses to
// `DeviceNotPresent`, because callers use the state purely for display and
// filtering and should not be destabilized by one bad device.

use crate::backend::AudioBackend;
use crate::identity::IdentityCache;
use crate::types::{DeviceState, Transport};

/// Derive the connection state for a portable device id.
///
/// Built-in transports (internal speakers, internal microphone) always
/// classify as [`DeviceState::Connected`], even without a jack signal:
/// hardware with no jack sensor would otherwise flap between present and
/// absent. For everything else the jack sensor decides, and endpoints with
/// no sensor default to connected.
pub fn classify_device_state<B: AudioBackend>(
    backend: &B,
    identities: &IdentityCache<B::Handle>,
    id: &str,
) -> DeviceState {
    let Ok((handle, direction)) = identities.resolve(backend, id) else {
        return DeviceState::DeviceNotPresent;
    };

    // Platforms that track a device state natively win outright.
    if let Some(state) = backend.native_state(handle) {
        return state;
    }

    let Ok(transport) = backend.transport(handle, direction) else {
        return DeviceState::DeviceNotPresent;
    };

    if transport == Transport::BuiltIn {
        return DeviceState::Connected;
    }

    match backend.jack_is_connected(handle, direction) {
        Some(false) => DeviceState::DevicePresentNoConnection,
        Some(true) | None => DeviceState::Connected,
    }
}
