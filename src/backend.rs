// Platform collaborator interface
//
// Everything the crate needs from a native audio subsystem is expressed by
// the `AudioBackend` trait: enumeration, unique-id resolution, the mute and
// volume leaf getters/setters, default-device access, and property-change
// listener registration. The portable core never touches an OS API directly;
// it only ever sees handles, strings, and the closed error taxonomy.
//
// Listener callbacks are delivered on whatever thread the OS owns. A backend
// must never invoke a listener once `unsubscribe` for its token has begun.

use std::fmt::Debug;
use std::hash::Hash;

use crate::error::Result;
use crate::types::{DeviceDirection, DeviceRole, DeviceState, Transport, VolumeRange};

/// Identifies one active listener registration within a backend.
pub type ListenerToken = u64;

/// Invoked with the new mute state after a mute/unmute property change.
pub type MuteListener = Box<dyn Fn(bool) + Send + Sync>;

/// Invoked with the direction and the new default device handle after an
/// OS-wide default-device change.
pub type DefaultChangeListener<H> = Box<dyn Fn(DeviceDirection, H) + Send + Sync>;

/// Invoked after any change to the set of attached devices.
pub type DeviceListListener = Box<dyn Fn() + Send + Sync>;

/// Interface a native audio subsystem must honor.
///
/// `Handle` is the platform's opaque device reference. Handles are only
/// meaningful for the current device-present session; the stable identity is
/// the uid string exposed by [`AudioBackend::device_uid`].
pub trait AudioBackend: Send + Sync + 'static {
    type Handle: Copy + Ord + Hash + Debug + Send + Sync + 'static;

    /// Current set of attached device handles, in no particular order.
    fn list_handles(&self) -> Vec<Self::Handle>;

    /// Whether the device exposes any stream in the given direction.
    fn supports_direction(&self, handle: Self::Handle, direction: DeviceDirection) -> bool;

    /// Platform-stable unique identifier for the physical device.
    fn device_uid(&self, handle: Self::Handle) -> Result<String>;

    /// Resolve a uid back to a live handle. `Ok(None)` means the platform
    /// answered but the uid maps to no device.
    fn handle_for_uid(&self, uid: &str) -> Result<Option<Self::Handle>>;

    /// Hardware/vendor string for the device.
    fn interface_name(&self, handle: Self::Handle) -> Result<String>;

    /// Port/jack label for one direction of the device, when the platform
    /// has one.
    fn endpoint_name(&self, handle: Self::Handle, direction: DeviceDirection) -> Result<String>;

    /// Human-readable device name.
    fn display_name(&self, handle: Self::Handle) -> Result<String>;

    /// Connection technology for one direction of the device.
    fn transport(&self, handle: Self::Handle, direction: DeviceDirection) -> Result<Transport>;

    /// Jack-presence signal, when the hardware has a jack sensor. `None`
    /// means no sensor exists for this endpoint.
    fn jack_is_connected(&self, handle: Self::Handle, direction: DeviceDirection) -> Option<bool>;

    /// Connection state reported directly by the platform, for platforms
    /// that track one natively. Backends without a native notion return
    /// `None` and the portable classifier derives the state instead.
    fn native_state(&self, _handle: Self::Handle) -> Option<DeviceState> {
        None
    }

    fn is_muted(&self, handle: Self::Handle, direction: DeviceDirection) -> Result<bool>;
    fn set_muted(
        &self,
        handle: Self::Handle,
        direction: DeviceDirection,
        muted: bool,
    ) -> Result<()>;

    fn volume_scalar(&self, handle: Self::Handle, direction: DeviceDirection) -> Result<f32>;
    fn set_volume_scalar(
        &self,
        handle: Self::Handle,
        direction: DeviceDirection,
        value: f32,
    ) -> Result<()>;
    fn volume_decibels(&self, handle: Self::Handle, direction: DeviceDirection) -> Result<f32>;
    fn set_volume_decibels(
        &self,
        handle: Self::Handle,
        direction: DeviceDirection,
        decibels: f32,
    ) -> Result<()>;
    /// Current step index of the device's volume control; the step count is
    /// part of [`AudioBackend::volume_range`].
    fn volume_step(&self, handle: Self::Handle, direction: DeviceDirection) -> Result<u32>;
    fn volume_step_up(&self, handle: Self::Handle, direction: DeviceDirection) -> Result<()>;
    fn volume_step_down(&self, handle: Self::Handle, direction: DeviceDirection) -> Result<()>;
    fn volume_range(
        &self,
        handle: Self::Handle,
        direction: DeviceDirection,
    ) -> Result<VolumeRange>;

    fn default_device(&self, direction: DeviceDirection, role: DeviceRole)
        -> Result<Self::Handle>;
    fn set_default_device(
        &self,
        direction: DeviceDirection,
        role: DeviceRole,
        handle: Self::Handle,
    ) -> Result<()>;

    /// Register for mute/unmute changes on one device endpoint.
    fn subscribe_mute(
        &self,
        handle: Self::Handle,
        direction: DeviceDirection,
        listener: MuteListener,
    ) -> Result<ListenerToken>;

    /// Register for OS-wide default-device changes in both directions.
    fn subscribe_default_change(
        &self,
        listener: DefaultChangeListener<Self::Handle>,
    ) -> Result<ListenerToken>;

    /// Register for changes to the set of attached devices.
    fn subscribe_device_list(&self, listener: DeviceListListener) -> Result<ListenerToken>;

    /// Tear down a registration. Must be safe to call while the underlying
    /// device is gone, must swallow native failures, and must guarantee the
    /// listener is not invoked once teardown has begun.
    fn unsubscribe(&self, token: ListenerToken);
}
