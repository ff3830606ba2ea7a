// High-level device management and public API
//
// `AudioDeviceManager` is the primary interface: it owns the backend and the
// process-wide identity cache, threads portable ids through the codec to
// reach native handles, and wraps every native outcome in the crate's
// `Result`. Nothing here persists between calls; all state is derived live
// from the OS.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::AudioBackend;
use crate::enumeration::list_devices;
use crate::error::{DeviceError, Result};
use crate::identity::{encode_device_id, IdentityCache, PortableDeviceId};
use crate::state::classify_device_state;
use crate::subscription::{BackendSubscription, CallbackHandle};
use crate::types::{
    AudioDeviceInfo, DeviceDirection, DeviceRole, DeviceState, PlugEvent, Volume, VolumeRange,
};
use crate::watcher::watch_plug_events;

/// Cross-platform audio device manager with portable identity tracking.
///
/// Subscription callbacks registered through the manager run on an
/// unspecified OS-owned thread; see [`CallbackHandle`] for the lifecycle
/// contract.
pub struct AudioDeviceManager<B: AudioBackend> {
    backend: Arc<B>,
    identities: IdentityCache<B::Handle>,
}

impl<B: AudioBackend> std::fmt::Debug for AudioDeviceManager<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioDeviceManager").finish_non_exhaustive()
    }
}

impl<B: AudioBackend> AudioDeviceManager<B> {
    /// Create a manager over the given platform backend.
    pub fn with_backend(backend: B) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    /// Create a manager over a shared platform backend.
    pub fn from_arc(backend: Arc<B>) -> Self {
        Self {
            backend,
            identities: IdentityCache::new(),
        }
    }

    /// Enumerate all devices supporting `direction`, keyed by portable id.
    pub fn list_devices(
        &self,
        direction: DeviceDirection,
    ) -> BTreeMap<PortableDeviceId, AudioDeviceInfo> {
        list_devices(&*self.backend, &self.identities, direction)
    }

    /// Derive the connection state for a device id. Never fails: ids that
    /// no longer resolve classify as [`DeviceState::DeviceNotPresent`].
    pub fn device_state(&self, id: &str) -> DeviceState {
        classify_device_state(&*self.backend, &self.identities, id)
    }

    /// Portable id of the current OS-wide default device.
    pub fn default_device_id(
        &self,
        direction: DeviceDirection,
        role: DeviceRole,
    ) -> Result<PortableDeviceId> {
        let handle = self.backend.default_device(direction, role)?;
        encode_device_id(&*self.backend, handle, direction)
    }

    /// Point the OS-wide default-device pointer at `id`.
    ///
    /// An id whose encoded direction does not match `direction` is ignored.
    pub fn set_default_device_id(
        &self,
        direction: DeviceDirection,
        role: DeviceRole,
        id: &str,
    ) -> Result<()> {
        let (handle, id_direction) = self.identities.resolve(&*self.backend, id)?;
        if id_direction != direction {
            warn!(id, ?direction, "default-device id direction mismatch, ignoring");
            return Ok(());
        }
        self.backend.set_default_device(direction, role, handle)
    }

    pub fn is_muted(&self, id: &str) -> Result<bool> {
        let (handle, direction) = self.identities.resolve(&*self.backend, id)?;
        self.backend.is_muted(handle, direction)
    }

    pub fn mute(&self, id: &str) -> Result<()> {
        self.set_muted(id, true)
    }

    pub fn unmute(&self, id: &str) -> Result<()> {
        self.set_muted(id, false)
    }

    fn set_muted(&self, id: &str, muted: bool) -> Result<()> {
        let (handle, direction) = self.identities.resolve(&*self.backend, id)?;
        self.backend.set_muted(handle, direction, muted)
    }

    /// Read the device's current volume. The decibel and step readings are
    /// filled in only when the platform exposes them.
    pub fn volume(&self, id: &str) -> Result<Volume> {
        let (handle, direction) = self.identities.resolve(&*self.backend, id)?;
        Ok(Volume {
            is_muted: self.backend.is_muted(handle, direction)?,
            volume_scalar: self.backend.volume_scalar(handle, direction)?,
            volume_decibels: self.backend.volume_decibels(handle, direction).ok(),
            volume_step: self.backend.volume_step(handle, direction).ok(),
        })
    }

    pub fn volume_range(&self, id: &str) -> Result<VolumeRange> {
        let (handle, direction) = self.identities.resolve(&*self.backend, id)?;
        self.backend.volume_range(handle, direction)
    }

    /// Set the volume as a position in the native [0.0, 1.0] scalar range.
    pub fn set_volume_scalar(&self, id: &str, value: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&value) {
            return Err(DeviceError::OutOfRange);
        }
        let (handle, direction) = self.identities.resolve(&*self.backend, id)?;
        self.backend.set_volume_scalar(handle, direction, value)
    }

    /// Set the volume in decibels, validated against the device's reported
    /// range when one is available.
    pub fn set_volume_decibels(&self, id: &str, decibels: f32) -> Result<()> {
        let (handle, direction) = self.identities.resolve(&*self.backend, id)?;
        if let Ok(range) = self.backend.volume_range(handle, direction) {
            if !(range.min_decibels..=range.max_decibels).contains(&decibels) {
                return Err(DeviceError::OutOfRange);
            }
        }
        self.backend.set_volume_decibels(handle, direction, decibels)
    }

    /// Raise the volume by one native step.
    pub fn increase_volume(&self, id: &str) -> Result<()> {
        let (handle, direction) = self.identities.resolve(&*self.backend, id)?;
        self.backend.volume_step_up(handle, direction)
    }

    /// Lower the volume by one native step.
    pub fn decrease_volume(&self, id: &str) -> Result<()> {
        let (handle, direction) = self.identities.resolve(&*self.backend, id)?;
        self.backend.volume_step_down(handle, direction)
    }

    /// Subscribe to mute/unmute changes for one device.
    ///
    /// Fails with [`DeviceError::DeviceNotAvailable`] when the id no longer
    /// resolves and [`DeviceError::OperationUnsupported`] when the platform
    /// rejects the registration.
    pub fn subscribe_mute_change(
        &self,
        id: &str,
        callback: impl Fn(bool) + Send + Sync + 'static,
    ) -> Result<CallbackHandle> {
        let (handle, direction) = self.identities.resolve(&*self.backend, id)?;
        let subscription = BackendSubscription::register(Arc::clone(&self.backend), |b| {
            b.subscribe_mute(handle, direction, Box::new(callback))
        })
        .map_err(|_| DeviceError::OperationUnsupported)?;
        debug!(id, "subscribed to mute changes");
        Ok(CallbackHandle::new(Arc::new(subscription)))
    }

    /// Subscribe to OS-wide default-device changes.
    ///
    /// The callback receives the direction, the role, and the portable id of
    /// the new default device. Changes whose new device cannot produce an id
    /// are dropped silently.
    pub fn subscribe_default_device_change(
        &self,
        callback: impl Fn(DeviceDirection, DeviceRole, &str) + Send + Sync + 'static,
    ) -> Result<CallbackHandle> {
        let weak = Arc::downgrade(&self.backend);
        let subscription = BackendSubscription::register(Arc::clone(&self.backend), |b| {
            b.subscribe_default_change(Box::new(move |direction, handle| {
                let Some(backend) = weak.upgrade() else {
                    return;
                };
                if let Ok(id) = encode_device_id(&*backend, handle, direction) {
                    callback(direction, DeviceRole::Default, &id);
                }
            }))
        })
        .map_err(|_| DeviceError::OperationUnsupported)?;
        debug!("subscribed to default-device changes");
        Ok(CallbackHandle::new(Arc::new(subscription)))
    }

    /// Subscribe to device plug/unplug events.
    ///
    /// Takes the initial device snapshot immediately; each subsequent native
    /// device-list notification emits one event per affected portable id.
    pub fn subscribe_plug_events(
        &self,
        callback: impl Fn(PlugEvent, &str) + Send + Sync + 'static,
    ) -> Result<CallbackHandle> {
        watch_plug_events(Arc::clone(&self.backend), Box::new(callback))
    }
}

#[cfg(target_os = "macos")]
impl AudioDeviceManager<crate::platform::CoreAudioBackend> {
    /// Create a manager over the system CoreAudio backend.
    pub fn new() -> Self {
        Self::with_backend(crate::platform::CoreAudioBackend::new())
    }
}

#[cfg(target_os = "macos")]
impl Default for AudioDeviceManager<crate::platform::CoreAudioBackend> {
    fn default() -> Self {
        Self::new()
    }
}
