// Portable identity, enumeration, and hot-plug tracking for system audio
// devices.
//
// This crate presents a single platform-independent view of the audio
// devices attached to a machine through a modular architecture with clear
// separation of concerns:
// - error: closed error taxonomy and native status classification
// - types: directions, roles, states, transports, info and volume records
// - backend: the interface a native audio subsystem must honor
// - identity: the `"<direction>/<uid>"` portable id codec and lookup cache
// - state: derived connection-state classification
// - enumeration: snapshot-time device info records
// - watcher: snapshot/diff engine behind plug-event subscriptions
// - subscription: shared callback handles with exactly-once teardown
// - devices: high-level public API and orchestration
// - platform: per-OS backend implementations (macOS CoreAudio)

pub mod backend;
pub mod devices;
pub mod enumeration;
pub mod error;
pub mod identity;
pub mod platform;
pub mod state;
pub mod subscription;
pub mod types;
mod watcher;

// Re-export main public API
pub use devices::AudioDeviceManager;

// Re-export core types
pub use backend::{
    AudioBackend, DefaultChangeListener, DeviceListListener, ListenerToken, MuteListener,
};
pub use error::{DeviceError, OsStatus, Result};
pub use identity::{encode_device_id, split_device_id, IdentityCache, PortableDeviceId};
pub use state::classify_device_state;
pub use subscription::CallbackHandle;
pub use types::{
    AudioDeviceInfo, DeviceDirection, DeviceRole, DeviceState, PlugEvent, Transport, Volume,
    VolumeRange,
};
pub use watcher::PlugEventCallback;

#[cfg(target_os = "macos")]
pub use platform::CoreAudioBackend;
