// Core device types and enums for audio device management
//
// This module contains the fundamental data structures shared by the
// identity codec, the enumeration layer, and the plug-event watcher:
// directions, roles, connection states, transports, and the snapshot-time
// device info record.

/// Logical direction of a device endpoint.
///
/// A single physical device may support both directions at once; each
/// direction yields its own portable identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceDirection {
    Input,
    Output,
}

impl DeviceDirection {
    pub const ALL: [DeviceDirection; 2] = [DeviceDirection::Input, DeviceDirection::Output];

    /// Prefix used in the canonical `"<direction>/<uid>"` portable id form.
    pub fn id_prefix(self) -> &'static str {
        match self {
            DeviceDirection::Input => "input",
            DeviceDirection::Output => "output",
        }
    }
}

/// Which OS-wide default-device pointer an operation refers to.
///
/// Not part of device identity; only used when reading or writing defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceRole {
    Default,
    Communication,
}

/// Coarse connection state, derived on demand and never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DeviceState {
    Connected,
    /// e.g. a USB device that has been unplugged.
    DeviceNotPresent,
    DeviceDisabled,
    /// Device present, but nothing is plugged into it, e.g. a headphone
    /// jack with no headphones.
    DevicePresentNoConnection,
}

/// Connection technology reported by the OS for a device.
///
/// The state classifier only distinguishes [`Transport::BuiltIn`]; the other
/// variants mirror what platforms commonly report and are kept for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    BuiltIn,
    Usb,
    Bluetooth,
    Aggregate,
    Virtual,
    Other,
}

/// Device arrival/removal event kind emitted by the plug-event watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PlugEvent {
    Added,
    Removed,
}

/// Snapshot-time record for one device endpoint.
///
/// Created fresh on every enumeration call and never mutated; two records
/// are equal iff all fields are equal.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AudioDeviceInfo {
    /// Portable id in the canonical `"<direction>/<uid>"` form.
    pub id: String,
    /// Hardware/vendor string, e.g. "Generic USB Audio Device".
    pub interface_name: String,
    /// Port/jack label, e.g. "Speakers". May be empty when the platform
    /// has no endpoint-level name.
    pub endpoint_name: String,
    /// Combined human-readable string, e.g. "Generic USB Audio Device (Speakers)".
    pub display_name: String,
    pub direction: DeviceDirection,
    pub state: DeviceState,
}

/// Decibel range and stepping reported by a device's volume control.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VolumeRange {
    pub min_decibels: f32,
    pub max_decibels: f32,
    pub increment_decibels: f32,
    pub volume_steps: u32,
}

/// Point-in-time volume reading for a device endpoint.
///
/// Scalar volume is always available when the query succeeds; the decibel
/// and step readings are optional because not every platform exposes them.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Volume {
    pub is_muted: bool,
    /// Position in the native [0.0, 1.0] scalar range.
    pub volume_scalar: f32,
    pub volume_decibels: Option<f32>,
    /// Current step index; the step count is reported by [`VolumeRange`].
    pub volume_step: Option<u32>,
}
