// Error taxonomy and native status classification
//
// Every fallible operation in this crate returns `Result<T, DeviceError>`.
// The four-value taxonomy is closed: backends translate whatever status
// vocabulary their OS speaks through `DeviceError::from_os_status`, and no
// other code path ever constructs an error from a native code. Callers must
// treat any error as final for that call; the crate performs no retries.

use thiserror::Error;

/// Convenience alias used by every fallible operation in this crate.
pub type Result<T> = std::result::Result<T, DeviceError>;

/// An opaque status code as reported by the native audio subsystem.
pub type OsStatus = i32;

/// Closed set of failures surfaced by device operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, serde::Serialize, serde::Deserialize)]
pub enum DeviceError {
    /// Unclassified native failure.
    #[error("unknown OS error")]
    Unknown,
    /// The handle or portable id no longer resolves to a device.
    #[error("device not available")]
    DeviceNotAvailable,
    /// The platform rejected the property or operation.
    #[error("operation not supported")]
    OperationUnsupported,
    /// A setter value was outside the accepted range.
    #[error("value out of range")]
    OutOfRange,
}

const fn fourcc(code: &[u8; 4]) -> OsStatus {
    i32::from_be_bytes(*code)
}

// CoreAudio reports errors as four-character codes. These are the only
// native values the crate recognizes by name.
const STATUS_BAD_DEVICE: OsStatus = fourcc(b"!dev");
const STATUS_BAD_OBJECT: OsStatus = fourcc(b"!obj");
const STATUS_UNSUPPORTED_OPERATION: OsStatus = fourcc(b"unop");
const STATUS_UNKNOWN_PROPERTY: OsStatus = fourcc(b"who?");

impl DeviceError {
    /// Classify a native status code into the closed error taxonomy.
    ///
    /// This is the single place native error vocabulary enters the crate:
    /// invalid device/object codes become [`DeviceError::DeviceNotAvailable`],
    /// unsupported operation/property codes become
    /// [`DeviceError::OperationUnsupported`], and everything else collapses to
    /// [`DeviceError::Unknown`].
    pub fn from_os_status(status: OsStatus) -> Self {
        match status {
            STATUS_BAD_DEVICE | STATUS_BAD_OBJECT => DeviceError::DeviceNotAvailable,
            STATUS_UNSUPPORTED_OPERATION | STATUS_UNKNOWN_PROPERTY => {
                DeviceError::OperationUnsupported
            }
            _ => DeviceError::Unknown,
        }
    }
}
