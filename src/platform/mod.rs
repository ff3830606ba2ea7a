// Platform-specific audio backends
//
// Each submodule adapts one OS audio subsystem to the `AudioBackend` trait.
// Only CoreAudio is currently implemented; on other platforms the portable
// core is still fully usable with a caller-supplied backend.

#[cfg(target_os = "macos")]
pub mod coreaudio;

#[cfg(target_os = "macos")]
pub use coreaudio::CoreAudioBackend;
