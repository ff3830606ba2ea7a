// CoreAudio backend
//
// Adapts the CoreAudio HAL to the `AudioBackend` trait: property reads and
// writes through `AudioObjectGetPropertyData`/`SetPropertyData`, uid
// translation through `kAudioHardwarePropertyDeviceForUID`, and listener
// registration through `AudioObjectAddPropertyListener`. CoreAudio delivers
// property-change callbacks on its own notification thread.
//
// CoreAudio has no per-device master volume that is reliable across
// hardware, so the volume leaf operations report `OperationUnsupported`;
// mute, defaults, enumeration, and all listener kinds are fully wired.

use std::collections::HashMap;
use std::ffi::c_void;
use std::mem;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use core_foundation::base::TCFType;
use core_foundation::string::CFString;
use coreaudio_sys::{
    kAudioDevicePropertyDataSource, kAudioDevicePropertyDataSourceNameForIDCFString,
    kAudioDevicePropertyDeviceUID, kAudioDevicePropertyJackIsConnected, kAudioDevicePropertyMute,
    kAudioDevicePropertyModelUID, kAudioDevicePropertyScopeInput,
    kAudioDevicePropertyScopeOutput, kAudioDevicePropertyStreams,
    kAudioDevicePropertyTransportType, kAudioDeviceTransportTypeAggregate,
    kAudioDeviceTransportTypeBluetooth, kAudioDeviceTransportTypeBluetoothLE,
    kAudioDeviceTransportTypeBuiltIn, kAudioDeviceTransportTypeUSB,
    kAudioDeviceTransportTypeVirtual, kAudioHardwarePropertyDefaultInputDevice,
    kAudioHardwarePropertyDefaultOutputDevice, kAudioHardwarePropertyDeviceForUID,
    kAudioHardwarePropertyDevices, kAudioObjectPropertyElementMaster,
    kAudioObjectPropertyManufacturer, kAudioObjectPropertyName, kAudioObjectPropertyScopeGlobal,
    kAudioObjectSystemObject, AudioObjectAddPropertyListener, AudioObjectGetPropertyData,
    AudioObjectGetPropertyDataSize, AudioObjectHasProperty, AudioObjectID,
    AudioObjectPropertyAddress, AudioObjectPropertyScope, AudioObjectRemovePropertyListener,
    AudioObjectSetPropertyData, AudioValueTranslation, CFStringRef, OSStatus,
};
use tracing::{debug, warn};

use crate::backend::{
    AudioBackend, DefaultChangeListener, DeviceListListener, ListenerToken, MuteListener,
};
use crate::error::{DeviceError, Result};
use crate::types::{DeviceDirection, DeviceRole, Transport, VolumeRange};

fn property_address(
    selector: u32,
    scope: AudioObjectPropertyScope,
) -> AudioObjectPropertyAddress {
    AudioObjectPropertyAddress {
        mSelector: selector,
        mScope: scope,
        mElement: kAudioObjectPropertyElementMaster,
    }
}

fn direction_scope(direction: DeviceDirection) -> AudioObjectPropertyScope {
    match direction {
        DeviceDirection::Input => kAudioDevicePropertyScopeInput,
        DeviceDirection::Output => kAudioDevicePropertyScopeOutput,
    }
}

fn get_property<T>(object: AudioObjectID, address: AudioObjectPropertyAddress) -> Result<T> {
    let mut value = mem::MaybeUninit::<T>::uninit();
    let mut size = mem::size_of::<T>() as u32;
    let status = unsafe {
        AudioObjectGetPropertyData(
            object,
            &address,
            0,
            ptr::null(),
            &mut size,
            value.as_mut_ptr() as *mut c_void,
        )
    };
    if status != 0 {
        return Err(DeviceError::from_os_status(status));
    }
    Ok(unsafe { value.assume_init() })
}

fn get_string_property(object: AudioObjectID, address: AudioObjectPropertyAddress) -> Result<String> {
    let mut value: CFStringRef = ptr::null();
    let mut size = mem::size_of::<CFStringRef>() as u32;
    let status = unsafe {
        AudioObjectGetPropertyData(
            object,
            &address,
            0,
            ptr::null(),
            &mut size,
            &mut value as *mut CFStringRef as *mut c_void,
        )
    };
    if status != 0 {
        return Err(DeviceError::from_os_status(status));
    }
    if value.is_null() {
        return Err(DeviceError::OperationUnsupported);
    }
    // CoreAudio hands back a +1 reference.
    Ok(unsafe { CFString::wrap_under_create_rule(value.cast()) }.to_string())
}

fn set_property<T>(
    object: AudioObjectID,
    address: AudioObjectPropertyAddress,
    value: &T,
) -> Result<()> {
    let status = unsafe {
        AudioObjectSetPropertyData(
            object,
            &address,
            0,
            ptr::null(),
            mem::size_of::<T>() as u32,
            value as *const T as *const c_void,
        )
    };
    if status != 0 {
        return Err(DeviceError::from_os_status(status));
    }
    Ok(())
}

fn has_property(object: AudioObjectID, address: AudioObjectPropertyAddress) -> bool {
    unsafe { AudioObjectHasProperty(object, &address) != 0 }
}

/// Everything one native listener invocation needs, boxed and handed to
/// CoreAudio as the client-data pointer for the registration's lifetime.
enum ListenerContext {
    Mute {
        object: AudioObjectID,
        address: AudioObjectPropertyAddress,
        callback: MuteListener,
    },
    DefaultChange {
        direction: DeviceDirection,
        address: AudioObjectPropertyAddress,
        callback: Arc<dyn Fn(DeviceDirection, AudioObjectID) + Send + Sync>,
    },
    DeviceList {
        callback: DeviceListListener,
    },
}

unsafe extern "C" fn property_listener(
    _object: AudioObjectID,
    _address_count: u32,
    _addresses: *const AudioObjectPropertyAddress,
    client_data: *mut c_void,
) -> OSStatus {
    let context = &*(client_data as *const ListenerContext);
    match context {
        ListenerContext::Mute {
            object,
            address,
            callback,
        } => {
            if let Ok(value) = get_property::<u32>(*object, *address) {
                callback(value != 0);
            }
        }
        ListenerContext::DefaultChange {
            direction,
            address,
            callback,
        } => {
            if let Ok(handle) = get_property::<AudioObjectID>(kAudioObjectSystemObject, *address) {
                callback(*direction, handle);
            }
        }
        ListenerContext::DeviceList { callback } => callback(),
    }
    0
}

struct Registration {
    object: AudioObjectID,
    address: AudioObjectPropertyAddress,
    context: *mut ListenerContext,
}

// The context pointer targets a heap allocation whose contents are
// Send + Sync; the pointer itself only crosses threads inside the registry.
unsafe impl Send for Registration {}

impl Registration {
    fn add(
        object: AudioObjectID,
        address: AudioObjectPropertyAddress,
        context: Box<ListenerContext>,
    ) -> Result<Self> {
        let context = Box::into_raw(context);
        let status = unsafe {
            AudioObjectAddPropertyListener(
                object,
                &address,
                Some(property_listener),
                context as *mut c_void,
            )
        };
        if status != 0 {
            drop(unsafe { Box::from_raw(context) });
            return Err(DeviceError::from_os_status(status));
        }
        Ok(Self {
            object,
            address,
            context,
        })
    }

    fn remove(self) {
        let status = unsafe {
            AudioObjectRemovePropertyListener(
                self.object,
                &self.address,
                Some(property_listener),
                self.context as *mut c_void,
            )
        };
        if status != 0 {
            // Nothing to do about a failed teardown; the device may be gone.
            warn!(status, "failed to remove CoreAudio property listener");
        }
        drop(unsafe { Box::from_raw(self.context) });
    }
}

/// CoreAudio implementation of [`AudioBackend`].
pub struct CoreAudioBackend {
    listeners: Mutex<HashMap<ListenerToken, Vec<Registration>>>,
    next_token: AtomicU64,
}

impl CoreAudioBackend {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
        }
    }

    fn store_registrations(&self, registrations: Vec<Registration>) -> ListenerToken {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().unwrap().insert(token, registrations);
        token
    }

    fn default_device_address(direction: DeviceDirection) -> AudioObjectPropertyAddress {
        let selector = match direction {
            DeviceDirection::Input => kAudioHardwarePropertyDefaultInputDevice,
            DeviceDirection::Output => kAudioHardwarePropertyDefaultOutputDevice,
        };
        property_address(selector, kAudioObjectPropertyScopeGlobal)
    }
}

impl Default for CoreAudioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CoreAudioBackend {
    fn drop(&mut self) {
        let mut listeners = self.listeners.lock().unwrap();
        for (_, registrations) in listeners.drain() {
            for registration in registrations {
                registration.remove();
            }
        }
    }
}

impl AudioBackend for CoreAudioBackend {
    type Handle = AudioObjectID;

    fn list_handles(&self) -> Vec<AudioObjectID> {
        let address = property_address(kAudioHardwarePropertyDevices, kAudioObjectPropertyScopeGlobal);
        let mut size: u32 = 0;
        let status = unsafe {
            AudioObjectGetPropertyDataSize(
                kAudioObjectSystemObject,
                &address,
                0,
                ptr::null(),
                &mut size,
            )
        };
        if status != 0 || size == 0 {
            return Vec::new();
        }

        let count = size as usize / mem::size_of::<AudioObjectID>();
        let mut handles: Vec<AudioObjectID> = vec![0; count];
        let status = unsafe {
            AudioObjectGetPropertyData(
                kAudioObjectSystemObject,
                &address,
                0,
                ptr::null(),
                &mut size,
                handles.as_mut_ptr() as *mut c_void,
            )
        };
        if status != 0 {
            return Vec::new();
        }
        handles.truncate(size as usize / mem::size_of::<AudioObjectID>());
        handles
    }

    fn supports_direction(&self, handle: AudioObjectID, direction: DeviceDirection) -> bool {
        // No streams for a given scope means not a valid device for that
        // direction.
        let address = property_address(kAudioDevicePropertyStreams, direction_scope(direction));
        let mut size: u32 = 0;
        let status = unsafe {
            AudioObjectGetPropertyDataSize(handle, &address, 0, ptr::null(), &mut size)
        };
        status == 0 && size > 0
    }

    fn device_uid(&self, handle: AudioObjectID) -> Result<String> {
        get_string_property(
            handle,
            property_address(kAudioDevicePropertyDeviceUID, kAudioObjectPropertyScopeGlobal),
        )
    }

    fn handle_for_uid(&self, uid: &str) -> Result<Option<AudioObjectID>> {
        let cf_uid = CFString::new(uid);
        let mut uid_ref: CFStringRef = cf_uid.as_concrete_TypeRef().cast();
        let mut handle: AudioObjectID = 0;
        let mut translation = AudioValueTranslation {
            mInputData: &mut uid_ref as *mut CFStringRef as *mut c_void,
            mInputDataSize: mem::size_of::<CFStringRef>() as u32,
            mOutputData: &mut handle as *mut AudioObjectID as *mut c_void,
            mOutputDataSize: mem::size_of::<AudioObjectID>() as u32,
        };
        let address = property_address(
            kAudioHardwarePropertyDeviceForUID,
            kAudioObjectPropertyScopeGlobal,
        );
        let mut size = mem::size_of::<AudioValueTranslation>() as u32;
        let status = unsafe {
            AudioObjectGetPropertyData(
                kAudioObjectSystemObject,
                &address,
                0,
                ptr::null(),
                &mut size,
                &mut translation as *mut AudioValueTranslation as *mut c_void,
            )
        };
        if status != 0 {
            return Err(DeviceError::from_os_status(status));
        }
        Ok((handle != 0).then_some(handle))
    }

    fn interface_name(&self, handle: AudioObjectID) -> Result<String> {
        let manufacturer = get_string_property(
            handle,
            property_address(kAudioObjectPropertyManufacturer, kAudioObjectPropertyScopeGlobal),
        )?;
        let model = get_string_property(
            handle,
            property_address(kAudioDevicePropertyModelUID, kAudioObjectPropertyScopeGlobal),
        )?;
        Ok(format!("{manufacturer}/{model}"))
    }

    fn endpoint_name(&self, handle: AudioObjectID, direction: DeviceDirection) -> Result<String> {
        let scope = direction_scope(direction);
        let mut source: u32 =
            get_property(handle, property_address(kAudioDevicePropertyDataSource, scope))?;
        let mut name: CFStringRef = ptr::null();
        let mut translation = AudioValueTranslation {
            mInputData: &mut source as *mut u32 as *mut c_void,
            mInputDataSize: mem::size_of::<u32>() as u32,
            mOutputData: &mut name as *mut CFStringRef as *mut c_void,
            mOutputDataSize: mem::size_of::<CFStringRef>() as u32,
        };
        let address = property_address(kAudioDevicePropertyDataSourceNameForIDCFString, scope);
        let mut size = mem::size_of::<AudioValueTranslation>() as u32;
        let status = unsafe {
            AudioObjectGetPropertyData(
                handle,
                &address,
                0,
                ptr::null(),
                &mut size,
                &mut translation as *mut AudioValueTranslation as *mut c_void,
            )
        };
        if status != 0 {
            return Err(DeviceError::from_os_status(status));
        }
        if name.is_null() {
            return Err(DeviceError::OperationUnsupported);
        }
        Ok(unsafe { CFString::wrap_under_create_rule(name.cast()) }.to_string())
    }

    fn display_name(&self, handle: AudioObjectID) -> Result<String> {
        get_string_property(
            handle,
            property_address(kAudioObjectPropertyName, kAudioObjectPropertyScopeGlobal),
        )
    }

    fn transport(&self, handle: AudioObjectID, direction: DeviceDirection) -> Result<Transport> {
        let raw: u32 = get_property(
            handle,
            property_address(kAudioDevicePropertyTransportType, direction_scope(direction)),
        )?;
        Ok(match raw {
            t if t == kAudioDeviceTransportTypeBuiltIn => Transport::BuiltIn,
            t if t == kAudioDeviceTransportTypeUSB => Transport::Usb,
            t if t == kAudioDeviceTransportTypeBluetooth
                || t == kAudioDeviceTransportTypeBluetoothLE =>
            {
                Transport::Bluetooth
            }
            t if t == kAudioDeviceTransportTypeAggregate => Transport::Aggregate,
            t if t == kAudioDeviceTransportTypeVirtual => Transport::Virtual,
            _ => Transport::Other,
        })
    }

    fn jack_is_connected(&self, handle: AudioObjectID, direction: DeviceDirection) -> Option<bool> {
        let address = property_address(
            kAudioDevicePropertyJackIsConnected,
            direction_scope(direction),
        );
        if !has_property(handle, address) {
            return None;
        }
        Some(
            get_property::<u32>(handle, address)
                .map(|value| value != 0)
                .unwrap_or(false),
        )
    }

    fn is_muted(&self, handle: AudioObjectID, direction: DeviceDirection) -> Result<bool> {
        let value: u32 = get_property(
            handle,
            property_address(kAudioDevicePropertyMute, direction_scope(direction)),
        )?;
        Ok(value != 0)
    }

    fn set_muted(
        &self,
        handle: AudioObjectID,
        direction: DeviceDirection,
        muted: bool,
    ) -> Result<()> {
        let value: u32 = muted.into();
        let mut address =
            property_address(kAudioDevicePropertyMute, direction_scope(direction));
        address.mElement = 0;
        set_property(handle, address, &value)
    }

    fn volume_scalar(&self, _handle: AudioObjectID, _direction: DeviceDirection) -> Result<f32> {
        Err(DeviceError::OperationUnsupported)
    }

    fn set_volume_scalar(
        &self,
        _handle: AudioObjectID,
        _direction: DeviceDirection,
        _value: f32,
    ) -> Result<()> {
        Err(DeviceError::OperationUnsupported)
    }

    fn volume_decibels(&self, _handle: AudioObjectID, _direction: DeviceDirection) -> Result<f32> {
        Err(DeviceError::OperationUnsupported)
    }

    fn set_volume_decibels(
        &self,
        _handle: AudioObjectID,
        _direction: DeviceDirection,
        _decibels: f32,
    ) -> Result<()> {
        Err(DeviceError::OperationUnsupported)
    }

    fn volume_step(&self, _handle: AudioObjectID, _direction: DeviceDirection) -> Result<u32> {
        Err(DeviceError::OperationUnsupported)
    }

    fn volume_step_up(&self, _handle: AudioObjectID, _direction: DeviceDirection) -> Result<()> {
        Err(DeviceError::OperationUnsupported)
    }

    fn volume_step_down(&self, _handle: AudioObjectID, _direction: DeviceDirection) -> Result<()> {
        Err(DeviceError::OperationUnsupported)
    }

    fn volume_range(
        &self,
        _handle: AudioObjectID,
        _direction: DeviceDirection,
    ) -> Result<VolumeRange> {
        Err(DeviceError::OperationUnsupported)
    }

    fn default_device(
        &self,
        direction: DeviceDirection,
        role: DeviceRole,
    ) -> Result<AudioObjectID> {
        // CoreAudio has no communication role.
        if role != DeviceRole::Default {
            return Err(DeviceError::OperationUnsupported);
        }
        let handle: AudioObjectID =
            get_property(kAudioObjectSystemObject, Self::default_device_address(direction))?;
        if handle == 0 {
            return Err(DeviceError::DeviceNotAvailable);
        }
        Ok(handle)
    }

    fn set_default_device(
        &self,
        direction: DeviceDirection,
        role: DeviceRole,
        handle: AudioObjectID,
    ) -> Result<()> {
        if role != DeviceRole::Default {
            return Err(DeviceError::OperationUnsupported);
        }
        set_property(
            kAudioObjectSystemObject,
            Self::default_device_address(direction),
            &handle,
        )
    }

    fn subscribe_mute(
        &self,
        handle: AudioObjectID,
        direction: DeviceDirection,
        listener: MuteListener,
    ) -> Result<ListenerToken> {
        let address = property_address(kAudioDevicePropertyMute, direction_scope(direction));
        let registration = Registration::add(
            handle,
            address,
            Box::new(ListenerContext::Mute {
                object: handle,
                address,
                callback: listener,
            }),
        )?;
        debug!(device = handle, "registered mute listener");
        Ok(self.store_registrations(vec![registration]))
    }

    fn subscribe_default_change(
        &self,
        listener: DefaultChangeListener<AudioObjectID>,
    ) -> Result<ListenerToken> {
        let callback: Arc<dyn Fn(DeviceDirection, AudioObjectID) + Send + Sync> =
            Arc::from(listener);

        let mut registrations = Vec::with_capacity(2);
        for direction in DeviceDirection::ALL {
            let address = Self::default_device_address(direction);
            let registration = Registration::add(
                kAudioObjectSystemObject,
                address,
                Box::new(ListenerContext::DefaultChange {
                    direction,
                    address,
                    callback: Arc::clone(&callback),
                }),
            );
            match registration {
                Ok(registration) => registrations.push(registration),
                Err(error) => {
                    for registration in registrations {
                        registration.remove();
                    }
                    return Err(error);
                }
            }
        }
        debug!("registered default-device listeners");
        Ok(self.store_registrations(registrations))
    }

    fn subscribe_device_list(&self, listener: DeviceListListener) -> Result<ListenerToken> {
        let address =
            property_address(kAudioHardwarePropertyDevices, kAudioObjectPropertyScopeGlobal);
        let registration = Registration::add(
            kAudioObjectSystemObject,
            address,
            Box::new(ListenerContext::DeviceList { callback: listener }),
        )?;
        debug!("registered device-list listener");
        Ok(self.store_registrations(vec![registration]))
    }

    fn unsubscribe(&self, token: ListenerToken) {
        let registrations = self.listeners.lock().unwrap().remove(&token);
        match registrations {
            Some(registrations) => {
                for registration in registrations {
                    registration.remove();
                }
                debug!(token, "removed CoreAudio listeners");
            }
            None => warn!(token, "unsubscribe for unknown listener token"),
        }
    }
}
