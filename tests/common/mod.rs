// Shared in-memory backend for integration tests
//
// `FakeBackend` implements the full platform collaborator surface over a
// mutable device table, and can fire its registered listeners the way a
// native notification thread would: mutate first, then invoke callbacks
// outside the state lock.

// Each test binary uses a different slice of the helpers.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use audio_endpoints::{
    AudioBackend, DefaultChangeListener, DeviceDirection, DeviceError, DeviceListListener,
    DeviceRole, ListenerToken, MuteListener, Result, Transport, VolumeRange,
};

type SharedMuteListener = Arc<dyn Fn(bool) + Send + Sync>;
type SharedDefaultListener = Arc<dyn Fn(DeviceDirection, u32) + Send + Sync>;
type SharedListListener = Arc<dyn Fn() + Send + Sync>;

enum FakeListener {
    Mute {
        device: u32,
        direction: DeviceDirection,
        callback: SharedMuteListener,
    },
    DefaultChange(SharedDefaultListener),
    DeviceList(SharedListListener),
}

#[derive(Clone)]
pub struct FakeDevice {
    pub uid: String,
    pub input: bool,
    pub output: bool,
    pub transport: Transport,
    pub jack_connected: Option<bool>,
    pub muted: bool,
    pub volume_scalar: f32,
    pub volume_decibels: f32,
    pub volume_step: u32,
    pub interface_name: String,
    pub endpoint_name: String,
    pub display_name: String,
    pub uid_readable: bool,
    pub volume_supported: bool,
}

impl FakeDevice {
    fn base(uid: &str) -> Self {
        Self {
            uid: uid.to_string(),
            input: false,
            output: false,
            transport: Transport::Usb,
            jack_connected: None,
            muted: false,
            volume_scalar: 0.5,
            volume_decibels: -20.0,
            volume_step: 8,
            interface_name: format!("Fake Audio/{uid}"),
            endpoint_name: String::new(),
            display_name: format!("Fake Device ({uid})"),
            uid_readable: true,
            volume_supported: true,
        }
    }

    pub fn input(uid: &str) -> Self {
        Self {
            input: true,
            ..Self::base(uid)
        }
    }

    pub fn output(uid: &str) -> Self {
        Self {
            output: true,
            ..Self::base(uid)
        }
    }

    pub fn duplex(uid: &str) -> Self {
        Self {
            input: true,
            output: true,
            ..Self::base(uid)
        }
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_jack(mut self, connected: bool) -> Self {
        self.jack_connected = Some(connected);
        self
    }

    pub fn with_endpoint_name(mut self, name: &str) -> Self {
        self.endpoint_name = name.to_string();
        self
    }

    pub fn unreadable_uid(mut self) -> Self {
        self.uid_readable = false;
        self
    }

    pub fn without_volume(mut self) -> Self {
        self.volume_supported = false;
        self
    }
}

#[derive(Default)]
struct FakeState {
    devices: BTreeMap<u32, FakeDevice>,
    defaults: HashMap<(DeviceDirection, DeviceRole), u32>,
    listeners: HashMap<ListenerToken, FakeListener>,
    next_token: ListenerToken,
    unsubscribed: Vec<ListenerToken>,
    reject_subscriptions: bool,
}

/// Cloneable handle to one shared fake audio subsystem.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a device without firing device-list listeners.
    pub fn add_device(&self, handle: u32, device: FakeDevice) {
        self.state.lock().unwrap().devices.insert(handle, device);
    }

    /// Insert a device and notify device-list listeners.
    pub fn plug(&self, handle: u32, device: FakeDevice) {
        self.add_device(handle, device);
        self.notify_device_list();
    }

    /// Remove a device and notify device-list listeners. The device answers
    /// no further queries, exactly like unplugged hardware.
    pub fn unplug(&self, handle: u32) {
        self.state.lock().unwrap().devices.remove(&handle);
        self.notify_device_list();
    }

    /// Fire device-list listeners without changing the device table.
    pub fn notify_device_list(&self) {
        let callbacks: Vec<SharedListListener> = {
            let state = self.state.lock().unwrap();
            state
                .listeners
                .values()
                .filter_map(|listener| match listener {
                    FakeListener::DeviceList(callback) => Some(Arc::clone(callback)),
                    _ => None,
                })
                .collect()
        };
        for callback in callbacks {
            callback();
        }
    }

    /// Change a device's mute state natively and notify its mute listeners.
    pub fn set_muted_native(&self, handle: u32, direction: DeviceDirection, muted: bool) {
        let callbacks = {
            let mut state = self.state.lock().unwrap();
            if let Some(device) = state.devices.get_mut(&handle) {
                device.muted = muted;
            }
            mute_listeners_for(&state, handle, direction)
        };
        for callback in callbacks {
            callback(muted);
        }
    }

    /// Change a default-device pointer natively and notify listeners.
    pub fn set_default_native(&self, direction: DeviceDirection, role: DeviceRole, handle: u32) {
        let callbacks: Vec<SharedDefaultListener> = {
            let mut state = self.state.lock().unwrap();
            state.defaults.insert((direction, role), handle);
            state
                .listeners
                .values()
                .filter_map(|listener| match listener {
                    FakeListener::DefaultChange(callback) => Some(Arc::clone(callback)),
                    _ => None,
                })
                .collect()
        };
        for callback in callbacks {
            callback(direction, handle);
        }
    }

    pub fn set_reject_subscriptions(&self, reject: bool) {
        self.state.lock().unwrap().reject_subscriptions = reject;
    }

    pub fn active_listener_count(&self) -> usize {
        self.state.lock().unwrap().listeners.len()
    }

    pub fn unsubscribe_count(&self) -> usize {
        self.state.lock().unwrap().unsubscribed.len()
    }

    fn subscribe(&self, listener: FakeListener) -> Result<ListenerToken> {
        let mut state = self.state.lock().unwrap();
        if state.reject_subscriptions {
            return Err(DeviceError::OperationUnsupported);
        }
        state.next_token += 1;
        let token = state.next_token;
        state.listeners.insert(token, listener);
        Ok(token)
    }

    fn with_device<T>(&self, handle: u32, read: impl FnOnce(&FakeDevice) -> T) -> Result<T> {
        let state = self.state.lock().unwrap();
        state
            .devices
            .get(&handle)
            .map(read)
            .ok_or(DeviceError::DeviceNotAvailable)
    }

    fn with_device_mut<T>(
        &self,
        handle: u32,
        write: impl FnOnce(&mut FakeDevice) -> T,
    ) -> Result<T> {
        let mut state = self.state.lock().unwrap();
        state
            .devices
            .get_mut(&handle)
            .map(write)
            .ok_or(DeviceError::DeviceNotAvailable)
    }

    fn with_volume<T>(&self, handle: u32, read: impl FnOnce(&FakeDevice) -> T) -> Result<T> {
        self.with_device(handle, |device| {
            if device.volume_supported {
                Ok(read(device))
            } else {
                Err(DeviceError::OperationUnsupported)
            }
        })?
    }

    fn with_volume_mut<T>(
        &self,
        handle: u32,
        write: impl FnOnce(&mut FakeDevice) -> T,
    ) -> Result<T> {
        self.with_device_mut(handle, |device| {
            if device.volume_supported {
                Ok(write(device))
            } else {
                Err(DeviceError::OperationUnsupported)
            }
        })?
    }
}

fn mute_listeners_for(
    state: &FakeState,
    handle: u32,
    direction: DeviceDirection,
) -> Vec<SharedMuteListener> {
    state
        .listeners
        .values()
        .filter_map(|listener| match listener {
            FakeListener::Mute {
                device,
                direction: listener_direction,
                callback,
            } if *device == handle && *listener_direction == direction => {
                Some(Arc::clone(callback))
            }
            _ => None,
        })
        .collect()
}

impl AudioBackend for FakeBackend {
    type Handle = u32;

    fn list_handles(&self) -> Vec<u32> {
        // Reversed on purpose: callers must not rely on enumeration order.
        self.state.lock().unwrap().devices.keys().rev().copied().collect()
    }

    fn supports_direction(&self, handle: u32, direction: DeviceDirection) -> bool {
        self.with_device(handle, |device| match direction {
            DeviceDirection::Input => device.input,
            DeviceDirection::Output => device.output,
        })
        .unwrap_or(false)
    }

    fn device_uid(&self, handle: u32) -> Result<String> {
        self.with_device(handle, |device| {
            if device.uid_readable {
                Ok(device.uid.clone())
            } else {
                Err(DeviceError::DeviceNotAvailable)
            }
        })?
    }

    fn handle_for_uid(&self, uid: &str) -> Result<Option<u32>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .devices
            .iter()
            .find(|(_, device)| device.uid == uid)
            .map(|(handle, _)| *handle))
    }

    fn interface_name(&self, handle: u32) -> Result<String> {
        self.with_device(handle, |device| device.interface_name.clone())
    }

    fn endpoint_name(&self, handle: u32, _direction: DeviceDirection) -> Result<String> {
        self.with_device(handle, |device| {
            if device.endpoint_name.is_empty() {
                Err(DeviceError::OperationUnsupported)
            } else {
                Ok(device.endpoint_name.clone())
            }
        })?
    }

    fn display_name(&self, handle: u32) -> Result<String> {
        self.with_device(handle, |device| device.display_name.clone())
    }

    fn transport(&self, handle: u32, _direction: DeviceDirection) -> Result<Transport> {
        self.with_device(handle, |device| device.transport)
    }

    fn jack_is_connected(&self, handle: u32, _direction: DeviceDirection) -> Option<bool> {
        self.with_device(handle, |device| device.jack_connected)
            .unwrap_or(None)
    }

    fn is_muted(&self, handle: u32, _direction: DeviceDirection) -> Result<bool> {
        self.with_device(handle, |device| device.muted)
    }

    fn set_muted(&self, handle: u32, direction: DeviceDirection, muted: bool) -> Result<()> {
        self.with_device_mut(handle, |device| device.muted = muted)?;
        // A successful native set produces the same notification a change
        // from outside the process would.
        let callbacks = {
            let state = self.state.lock().unwrap();
            mute_listeners_for(&state, handle, direction)
        };
        for callback in callbacks {
            callback(muted);
        }
        Ok(())
    }

    fn volume_scalar(&self, handle: u32, _direction: DeviceDirection) -> Result<f32> {
        self.with_volume(handle, |device| device.volume_scalar)
    }

    fn set_volume_scalar(&self, handle: u32, _direction: DeviceDirection, value: f32) -> Result<()> {
        self.with_volume_mut(handle, |device| device.volume_scalar = value)
    }

    fn volume_decibels(&self, handle: u32, _direction: DeviceDirection) -> Result<f32> {
        self.with_volume(handle, |device| device.volume_decibels)
    }

    fn set_volume_decibels(
        &self,
        handle: u32,
        _direction: DeviceDirection,
        decibels: f32,
    ) -> Result<()> {
        self.with_volume_mut(handle, |device| device.volume_decibels = decibels)
    }

    fn volume_step(&self, handle: u32, _direction: DeviceDirection) -> Result<u32> {
        self.with_volume(handle, |device| device.volume_step)
    }

    fn volume_step_up(&self, handle: u32, _direction: DeviceDirection) -> Result<()> {
        self.with_volume_mut(handle, |device| device.volume_step += 1)
    }

    fn volume_step_down(&self, handle: u32, _direction: DeviceDirection) -> Result<()> {
        self.with_volume_mut(handle, |device| {
            device.volume_step = device.volume_step.saturating_sub(1)
        })
    }

    fn volume_range(&self, handle: u32, _direction: DeviceDirection) -> Result<VolumeRange> {
        self.with_volume(handle, |_| VolumeRange {
            min_decibels: -96.0,
            max_decibels: 0.0,
            increment_decibels: 1.5,
            volume_steps: 64,
        })
    }

    fn default_device(&self, direction: DeviceDirection, role: DeviceRole) -> Result<u32> {
        self.state
            .lock()
            .unwrap()
            .defaults
            .get(&(direction, role))
            .copied()
            .ok_or(DeviceError::DeviceNotAvailable)
    }

    fn set_default_device(
        &self,
        direction: DeviceDirection,
        role: DeviceRole,
        handle: u32,
    ) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .defaults
            .insert((direction, role), handle);
        Ok(())
    }

    fn subscribe_mute(
        &self,
        handle: u32,
        direction: DeviceDirection,
        listener: MuteListener,
    ) -> Result<ListenerToken> {
        self.subscribe(FakeListener::Mute {
            device: handle,
            direction,
            callback: Arc::from(listener),
        })
    }

    fn subscribe_default_change(
        &self,
        listener: DefaultChangeListener<u32>,
    ) -> Result<ListenerToken> {
        self.subscribe(FakeListener::DefaultChange(Arc::from(listener)))
    }

    fn subscribe_device_list(&self, listener: DeviceListListener) -> Result<ListenerToken> {
        self.subscribe(FakeListener::DeviceList(Arc::from(listener)))
    }

    fn unsubscribe(&self, token: ListenerToken) {
        let mut state = self.state.lock().unwrap();
        state.listeners.remove(&token);
        state.unsubscribed.push(token);
    }
}
