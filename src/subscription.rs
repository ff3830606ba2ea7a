// Callback handle lifecycle
//
// All three subscription kinds (mute/unmute, default-device change,
// plug/unplug) share one contract: the handle exclusively owns the native
// registration token, handles may be cloned so several owners keep one
// subscription alive, and the last owner's drop tears the registration down
// synchronously, exactly once. Teardown failures are swallowed by the
// backend; there is nothing a destructor can do about them.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::backend::{AudioBackend, ListenerToken};
use crate::error::Result;

/// Shared-ownership handle for an active subscription.
///
/// Dropping the last clone unregisters the native subscription. Callbacks
/// run on an unspecified OS-owned thread, not the thread that created the
/// handle, and are never invoked once unregistration has begun. Re-entering
/// the subscribing API from inside a callback is not guaranteed safe.
#[derive(Clone)]
pub struct CallbackHandle {
    _inner: Arc<dyn Any + Send + Sync>,
}

impl CallbackHandle {
    pub(crate) fn new(inner: Arc<dyn Any + Send + Sync>) -> Self {
        Self { _inner: inner }
    }
}

impl fmt::Debug for CallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackHandle").finish_non_exhaustive()
    }
}

/// Owns one backend listener registration and tears it down on drop.
pub(crate) struct BackendSubscription<B: AudioBackend> {
    backend: Arc<B>,
    token: ListenerToken,
}

impl<B: AudioBackend> BackendSubscription<B> {
    /// Run a registration call and take ownership of the resulting token.
    pub(crate) fn register(
        backend: Arc<B>,
        register: impl FnOnce(&B) -> Result<ListenerToken>,
    ) -> Result<Self> {
        let token = register(&backend)?;
        debug!(token, "registered native listener");
        Ok(Self { backend, token })
    }
}

impl<B: AudioBackend> Drop for BackendSubscription<B> {
    fn drop(&mut self) {
        // Runs once, at last-owner drop; the backend swallows native
        // teardown failures for devices that already disappeared.
        self.backend.unsubscribe(self.token);
        debug!(token = self.token, "unregistered native listener");
    }
}
