//! Scriptable location provider for tests and local development.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    Capability, LocationProvider, PermissionState, PlatformError, PositionOptions, RawReading,
    WatchItem, WatchStream, WATCH_CHANNEL_CAPACITY,
};

/// A provider whose answers are set by the test.
///
/// Readings pushed with [`MockLocationProvider::emit`] go to the most recent
/// watch subscription.
#[derive(Debug)]
pub struct MockLocationProvider {
    state: Mutex<MockState>,
}

#[derive(Debug)]
struct MockState {
    capability: Capability,
    permission: PermissionState,
    current: Result<RawReading, PlatformError>,
    watch_tx: Option<mpsc::Sender<WatchItem>>,
    watch_calls: usize,
}

impl Default for MockLocationProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLocationProvider {
    /// A provider that is available, granted, and has no fix yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                capability: Capability::Available {
                    permission_query: true,
                },
                permission: PermissionState::Granted,
                current: Err(PlatformError::PositionUnavailable("no mock fix set".into())),
                watch_tx: None,
                watch_calls: 0,
            }),
        }
    }

    /// A raw reading with the given coordinates and 5 m accuracy.
    #[must_use]
    pub const fn reading(latitude: f64, longitude: f64) -> RawReading {
        RawReading {
            latitude,
            longitude,
            accuracy: 5.0,
            altitude: None,
            heading: None,
            speed: None,
            timestamp_ms: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the capability reported to the service.
    pub fn set_capability(&self, capability: Capability) {
        self.lock().capability = capability;
    }

    /// Set the permission state.
    pub fn set_permission(&self, permission: PermissionState) {
        self.lock().permission = permission;
    }

    /// Set the answer for one-shot requests.
    pub fn set_current(&self, result: Result<RawReading, PlatformError>) {
        self.lock().current = result;
    }

    /// Deliver an item to the active watch subscription.
    ///
    /// Returns `false` if nobody is watching.
    pub async fn emit(&self, item: WatchItem) -> bool {
        let tx = self.lock().watch_tx.clone();
        match tx {
            Some(tx) => tx.send(item).await.is_ok(),
            None => false,
        }
    }

    /// Whether a watch subscription is open on the other end.
    #[must_use]
    pub fn is_watched(&self) -> bool {
        self.lock()
            .watch_tx
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// How many times `watch` has been called.
    #[must_use]
    pub fn watch_calls(&self) -> usize {
        self.lock().watch_calls
    }
}

#[async_trait]
impl LocationProvider for MockLocationProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn capability(&self) -> Capability {
        self.lock().capability
    }

    async fn permission_state(&self) -> PermissionState {
        self.lock().permission
    }

    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<RawReading, PlatformError> {
        self.lock().current.clone()
    }

    async fn watch(&self, _options: &PositionOptions) -> Result<WatchStream, PlatformError> {
        let mut state = self.lock();
        if state.permission == PermissionState::Denied {
            return Err(PlatformError::PermissionDenied);
        }
        let (tx, rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);
        state.watch_tx = Some(tx);
        state.watch_calls += 1;
        Ok(rx)
    }
}
