//! Position watching, geofence evaluation and update fan-out.
//!
//! [`GeolocationService`] is the one object the rest of the application
//! talks to. Construct it once at start-up with
//! [`GeolocationService::initialize`] and share it by `Arc`.
//!
//! # Pipeline
//!
//! ```text
//! LocationProvider::watch ──► normalize ──► proximity::evaluate ──► subscribers
//!                                  │                 ▲
//!                         (malformed: logged)   GeofenceRegistry
//! ```
//!
//! Per-reading failures never stop the watch task. Subscriber failures are
//! logged and do not affect delivery to other subscribers.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{GeoError, Result};
use crate::geofence::GeofenceRegistry;
use crate::platform::{
    Capability, LocationProvider, PermissionState, PositionOptions, RawReading, WatchStream,
};
use crate::proximity;
use crate::types::{is_valid_latitude, is_valid_longitude, GeofenceRegion, LocationUpdate, Position};

/// Callback invoked with every location update.
pub type Subscriber = dyn Fn(&LocationUpdate) -> anyhow::Result<()> + Send + Sync;

/// Handle returned by [`GeolocationService::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A platform reading that cannot be turned into a [`Position`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed reading: {0}")]
pub struct MalformedReading(String);

/// Turn a raw platform reading into a [`Position`].
///
/// Non-finite optional fields (browsers report a NaN heading when
/// stationary) become `None`. A missing timestamp is stamped with now.
///
/// # Errors
///
/// Returns [`MalformedReading`] if the coordinates are out of range or the
/// accuracy is negative or not finite.
pub fn normalize_reading(raw: RawReading) -> std::result::Result<Position, MalformedReading> {
    if !is_valid_latitude(raw.latitude) {
        return Err(MalformedReading(format!("latitude {}", raw.latitude)));
    }
    if !is_valid_longitude(raw.longitude) {
        return Err(MalformedReading(format!("longitude {}", raw.longitude)));
    }
    if !raw.accuracy.is_finite() || raw.accuracy < 0.0 {
        return Err(MalformedReading(format!("accuracy {}", raw.accuracy)));
    }

    let timestamp = raw
        .timestamp_ms
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or_else(Utc::now);

    Ok(Position {
        latitude: raw.latitude,
        longitude: raw.longitude,
        accuracy: raw.accuracy,
        altitude: raw.altitude.filter(|v| v.is_finite()),
        heading: raw.heading.filter(|v| v.is_finite()),
        speed: raw.speed.filter(|v| v.is_finite()),
        timestamp,
    })
}

/// The shared geolocation service.
pub struct GeolocationService {
    provider: Arc<dyn LocationProvider>,
    capability: Capability,
    default_options: PositionOptions,
    shared: Arc<Shared>,
    watch_task: Mutex<Option<JoinHandle<()>>>,
}

/// State touched by both API calls and the watch task.
#[derive(Default)]
struct Shared {
    registry: RwLock<GeofenceRegistry>,
    subscribers: RwLock<Vec<(SubscriptionId, Arc<Subscriber>)>>,
    last_position: RwLock<Option<Position>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

impl Shared {
    fn emit(&self, position: Position) -> LocationUpdate {
        // Evaluate against the registry as it is right now so a region
        // removed earlier can never show up as triggered.
        let triggered = proximity::evaluate(&position, read(&self.registry).as_slice());
        *write(&self.last_position) = Some(position.clone());

        let update = LocationUpdate {
            position,
            triggered,
            generated_at: Utc::now(),
        };

        // Call outside the lock so callbacks may (un)subscribe.
        let subscribers = read(&self.subscribers).clone();
        for (id, callback) in subscribers {
            match catch_unwind(AssertUnwindSafe(|| callback(&update))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(subscription = %id, error = %e, "location subscriber failed"),
                Err(payload) => warn!(
                    subscription = %id,
                    error = panic_message(payload.as_ref()),
                    "location subscriber panicked"
                ),
            }
        }

        debug!(
            latitude = update.position.latitude,
            longitude = update.position.longitude,
            triggered = update.triggered.len(),
            "location update delivered"
        );
        update
    }
}

async fn run_watch(shared: Arc<Shared>, mut stream: WatchStream) {
    while let Some(item) = stream.recv().await {
        match item {
            Ok(raw) => match normalize_reading(raw) {
                Ok(position) => {
                    shared.emit(position);
                }
                Err(e) => warn!(error = %e, "dropping location reading"),
            },
            Err(e) => warn!(error = %e, "location provider reported an error, still listening"),
        }
    }
    info!("location watch stream ended");
}

impl GeolocationService {
    /// Build the service, probing the provider's capability once.
    pub async fn initialize(
        provider: Arc<dyn LocationProvider>,
        default_options: PositionOptions,
    ) -> Self {
        let capability = provider.capability().await;
        info!(provider = provider.name(), ?capability, "geolocation service initialized");

        Self {
            provider,
            capability,
            default_options,
            shared: Arc::new(Shared::default()),
            watch_task: Mutex::new(None),
        }
    }

    /// Capability detected at start-up.
    #[must_use]
    pub const fn capability(&self) -> Capability {
        self.capability
    }

    /// Options used when the caller has no preference.
    #[must_use]
    pub const fn default_options(&self) -> PositionOptions {
        self.default_options
    }

    /// Name of the underlying provider.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    async fn ensure_access(&self) -> Result<()> {
        if !self.capability.is_available() {
            return Err(GeoError::Unsupported);
        }
        if self.capability.supports_permission_query()
            && self.provider.permission_state().await == PermissionState::Denied
        {
            return Err(GeoError::PermissionDenied);
        }
        Ok(())
    }

    // =========================================================================
    // WATCH LIFECYCLE
    // =========================================================================

    /// Start continuous watching. A no-op while already running.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Unsupported`] if the host has no location
    /// capability and [`GeoError::PermissionDenied`] if access was refused.
    pub async fn start(&self, options: PositionOptions) -> Result<()> {
        let mut task = self.watch_task.lock().await;
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("location watch already running");
            return Ok(());
        }

        self.ensure_access().await?;
        let stream = self.provider.watch(&options).await?;
        *task = Some(tokio::spawn(run_watch(Arc::clone(&self.shared), stream)));

        info!(provider = self.provider.name(), accuracy = ?options.accuracy, "location watch started");
        Ok(())
    }

    /// Stop continuous watching. Safe to call when not running.
    pub async fn stop(&self) {
        if let Some(handle) = self.watch_task.lock().await.take() {
            handle.abort();
            info!("location watch stopped");
        }
    }

    /// Whether the watch task is alive.
    pub async fn is_running(&self) -> bool {
        self.watch_task
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Request a single position fix.
    ///
    /// Updates the last-known position but does not notify subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::PermissionDenied`], [`GeoError::Unsupported`],
    /// [`GeoError::PositionUnavailable`] or [`GeoError::Timeout`].
    pub async fn get_current_position(&self, options: PositionOptions) -> Result<Position> {
        self.ensure_access().await?;
        let raw = self.provider.current_position(&options).await?;
        let position =
            normalize_reading(raw).map_err(|e| GeoError::PositionUnavailable(e.to_string()))?;
        *write(&self.shared.last_position) = Some(position.clone());
        Ok(position)
    }

    /// The most recent accepted position, if any.
    #[must_use]
    pub fn last_position(&self) -> Option<Position> {
        read(&self.shared.last_position).clone()
    }

    /// Evaluate `position` against the registry and deliver the update to
    /// every subscriber. The watch task calls this for each reading.
    pub fn emit(&self, position: Position) -> LocationUpdate {
        self.shared.emit(position)
    }

    // =========================================================================
    // SUBSCRIPTIONS
    // =========================================================================

    /// Register a callback for location updates.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&LocationUpdate) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        let callback: Arc<Subscriber> = Arc::new(callback);
        write(&self.shared.subscribers).push((id, callback));
        debug!(subscription = %id, "location subscriber added");
        id
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = write(&self.shared.subscribers);
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        let removed = subscribers.len() != before;
        if removed {
            debug!(subscription = %id, "location subscriber removed");
        }
        removed
    }

    /// Number of active subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        read(&self.shared.subscribers).len()
    }

    // =========================================================================
    // GEOFENCES
    // =========================================================================

    /// Insert or replace a region by id.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidRegion`] if the region fails validation.
    pub fn add_region(&self, region: GeofenceRegion) -> Result<Option<GeofenceRegion>> {
        let id = region.id.clone();
        let replaced = write(&self.shared.registry).add(region)?;
        debug!(region = %id, replaced = replaced.is_some(), "geofence registered");
        Ok(replaced)
    }

    /// Remove a region by id.
    pub fn remove_region(&self, id: &str) -> Option<GeofenceRegion> {
        write(&self.shared.registry).remove(id)
    }

    /// Remove every region.
    pub fn clear_regions(&self) {
        write(&self.shared.registry).clear();
    }

    /// Snapshot of the registered regions.
    #[must_use]
    pub fn list_regions(&self) -> Vec<GeofenceRegion> {
        read(&self.shared.registry).list()
    }

    /// Regions the given position falls inside, without notifying anyone.
    #[must_use]
    pub fn evaluate(&self, position: &Position) -> Vec<GeofenceRegion> {
        proximity::evaluate(position, read(&self.shared.registry).as_slice())
    }
}

impl Drop for GeolocationService {
    fn drop(&mut self) {
        if let Some(handle) = self.watch_task.get_mut().take() {
            handle.abort();
        }
    }
}

impl fmt::Debug for GeolocationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeolocationService")
            .field("provider", &self.provider.name())
            .field("capability", &self.capability)
            .field("default_options", &self.default_options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockLocationProvider;
    use crate::platform::PlatformError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    const SF_LAT: f64 = 37.7749;
    const SF_LON: f64 = -122.4194;

    async fn service_with(mock: &Arc<MockLocationProvider>) -> GeolocationService {
        let provider: Arc<dyn LocationProvider> = Arc::clone(mock) as Arc<dyn LocationProvider>;
        GeolocationService::initialize(provider, PositionOptions::default()).await
    }

    fn channel_subscriber(
        service: &GeolocationService,
    ) -> (SubscriptionId, mpsc::UnboundedReceiver<LocationUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = service.subscribe(move |update| {
            tx.send(update.clone())?;
            Ok(())
        });
        (id, rx)
    }

    async fn next_update(rx: &mut mpsc::UnboundedReceiver<LocationUpdate>) -> LocationUpdate {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for update")
            .expect("subscriber channel closed")
    }

    fn position_at(latitude: f64, longitude: f64) -> Position {
        normalize_reading(MockLocationProvider::reading(latitude, longitude)).unwrap()
    }

    // ---------------------------------------------------------------------
    // normalize_reading
    // ---------------------------------------------------------------------

    #[test]
    fn test_normalize_valid_reading() {
        let raw = RawReading {
            heading: Some(f64::NAN),
            speed: Some(2.0),
            timestamp_ms: Some(1_736_911_800_000),
            ..MockLocationProvider::reading(SF_LAT, SF_LON)
        };
        let position = normalize_reading(raw).unwrap();
        assert_eq!(position.heading, None);
        assert_eq!(position.speed, Some(2.0));
        assert_eq!(position.timestamp_millis(), 1_736_911_800_000);
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        let base = MockLocationProvider::reading(SF_LAT, SF_LON);
        for raw in [
            RawReading { latitude: 91.0, ..base },
            RawReading { longitude: f64::NAN, ..base },
            RawReading { accuracy: -1.0, ..base },
            RawReading { accuracy: f64::INFINITY, ..base },
        ] {
            assert!(normalize_reading(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    // ---------------------------------------------------------------------
    // start / stop
    // ---------------------------------------------------------------------

    #[tokio::test]
    async fn test_start_unsupported() {
        let mock = Arc::new(MockLocationProvider::new());
        mock.set_capability(Capability::Unsupported);
        let service = service_with(&mock).await;

        let err = service.start(PositionOptions::default()).await.unwrap_err();
        assert!(matches!(err, GeoError::Unsupported));
        assert!(!service.is_running().await);
        assert_eq!(mock.watch_calls(), 0);
    }

    #[tokio::test]
    async fn test_start_permission_denied() {
        let mock = Arc::new(MockLocationProvider::new());
        mock.set_permission(PermissionState::Denied);
        let service = service_with(&mock).await;

        let err = service.start(PositionOptions::default()).await.unwrap_err();
        assert!(matches!(err, GeoError::PermissionDenied));
        assert_eq!(mock.watch_calls(), 0);
    }

    #[tokio::test]
    async fn test_start_denied_by_platform_without_permission_query() {
        let mock = Arc::new(MockLocationProvider::new());
        mock.set_capability(Capability::Available {
            permission_query: false,
        });
        mock.set_permission(PermissionState::Denied);
        let service = service_with(&mock).await;

        // No up-front query, so the refusal surfaces from the watch request.
        let err = service.start(PositionOptions::default()).await.unwrap_err();
        assert!(matches!(err, GeoError::PermissionDenied));
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let mock = Arc::new(MockLocationProvider::new());
        let service = service_with(&mock).await;

        service.start(PositionOptions::default()).await.unwrap();
        service.start(PositionOptions::default()).await.unwrap();

        assert!(service.is_running().await);
        assert_eq!(mock.watch_calls(), 1);
    }

    #[tokio::test]
    async fn test_stop_and_restart() {
        let mock = Arc::new(MockLocationProvider::new());
        let service = service_with(&mock).await;

        service.stop().await;
        service.start(PositionOptions::default()).await.unwrap();
        service.stop().await;
        assert!(!service.is_running().await);
        service.stop().await;

        service.start(PositionOptions::default()).await.unwrap();
        assert_eq!(mock.watch_calls(), 2);
    }

    // ---------------------------------------------------------------------
    // watch pipeline
    // ---------------------------------------------------------------------

    #[tokio::test]
    async fn test_watch_reading_reaches_subscriber_with_triggered_regions() {
        let mock = Arc::new(MockLocationProvider::new());
        let service = service_with(&mock).await;
        service
            .add_region(GeofenceRegion::new("home", SF_LAT, SF_LON, 100.0))
            .unwrap();
        service
            .add_region(GeofenceRegion::new("office", 40.7128, -74.0060, 100.0))
            .unwrap();
        let (_id, mut rx) = channel_subscriber(&service);

        service.start(PositionOptions::default()).await.unwrap();
        assert!(mock.emit(Ok(MockLocationProvider::reading(SF_LAT, SF_LON))).await);

        let update = next_update(&mut rx).await;
        assert_eq!(update.triggered_ids(), vec!["home"]);
        assert_eq!(service.last_position(), Some(update.position));
    }

    #[tokio::test]
    async fn test_watch_survives_malformed_readings_and_errors() {
        let mock = Arc::new(MockLocationProvider::new());
        let service = service_with(&mock).await;
        let (_id, mut rx) = channel_subscriber(&service);
        service.start(PositionOptions::default()).await.unwrap();

        mock.emit(Ok(MockLocationProvider::reading(f64::NAN, 0.0))).await;
        mock.emit(Err(PlatformError::PositionUnavailable("tunnel".into())))
            .await;
        mock.emit(Err(PlatformError::Timeout)).await;
        mock.emit(Ok(MockLocationProvider::reading(1.0, 2.0))).await;

        let update = next_update(&mut rx).await;
        assert_eq!(update.position.latitude, 1.0);
        assert!(service.is_running().await);
    }

    #[tokio::test]
    async fn test_stop_closes_the_platform_subscription() {
        let mock = Arc::new(MockLocationProvider::new());
        let service = service_with(&mock).await;
        service.start(PositionOptions::default()).await.unwrap();
        assert!(mock.is_watched());

        service.stop().await;
        tokio::time::timeout(Duration::from_secs(5), async {
            while mock.is_watched() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("watch receiver should be dropped after stop");
    }

    // ---------------------------------------------------------------------
    // fan-out
    // ---------------------------------------------------------------------

    #[tokio::test]
    async fn test_unsubscribed_callback_is_not_invoked() {
        let service = service_with(&Arc::new(MockLocationProvider::new())).await;

        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let first_id = {
            let first = Arc::clone(&first);
            service.subscribe(move |_| {
                first.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        };
        {
            let second = Arc::clone(&second);
            service.subscribe(move |_| {
                second.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        assert!(service.unsubscribe(first_id));
        assert!(!service.unsubscribe(first_id));
        service.emit(position_at(SF_LAT, SF_LON));

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(service.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_subscriber_does_not_block_others() {
        let service = service_with(&Arc::new(MockLocationProvider::new())).await;
        service.subscribe(|_| anyhow::bail!("subscriber exploded"));
        let (_id, mut rx) = channel_subscriber(&service);

        service.emit(position_at(SF_LAT, SF_LON));
        let update = next_update(&mut rx).await;
        assert_eq!(update.position.latitude, SF_LAT);
    }

    #[tokio::test]
    async fn test_panicking_subscriber_does_not_stop_the_watch() {
        let mock = Arc::new(MockLocationProvider::new());
        let service = service_with(&mock).await;
        service.subscribe(|_| panic!("subscriber bug"));
        let (_id, mut rx) = channel_subscriber(&service);

        service.start(PositionOptions::default()).await.unwrap();
        assert!(mock.emit(Ok(MockLocationProvider::reading(1.0, 2.0))).await);
        assert!(mock.emit(Ok(MockLocationProvider::reading(3.0, 4.0))).await);

        assert_eq!(next_update(&mut rx).await.position.latitude, 1.0);
        assert_eq!(next_update(&mut rx).await.position.latitude, 3.0);
        assert!(service.is_running().await);
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "non-string panic payload");
    }

    #[tokio::test]
    async fn test_subscriber_may_unsubscribe_itself() {
        let service = Arc::new(service_with(&Arc::new(MockLocationProvider::new())).await);
        let calls = Arc::new(AtomicUsize::new(0));
        let slot: Arc<std::sync::Mutex<Option<SubscriptionId>>> = Arc::default();

        let id = {
            let weak = Arc::downgrade(&service);
            let calls = Arc::clone(&calls);
            let slot = Arc::clone(&slot);
            service.subscribe(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                if let (Some(service), Some(id)) = (weak.upgrade(), *slot.lock().unwrap()) {
                    service.unsubscribe(id);
                }
                Ok(())
            })
        };
        *slot.lock().unwrap() = Some(id);

        service.emit(position_at(0.0, 0.0));
        service.emit(position_at(0.0, 0.0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_removed_region_is_never_triggered() {
        let service = service_with(&Arc::new(MockLocationProvider::new())).await;
        service
            .add_region(GeofenceRegion::new("home", SF_LAT, SF_LON, 100.0))
            .unwrap();
        assert_eq!(service.remove_region("home").map(|r| r.id), Some("home".into()));

        let update = service.emit(position_at(SF_LAT, SF_LON));
        assert!(update.triggered.is_empty());
    }

    #[tokio::test]
    async fn test_region_operations() {
        let service = service_with(&Arc::new(MockLocationProvider::new())).await;
        service
            .add_region(GeofenceRegion::new("a", SF_LAT, SF_LON, 50.0))
            .unwrap();
        service
            .add_region(GeofenceRegion::new("b", SF_LAT, SF_LON, 5000.0))
            .unwrap();
        assert!(service
            .add_region(GeofenceRegion::new("bad", SF_LAT, SF_LON, 0.0))
            .is_err());

        assert_eq!(service.list_regions().len(), 2);
        assert_eq!(service.evaluate(&position_at(SF_LAT, SF_LON)).len(), 2);

        service.clear_regions();
        assert!(service.list_regions().is_empty());
    }

    // ---------------------------------------------------------------------
    // one-shot
    // ---------------------------------------------------------------------

    #[tokio::test]
    async fn test_get_current_position() {
        let mock = Arc::new(MockLocationProvider::new());
        mock.set_current(Ok(MockLocationProvider::reading(SF_LAT, SF_LON)));
        let service = service_with(&mock).await;
        let (_id, mut rx) = channel_subscriber(&service);

        let position = service
            .get_current_position(PositionOptions::default())
            .await
            .unwrap();
        assert_eq!(position.latitude, SF_LAT);
        assert_eq!(service.last_position(), Some(position));
        assert!(rx.try_recv().is_err(), "one-shot must not fan out");
    }

    #[tokio::test]
    async fn test_get_current_position_errors() {
        let mock = Arc::new(MockLocationProvider::new());
        let service = service_with(&mock).await;

        mock.set_current(Err(PlatformError::Timeout));
        assert!(matches!(
            service.get_current_position(PositionOptions::default()).await,
            Err(GeoError::Timeout)
        ));

        mock.set_current(Err(PlatformError::PositionUnavailable("cold".into())));
        assert!(matches!(
            service.get_current_position(PositionOptions::default()).await,
            Err(GeoError::PositionUnavailable(_))
        ));

        mock.set_current(Ok(MockLocationProvider::reading(123.0, 0.0)));
        assert!(matches!(
            service.get_current_position(PositionOptions::default()).await,
            Err(GeoError::PositionUnavailable(_))
        ));

        mock.set_permission(PermissionState::Denied);
        assert!(matches!(
            service.get_current_position(PositionOptions::default()).await,
            Err(GeoError::PermissionDenied)
        ));
        assert_eq!(service.last_position(), None);
    }
}
