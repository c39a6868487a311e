//! gpsd binding.
//!
//! Talks the gpsd JSON protocol over TCP: send `?WATCH` once, then read one
//! JSON report per line and keep the `TPV` (time-position-velocity) ones.
//! gpsd has no permission model, so the capability never offers a
//! permission query and the permission state is always granted.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{
    AccuracyTier, Capability, LocationProvider, PermissionState, PlatformError, PositionOptions,
    RawReading, WatchItem, WatchStream, WATCH_CHANNEL_CAPACITY,
};

/// Default gpsd host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default gpsd port.
pub const DEFAULT_PORT: u16 = 2947;

const WATCH_COMMAND: &[u8] = b"?WATCH={\"enable\":true,\"json\":true};\n";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

type ReportLines = Lines<BufReader<TcpStream>>;

type FixCache = Arc<Mutex<Option<(Instant, RawReading)>>>;

/// Location provider backed by a gpsd daemon.
#[derive(Debug)]
pub struct GpsdProvider {
    addr: String,
    last_fix: FixCache,
}

impl GpsdProvider {
    /// Create a provider for the daemon at `host:port`.
    pub fn new(host: impl AsRef<str>, port: u16) -> Self {
        Self {
            addr: format!("{}:{port}", host.as_ref()),
            last_fix: FixCache::default(),
        }
    }

    /// The daemon address.
    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn read_one_fix(&self, accuracy: AccuracyTier) -> Result<RawReading, PlatformError> {
        let mut lines = connect(&self.addr).await.map_err(unavailable)?;
        loop {
            let line = lines
                .next_line()
                .await
                .map_err(unavailable)?
                .ok_or_else(|| PlatformError::PositionUnavailable("gpsd closed the connection".into()))?;

            match parse_report(&line, accuracy) {
                Some(Ok(reading)) => return Ok(reading),
                Some(Err(e)) => debug!(error = %e, "gpsd report without usable fix"),
                None => {}
            }
        }
    }
}

async fn connect(addr: &str) -> std::io::Result<ReportLines> {
    let mut stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
        .await
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "gpsd connect timed out"))??;
    stream.write_all(WATCH_COMMAND).await?;
    Ok(BufReader::new(stream).lines())
}

/// The cached fix, if it is no older than `maximum_age`.
fn cached_fix(cache: &FixCache, maximum_age: Duration) -> Option<RawReading> {
    if maximum_age.is_zero() {
        return None;
    }
    let guard = cache.lock().unwrap_or_else(PoisonError::into_inner);
    guard
        .as_ref()
        .filter(|(taken, _)| taken.elapsed() <= maximum_age)
        .map(|(_, reading)| *reading)
}

fn remember_fix(cache: &FixCache, reading: RawReading) {
    let mut guard = cache.lock().unwrap_or_else(PoisonError::into_inner);
    *guard = Some((Instant::now(), reading));
}

#[allow(clippy::needless_pass_by_value)]
fn unavailable(err: std::io::Error) -> PlatformError {
    PlatformError::PositionUnavailable(format!("gpsd: {err}"))
}

/// Parse one gpsd report line.
///
/// Returns `None` for reports that are not `TPV`. A `TPV` without the fix
/// quality the tier asks for yields `PositionUnavailable`. A missing error
/// estimate leaves `accuracy` as NaN so the watcher rejects the reading.
#[must_use]
pub fn parse_report(line: &str, accuracy: AccuracyTier) -> Option<Result<RawReading, PlatformError>> {
    let report: Value = serde_json::from_str(line).ok()?;
    if report.get("class").and_then(Value::as_str) != Some("TPV") {
        return None;
    }

    let mode = report.get("mode").and_then(Value::as_u64).unwrap_or(0);
    let required_mode = match accuracy {
        AccuracyTier::High => 3,
        AccuracyTier::Balanced | AccuracyTier::Low => 2,
    };
    if mode < required_mode {
        return Some(Err(PlatformError::PositionUnavailable(format!(
            "gpsd fix mode {mode}, need {required_mode}"
        ))));
    }

    let number = |key: &str| report.get(key).and_then(Value::as_f64);

    let (Some(latitude), Some(longitude)) = (number("lat"), number("lon")) else {
        return Some(Err(PlatformError::PositionUnavailable(
            "gpsd TPV report without coordinates".into(),
        )));
    };

    let accuracy = number("eph")
        .or_else(|| match (number("epx"), number("epy")) {
            (Some(x), Some(y)) => Some(x.max(y)),
            _ => None,
        })
        .unwrap_or(f64::NAN);

    let timestamp_ms = report
        .get("time")
        .and_then(Value::as_str)
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.timestamp_millis());

    Some(Ok(RawReading {
        latitude,
        longitude,
        accuracy,
        altitude: number("altHAE").or_else(|| number("alt")),
        heading: number("track"),
        speed: number("speed"),
        timestamp_ms,
    }))
}

#[async_trait]
impl LocationProvider for GpsdProvider {
    fn name(&self) -> &'static str {
        "gpsd"
    }

    async fn capability(&self) -> Capability {
        match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_)) => Capability::Available {
                permission_query: false,
            },
            Ok(Err(e)) => {
                info!(addr = %self.addr, error = %e, "gpsd not reachable");
                Capability::Unsupported
            }
            Err(_) => {
                info!(addr = %self.addr, "gpsd connect timed out");
                Capability::Unsupported
            }
        }
    }

    async fn permission_state(&self) -> PermissionState {
        PermissionState::Granted
    }

    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<RawReading, PlatformError> {
        if let Some(cached) = cached_fix(&self.last_fix, options.maximum_age) {
            debug!("serving cached gpsd fix");
            return Ok(cached);
        }

        let reading = tokio::time::timeout(options.timeout, self.read_one_fix(options.accuracy))
            .await
            .map_err(|_| PlatformError::Timeout)??;
        remember_fix(&self.last_fix, reading);
        Ok(reading)
    }

    async fn watch(&self, options: &PositionOptions) -> Result<WatchStream, PlatformError> {
        let (tx, rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);

        // A fresh enough fix is delivered before the daemon is contacted.
        if let Some(cached) = cached_fix(&self.last_fix, options.maximum_age) {
            debug!("starting gpsd watch from cached fix");
            // The channel is empty, so this only fails if the capacity is zero.
            let _ = tx.try_send(Ok(cached));
        }

        tokio::spawn(run_watch(
            self.addr.clone(),
            *options,
            Arc::clone(&self.last_fix),
            tx,
        ));

        Ok(rx)
    }
}

/// Forward reports until the receiver goes away, reconnecting on failure.
///
/// A `Timeout` item is sent when no usable fix arrives within
/// `options.timeout`; the clock restarts after every fix and every timeout.
async fn run_watch(
    addr: String,
    options: PositionOptions,
    last_fix: FixCache,
    tx: mpsc::Sender<WatchItem>,
) {
    let mut last_error: Option<PlatformError> = None;

    loop {
        let failure = match connect(&addr).await {
            Ok(mut lines) => {
                info!(addr = %addr, "gpsd watch connected");
                let mut deadline = tokio::time::Instant::now() + options.timeout;
                loop {
                    let next = tokio::select! {
                        () = tx.closed() => {
                            debug!("gpsd watch receiver dropped");
                            return;
                        }
                        next = tokio::time::timeout_at(deadline, lines.next_line()) => next,
                    };

                    let item = match next {
                        Err(_) => {
                            deadline = tokio::time::Instant::now() + options.timeout;
                            Err(PlatformError::Timeout)
                        }
                        Ok(Ok(Some(line))) => match parse_report(&line, options.accuracy) {
                            Some(item) => item,
                            None => continue,
                        },
                        Ok(Ok(None)) => break unavailable_msg("gpsd closed the connection"),
                        Ok(Err(e)) => break unavailable(e),
                    };

                    // Only forward an error when it differs from the previous one.
                    match &item {
                        Err(e) => {
                            if last_error.as_ref() == Some(e) {
                                continue;
                            }
                            last_error = Some(e.clone());
                        }
                        Ok(reading) => {
                            last_error = None;
                            deadline = tokio::time::Instant::now() + options.timeout;
                            remember_fix(&last_fix, *reading);
                        }
                    }
                    if tx.send(item).await.is_err() {
                        debug!("gpsd watch receiver dropped");
                        return;
                    }
                }
            }
            Err(e) => unavailable(e),
        };

        warn!(addr = %addr, error = %failure, "gpsd watch interrupted, reconnecting");
        if tx.send(Err(failure)).await.is_err() {
            return;
        }
        last_error = None;

        tokio::select! {
            () = tokio::time::sleep(RECONNECT_DELAY) => {}
            () = tx.closed() => return,
        }
    }
}

fn unavailable_msg(message: &str) -> PlatformError {
    PlatformError::PositionUnavailable(message.to_string())
}
