// ── Connection monitor ──
//
// Receives transport callbacks and folds every inbound frame into the
// device cache. Runs on the transport's task, concurrently with callers
// blocked in cache waits, so nothing in here may fail loudly: a bad frame
// is logged and dropped.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jellyfish_api::protocol::{self, Inbound};
use jellyfish_api::{Error as ApiError, FrameListener, Pattern, PatternConfig, ZoneState};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::signal::TimedSignal;
use crate::store::DeviceCache;

/// Transport listener that keeps a [`DeviceCache`] in sync with the
/// controller and tracks whether the link is up.
#[derive(Debug)]
pub struct ConnectionMonitor {
    address: String,
    cache: Arc<DeviceCache>,
    connected: TimedSignal,
    closed: TimedSignal,
    last_error: Mutex<Option<String>>,
}

impl ConnectionMonitor {
    pub fn new(address: impl Into<String>, cache: Arc<DeviceCache>) -> Self {
        Self {
            address: address.into(),
            cache,
            connected: TimedSignal::new(),
            closed: TimedSignal::new(),
            last_error: Mutex::new(None),
        }
    }

    pub fn cache(&self) -> &Arc<DeviceCache> {
        &self.cache
    }

    pub fn is_connected(&self) -> bool {
        self.connected.is_set()
    }

    /// Wait for the transport to report the link open. Returns early with
    /// `false` if the transport reports a close after `since`, which is how
    /// a refused connection surfaces.
    pub async fn await_connection(&self, since: Instant, timeout: Duration) -> bool {
        tokio::select! {
            opened = self.connected.wait(timeout, None) => opened,
            _ = self.closed.wait(timeout, Some(since)) => self.connected.is_set(),
        }
    }

    /// Most recent transport error, if any was reported since the last open.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    fn apply(&self, inbound: Inbound) {
        let cache = &self.cache;
        match inbound {
            Inbound::Name(name) => cache.name.set_single(name),
            Inbound::Hostname(hostname) => cache.hostname.set_single(hostname),
            Inbound::Version(version) => cache.firmware_version.set_single(version),
            Inbound::TimeConfig(config) => cache.time_config.set_single(config),
            Inbound::Zones(zones) => {
                let removed = cache.zone_configs.replace_all(zones);
                if !removed.is_empty() {
                    debug!(zones = ?removed, "zones removed by controller");
                }
            }
            Inbound::PatternList(patterns) => {
                let removed = cache
                    .patterns
                    .replace_all(patterns.into_iter().map(|p| (p.key(), p)));
                if !removed.is_empty() {
                    debug!(patterns = ?removed, "patterns removed by controller");
                }
            }
            Inbound::ZoneState(state) => self.apply_zone_state(state),
            Inbound::PatternConfig { pattern, config } => self.apply_pattern_config(pattern, config),
            Inbound::PatternDeleted(pattern) => {
                let key = pattern.key();
                cache.patterns.delete(&key);
                if !pattern.is_folder() {
                    cache.pattern_configs.delete(&key);
                }
                debug!(pattern = %key, "pattern deleted");
            }
            Inbound::Schedule { kind, events } => {
                debug!(%kind, events = events.len(), "schedule updated");
                cache.schedule(kind).set_single(events);
            }
        }
    }

    /// One state frame may cover several zones; each zone gets its own copy.
    fn apply_zone_state(&self, state: ZoneState) {
        let entries: Vec<(String, ZoneState)> = state
            .zone_name
            .iter()
            .map(|zone| {
                let per_zone = ZoneState {
                    zone_name: vec![zone.clone()],
                    ..state.clone()
                };
                (zone.clone(), per_zone)
            })
            .collect();
        self.cache.zone_states.set_many(entries);
    }

    fn apply_pattern_config(&self, pattern: Pattern, config: Option<PatternConfig>) {
        if pattern.is_folder() {
            return;
        }
        let key = pattern.key();
        let Some(config) = config else {
            debug!(pattern = %key, "pattern data without a configuration");
            return;
        };
        self.cache.pattern_configs.set(&key, config);
        if !self.cache.patterns.contains_key(&key) {
            self.cache.patterns.set(&key, pattern);
        }
    }
}

// ── Transport callbacks ──────────────────────────────────────────────

impl FrameListener for ConnectionMonitor {
    fn on_open(&self) {
        info!(address = %self.address, "connected to controller");
        self.last_error.lock().take();
        self.connected.set();
    }

    fn on_close(&self, code: Option<u16>, reason: &str) {
        info!(address = %self.address, ?code, reason, "connection closed");
        self.connected.clear();
        self.closed.trigger();
    }

    fn on_message(&self, frame: &str) {
        debug!(len = frame.len(), "frame received");
        match protocol::decode(frame) {
            Ok(Some(inbound)) => self.apply(inbound),
            Ok(None) => debug!(frame, "ignoring unrecognized frame"),
            Err(e) => warn!(error = %e, frame, "dropping malformed frame"),
        }
    }

    fn on_error(&self, err: &ApiError) {
        error!(address = %self.address, error = %err, "transport error");
        *self.last_error.lock() = Some(err.to_string());
    }
}

// ── Tests ────────────────────────────────────────────────────────────
