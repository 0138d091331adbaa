// ── Controller abstraction ──
//
// Request/response façade over the controller's push protocol. Every
// operation sends a frame and, when asked to, waits for the device cache
// to confirm the affected keys. The wait is anchored at an instant taken
// before the frame went out, so a reply that beats the waiter is not lost.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jellyfish_api::{
    Connector, FirmwareVersion, FrameListener, Pattern, PatternConfig, Query, Request, Rgb,
    ScheduleEvent, ScheduleKind, TimeConfig, Transport, WebSocketConnector, ZoneConfig, ZoneState,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::monitor::ConnectionMonitor;
use crate::store::{DeviceCache, KeyedCache, SINGLE_ENTRY_KEY};
use crate::validate;

type Result<T> = std::result::Result<T, CoreError>;

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ── RequestOptions ───────────────────────────────────────────────────

/// Per-call confirmation settings for mutating operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// Wait for the controller to confirm the change before returning.
    pub sync: bool,
    /// Confirmation budget. `None` uses [`ControllerConfig::timeout`].
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            sync: true,
            timeout: None,
        }
    }
}

impl RequestOptions {
    /// Send and return without waiting for confirmation.
    pub fn no_wait() -> Self {
        Self {
            sync: false,
            timeout: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            sync: true,
            timeout: Some(timeout),
        }
    }
}

// ── Controller ───────────────────────────────────────────────────────

/// Client for one JellyFish controller.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Plain accessors such as
/// [`zone_names`](Self::zone_names) are read-through: they answer from the
/// cache and fetch only when nothing is cached yet. `get_*` methods always
/// fetch.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    cache: Arc<DeviceCache>,
    monitor: Arc<ConnectionMonitor>,
    connector: Arc<dyn Connector>,
    transport: Mutex<Option<Box<dyn Transport>>>,
}

impl Controller {
    /// Create a controller that connects over WebSocket. Does NOT connect;
    /// call [`connect()`](Self::connect).
    pub fn new(config: ControllerConfig) -> Self {
        Self::with_connector(config, Arc::new(WebSocketConnector::new()))
    }

    /// Create a controller on a caller-supplied transport.
    pub fn with_connector(config: ControllerConfig, connector: Arc<dyn Connector>) -> Self {
        let cache = Arc::new(DeviceCache::new());
        let monitor = Arc::new(ConnectionMonitor::new(config.address(), Arc::clone(&cache)));
        Self {
            inner: Arc::new(ControllerInner {
                config,
                cache,
                monitor,
                connector,
                transport: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// The device cache behind this controller.
    pub fn cache(&self) -> &Arc<DeviceCache> {
        &self.inner.cache
    }

    pub fn is_connected(&self) -> bool {
        self.inner.monitor.is_connected()
    }

    fn timeout(&self, options: RequestOptions) -> Duration {
        options.timeout.unwrap_or(self.inner.config.timeout)
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Open the connection and wait up to `timeout` for it to come up.
    pub async fn connect(&self, timeout: Duration) -> Result<()> {
        let address = self.inner.config.address();
        let url = self.inner.config.url()?;

        let mut slot = self.inner.transport.lock().await;
        if slot.is_some() && self.is_connected() {
            debug!(%address, "already connected");
            return Ok(());
        }
        if let Some(stale) = slot.take() {
            if let Err(e) = stale.close(timeout).await {
                debug!(error = %e, "stale transport did not close cleanly");
            }
        }

        info!(%address, "connecting to controller");
        let since = Instant::now();
        let listener: Arc<dyn FrameListener> = self.inner.monitor.clone();
        let transport =
            self.inner
                .connector
                .open(&url, listener)
                .map_err(|e| CoreError::ConnectionFailed {
                    address: address.clone(),
                    reason: e.to_string(),
                })?;

        if !self.inner.monitor.await_connection(since, timeout).await {
            let reason = self
                .inner
                .monitor
                .last_error()
                .unwrap_or_else(|| format!("timed out after {}ms", millis(timeout)));
            if let Err(e) = transport.close(timeout).await {
                debug!(error = %e, "abandoned transport did not close cleanly");
            }
            warn!(%address, %reason, "connection failed");
            return Err(CoreError::ConnectionFailed { address, reason });
        }

        *slot = Some(transport);
        Ok(())
    }

    /// Close the connection, waiting up to `timeout` for the transport to
    /// shut down. A no-op when not connected.
    pub async fn disconnect(&self, timeout: Duration) -> Result<()> {
        let Some(transport) = self.inner.transport.lock().await.take() else {
            return Ok(());
        };
        transport
            .close(timeout)
            .await
            .map_err(|e| CoreError::ConnectionFailed {
                address: self.inner.config.address(),
                reason: e.to_string(),
            })?;
        info!(address = %self.inner.config.address(), "disconnected from controller");
        Ok(())
    }

    // ── Plumbing ─────────────────────────────────────────────────────

    async fn send(&self, request: &Request) -> Result<()> {
        if !self.is_connected() {
            return Err(CoreError::NotConnected);
        }
        let frame = request.to_frame()?;
        let slot = self.inner.transport.lock().await;
        let transport = slot.as_ref().ok_or(CoreError::NotConnected)?;
        debug!(request = request.describe(), %frame, "sending frame");
        transport.send(frame)?;
        Ok(())
    }

    /// Wait for `keys` of `cache` to update after `since`.
    async fn confirm<T: Clone>(
        operation: &str,
        cache: &KeyedCache<T>,
        since: Instant,
        timeout: Duration,
        keys: &[String],
    ) -> Result<()> {
        let outstanding = cache.await_keys(since, timeout, keys).await;
        if outstanding.is_empty() {
            return Ok(());
        }
        let keys: Vec<String> = outstanding
            .into_iter()
            .filter(|key| key != SINGLE_ENTRY_KEY)
            .collect();
        warn!(operation, ?keys, timeout_ms = millis(timeout), "confirmation timed out");
        Err(CoreError::Timeout {
            operation: operation.to_owned(),
            keys,
            timeout_ms: millis(timeout),
        })
    }

    /// Wait for a batch update of `cache` after `since`.
    async fn confirm_batch<T: Clone>(
        operation: &str,
        cache: &KeyedCache<T>,
        since: Instant,
        timeout: Duration,
    ) -> Result<()> {
        if cache.await_finalization_since(since, timeout).await {
            return Ok(());
        }
        warn!(operation, timeout_ms = millis(timeout), "confirmation timed out");
        Err(CoreError::Timeout {
            operation: operation.to_owned(),
            keys: Vec::new(),
            timeout_ms: millis(timeout),
        })
    }

    async fn fetch_single<T: Clone>(
        &self,
        operation: &str,
        query: Query,
        cache: &KeyedCache<T>,
        timeout: Duration,
    ) -> Result<T> {
        let since = Instant::now();
        self.send(&Request::Get(vec![query])).await?;
        Self::confirm(operation, cache, since, timeout, &[]).await?;
        cache
            .get_single()
            .ok_or_else(|| CoreError::Internal(format!("{operation}: confirmed value is not cached")))
    }

    // ── Fetches ──────────────────────────────────────────────────────

    pub async fn get_name(&self, timeout: Duration) -> Result<String> {
        self.fetch_single("get controller name", Query::Name, &self.inner.cache.name, timeout)
            .await
    }

    pub async fn get_hostname(&self, timeout: Duration) -> Result<String> {
        self.fetch_single(
            "get controller hostname",
            Query::Hostname,
            &self.inner.cache.hostname,
            timeout,
        )
        .await
    }

    pub async fn get_firmware_version(&self, timeout: Duration) -> Result<FirmwareVersion> {
        self.fetch_single(
            "get firmware version",
            Query::Version,
            &self.inner.cache.firmware_version,
            timeout,
        )
        .await
    }

    pub async fn get_time_config(&self, timeout: Duration) -> Result<TimeConfig> {
        self.fetch_single(
            "get time config",
            Query::TimeConfig,
            &self.inner.cache.time_config,
            timeout,
        )
        .await
    }

    /// Fetch the full zone topology.
    pub async fn get_zone_configs(&self, timeout: Duration) -> Result<BTreeMap<String, ZoneConfig>> {
        let cache = &self.inner.cache.zone_configs;
        let since = Instant::now();
        self.send(&Request::Get(vec![Query::Zones])).await?;
        Self::confirm_batch("get zone configs", cache, since, timeout).await?;
        Ok(cache.get_all())
    }

    pub async fn get_zone_names(&self, timeout: Duration) -> Result<Vec<String>> {
        Ok(self.get_zone_configs(timeout).await?.into_keys().collect())
    }

    /// Fetch the pattern catalog, folders included.
    pub async fn get_pattern_list(&self, timeout: Duration) -> Result<Vec<Pattern>> {
        let cache = &self.inner.cache.patterns;
        let since = Instant::now();
        self.send(&Request::Get(vec![Query::PatternList])).await?;
        Self::confirm_batch("get pattern list", cache, since, timeout).await?;
        Ok(cache.get_all().into_values().collect())
    }

    /// Runnable pattern keys (`"folder/name"`), folders excluded.
    pub async fn get_pattern_names(&self, timeout: Duration) -> Result<Vec<String>> {
        Ok(runnable(self.get_pattern_list(timeout).await?))
    }

    /// Fetch the configurations of `patterns`, or of every runnable
    /// pattern when `patterns` is empty. A full fetch clears the cache
    /// first so configs of deleted patterns do not linger.
    pub async fn get_pattern_configs(
        &self,
        patterns: &[String],
        timeout: Duration,
    ) -> Result<BTreeMap<String, PatternConfig>> {
        let cache = &self.inner.cache.pattern_configs;
        if patterns.is_empty() {
            cache.clear();
        }
        let known = self.pattern_names().await?;
        let targets = if patterns.is_empty() {
            known
        } else {
            validate::validate_patterns(patterns, &known)?;
            patterns.to_vec()
        };
        if targets.is_empty() {
            return Ok(BTreeMap::new());
        }

        let queries = targets
            .iter()
            .map(|key| parse_pattern(key).map(Query::PatternConfig))
            .collect::<Result<Vec<_>>>()?;
        let since = Instant::now();
        self.send(&Request::Get(queries)).await?;
        Self::confirm("get pattern configs", cache, since, timeout, &targets).await?;
        Ok(cache.get_all())
    }

    pub async fn get_pattern_config(&self, pattern: &str, timeout: Duration) -> Result<PatternConfig> {
        self.get_pattern_configs(&[pattern.to_owned()], timeout)
            .await?
            .remove(pattern)
            .ok_or_else(|| CoreError::not_found("Pattern", pattern))
    }

    /// Fetch the live state of `zones`, or of every zone when `zones` is
    /// empty. A full fetch clears the cache first.
    pub async fn get_zone_states(
        &self,
        zones: &[String],
        timeout: Duration,
    ) -> Result<BTreeMap<String, ZoneState>> {
        let cache = &self.inner.cache.zone_states;
        if zones.is_empty() {
            cache.clear();
        }
        let known = self.zone_names().await?;
        let targets = if zones.is_empty() {
            known
        } else {
            validate::validate_zones(zones, &known)?;
            zones.to_vec()
        };
        if targets.is_empty() {
            return Ok(BTreeMap::new());
        }

        let since = Instant::now();
        self.send(&Request::Get(vec![Query::ZoneStates(targets.clone())]))
            .await?;
        Self::confirm("get zone states", cache, since, timeout, &targets).await?;
        Ok(cache.get_all())
    }

    pub async fn get_zone_state(&self, zone: &str, timeout: Duration) -> Result<ZoneState> {
        self.get_zone_states(&[zone.to_owned()], timeout)
            .await?
            .remove(zone)
            .ok_or_else(|| CoreError::not_found("Zone", zone))
    }

    pub async fn get_calendar_schedule(&self, timeout: Duration) -> Result<Vec<ScheduleEvent>> {
        self.fetch_single(
            "get calendar schedule",
            Query::CalendarSchedule,
            &self.inner.cache.calendar_schedule,
            timeout,
        )
        .await
    }

    pub async fn get_daily_schedule(&self, timeout: Duration) -> Result<Vec<ScheduleEvent>> {
        self.fetch_single(
            "get daily schedule",
            Query::DailySchedule,
            &self.inner.cache.daily_schedule,
            timeout,
        )
        .await
    }

    // ── Read-through accessors ───────────────────────────────────────

    pub async fn name(&self) -> Result<String> {
        match self.inner.cache.name.get_single().filter(|n| !n.is_empty()) {
            Some(name) => Ok(name),
            None => self.get_name(self.inner.config.timeout).await,
        }
    }

    pub async fn hostname(&self) -> Result<String> {
        match self.inner.cache.hostname.get_single().filter(|h| !h.is_empty()) {
            Some(hostname) => Ok(hostname),
            None => self.get_hostname(self.inner.config.timeout).await,
        }
    }

    pub async fn firmware_version(&self) -> Result<FirmwareVersion> {
        match self.inner.cache.firmware_version.get_single() {
            Some(version) => Ok(version),
            None => self.get_firmware_version(self.inner.config.timeout).await,
        }
    }

    pub async fn time_config(&self) -> Result<TimeConfig> {
        match self.inner.cache.time_config.get_single() {
            Some(config) => Ok(config),
            None => self.get_time_config(self.inner.config.timeout).await,
        }
    }

    pub async fn zone_configs(&self) -> Result<BTreeMap<String, ZoneConfig>> {
        let cache = &self.inner.cache.zone_configs;
        if cache.is_empty() {
            return self.get_zone_configs(self.inner.config.timeout).await;
        }
        Ok(cache.get_all())
    }

    pub async fn zone_names(&self) -> Result<Vec<String>> {
        Ok(self.zone_configs().await?.into_keys().collect())
    }

    pub async fn pattern_list(&self) -> Result<Vec<Pattern>> {
        let cache = &self.inner.cache.patterns;
        if cache.is_empty() {
            return self.get_pattern_list(self.inner.config.timeout).await;
        }
        Ok(cache.get_all().into_values().collect())
    }

    pub async fn pattern_names(&self) -> Result<Vec<String>> {
        Ok(runnable(self.pattern_list().await?))
    }

    pub async fn pattern_configs(&self) -> Result<BTreeMap<String, PatternConfig>> {
        let cache = &self.inner.cache.pattern_configs;
        if cache.is_empty() {
            return self.get_pattern_configs(&[], self.inner.config.timeout).await;
        }
        Ok(cache.get_all())
    }

    pub async fn zone_states(&self) -> Result<BTreeMap<String, ZoneState>> {
        let cache = &self.inner.cache.zone_states;
        if cache.is_empty() {
            return self.get_zone_states(&[], self.inner.config.timeout).await;
        }
        Ok(cache.get_all())
    }

    pub async fn calendar_schedule(&self) -> Result<Vec<ScheduleEvent>> {
        match self.inner.cache.calendar_schedule.get_single() {
            Some(events) => Ok(events),
            None => self.get_calendar_schedule(self.inner.config.timeout).await,
        }
    }

    pub async fn daily_schedule(&self) -> Result<Vec<ScheduleEvent>> {
        match self.inner.cache.daily_schedule.get_single() {
            Some(events) => Ok(events),
            None => self.get_daily_schedule(self.inner.config.timeout).await,
        }
    }

    // ── Zone state ───────────────────────────────────────────────────

    /// `zones`, validated against the known zones, or every known zone
    /// when `zones` is empty.
    async fn resolve_zones(&self, zones: &[String]) -> Result<Vec<String>> {
        let known = self.zone_names().await?;
        if zones.is_empty() {
            if known.is_empty() {
                return Err(CoreError::validation("controller has no zones configured"));
            }
            return Ok(known);
        }
        validate::validate_zones(zones, &known)?;
        Ok(zones.to_vec())
    }

    async fn run_on_zones(
        &self,
        operation: &str,
        zones: Vec<String>,
        state: ZoneState,
        options: RequestOptions,
    ) -> Result<()> {
        let request = Request::RunPattern(ZoneState {
            zone_name: zones.clone(),
            ..state
        });
        let since = Instant::now();
        self.send(&request).await?;
        if options.sync {
            let timeout = self.timeout(options);
            Self::confirm(operation, &self.inner.cache.zone_states, since, timeout, &zones).await?;
        }
        debug!(operation, ?zones, "zone state applied");
        Ok(())
    }

    /// Turn on `zones` (every zone when empty).
    pub async fn turn_on(&self, zones: &[String], options: RequestOptions) -> Result<()> {
        let zones = self.resolve_zones(zones).await?;
        let state = ZoneState {
            state: 1,
            ..ZoneState::default()
        };
        self.run_on_zones("turn on", zones, state, options).await
    }

    /// Turn off `zones` (every zone when empty).
    pub async fn turn_off(&self, zones: &[String], options: RequestOptions) -> Result<()> {
        let zones = self.resolve_zones(zones).await?;
        self.run_on_zones("turn off", zones, ZoneState::default(), options)
            .await
    }

    /// Show one solid color on `zones`.
    pub async fn apply_color(
        &self,
        color: Rgb,
        brightness: u8,
        zones: &[String],
        options: RequestOptions,
    ) -> Result<()> {
        let zones = self.resolve_zones(zones).await?;
        validate::validate_brightness(brightness)?;
        let state = ZoneState {
            state: 1,
            data: Some(PatternConfig::solid(color, brightness)),
            ..ZoneState::default()
        };
        self.run_on_zones("apply color", zones, state, options).await
    }

    /// Show a repeating string of per-pixel colors on `zones`.
    pub async fn apply_light_string(
        &self,
        lights: &[Rgb],
        brightness: u8,
        zones: &[String],
        options: RequestOptions,
    ) -> Result<()> {
        let zones = self.resolve_zones(zones).await?;
        validate::validate_brightness(brightness)?;
        if lights.is_empty() {
            return Err(CoreError::validation("light string must contain at least one color"));
        }
        let state = ZoneState {
            state: 1,
            data: Some(PatternConfig::light_string(lights, brightness)),
            ..ZoneState::default()
        };
        self.run_on_zones("apply light string", zones, state, options)
            .await
    }

    /// Run a stored pattern (`"folder/name"`) on `zones`.
    pub async fn apply_pattern(
        &self,
        pattern: &str,
        zones: &[String],
        options: RequestOptions,
    ) -> Result<()> {
        let zones = self.resolve_zones(zones).await?;
        validate::validate_patterns(&[pattern.to_owned()], &self.pattern_names().await?)?;
        let state = ZoneState {
            state: 1,
            file: pattern.to_owned(),
            ..ZoneState::default()
        };
        self.run_on_zones("apply pattern", zones, state, options)
            .await
    }

    /// Run an ad-hoc pattern configuration on `zones`.
    pub async fn apply_pattern_config(
        &self,
        config: &PatternConfig,
        zones: &[String],
        options: RequestOptions,
    ) -> Result<()> {
        let zones = self.resolve_zones(zones).await?;
        validate::validate_pattern_config(config, &zones)?;
        let state = ZoneState {
            state: 1,
            data: Some(config.clone()),
            ..ZoneState::default()
        };
        self.run_on_zones("apply pattern config", zones, state, options)
            .await
    }

    // ── Patterns ─────────────────────────────────────────────────────

    /// Create or overwrite a stored pattern. Read-only patterns are refused.
    pub async fn save_pattern(
        &self,
        pattern: &str,
        config: &PatternConfig,
        options: RequestOptions,
    ) -> Result<()> {
        validate::validate_pattern_config(config, &self.zone_names().await?)?;
        let existing = self
            .pattern_list()
            .await?
            .into_iter()
            .find(|p| !p.is_folder() && p.key() == pattern);
        let target = match existing {
            Some(p) => p,
            None => parse_pattern(pattern)?,
        };
        if target.is_folder() {
            return Err(CoreError::validation(format!(
                "cannot save '{pattern}': a pattern needs a name after the folder"
            )));
        }
        if target.read_only {
            return Err(CoreError::validation(format!(
                "cannot update pattern '{pattern}' because it is read only"
            )));
        }

        let key = target.key();
        let since = Instant::now();
        self.send(&Request::SavePattern {
            pattern: target,
            config: config.clone(),
        })
        .await?;
        if options.sync {
            let timeout = self.timeout(options);
            Self::confirm("save pattern", &self.inner.cache.pattern_configs, since, timeout, &[key])
                .await?;
        }
        info!(pattern, "pattern saved");
        Ok(())
    }

    /// Delete a stored pattern or folder. Unknown and read-only patterns
    /// are refused.
    pub async fn delete_pattern(&self, pattern: &str, options: RequestOptions) -> Result<()> {
        let target = self
            .pattern_list()
            .await?
            .into_iter()
            .find(|p| p.key() == pattern)
            .ok_or_else(|| CoreError::not_found("Pattern", pattern))?;
        if target.read_only {
            return Err(CoreError::validation(format!(
                "cannot delete pattern '{pattern}' because it is read only"
            )));
        }

        let key = target.key();
        let since = Instant::now();
        self.send(&Request::DeletePattern(target)).await?;
        if options.sync {
            let timeout = self.timeout(options);
            Self::confirm("delete pattern", &self.inner.cache.patterns, since, timeout, &[key])
                .await?;
        }
        info!(pattern, "pattern deleted");
        Ok(())
    }

    // ── Zone topology ────────────────────────────────────────────────

    /// Replace the whole zone topology. Zones missing from `zones` are
    /// deleted on the controller.
    ///
    /// Port mappings with an empty controller name default to this
    /// controller's hostname; a `num_pixels` of 0 is derived from the port
    /// mappings.
    pub async fn set_zone_configs(
        &self,
        mut zones: BTreeMap<String, ZoneConfig>,
        options: RequestOptions,
    ) -> Result<()> {
        let needs_hostname = zones
            .values()
            .flat_map(|zone| &zone.port_map)
            .any(|mapping| mapping.ctlr_name.is_empty());
        let hostname = if needs_hostname {
            Some(self.hostname().await?)
        } else {
            None
        };

        for (name, zone) in &mut zones {
            if let Some(hostname) = &hostname {
                for mapping in zone.port_map.iter_mut().filter(|m| m.ctlr_name.is_empty()) {
                    mapping.ctlr_name.clone_from(hostname);
                }
            }
            // An overflowing total stays 0 and fails validation below.
            if zone.num_pixels == 0 {
                zone.num_pixels = ZoneConfig::pixel_total(&zone.port_map).unwrap_or(0);
            }
            validate::validate_zone_config(zone).map_err(|e| match e {
                CoreError::ValidationFailed { message } => {
                    CoreError::validation(format!("zone '{name}': {message}"))
                }
                other => other,
            })?;
        }

        let since = Instant::now();
        self.send(&Request::SetZones(zones)).await?;
        if options.sync {
            let timeout = self.timeout(options);
            Self::confirm_batch("set zone configs", &self.inner.cache.zone_configs, since, timeout)
                .await?;
        }
        Ok(())
    }

    /// Add one zone. Fails if a zone with that name exists.
    pub async fn add_zone(&self, name: &str, zone: ZoneConfig, options: RequestOptions) -> Result<()> {
        let mut zones = self.zone_configs().await?;
        if zones.contains_key(name) {
            return Err(CoreError::validation(format!("zone '{name}' already exists")));
        }
        zones.insert(name.to_owned(), zone);
        self.set_zone_configs(zones, options).await
    }

    /// Remove one zone. Fails if no zone has that name.
    pub async fn delete_zone(&self, name: &str, options: RequestOptions) -> Result<()> {
        let mut zones = self.zone_configs().await?;
        if zones.remove(name).is_none() {
            return Err(CoreError::not_found("Zone", name));
        }
        self.set_zone_configs(zones, options).await
    }

    // ── Schedules ────────────────────────────────────────────────────

    async fn set_schedule(
        &self,
        kind: ScheduleKind,
        events: Vec<ScheduleEvent>,
        options: RequestOptions,
    ) -> Result<()> {
        let patterns = self.pattern_names().await?;
        let zones = self.zone_names().await?;
        let is_calendar = kind == ScheduleKind::Calendar;
        for event in &events {
            validate::validate_schedule_event(event, is_calendar, &patterns, &zones)?;
        }

        let count = events.len();
        let since = Instant::now();
        self.send(&Request::SetSchedule { kind, events }).await?;
        if options.sync {
            let timeout = self.timeout(options);
            let operation = format!("set {kind} schedule");
            Self::confirm(&operation, self.inner.cache.schedule(kind), since, timeout, &[]).await?;
        }
        info!(%kind, events = count, "schedule saved");
        Ok(())
    }

    /// Replace the whole calendar schedule. Events missing from `events`
    /// are deleted on the controller.
    pub async fn set_calendar_schedule(
        &self,
        events: Vec<ScheduleEvent>,
        options: RequestOptions,
    ) -> Result<()> {
        self.set_schedule(ScheduleKind::Calendar, events, options).await
    }

    /// Replace the whole daily schedule. Events missing from `events` are
    /// deleted on the controller.
    pub async fn set_daily_schedule(
        &self,
        events: Vec<ScheduleEvent>,
        options: RequestOptions,
    ) -> Result<()> {
        self.set_schedule(ScheduleKind::Daily, events, options).await
    }

    pub async fn add_calendar_event(&self, event: ScheduleEvent, options: RequestOptions) -> Result<()> {
        let mut events = self.calendar_schedule().await?;
        events.push(event);
        self.set_calendar_schedule(events, options).await
    }

    pub async fn add_daily_event(&self, event: ScheduleEvent, options: RequestOptions) -> Result<()> {
        let mut events = self.daily_schedule().await?;
        events.push(event);
        self.set_daily_schedule(events, options).await
    }

    // ── Identity ─────────────────────────────────────────────────────

    pub async fn set_name(&self, name: &str, options: RequestOptions) -> Result<()> {
        let since = Instant::now();
        self.send(&Request::SetName(name.to_owned())).await?;
        if options.sync {
            let timeout = self.timeout(options);
            Self::confirm("set controller name", &self.inner.cache.name, since, timeout, &[]).await?;
        }
        Ok(())
    }
}

fn runnable(patterns: Vec<Pattern>) -> Vec<String> {
    patterns
        .into_iter()
        .filter(|p| !p.is_folder())
        .map(|p| p.key())
        .collect()
}

fn parse_pattern(key: &str) -> Result<Pattern> {
    key.parse::<Pattern>().map_err(CoreError::validation)
}
