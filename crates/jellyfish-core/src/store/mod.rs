// ── Device state cache ──
//
// One keyed cache per data domain. Domains never share a lock, so a pattern
// catalog refresh does not contend with zone-state updates.

mod entry;
mod keyed;

pub use entry::EntryCache;
pub use keyed::{KeyedCache, SINGLE_ENTRY_KEY};

use jellyfish_api::{
    FirmwareVersion, Pattern, PatternConfig, ScheduleEvent, ScheduleKind, TimeConfig, ZoneConfig,
    ZoneState,
};

/// Everything the client knows about one controller.
///
/// Single-valued domains (name, hostname, firmware, time config, both
/// schedules) live under [`SINGLE_ENTRY_KEY`]. Zones are keyed by zone name,
/// patterns and their configs by the `"folders/name"` composite key.
#[derive(Debug, Default)]
pub struct DeviceCache {
    pub name: KeyedCache<String>,
    pub hostname: KeyedCache<String>,
    pub firmware_version: KeyedCache<FirmwareVersion>,
    pub time_config: KeyedCache<TimeConfig>,
    pub zone_configs: KeyedCache<ZoneConfig>,
    pub zone_states: KeyedCache<ZoneState>,
    pub patterns: KeyedCache<Pattern>,
    pub pattern_configs: KeyedCache<PatternConfig>,
    pub calendar_schedule: KeyedCache<Vec<ScheduleEvent>>,
    pub daily_schedule: KeyedCache<Vec<ScheduleEvent>>,
}

impl DeviceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The schedule collection of the given kind.
    pub fn schedule(&self, kind: ScheduleKind) -> &KeyedCache<Vec<ScheduleEvent>> {
        match kind {
            ScheduleKind::Calendar => &self.calendar_schedule,
            ScheduleKind::Daily => &self.daily_schedule,
        }
    }
}
