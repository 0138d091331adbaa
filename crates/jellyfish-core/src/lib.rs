// jellyfish-core: cached, confirmation-aware client between jellyfish-api
// and consumers (CLI, home automation bridges).

pub mod config;
pub mod controller;
pub mod error;
pub mod monitor;
pub mod signal;
pub mod store;
pub mod validate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ControllerConfig, DEFAULT_TIMEOUT};
pub use controller::{Controller, RequestOptions};
pub use error::CoreError;
pub use monitor::ConnectionMonitor;
pub use signal::TimedSignal;
pub use store::{DeviceCache, EntryCache, KeyedCache, SINGLE_ENTRY_KEY};

// Wire types at the crate root so consumers need only one dependency.
pub use jellyfish_api::{
    ActionKind, FirmwareVersion, Pattern, PatternConfig, PortMapping, Rgb, RunConfig,
    ScheduleEvent, ScheduleEventAction, ScheduleKind, StartFrom, TimeConfig, ZoneConfig,
    ZoneState,
};
