// ── Input validation ──
//
// Local checks run before any frame is built. Everything here is pure: the
// controller passes in the zone and pattern catalogs it last saw.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use jellyfish_api::{
    ActionKind, PatternConfig, PortMapping, RunConfig, ScheduleEvent, ScheduleEventAction,
    StartFrom, ZoneConfig,
};

use crate::error::CoreError;

pub const VALID_TYPES: &[&str] = &[
    "Color",
    "Chase",
    "Paint",
    "Stacker",
    "Sequence",
    "Multi-Paint",
    "Soffit",
];
pub const VALID_DIRECTIONS: &[&str] = &["Left", "Center", "Right"];
pub const VALID_EFFECTS_BETWEEN_PIXELS: &[&str] = &[
    "No Color Transform",
    "Repeat",
    "Progression",
    "Fade",
    "Fill with Black",
];
pub const VALID_EFFECTS: &[&str] = &["No Effect", "Twinkle", "Lightning"];
pub const VALID_DAYS: &[&str] = &["M", "T", "W", "TH", "F", "SA", "S"];

pub const MAX_BRIGHTNESS: u8 = 100;

type Result<T> = std::result::Result<T, CoreError>;

// ── References ───────────────────────────────────────────────────────

/// Every name in `zones` must be one of `valid`.
pub fn validate_zones(zones: &[String], valid: &[String]) -> Result<()> {
    let invalid: Vec<&str> = zones
        .iter()
        .filter(|zone| !valid.contains(zone))
        .map(String::as_str)
        .collect();
    if invalid.is_empty() {
        return Ok(());
    }
    Err(CoreError::validation(format!(
        "zone name(s) {invalid:?} are invalid (valid values are {valid:?})"
    )))
}

/// Every key in `patterns` must be one of `valid`.
pub fn validate_patterns(patterns: &[String], valid: &[String]) -> Result<()> {
    let invalid: Vec<&str> = patterns
        .iter()
        .filter(|pattern| !valid.contains(pattern))
        .map(String::as_str)
        .collect();
    if invalid.is_empty() {
        return Ok(());
    }
    Err(CoreError::validation(format!(
        "pattern name(s) {invalid:?} are invalid"
    )))
}

// ── Colors and run parameters ────────────────────────────────────────

pub fn validate_brightness(brightness: u8) -> Result<()> {
    if brightness <= MAX_BRIGHTNESS {
        return Ok(());
    }
    Err(CoreError::validation(format!(
        "brightness {brightness} is invalid (must be between 0 and {MAX_BRIGHTNESS})"
    )))
}

pub fn validate_run_config(config: &RunConfig) -> Result<()> {
    validate_brightness(config.brightness)?;
    if !VALID_EFFECTS.contains(&config.effect.as_str()) {
        return Err(CoreError::validation(format!(
            "run effect '{}' is invalid (valid values are {VALID_EFFECTS:?})",
            config.effect
        )));
    }
    if config.rgb_adj.len() != 3 {
        return Err(CoreError::validation(format!(
            "rgbAdj {:?} is invalid (must have exactly three components)",
            config.rgb_adj
        )));
    }
    Ok(())
}

pub fn validate_pattern_config(config: &PatternConfig, valid_zones: &[String]) -> Result<()> {
    if config.colors.len() % 3 != 0 {
        return Err(CoreError::validation(format!(
            "pattern colors {:?} are invalid (length must be a multiple of 3)",
            config.colors
        )));
    }
    if !VALID_TYPES.contains(&config.pattern_type.as_str()) {
        return Err(CoreError::validation(format!(
            "pattern type '{}' is invalid (valid values are {VALID_TYPES:?})",
            config.pattern_type
        )));
    }
    if !config.direction.is_empty() && !VALID_DIRECTIONS.contains(&config.direction.as_str()) {
        return Err(CoreError::validation(format!(
            "pattern direction '{}' is invalid (valid values are {VALID_DIRECTIONS:?})",
            config.direction
        )));
    }
    if !VALID_EFFECTS_BETWEEN_PIXELS.contains(&config.effect_between_pixels.as_str()) {
        return Err(CoreError::validation(format!(
            "effect between pixels '{}' is invalid (valid values are {VALID_EFFECTS_BETWEEN_PIXELS:?})",
            config.effect_between_pixels
        )));
    }
    if let Some(zone) = config.soffit_zone.as_deref().filter(|z| !z.is_empty()) {
        if !valid_zones.iter().any(|valid| valid == zone) {
            return Err(CoreError::validation(format!(
                "soffit zone '{zone}' is invalid (valid values are {valid_zones:?})"
            )));
        }
    }
    validate_run_config(&config.run_data)
}

// ── Zone topology ────────────────────────────────────────────────────

pub fn validate_port_mapping(mapping: &PortMapping) -> Result<()> {
    if mapping.ctlr_name.is_empty() {
        return Err(CoreError::validation(
            "port mapping controller name must not be empty",
        ));
    }
    if mapping.phy_port < 1 {
        return Err(CoreError::validation(format!(
            "port mapping phyPort {} is invalid (must be greater than zero)",
            mapping.phy_port
        )));
    }
    let start = mapping.zone_rgb_start_idx;
    if start != 0 && start != mapping.phy_start_idx && start != mapping.phy_end_idx {
        return Err(CoreError::validation(format!(
            "port mapping zoneRGBStartIdx {start} is invalid (must be 0, phyStartIdx ({}) or phyEndIdx ({}))",
            mapping.phy_start_idx, mapping.phy_end_idx
        )));
    }
    Ok(())
}

pub fn validate_zone_config(config: &ZoneConfig) -> Result<()> {
    for mapping in &config.port_map {
        validate_port_mapping(mapping)?;
    }
    let Some(expected) = ZoneConfig::pixel_total(&config.port_map) else {
        return Err(CoreError::validation(format!(
            "zone port mappings cover more than {} pixels",
            u32::MAX
        )));
    };
    if config.num_pixels != expected {
        return Err(CoreError::validation(format!(
            "zone numPixels {} is invalid (port mappings cover {expected} pixels)",
            config.num_pixels
        )));
    }
    Ok(())
}

// ── Schedules ────────────────────────────────────────────────────────

fn is_calendar_date(day: &str) -> bool {
    day.len() == 8 && NaiveDate::parse_from_str(day, "%Y%m%d").is_ok()
}

pub fn validate_schedule_action(
    action: &ScheduleEventAction,
    valid_patterns: &[String],
    valid_zones: &[String],
) -> Result<()> {
    if !(0..=23).contains(&action.hour) {
        return Err(CoreError::validation(format!(
            "schedule action hour {} is invalid (must be between 0 and 23)",
            action.hour
        )));
    }
    match action.start_from {
        StartFrom::Time if !(0..=59).contains(&action.minute) => {
            return Err(CoreError::validation(format!(
                "schedule action minute {} is invalid (must be between 0 and 59 for clock times)",
                action.minute
            )));
        }
        StartFrom::Sunrise | StartFrom::Sunset
            if !(-55..=55).contains(&action.minute) || action.minute % 5 != 0 =>
        {
            return Err(CoreError::validation(format!(
                "schedule action minute {} is invalid (must be a multiple of 5 between -55 and 55 for {} offsets)",
                action.minute, action.start_from
            )));
        }
        _ => {}
    }
    if action.kind == ActionKind::Run && !valid_patterns.contains(&action.pattern_file) {
        return Err(CoreError::validation(format!(
            "schedule action pattern '{}' is invalid",
            action.pattern_file
        )));
    }
    validate_zones(&action.zones, valid_zones)
}

pub fn validate_schedule_event(
    event: &ScheduleEvent,
    is_calendar: bool,
    valid_patterns: &[String],
    valid_zones: &[String],
) -> Result<()> {
    if is_calendar {
        if !event.days.iter().all(|day| is_calendar_date(day)) {
            return Err(CoreError::validation(format!(
                "schedule days {:?} are invalid (must be dates in YYYYMMDD format)",
                event.days
            )));
        }
    } else if !event.days.iter().all(|day| VALID_DAYS.contains(&day.as_str())) {
        return Err(CoreError::validation(format!(
            "schedule days {:?} are invalid (valid values are {VALID_DAYS:?})",
            event.days
        )));
    }

    for action in &event.actions {
        validate_schedule_action(action, valid_patterns, valid_zones)?;
    }

    let mut zone_sets = event
        .actions
        .iter()
        .map(|action| action.zones.iter().collect::<BTreeSet<_>>());
    if let Some(first) = zone_sets.next() {
        if zone_sets.any(|set| set != first) {
            return Err(CoreError::validation(
                "schedule actions must all apply to the same zones",
            ));
        }
    }
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────
