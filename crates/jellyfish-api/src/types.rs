// Controller data model
//
// Serde types matching the JSON the controller sends and accepts. Field
// names follow the controller's camelCase wire names; everything the
// controller may omit carries a default so partial payloads still decode.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::embedded;

// ── Identity ─────────────────────────────────────────────────────────

/// Firmware version information reported under the `version` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FirmwareVersion {
    pub ver: String,
    pub details: String,
    pub is_update: bool,
}

/// Time-zone configuration. The client never interprets it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeConfig(pub serde_json::Map<String, serde_json::Value>);

// ── Zones ────────────────────────────────────────────────────────────

/// A contiguous run of pixels on one physical controller port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    #[serde(default)]
    pub ctlr_name: String,
    pub phy_port: u32,
    pub phy_start_idx: u32,
    pub phy_end_idx: u32,
    #[serde(rename = "zoneRGBStartIdx")]
    pub zone_rgb_start_idx: u32,
}

impl PortMapping {
    /// Number of pixels covered by this mapping (the range is inclusive
    /// and may run in either direction). `None` when the count does not
    /// fit in a `u32`.
    pub fn pixel_count(&self) -> Option<u32> {
        self.phy_end_idx.abs_diff(self.phy_start_idx).checked_add(1)
    }
}

/// Layout of a named zone across controller ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneConfig {
    pub num_pixels: u32,
    #[serde(default)]
    pub port_map: Vec<PortMapping>,
}

impl ZoneConfig {
    /// Build a zone whose pixel count is derived from its port mappings.
    ///
    /// An overflowing total saturates at `u32::MAX`, which never passes
    /// zone validation.
    pub fn new(port_map: Vec<PortMapping>) -> Self {
        Self {
            num_pixels: Self::pixel_total(&port_map).unwrap_or(u32::MAX),
            port_map,
        }
    }

    /// Sum of the pixel counts of `port_map`, or `None` on overflow.
    pub fn pixel_total(port_map: &[PortMapping]) -> Option<u32> {
        port_map
            .iter()
            .try_fold(0u32, |total, mapping| total.checked_add(mapping.pixel_count()?))
    }
}

// ── Zone state ───────────────────────────────────────────────────────

/// Live state of one or more zones, as carried by `runPattern`.
///
/// The same shape is sent to the controller to change state, with
/// `data` embedded as an escaped JSON string (`""` when absent).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneState {
    /// 0 = off, 1 = running a pattern or ad-hoc data, 3 = light-string
    /// override. Other values are device-reported and left uninterpreted.
    pub state: i32,
    #[serde(default)]
    pub zone_name: Vec<String>,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub id: String,
    #[serde(default, with = "embedded::optional")]
    pub data: Option<PatternConfig>,
}

impl ZoneState {
    pub fn is_on(&self) -> bool {
        self.state != 0
    }

    /// The running pattern file, if the zone runs one by name.
    pub fn pattern_file(&self) -> Option<&str> {
        (!self.file.is_empty()).then_some(self.file.as_str())
    }
}

// ── Patterns ─────────────────────────────────────────────────────────

/// A stored pattern file, or a folder marker when `name` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    #[serde(default)]
    pub folders: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub read_only: bool,
}

impl Pattern {
    pub fn new(folders: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            folders: folders.into(),
            name: name.into(),
            read_only: false,
        }
    }

    /// Composite `"folders/name"` key shared by the pattern caches.
    pub fn key(&self) -> String {
        format!("{}/{}", self.folders, self.name)
    }

    pub fn is_folder(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.folders, self.name)
    }
}

impl FromStr for Pattern {
    type Err = String;

    /// Splits at the last `/`: `"Christmas/Candy Cane"` names a pattern,
    /// `"Christmas/"` names a folder.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (folders, name) = s
            .rsplit_once('/')
            .ok_or_else(|| format!("pattern '{s}' must have the form 'folder/name'"))?;
        Ok(Self::new(folders, name))
    }
}

/// Animation parameters embedded in a pattern configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunConfig {
    pub speed: u32,
    /// Percent, 0-100.
    pub brightness: u8,
    pub effect: String,
    pub effect_value: i32,
    /// Per-channel adjustment, one value per R, G and B.
    pub rgb_adj: Vec<u8>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            speed: 10,
            brightness: 100,
            effect: "No Effect".into(),
            effect_value: 0,
            rgb_adj: vec![100, 100, 100],
        }
    }
}

impl RunConfig {
    pub fn with_brightness(brightness: u8) -> Self {
        Self {
            brightness,
            ..Self::default()
        }
    }
}

/// Full description of a stored or running pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatternConfig {
    #[serde(rename = "type")]
    pub pattern_type: String,
    /// Flat list of RGB triples.
    pub colors: Vec<u8>,
    pub color_pos: Vec<i32>,
    pub run_data: RunConfig,
    pub direction: String,
    pub space_between_pixels: u32,
    pub num_of_leds: u32,
    pub skip: u32,
    pub effect_between_pixels: String,
    pub cursor: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub led_on_pos: Option<BTreeMap<String, Vec<i32>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soffit_zone: Option<String>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            pattern_type: "Color".into(),
            colors: Vec::new(),
            color_pos: vec![-1],
            run_data: RunConfig::default(),
            direction: "Center".into(),
            space_between_pixels: 2,
            num_of_leds: 1,
            skip: 2,
            effect_between_pixels: "No Color Transform".into(),
            cursor: -1,
            led_on_pos: None,
            soffit_zone: None,
        }
    }
}

impl PatternConfig {
    /// A solid color at the given brightness.
    pub fn solid(color: Rgb, brightness: u8) -> Self {
        Self {
            pattern_type: "Color".into(),
            colors: color.to_vec(),
            run_data: RunConfig::with_brightness(brightness),
            ..Self::default()
        }
    }

    /// One color per pixel, repeated along the zone.
    ///
    /// The table is led by black at position -1, followed by each color
    /// at its index in `lights`.
    pub fn light_string(lights: &[Rgb], brightness: u8) -> Self {
        let mut colors = vec![0, 0, 0];
        let mut color_pos = vec![-1];
        for (pos, light) in (0_i32..).zip(lights) {
            colors.extend_from_slice(&light.to_vec());
            color_pos.push(pos);
        }
        Self {
            pattern_type: "Soffit".into(),
            colors,
            color_pos,
            run_data: RunConfig::with_brightness(brightness),
            ..Self::default()
        }
    }
}

/// `patternFileData` payload: a pattern location plus its embedded config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternFileData {
    #[serde(default)]
    pub folders: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "embedded::optional")]
    pub json_data: Option<PatternConfig>,
}

// ── Schedules ────────────────────────────────────────────────────────

/// Which schedule collection a message refers to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScheduleKind {
    /// Events keyed by calendar date (`YYYYMMDD`).
    Calendar,
    /// Events keyed by weekday code.
    Daily,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ActionKind {
    Run,
    Stop,
}

/// Reference point an action's hour and minute are measured from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StartFrom {
    Sunrise,
    Sunset,
    Time,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEventAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub start_from: StartFrom,
    pub hour: i32,
    pub minute: i32,
    #[serde(default)]
    pub pattern_file: String,
    #[serde(default)]
    pub zones: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleEvent {
    pub label: String,
    /// Weekday codes for daily events, `YYYYMMDD` dates for calendar events.
    pub days: Vec<String>,
    pub actions: Vec<ScheduleEventAction>,
}

// ── Colors ───────────────────────────────────────────────────────────

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_vec(self) -> Vec<u8> {
        vec![self.r, self.g, self.b]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = String;

    /// Accepts `"r,g,b"` or `"#rrggbb"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(format!("invalid hex color '{s}'"));
            }
            let channel = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&hex[range], 16).map_err(|_| format!("invalid hex color '{s}'"))
            };
            return Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?));
        }

        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let &[r, g, b] = parts.as_slice() else {
            return Err(format!("color '{s}' must have the form 'r,g,b'"));
        };
        let channel = |v: &str| {
            v.parse::<u8>()
                .map_err(|_| format!("color component '{v}' must be between 0 and 255"))
        };
        Ok(Self::new(channel(r)?, channel(g)?, channel(b)?))
    }
}

// ── Tests ────────────────────────────────────────────────────────────
