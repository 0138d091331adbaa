// Controller wire protocol
//
// Outbound frames are `{"cmd":"toCtlrGet","get":[[key, ...args], ...]}`
// or `{"cmd":"toCtlrSet", <body>}`. Inbound frames are tagged
// `{"cmd":"fromCtlr"}` and carry exactly one domain key. The protocol has
// no request ids, so decoding only classifies a frame; correlating it with
// a pending request is the cache's job.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Error;
use crate::types::{
    FirmwareVersion, Pattern, PatternConfig, PatternFileData, ScheduleEvent, ScheduleKind,
    TimeConfig, ZoneConfig, ZoneState,
};

// ── Wire keys ────────────────────────────────────────────────────────

pub mod keys {
    pub const CMD: &str = "cmd";
    pub const CMD_GET: &str = "toCtlrGet";
    pub const CMD_SET: &str = "toCtlrSet";
    pub const CMD_FROM_CONTROLLER: &str = "fromCtlr";

    pub const VERSION: &str = "version";
    pub const HOSTNAME: &str = "hostName";
    pub const NAME: &str = "ctlrName";
    pub const TIME_CONFIG: &str = "timeConfig";
    pub const ZONES: &str = "zones";
    pub const ZONE_STATE: &str = "runPattern";
    pub const PATTERN_LIST: &str = "patternFileList";
    pub const PATTERN_CONFIG: &str = "patternFileData";
    pub const PATTERN_DELETE: &str = "patternFileDelete";
    pub const SCHEDULE: &str = "schedule";
    pub const SCHEDULE_EVENTS: &str = "events";
    pub const CALENDAR_SCHEDULE: &str = "scheduleCalendar";
    pub const DAILY_SCHEDULE: &str = "scheduleDaily";
}

// ── Outbound ─────────────────────────────────────────────────────────

/// One entry of a `toCtlrGet` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Version,
    Hostname,
    Name,
    TimeConfig,
    Zones,
    PatternList,
    /// Configuration of one stored pattern.
    PatternConfig(Pattern),
    /// Live state of the named zones, answered as one or more `runPattern` frames.
    ZoneStates(Vec<String>),
    CalendarSchedule,
    DailySchedule,
}

impl Query {
    fn args(&self) -> Vec<Value> {
        match self {
            Self::Version => vec![keys::VERSION.into()],
            Self::Hostname => vec![keys::HOSTNAME.into()],
            Self::Name => vec![keys::NAME.into()],
            Self::TimeConfig => vec![keys::TIME_CONFIG.into()],
            Self::Zones => vec![keys::ZONES.into()],
            Self::PatternList => vec![keys::PATTERN_LIST.into()],
            Self::PatternConfig(pattern) => vec![
                keys::PATTERN_CONFIG.into(),
                pattern.folders.clone().into(),
                pattern.name.clone().into(),
            ],
            Self::ZoneStates(zones) => std::iter::once(Value::from(keys::ZONE_STATE))
                .chain(zones.iter().cloned().map(Value::from))
                .collect(),
            Self::CalendarSchedule => vec![keys::CALENDAR_SCHEDULE.into()],
            Self::DailySchedule => vec![keys::DAILY_SCHEDULE.into()],
        }
    }
}

/// A frame the client sends to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Get(Vec<Query>),
    /// Change the live state of the zones named in the payload.
    RunPattern(ZoneState),
    SavePattern {
        pattern: Pattern,
        config: PatternConfig,
    },
    DeletePattern(Pattern),
    /// Full replacement of the zone topology.
    SetZones(BTreeMap<String, ZoneConfig>),
    /// Full replacement of one schedule collection.
    SetSchedule {
        kind: ScheduleKind,
        events: Vec<ScheduleEvent>,
    },
    SetName(String),
}

impl Request {
    /// Short label used in logs.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Get(_) => "get",
            Self::RunPattern(_) => "run pattern",
            Self::SavePattern { .. } => "save pattern",
            Self::DeletePattern(_) => "delete pattern",
            Self::SetZones(_) => "set zones",
            Self::SetSchedule { .. } => "set schedule",
            Self::SetName(_) => "set name",
        }
    }

    /// Encode as a single text frame.
    pub fn to_frame(&self) -> Result<String, Error> {
        let cmd = if matches!(self, Self::Get(_)) {
            keys::CMD_GET
        } else {
            keys::CMD_SET
        };
        let mut frame = Map::new();
        frame.insert(keys::CMD.into(), cmd.into());

        match self {
            Self::Get(queries) => {
                let get: Vec<Value> = queries.iter().map(|q| Value::Array(q.args())).collect();
                frame.insert("get".into(), Value::Array(get));
            }
            Self::RunPattern(state) => {
                frame.insert(keys::ZONE_STATE.into(), serde_json::to_value(state)?);
            }
            Self::SavePattern { pattern, config } => {
                let body = PatternFileData {
                    folders: pattern.folders.clone(),
                    name: pattern.name.clone(),
                    json_data: Some(config.clone()),
                };
                frame.insert(keys::PATTERN_CONFIG.into(), serde_json::to_value(body)?);
            }
            Self::DeletePattern(pattern) => {
                let mut body = Map::new();
                body.insert("folders".into(), pattern.folders.clone().into());
                body.insert("name".into(), pattern.name.clone().into());
                frame.insert(keys::PATTERN_DELETE.into(), Value::Object(body));
            }
            Self::SetZones(zones) => {
                frame.insert("save".into(), Value::Bool(true));
                frame.insert(keys::ZONES.into(), serde_json::to_value(zones)?);
            }
            Self::SetSchedule { kind, events } => {
                frame.insert(keys::SCHEDULE.into(), Value::from(kind.to_string()));
                frame.insert(keys::SCHEDULE_EVENTS.into(), serde_json::to_value(events)?);
            }
            Self::SetName(name) => {
                frame.insert(keys::NAME.into(), name.clone().into());
            }
        }
        Ok(serde_json::to_string(&frame)?)
    }
}

// ── Inbound ──────────────────────────────────────────────────────────

/// A classified controller frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Version(FirmwareVersion),
    Hostname(String),
    Name(String),
    TimeConfig(TimeConfig),
    /// The complete zone topology.
    Zones(BTreeMap<String, ZoneConfig>),
    /// The complete pattern catalog, folders included.
    PatternList(Vec<Pattern>),
    ZoneState(ZoneState),
    /// A pattern's stored configuration. `config` is `None` for folders
    /// and for patterns the controller returned without data.
    PatternConfig {
        pattern: Pattern,
        config: Option<PatternConfig>,
    },
    PatternDeleted(Pattern),
    Schedule {
        kind: ScheduleKind,
        events: Vec<ScheduleEvent>,
    },
}

type Decoder = fn(&Map<String, Value>, &Value) -> Result<Inbound, serde_json::Error>;

/// Frame discriminants, tried in order. Rarer and more specific keys come
/// first so a payload carrying several known fields lands on the narrowest
/// match.
const DECODERS: &[(&str, Decoder)] = &[
    (keys::PATTERN_DELETE, decode_pattern_delete),
    (keys::PATTERN_CONFIG, decode_pattern_config),
    (keys::PATTERN_LIST, decode_pattern_list),
    (keys::ZONE_STATE, decode_zone_state),
    (keys::SCHEDULE, decode_schedule),
    (keys::ZONES, decode_zones),
    (keys::TIME_CONFIG, decode_time_config),
    (keys::VERSION, decode_version),
    (keys::NAME, decode_name),
    (keys::HOSTNAME, decode_hostname),
];

/// Classify an inbound text frame.
///
/// Returns `Ok(None)` for frames that are not from the controller or carry
/// no recognized key. A recognized key with a malformed payload is an error.
pub fn decode(frame: &str) -> Result<Option<Inbound>, Error> {
    let deser_err = |e: serde_json::Error| Error::Deserialization {
        message: e.to_string(),
        body: frame.to_owned(),
    };

    let object = match serde_json::from_str::<Value>(frame).map_err(deser_err)? {
        Value::Object(object) => object,
        _ => {
            return Err(Error::Deserialization {
                message: "frame is not a JSON object".into(),
                body: frame.to_owned(),
            });
        }
    };

    if object.get(keys::CMD).and_then(Value::as_str) != Some(keys::CMD_FROM_CONTROLLER) {
        return Ok(None);
    }

    for (key, decoder) in DECODERS {
        if let Some(field) = object.get(*key) {
            return decoder(&object, field).map(Some).map_err(deser_err);
        }
    }
    Ok(None)
}

fn decode_pattern_delete(_: &Map<String, Value>, field: &Value) -> Result<Inbound, serde_json::Error> {
    Pattern::deserialize(field).map(Inbound::PatternDeleted)
}

fn decode_pattern_config(_: &Map<String, Value>, field: &Value) -> Result<Inbound, serde_json::Error> {
    let data = PatternFileData::deserialize(field)?;
    Ok(Inbound::PatternConfig {
        pattern: Pattern::new(data.folders, data.name),
        config: data.json_data,
    })
}

fn decode_pattern_list(_: &Map<String, Value>, field: &Value) -> Result<Inbound, serde_json::Error> {
    Vec::<Pattern>::deserialize(field).map(Inbound::PatternList)
}

fn decode_zone_state(_: &Map<String, Value>, field: &Value) -> Result<Inbound, serde_json::Error> {
    ZoneState::deserialize(field).map(Inbound::ZoneState)
}

fn decode_schedule(frame: &Map<String, Value>, field: &Value) -> Result<Inbound, serde_json::Error> {
    let kind = ScheduleKind::deserialize(field)?;
    let events = match frame.get(keys::SCHEDULE_EVENTS) {
        Some(events) => Vec::<ScheduleEvent>::deserialize(events)?,
        None => Vec::new(),
    };
    Ok(Inbound::Schedule { kind, events })
}

fn decode_zones(_: &Map<String, Value>, field: &Value) -> Result<Inbound, serde_json::Error> {
    BTreeMap::<String, ZoneConfig>::deserialize(field).map(Inbound::Zones)
}

fn decode_time_config(_: &Map<String, Value>, field: &Value) -> Result<Inbound, serde_json::Error> {
    TimeConfig::deserialize(field).map(Inbound::TimeConfig)
}

fn decode_version(_: &Map<String, Value>, field: &Value) -> Result<Inbound, serde_json::Error> {
    FirmwareVersion::deserialize(field).map(Inbound::Version)
}

fn decode_name(_: &Map<String, Value>, field: &Value) -> Result<Inbound, serde_json::Error> {
    String::deserialize(field).map(Inbound::Name)
}

fn decode_hostname(_: &Map<String, Value>, field: &Value) -> Result<Inbound, serde_json::Error> {
    String::deserialize(field).map(Inbound::Hostname)
}

// ── Tests ────────────────────────────────────────────────────────────
