// Integration tests for Controller against an in-memory fake controller.
#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use url::Url;

use jellyfish_api::{Connector, Error as ApiError, FrameListener, Transport};
use jellyfish_core::{
    ActionKind, Controller, ControllerConfig, CoreError, PatternConfig, PortMapping,
    RequestOptions, Rgb, ScheduleEvent, ScheduleEventAction, StartFrom, ZoneConfig,
};

const WAIT: Duration = Duration::from_secs(5);

// ── Fake controller ─────────────────────────────────────────────────

struct DeviceState {
    name: String,
    zones: BTreeMap<String, Value>,
    patterns: Vec<Value>,
    configs: BTreeMap<String, String>,
    calendar: Value,
    daily: Value,
}

impl Default for DeviceState {
    fn default() -> Self {
        let zone = |port: u32| {
            json!({"numPixels": 10, "portMap": [{
                "ctlrName": "JellyFish-F348.local", "phyPort": port,
                "phyStartIdx": 0, "phyEndIdx": 9, "zoneRGBStartIdx": 0
            }]})
        };
        let mut zones = BTreeMap::new();
        zones.insert("Z1".to_owned(), zone(1));
        zones.insert("Z2".to_owned(), zone(2));

        let mut configs = BTreeMap::new();
        configs.insert("Christmas/Tree".to_owned(), r#"{"type":"Chase"}"#.to_owned());

        Self {
            name: "Porch".into(),
            zones,
            patterns: vec![
                json!({"folders": "Christmas", "name": "", "readOnly": true}),
                json!({"folders": "Christmas", "name": "Tree", "readOnly": true}),
            ],
            configs,
            calendar: json!([]),
            daily: json!([]),
        }
    }
}

/// Answers frames the way a controller does: every change is echoed back
/// as a `fromCtlr` push, delivered from a separate task.
#[derive(Default)]
struct FakeDevice {
    state: Mutex<DeviceState>,
    listener: Mutex<Option<Arc<dyn FrameListener>>>,
    sent: Mutex<Vec<Value>>,
    silent: AtomicBool,
    refuse: AtomicBool,
}

impl FakeDevice {
    fn sent(&self) -> Vec<Value> {
        self.sent.lock().clone()
    }

    fn go_silent(&self) {
        self.silent.store(true, Ordering::SeqCst);
    }

    fn reply(&self, frame: &Value) -> Vec<Value> {
        let mut state = self.state.lock();
        let push = |key: &str, value: Value| {
            let mut frame = json!({"cmd": "fromCtlr"});
            frame[key] = value;
            frame
        };

        if frame["cmd"] == "toCtlrGet" {
            let mut replies = Vec::new();
            for query in frame["get"].as_array().unwrap() {
                let args = query.as_array().unwrap();
                match args[0].as_str().unwrap() {
                    "ctlrName" => replies.push(push("ctlrName", json!(state.name))),
                    "hostName" => replies.push(push("hostName", json!("JellyFish-F348.local"))),
                    "version" => replies.push(push(
                        "version",
                        json!({"ver": "1.2.3", "details": "", "isUpdate": false}),
                    )),
                    "timeConfig" => replies.push(push("timeConfig", json!({"tz": "UTC"}))),
                    "zones" => replies.push(push("zones", json!(state.zones))),
                    "patternFileList" => replies.push(push("patternFileList", json!(state.patterns))),
                    "runPattern" => {
                        for zone in &args[1..] {
                            replies.push(push(
                                "runPattern",
                                json!({"state": 0, "zoneName": [zone], "file": "", "id": "", "data": ""}),
                            ));
                        }
                    }
                    "patternFileData" => {
                        let (folders, name) = (args[1].as_str().unwrap(), args[2].as_str().unwrap());
                        let data = state.configs.get(&format!("{folders}/{name}")).cloned();
                        replies.push(push(
                            "patternFileData",
                            json!({"folders": folders, "name": name, "jsonData": data.unwrap_or_default()}),
                        ));
                    }
                    "scheduleCalendar" => {
                        let mut frame = push("schedule", json!("calendar"));
                        frame["events"] = state.calendar.clone();
                        replies.push(frame);
                    }
                    "scheduleDaily" => {
                        let mut frame = push("schedule", json!("daily"));
                        frame["events"] = state.daily.clone();
                        replies.push(frame);
                    }
                    other => panic!("unexpected query {other}"),
                }
            }
            return replies;
        }

        if let Some(run) = frame.get("runPattern") {
            return vec![push("runPattern", run.clone())];
        }
        if let Some(data) = frame.get("patternFileData") {
            let (folders, name) = (data["folders"].as_str().unwrap(), data["name"].as_str().unwrap());
            let key = format!("{folders}/{name}");
            if !state.configs.contains_key(&key) {
                state
                    .patterns
                    .push(json!({"folders": folders, "name": name, "readOnly": false}));
            }
            state
                .configs
                .insert(key, data["jsonData"].as_str().unwrap().to_owned());
            return vec![push("patternFileData", data.clone())];
        }
        if let Some(target) = frame.get("patternFileDelete") {
            let key = format!(
                "{}/{}",
                target["folders"].as_str().unwrap(),
                target["name"].as_str().unwrap()
            );
            state.configs.remove(&key);
            state
                .patterns
                .retain(|p| format!("{}/{}", p["folders"].as_str().unwrap(), p["name"].as_str().unwrap()) != key);
            return vec![push("patternFileDelete", target.clone())];
        }
        if let Some(zones) = frame.get("zones") {
            state.zones = serde_json::from_value(zones.clone()).unwrap();
            return vec![push("zones", zones.clone())];
        }
        if let Some(kind) = frame.get("schedule") {
            let events = frame["events"].clone();
            if kind == "calendar" {
                state.calendar = events.clone();
            } else {
                state.daily = events.clone();
            }
            let mut reply = push("schedule", kind.clone());
            reply["events"] = events;
            return vec![reply];
        }
        if let Some(name) = frame.get("ctlrName") {
            state.name = name.as_str().unwrap().to_owned();
            return vec![push("ctlrName", name.clone())];
        }
        panic!("unexpected frame {frame}");
    }
}

struct FakeConnector(Arc<FakeDevice>);

impl Connector for FakeConnector {
    fn open(&self, _url: &Url, listener: Arc<dyn FrameListener>) -> Result<Box<dyn Transport>, ApiError> {
        if self.0.refuse.load(Ordering::SeqCst) {
            listener.on_error(&ApiError::WebSocketConnect("connection refused".into()));
            listener.on_close(None, "");
        } else {
            *self.0.listener.lock() = Some(Arc::clone(&listener));
            listener.on_open();
        }
        Ok(Box::new(FakeTransport(Arc::clone(&self.0))))
    }
}

struct FakeTransport(Arc<FakeDevice>);

#[async_trait]
impl Transport for FakeTransport {
    fn send(&self, frame: String) -> Result<(), ApiError> {
        let device = &self.0;
        let frame: Value = serde_json::from_str(&frame).unwrap();
        device.sent.lock().push(frame.clone());
        if device.silent.load(Ordering::SeqCst) {
            return Ok(());
        }
        let Some(listener) = device.listener.lock().clone() else {
            return Err(ApiError::NotConnected);
        };
        let replies = device.reply(&frame);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2)).await;
            for reply in replies {
                listener.on_message(&reply.to_string());
            }
        });
        Ok(())
    }

    async fn close(&self, _timeout: Duration) -> Result<(), ApiError> {
        if let Some(listener) = self.0.listener.lock().take() {
            listener.on_close(Some(1000), "");
        }
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn config() -> ControllerConfig {
    ControllerConfig {
        timeout: WAIT,
        ..ControllerConfig::new("jellyfish.test")
    }
}

fn setup() -> (Controller, Arc<FakeDevice>) {
    let device = Arc::new(FakeDevice::default());
    let controller = Controller::with_connector(config(), Arc::new(FakeConnector(Arc::clone(&device))));
    (controller, device)
}

async fn connected() -> (Controller, Arc<FakeDevice>) {
    let (controller, device) = setup();
    controller.connect(WAIT).await.unwrap();
    (controller, device)
}

fn zones(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_owned()).collect()
}

fn event(label: &str, days: &[&str], hour: i32) -> ScheduleEvent {
    ScheduleEvent {
        label: label.into(),
        days: zones(days),
        actions: vec![
            ScheduleEventAction {
                kind: ActionKind::Run,
                start_from: StartFrom::Time,
                hour,
                minute: 0,
                pattern_file: "Christmas/Tree".into(),
                zones: zones(&["Z1"]),
            },
            ScheduleEventAction {
                kind: ActionKind::Stop,
                start_from: StartFrom::Time,
                hour: 23,
                minute: 30,
                pattern_file: String::new(),
                zones: zones(&["Z1"]),
            },
        ],
    }
}

// ── Connection ──────────────────────────────────────────────────────

#[tokio::test]
async fn connect_and_disconnect() {
    let (controller, _device) = setup();
    assert!(!controller.is_connected());
    controller.connect(WAIT).await.unwrap();
    assert!(controller.is_connected());
    controller.disconnect(WAIT).await.unwrap();
    assert!(!controller.is_connected());
    controller.disconnect(WAIT).await.unwrap();
}

#[tokio::test]
async fn refused_connection_fails_fast() {
    let (controller, device) = setup();
    device.refuse.store(true, Ordering::SeqCst);

    let start = Instant::now();
    let err = controller.connect(WAIT).await.unwrap_err();
    assert!(start.elapsed() < WAIT);
    let CoreError::ConnectionFailed { address, reason } = err else {
        panic!("expected connection failure, got {err:?}");
    };
    assert_eq!(address, "jellyfish.test:9000");
    assert!(reason.contains("refused"), "{reason}");
}

#[tokio::test]
async fn not_connected_sends_nothing() {
    let (controller, device) = setup();

    let err = controller.turn_on(&zones(&["Z1"]), RequestOptions::default()).await;
    assert!(matches!(err, Err(CoreError::NotConnected)), "{err:?}");
    let err = controller.set_name("Garage", RequestOptions::default()).await;
    assert!(matches!(err, Err(CoreError::NotConnected)), "{err:?}");

    assert!(device.sent().is_empty());
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn identity_fetches() {
    let (controller, _device) = connected().await;
    assert_eq!(controller.name().await.unwrap(), "Porch");
    assert_eq!(controller.hostname().await.unwrap(), "JellyFish-F348.local");
    assert_eq!(controller.firmware_version().await.unwrap().ver, "1.2.3");
    assert_eq!(controller.time_config().await.unwrap().0["tz"], "UTC");
}

#[tokio::test]
async fn read_through_accessors_fetch_once() {
    let (controller, device) = connected().await;

    assert_eq!(controller.zone_names().await.unwrap(), zones(&["Z1", "Z2"]));
    assert_eq!(controller.zone_names().await.unwrap(), zones(&["Z1", "Z2"]));
    let zone_fetches = device
        .sent()
        .iter()
        .filter(|f| f["get"] == json!([["zones"]]))
        .count();
    assert_eq!(zone_fetches, 1);

    assert_eq!(controller.pattern_names().await.unwrap(), zones(&["Christmas/Tree"]));
    assert_eq!(controller.pattern_list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn full_pattern_config_refresh() {
    let (controller, _device) = connected().await;
    let configs = controller.pattern_configs().await.unwrap();
    assert_eq!(configs.len(), 1);
    assert_eq!(configs["Christmas/Tree"].pattern_type, "Chase");

    let config = controller
        .get_pattern_config("Christmas/Tree", WAIT)
        .await
        .unwrap();
    assert_eq!(config.pattern_type, "Chase");

    let err = controller.get_pattern_config("Nope/Missing", WAIT).await;
    assert!(matches!(err, Err(CoreError::ValidationFailed { .. })), "{err:?}");
}

#[tokio::test]
async fn zone_states_for_every_zone() {
    let (controller, _device) = connected().await;
    let states = controller.zone_states().await.unwrap();
    assert_eq!(states.keys().cloned().collect::<Vec<_>>(), zones(&["Z1", "Z2"]));
    assert!(states.values().all(|s| !s.is_on()));
}

// ── Zone state ──────────────────────────────────────────────────────

#[tokio::test]
async fn turn_on_then_off() {
    let (controller, _device) = connected().await;

    controller
        .turn_on(&zones(&["Z1"]), RequestOptions::default())
        .await
        .unwrap();
    assert!(controller.cache().zone_states.get("Z1").unwrap().is_on());

    controller
        .turn_off(&zones(&["Z1"]), RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(controller.cache().zone_states.get("Z1").unwrap().state, 0);
}

#[tokio::test]
async fn turn_on_defaults_to_every_zone() {
    let (controller, device) = connected().await;
    controller.turn_on(&[], RequestOptions::default()).await.unwrap();

    let run = device.sent().last().unwrap()["runPattern"].clone();
    assert_eq!(run["zoneName"], json!(["Z1", "Z2"]));
    assert_eq!(run["state"], 1);
    let states = controller.cache().zone_states.get_all();
    assert!(states["Z1"].is_on() && states["Z2"].is_on());
}

#[tokio::test]
async fn unknown_zone_is_rejected_before_sending() {
    let (controller, device) = connected().await;
    controller.zone_names().await.unwrap();
    let before = device.sent().len();

    let err = controller
        .turn_on(&zones(&["Garage"]), RequestOptions::default())
        .await;
    assert!(matches!(err, Err(CoreError::ValidationFailed { .. })), "{err:?}");
    assert_eq!(device.sent().len(), before);
}

#[tokio::test]
async fn apply_color_embeds_pattern_data() {
    let (controller, device) = connected().await;
    controller
        .apply_color(Rgb::new(255, 0, 0), 60, &zones(&["Z2"]), RequestOptions::default())
        .await
        .unwrap();

    let data = device.sent().last().unwrap()["runPattern"]["data"].clone();
    let data: PatternConfig = serde_json::from_str(data.as_str().unwrap()).unwrap();
    assert_eq!(data.colors, vec![255, 0, 0]);

    let state = controller.cache().zone_states.get("Z2").unwrap();
    assert_eq!(state.data.unwrap().run_data.brightness, 60);

    let err = controller
        .apply_color(Rgb::new(0, 0, 0), 101, &[], RequestOptions::default())
        .await;
    assert!(matches!(err, Err(CoreError::ValidationFailed { .. })), "{err:?}");
}

#[tokio::test]
async fn apply_light_string_and_pattern() {
    let (controller, device) = connected().await;
    let lights = [Rgb::new(255, 0, 0), Rgb::new(0, 255, 0)];
    controller
        .apply_light_string(&lights, 100, &zones(&["Z1"]), RequestOptions::default())
        .await
        .unwrap();
    let data = device.sent().last().unwrap()["runPattern"]["data"].clone();
    let data: PatternConfig = serde_json::from_str(data.as_str().unwrap()).unwrap();
    assert_eq!(data.pattern_type, "Soffit");
    assert_eq!(data.color_pos, vec![-1, 0, 1]);

    controller
        .apply_pattern("Christmas/Tree", &zones(&["Z1"]), RequestOptions::default())
        .await
        .unwrap();
    let state = controller.cache().zone_states.get("Z1").unwrap();
    assert_eq!(state.pattern_file(), Some("Christmas/Tree"));

    let err = controller
        .apply_pattern("Christmas/", &[], RequestOptions::default())
        .await;
    assert!(matches!(err, Err(CoreError::ValidationFailed { .. })), "{err:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_callers_confirm_independently() {
    let (controller, _device) = connected().await;
    controller.zone_names().await.unwrap();

    let on = {
        let controller = controller.clone();
        tokio::spawn(async move {
            controller
                .turn_on(&zones(&["Z1"]), RequestOptions::default())
                .await
        })
    };
    let off = {
        let controller = controller.clone();
        tokio::spawn(async move {
            controller
                .turn_off(&zones(&["Z2"]), RequestOptions::default())
                .await
        })
    };
    on.await.unwrap().unwrap();
    off.await.unwrap().unwrap();

    let states = controller.cache().zone_states.get_all();
    assert!(states["Z1"].is_on());
    assert!(!states["Z2"].is_on());
}

// ── Timeouts ────────────────────────────────────────────────────────

#[tokio::test]
async fn silent_device_times_out_naming_keys() {
    let (controller, device) = connected().await;
    controller.zone_names().await.unwrap();
    device.go_silent();

    let budget = Duration::from_millis(100);
    let start = Instant::now();
    let err = controller
        .turn_on(&zones(&["Z1", "Z2"]), RequestOptions::with_timeout(budget))
        .await
        .unwrap_err();
    assert!(start.elapsed() < budget * 5);

    let CoreError::Timeout { operation, keys, timeout_ms } = err else {
        panic!("expected timeout, got {err:?}");
    };
    assert_eq!(operation, "turn on");
    assert_eq!(keys, zones(&["Z1", "Z2"]));
    assert_eq!(timeout_ms, 100);
}

#[tokio::test]
async fn no_wait_returns_without_confirmation() {
    let (controller, device) = connected().await;
    device.go_silent();
    controller
        .set_name("Garage", RequestOptions::no_wait())
        .await
        .unwrap();
    assert_eq!(device.sent().last().unwrap()["ctlrName"], "Garage");
}

// ── Patterns ────────────────────────────────────────────────────────

#[tokio::test]
async fn pattern_lifecycle() {
    let (controller, _device) = connected().await;
    let config = PatternConfig::solid(Rgb::new(0, 0, 255), 80);

    controller
        .save_pattern("Folder/New", &config, RequestOptions::default())
        .await
        .unwrap();
    assert!(controller.pattern_names().await.unwrap().contains(&"Folder/New".to_owned()));
    assert_eq!(controller.pattern_configs().await.unwrap()["Folder/New"], config);

    controller
        .delete_pattern("Folder/New", RequestOptions::default())
        .await
        .unwrap();
    assert!(!controller.pattern_names().await.unwrap().contains(&"Folder/New".to_owned()));
    assert!(!controller.cache().pattern_configs.contains_key("Folder/New"));

    let err = controller
        .delete_pattern("Folder/New", RequestOptions::default())
        .await;
    assert!(matches!(err, Err(CoreError::NotFound { .. })), "{err:?}");
}

#[tokio::test]
async fn read_only_patterns_are_protected() {
    let (controller, device) = connected().await;
    controller.pattern_list().await.unwrap();
    controller.zone_names().await.unwrap();
    let before = device.sent().len();

    let err = controller
        .save_pattern("Christmas/Tree", &PatternConfig::default(), RequestOptions::default())
        .await;
    assert!(matches!(err, Err(CoreError::ValidationFailed { .. })), "{err:?}");
    let err = controller
        .delete_pattern("Christmas/Tree", RequestOptions::default())
        .await;
    assert!(matches!(err, Err(CoreError::ValidationFailed { .. })), "{err:?}");
    assert_eq!(device.sent().len(), before);
}

// ── Zone topology ───────────────────────────────────────────────────

#[tokio::test]
async fn mismatched_pixel_count_fails_validation() {
    let (controller, device) = connected().await;
    let mut zone = ZoneConfig::new(vec![PortMapping {
        ctlr_name: "JellyFish-F348.local".into(),
        phy_port: 3,
        phy_start_idx: 0,
        phy_end_idx: 49,
        zone_rgb_start_idx: 0,
    }]);
    zone.num_pixels = 40;

    let before = device.sent().len();
    let err = controller
        .add_zone("Garage", zone, RequestOptions::default())
        .await;
    assert!(matches!(err, Err(CoreError::ValidationFailed { .. })), "{err:?}");
    assert!(device.sent()[before..].iter().all(|f| f.get("save").is_none()));
}

#[tokio::test]
async fn overflowing_port_range_fails_validation() {
    let (controller, device) = connected().await;
    let zone = ZoneConfig {
        num_pixels: 0,
        port_map: vec![PortMapping {
            ctlr_name: "JellyFish-F348.local".into(),
            phy_port: 3,
            phy_start_idx: 0,
            phy_end_idx: u32::MAX,
            zone_rgb_start_idx: 0,
        }],
    };

    let before = device.sent().len();
    let err = controller
        .add_zone("Z9", zone, RequestOptions::default())
        .await;
    assert!(matches!(err, Err(CoreError::ValidationFailed { .. })), "{err:?}");
    assert!(device.sent()[before..].iter().all(|f| f.get("save").is_none()));
    assert!(controller.cache().zone_configs.get("Z9").is_none());
}

#[tokio::test]
async fn add_and_delete_zone() {
    let (controller, device) = connected().await;
    let zone = ZoneConfig {
        num_pixels: 0,
        port_map: vec![PortMapping {
            ctlr_name: String::new(),
            phy_port: 3,
            phy_start_idx: 49,
            phy_end_idx: 0,
            zone_rgb_start_idx: 49,
        }],
    };

    controller
        .add_zone("Garage", zone, RequestOptions::default())
        .await
        .unwrap();
    let garage = controller.cache().zone_configs.get("Garage").unwrap();
    assert_eq!(garage.num_pixels, 50);
    assert_eq!(garage.port_map[0].ctlr_name, "JellyFish-F348.local");

    let sent = device.sent().last().unwrap().clone();
    assert_eq!(sent["save"], true);
    assert_eq!(sent["zones"].as_object().unwrap().len(), 3);

    let err = controller
        .add_zone("Garage", ZoneConfig::new(Vec::new()), RequestOptions::default())
        .await;
    assert!(matches!(err, Err(CoreError::ValidationFailed { .. })), "{err:?}");

    controller
        .delete_zone("Garage", RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(controller.zone_names().await.unwrap(), zones(&["Z1", "Z2"]));

    let err = controller
        .delete_zone("Garage", RequestOptions::default())
        .await;
    assert!(matches!(err, Err(CoreError::NotFound { .. })), "{err:?}");
}

// ── Schedules ───────────────────────────────────────────────────────

#[tokio::test]
async fn calendar_schedule_is_replaced() {
    let (controller, _device) = connected().await;
    let first = event("eve", &["20261224"], 17);
    let second = event("day", &["20261225"], 8);

    controller
        .set_calendar_schedule(vec![first], RequestOptions::default())
        .await
        .unwrap();
    controller
        .set_calendar_schedule(vec![second.clone()], RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(controller.get_calendar_schedule(WAIT).await.unwrap(), vec![second]);
}

#[tokio::test]
async fn daily_events_accumulate_through_add() {
    let (controller, _device) = connected().await;
    controller
        .add_daily_event(event("weeknights", &["M", "T", "W"], 18), RequestOptions::default())
        .await
        .unwrap();
    controller
        .add_daily_event(event("weekend", &["SA", "S"], 17), RequestOptions::default())
        .await
        .unwrap();

    let labels: Vec<String> = controller
        .daily_schedule()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.label)
        .collect();
    assert_eq!(labels, zones(&["weeknights", "weekend"]));
}

#[tokio::test]
async fn invalid_schedule_is_rejected() {
    let (controller, _device) = connected().await;
    let err = controller
        .set_daily_schedule(vec![event("bad", &["20261224"], 17)], RequestOptions::default())
        .await;
    assert!(matches!(err, Err(CoreError::ValidationFailed { .. })), "{err:?}");
}

// ── Identity ────────────────────────────────────────────────────────

#[tokio::test]
async fn set_name_is_confirmed() {
    let (controller, _device) = connected().await;
    controller
        .set_name("Garage", RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(controller.name().await.unwrap(), "Garage");
    assert_eq!(controller.get_name(WAIT).await.unwrap(), "Garage");
}
