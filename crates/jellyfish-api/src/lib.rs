// jellyfish-api: wire model, protocol codec, and WebSocket transport for
// JellyFish Lighting controllers

pub mod embedded;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod types;
pub mod websocket;

pub use error::Error;
pub use protocol::{Inbound, Query, Request};
pub use transport::{Connector, FrameListener, Transport};
pub use types::{
    ActionKind, FirmwareVersion, Pattern, PatternConfig, PatternFileData, PortMapping, Rgb,
    RunConfig, ScheduleEvent, ScheduleEventAction, ScheduleKind, StartFrom, TimeConfig,
    ZoneConfig, ZoneState,
};
pub use websocket::{WebSocketConnector, WebSocketTransport};

/// Port the controller's WebSocket server listens on.
pub const DEFAULT_PORT: u16 = 9000;
