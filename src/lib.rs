use log::{debug, info};
use std::fmt;
use wasm_bindgen::JsValue;

/// Default values applied to settings fields that are absent or unusable.
pub mod defaults {
    pub const TITLE_SIZE_PX: f64 = 32.0;
    pub const FIELD_SIZE_PX: f64 = 48.0;
    pub const COLOR: &str = "#ffffff";
    pub const ANIMATION_SPEED: f64 = 1.0;

    pub const MIN_SIZE_PX: f64 = 8.0;
    pub const MAX_SIZE_PX: f64 = 300.0;
    pub const MIN_ANIMATION_SPEED: f64 = 0.25;
    pub const MAX_ANIMATION_SPEED: f64 = 3.0;

    /// Entrance animation length at speed 1.0.
    pub const BASE_ANIMATION_SECS: f64 = 1.0;
}

pub const MS_PER_SECOND: i64 = 1_000;
pub const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
pub const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
pub const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

// Errors surfaced by validation and storage
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetError {
    MissingTargetDate,
    InvalidTargetDate(String),
    UnsupportedFontFile(String),
    Serialization(String),
    StorageUnavailable,
    Storage(String),
}

impl fmt::Display for WidgetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetError::MissingTargetDate => write!(f, "Please select a date and time"),
            WidgetError::InvalidTargetDate(raw) => {
                write!(f, "'{}' is not a valid date and time", raw)
            }
            WidgetError::UnsupportedFontFile(name) => write!(
                f,
                "Unsupported font file '{}'. Please upload a .ttf or .otf file",
                name
            ),
            WidgetError::Serialization(msg) => write!(f, "Failed to encode settings: {}", msg),
            WidgetError::StorageUnavailable => write!(f, "Browser storage is unavailable"),
            WidgetError::Storage(msg) => write!(f, "Storage operation failed: {}", msg),
        }
    }
}

impl std::error::Error for WidgetError {}

/// Render a JS exception or rejection value as readable text.
pub fn js_err(error: JsValue) -> String {
    if let Some(value) = error.as_string() {
        return value;
    }
    if let Ok(json) = js_sys::JSON::stringify(&error) {
        if let Some(value) = json.as_string() {
            return value;
        }
    }
    "js error".to_string()
}

/// Whole days, hours, minutes and seconds left until the target instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Remaining {
    pub days: i64,
    pub hours: i64,
    pub mins: i64,
    pub secs: i64,
}

impl Remaining {
    /// Decompose a non-negative millisecond distance.
    pub fn from_millis(distance_ms: i64) -> Self {
        let distance = distance_ms.max(0);
        Self {
            days: distance / MS_PER_DAY,
            hours: distance % MS_PER_DAY / MS_PER_HOUR,
            mins: distance % MS_PER_HOUR / MS_PER_MINUTE,
            secs: distance % MS_PER_MINUTE / MS_PER_SECOND,
        }
    }

    /// Display strings in field order: days unpadded, the rest padded to two digits.
    pub fn display_fields(&self) -> [String; 4] {
        [
            self.days.to_string(),
            pad2(self.hours),
            pad2(self.mins),
            pad2(self.secs),
        ]
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [d, h, m, s] = self.display_fields();
        write!(f, "{}d {}h {}m {}s", d, h, m, s)
    }
}

pub fn pad2(value: i64) -> String {
    format!("{:02}", value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Running(Remaining),
    Expired,
}

/// Compute the time left between `now_ms` and `target_ms` (epoch milliseconds).
///
/// A distance of exactly zero still counts as running; only a negative
/// distance means the countdown is over.
pub fn time_remaining(target_ms: f64, now_ms: f64) -> Countdown {
    let distance = target_ms - now_ms;
    if distance < 0.0 || distance.is_nan() {
        return Countdown::Expired;
    }
    Countdown::Running(Remaining::from_millis(distance.floor() as i64))
}

/// Result of feeding one tick into a [`CountdownMachine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still running; the four field texts should show these values.
    Update(Remaining),
    /// The countdown just ran out. Emitted once per machine.
    Expired,
    /// Already expired; nothing to do.
    Idle,
}

/// RUNNING/EXPIRED state machine behind the live timer.
///
/// EXPIRED is terminal: once a tick observes a negative distance every later
/// tick is [`Tick::Idle`], even if the clock goes backwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CountdownMachine {
    target_ms: f64,
    expired: bool,
}

impl CountdownMachine {
    pub fn new(target_ms: f64) -> Self {
        Self {
            target_ms,
            expired: false,
        }
    }

    pub fn tick(&mut self, now_ms: f64) -> Tick {
        if self.expired {
            return Tick::Idle;
        }
        match time_remaining(self.target_ms, now_ms) {
            Countdown::Running(remaining) => {
                debug!("countdown tick: {}", remaining);
                Tick::Update(remaining)
            }
            Countdown::Expired => {
                self.expired = true;
                info!("countdown reached its target");
                Tick::Expired
            }
        }
    }
}

pub mod assets;
pub mod blob_store;
pub mod drag;
pub mod settings;
pub mod storage;
