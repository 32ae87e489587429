//! Application-level configuration constants.

use log::LevelFilter;

// Ticks
pub const COUNTDOWN_TICK_MS: u32 = 1_000;
pub const PREVIEW_TICK_MS: u32 = 100;
/// Delay before a saved timer is recreated after page load.
pub const AUTOSTART_DELAY_MS: u32 = 100;

// Text
pub const EXPIRED_MESSAGE: &str = "Time's up!";
pub const RESET_CONFIRM_MESSAGE: &str =
    "Reset all settings? This removes the saved timer, background and font.";

// Placeholder values shown by the settings preview
pub const PREVIEW_TITLE: &str = "Preview";
pub const PREVIEW_FIELDS: [&str; 4] = ["12", "05", "30", "45"];

// Slider range for the animation speed input
pub const SPEED_STEP: &str = "0.25";

pub const LOG_LEVEL: LevelFilter = if cfg!(debug_assertions) {
    LevelFilter::Debug
} else {
    LevelFilter::Info
};
