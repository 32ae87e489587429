//! The persisted settings record and the normalized style derived from it.
//!
//! The record keeps every size, color and speed as the raw string the form
//! produced, so it stays readable by older saved copies. Normalization into
//! numbers and canonical colors happens when a timer is created.

use crate::defaults;
use crate::WidgetError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static HEX_COLOR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap());
static SHORT_HEX_COLOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([0-9a-fA-F])([0-9a-fA-F])([0-9a-fA-F])$").unwrap());

/// Entrance animation applied to the timer element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Animation {
    #[default]
    #[serde(rename = "none", alias = "")]
    None,
    #[serde(rename = "fadeIn")]
    FadeIn,
    #[serde(rename = "bounce")]
    Bounce,
    #[serde(rename = "pulse")]
    Pulse,
}

impl Animation {
    pub const ALL: [Animation; 4] = [
        Animation::None,
        Animation::FadeIn,
        Animation::Bounce,
        Animation::Pulse,
    ];

    /// Value used in the select element and in the stored record.
    pub fn as_str(self) -> &'static str {
        match self {
            Animation::None => "none",
            Animation::FadeIn => "fadeIn",
            Animation::Bounce => "bounce",
            Animation::Pulse => "pulse",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Animation::None => "None",
            Animation::FadeIn => "Fade In",
            Animation::Bounce => "Bounce",
            Animation::Pulse => "Pulse",
        }
    }

    /// Lenient parse for form values; unknown strings mean no animation.
    pub fn from_value(value: &str) -> Self {
        Animation::ALL
            .into_iter()
            .find(|a| a.as_str() == value)
            .unwrap_or_default()
    }

    /// The animation as an active CSS class, `None` when nothing should play.
    pub fn active(self) -> Option<Animation> {
        match self {
            Animation::None => None,
            other => Some(other),
        }
    }
}

/// One of the styled text fields of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Days,
    Hours,
    Mins,
    Secs,
}

impl Field {
    pub const ALL: [Field; 5] = [Field::Title, Field::Days, Field::Hours, Field::Mins, Field::Secs];
    pub const TIME: [Field; 4] = [Field::Days, Field::Hours, Field::Mins, Field::Secs];

    /// CSS class of the field's text node.
    pub fn class_name(self) -> &'static str {
        match self {
            Field::Title => "timer-title",
            Field::Days => "days",
            Field::Hours => "hours",
            Field::Mins => "mins",
            Field::Secs => "secs",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Days => "Days",
            Field::Hours => "Hours",
            Field::Mins => "Minutes",
            Field::Secs => "Seconds",
        }
    }

    /// Unit suffix rendered after the value.
    pub fn suffix(self) -> &'static str {
        match self {
            Field::Title => "",
            Field::Days => "d",
            Field::Hours => "h",
            Field::Mins => "m",
            Field::Secs => "s",
        }
    }

    pub fn default_size(self) -> f64 {
        match self {
            Field::Title => defaults::TITLE_SIZE_PX,
            _ => defaults::FIELD_SIZE_PX,
        }
    }
}

/// Settings record as stored under the settings key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub target_date: String,
    pub title: String,
    pub title_size: String,
    pub title_color: String,
    pub day_size: String,
    pub day_color: String,
    pub hour_size: String,
    pub hour_color: String,
    pub min_size: String,
    pub min_color: String,
    pub sec_size: String,
    pub sec_color: String,
    pub has_background: bool,
    pub animation: Animation,
    pub animation_speed: String,
}

impl Default for Settings {
    fn default() -> Self {
        let field = defaults::FIELD_SIZE_PX.to_string();
        Self {
            target_date: String::new(),
            title: String::new(),
            title_size: defaults::TITLE_SIZE_PX.to_string(),
            title_color: defaults::COLOR.to_string(),
            day_size: field.clone(),
            day_color: defaults::COLOR.to_string(),
            hour_size: field.clone(),
            hour_color: defaults::COLOR.to_string(),
            min_size: field.clone(),
            min_color: defaults::COLOR.to_string(),
            sec_size: field,
            sec_color: defaults::COLOR.to_string(),
            has_background: false,
            animation: Animation::None,
            animation_speed: defaults::ANIMATION_SPEED.to_string(),
        }
    }
}

impl Settings {
    pub fn size(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title_size,
            Field::Days => &self.day_size,
            Field::Hours => &self.hour_size,
            Field::Mins => &self.min_size,
            Field::Secs => &self.sec_size,
        }
    }

    pub fn color(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title_color,
            Field::Days => &self.day_color,
            Field::Hours => &self.hour_color,
            Field::Mins => &self.min_color,
            Field::Secs => &self.sec_color,
        }
    }

    pub fn set_size(&mut self, field: Field, value: String) {
        match field {
            Field::Title => self.title_size = value,
            Field::Days => self.day_size = value,
            Field::Hours => self.hour_size = value,
            Field::Mins => self.min_size = value,
            Field::Secs => self.sec_size = value,
        }
    }

    pub fn set_color(&mut self, field: Field, value: String) {
        match field {
            Field::Title => self.title_color = value,
            Field::Days => self.day_color = value,
            Field::Hours => self.hour_color = value,
            Field::Mins => self.min_color = value,
            Field::Secs => self.sec_color = value,
        }
    }

    /// A target date must have been chosen before a timer can be created.
    pub fn validate(&self) -> Result<(), WidgetError> {
        if self.target_date.trim().is_empty() {
            return Err(WidgetError::MissingTargetDate);
        }
        Ok(())
    }

    /// Copy with every size, color and speed rewritten to its canonical form.
    pub fn normalized(&self) -> Settings {
        let mut out = self.clone();
        out.target_date = self.target_date.trim().to_string();
        for field in Field::ALL {
            let size = normalize_size(self.size(field), field.default_size());
            out.set_size(field, format_number(size));
            out.set_color(field, normalize_color(self.color(field), defaults::COLOR));
        }
        out.animation_speed = format_number(normalize_speed(&self.animation_speed));
        out
    }

    pub fn timer_style(&self) -> TimerStyle {
        let field_style = |field: Field| FieldStyle {
            size_px: normalize_size(self.size(field), field.default_size()),
            color: normalize_color(self.color(field), defaults::COLOR),
        };
        TimerStyle {
            title: self.title.trim().to_string(),
            fields: Field::ALL.map(field_style),
            animation: self.animation,
            speed: normalize_speed(&self.animation_speed),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldStyle {
    pub size_px: f64,
    pub color: String,
}

/// Everything needed to draw a timer, with all values already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerStyle {
    pub title: String,
    fields: [FieldStyle; 5],
    pub animation: Animation,
    pub speed: f64,
}

impl TimerStyle {
    pub fn field(&self, field: Field) -> &FieldStyle {
        let idx = Field::ALL.iter().position(|f| *f == field).unwrap_or(0);
        &self.fields[idx]
    }

    pub fn animation_duration_secs(&self) -> f64 {
        animation_duration_secs(self.speed)
    }
}

/// Parse a size in pixels, clamped to the supported range.
pub fn normalize_size(input: &str, fallback: f64) -> f64 {
    match input.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v.clamp(defaults::MIN_SIZE_PX, defaults::MAX_SIZE_PX),
        _ => fallback,
    }
}

/// Accept `#rrggbb` or `#rgb`, returned as lowercase `#rrggbb`.
pub fn normalize_color(input: &str, fallback: &str) -> String {
    let trimmed = input.trim();
    if HEX_COLOR_REGEX.is_match(trimmed) {
        return trimmed.to_ascii_lowercase();
    }
    if let Some(caps) = SHORT_HEX_COLOR_REGEX.captures(trimmed) {
        return format!(
            "#{0}{0}{1}{1}{2}{2}",
            &caps[1], &caps[2], &caps[3]
        )
        .to_ascii_lowercase();
    }
    fallback.to_string()
}

pub fn normalize_speed(input: &str) -> f64 {
    match input.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => {
            v.clamp(defaults::MIN_ANIMATION_SPEED, defaults::MAX_ANIMATION_SPEED)
        }
        _ => defaults::ANIMATION_SPEED,
    }
}

/// Higher speed means a shorter animation.
pub fn animation_duration_secs(speed: f64) -> f64 {
    defaults::BASE_ANIMATION_SECS / speed
}

/// Preview font size in rem: the pixel size divided by 50, capped at 3.
pub fn preview_font_size_rem(size_px: f64) -> f64 {
    (size_px / 50.0).min(3.0)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
