//! Background and font asset rules shared by the blob store and the UI.

use crate::WidgetError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Blob store key of the background media.
pub const BACKGROUND_ID: &str = "bg";
/// Blob store key of the uploaded font.
pub const FONT_ID: &str = "font";

static FONT_FILE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.(ttf|otf)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Classify background media by MIME prefix. Anything else is not displayed.
pub fn media_kind(mime: &str) -> Option<MediaKind> {
    if mime.starts_with("video/") {
        Some(MediaKind::Video)
    } else if mime.starts_with("image/") {
        Some(MediaKind::Image)
    } else {
        None
    }
}

/// Only TrueType and OpenType files are accepted as custom fonts.
pub fn validate_font_file_name(name: &str) -> Result<(), WidgetError> {
    if FONT_FILE_REGEX.is_match(name.trim()) {
        Ok(())
    } else {
        Err(WidgetError::UnsupportedFontFile(name.to_string()))
    }
}

/// Font family name for a font registered at `now_ms`.
pub fn font_family_name(now_ms: f64) -> String {
    format!("CountdownFont_{}", now_ms.max(0.0) as u64)
}

/// Numbers overlapping asynchronous loads so only the most recent one is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSequence {
    latest: u64,
}

impl LoadSequence {
    /// Ticket for a new load; every earlier ticket becomes stale.
    pub fn next(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_latest(&self, ticket: u64) -> bool {
        ticket == self.latest
    }
}

/// Everything in a blob store record except the blob itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobRecordMeta {
    pub id: String,
    #[serde(rename = "type")]
    pub mime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub timestamp: f64,
}

impl BlobRecordMeta {
    pub fn background(mime: &str, timestamp: f64) -> Self {
        Self {
            id: BACKGROUND_ID.to_string(),
            mime: mime.to_string(),
            name: None,
            timestamp,
        }
    }

    pub fn font(mime: &str, name: &str, timestamp: f64) -> Self {
        Self {
            id: FONT_ID.to_string(),
            mime: mime.to_string(),
            name: Some(name.to_string()),
            timestamp,
        }
    }
}
