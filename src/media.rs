//! Browser handles for uploaded media: object URLs and registered font faces.

use countdown_widget::assets::{font_family_name, media_kind, MediaKind};
use countdown_widget::{js_err, WidgetError};
use js_sys::Date;
use log::{debug, warn};
use std::rc::Rc;
use wasm_bindgen::JsValue;
use web_sys::{Blob, FontFace, Url};

/// An object URL that is revoked when dropped.
#[derive(Debug, PartialEq, Eq)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn from_blob(blob: &Blob) -> Result<Self, WidgetError> {
        Url::create_object_url_with_blob(blob)
            .map(ObjectUrl)
            .map_err(|e| WidgetError::Storage(js_err(e)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        let _ = Url::revoke_object_url(&self.0);
        debug!("revoked object url {}", self.0);
    }
}

/// Background image or video ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundMedia {
    pub url: Rc<ObjectUrl>,
    pub kind: MediaKind,
}

impl BackgroundMedia {
    /// `None` for MIME types that cannot be shown as a background.
    pub fn from_blob(blob: &Blob, mime: &str) -> Option<Self> {
        let kind = media_kind(mime)?;
        match ObjectUrl::from_blob(blob) {
            Ok(url) => Some(Self {
                url: Rc::new(url),
                kind,
            }),
            Err(e) => {
                warn!("Could not display background: {}", e);
                None
            }
        }
    }
}

/// A font face added to `document.fonts`. Dropping it removes the face and
/// releases its source URL.
#[derive(Debug)]
pub struct LoadedFont {
    family: String,
    face: FontFace,
    _source: ObjectUrl,
}

impl LoadedFont {
    pub fn family(&self) -> &str {
        &self.family
    }
}

impl PartialEq for LoadedFont {
    fn eq(&self, other: &Self) -> bool {
        self.family == other.family
    }
}

impl Drop for LoadedFont {
    fn drop(&mut self) {
        let _ = gloo_utils::document().fonts().delete(&self.face);
    }
}

/// Load `blob` as a font and register it under a freshly generated family name.
pub async fn register_font(blob: &Blob) -> Result<LoadedFont, WidgetError> {
    let source = ObjectUrl::from_blob(blob)?;
    let family = font_family_name(Date::now());
    let face = FontFace::new_with_str(&family, &format!("url(\"{}\")", source.as_str()))
        .map_err(font_err)?;
    let loading = face.load().map_err(font_err)?;
    wasm_bindgen_futures::JsFuture::from(loading)
        .await
        .map_err(font_err)?;
    gloo_utils::document()
        .fonts()
        .add(&face)
        .map_err(font_err)?;
    debug!("registered font family {}", family);
    Ok(LoadedFont {
        family,
        face,
        _source: source,
    })
}

fn font_err(error: JsValue) -> WidgetError {
    WidgetError::Storage(format!("font load failed: {}", js_err(error)))
}
