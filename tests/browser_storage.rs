#![cfg(target_arch = "wasm32")]

use countdown_widget::assets::{BlobRecordMeta, BACKGROUND_ID, FONT_ID};
use countdown_widget::blob_store::{self, BlobEntry, IndexedDb};
use countdown_widget::settings::{Animation, Field, Settings};
use countdown_widget::storage::local_settings;
use js_sys::Array;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;
use web_sys::{Blob, BlobPropertyBag};

wasm_bindgen_test_configure!(run_in_browser);

fn text_blob(contents: &str, mime: &str) -> Blob {
    let parts = Array::of1(&JsValue::from_str(contents));
    let options = BlobPropertyBag::new();
    options.set_type(mime);
    Blob::new_with_str_sequence_and_options(&parts, &options).expect("blob")
}

#[wasm_bindgen_test]
fn settings_survive_local_storage_round_trip() {
    let gateway = local_settings().expect("localStorage");
    gateway.clear().expect("clear");
    assert!(gateway.load().is_none());

    let mut settings = Settings {
        target_date: "2030-01-01T00:00".into(),
        title: "Launch".into(),
        animation: Animation::Bounce,
        ..Settings::default()
    };
    settings.set_size(Field::Title, "32".into());
    settings.set_color(Field::Title, "#ff6b6b".into());
    gateway.save(&settings).expect("save");

    let loaded = gateway.load().expect("stored settings");
    assert_eq!(loaded.title, "Launch");
    assert_eq!(loaded.size(Field::Title), "32");
    assert_eq!(loaded.color(Field::Title), "#ff6b6b");
    assert_eq!(loaded.animation, Animation::Bounce);

    gateway.clear().expect("clear");
    assert!(gateway.load().is_none());
}

#[wasm_bindgen_test(async)]
async fn background_blob_is_stored_and_deleted() {
    let entry = BlobEntry {
        meta: BlobRecordMeta::background("image/png", 1_700_000_000_000.0),
        blob: text_blob("not really a png", "image/png"),
    };
    blob_store::put(&entry).await.expect("put");

    let stored = blob_store::get(BACKGROUND_ID)
        .await
        .expect("get")
        .expect("stored background");
    assert_eq!(stored.meta, entry.meta);
    assert_eq!(stored.blob.size(), entry.blob.size());

    blob_store::delete(BACKGROUND_ID).await.expect("delete");
    assert!(blob_store::get(BACKGROUND_ID).await.expect("get").is_none());
}

#[wasm_bindgen_test(async)]
async fn font_record_keeps_file_name() {
    let entry = BlobEntry {
        meta: BlobRecordMeta::font("font/ttf", "Display.ttf", 42.0),
        blob: text_blob("glyphs", "font/ttf"),
    };
    blob_store::put(&entry).await.expect("put");

    let stored = blob_store::get(FONT_ID).await.expect("get").expect("stored font");
    assert_eq!(stored.meta.name.as_deref(), Some("Display.ttf"));
    assert_eq!(stored.meta.mime, "font/ttf");

    blob_store::delete(FONT_ID).await.expect("delete");
}

#[wasm_bindgen_test(async)]
async fn deleting_missing_blob_is_not_an_error() {
    blob_store::delete("missing").await.expect("delete");
    assert!(blob_store::get("missing").await.expect("get").is_none());
}

#[wasm_bindgen_test(async)]
async fn uploaded_background_is_gone_after_reset() {
    let picked = BlobEntry {
        meta: BlobRecordMeta::background("image/png", 7.0),
        blob: text_blob("picked", "image/png"),
    };
    let choice = blob_store::resolve_background(&IndexedDb, Some(picked), false).await;
    assert!(choice.has_background);
    assert!(choice.shown.is_some());

    let restored = blob_store::resolve_background(&IndexedDb, None, true).await;
    let shown = restored.shown.expect("stored background restored");
    assert_eq!(shown.meta.mime, "image/png");

    blob_store::delete_assets(&IndexedDb).await.expect("reset");
    assert!(blob_store::get(BACKGROUND_ID).await.expect("get").is_none());
    let after_reset = blob_store::resolve_background(&IndexedDb, None, true).await;
    assert!(after_reset.shown.is_none());
    assert!(!after_reset.has_background);
}
