//! IndexedDB-backed store for the background and font blobs.
//!
//! One database with one object store keyed by the record's `id`. Records are
//! plain objects `{ id, blob, type, name?, timestamp }`. Every operation opens
//! its own connection and closes it once the transaction has finished.

use crate::assets::{validate_font_file_name, BlobRecordMeta, BACKGROUND_ID, FONT_ID};
use crate::{js_err, WidgetError};
use log::{debug, warn};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Blob, Event, IdbDatabase, IdbFactory, IdbObjectStore, IdbObjectStoreParameters,
    IdbOpenDbRequest, IdbRequest, IdbTransaction, IdbTransactionMode,
};

pub const DB_NAME: &str = "CountdownTimerDB";
pub const DB_VERSION: u32 = 1;
pub const STORE_NAME: &str = "assets";

const BLOB_FIELD: &str = "blob";

/// A stored blob together with its metadata.
#[derive(Debug, Clone)]
pub struct BlobEntry<B = Blob> {
    pub meta: BlobRecordMeta,
    pub blob: B,
}

/// Asynchronous keyed blob storage.
#[allow(async_fn_in_trait)]
pub trait BlobStore {
    type Blob: Clone;

    async fn put(&self, entry: &BlobEntry<Self::Blob>) -> Result<(), WidgetError>;
    async fn get(&self, id: &str) -> Result<Option<BlobEntry<Self::Blob>>, WidgetError>;
    async fn delete(&self, id: &str) -> Result<(), WidgetError>;
}

/// The browser's IndexedDB.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexedDb;

impl BlobStore for IndexedDb {
    type Blob = Blob;

    async fn put(&self, entry: &BlobEntry) -> Result<(), WidgetError> {
        put(entry).await
    }

    async fn get(&self, id: &str) -> Result<Option<BlobEntry>, WidgetError> {
        get(id).await
    }

    async fn delete(&self, id: &str) -> Result<(), WidgetError> {
        delete(id).await
    }
}

/// What the page should show as background after a create.
#[derive(Debug, Clone)]
pub struct BackgroundChoice<B> {
    pub shown: Option<BlobEntry<B>>,
    /// Whether a background is persisted and should be restored next time.
    pub has_background: bool,
}

/// Pick the background: a newly picked file, then the stored blob, then none.
///
/// A picked file that cannot be stored is still shown, but not remembered.
pub async fn resolve_background<S: BlobStore>(
    store: &S,
    picked: Option<BlobEntry<S::Blob>>,
    had_background: bool,
) -> BackgroundChoice<S::Blob> {
    if let Some(entry) = picked {
        let stored = match store.put(&entry).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Could not store background, showing it unsaved: {}", e);
                false
            }
        };
        return BackgroundChoice {
            shown: Some(entry),
            has_background: stored,
        };
    }
    if !had_background {
        return BackgroundChoice {
            shown: None,
            has_background: false,
        };
    }
    match store.get(BACKGROUND_ID).await {
        Ok(Some(entry)) => BackgroundChoice {
            shown: Some(entry),
            has_background: true,
        },
        Ok(None) => BackgroundChoice {
            shown: None,
            has_background: false,
        },
        Err(e) => {
            warn!("Could not load stored background: {}", e);
            BackgroundChoice {
                shown: None,
                has_background: true,
            }
        }
    }
}

/// Persist a font file. Unsupported file names are rejected before the store is touched.
pub async fn store_font<S: BlobStore>(
    store: &S,
    name: &str,
    mime: &str,
    blob: S::Blob,
    now_ms: f64,
) -> Result<(), WidgetError> {
    validate_font_file_name(name)?;
    let entry = BlobEntry {
        meta: BlobRecordMeta::font(mime, name, now_ms),
        blob,
    };
    store.put(&entry).await
}

/// Delete both the background and the font, reporting the first failure.
pub async fn delete_assets<S: BlobStore>(store: &S) -> Result<(), WidgetError> {
    let (background, font) =
        futures::join!(store.delete(BACKGROUND_ID), store.delete(FONT_ID));
    for (id, result) in [(BACKGROUND_ID, &background), (FONT_ID, &font)] {
        if let Err(e) = result {
            warn!("Could not delete stored '{}': {}", id, e);
        }
    }
    background.and(font)
}

/// Open (creating or upgrading if needed) the asset database.
pub async fn open_db() -> Result<IdbDatabase, WidgetError> {
    let factory = idb_factory().map_err(storage_err)?;
    let request = factory
        .open_with_u32(DB_NAME, DB_VERSION)
        .map_err(storage_err)?;
    attach_upgrade_handler(&request);
    let db_value = JsFuture::from(request_to_promise(request.into()))
        .await
        .map_err(storage_err)?;
    db_value.dyn_into::<IdbDatabase>().map_err(storage_err)
}

pub async fn put(entry: &BlobEntry) -> Result<(), WidgetError> {
    let record = serde_wasm_bindgen::to_value(&entry.meta)
        .map_err(|e| WidgetError::Serialization(e.to_string()))?;
    js_sys::Reflect::set(&record, &JsValue::from_str(BLOB_FIELD), &entry.blob)
        .map_err(storage_err)?;

    with_store(IdbTransactionMode::Readwrite, |store| store.put(&record)).await?;
    debug!("stored blob '{}' ({} bytes)", entry.meta.id, entry.blob.size());
    Ok(())
}

pub async fn get(id: &str) -> Result<Option<BlobEntry>, WidgetError> {
    let key = JsValue::from_str(id);
    let value = with_store(IdbTransactionMode::Readonly, |store| store.get(&key)).await?;
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    let blob = js_sys::Reflect::get(&value, &JsValue::from_str(BLOB_FIELD))
        .map_err(storage_err)?
        .dyn_into::<Blob>()
        .map_err(storage_err)?;
    let meta: BlobRecordMeta = serde_wasm_bindgen::from_value(value)
        .map_err(|e| WidgetError::Storage(e.to_string()))?;
    Ok(Some(BlobEntry { meta, blob }))
}

pub async fn delete(id: &str) -> Result<(), WidgetError> {
    let key = JsValue::from_str(id);
    with_store(IdbTransactionMode::Readwrite, |store| store.delete(&key)).await?;
    debug!("deleted blob '{}'", id);
    Ok(())
}

/// Run one request in its own transaction and connection.
///
/// Resolves with the request's result only after the transaction has
/// committed; the connection is closed either way.
async fn with_store<F>(mode: IdbTransactionMode, op: F) -> Result<JsValue, WidgetError>
where
    F: FnOnce(&IdbObjectStore) -> Result<IdbRequest, JsValue>,
{
    let db = open_db().await?;
    let result = run_transaction(&db, mode, op).await;
    db.close();
    result
}

async fn run_transaction<F>(
    db: &IdbDatabase,
    mode: IdbTransactionMode,
    op: F,
) -> Result<JsValue, WidgetError>
where
    F: FnOnce(&IdbObjectStore) -> Result<IdbRequest, JsValue>,
{
    let tx = db
        .transaction_with_str_and_mode(STORE_NAME, mode)
        .map_err(storage_err)?;
    let committed = transaction_to_promise(&tx);
    let store = tx.object_store(STORE_NAME).map_err(storage_err)?;
    let request = op(&store).map_err(storage_err)?;
    let (value, committed) = futures::join!(
        JsFuture::from(request_to_promise(request)),
        JsFuture::from(committed)
    );
    let value = value.map_err(storage_err)?;
    committed.map_err(storage_err)?;
    Ok(value)
}

fn storage_err<T: Into<JsValue>>(error: T) -> WidgetError {
    WidgetError::Storage(js_err(error.into()))
}

fn idb_factory() -> Result<IdbFactory, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("missing window"))?;
    window
        .indexed_db()?
        .ok_or_else(|| JsValue::from_str("indexeddb unavailable"))
}

fn attach_upgrade_handler(request: &IdbOpenDbRequest) {
    let request_for_cb = request.clone();
    let on_upgrade = wasm_bindgen::closure::Closure::once(move |_event: Event| {
        let Ok(result) = request_for_cb.result() else {
            return;
        };
        let Ok(db) = result.dyn_into::<IdbDatabase>() else {
            return;
        };
        if db.object_store_names().contains(STORE_NAME) {
            return;
        }
        let params = IdbObjectStoreParameters::new();
        params.set_key_path(&JsValue::from_str("id"));
        let _ = db.create_object_store_with_optional_parameters(STORE_NAME, &params);
    });
    request.set_onupgradeneeded(Some(on_upgrade.as_ref().unchecked_ref()));
    on_upgrade.forget();
}

fn request_to_promise(request: IdbRequest) -> js_sys::Promise {
    js_sys::Promise::new(&mut |resolve, reject| {
        let success_request = request.clone();
        let on_success = wasm_bindgen::closure::Closure::once(move |_event: Event| {
            let result = success_request.result().unwrap_or(JsValue::UNDEFINED);
            let _ = resolve.call1(&JsValue::NULL, &result);
        });
        let error_request = request.clone();
        let on_error = wasm_bindgen::closure::Closure::once(move |_event: Event| {
            let reason = error_request
                .error()
                .ok()
                .flatten()
                .map(|e| JsValue::from_str(&e.message()))
                .unwrap_or_else(|| JsValue::from_str("indexeddb request failed"));
            let _ = reject.call1(&JsValue::NULL, &reason);
        });
        request.set_onsuccess(Some(on_success.as_ref().unchecked_ref()));
        request.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_success.forget();
        on_error.forget();
    })
}

/// Resolves on `complete`; rejects on `error` or `abort` with the transaction's error.
fn transaction_to_promise(tx: &IdbTransaction) -> js_sys::Promise {
    js_sys::Promise::new(&mut |resolve, reject| {
        let on_complete = wasm_bindgen::closure::Closure::once(move |_event: Event| {
            let _ = resolve.call0(&JsValue::NULL);
        });
        let failed_tx = tx.clone();
        let on_failure = wasm_bindgen::closure::Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            let reason = failed_tx
                .error()
                .map(|e| JsValue::from_str(&e.message()))
                .unwrap_or_else(|| JsValue::from_str("indexeddb transaction aborted"));
            let _ = reject.call1(&JsValue::NULL, &reason);
        });
        tx.set_oncomplete(Some(on_complete.as_ref().unchecked_ref()));
        tx.set_onerror(Some(on_failure.as_ref().unchecked_ref()));
        tx.set_onabort(Some(on_failure.as_ref().unchecked_ref()));
        on_complete.forget();
        on_failure.forget();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory blob store; blobs are plain byte vectors.
    #[derive(Default)]
    struct MemoryBlobStore {
        records: RefCell<HashMap<String, BlobEntry<Vec<u8>>>>,
        failing: bool,
    }

    impl MemoryBlobStore {
        fn with(entry: BlobEntry<Vec<u8>>) -> Self {
            let store = Self::default();
            store
                .records
                .borrow_mut()
                .insert(entry.meta.id.clone(), entry);
            store
        }

        fn blob(&self, id: &str) -> Option<Vec<u8>> {
            self.records.borrow().get(id).map(|e| e.blob.clone())
        }
    }

    impl BlobStore for MemoryBlobStore {
        type Blob = Vec<u8>;

        async fn put(&self, entry: &BlobEntry<Vec<u8>>) -> Result<(), WidgetError> {
            if self.failing {
                return Err(WidgetError::Storage("QuotaExceededError".into()));
            }
            self.records
                .borrow_mut()
                .insert(entry.meta.id.clone(), entry.clone());
            Ok(())
        }

        async fn get(&self, id: &str) -> Result<Option<BlobEntry<Vec<u8>>>, WidgetError> {
            Ok(self.records.borrow().get(id).cloned())
        }

        async fn delete(&self, id: &str) -> Result<(), WidgetError> {
            self.records.borrow_mut().remove(id);
            Ok(())
        }
    }

    fn background(bytes: &[u8], mime: &str) -> BlobEntry<Vec<u8>> {
        BlobEntry {
            meta: BlobRecordMeta::background(mime, 1.0),
            blob: bytes.to_vec(),
        }
    }

    #[test]
    fn picked_background_wins_and_is_stored() {
        let store = MemoryBlobStore::with(background(b"old", "image/png"));
        let choice = block_on(resolve_background(
            &store,
            Some(background(b"new", "video/mp4")),
            true,
        ));
        let shown = choice.shown.expect("picked background shown");
        assert_eq!(shown.blob, b"new");
        assert_eq!(shown.meta.mime, "video/mp4");
        assert!(choice.has_background);
        assert_eq!(store.blob(BACKGROUND_ID), Some(b"new".to_vec()));
    }

    #[test]
    fn stored_background_used_when_nothing_picked() {
        let store = MemoryBlobStore::with(background(b"old", "image/png"));
        let choice = block_on(resolve_background(&store, None, true));
        assert_eq!(choice.shown.map(|e| e.blob), Some(b"old".to_vec()));
        assert!(choice.has_background);
    }

    #[test]
    fn no_background_without_flag_or_record() {
        let store = MemoryBlobStore::with(background(b"old", "image/png"));
        let choice = block_on(resolve_background(&store, None, false));
        assert!(choice.shown.is_none());
        assert!(!choice.has_background);

        let empty = MemoryBlobStore::default();
        let choice = block_on(resolve_background(&empty, None, true));
        assert!(choice.shown.is_none());
        assert!(!choice.has_background);
    }

    #[test]
    fn unstored_background_is_shown_but_not_remembered() {
        let store = MemoryBlobStore {
            failing: true,
            ..MemoryBlobStore::default()
        };
        let choice = block_on(resolve_background(
            &store,
            Some(background(b"new", "image/jpeg")),
            false,
        ));
        assert!(choice.shown.is_some());
        assert!(!choice.has_background);
        assert!(store.blob(BACKGROUND_ID).is_none());
    }

    #[test]
    fn reset_removes_background_and_font() {
        let store = MemoryBlobStore::default();
        block_on(resolve_background(
            &store,
            Some(background(b"bg", "image/png")),
            false,
        ));
        block_on(store_font(&store, "Display.ttf", "font/ttf", b"glyphs".to_vec(), 2.0))
            .unwrap();

        block_on(delete_assets(&store)).unwrap();
        assert!(block_on(store.get(BACKGROUND_ID)).unwrap().is_none());
        assert!(block_on(store.get(FONT_ID)).unwrap().is_none());
        let choice = block_on(resolve_background(&store, None, true));
        assert!(choice.shown.is_none());
    }

    #[test]
    fn pdf_font_leaves_stored_font_untouched() {
        let store = MemoryBlobStore::default();
        block_on(store_font(&store, "Display.ttf", "font/ttf", b"ttf".to_vec(), 1.0)).unwrap();

        let result = block_on(store_font(
            &store,
            "font.pdf",
            "application/pdf",
            b"pdf".to_vec(),
            2.0,
        ));
        assert_eq!(result, Err(WidgetError::UnsupportedFontFile("font.pdf".into())));
        let kept = store.records.borrow().get(FONT_ID).cloned().expect("font kept");
        assert_eq!(kept.blob, b"ttf");
        assert_eq!(kept.meta.name.as_deref(), Some("Display.ttf"));
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn byte_blob(bytes: &[u8]) -> Blob {
        let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
        Blob::new_with_u8_array_sequence(&parts).expect("blob")
    }

    #[wasm_bindgen_test(async)]
    async fn aborted_write_is_reported() {
        let db = open_db().await.expect("open");
        let record = serde_wasm_bindgen::to_value(&BlobRecordMeta::background("image/png", 1.0))
            .expect("record");
        js_sys::Reflect::set(&record, &JsValue::from_str(BLOB_FIELD), &byte_blob(b"x"))
            .expect("blob field");

        let result = run_transaction(&db, IdbTransactionMode::Readwrite, |store| {
            let request = store.put(&record)?;
            store.transaction().abort()?;
            Ok(request)
        })
        .await;
        db.close();

        assert!(result.is_err());
        assert!(get(BACKGROUND_ID).await.expect("get").is_none());
    }

    #[wasm_bindgen_test(async)]
    async fn operations_leave_no_open_connection() {
        let entry = BlobEntry {
            meta: BlobRecordMeta::background("image/png", 1.0),
            blob: byte_blob(b"png"),
        };
        put(&entry).await.expect("put");
        assert!(get(BACKGROUND_ID).await.expect("get").is_some());
        delete(BACKGROUND_ID).await.expect("delete");

        // Deleting the database is blocked while any connection is still open.
        let blocked = Rc::new(Cell::new(false));
        let request = idb_factory()
            .expect("factory")
            .delete_database(DB_NAME)
            .expect("delete database");
        let flag = blocked.clone();
        let on_blocked = wasm_bindgen::closure::Closure::once(move |_event: Event| flag.set(true));
        request.set_onblocked(Some(on_blocked.as_ref().unchecked_ref()));
        on_blocked.forget();
        JsFuture::from(request_to_promise(request.into()))
            .await
            .expect("database deleted");
        assert!(!blocked.get());
    }
}
