//! Main module for the countdown widget using Yew.
//! Wires the settings form, persistence, preview and the live timer.

use countdown_widget::assets::{validate_font_file_name, BlobRecordMeta, FONT_ID};
use countdown_widget::blob_store::{self, BlobEntry, IndexedDb};
use countdown_widget::defaults;
use countdown_widget::settings::{Animation, Field, Settings};
use countdown_widget::storage::local_settings;
use countdown_widget::WidgetError;
use gloo_timers::callback::Timeout;
use js_sys::Date;
use log::{error, info, warn};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::spawn_local;
use web_sys::{File, HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

mod components;
mod config;
mod hooks;
mod logging;
mod media;
mod session;

use components::{BackgroundLayer, CountdownTimer, StyleFieldRow, TimerPreview};
use config::*;
use media::{register_font, BackgroundMedia};
use session::{FormState, Session};

type SharedSession = Rc<RefCell<Session>>;
type SharedForm = Rc<RefCell<FormState>>;

// ──────────────────────────────────────────────────────────────────────────────
// Helper functions

/// Blocking browser alert used for validation errors.
fn alert(message: &str) {
    if gloo_utils::window().alert_with_message(message).is_err() {
        warn!("alert suppressed: {}", message);
    }
}

fn confirm(message: &str) -> bool {
    gloo_utils::window()
        .confirm_with_message(message)
        .unwrap_or(false)
}

/// Parse the date/time input with the browser's own date semantics.
fn parse_target_instant(raw: &str) -> Result<f64, WidgetError> {
    let ms = Date::new(&JsValue::from_str(raw)).get_time();
    if ms.is_nan() {
        return Err(WidgetError::InvalidTargetDate(raw.to_string()));
    }
    Ok(ms)
}

fn selected_file(e: &Event) -> Option<File> {
    let input: HtmlInputElement = e.target_unchecked_into();
    input.files().and_then(|files| files.get(0))
}

fn file_entry(file: &File, meta: BlobRecordMeta) -> BlobEntry {
    BlobEntry {
        meta,
        blob: file.clone().into(),
    }
}

/// Handles shared by the create, restore and reset flows.
#[derive(Clone)]
struct Orchestrator {
    session: SharedSession,
    form: SharedForm,
    overlay_open: UseStateHandle<bool>,
    /// Re-renders the page from `session` and `form`; safe to call from stale clones.
    rerender: UseForceUpdateHandle,
}

impl Orchestrator {
    /// Validate the form, persist it and replace the running timer.
    async fn create_timer(self) {
        let (settings, background_file, font_file) = {
            let form = self.form.borrow();
            (
                form.settings.normalized(),
                form.background_file.clone(),
                form.font_file.clone(),
            )
        };
        if let Err(e) = settings.validate() {
            alert(&e.to_string());
            return;
        }
        let target_ms = match parse_target_instant(&settings.target_date) {
            Ok(ms) => ms,
            Err(e) => {
                alert(&e.to_string());
                return;
            }
        };

        // Closing the overlay unmounts the preview; stopping the timer drops its tick.
        self.overlay_open.set(false);
        self.session.borrow_mut().stop_timer();
        self.rerender.force_update();

        let mut settings = settings;
        let picked = background_file
            .as_ref()
            .map(|file| file_entry(file, BlobRecordMeta::background(&file.type_(), Date::now())));
        let choice =
            blob_store::resolve_background(&IndexedDb, picked, settings.has_background).await;
        let has_background = choice.has_background;
        settings.has_background = has_background;
        let background = choice
            .shown
            .and_then(|entry| BackgroundMedia::from_blob(&entry.blob, &entry.meta.mime));

        let font_stored = match font_file.as_ref() {
            Some(file) => {
                let stored = blob_store::store_font(
                    &IndexedDb,
                    &file.name(),
                    &file.type_(),
                    file.clone().into(),
                    Date::now(),
                )
                .await;
                if let Err(e) = &stored {
                    warn!("Could not store font: {}", e);
                }
                stored.is_ok()
            }
            None => false,
        };

        if let Err(e) = local_settings().and_then(|gateway| gateway.save(&settings)) {
            warn!("Could not save settings: {}", e);
        }

        {
            let mut form = self.form.borrow_mut();
            form.settings = settings.clone();
            if has_background && background_file.is_some() {
                form.background_file = None;
            }
            if font_stored {
                form.font_file = None;
            }
        }
        self.session
            .borrow_mut()
            .start(target_ms, &settings, background);
        self.rerender.force_update();
    }

    /// Load saved settings and font; resume a saved countdown shortly after.
    async fn restore(self, create: Callback<()>) {
        let saved = match local_settings() {
            Ok(gateway) => gateway.load(),
            Err(e) => {
                warn!("Settings unavailable: {}", e);
                None
            }
        };
        let resume = saved
            .as_ref()
            .map(|s| !s.target_date.trim().is_empty())
            .unwrap_or(false);
        if let Some(settings) = saved {
            self.form.borrow_mut().settings = settings;
            self.rerender.force_update();
        }

        let ticket = self.session.borrow_mut().begin_font_load();
        match blob_store::get(FONT_ID).await {
            Ok(Some(entry)) => match register_font(&entry.blob).await {
                Ok(font) => {
                    if self.session.borrow_mut().finish_font_load(ticket, font) {
                        self.rerender.force_update();
                    }
                }
                Err(e) => warn!("Could not restore font: {}", e),
            },
            Ok(None) => {}
            Err(e) => warn!("Could not read stored font: {}", e),
        }

        if resume {
            info!("resuming saved countdown");
            Timeout::new(AUTOSTART_DELAY_MS, move || create.emit(())).forget();
        }
    }

    /// Accept a picked font file, register it right away for the preview.
    fn pick_font(&self, input: &HtmlInputElement) {
        let Some(file) = input.files().and_then(|files| files.get(0)) else {
            return;
        };
        if let Err(e) = validate_font_file_name(&file.name()) {
            alert(&e.to_string());
            input.set_value("");
            return;
        }
        self.form.borrow_mut().font_file = Some(file.clone());
        let ticket = self.session.borrow_mut().begin_font_load();
        let this = self.clone();
        spawn_local(async move {
            match register_font(&file).await {
                Ok(font) => {
                    if this.session.borrow_mut().finish_font_load(ticket, font) {
                        this.rerender.force_update();
                    }
                }
                Err(e) => warn!("Could not load font '{}': {}", file.name(), e),
            }
        });
    }

    /// Clear every persisted setting and blob, then reload the page.
    async fn reset(self) {
        if let Err(e) = local_settings().and_then(|gateway| gateway.clear()) {
            warn!("Could not clear settings: {}", e);
        }
        // failures are logged per asset; the reload still happens
        let _ = blob_store::delete_assets(&IndexedDb).await;
        self.session.borrow_mut().clear();
        self.rerender.force_update();
        info!("all settings reset");
        if let Err(e) = gloo_utils::window().location().reload() {
            error!("reload failed: {}", countdown_widget::js_err(e));
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────

/// Primary application component: top bar, timer area and settings overlay.
#[function_component(Main)]
fn main_component() -> Html {
    let session = use_mut_ref(Session::default);
    let form = use_mut_ref(FormState::default);
    let overlay_open = use_state(|| false);
    let rerender = use_force_update();
    let top_bar = use_node_ref();

    let orchestrator = Orchestrator {
        session: session.clone(),
        form: form.clone(),
        overlay_open: overlay_open.clone(),
        rerender,
    };

    let create = {
        let orchestrator = orchestrator.clone();
        Callback::from(move |_: ()| {
            spawn_local(orchestrator.clone().create_timer());
        })
    };

    // Restore saved state on mount
    {
        let orchestrator = orchestrator.clone();
        let create = create.clone();
        use_effect_with((), move |_| {
            spawn_local(orchestrator.restore(create));
        });
    }

    let reset = {
        let orchestrator = orchestrator.clone();
        Callback::from(move |_: MouseEvent| {
            if confirm(RESET_CONFIRM_MESSAGE) {
                spawn_local(orchestrator.clone().reset());
            }
        })
    };

    let open_settings = {
        let overlay_open = overlay_open.clone();
        Callback::from(move |_: MouseEvent| overlay_open.set(true))
    };

    let close_on_backdrop = {
        let overlay_open = overlay_open.clone();
        Callback::from(move |e: MouseEvent| {
            if e.target() == e.current_target() {
                overlay_open.set(false);
            }
        })
    };

    // --- Form input handlers (write into the form model, no re-render) ---
    let text_input = |apply: fn(&mut Settings, String)| {
        let form = form.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            apply(&mut form.borrow_mut().settings, input.value());
        })
    };
    let target_date_oninput = text_input(|s, v| s.target_date = v);
    let title_oninput = text_input(|s, v| s.title = v);
    let speed_oninput = text_input(|s, v| s.animation_speed = v);

    let animation_onchange = {
        let form = form.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            form.borrow_mut().settings.animation = Animation::from_value(&select.value());
        })
    };

    let background_onchange = {
        let form = form.clone();
        Callback::from(move |e: Event| {
            form.borrow_mut().background_file = selected_file(&e);
        })
    };

    let font_onchange = {
        let orchestrator = orchestrator.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            orchestrator.pick_font(&input);
        })
    };

    let session_ref = session.borrow();
    let font_family = session_ref.font_family();
    let background = session_ref.background().cloned();
    let current = form.borrow().settings.clone();

    html! {
        <div class="app">
            <div class="top-bar" ref={top_bar.clone()}>
                <span class="app-title">{ "Countdown" }</span>
                <button id="settingsBtn" class="settings-btn" onclick={open_settings}>
                    { "Settings" }
                </button>
            </div>

            <div class="main-area">
                <BackgroundLayer media={background.clone()} />
                <div id="timerDisplay" class="timer-display">
                    if let Some(timer) = session_ref.timer() {
                        <CountdownTimer
                            key={timer.generation.to_string()}
                            target_ms={timer.target_ms}
                            style={timer.style.clone()}
                            font_family={font_family.clone()}
                            top_bar={top_bar.clone()}
                        />
                    }
                </div>
            </div>

            if *overlay_open {
                <div id="overlay" class="overlay" onclick={close_on_backdrop}>
                    <div class="settings-panel">
                        <h2>{ "Timer Settings" }</h2>

                        <div class="form-group">
                            <label for="targetDate">{ "Target date & time" }</label>
                            <input
                                type="datetime-local"
                                id="targetDate"
                                value={current.target_date.clone()}
                                oninput={target_date_oninput}
                            />
                        </div>

                        <div class="form-group">
                            <label for="title">{ "Title" }</label>
                            <input
                                type="text"
                                id="title"
                                placeholder="Optional"
                                value={current.title.clone()}
                                oninput={title_oninput}
                            />
                        </div>

                        <div class="form-row">
                            <div class="form-group">
                                <label for="backgroundUpload">{ "Background (image or video)" }</label>
                                <input
                                    type="file"
                                    id="backgroundUpload"
                                    accept="image/*,video/*"
                                    onchange={background_onchange}
                                />
                            </div>
                            <div class="form-group">
                                <label for="fontUpload">{ "Font (.ttf / .otf)" }</label>
                                <input
                                    type="file"
                                    id="fontUpload"
                                    accept=".ttf,.otf"
                                    onchange={font_onchange}
                                />
                            </div>
                        </div>

                        <div class="style-fields">
                            { for Field::ALL.iter().map(|&field| {
                                let on_size = {
                                    let form = form.clone();
                                    Callback::from(move |v: String| form.borrow_mut().settings.set_size(field, v))
                                };
                                let on_color = {
                                    let form = form.clone();
                                    Callback::from(move |v: String| form.borrow_mut().settings.set_color(field, v))
                                };
                                html! {
                                    <StyleFieldRow
                                        field={field}
                                        size={current.size(field).to_string()}
                                        color={current.color(field).to_string()}
                                        {on_size}
                                        {on_color}
                                    />
                                }
                            }) }
                        </div>

                        <div class="form-row">
                            <div class="form-group">
                                <label for="animation">{ "Entrance animation" }</label>
                                <select id="animation" onchange={animation_onchange}>
                                    { for Animation::ALL.iter().map(|a| html! {
                                        <option value={a.as_str()} selected={*a == current.animation}>
                                            { a.label() }
                                        </option>
                                    }) }
                                </select>
                            </div>
                            <div class="form-group">
                                <label for="animationSpeed">{ "Animation speed" }</label>
                                <input
                                    type="range"
                                    id="animationSpeed"
                                    min={defaults::MIN_ANIMATION_SPEED.to_string()}
                                    max={defaults::MAX_ANIMATION_SPEED.to_string()}
                                    step={SPEED_STEP}
                                    value={current.animation_speed.clone()}
                                    oninput={speed_oninput}
                                />
                            </div>
                        </div>

                        <TimerPreview
                            form={form.clone()}
                            font_family={font_family.clone()}
                            fallback_background={background.clone()}
                        />

                        <div class="actions">
                            <button id="createBtn" class="btn-primary" onclick={create.reform(|_: MouseEvent| ())}>
                                { "Create Timer" }
                            </button>
                            <button id="resetBtn" class="btn-secondary" onclick={reset}>
                                { "Reset" }
                            </button>
                        </div>
                    </div>
                </div>
            }
        </div>
    }
}

/// Entry point: installs logging and panic reporting, then renders the app.
fn main() {
    console_error_panic_hook::set_once();
    logging::init(LOG_LEVEL);
    info!("countdown widget starting");
    yew::Renderer::<Main>::new().render();
}
