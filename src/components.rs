//! Yew components for the live timer, the settings preview and the
//! background layer.

use crate::config::{EXPIRED_MESSAGE, PREVIEW_FIELDS, PREVIEW_TICK_MS, PREVIEW_TITLE};
use crate::hooks::{use_countdown, use_drag, use_sampled};
use crate::media::BackgroundMedia;
use crate::session::FormState;
use countdown_widget::assets::MediaKind;
use countdown_widget::settings::{preview_font_size_rem, Field, FieldStyle, TimerStyle};
use countdown_widget::{defaults, js_err, Countdown};
use log::warn;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{File, HtmlInputElement, HtmlMediaElement};
use yew::prelude::*;

/// How field sizes are expressed in CSS.
#[derive(Clone, Copy, PartialEq)]
enum SizeUnit {
    /// Literal pixels, used by the real timer.
    Px,
    /// Scaled rem, used by the preview.
    PreviewRem,
}

fn field_css(style: &FieldStyle, unit: SizeUnit) -> String {
    match unit {
        SizeUnit::Px => format!("font-size: {}px; color: {};", style.size_px, style.color),
        SizeUnit::PreviewRem => format!(
            "font-size: {}rem; color: {};",
            preview_font_size_rem(style.size_px),
            style.color
        ),
    }
}

fn font_css(font_family: Option<&str>) -> String {
    font_family
        .map(|family| format!(" font-family: '{}', sans-serif;", family))
        .unwrap_or_default()
}

fn render_title(style: &TimerStyle, unit: SizeUnit) -> Html {
    if style.title.is_empty() {
        return html! {};
    }
    html! {
        <p class={Field::Title.class_name()} style={field_css(style.field(Field::Title), unit)}>
            { style.title.as_str() }
        </p>
    }
}

fn render_time_row(style: &TimerStyle, values: &[String; 4], unit: SizeUnit) -> Html {
    html! {
        <div class="time-row">
            { for Field::TIME.iter().zip(values.iter()).map(|(field, value)| html! {
                <>
                    <span class={field.class_name()} style={field_css(style.field(*field), unit)}>
                        { value.as_str() }
                    </span>
                    { field.suffix() }
                </>
            }) }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct CountdownTimerProps {
    pub target_ms: f64,
    pub style: Rc<TimerStyle>,
    #[prop_or_default]
    pub font_family: Option<String>,
    /// Reserved bar at the top of the page the timer may not be dragged under.
    pub top_bar: NodeRef,
}

/// The live, draggable countdown. One instance per created timer; give it a
/// fresh `key` to replace it.
#[function_component(CountdownTimer)]
pub fn countdown_timer(props: &CountdownTimerProps) -> Html {
    let element = use_node_ref();
    let countdown = use_countdown(props.target_ms);
    let drag = use_drag(
        props.style.animation,
        props.style.speed,
        element.clone(),
        props.top_bar.clone(),
    );

    let mut css = match drag.position {
        Some(pos) => format!(
            "position: absolute; left: {}px; top: {}px; translate: none;",
            pos.x, pos.y
        ),
        None => "position: absolute; top: 50%; left: 50%; translate: -50% -50%;".to_string(),
    };
    if let Some(secs) = drag.animation_duration_secs {
        css.push_str(&format!(" animation-duration: {}s;", secs));
    }
    css.push_str(&font_css(props.font_family.as_deref()));

    let content = match countdown {
        Countdown::Running(remaining) => html! {
            <>
                { render_title(&props.style, SizeUnit::Px) }
                { render_time_row(&props.style, &remaining.display_fields(), SizeUnit::Px) }
            </>
        },
        Countdown::Expired => html! { { EXPIRED_MESSAGE } },
    };

    html! {
        <div
            ref={element}
            class={classes!("timer", "draggable", drag.active_animation.map(|a| a.as_str()))}
            style={css}
            onpointerdown={drag.onpointerdown.clone()}
            onpointermove={drag.onpointermove.clone()}
            onpointerup={drag.onpointerup.clone()}
            onpointercancel={drag.onpointerup.clone()}
        >
            { content }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct BackgroundLayerProps {
    #[prop_or_default]
    pub media: Option<BackgroundMedia>,
}

/// At most one background container, holding an image or a muted looping video.
#[function_component(BackgroundLayer)]
pub fn background_layer(props: &BackgroundLayerProps) -> Html {
    let video = use_node_ref();
    let src = props.media.as_ref().map(|media| media.url.as_str().to_string());

    // `muted` must be set as a property; the attribute only applies at element creation.
    {
        let video = video.clone();
        use_effect_with(src.clone(), move |_| {
            if let Some(element) = video.cast::<HtmlMediaElement>() {
                start_muted_playback(&element);
            }
        });
    }

    let (Some(media), Some(src)) = (&props.media, src) else {
        return html! {};
    };
    html! {
        <div class="background-container">
            {
                match media.kind {
                    MediaKind::Image => html! {
                        <img class="background-media" src={src} alt="Countdown background" />
                    },
                    MediaKind::Video => html! {
                        <video
                            ref={video}
                            class="background-media"
                            src={src}
                            autoplay=true
                            loop=true
                            muted=true
                            playsinline=true
                        />
                    },
                }
            }
        </div>
    }
}

fn start_muted_playback(element: &HtmlMediaElement) {
    element.set_muted(true);
    element.set_default_muted(true);
    match element.play() {
        Ok(playing) => spawn_local(async move {
            if let Err(e) = JsFuture::from(playing).await {
                warn!("Background video did not start: {}", js_err(e));
            }
        }),
        Err(e) => warn!("Background video did not start: {}", js_err(e)),
    }
}

#[derive(Properties, PartialEq)]
pub struct TimerPreviewProps {
    pub form: Rc<RefCell<FormState>>,
    #[prop_or_default]
    pub font_family: Option<String>,
    /// Shown when no new background file has been picked.
    #[prop_or_default]
    pub fallback_background: Option<BackgroundMedia>,
}

#[derive(Clone, PartialEq)]
struct PreviewModel {
    style: TimerStyle,
    background_file: Option<File>,
}

/// Scaled mirror of the timer shown inside the settings panel.
///
/// Samples the form every 100ms with placeholder time values. Unmounting it
/// cancels the tick and releases the preview's own object URL.
#[function_component(TimerPreview)]
pub fn timer_preview(props: &TimerPreviewProps) -> Html {
    let sample: Rc<dyn Fn() -> PreviewModel> = {
        let form = props.form.clone();
        Rc::new(move || {
            let form = form.borrow();
            let mut style = form.settings.timer_style();
            if style.title.is_empty() {
                style.title = PREVIEW_TITLE.to_string();
            }
            PreviewModel {
                style,
                background_file: form.background_file.clone(),
            }
        })
    };
    let model = use_sampled(PREVIEW_TICK_MS, sample);
    let picked_background = use_mut_ref(|| None::<(File, BackgroundMedia)>);

    let background = match &model.background_file {
        Some(file) => {
            let mut slot = picked_background.borrow_mut();
            let stale = slot.as_ref().map(|(shown, _)| shown != file).unwrap_or(true);
            if stale {
                *slot = BackgroundMedia::from_blob(file, &file.type_())
                    .map(|media| (file.clone(), media));
            }
            let media = slot.as_ref().map(|(_, media)| media.clone());
            media
        }
        None => {
            picked_background.borrow_mut().take();
            props.fallback_background.clone()
        }
    };

    let mut css = font_css(props.font_family.as_deref());
    if model.style.animation.active().is_some() {
        css.push_str(&format!(
            " animation-duration: {}s;",
            model.style.animation_duration_secs()
        ));
    }
    let values = PREVIEW_FIELDS.map(str::to_string);

    html! {
        <div class="preview-area">
            <BackgroundLayer media={background} />
            <div
                class={classes!("timer", "preview-timer", model.style.animation.active().map(|a| a.as_str()))}
                style={css}
            >
                { render_title(&model.style, SizeUnit::PreviewRem) }
                { render_time_row(&model.style, &values, SizeUnit::PreviewRem) }
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct StyleFieldRowProps {
    pub field: Field,
    pub size: String,
    pub color: String,
    pub on_size: Callback<String>,
    pub on_color: Callback<String>,
}

/// Size and color inputs for one timer field.
#[function_component(StyleFieldRow)]
pub fn style_field_row(props: &StyleFieldRowProps) -> Html {
    let data_type = props.field.class_name().trim_start_matches("timer-").to_string();
    let size_input = {
        let on_size = props.on_size.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            on_size.emit(input.value());
        })
    };
    let color_input = {
        let on_color = props.on_color.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            on_color.emit(input.value());
        })
    };

    html! {
        <div class="form-group style-row">
            <label>{ props.field.label() }</label>
            <input
                type="number"
                class="size"
                data-type={data_type.clone()}
                min={defaults::MIN_SIZE_PX.to_string()}
                max={defaults::MAX_SIZE_PX.to_string()}
                value={props.size.clone()}
                oninput={size_input}
            />
            <input
                type="color"
                class="color"
                data-type={data_type}
                value={props.color.clone()}
                oninput={color_input}
            />
        </div>
    }
}
