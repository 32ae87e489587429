use crate::config::COUNTDOWN_TICK_MS;
use countdown_widget::drag::{Bounds, DragController, Point, Size};
use countdown_widget::settings::Animation;
use countdown_widget::{time_remaining, Countdown, CountdownMachine, Tick};
use gloo_timers::callback::Interval;
use js_sys::Date;
use std::rc::Rc;
use web_sys::{Element, HtmlElement, PointerEvent};
use yew::prelude::*;

/// Live countdown towards `target_ms`, ticking once per second.
///
/// The interval is owned by the effect: it is dropped when the countdown
/// expires or the component unmounts, so at most one tick is ever scheduled.
#[hook]
pub fn use_countdown(target_ms: f64) -> Countdown {
    let machine = use_mut_ref(|| CountdownMachine::new(target_ms));
    let display = use_state(|| time_remaining(target_ms, Date::now()));
    let expired = matches!(*display, Countdown::Expired);

    {
        let machine = machine.clone();
        let display = display.clone();
        use_effect_with((target_ms, expired), move |&(_, expired)| {
            let mut interval = None;
            if !expired {
                let tick = move || match machine.borrow_mut().tick(Date::now()) {
                    Tick::Update(remaining) => display.set(Countdown::Running(remaining)),
                    Tick::Expired => display.set(Countdown::Expired),
                    Tick::Idle => {}
                };
                tick();
                interval = Some(Interval::new(COUNTDOWN_TICK_MS, tick));
            }
            move || drop(interval)
        });
    }

    *display
}

/// Re-sample `sample` every `period_ms` and re-render only when the value changed.
#[hook]
pub fn use_sampled<T>(period_ms: u32, sample: Rc<dyn Fn() -> T>) -> T
where
    T: Clone + PartialEq + 'static,
{
    let current = use_state({
        let sample = sample.clone();
        move || sample()
    });
    let latest = use_mut_ref(|| (*current).clone());

    {
        let current = current.clone();
        use_effect_with(period_ms, move |&period| {
            let interval = Interval::new(period, move || {
                let next = sample();
                if *latest.borrow() != next {
                    *latest.borrow_mut() = next.clone();
                    current.set(next);
                }
            });
            move || drop(interval)
        });
    }

    (*current).clone()
}

/// Drag state and pointer callbacks for one draggable element.
#[derive(Clone)]
pub struct DragHandle {
    pub position: Option<Point>,
    pub active_animation: Option<Animation>,
    pub animation_duration_secs: Option<f64>,
    pub onpointerdown: Callback<PointerEvent>,
    pub onpointermove: Callback<PointerEvent>,
    pub onpointerup: Callback<PointerEvent>,
}

/// Make the element behind `element` draggable inside the viewport, below
/// the element behind `top_bar`. `speed` scales the restored animation.
#[hook]
pub fn use_drag(
    configured: Animation,
    speed: f64,
    element: NodeRef,
    top_bar: NodeRef,
) -> DragHandle {
    let controller = use_mut_ref(|| DragController::new(configured));
    let force_update = use_force_update();

    let onpointerdown = {
        let controller = controller.clone();
        let element = element.clone();
        let force_update = force_update.clone();
        Callback::from(move |event: PointerEvent| {
            if event.button() != 0 {
                return;
            }
            let Some(el) = element.cast::<HtmlElement>() else {
                return;
            };
            event.prevent_default();
            let rect = el.get_bounding_client_rect();
            controller.borrow_mut().begin(
                event.pointer_id(),
                pointer_of(&event),
                Point::new(rect.left(), rect.top()),
                container_origin(&el),
            );
            let _ = el.set_pointer_capture(event.pointer_id());
            force_update.force_update();
        })
    };

    let onpointermove = {
        let controller = controller.clone();
        let element = element.clone();
        let force_update = force_update.clone();
        Callback::from(move |event: PointerEvent| {
            if !controller.borrow().is_dragging() {
                return;
            }
            let Some(el) = element.cast::<HtmlElement>() else {
                return;
            };
            event.prevent_default();
            let rect = el.get_bounding_client_rect();
            let bounds = Bounds {
                viewport: viewport_size(),
                top_bar_bottom: top_bar
                    .cast::<Element>()
                    .map(|bar| bar.get_bounding_client_rect().bottom())
                    .unwrap_or(0.0),
            };
            let moved = controller.borrow_mut().drag_to(
                event.pointer_id(),
                pointer_of(&event),
                Size::new(rect.width(), rect.height()),
                container_origin(&el),
                &bounds,
            );
            if moved.is_some() {
                force_update.force_update();
            }
        })
    };

    let onpointerup = {
        let controller = controller.clone();
        let element = element.clone();
        Callback::from(move |event: PointerEvent| {
            let ended = controller.borrow_mut().end(event.pointer_id());
            if ended {
                if let Some(el) = element.cast::<Element>() {
                    let _ = el.release_pointer_capture(event.pointer_id());
                }
                force_update.force_update();
            }
        })
    };

    let state = controller.borrow();
    DragHandle {
        position: state.position(),
        active_animation: state.active_animation(),
        animation_duration_secs: state.animation_duration_secs(speed),
        onpointerdown,
        onpointermove,
        onpointerup,
    }
}

fn pointer_of(event: &PointerEvent) -> Point {
    Point::new(event.client_x() as f64, event.client_y() as f64)
}

/// Viewport-space origin of the element's containing block.
fn container_origin(el: &HtmlElement) -> Point {
    el.offset_parent()
        .map(|parent| {
            let rect = parent.get_bounding_client_rect();
            Point::new(rect.left(), rect.top())
        })
        .unwrap_or_default()
}

fn viewport_size() -> Size {
    let window = gloo_utils::window();
    let dimension = |value: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
        value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
    };
    Size::new(
        dimension(window.inner_width()),
        dimension(window.inner_height()),
    )
}
