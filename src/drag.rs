//! Pointer-drag tracking for the timer element.
//!
//! The controller does the coordinate arithmetic only; the caller measures
//! the DOM (element size, containing-block origin, viewport, top bar) and
//! applies the resulting container-relative `left`/`top`.

use crate::settings::Animation;
use log::debug;
use std::ops::{Add, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// The area the element may occupy: the viewport minus the top bar.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub viewport: Size,
    pub top_bar_bottom: f64,
}

/// Clamp a viewport-space origin so a box of `element` size stays inside
/// `[0, vw - w] x [top_bar_bottom, vh - h]`.
///
/// When the element is larger than the available space the lower bound wins.
pub fn clamp_to_viewport(origin: Point, element: Size, bounds: &Bounds) -> Point {
    let max_left = bounds.viewport.width - element.width;
    let max_top = bounds.viewport.height - element.height;
    Point::new(
        origin.x.min(max_left).max(0.0),
        origin.y.min(max_top).max(bounds.top_bar_bottom),
    )
}

#[derive(Debug, Clone, PartialEq)]
struct DragSession {
    pointer_id: i32,
    last_pointer: Point,
    removed_animation: Option<Animation>,
}

/// Drag state for one timer element.
#[derive(Debug, Clone, PartialEq)]
pub struct DragController {
    configured: Animation,
    active_animation: Option<Animation>,
    position: Option<Point>,
    session: Option<DragSession>,
}

impl DragController {
    pub fn new(configured: Animation) -> Self {
        Self {
            configured,
            active_animation: configured.active(),
            position: None,
            session: None,
        }
    }

    /// Container-relative `left`/`top` once the element has been grabbed.
    /// `None` means the element is still centered by its stylesheet.
    pub fn position(&self) -> Option<Point> {
        self.position
    }

    pub fn active_animation(&self) -> Option<Animation> {
        self.active_animation
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Animation duration to apply, or `None` when no animation class is active.
    pub fn animation_duration_secs(&self, speed: f64) -> Option<f64> {
        self.active_animation
            .map(|_| crate::settings::animation_duration_secs(speed))
    }

    /// Start a drag. `element_origin` and `container_origin` are the current
    /// viewport-space top-left corners of the element and its containing block.
    pub fn begin(
        &mut self,
        pointer_id: i32,
        pointer: Point,
        element_origin: Point,
        container_origin: Point,
    ) {
        let removed_animation = self.active_animation.take();
        self.position = Some(element_origin - container_origin);
        self.session = Some(DragSession {
            pointer_id,
            last_pointer: pointer,
            removed_animation,
        });
        debug!("drag started at {:?}", self.position);
    }

    /// Apply a pointer move and return the new container-relative position.
    ///
    /// Moves from a pointer other than the one that started the drag are ignored.
    pub fn drag_to(
        &mut self,
        pointer_id: i32,
        pointer: Point,
        element: Size,
        container_origin: Point,
        bounds: &Bounds,
    ) -> Option<Point> {
        let session = self.session.as_mut()?;
        if session.pointer_id != pointer_id {
            return None;
        }
        let delta = pointer - session.last_pointer;
        session.last_pointer = pointer;

        let current = self.position.unwrap_or_default() + container_origin;
        let clamped = clamp_to_viewport(current + delta, element, bounds);
        let relative = clamped - container_origin;
        self.position = Some(relative);
        Some(relative)
    }

    /// Finish the drag and restore the entrance animation. Returns `false`
    /// when no drag by this pointer was in progress.
    pub fn end(&mut self, pointer_id: i32) -> bool {
        match &self.session {
            Some(session) if session.pointer_id == pointer_id => {}
            _ => return false,
        }
        if let Some(session) = self.session.take() {
            self.active_animation = session
                .removed_animation
                .or_else(|| self.configured.active());
        }
        debug!("drag ended at {:?}", self.position);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Bounds {
        Bounds {
            viewport: Size::new(1024.0, 768.0),
            top_bar_bottom: 60.0,
        }
    }

    #[test]
    fn clamp_keeps_box_inside_viewport_below_top_bar() {
        let element = Size::new(200.0, 100.0);
        let b = bounds();
        assert_eq!(
            clamp_to_viewport(Point::new(-50.0, 0.0), element, &b),
            Point::new(0.0, 60.0)
        );
        assert_eq!(
            clamp_to_viewport(Point::new(5_000.0, 5_000.0), element, &b),
            Point::new(824.0, 668.0)
        );
        assert_eq!(
            clamp_to_viewport(Point::new(300.0, 200.0), element, &b),
            Point::new(300.0, 200.0)
        );
    }

    #[test]
    fn begin_freezes_position_relative_to_container() {
        let mut drag = DragController::new(Animation::None);
        assert_eq!(drag.position(), None);
        drag.begin(1, Point::new(500.0, 400.0), Point::new(412.0, 334.0), Point::new(0.0, 50.0));
        assert!(drag.is_dragging());
        assert_eq!(drag.position(), Some(Point::new(412.0, 284.0)));
    }

    #[test]
    fn moves_apply_pointer_delta() {
        let mut drag = DragController::new(Animation::None);
        let container = Point::new(0.0, 50.0);
        drag.begin(1, Point::new(500.0, 400.0), Point::new(400.0, 350.0), container);
        let pos = drag.drag_to(1, Point::new(520.0, 390.0), Size::new(200.0, 100.0), container, &bounds());
        assert_eq!(pos, Some(Point::new(420.0, 290.0)));
    }

    #[test]
    fn any_move_sequence_stays_within_bounds() {
        let mut drag = DragController::new(Animation::Pulse);
        let container = Point::new(10.0, 40.0);
        let element = Size::new(240.0, 120.0);
        let b = bounds();
        let mut pointer = Point::new(300.0, 300.0);
        drag.begin(7, pointer, Point::new(250.0, 260.0), container);

        let steps = [
            (-900.0, 0.0),
            (30.0, -700.0),
            (2_000.0, 15.0),
            (-13.0, 1_500.0),
            (-400.0, -400.0),
            (5.0, 5.0),
            (0.0, -1.0),
            (777.0, -3.0),
        ];
        for (dx, dy) in steps.iter().cycle().take(64) {
            pointer = pointer + Point::new(*dx, *dy);
            let rel = drag
                .drag_to(7, pointer, element, container, &b)
                .expect("drag in progress");
            let viewport = rel + container;
            assert!(viewport.x >= 0.0 && viewport.x <= b.viewport.width - element.width);
            assert!(viewport.y >= b.top_bar_bottom && viewport.y <= b.viewport.height - element.height);
        }
    }

    #[test]
    fn other_pointers_are_ignored() {
        let mut drag = DragController::new(Animation::None);
        drag.begin(1, Point::new(0.0, 100.0), Point::new(100.0, 100.0), Point::default());
        assert_eq!(
            drag.drag_to(2, Point::new(50.0, 150.0), Size::new(10.0, 10.0), Point::default(), &bounds()),
            None
        );
        assert!(!drag.end(2));
        assert!(drag.is_dragging());
        assert!(drag.end(1));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn drag_suspends_then_restores_animation() {
        let mut drag = DragController::new(Animation::Bounce);
        assert_eq!(drag.active_animation(), Some(Animation::Bounce));
        drag.begin(1, Point::default(), Point::new(100.0, 100.0), Point::default());
        assert_eq!(drag.active_animation(), None);
        assert_eq!(drag.animation_duration_secs(2.0), None);
        drag.end(1);
        assert_eq!(drag.active_animation(), Some(Animation::Bounce));
        assert_eq!(drag.animation_duration_secs(2.0), Some(0.5));
    }

    #[test]
    fn no_animation_configured_stays_without_animation() {
        let mut drag = DragController::new(Animation::None);
        drag.begin(1, Point::default(), Point::new(100.0, 100.0), Point::default());
        drag.end(1);
        assert_eq!(drag.active_animation(), None);
        assert_eq!(drag.animation_duration_secs(1.0), None);
        assert_eq!(drag.position(), Some(Point::new(100.0, 100.0)));
    }
}
