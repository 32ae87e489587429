//! State owned by the settings orchestrator.
//!
//! `Session` replaces what would otherwise be page-global mutable state: the
//! current target, the displayed background and the registered font. It lives
//! in a `use_mut_ref` of the `Main` component and is handed to children as
//! props.

use crate::media::{BackgroundMedia, LoadedFont};
use countdown_widget::assets::LoadSequence;
use countdown_widget::settings::{Settings, TimerStyle};
use log::{debug, info};
use std::rc::Rc;
use web_sys::File;

/// The one live timer.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveTimer {
    /// Bumped on every creation; used as the component key so a new timer
    /// replaces the old one instead of being diffed into it.
    pub generation: u32,
    pub target_ms: f64,
    pub style: Rc<TimerStyle>,
}

#[derive(Debug, Default)]
pub struct Session {
    generation: u32,
    timer: Option<ActiveTimer>,
    background: Option<BackgroundMedia>,
    font: Option<Rc<LoadedFont>>,
    font_loads: LoadSequence,
}

impl Session {
    pub fn timer(&self) -> Option<&ActiveTimer> {
        self.timer.as_ref()
    }

    pub fn background(&self) -> Option<&BackgroundMedia> {
        self.background.as_ref()
    }

    pub fn font_family(&self) -> Option<String> {
        self.font.as_ref().map(|font| font.family().to_string())
    }

    /// Replace the running timer and background. The previous background's
    /// object URL is released as soon as nothing renders it any more.
    pub fn start(&mut self, target_ms: f64, settings: &Settings, background: Option<BackgroundMedia>) {
        self.generation = self.generation.wrapping_add(1);
        self.background = background;
        self.timer = Some(ActiveTimer {
            generation: self.generation,
            target_ms,
            style: Rc::new(settings.timer_style()),
        });
        info!(
            "timer #{} created for target {}",
            self.generation, settings.target_date
        );
    }

    /// Stop the countdown; the background stays until the next `start`.
    pub fn stop_timer(&mut self) {
        self.timer = None;
    }

    /// Ticket for a font registration about to start.
    pub fn begin_font_load(&mut self) -> u64 {
        self.font_loads.next()
    }

    /// Swap in a registered font unless a newer registration has started since.
    /// The previous face is unregistered; a stale font is dropped right away.
    pub fn finish_font_load(&mut self, ticket: u64, font: LoadedFont) -> bool {
        if !self.font_loads.is_latest(ticket) {
            debug!("discarding stale font {}", font.family());
            return false;
        }
        self.font = Some(Rc::new(font));
        true
    }

    /// Drop the timer, background and font.
    pub fn clear(&mut self) {
        self.timer = None;
        self.background = None;
        self.font = None;
        self.font_loads.next();
    }
}

/// Live contents of the settings form.
///
/// Inputs write here directly without re-rendering the page; the preview
/// samples it on its own tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub settings: Settings,
    pub background_file: Option<File>,
    pub font_file: Option<File>,
}
