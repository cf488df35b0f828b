//! Transport controls overlay visibility

use crate::timer::Timeout;

/// Overlay shown on interaction and hidden after a quiet period.
///
/// The hide timer always restarts on interaction; whether it may actually hide
/// the overlay is decided when it fires (the full-screen player keeps controls
/// up while paused and on touch layouts).
#[derive(Debug, Clone)]
pub struct ControlsVisibility {
    visible: bool,
    hide: Timeout,
    hide_ms: u64,
}

impl ControlsVisibility {
    pub fn new(visible: bool, hide_ms: u64) -> Self {
        Self {
            visible,
            hide: Timeout::default(),
            hide_ms,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show and restart the hide timer
    pub fn show(&mut self, now: u64) {
        self.visible = true;
        self.hide.start(now, self.hide_ms);
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.hide.cancel();
    }

    /// Returns true if the overlay was hidden on this tick
    pub fn tick(&mut self, now: u64, may_hide: bool) -> bool {
        if self.hide.fire(now) && may_hide && self.visible {
            self.visible = false;
            return true;
        }
        false
    }

    pub fn cancel(&mut self) {
        self.hide.cancel();
    }

    pub fn has_pending_timer(&self) -> bool {
        self.hide.is_pending()
    }
}
