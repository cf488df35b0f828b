//! Related-content panel
//!
//! Desktop opens the panel after the pointer dwells near the right edge and
//! closes it shortly after the pointer leaves it leftwards. Touch layouts open
//! it with a tap on the right side of the player.

use crate::catalog::{Video, VideoCatalog};
use crate::config::PanelConfig;
use crate::timer::Timeout;
use crate::{CategoryRef, MediaId, Viewport};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What a touch on the player surface did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchOutcome {
    CategoryInfoToggled,
    PanelOpened,
    Ignored,
}

#[derive(Debug, Clone)]
pub struct RelatedPanel {
    config: PanelConfig,
    open: bool,
    pointer_in_panel: bool,
    in_edge_zone: bool,
    show_category_info: bool,
    dwell: Timeout,
    close: Timeout,
    related: Vec<Video>,
}

impl RelatedPanel {
    pub fn new(config: PanelConfig) -> Self {
        Self {
            config,
            open: false,
            pointer_in_panel: false,
            in_edge_zone: false,
            show_category_info: true,
            dwell: Timeout::default(),
            close: Timeout::default(),
            related: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn pointer_in_panel(&self) -> bool {
        self.pointer_in_panel
    }

    pub fn show_category_info(&self) -> bool {
        self.show_category_info
    }

    pub fn related(&self) -> &[Video] {
        &self.related
    }

    /// Desktop pointer movement over the player. Entering the edge zone starts
    /// the dwell timer; moves inside the zone leave it running.
    pub fn pointer_moved(&mut self, x: f64, viewport: Viewport, now: u64) {
        let in_zone = x > viewport.width - self.config.edge_zone_px;
        if in_zone && !self.in_edge_zone && !self.open && !self.pointer_in_panel {
            self.dwell.start(now, self.config.open_dwell_ms);
        } else if !in_zone {
            self.dwell.cancel();
        }
        self.in_edge_zone = in_zone;
    }

    pub fn panel_entered(&mut self) {
        self.pointer_in_panel = true;
        self.dwell.cancel();
        self.close.cancel();
    }

    /// Pointer left the panel at `x`; only a leftward exit schedules the close
    pub fn panel_left(&mut self, x: f64, panel_left_edge: f64, now: u64) {
        if x < panel_left_edge {
            self.pointer_in_panel = false;
            self.close.start(now, self.config.close_delay_ms);
        }
    }

    /// Touch released on the player surface
    pub fn touch_ended(&mut self, x: f64, y: f64, viewport: Viewport) -> TouchOutcome {
        if y < self.config.category_tap_zone_px {
            self.show_category_info = !self.show_category_info;
            return TouchOutcome::CategoryInfoToggled;
        }
        if x > viewport.width * self.config.mobile_open_fraction && !self.open {
            self.open = true;
            self.pointer_in_panel = true;
            debug!("Related panel opened by tap");
            return TouchOutcome::PanelOpened;
        }
        TouchOutcome::Ignored
    }

    /// Fire due timers. Returns true when the open state changed.
    pub fn tick(&mut self, now: u64) -> bool {
        let mut changed = false;
        if self.dwell.fire(now) && self.in_edge_zone && !self.open && !self.pointer_in_panel {
            self.open = true;
            changed = true;
            debug!("Related panel opened after dwell");
        }
        if self.close.fire(now) && !self.pointer_in_panel && self.open {
            self.open = false;
            changed = true;
            debug!("Related panel closed after leave");
        }
        changed
    }

    /// Close button
    pub fn close(&mut self) {
        self.open = false;
        self.pointer_in_panel = false;
        self.cancel_timers();
    }

    /// After an item was chosen: touch layouts close, desktop stays open with
    /// the pointer treated as inside
    pub fn after_select(&mut self, is_mobile: bool) {
        if is_mobile {
            self.close();
        } else {
            self.open = true;
            self.pointer_in_panel = true;
            self.cancel_timers();
        }
    }

    /// Recompute the list for the current video and category
    pub fn refresh(&mut self, catalog: &dyn VideoCatalog, media_id: Option<&MediaId>, category: Option<&CategoryRef>) {
        self.related = match (media_id, category) {
            (Some(id), Some(category)) => {
                let mut videos = catalog.related_videos(id, &category.slug);
                videos.truncate(self.config.max_related);
                videos
            }
            _ => Vec::new(),
        };
        debug!(count = self.related.len(), "Related videos refreshed");
    }

    pub fn cancel_timers(&mut self) {
        self.dwell.cancel();
        self.close.cancel();
    }

    pub fn has_pending_timers(&self) -> bool {
        self.dwell.is_pending() || self.close.is_pending()
    }
}
