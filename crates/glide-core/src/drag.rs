//! Floating window drag state machine
//!
//! `Settled → Dragging → Snapping → Settled`. Mouse drags are hard-clamped to the
//! viewport; touch drags rubber-band past the edges and may fling on release.
//! Every release ends in an eased snap to the nearest corner.

use crate::config::DragConfig;
use crate::physics::{self, Bounds, Sample};
use crate::{Point, Viewport};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// An in-progress drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gesture {
    pub kind: PointerKind,
    /// Pointer position relative to the window's top-left corner
    pub offset: Point,
    pub started_ms: u64,
    pub last: Sample,
    pub velocity: Point,
}

/// Eased move toward a snap target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapAnimation {
    pub from: Point,
    pub to: Point,
    pub started_ms: u64,
    pub duration_ms: u64,
}

impl SnapAnimation {
    /// Position at `now` and whether the animation has finished
    pub fn sample(&self, now: u64) -> (Point, bool) {
        if self.duration_ms == 0 {
            return (self.to, true);
        }
        let elapsed = now.saturating_sub(self.started_ms) as f64;
        let t = elapsed / self.duration_ms as f64;
        if t >= 1.0 {
            (self.to, true)
        } else {
            (physics::lerp(self.from, self.to, physics::ease_out_cubic(t)), false)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragPhase {
    Settled,
    Dragging(Gesture),
    Snapping(SnapAnimation),
}

/// Position and gesture state of the floating window
#[derive(Debug, Clone)]
pub struct DragMachine {
    phase: DragPhase,
    position: Point,
    viewport: Viewport,
    config: DragConfig,
}

impl DragMachine {
    /// Start settled at `position`, clamped into the viewport
    pub fn new(position: Point, viewport: Viewport, config: DragConfig) -> Self {
        let bounds = Bounds::new(viewport, config.player_size);
        Self {
            phase: DragPhase::Settled,
            position: physics::clamp_to_bounds(position, bounds),
            viewport,
            config,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging(_))
    }

    pub fn is_snapping(&self) -> bool {
        matches!(self.phase, DragPhase::Snapping(_))
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.viewport, self.config.player_size)
    }

    /// True when `pointer` is over the window's drag header
    pub fn hits_header(&self, pointer: Point) -> bool {
        let dx = pointer.x - self.position.x;
        let dy = pointer.y - self.position.y;
        (0.0..=self.config.player_size.width).contains(&dx) && (0.0..=self.config.header_height_px).contains(&dy)
    }

    /// Begin a drag if `pointer` is on the header. Cancels an in-flight snap,
    /// leaving the window where the last frame put it.
    pub fn begin(&mut self, kind: PointerKind, pointer: Point, now: u64) -> bool {
        if !self.hits_header(pointer) {
            return false;
        }
        if self.is_snapping() {
            debug!("Snap interrupted by new drag");
        }
        self.phase = DragPhase::Dragging(Gesture {
            kind,
            offset: Point::new(pointer.x - self.position.x, pointer.y - self.position.y),
            started_ms: now,
            last: Sample::new(pointer, now),
            velocity: Point::default(),
        });
        true
    }

    pub fn update(&mut self, pointer: Point, now: u64) {
        let bounds = self.bounds();
        let overshoot = self.config.overshoot_px;
        let DragPhase::Dragging(gesture) = &mut self.phase else {
            return;
        };

        let next = Sample::new(pointer, now);
        if let Some(v) = physics::velocity(gesture.last, next) {
            gesture.velocity = v;
        }
        gesture.last = next;

        let raw = Point::new(pointer.x - gesture.offset.x, pointer.y - gesture.offset.y);
        self.position = match gesture.kind {
            PointerKind::Mouse => physics::clamp_to_bounds(raw, bounds),
            PointerKind::Touch => physics::rubber_band_point(raw, bounds, overshoot),
        };
    }

    /// End the drag, applying a fling if the gesture qualifies, and start the
    /// snap. Returns the snap target.
    pub fn release(&mut self, now: u64) -> Option<Point> {
        let DragPhase::Dragging(gesture) = self.phase else {
            return None;
        };

        let elapsed = now.saturating_sub(gesture.started_ms);
        if gesture.kind == PointerKind::Touch && physics::is_fling(gesture.velocity, elapsed, &self.config) {
            let flung = physics::project_fling(self.position, gesture.velocity, self.bounds(), &self.config);
            debug!(
                vx = gesture.velocity.x,
                vy = gesture.velocity.y,
                x = flung.x,
                y = flung.y,
                "Fling"
            );
            self.position = flung;
        }

        let to = self.snap_target();
        self.phase = DragPhase::Snapping(SnapAnimation {
            from: self.position,
            to,
            started_ms: now,
            duration_ms: self.config.snap_duration_ms,
        });
        Some(to)
    }

    /// Advance the snap. Returns the final position on the frame it settles.
    pub fn tick(&mut self, now: u64) -> Option<Point> {
        let DragPhase::Snapping(animation) = self.phase else {
            return None;
        };
        let (position, done) = animation.sample(now);
        self.position = position;
        if done {
            self.phase = DragPhase::Settled;
            debug!(x = position.x, y = position.y, "Snap settled");
            Some(position)
        } else {
            None
        }
    }

    /// Abandon any gesture or animation and settle in bounds
    pub fn cancel(&mut self) {
        self.phase = DragPhase::Settled;
        self.position = physics::clamp_to_bounds(self.position, self.bounds());
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        match self.phase {
            DragPhase::Settled => {
                self.position = physics::clamp_to_bounds(self.position, self.bounds());
            }
            DragPhase::Snapping(ref mut animation) => {
                animation.to = physics::snap_target(
                    animation.to,
                    viewport,
                    self.config.player_size,
                    self.config.snap_margin_px,
                );
            }
            DragPhase::Dragging(_) => {}
        }
    }

    fn snap_target(&self) -> Point {
        physics::snap_target(
            self.position,
            self.viewport,
            self.config.player_size,
            self.config.snap_margin_px,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> DragMachine {
        DragMachine::new(Point::new(20.0, 20.0), Viewport::new(1280.0, 720.0), DragConfig::default())
    }

    fn settle(m: &mut DragMachine, mut now: u64) -> Point {
        loop {
            now += 16;
            if let Some(p) = m.tick(now) {
                return p;
            }
        }
    }

    #[test]
    fn test_begin_requires_header() {
        let mut m = machine();
        assert!(!m.begin(PointerKind::Mouse, Point::new(100.0, 100.0), 0));
        assert!(m.begin(PointerKind::Mouse, Point::new(100.0, 40.0), 0));
        assert!(m.is_dragging());
    }

    #[test]
    fn test_mouse_drag_is_clamped_then_snaps() {
        let mut m = machine();
        m.begin(PointerKind::Mouse, Point::new(30.0, 30.0), 0);
        m.update(Point::new(5000.0, 5000.0), 16);
        assert_eq!(m.position(), Point::new(960.0, 476.0));

        let target = m.release(32).unwrap();
        assert_eq!(target, Point::new(940.0, 456.0));
        assert_eq!(settle(&mut m, 32), target);
        assert!(!m.is_snapping());
    }

    #[test]
    fn test_touch_fling_to_left_snaps_to_margin() {
        let mut m = machine();
        m.begin(PointerKind::Touch, Point::new(30.0, 30.0), 0);
        m.update(Point::new(-100.0, 30.0), 50);
        m.update(Point::new(-390.0, 20.0), 100);
        assert!(m.position().x < 0.0 && m.position().x > -30.0);

        m.release(120);
        let settled = settle(&mut m, 120);
        assert_eq!(settled.x, 20.0);
        assert!(m.bounds().contains(settled));
    }

    #[test]
    fn test_slow_touch_does_not_fling() {
        let mut m = machine();
        m.begin(PointerKind::Touch, Point::new(30.0, 30.0), 0);
        m.update(Point::new(730.0, 30.0), 1_000);
        let before = m.position();
        m.release(1_500);
        match m.phase() {
            DragPhase::Snapping(anim) => assert_eq!(anim.from, before),
            other => panic!("expected snapping, got {:?}", other),
        }
    }

    #[test]
    fn test_new_drag_cancels_snap() {
        let mut m = machine();
        m.begin(PointerKind::Mouse, Point::new(30.0, 30.0), 0);
        m.update(Point::new(900.0, 300.0), 16);
        m.release(32);
        m.tick(100);
        let mid = m.position();

        let grab = Point::new(mid.x + 10.0, mid.y + 10.0);
        assert!(m.begin(PointerKind::Mouse, grab, 110));
        assert!(m.is_dragging());
        assert!(m.tick(1_000).is_none());
        assert_eq!(m.position(), mid);
    }

    #[test]
    fn test_resize_reclamps_settled_position() {
        let mut m = DragMachine::new(Point::new(940.0, 456.0), Viewport::new(1280.0, 720.0), DragConfig::default());
        m.resize(Viewport::new(800.0, 600.0));
        assert_eq!(m.position(), Point::new(480.0, 356.0));
    }
}
