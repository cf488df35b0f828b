//! Drag, fling and snap math for the floating window
//!
//! Pure functions over CSS-pixel geometry. Positions are the window's top-left
//! corner; bounds keep the whole window inside the viewport.

use crate::config::DragConfig;
use crate::{Point, Size, Viewport};

/// Largest top-left coordinates that keep the window fully visible
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Upper bounds floor at 0 when the viewport is smaller than the window
    pub fn new(viewport: Viewport, size: Size) -> Self {
        Self {
            max_x: (viewport.width - size.width).max(0.0),
            max_y: (viewport.height - size.height).max(0.0),
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        (0.0..=self.max_x).contains(&p.x) && (0.0..=self.max_y).contains(&p.y)
    }
}

/// Pointer sample used for velocity tracking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub point: Point,
    pub time_ms: u64,
}

impl Sample {
    pub fn new(point: Point, time_ms: u64) -> Self {
        Self { point, time_ms }
    }
}

pub fn clamp_to_bounds(p: Point, bounds: Bounds) -> Point {
    Point::new(clamp(p.x, 0.0, bounds.max_x), clamp(p.y, 0.0, bounds.max_y))
}

/// Map `value` past `[min, max]` onto at most `limit` pixels of overshoot with
/// progressive resistance `limit * d / (d + limit)`
pub fn rubber_band(value: f64, min: f64, max: f64, limit: f64) -> f64 {
    if limit <= 0.0 {
        return clamp(value, min, max);
    }
    if value < min {
        let d = min - value;
        min - limit * d / (d + limit)
    } else if value > max {
        let d = value - max;
        max + limit * d / (d + limit)
    } else {
        value
    }
}

pub fn rubber_band_point(p: Point, bounds: Bounds, limit: f64) -> Point {
    Point::new(
        rubber_band(p.x, 0.0, bounds.max_x, limit),
        rubber_band(p.y, 0.0, bounds.max_y, limit),
    )
}

/// Velocity in px/ms between two samples; `None` when no time elapsed
pub fn velocity(prev: Sample, next: Sample) -> Option<Point> {
    let dt = next.time_ms.checked_sub(prev.time_ms)?;
    if dt == 0 {
        return None;
    }
    let dt = dt as f64;
    Some(Point::new(
        (next.point.x - prev.point.x) / dt,
        (next.point.y - prev.point.y) / dt,
    ))
}

/// A short, fast gesture on either axis
pub fn is_fling(velocity: Point, gesture_ms: u64, config: &DragConfig) -> bool {
    gesture_ms < config.fling_max_duration_ms
        && (velocity.x.abs() > config.fling_velocity_threshold
            || velocity.y.abs() > config.fling_velocity_threshold)
}

/// Project a fling and keep it inside the overshoot envelope
pub fn project_fling(from: Point, velocity: Point, bounds: Bounds, config: &DragConfig) -> Point {
    let limit = config.overshoot_px;
    let x = from.x + velocity.x * config.fling_projection_ms;
    let y = from.y + velocity.y * config.fling_projection_ms;
    Point::new(
        clamp(x, -limit, bounds.max_x + limit),
        clamp(y, -limit, bounds.max_y + limit),
    )
}

/// Nearest horizontal and vertical edge, chosen independently by the window's
/// centre, inset by `margin` and clamped into bounds
pub fn snap_target(p: Point, viewport: Viewport, size: Size, margin: f64) -> Point {
    let bounds = Bounds::new(viewport, size);
    let centre_x = p.x + size.width / 2.0;
    let centre_y = p.y + size.height / 2.0;

    let x = if centre_x < viewport.width / 2.0 {
        margin
    } else {
        viewport.width - size.width - margin
    };
    let y = if centre_y < viewport.height / 2.0 {
        margin
    } else {
        viewport.height - size.height - margin
    };
    clamp_to_bounds(Point::new(x, y), bounds)
}

pub fn ease_out_cubic(t: f64) -> f64 {
    let t = clamp(t, 0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

pub fn lerp(from: Point, to: Point, t: f64) -> Point {
    Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t)
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.max(min).min(max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport::new(1280.0, 720.0);
    const PLAYER: Size = Size::new(320.0, 244.0);

    fn bounds() -> Bounds {
        Bounds::new(VIEWPORT, PLAYER)
    }

    #[test]
    fn test_bounds_floor_at_zero() {
        let tiny = Bounds::new(Viewport::new(200.0, 100.0), PLAYER);
        assert_eq!(tiny.max_x, 0.0);
        assert_eq!(tiny.max_y, 0.0);
        assert_eq!(clamp_to_bounds(Point::new(50.0, -5.0), tiny), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_rubber_band_never_exceeds_limit() {
        for d in [1.0, 10.0, 30.0, 300.0, 1e6] {
            let x = rubber_band(-d, 0.0, 960.0, 30.0);
            assert!(x < 0.0 && x > -30.0, "overshoot {} for drag {}", x, d);
            let x = rubber_band(960.0 + d, 0.0, 960.0, 30.0);
            assert!(x > 960.0 && x < 990.0);
        }
        assert_eq!(rubber_band(500.0, 0.0, 960.0, 30.0), 500.0);
        // Half the limit at d == limit
        assert_eq!(rubber_band(-30.0, 0.0, 960.0, 30.0), -15.0);
    }

    #[test]
    fn test_velocity() {
        let a = Sample::new(Point::new(0.0, 0.0), 100);
        let b = Sample::new(Point::new(-40.0, 8.0), 116);
        assert_eq!(velocity(a, b), Some(Point::new(-2.5, 0.5)));
        assert_eq!(velocity(a, a), None);
        assert_eq!(velocity(b, a), None);
    }

    #[test]
    fn test_fling_thresholds() {
        let config = DragConfig::default();
        assert!(is_fling(Point::new(0.31, 0.0), 299, &config));
        assert!(!is_fling(Point::new(0.31, 0.0), 300, &config));
        assert!(!is_fling(Point::new(0.3, -0.3), 100, &config));
        assert!(is_fling(Point::new(0.0, -0.5), 100, &config));
    }

    #[test]
    fn test_projection_clamped_to_overshoot() {
        let config = DragConfig::default();
        let p = project_fling(Point::new(-30.0, 10.0), Point::new(-2.5, 0.0), bounds(), &config);
        assert_eq!(p, Point::new(-30.0, 10.0));
        let p = project_fling(Point::new(900.0, 400.0), Point::new(3.0, 3.0), bounds(), &config);
        assert_eq!(p, Point::new(990.0, 506.0));
    }

    #[test]
    fn test_snap_to_nearest_edges() {
        assert_eq!(snap_target(Point::new(-30.0, 10.0), VIEWPORT, PLAYER, 20.0), Point::new(20.0, 20.0));
        assert_eq!(
            snap_target(Point::new(700.0, 400.0), VIEWPORT, PLAYER, 20.0),
            Point::new(940.0, 456.0)
        );
    }

    #[test]
    fn test_snap_stays_in_bounds_on_small_viewport() {
        let viewport = Viewport::new(330.0, 250.0);
        let target = snap_target(Point::new(5.0, 5.0), viewport, PLAYER, 20.0);
        assert!(Bounds::new(viewport, PLAYER).contains(target));
    }

    #[test]
    fn test_easing_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert_eq!(ease_out_cubic(2.0), 1.0);
        assert!(ease_out_cubic(0.5) > 0.5);
        assert_eq!(lerp(Point::new(0.0, 0.0), Point::new(10.0, 20.0), 0.5), Point::new(5.0, 10.0));
    }
}
