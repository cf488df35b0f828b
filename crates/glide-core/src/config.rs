//! Player configuration
//!
//! Every tunable the controllers use lives here. Hosts pass a (possibly partial)
//! JSON document; missing fields take the defaults below.

use crate::{Error, Point, Result, Size};
use serde::{Deserialize, Serialize};

/// Complete configuration for both presentations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub playback: PlaybackConfig,
    pub panel: PanelConfig,
    pub drag: DragConfig,
    pub persistence: PersistenceConfig,
}

impl PlayerConfig {
    /// Parse a JSON override document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PlayerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the controllers cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.playback.poll_interval_ms == 0 || self.playback.mini_poll_interval_ms == 0 {
            return Err(Error::InvalidConfig("poll intervals must be non-zero".into()));
        }
        if !(self.playback.skip_seconds.is_finite() && self.playback.skip_seconds > 0.0) {
            return Err(Error::InvalidConfig("skip_seconds must be positive".into()));
        }
        if self.playback.default_volume > 100 {
            return Err(Error::InvalidConfig("default_volume must be within 0..=100".into()));
        }
        if self.drag.player_size.width <= 0.0 || self.drag.player_size.height <= 0.0 {
            return Err(Error::InvalidConfig("player_size must be positive".into()));
        }
        if self.drag.snap_duration_ms == 0 {
            return Err(Error::InvalidConfig("snap_duration_ms must be non-zero".into()));
        }
        if !(0.0..=1.0).contains(&self.panel.mobile_open_fraction) {
            return Err(Error::InvalidConfig("mobile_open_fraction must be within 0..=1".into()));
        }
        if self.persistence.session_ttl_ms == 0 {
            return Err(Error::InvalidConfig("session_ttl_ms must be non-zero".into()));
        }
        Ok(())
    }
}

/// Adapter and transport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Full-screen time polling period
    pub poll_interval_ms: u64,
    /// Floating player time polling period
    pub mini_poll_interval_ms: u64,
    /// Skip forward/backward step
    pub skip_seconds: f64,
    /// Volume used when nothing was persisted
    pub default_volume: u8,
    /// How long a created player may take to report ready
    pub init_timeout_ms: u64,
    /// Delay before the embed runtime fallback check
    pub runtime_fallback_ms: u64,
    /// Controls overlay hide delay
    pub controls_hide_ms: u64,
    /// Delay before honouring a restore fullscreen request
    pub fullscreen_request_delay_ms: u64,
    /// Embed script URL
    pub runtime_script_url: String,
    /// Origin passed to the embed for postMessage checks
    pub origin: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            mini_poll_interval_ms: 1000,
            skip_seconds: 10.0,
            default_volume: 80,
            init_timeout_ms: 15_000,
            runtime_fallback_ms: 3000,
            controls_hide_ms: 3000,
            fullscreen_request_delay_ms: 1500,
            runtime_script_url: "https://www.youtube.com/iframe_api".to_string(),
            origin: String::new(),
        }
    }
}

/// Related-content panel settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Width of the right-edge hover zone
    pub edge_zone_px: f64,
    /// Dwell before the panel opens
    pub open_dwell_ms: u64,
    /// Delay before the panel closes after the pointer leaves it
    pub close_delay_ms: u64,
    /// Viewport width below which touch layout is used
    pub mobile_breakpoint_px: f64,
    /// Taps right of `width * fraction` open the panel
    pub mobile_open_fraction: f64,
    /// Taps above this line toggle the category info
    pub category_tap_zone_px: f64,
    /// Maximum suggestions shown
    pub max_related: usize,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            edge_zone_px: 50.0,
            open_dwell_ms: 200,
            close_delay_ms: 500,
            mobile_breakpoint_px: 768.0,
            mobile_open_fraction: 0.75,
            category_tap_zone_px: 100.0,
            max_related: 10,
        }
    }
}

/// Floating window geometry and physics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    pub player_size: Size,
    /// Drag handle height measured from the window top
    pub header_height_px: f64,
    /// Distance kept from the viewport edge after a snap
    pub snap_margin_px: f64,
    pub snap_duration_ms: u64,
    /// Maximum rubber-band overshoot past a bound
    pub overshoot_px: f64,
    /// Gestures shorter than this may fling
    pub fling_max_duration_ms: u64,
    /// Per-axis velocity (px/ms) a fling must exceed
    pub fling_velocity_threshold: f64,
    /// Projection factor applied to the release velocity
    pub fling_projection_ms: f64,
    pub default_position: Point,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            player_size: Size::new(320.0, 244.0),
            header_height_px: 48.0,
            snap_margin_px: 20.0,
            snap_duration_ms: 300,
            overshoot_px: 30.0,
            fling_max_duration_ms: 300,
            fling_velocity_threshold: 0.3,
            fling_projection_ms: 500.0,
            default_position: Point::new(20.0, 20.0),
        }
    }
}

/// Storage keys and expiry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub session_key: String,
    pub position_key: String,
    pub fullscreen_flag_key: String,
    pub session_ttl_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            session_key: "minimized_player_state".to_string(),
            position_key: "minimized_player_position".to_string(),
            fullscreen_flag_key: "request_fullscreen".to_string(),
            session_ttl_ms: 3_600_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlayerConfig::default();
        assert_eq!(config.playback.poll_interval_ms, 500);
        assert_eq!(config.playback.mini_poll_interval_ms, 1000);
        assert_eq!(config.panel.open_dwell_ms, 200);
        assert_eq!(config.drag.snap_margin_px, 20.0);
        assert_eq!(config.persistence.session_ttl_ms, 3_600_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_override() {
        let config = PlayerConfig::from_json(r#"{"panel": {"max_related": 4}}"#).unwrap();
        assert_eq!(config.panel.max_related, 4);
        assert_eq!(config.panel.edge_zone_px, 50.0);
        assert_eq!(config.playback.default_volume, 80);
    }

    #[test]
    fn test_rejects_invalid() {
        let result = PlayerConfig::from_json(r#"{"playback": {"poll_interval_ms": 0}}"#);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let result = PlayerConfig::from_json(r#"{"playback": {"skip_seconds": 0}}"#);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
