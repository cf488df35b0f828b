//! Core types for Glide

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one live embedded player instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleId(pub Uuid);

impl HandleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Provider video identifier. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MediaId(String);

impl MediaId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::EmptyMediaId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MediaId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<MediaId> for String {
    fn from(id: MediaId) -> Self {
        id.0
    }
}

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display metadata carried through a hand-off
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub title: String,
    pub source_url: String,
}

/// Category the current video was opened from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CategoryRef {
    pub fn new(slug: impl Into<String>) -> Self {
        Self { slug: slug.into(), name: None }
    }
}

/// Local like/dislike marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeStatus {
    Like,
    Dislike,
}

impl LikeStatus {
    /// Pressing the same button twice clears the status; the other one replaces it
    pub fn toggle(current: Option<LikeStatus>, pressed: LikeStatus) -> Option<LikeStatus> {
        if current == Some(pressed) {
            None
        } else {
            Some(pressed)
        }
    }
}

/// Point in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width/height in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Browser viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Touch layout is used below the breakpoint width
    pub fn is_mobile(&self, breakpoint: f64) -> bool {
        self.width < breakpoint
    }
}

/// Raw state reported by the embedded provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl ProviderState {
    /// Map a YouTube IFrame API `PlayerState` code
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(ProviderState::Unstarted),
            0 => Some(ProviderState::Ended),
            1 => Some(ProviderState::Playing),
            2 => Some(ProviderState::Paused),
            3 => Some(ProviderState::Buffering),
            5 => Some(ProviderState::Cued),
            _ => None,
        }
    }
}

/// Live playback sub-state once the player is ready
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Playback {
    Playing,
    Paused,
    Buffering,
}

/// Why a controller is showing its error screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PlayerFault {
    /// No provider id in the source URL; only Back is offered
    Unresolvable,
    /// Embed script never became available
    RuntimeLoad { reason: String },
    /// Provider error code reported mid-session
    Playback { code: i32 },
    /// Ready never arrived after the runtime loaded
    InitTimeout,
    /// Backend refused to create or drive the player
    Backend { reason: String },
}

impl PlayerFault {
    pub fn can_retry(&self) -> bool {
        !matches!(self, PlayerFault::Unresolvable)
    }
}

impl From<&Error> for PlayerFault {
    fn from(err: &Error) -> Self {
        match err {
            Error::UnresolvableMedia { .. } | Error::EmptyMediaId => PlayerFault::Unresolvable,
            Error::RuntimeLoad(reason) => PlayerFault::RuntimeLoad { reason: reason.clone() },
            Error::Playback { code } => PlayerFault::Playback { code: *code },
            Error::InitTimeout { .. } => PlayerFault::InitTimeout,
            other => PlayerFault::Backend { reason: other.to_string() },
        }
    }
}

/// Controller state machine states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PlayerStatus {
    /// No player created yet, or torn down
    Idle,
    /// Waiting for the runtime and the provider's ready event
    Initializing,
    /// Player is live
    Ready { playback: Playback },
    /// Natural end of content
    Ended,
    /// Error screen
    Error { fault: PlayerFault },
}

impl PlayerStatus {
    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: &PlayerStatus) -> bool {
        use PlayerStatus::*;
        match (self, target) {
            // Teardown is always allowed
            (_, Idle) => true,
            // Load-in-place may interrupt anything
            (_, Initializing) => !matches!(self, Error { fault: PlayerFault::Unresolvable }),
            (Initializing, Ready { .. }) | (Initializing, Error { .. }) => true,
            (Ready { .. }, Ready { .. }) | (Ready { .. }, Ended) | (Ready { .. }, Error { .. }) => true,
            (Ended, Ready { .. }) | (Ended, Error { .. }) => true,
            (Idle, Error { fault: PlayerFault::Unresolvable }) => true,
            _ => false,
        }
    }

    /// Status a live player moves to on a provider state change; `None` for
    /// states that do not affect it
    pub fn from_provider(state: ProviderState) -> Option<Self> {
        match state {
            ProviderState::Playing => Some(PlayerStatus::Ready { playback: Playback::Playing }),
            ProviderState::Paused => Some(PlayerStatus::Ready { playback: Playback::Paused }),
            ProviderState::Buffering => Some(PlayerStatus::Ready { playback: Playback::Buffering }),
            ProviderState::Ended => Some(PlayerStatus::Ended),
            ProviderState::Unstarted | ProviderState::Cued => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PlayerStatus::Ready { .. })
    }

    /// Ready or ended; player calls are accepted
    pub fn is_live(&self) -> bool {
        self.is_ready() || *self == PlayerStatus::Ended
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, PlayerStatus::Ready { playback: Playback::Playing })
    }

    pub fn fault(&self) -> Option<&PlayerFault> {
        match self {
            PlayerStatus::Error { fault } => Some(fault),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerStatus::Idle => write!(f, "idle"),
            PlayerStatus::Initializing => write!(f, "initializing"),
            PlayerStatus::Ready { playback: Playback::Playing } => write!(f, "playing"),
            PlayerStatus::Ready { playback: Playback::Paused } => write!(f, "paused"),
            PlayerStatus::Ready { playback: Playback::Buffering } => write!(f, "buffering"),
            PlayerStatus::Ended => write!(f, "ended"),
            PlayerStatus::Error { .. } => write!(f, "error"),
        }
    }
}

/// Live time state written by a controller's poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackProgress {
    pub current_time: f64,
    pub duration: f64,
    pub remaining_time: f64,
    /// Percent of duration played
    pub progress: f64,
    /// Percent of duration loaded
    pub buffered: f64,
}

impl PlaybackProgress {
    /// Apply one poll reading. Duration-derived fields keep their previous
    /// value until the provider reports a duration.
    pub fn update(&mut self, current_time: f64, duration: f64, loaded_fraction: f64) {
        self.current_time = current_time;
        self.buffered = (loaded_fraction * 100.0).clamp(0.0, 100.0);
        if duration > 0.0 {
            self.duration = duration;
            self.progress = (current_time / duration * 100.0).clamp(0.0, 100.0);
            self.remaining_time = (duration - current_time).max(0.0);
        }
    }

    /// Jump to `seconds`, as after a user seek
    pub fn seek(&mut self, seconds: f64) {
        self.current_time = seconds;
        if self.duration > 0.0 {
            self.progress = (seconds / self.duration * 100.0).clamp(0.0, 100.0);
            self.remaining_time = (self.duration - seconds).max(0.0);
        }
    }
}

/// Application routes the controllers navigate to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    /// Application home, where the floating player is hosted
    Home,
    /// Full-screen watch page; `start_at` is the redundant resume offset
    Watch { media_id: MediaId, start_at: Option<u64> },
}

impl Route {
    /// Path and query for this route
    pub fn to_path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Watch { media_id, start_at: Some(t) } => format!("/video/{}?t={}", media_id, t),
            Route::Watch { media_id, start_at: None } => format!("/video/{}", media_id),
        }
    }
}

/// Format seconds as `m:ss` or `h:mm:ss`
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_id_rejects_empty() {
        assert!(MediaId::new("").is_err());
        assert!(MediaId::new("   ").is_err());
        assert_eq!(MediaId::new("abc123").unwrap().as_str(), "abc123");
    }

    #[test]
    fn test_media_id_deserialize_rejects_empty() {
        let parsed: std::result::Result<MediaId, _> = serde_json::from_str("\"\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_like_toggle() {
        assert_eq!(LikeStatus::toggle(None, LikeStatus::Like), Some(LikeStatus::Like));
        assert_eq!(LikeStatus::toggle(Some(LikeStatus::Like), LikeStatus::Like), None);
        assert_eq!(
            LikeStatus::toggle(Some(LikeStatus::Like), LikeStatus::Dislike),
            Some(LikeStatus::Dislike)
        );
    }

    #[test]
    fn test_status_transitions() {
        let ready = PlayerStatus::Ready { playback: Playback::Playing };
        assert!(PlayerStatus::Idle.can_transition_to(&PlayerStatus::Initializing));
        assert!(PlayerStatus::Initializing.can_transition_to(&ready));
        assert!(ready.can_transition_to(&PlayerStatus::Ended));
        assert!(!PlayerStatus::Idle.can_transition_to(&ready));
        assert!(!PlayerStatus::Initializing.can_transition_to(&PlayerStatus::Ended));

        let terminal = PlayerStatus::Error { fault: PlayerFault::Unresolvable };
        assert!(!terminal.can_transition_to(&PlayerStatus::Initializing));
        assert!(terminal.can_transition_to(&PlayerStatus::Idle));
    }

    #[test]
    fn test_provider_codes() {
        assert_eq!(ProviderState::from_code(1), Some(ProviderState::Playing));
        assert_eq!(ProviderState::from_code(0), Some(ProviderState::Ended));
        assert_eq!(ProviderState::from_code(4), None);
    }

    #[test]
    fn test_route_paths() {
        let id = MediaId::new("abc123").unwrap();
        assert_eq!(Route::Home.to_path(), "/");
        assert_eq!(
            Route::Watch { media_id: id.clone(), start_at: Some(42) }.to_path(),
            "/video/abc123?t=42"
        );
        assert_eq!(Route::Watch { media_id: id, start_at: None }.to_path(), "/video/abc123");
    }

    #[test]
    fn test_progress_waits_for_duration() {
        let mut p = PlaybackProgress::default();
        p.update(5.0, 0.0, 0.1);
        assert_eq!(p.current_time, 5.0);
        assert_eq!(p.progress, 0.0);
        assert_eq!(p.buffered, 10.0);

        p.update(50.0, 200.0, 0.5);
        assert_eq!(p.progress, 25.0);
        assert_eq!(p.remaining_time, 150.0);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(65.4), "1:05");
        assert_eq!(format_time(3725.0), "1:02:05");
    }
}
