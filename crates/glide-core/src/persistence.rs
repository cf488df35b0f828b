//! Session persistence
//!
//! A [`PlayerSession`] is the only record handed between the two presentations.
//! The floating window's position is stored under its own key so a preferred
//! corner survives across videos.

use crate::config::PersistenceConfig;
use crate::{CategoryRef, LikeStatus, MediaId, Point, Result, VideoInfo};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, warn};

/// Key/value string storage (browser `localStorage` or equivalent)
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Continuation record for one playback instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSession {
    pub media_id: MediaId,
    pub video: VideoInfo,
    pub category: Option<CategoryRef>,
    pub is_playing: bool,
    pub current_time: f64,
    pub duration: f64,
    pub volume: u8,
    pub is_muted: bool,
    pub progress: f64,
    pub like_status: Option<LikeStatus>,
    /// Write time, epoch milliseconds
    pub timestamp: u64,
}

impl PlayerSession {
    /// Clamp every numeric field into its documented range
    pub fn sanitized(mut self) -> Self {
        self.current_time = non_negative(self.current_time);
        self.duration = non_negative(self.duration);
        self.volume = self.volume.min(100);
        self.progress = non_negative(self.progress).min(100.0);
        self
    }

    pub fn is_fresh(&self, now_ms: u64, ttl_ms: u64) -> bool {
        now_ms.saturating_sub(self.timestamp) < ttl_ms
    }

    /// Milliseconds left before expiry, 0 if already stale
    pub fn remaining_ms(&self, now_ms: u64, ttl_ms: u64) -> u64 {
        self.timestamp.saturating_add(ttl_ms).saturating_sub(now_ms)
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Top-left corner of the floating window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MiniPlayerPosition {
    pub x: f64,
    pub y: f64,
}

impl From<Point> for MiniPlayerPosition {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<MiniPlayerPosition> for Point {
    fn from(p: MiniPlayerPosition) -> Self {
        Point::new(p.x, p.y)
    }
}

/// Typed access to the session, position and fullscreen-request keys
#[derive(Clone)]
pub struct SessionStore {
    storage: Rc<dyn Storage>,
    config: PersistenceConfig,
}

impl SessionStore {
    pub fn new(storage: Rc<dyn Storage>, config: PersistenceConfig) -> Self {
        Self { storage, config }
    }

    pub fn ttl_ms(&self) -> u64 {
        self.config.session_ttl_ms
    }

    /// Replace the stored session
    pub fn save_session(&self, session: &PlayerSession) -> Result<()> {
        let json = serde_json::to_string(session)?;
        self.storage.set(&self.config.session_key, &json)?;
        debug!(
            media_id = %session.media_id,
            current_time = session.current_time,
            playing = session.is_playing,
            "Session saved"
        );
        Ok(())
    }

    /// Read the session if it is fresh. Stale or corrupt entries are removed and
    /// read as absent.
    pub fn load_session(&self, now_ms: u64) -> Option<PlayerSession> {
        let session = self.peek_session()?;
        if session.is_fresh(now_ms, self.config.session_ttl_ms) {
            Some(session)
        } else {
            debug!(media_id = %session.media_id, age_ms = now_ms.saturating_sub(session.timestamp), "Discarding stale session");
            self.clear_session();
            None
        }
    }

    /// Read the session without the expiry rule
    pub fn peek_session(&self) -> Option<PlayerSession> {
        let raw = match self.storage.get(&self.config.session_key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "Session read failed");
                return None;
            }
        };
        match serde_json::from_str::<PlayerSession>(&raw) {
            Ok(session) => Some(session.sanitized()),
            Err(e) => {
                warn!(error = %e, "Discarding corrupt session");
                self.clear_session();
                None
            }
        }
    }

    pub fn clear_session(&self) {
        if let Err(e) = self.storage.remove(&self.config.session_key) {
            warn!(error = %e, "Session removal failed");
        }
    }

    pub fn save_position(&self, position: MiniPlayerPosition) -> Result<()> {
        let json = serde_json::to_string(&position)?;
        self.storage.set(&self.config.position_key, &json)
    }

    pub fn load_position(&self) -> Option<MiniPlayerPosition> {
        let raw = self.storage.get(&self.config.position_key).ok()??;
        match serde_json::from_str::<MiniPlayerPosition>(&raw) {
            Ok(p) if p.x.is_finite() && p.y.is_finite() => Some(p),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Ignoring corrupt mini player position");
                None
            }
        }
    }

    pub fn clear_position(&self) {
        if let Err(e) = self.storage.remove(&self.config.position_key) {
            warn!(error = %e, "Position removal failed");
        }
    }

    /// Ask the next full-screen mount to enter document fullscreen
    pub fn request_fullscreen(&self) -> Result<()> {
        self.storage.set(&self.config.fullscreen_flag_key, "true")
    }

    /// Read and clear the fullscreen request flag
    pub fn take_fullscreen_request(&self) -> bool {
        let requested = matches!(
            self.storage.get(&self.config.fullscreen_flag_key),
            Ok(Some(ref v)) if v == "true"
        );
        if let Err(e) = self.storage.remove(&self.config.fullscreen_flag_key) {
            warn!(error = %e, "Fullscreen flag removal failed");
        }
        requested
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").field("config", &self.config).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: u64 = 3_600_000;

    fn store() -> (Rc<MemoryStorage>, SessionStore) {
        let storage = Rc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone(), PersistenceConfig::default());
        (storage, store)
    }

    fn session(timestamp: u64) -> PlayerSession {
        PlayerSession {
            media_id: MediaId::new("abc123").unwrap(),
            video: VideoInfo {
                title: "Test".into(),
                source_url: "https://youtu.be/abc123".into(),
            },
            category: Some(CategoryRef::new("music")),
            is_playing: true,
            current_time: 42.0,
            duration: 200.0,
            volume: 50,
            is_muted: false,
            progress: 21.0,
            like_status: Some(LikeStatus::Like),
            timestamp,
        }
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let json = serde_json::to_value(session(1)).unwrap();
        assert_eq!(json["mediaId"], "abc123");
        assert_eq!(json["video"]["sourceUrl"], "https://youtu.be/abc123");
        assert_eq!(json["isPlaying"], true);
        assert_eq!(json["likeStatus"], "like");
        assert_eq!(json["category"]["slug"], "music");
    }

    #[test]
    fn test_fresh_session_round_trips() {
        let (_, store) = store();
        store.save_session(&session(1_000)).unwrap();
        let loaded = store.load_session(1_000 + HOUR - 1).unwrap();
        assert_eq!(loaded, session(1_000));
    }

    #[test]
    fn test_stale_session_is_discarded() {
        let (storage, store) = store();
        store.save_session(&session(1_000)).unwrap();
        assert!(store.load_session(1_000 + HOUR).is_none());
        assert!(storage.get("minimized_player_state").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_session_reads_as_absent() {
        let (storage, store) = store();
        storage.set("minimized_player_state", "{not json").unwrap();
        assert!(store.load_session(0).is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_empty_media_id_is_rejected_on_read() {
        let (storage, store) = store();
        let mut json = serde_json::to_value(session(0)).unwrap();
        json["mediaId"] = serde_json::Value::String(String::new());
        storage.set("minimized_player_state", &json.to_string()).unwrap();
        assert!(store.load_session(0).is_none());
    }

    #[test]
    fn test_sanitized_clamps() {
        let mut s = session(0);
        s.current_time = -3.0;
        s.volume = 250;
        s.progress = 140.0;
        let s = s.sanitized();
        assert_eq!(s.current_time, 0.0);
        assert_eq!(s.volume, 100);
        assert_eq!(s.progress, 100.0);
    }

    #[test]
    fn test_position_is_independent_of_session() {
        let (_, store) = store();
        store.save_position(MiniPlayerPosition { x: 940.0, y: 456.0 }).unwrap();
        store.save_session(&session(0)).unwrap();
        store.clear_session();
        assert_eq!(store.load_position(), Some(MiniPlayerPosition { x: 940.0, y: 456.0 }));
    }

    #[test]
    fn test_fullscreen_flag_clears_on_read() {
        let (_, store) = store();
        assert!(!store.take_fullscreen_request());
        store.request_fullscreen().unwrap();
        assert!(store.take_fullscreen_request());
        assert!(!store.take_fullscreen_request());
    }

    #[test]
    fn test_remaining_ms() {
        let s = session(1_000);
        assert_eq!(s.remaining_ms(1_000, HOUR), HOUR);
        assert_eq!(s.remaining_ms(1_000 + 2 * HOUR, HOUR), 0);
    }

    #[test]
    fn test_remaining_ms_far_future_timestamp() {
        let s = session(u64::MAX - 10);
        assert_eq!(s.remaining_ms(0, HOUR), u64::MAX);
        assert!(s.is_fresh(0, HOUR));
    }
}
