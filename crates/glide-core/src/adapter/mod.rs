//! Media player adapter
//!
//! [`EmbedBackend`] is the raw vendor surface (the browser host binds it to the
//! YouTube IFrame API). [`MediaAdapter`] wraps one backend bound to one container
//! and gives controllers the uniform contract: a single live handle, clamped
//! inputs, sanitized reads and a `destroy` that never fails outward.

mod runtime;
mod slot;

pub use runtime::{LoaderPhase, RuntimeHost, RuntimeLoader};
pub use slot::PlaybackSlot;

use crate::{Error, HandleId, MediaId, ProviderState, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Events a live player reports back to its owning controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AdapterEvent {
    /// Player is ready; duration may be 0 until metadata arrives
    Ready { duration: f64 },
    StateChange(ProviderState),
    Error { code: i32 },
}

/// Player variables passed to the embed constructor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedParams {
    #[serde(rename = "videoId")]
    pub video_id: String,
    pub autoplay: u8,
    pub controls: u8,
    pub modestbranding: u8,
    pub rel: u8,
    pub playsinline: u8,
    pub enablejsapi: u8,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub origin: String,
    pub fs: u8,
    pub iv_load_policy: u8,
}

impl EmbedParams {
    /// Custom-controls, inline, origin-restricted embed
    pub fn new(media_id: &MediaId, autoplay: bool, origin: &str) -> Self {
        Self {
            video_id: media_id.to_string(),
            autoplay: autoplay as u8,
            controls: 0,
            modestbranding: 1,
            rel: 0,
            playsinline: 1,
            enablejsapi: 1,
            origin: origin.to_string(),
            fs: 1,
            iv_load_policy: 3,
        }
    }
}

/// Raw provider player operations
pub trait EmbedBackend {
    /// Create a player inside `container`. Events for it must be reported with `handle`.
    fn create(&mut self, container: &str, handle: HandleId, params: &EmbedParams) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn seek(&mut self, seconds: f64) -> Result<()>;
    fn set_volume(&mut self, volume: u8) -> Result<()>;
    fn mute(&mut self) -> Result<()>;
    fn unmute(&mut self) -> Result<()>;
    fn current_time(&self) -> Result<f64>;
    fn duration(&self) -> Result<f64>;
    fn loaded_fraction(&self) -> Result<f64>;
    fn destroy(&mut self) -> Result<()>;
}

/// Uniform playback contract over one backend and one container
pub struct MediaAdapter<B: EmbedBackend> {
    backend: B,
    container: String,
    origin: String,
    slot: PlaybackSlot,
    handle: Option<HandleId>,
    media_id: Option<MediaId>,
    pending_volume: Option<u8>,
}

impl<B: EmbedBackend> MediaAdapter<B> {
    pub fn new(backend: B, container: impl Into<String>, origin: impl Into<String>, slot: PlaybackSlot) -> Self {
        Self {
            backend,
            container: container.into(),
            origin: origin.into(),
            slot,
            handle: None,
            media_id: None,
            pending_volume: None,
        }
    }

    /// Create a player for `media_id`, replacing any handle bound to this container
    pub fn initialize(&mut self, media_id: &MediaId, initial_volume: u8, autoplay: bool) -> Result<HandleId> {
        self.destroy();

        let handle = HandleId::new();
        self.slot.acquire(handle)?;

        let params = EmbedParams::new(media_id, autoplay, &self.origin);
        if let Err(e) = self.backend.create(&self.container, handle, &params) {
            self.slot.release(handle);
            return Err(e);
        }

        info!(
            handle = %handle,
            media_id = %media_id,
            container = %self.container,
            volume = initial_volume.min(100),
            autoplay,
            "Player created"
        );
        self.handle = Some(handle);
        self.media_id = Some(media_id.clone());
        self.pending_volume = Some(initial_volume.min(100));
        Ok(handle)
    }

    /// Apply the volume requested at `initialize`; call once the player reports ready
    pub fn on_ready(&mut self) -> Result<()> {
        self.live()?;
        match self.pending_volume.take() {
            Some(volume) => self.backend.set_volume(volume),
            None => Ok(()),
        }
    }

    /// Tear down the live handle. Backend failures are logged, never returned.
    pub fn destroy(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if let Err(e) = self.backend.destroy() {
            warn!(handle = %handle, error = %e, "Player destroy failed");
        } else {
            debug!(handle = %handle, "Player destroyed");
        }
        self.media_id = None;
        self.pending_volume = None;
        self.slot.release(handle);
    }

    /// True if `handle` is the live handle; events from any other are stale
    pub fn accepts(&self, handle: HandleId) -> bool {
        self.handle == Some(handle)
    }

    pub fn handle(&self) -> Option<HandleId> {
        self.handle
    }

    pub fn media_id(&self) -> Option<&MediaId> {
        self.media_id.as_ref()
    }

    pub fn is_live(&self) -> bool {
        self.handle.is_some()
    }

    pub fn play(&mut self) -> Result<()> {
        self.live()?;
        self.backend.play()
    }

    pub fn pause(&mut self) -> Result<()> {
        self.live()?;
        self.backend.pause()
    }

    pub fn stop(&mut self) -> Result<()> {
        self.live()?;
        self.backend.stop()
    }

    pub fn seek(&mut self, seconds: f64) -> Result<()> {
        self.live()?;
        self.backend.seek(sanitize(seconds))
    }

    /// Before ready the value replaces the pending initial volume
    pub fn set_volume(&mut self, volume: u8) -> Result<()> {
        self.live()?;
        let volume = volume.min(100);
        if let Some(pending) = self.pending_volume.as_mut() {
            *pending = volume;
            return Ok(());
        }
        self.backend.set_volume(volume)
    }

    pub fn mute(&mut self) -> Result<()> {
        self.live()?;
        self.backend.mute()
    }

    pub fn unmute(&mut self) -> Result<()> {
        self.live()?;
        self.backend.unmute()
    }

    pub fn current_time(&self) -> Result<f64> {
        self.live()?;
        self.backend.current_time().map(sanitize)
    }

    pub fn duration(&self) -> Result<f64> {
        self.live()?;
        self.backend.duration().map(sanitize)
    }

    pub fn loaded_fraction(&self) -> Result<f64> {
        self.live()?;
        self.backend.loaded_fraction().map(|f| sanitize(f).min(1.0))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn live(&self) -> Result<()> {
        if self.handle.is_some() {
            Ok(())
        } else {
            Err(Error::NoActivePlayer)
        }
    }
}

impl<B: EmbedBackend> Drop for MediaAdapter<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<B: EmbedBackend> std::fmt::Debug for MediaAdapter<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaAdapter")
            .field("container", &self.container)
            .field("handle", &self.handle)
            .field("media_id", &self.media_id)
            .finish()
    }
}

/// Non-finite and negative readings become 0
fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BackendCall, RecordingBackend};

    fn media() -> MediaId {
        MediaId::new("abc123").unwrap()
    }

    #[test]
    fn test_embed_params_contract() {
        let params = EmbedParams::new(&media(), true, "https://app.example");
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["videoId"], "abc123");
        assert_eq!(json["autoplay"], 1);
        assert_eq!(json["controls"], 0);
        assert_eq!(json["playsinline"], 1);
        assert_eq!(json["enablejsapi"], 1);
        assert_eq!(json["origin"], "https://app.example");
        assert_eq!(json["fs"], 1);
    }

    #[test]
    fn test_initialize_replaces_previous_handle() {
        let backend = RecordingBackend::new();
        let slot = PlaybackSlot::new();
        let mut adapter = MediaAdapter::new(backend.clone(), "player", "", slot.clone());

        let first = adapter.initialize(&media(), 80, true).unwrap();
        let second = adapter.initialize(&media(), 80, true).unwrap();

        assert_ne!(first, second);
        assert!(!adapter.accepts(first));
        assert!(adapter.accepts(second));
        assert_eq!(slot.active(), Some(second));
        assert_eq!(backend.count(|c| matches!(c, BackendCall::Destroy)), 1);
    }

    #[test]
    fn test_initialize_refused_while_other_player_alive() {
        let slot = PlaybackSlot::new();
        let mut full = MediaAdapter::new(RecordingBackend::new(), "full", "", slot.clone());
        let mut mini = MediaAdapter::new(RecordingBackend::new(), "mini", "", slot.clone());

        full.initialize(&media(), 80, true).unwrap();
        assert!(matches!(mini.initialize(&media(), 80, true), Err(Error::PlaybackSlotBusy { .. })));

        full.destroy();
        assert!(mini.initialize(&media(), 80, true).is_ok());
    }

    #[test]
    fn test_destroy_swallows_backend_failure() {
        let backend = RecordingBackend::new();
        backend.fail_destroy(true);
        let slot = PlaybackSlot::new();
        let mut adapter = MediaAdapter::new(backend, "player", "", slot.clone());

        adapter.initialize(&media(), 80, true).unwrap();
        adapter.destroy();
        assert!(!adapter.is_live());
        assert!(slot.is_free());
    }

    #[test]
    fn test_calls_without_handle_fail() {
        let mut adapter = MediaAdapter::new(RecordingBackend::new(), "player", "", PlaybackSlot::new());
        assert!(matches!(adapter.play(), Err(Error::NoActivePlayer)));
        assert!(matches!(adapter.current_time(), Err(Error::NoActivePlayer)));
    }

    #[test]
    fn test_inputs_are_clamped_and_reads_sanitized() {
        let backend = RecordingBackend::new();
        let mut adapter = MediaAdapter::new(backend.clone(), "player", "", PlaybackSlot::new());
        adapter.initialize(&media(), 80, true).unwrap();
        adapter.on_ready().unwrap();

        adapter.seek(-5.0).unwrap();
        adapter.set_volume(150).unwrap();
        assert!(backend.calls().contains(&BackendCall::Seek(0.0)));
        assert!(backend.calls().contains(&BackendCall::SetVolume(100)));

        backend.set_current_time(f64::NAN);
        assert_eq!(adapter.current_time().unwrap(), 0.0);
    }

    #[test]
    fn test_initial_volume_applied_on_ready() {
        let backend = RecordingBackend::new();
        let mut adapter = MediaAdapter::new(backend.clone(), "player", "", PlaybackSlot::new());
        adapter.initialize(&media(), 50, true).unwrap();
        assert!(!backend.calls().contains(&BackendCall::SetVolume(50)));

        adapter.on_ready().unwrap();
        adapter.on_ready().unwrap();
        assert_eq!(backend.count(|c| *c == BackendCall::SetVolume(50)), 1);
    }

    #[test]
    fn test_volume_before_ready_is_deferred() {
        let backend = RecordingBackend::new();
        let mut adapter = MediaAdapter::new(backend.clone(), "player", "", PlaybackSlot::new());
        adapter.initialize(&media(), 50, true).unwrap();
        adapter.set_volume(30).unwrap();
        assert_eq!(backend.count(|c| matches!(c, BackendCall::SetVolume(_))), 0);

        adapter.on_ready().unwrap();
        assert_eq!(backend.calls().last(), Some(&BackendCall::SetVolume(30)));
    }

    #[test]
    fn test_drop_releases_slot() {
        let slot = PlaybackSlot::new();
        {
            let mut adapter = MediaAdapter::new(RecordingBackend::new(), "player", "", slot.clone());
            adapter.initialize(&media(), 80, true).unwrap();
            assert!(!slot.is_free());
        }
        assert!(slot.is_free());
    }
}
