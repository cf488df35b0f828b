//! Minimized (floating) player controller
//!
//! Mounted by the shell when a fresh session exists. Owns its own adapter and
//! a [`DragMachine`] for the window, keeps the session current while playing,
//! and performs the restore hand-off back to the watch page.

use crate::adapter::{AdapterEvent, EmbedBackend, MediaAdapter, RuntimeHost, RuntimeLoader};
use crate::controls::ControlsVisibility;
use crate::drag::{DragMachine, PointerKind};
use crate::fullscreen::InitTicket;
use crate::persistence::PlayerSession;
use crate::shell::HostServices;
use crate::timer::{Interval, Timeout};
use crate::{
    format_time, Error, HandleId, MediaId, Playback, PlaybackProgress, PlayerFault, PlayerStatus, Point, Result,
    Route, Viewport,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Render snapshot of the floating player
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniPlayerView {
    pub status: PlayerStatus,
    pub media_id: MediaId,
    pub title: String,
    #[serde(flatten)]
    pub progress: PlaybackProgress,
    pub current_time_label: String,
    pub volume: u8,
    pub is_muted: bool,
    pub is_playing: bool,
    pub position: Point,
    pub dragging: bool,
    pub snapping: bool,
    pub controls_visible: bool,
}

pub struct MiniPlayerController<B: EmbedBackend> {
    adapter: MediaAdapter<B>,
    services: HostServices,
    /// Hand-off record; rewritten by the heartbeat and on restore
    session: PlayerSession,
    status: PlayerStatus,
    progress: PlaybackProgress,
    volume: u8,
    muted: bool,
    drag: DragMachine,
    controls: ControlsVisibility,
    poll: Interval,
    init_watchdog: Timeout,
    generation: u64,
}

impl<B: EmbedBackend> MiniPlayerController<B> {
    /// Mount from the stored session. Returns `None` when there is no fresh
    /// session; stale or corrupt sessions are removed.
    #[instrument(skip(backend, container, services))]
    pub fn mount(backend: B, container: impl Into<String>, services: HostServices, viewport: Viewport) -> Option<Self> {
        let now = services.now();
        let session = services.store.load_session(now)?;
        let config = services.config.clone();

        let position = services
            .store
            .load_position()
            .map(Point::from)
            .unwrap_or(config.drag.default_position);
        let drag = DragMachine::new(position, viewport, config.drag.clone());

        info!(
            media_id = %session.media_id,
            current_time = session.current_time,
            playing = session.is_playing,
            x = drag.position().x,
            y = drag.position().y,
            "Mini player mounted"
        );

        let mut progress = PlaybackProgress::default();
        progress.update(session.current_time, session.duration, 0.0);

        Some(Self {
            adapter: MediaAdapter::new(backend, container, config.playback.origin.clone(), services.slot.clone()),
            volume: session.volume,
            muted: session.is_muted,
            progress,
            session,
            status: PlayerStatus::Idle,
            drag,
            controls: ControlsVisibility::new(false, config.playback.controls_hide_ms),
            poll: Interval::default(),
            init_watchdog: Timeout::default(),
            generation: 0,
            services,
        })
    }

    pub fn begin_initialize(&mut self) -> Option<InitTicket> {
        if let Err(e) = self.set_status(PlayerStatus::Initializing) {
            warn!(error = %e, "Initialization refused");
            return None;
        }
        self.poll.stop();
        self.init_watchdog.cancel();
        self.generation += 1;
        Some(InitTicket::new(self.generation))
    }

    /// Autoplay follows the session's playing flag
    pub fn runtime_loaded(&mut self, ticket: InitTicket, result: Result<()>) {
        if ticket.generation() != self.generation || self.status != PlayerStatus::Initializing {
            debug!("Ignoring stale initialization");
            return;
        }
        if let Err(e) = result {
            self.fail(&e);
            return;
        }
        let media_id = self.session.media_id.clone();
        match self.adapter.initialize(&media_id, self.volume, self.session.is_playing) {
            Ok(_) => {
                let now = self.services.now();
                self.init_watchdog
                    .start(now, self.services.config.playback.init_timeout_ms);
            }
            Err(e) => self.fail(&e),
        }
    }

    pub async fn initialize(&mut self, loader: &RuntimeLoader, host: &dyn RuntimeHost) {
        let Some(ticket) = self.begin_initialize() else {
            return;
        };
        let result = loader.load(host).await;
        self.runtime_loaded(ticket, result);
    }

    pub fn handle_event(&mut self, handle: HandleId, event: AdapterEvent) {
        if !self.adapter.accepts(handle) {
            debug!(handle = %handle, "Dropping event from stale player");
            return;
        }
        match event {
            AdapterEvent::Ready { duration } => self.on_ready(duration),
            AdapterEvent::StateChange(state) => {
                if !self.status.is_live() {
                    return;
                }
                if let Some(target) = PlayerStatus::from_provider(state) {
                    if target == PlayerStatus::Ended {
                        self.poll.stop();
                    } else if !self.poll.is_running() {
                        let now = self.services.now();
                        self.poll
                            .start(now, self.services.config.playback.mini_poll_interval_ms);
                    }
                    if let Err(e) = self.set_status(target) {
                        warn!(error = %e, "Ignoring provider state");
                    }
                }
            }
            AdapterEvent::Error { code } => {
                warn!(code, "Provider reported an error");
                self.fail(&Error::Playback { code });
            }
        }
    }

    fn on_ready(&mut self, duration: f64) {
        if self.status != PlayerStatus::Initializing {
            return;
        }
        self.init_watchdog.cancel();
        if let Err(e) = self.adapter.on_ready() {
            warn!(error = %e, "Could not apply volume");
        }
        if self.muted {
            if let Err(e) = self.adapter.mute() {
                warn!(error = %e, "Could not mute");
            }
        }
        if duration > 0.0 {
            self.progress.update(self.progress.current_time, duration, 0.0);
        }
        let resume = self.session.current_time;
        if resume > 0.0 {
            if let Err(e) = self.adapter.seek(resume) {
                warn!(error = %e, "Resume seek failed");
            }
        }

        let playback = if self.session.is_playing {
            Playback::Playing
        } else {
            Playback::Paused
        };
        if let Err(e) = self.set_status(PlayerStatus::Ready { playback }) {
            warn!(error = %e, "Ready in unexpected state");
            return;
        }
        let now = self.services.now();
        self.poll
            .start(now, self.services.config.playback.mini_poll_interval_ms);
    }

    /// Fire due timers and advance the snap animation
    pub fn tick(&mut self) {
        let now = self.services.now();
        if self.poll.fire(now) {
            self.poll_now();
        }
        if self.init_watchdog.fire(now) && self.status == PlayerStatus::Initializing {
            let timeout_ms = self.services.config.playback.init_timeout_ms;
            warn!(timeout_ms, "Player never reported ready");
            self.fail(&Error::InitTimeout { timeout_ms });
        }
        self.controls.tick(now, true);
        if let Some(settled) = self.drag.tick(now) {
            if let Err(e) = self.services.store.save_position(settled.into()) {
                warn!(error = %e, "Could not persist position");
            }
        }
    }

    /// Poll the player; while playing, also rewrite the session
    fn poll_now(&mut self) {
        let time = match self.adapter.current_time() {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "Progress poll failed");
                return;
            }
        };
        let duration = self.adapter.duration().unwrap_or(0.0);
        let loaded = self.adapter.loaded_fraction().unwrap_or(0.0);
        self.progress.update(time, duration, loaded);

        if self.status.is_playing() {
            self.refresh_session();
            if let Err(e) = self.services.store.save_session(&self.session) {
                warn!(error = %e, "Session heartbeat failed");
            }
        }
    }

    // Transport

    pub fn toggle_play(&mut self) {
        self.show_controls();
        let result = match self.status {
            PlayerStatus::Ready { playback: Playback::Playing | Playback::Buffering } => self.adapter.pause(),
            PlayerStatus::Ready { playback: Playback::Paused } | PlayerStatus::Ended => self.adapter.play(),
            _ => Ok(()),
        };
        if let Err(e) = result {
            warn!(error = %e, "Toggle play failed");
        }
    }

    /// Unmuting restores the last volume
    pub fn toggle_mute(&mut self) {
        self.show_controls();
        self.muted = !self.muted;
        if !self.is_live() {
            return;
        }
        let volume = self.volume;
        let result = if self.muted {
            self.adapter.mute()
        } else {
            self.adapter.unmute().and_then(|_| self.adapter.set_volume(volume))
        };
        if let Err(e) = result {
            warn!(error = %e, "Mute toggle failed");
        }
    }

    /// Stored while muted, applied on unmute
    pub fn set_volume(&mut self, volume: u8) {
        self.show_controls();
        self.volume = volume.min(100);
        if self.muted || !self.adapter.is_live() {
            return;
        }
        if let Err(e) = self.adapter.set_volume(self.volume) {
            warn!(error = %e, "Set volume failed");
        }
    }

    // Pointer input

    pub fn mouse_down(&mut self, x: f64, y: f64) -> bool {
        let now = self.services.now();
        self.drag.begin(PointerKind::Mouse, Point::new(x, y), now)
    }

    pub fn mouse_move(&mut self, x: f64, y: f64) {
        let now = self.services.now();
        self.drag.update(Point::new(x, y), now);
    }

    pub fn mouse_up(&mut self) {
        let now = self.services.now();
        self.drag.release(now);
    }

    /// Returns true when the touch started a drag
    pub fn touch_start(&mut self, x: f64, y: f64) -> bool {
        let now = self.services.now();
        let began = self.drag.begin(PointerKind::Touch, Point::new(x, y), now);
        if began {
            self.controls.hide();
        }
        began
    }

    pub fn touch_move(&mut self, x: f64, y: f64) {
        self.mouse_move(x, y);
    }

    pub fn touch_end(&mut self) {
        self.mouse_up();
    }

    pub fn hover_enter(&mut self) {
        self.show_controls();
    }

    pub fn hover_leave(&mut self) {
        self.controls.hide();
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.drag.resize(viewport);
    }

    // Hand-offs

    /// Write the session, destroy the player, flag fullscreen and navigate to
    /// the watch page at the current second
    #[instrument(skip(self), fields(media_id = %self.session.media_id))]
    pub fn restore(&mut self) -> Result<()> {
        if self.is_live() {
            self.refresh_session();
        } else {
            self.session.timestamp = self.services.now();
        }
        self.services.store.save_session(&self.session)?;
        self.teardown();
        self.services.store.request_fullscreen()?;

        let start_at = self.session.current_time.floor() as u64;
        info!(start_at, "Restoring to full screen");
        self.services.shell.navigate(&Route::Watch {
            media_id: self.session.media_id.clone(),
            start_at: Some(start_at),
        })
    }

    /// Stop playback and forget the session and window position
    #[instrument(skip(self), fields(media_id = %self.session.media_id))]
    pub fn close(&mut self) {
        if self.is_live() {
            if let Err(e) = self.adapter.stop() {
                warn!(error = %e, "Stop failed");
            }
        }
        self.teardown();
        self.services.store.clear_session();
        self.services.store.clear_position();
        info!("Mini player closed");
    }

    /// Stop the poll, clear timers, cancel the snap, destroy the player
    pub fn teardown(&mut self) {
        self.poll.stop();
        self.init_watchdog.cancel();
        self.controls.cancel();
        self.drag.cancel();
        self.adapter.destroy();
        self.generation += 1;
        if let Err(e) = self.set_status(PlayerStatus::Idle) {
            warn!(error = %e, "Teardown transition failed");
        }
    }

    pub fn has_pending_timers(&self) -> bool {
        self.poll.is_running()
            || self.init_watchdog.is_pending()
            || self.controls.has_pending_timer()
            || self.drag.is_snapping()
    }

    pub fn status(&self) -> &PlayerStatus {
        &self.status
    }

    pub fn session(&self) -> &PlayerSession {
        &self.session
    }

    pub fn position(&self) -> Point {
        self.drag.position()
    }

    pub fn handle(&self) -> Option<HandleId> {
        self.adapter.handle()
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn drag(&self) -> &DragMachine {
        &self.drag
    }

    pub fn backend(&self) -> &B {
        self.adapter.backend()
    }

    pub fn view(&self) -> MiniPlayerView {
        MiniPlayerView {
            status: self.status.clone(),
            media_id: self.session.media_id.clone(),
            title: self.session.video.title.clone(),
            progress: self.progress,
            current_time_label: format_time(self.progress.current_time),
            volume: self.volume,
            is_muted: self.muted,
            is_playing: self.status.is_playing(),
            position: self.drag.position(),
            dragging: self.drag.is_dragging(),
            snapping: self.drag.is_snapping(),
            controls_visible: self.controls.is_visible(),
        }
    }

    fn is_live(&self) -> bool {
        self.adapter.is_live() && self.status.is_live()
    }

    fn show_controls(&mut self) {
        let now = self.services.now();
        self.controls.show(now);
    }

    /// Copy live player state into the session record
    fn refresh_session(&mut self) {
        let current_time = self.adapter.current_time().unwrap_or(self.progress.current_time);
        self.session.is_playing = matches!(
            self.status,
            PlayerStatus::Ready {
                playback: Playback::Playing | Playback::Buffering
            }
        );
        self.session.current_time = current_time;
        self.session.duration = self.progress.duration;
        self.session.progress = self.progress.progress;
        self.session.volume = self.volume;
        self.session.is_muted = self.muted;
        self.session.timestamp = self.services.now();
    }

    fn set_status(&mut self, target: PlayerStatus) -> Result<()> {
        if self.status == target {
            return Ok(());
        }
        if !self.status.can_transition_to(&target) {
            return Err(Error::InvalidStateTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        info!(from = %self.status, to = %target, "Mini player status");
        self.status = target;
        Ok(())
    }

    fn fail(&mut self, err: &Error) {
        self.init_watchdog.cancel();
        self.poll.stop();
        let fault = PlayerFault::from(err);
        if let Err(e) = self.set_status(PlayerStatus::Error { fault }) {
            warn!(error = %e, cause = %err, "Could not enter error state");
        }
    }
}

impl<B: EmbedBackend> std::fmt::Debug for MiniPlayerController<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniPlayerController")
            .field("status", &self.status)
            .field("media_id", &self.session.media_id)
            .field("position", &self.drag.position())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::clock::{Clock, ManualClock};
    use crate::config::PlayerConfig;
    use crate::persistence::{MemoryStorage, MiniPlayerPosition};
    use crate::testing::{BackendCall, RecordingBackend, RecordingShell};
    use crate::{CategoryRef, VideoInfo};
    use std::rc::Rc;

    const DESKTOP: Viewport = Viewport::new(1280.0, 720.0);

    struct Harness {
        backend: RecordingBackend,
        shell: Rc<RecordingShell>,
        clock: Rc<ManualClock>,
        services: HostServices,
    }

    fn harness() -> Harness {
        let shell = Rc::new(RecordingShell::new());
        let clock = Rc::new(ManualClock::new(5_000_000));
        let services = HostServices::new(
            PlayerConfig::default(),
            Rc::new(MemoryStorage::new()),
            shell.clone(),
            Rc::new(StaticCatalog::default()),
            clock.clone(),
        );
        Harness {
            backend: RecordingBackend::new(),
            shell,
            clock,
            services,
        }
    }

    fn session(h: &Harness, playing: bool) -> PlayerSession {
        PlayerSession {
            media_id: MediaId::new("abc123").unwrap(),
            video: VideoInfo {
                title: "Test".into(),
                source_url: "https://youtu.be/abc123".into(),
            },
            category: Some(CategoryRef::new("music")),
            is_playing: playing,
            current_time: 42.0,
            duration: 200.0,
            volume: 50,
            is_muted: false,
            progress: 21.0,
            like_status: None,
            timestamp: h.clock.now_ms(),
        }
    }


    fn mounted(h: &Harness, playing: bool) -> MiniPlayerController<RecordingBackend> {
        h.services.store.save_session(&session(h, playing)).unwrap();
        let mut mini = MiniPlayerController::mount(h.backend.clone(), "mini", h.services.clone(), DESKTOP).unwrap();
        let ticket = mini.begin_initialize().unwrap();
        mini.runtime_loaded(ticket, Ok(()));
        mini.handle_event(mini.handle().unwrap(), AdapterEvent::Ready { duration: 200.0 });
        mini
    }

    #[test]
    fn test_no_session_no_mount() {
        let h = harness();
        assert!(MiniPlayerController::mount(h.backend.clone(), "mini", h.services.clone(), DESKTOP).is_none());
    }

    #[test]
    fn test_stale_session_is_removed_on_mount() {
        let h = harness();
        h.services.store.save_session(&session(&h, true)).unwrap();
        h.clock.advance(3_600_000);
        assert!(MiniPlayerController::mount(h.backend.clone(), "mini", h.services.clone(), DESKTOP).is_none());
        assert!(h.services.store.peek_session().is_none());
    }

    #[test]
    fn test_ready_applies_session() {
        let h = harness();
        let mini = mounted(&h, true);
        let params = h.backend.last_params().unwrap();
        assert_eq!(params.autoplay, 1);
        assert!(h.backend.calls().contains(&BackendCall::SetVolume(50)));
        assert!(h.backend.calls().contains(&BackendCall::Seek(42.0)));
        assert!(!h.backend.calls().contains(&BackendCall::Mute));
        assert!(mini.status().is_playing());
    }

    #[test]
    fn test_paused_session_does_not_autoplay() {
        let h = harness();
        let mini = mounted(&h, false);
        assert_eq!(h.backend.last_params().unwrap().autoplay, 0);
        assert_eq!(mini.status(), &PlayerStatus::Ready { playback: Playback::Paused });
    }

    #[test]
    fn test_heartbeat_rewrites_session_while_playing() {
        let h = harness();
        let mut mini = mounted(&h, true);
        h.backend.set_current_time(47.0);
        h.clock.advance(1_000);
        mini.tick();

        let stored = h.services.store.peek_session().unwrap();
        assert_eq!(stored.current_time, 47.0);
        assert_eq!(stored.timestamp, h.clock.now_ms());
    }

    #[test]
    fn test_default_position_and_sticky_position() {
        let h = harness();
        let mini = mounted(&h, true);
        assert_eq!(mini.position(), Point::new(20.0, 20.0));
        drop(mini);

        h.services.store.save_position(MiniPlayerPosition { x: 5000.0, y: 10.0 }).unwrap();
        let mini = MiniPlayerController::mount(RecordingBackend::new(), "mini", h.services.clone(), DESKTOP).unwrap();
        assert_eq!(mini.position(), Point::new(960.0, 10.0));
    }

    #[test]
    fn test_drag_snaps_and_persists() {
        let h = harness();
        let mut mini = mounted(&h, true);
        assert!(mini.mouse_down(30.0, 30.0));
        h.clock.advance(16);
        mini.mouse_move(900.0, 500.0);
        mini.mouse_up();
        for _ in 0..30 {
            h.clock.advance(16);
            mini.tick();
        }
        assert_eq!(mini.position(), Point::new(940.0, 456.0));
        assert_eq!(
            h.services.store.load_position(),
            Some(MiniPlayerPosition { x: 940.0, y: 456.0 })
        );
    }

    #[test]
    fn test_touch_outside_header_does_not_drag() {
        let h = harness();
        let mut mini = mounted(&h, true);
        assert!(!mini.touch_start(100.0, 200.0));
        assert!(!mini.drag().is_dragging());
    }

    #[test]
    fn test_restore_hands_off_to_watch_page() {
        let h = harness();
        let mut mini = mounted(&h, true);
        mini.set_volume(65);
        h.backend.set_current_time(57.8);
        mini.restore().unwrap();

        let stored = h.services.store.peek_session().unwrap();
        assert_eq!(stored.current_time, 57.8);
        assert_eq!(stored.volume, 65);
        assert!(h.services.store.take_fullscreen_request());
        assert_eq!(
            h.shell.last_route(),
            Some(Route::Watch {
                media_id: MediaId::new("abc123").unwrap(),
                start_at: Some(57)
            })
        );
        assert!(h.services.slot.is_free());
        assert!(!mini.has_pending_timers());
    }

    #[test]
    fn test_close_clears_everything() {
        let h = harness();
        let mut mini = mounted(&h, true);
        h.services.store.save_position(MiniPlayerPosition { x: 20.0, y: 20.0 }).unwrap();
        mini.close();
        assert!(h.backend.calls().contains(&BackendCall::Stop));
        assert!(h.services.store.peek_session().is_none());
        assert!(h.services.store.load_position().is_none());
        assert!(h.services.slot.is_free());
        assert_eq!(mini.status(), &PlayerStatus::Idle);
    }

    #[test]
    fn test_volume_while_muted_applies_on_unmute() {
        let h = harness();
        let mut mini = mounted(&h, true);
        mini.toggle_mute();
        mini.set_volume(30);
        assert!(!h.backend.calls().contains(&BackendCall::SetVolume(30)));
        mini.toggle_mute();
        assert_eq!(h.backend.calls().last(), Some(&BackendCall::SetVolume(30)));
    }

    #[test]
    fn test_controls_hide_after_quiet_period() {
        let h = harness();
        let mut mini = mounted(&h, true);
        mini.hover_enter();
        assert!(mini.view().controls_visible);
        h.clock.advance(3_000);
        mini.tick();
        assert!(!mini.view().controls_visible);
    }
}
