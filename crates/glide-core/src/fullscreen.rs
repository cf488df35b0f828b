//! Full-screen player controller
//!
//! Owns one [`MediaAdapter`] and drives:
//! - the playback state machine (`Idle → Initializing → Ready/Error`, `Ended`)
//! - transport controls and the live time poll
//! - the related-content panel and the controls overlay
//! - the minimize hand-off to the floating player

use crate::adapter::{AdapterEvent, EmbedBackend, MediaAdapter, RuntimeHost, RuntimeLoader};
use crate::catalog::Video;
use crate::controls::ControlsVisibility;
use crate::panel::{RelatedPanel, TouchOutcome};
use crate::persistence::PlayerSession;
use crate::shell::HostServices;
use crate::timer::{Interval, Timeout};
use crate::{
    format_time, CategoryRef, Error, HandleId, LikeStatus, MediaId, Playback, PlaybackProgress, PlayerFault,
    PlayerStatus, ProviderState, Result, Route, VideoInfo, Viewport,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Proof that an initialization was started. A ticket is invalidated by any
/// later initialization or teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitTicket {
    generation: u64,
}

impl InitTicket {
    pub(crate) fn new(generation: u64) -> Self {
        Self { generation }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Render snapshot of the full-screen player
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullScreenView {
    pub status: PlayerStatus,
    pub media_id: Option<MediaId>,
    pub video: Option<VideoInfo>,
    pub category: Option<CategoryRef>,
    #[serde(flatten)]
    pub progress: PlaybackProgress,
    pub current_time_label: String,
    pub duration_label: String,
    pub volume: u8,
    pub is_muted: bool,
    pub like_status: Option<LikeStatus>,
    pub subtitles_enabled: bool,
    pub controls_visible: bool,
    pub panel_open: bool,
    pub show_category_info: bool,
    pub related: Vec<Video>,
    pub is_mobile: bool,
    pub can_retry: bool,
}

pub struct FullScreenController<B: EmbedBackend> {
    /// The one player this controller drives
    adapter: MediaAdapter<B>,
    services: HostServices,
    viewport: Viewport,
    status: PlayerStatus,
    /// Current video; replaced by load-in-place
    video: Option<VideoInfo>,
    media_id: Option<MediaId>,
    category: Option<CategoryRef>,
    progress: PlaybackProgress,
    volume: u8,
    muted: bool,
    like_status: Option<LikeStatus>,
    subtitles_enabled: bool,
    /// Seek target applied once on ready
    resume_at: Option<f64>,
    /// A stored session was hydrated and must be cleared once ready
    restored_session: bool,
    /// Bumped on every initialization and teardown
    generation: u64,
    poll: Interval,
    init_watchdog: Timeout,
    fullscreen_request: Timeout,
    controls: ControlsVisibility,
    panel: RelatedPanel,
}

impl<B: EmbedBackend> FullScreenController<B> {
    pub fn new(backend: B, container: impl Into<String>, services: HostServices, viewport: Viewport) -> Self {
        let config = services.config.clone();
        let adapter = MediaAdapter::new(backend, container, config.playback.origin.clone(), services.slot.clone());
        Self {
            adapter,
            viewport,
            status: PlayerStatus::Idle,
            video: None,
            media_id: None,
            category: None,
            progress: PlaybackProgress::default(),
            volume: config.playback.default_volume,
            muted: false,
            like_status: None,
            subtitles_enabled: false,
            resume_at: None,
            restored_session: false,
            generation: 0,
            poll: Interval::default(),
            init_watchdog: Timeout::default(),
            fullscreen_request: Timeout::default(),
            controls: ControlsVisibility::new(true, config.playback.controls_hide_ms),
            panel: RelatedPanel::new(config.panel.clone()),
            services,
        }
    }

    /// Enter the watch page for `video`. A fresh session for the same media id
    /// hydrates volume, mute, like status and resume position; otherwise
    /// `query_start` (the `t` parameter) is the resume position.
    #[instrument(skip(self, video), fields(slug = %video.slug))]
    pub fn mount(&mut self, video: &Video, category: Option<CategoryRef>, query_start: Option<u64>) {
        let now = self.services.now();
        if self.services.store.take_fullscreen_request() {
            debug!("Fullscreen requested by restore");
            self.fullscreen_request
                .start(now, self.services.config.playback.fullscreen_request_delay_ms);
        }

        self.video = Some(video.info());
        self.category = category;
        self.media_id = video.media_id();
        self.resume_at = query_start.map(|t| t as f64);

        let Some(media_id) = self.media_id.clone() else {
            warn!(url = %video.media_url, "No media id in source url");
            self.enter_unresolvable();
            return;
        };

        if let Some(session) = self.services.store.load_session(now) {
            if session.media_id == media_id {
                info!(media_id = %media_id, current_time = session.current_time, "Hydrating from session");
                self.volume = session.volume;
                self.muted = session.is_muted;
                self.like_status = session.like_status;
                if session.current_time > 0.0 {
                    self.resume_at = Some(session.current_time);
                }
                self.restored_session = true;
            }
        }

        self.refresh_related();
        self.controls.show(now);
    }

    /// Start initializing the current video. Returns `None` when there is
    /// nothing to load or the current state forbids it.
    pub fn begin_initialize(&mut self) -> Option<InitTicket> {
        if self.media_id.is_none() {
            self.enter_unresolvable();
            return None;
        }
        if let Err(e) = self.set_status(PlayerStatus::Initializing) {
            warn!(error = %e, "Initialization refused");
            return None;
        }
        self.progress = PlaybackProgress::default();
        self.poll.stop();
        self.init_watchdog.cancel();
        self.generation += 1;
        Some(InitTicket {
            generation: self.generation,
        })
    }

    /// The runtime finished loading for `ticket`; create the player
    pub fn runtime_loaded(&mut self, ticket: InitTicket, result: Result<()>) {
        if ticket.generation != self.generation || self.status != PlayerStatus::Initializing {
            debug!("Ignoring stale initialization");
            return;
        }
        if let Err(e) = result {
            self.fail(&e);
            return;
        }
        let Some(media_id) = self.media_id.clone() else {
            self.enter_unresolvable();
            return;
        };
        match self.adapter.initialize(&media_id, self.volume, true) {
            Ok(_) => {
                let now = self.services.now();
                self.init_watchdog
                    .start(now, self.services.config.playback.init_timeout_ms);
            }
            Err(e) => self.fail(&e),
        }
    }

    /// `begin_initialize`, await the runtime, `runtime_loaded`
    pub async fn initialize(&mut self, loader: &RuntimeLoader, host: &dyn RuntimeHost) {
        let Some(ticket) = self.begin_initialize() else {
            return;
        };
        let result = loader.load(host).await;
        self.runtime_loaded(ticket, result);
    }

    /// Deliver a player event. Events from any handle but the live one are dropped.
    pub fn handle_event(&mut self, handle: HandleId, event: AdapterEvent) {
        if !self.adapter.accepts(handle) {
            debug!(handle = %handle, "Dropping event from stale player");
            return;
        }
        match event {
            AdapterEvent::Ready { duration } => self.on_ready(duration),
            AdapterEvent::StateChange(state) => self.on_state_change(state),
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
        let now = self.services.now();
        self.init_watchdog.cancel();

        if let Err(e) = self.adapter.on_ready() {
            warn!(error = %e, "Could not apply volume");
        }
        if self.muted {
            if let Err(e) = self.adapter.mute() {
                warn!(error = %e, "Could not mute");
            }
        }
        self.progress.update(0.0, duration.max(0.0), 0.0);
        if let Some(t) = self.resume_at.take().filter(|t| *t > 0.0) {
            match self.adapter.seek(t) {
                Ok(()) => self.progress.seek(t),
                Err(e) => warn!(error = %e, "Resume seek failed"),
            }
        }

        if let Err(e) = self.set_status(PlayerStatus::Ready { playback: Playback::Playing }) {
            warn!(error = %e, "Ready in unexpected state");
            return;
        }
        self.poll.start(now, self.services.config.playback.poll_interval_ms);
        self.controls.show(now);

        if self.restored_session {
            self.services.store.clear_session();
            self.restored_session = false;
        }
    }

    fn on_state_change(&mut self, state: ProviderState) {
        if !self.status.is_live() {
            return;
        }
        let Some(target) = PlayerStatus::from_provider(state) else {
            return;
        };
        let now = self.services.now();
        match target {
            PlayerStatus::Ended => {
                self.poll_now();
                self.poll.stop();
            }
            _ if !self.poll.is_running() => {
                self.poll.start(now, self.services.config.playback.poll_interval_ms);
            }
            _ => {}
        }
        if let Err(e) = self.set_status(target) {
            warn!(error = %e, "Ignoring provider state");
        }
    }

    /// Fire due timers. Call from the host's frame loop.
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
        if self.fullscreen_request.fire(now) && !self.services.shell.is_fullscreen() {
            if let Err(e) = self.services.shell.request_fullscreen() {
                warn!(error = %e, "Fullscreen request refused");
            }
        }
        let may_hide = self.status.is_playing() && !self.is_mobile();
        self.controls.tick(now, may_hide);
        self.panel.tick(now);
    }

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
    }

    // Transport

    /// Ask the player to flip play/pause; state follows from its events
    pub fn toggle_play(&mut self) {
        self.interaction();
        let result = match self.status {
            PlayerStatus::Ready { playback: Playback::Playing | Playback::Buffering } => self.adapter.pause(),
            PlayerStatus::Ready { playback: Playback::Paused } | PlayerStatus::Ended => self.adapter.play(),
            _ => Ok(()),
        };
        if let Err(e) = result {
            warn!(error = %e, "Toggle play failed");
        }
    }

    pub fn skip_forward(&mut self) {
        self.skip(self.services.config.playback.skip_seconds);
    }

    pub fn skip_backward(&mut self) {
        self.skip(-self.services.config.playback.skip_seconds);
    }

    fn skip(&mut self, delta: f64) {
        self.interaction();
        if !self.is_live() {
            return;
        }
        let result = self.adapter.current_time().and_then(|t| {
            let target = (t + delta).max(0.0);
            self.adapter.seek(target).map(|_| target)
        });
        match result {
            Ok(t) => self.progress.seek(t),
            Err(e) => warn!(error = %e, "Skip failed"),
        }
    }

    /// 0 marks the player muted; any other value unmutes
    pub fn set_volume(&mut self, volume: u8) {
        self.interaction();
        let volume = volume.min(100);
        let was_muted = self.muted;
        self.volume = volume;
        self.muted = volume == 0;
        if !self.adapter.is_live() {
            return;
        }
        if let Err(e) = self.adapter.set_volume(volume) {
            warn!(error = %e, "Set volume failed");
        }
        if was_muted && volume > 0 && self.is_live() {
            if let Err(e) = self.adapter.unmute() {
                warn!(error = %e, "Unmute failed");
            }
        }
    }

    /// Unmuting restores the last volume
    pub fn toggle_mute(&mut self) {
        self.interaction();
        if self.muted {
            self.muted = false;
            if self.volume == 0 {
                self.volume = self.services.config.playback.default_volume;
            }
            if self.is_live() {
                let volume = self.volume;
                if let Err(e) = self.adapter.unmute().and_then(|_| self.adapter.set_volume(volume)) {
                    warn!(error = %e, "Unmute failed");
                }
            }
        } else {
            self.muted = true;
            if self.is_live() {
                if let Err(e) = self.adapter.mute() {
                    warn!(error = %e, "Mute failed");
                }
            }
        }
    }

    /// Document-level fullscreen
    pub fn toggle_fullscreen(&mut self) {
        self.interaction();
        let shell = &self.services.shell;
        let result = if shell.is_fullscreen() {
            shell.exit_fullscreen()
        } else {
            shell.request_fullscreen()
        };
        if let Err(e) = result {
            warn!(error = %e, "Fullscreen toggle failed");
        }
    }

    pub fn like(&mut self) {
        self.interaction();
        self.like_status = LikeStatus::toggle(self.like_status, LikeStatus::Like);
    }

    pub fn dislike(&mut self) {
        self.interaction();
        self.like_status = LikeStatus::toggle(self.like_status, LikeStatus::Dislike);
    }

    /// Caption state only; no track is rendered
    pub fn toggle_subtitles(&mut self) {
        self.interaction();
        self.subtitles_enabled = !self.subtitles_enabled;
    }

    /// Progress-bar click at `fraction` of the bar's width
    pub fn seek_to_fraction(&mut self, fraction: f64) {
        self.interaction();
        if !self.is_live() || self.progress.duration <= 0.0 || !fraction.is_finite() {
            return;
        }
        let target = fraction.clamp(0.0, 1.0) * self.progress.duration;
        match self.adapter.seek(target) {
            Ok(()) => self.progress.seek(target),
            Err(e) => warn!(error = %e, "Seek failed"),
        }
    }

    // Recovery and exits

    /// Re-run initialization from a retryable error
    pub fn retry(&mut self) -> Option<InitTicket> {
        match self.status.fault() {
            Some(fault) if fault.can_retry() => {
                info!(fault = ?fault, "Retrying");
                self.begin_initialize()
            }
            _ => None,
        }
    }

    /// Tear down, forget the session and go back in history
    #[instrument(skip(self))]
    pub fn back(&mut self) -> Result<()> {
        self.teardown();
        self.services.store.clear_session();
        self.services.shell.go_back()
    }

    /// Hand playback to the floating player: write the session, tear down and
    /// navigate home
    #[instrument(skip(self), fields(media_id = ?self.media_id))]
    pub fn minimize(&mut self) -> Result<()> {
        let session = self.capture_session()?;
        self.services.store.save_session(&session)?;
        info!(
            current_time = session.current_time,
            volume = session.volume,
            muted = session.is_muted,
            "Minimizing"
        );
        self.teardown();
        self.services.shell.navigate(&Route::Home)
    }

    /// Snapshot of the live state as a hand-off record
    pub fn capture_session(&self) -> Result<PlayerSession> {
        let media_id = self.media_id.clone().ok_or_else(|| Error::UnresolvableMedia {
            url: self.video.as_ref().map(|v| v.source_url.clone()).unwrap_or_default(),
        })?;
        let video = self.video.clone().ok_or_else(|| Error::Internal("no video mounted".into()))?;
        let current_time = if self.is_live() {
            self.adapter.current_time().unwrap_or(self.progress.current_time)
        } else {
            self.progress.current_time
        };
        let is_playing = matches!(
            self.status,
            PlayerStatus::Ready {
                playback: Playback::Playing | Playback::Buffering
            }
        );
        Ok(PlayerSession {
            media_id,
            video,
            category: self.category.clone(),
            is_playing,
            current_time,
            duration: self.progress.duration,
            volume: self.volume,
            is_muted: self.muted,
            progress: self.progress.progress,
            like_status: self.like_status,
            timestamp: self.services.now(),
        }
        .sanitized())
    }

    /// Play another video on the same container without navigating
    #[instrument(skip(self, video), fields(slug = %video.slug))]
    pub fn load_video_in_place(&mut self, video: &Video) -> Option<InitTicket> {
        self.teardown();
        self.video = Some(video.info());
        self.media_id = video.media_id();
        self.like_status = None;
        self.resume_at = None;
        self.restored_session = false;

        if self.media_id.is_none() {
            warn!(url = %video.media_url, "No media id in source url");
            self.enter_unresolvable();
            return None;
        }
        self.refresh_related();
        self.interaction();
        self.begin_initialize()
    }

    /// Choose the `index`-th related video
    pub fn select_related(&mut self, index: usize) -> Option<InitTicket> {
        let video = self.panel.related().get(index).cloned()?;
        let ticket = self.load_video_in_place(&video);
        let is_mobile = self.is_mobile();
        self.panel.after_select(is_mobile);
        ticket
    }

    // Pointer and layout

    /// Any click or tap on the player surface
    pub fn interaction(&mut self) {
        let now = self.services.now();
        self.controls.show(now);
    }

    pub fn pointer_moved(&mut self, x: f64) {
        if !self.is_mobile() {
            let now = self.services.now();
            self.panel.pointer_moved(x, self.viewport, now);
        }
        self.interaction();
    }

    pub fn panel_entered(&mut self) {
        if !self.is_mobile() {
            self.panel.panel_entered();
        }
    }

    pub fn panel_left(&mut self, x: f64, panel_left_edge: f64) {
        if !self.is_mobile() {
            let now = self.services.now();
            self.panel.panel_left(x, panel_left_edge, now);
        }
    }

    pub fn touch_ended(&mut self, x: f64, y: f64) -> TouchOutcome {
        if !self.is_mobile() {
            return TouchOutcome::Ignored;
        }
        let outcome = self.panel.touch_ended(x, y, self.viewport);
        if outcome != TouchOutcome::Ignored {
            self.interaction();
        }
        outcome
    }

    pub fn close_panel(&mut self) {
        self.panel.close();
        self.interaction();
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn is_mobile(&self) -> bool {
        self.viewport
            .is_mobile(self.services.config.panel.mobile_breakpoint_px)
    }

    /// Stop the poll, clear every timer, destroy the player
    pub fn teardown(&mut self) {
        self.poll.stop();
        self.init_watchdog.cancel();
        self.fullscreen_request.cancel();
        self.controls.cancel();
        self.panel.cancel_timers();
        self.adapter.destroy();
        self.generation += 1;
        if let Err(e) = self.set_status(PlayerStatus::Idle) {
            warn!(error = %e, "Teardown transition failed");
        }
    }

    pub fn has_pending_timers(&self) -> bool {
        self.poll.is_running()
            || self.init_watchdog.is_pending()
            || self.fullscreen_request.is_pending()
            || self.controls.has_pending_timer()
            || self.panel.has_pending_timers()
    }

    // Accessors

    pub fn status(&self) -> &PlayerStatus {
        &self.status
    }

    pub fn media_id(&self) -> Option<&MediaId> {
        self.media_id.as_ref()
    }

    pub fn handle(&self) -> Option<HandleId> {
        self.adapter.handle()
    }

    pub fn progress(&self) -> PlaybackProgress {
        self.progress
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn like_status(&self) -> Option<LikeStatus> {
        self.like_status
    }

    pub fn subtitles_enabled(&self) -> bool {
        self.subtitles_enabled
    }

    pub fn panel(&self) -> &RelatedPanel {
        &self.panel
    }

    pub fn controls_visible(&self) -> bool {
        self.controls.is_visible()
    }

    pub fn backend(&self) -> &B {
        self.adapter.backend()
    }

    pub fn view(&self) -> FullScreenView {
        FullScreenView {
            status: self.status.clone(),
            media_id: self.media_id.clone(),
            video: self.video.clone(),
            category: self.category.clone(),
            progress: self.progress,
            current_time_label: format_time(self.progress.current_time),
            duration_label: format_time(self.progress.duration),
            volume: self.volume,
            is_muted: self.muted,
            like_status: self.like_status,
            subtitles_enabled: self.subtitles_enabled,
            controls_visible: self.controls.is_visible(),
            panel_open: self.panel.is_open(),
            show_category_info: self.panel.show_category_info(),
            related: self.panel.related().to_vec(),
            is_mobile: self.is_mobile(),
            can_retry: self.status.fault().is_some_and(PlayerFault::can_retry),
        }
    }

    // Internals

    /// Player calls are only forwarded once ready
    fn is_live(&self) -> bool {
        self.adapter.is_live() && self.status.is_live()
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
        info!(from = %self.status, to = %target, "Player status");
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

    fn enter_unresolvable(&mut self) {
        self.teardown();
        if let Err(e) = self.set_status(PlayerStatus::Error {
            fault: PlayerFault::Unresolvable,
        }) {
            warn!(error = %e, "Could not enter error state");
        }
    }

    fn refresh_related(&mut self) {
        let catalog = self.services.catalog.clone();
        self.panel
            .refresh(catalog.as_ref(), self.media_id.as_ref(), self.category.as_ref());
    }
}

impl<B: EmbedBackend> std::fmt::Debug for FullScreenController<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FullScreenController")
            .field("status", &self.status)
            .field("media_id", &self.media_id)
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}
