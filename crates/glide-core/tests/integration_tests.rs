//! Integration tests for Glide Core
//!
//! Full-screen ↔ floating hand-offs driven through the public API with
//! in-memory hosts.

use glide_core::testing::{BackendCall, RecordingBackend, RecordingShell, ShellCall, StubRuntimeHost};
use glide_core::{
    AdapterEvent, CategoryRef, Clock, FullScreenController, HostServices, LikeStatus, ManualClock, MediaId,
    MemoryStorage, MiniPlayerController, MiniPlayerPosition, PlayerConfig, PlayerFault, PlayerSession, PlayerStatus,
    Route, RuntimeLoader, StaticCatalog, VideoCatalog, VideoInfo, Viewport,
};
use std::rc::Rc;
use std::time::Duration;

const DESKTOP: Viewport = Viewport::new(1280.0, 720.0);

const CATALOG: &str = r#"{
    "categories": [{
        "category": { "slug": "music", "name": "Music" },
        "contents": [
            { "slug": "first", "title": "First", "mediaUrl": "https://www.youtube.com/watch?v=abc123" },
            { "slug": "second", "title": "Second", "mediaUrl": "https://youtu.be/def456" }
        ]
    }]
}"#;

struct App {
    shell: Rc<RecordingShell>,
    clock: Rc<ManualClock>,
    catalog: Rc<StaticCatalog>,
    services: HostServices,
}

fn app() -> App {
    let shell = Rc::new(RecordingShell::new());
    let clock = Rc::new(ManualClock::new(1_700_000_000_000));
    let catalog = Rc::new(StaticCatalog::from_json(CATALOG).unwrap());
    let services = HostServices::new(
        PlayerConfig::default(),
        Rc::new(MemoryStorage::new()),
        shell.clone(),
        catalog.clone(),
        clock.clone(),
    );
    App {
        shell,
        clock,
        catalog,
        services,
    }
}

fn watch(app: &App, backend: &RecordingBackend, start_at: Option<u64>) -> FullScreenController<RecordingBackend> {
    let mut player = FullScreenController::new(backend.clone(), "player", app.services.clone(), DESKTOP);
    let video = app.catalog.video_by_id("first").unwrap();
    player.mount(&video, Some(CategoryRef::new("music")), start_at);
    let ticket = player.begin_initialize().unwrap();
    player.runtime_loaded(ticket, Ok(()));
    backend.set_duration(300.0);
    player.handle_event(player.handle().unwrap(), AdapterEvent::Ready { duration: 300.0 });
    player
}

fn float(app: &App, backend: &RecordingBackend) -> MiniPlayerController<RecordingBackend> {
    let mut mini = MiniPlayerController::mount(backend.clone(), "mini", app.services.clone(), DESKTOP).unwrap();
    let ticket = mini.begin_initialize().unwrap();
    mini.runtime_loaded(ticket, Ok(()));
    mini.handle_event(mini.handle().unwrap(), AdapterEvent::Ready { duration: 300.0 });
    mini
}

// =============================================================================
// Hand-off Tests
// =============================================================================

#[test]
fn test_minimize_resumes_in_floating_player() {
    let app = app();
    let full_backend = RecordingBackend::new();
    let mut player = watch(&app, &full_backend, None);
    player.set_volume(50);
    full_backend.set_current_time(42.0);

    player.minimize().unwrap();
    assert_eq!(app.shell.last_route(), Some(Route::Home));
    assert!(app.services.slot.is_free());

    let mini_backend = RecordingBackend::new();
    let mini = float(&app, &mini_backend);

    assert_eq!(mini_backend.last_params().unwrap().autoplay, 1);
    assert_eq!(mini_backend.last_params().unwrap().video_id, "abc123");
    let calls = mini_backend.calls();
    assert!(calls.contains(&BackendCall::Seek(42.0)));
    assert!(calls.contains(&BackendCall::SetVolume(50)));
    assert!(!calls.contains(&BackendCall::Mute));
    assert!(mini.status().is_playing());
}

#[test]
fn test_round_trip_restores_full_screen() {
    let app = app();
    let full_backend = RecordingBackend::new();
    let mut player = watch(&app, &full_backend, None);
    player.toggle_mute();
    full_backend.set_current_time(30.0);
    player.minimize().unwrap();
    drop(player);

    let mini_backend = RecordingBackend::new();
    let mut mini = float(&app, &mini_backend);
    assert!(mini_backend.calls().contains(&BackendCall::Mute));

    app.clock.advance(5_000);
    mini_backend.set_current_time(35.6);
    mini.restore().unwrap();
    assert_eq!(
        app.shell.last_route(),
        Some(Route::Watch {
            media_id: MediaId::new("abc123").unwrap(),
            start_at: Some(35)
        })
    );
    drop(mini);

    let restored_backend = RecordingBackend::new();
    let mut player = watch(&app, &restored_backend, Some(35));
    assert!(restored_backend.calls().contains(&BackendCall::Seek(35.6)));
    assert!(restored_backend.calls().contains(&BackendCall::Mute));
    assert!(player.is_muted());
    // Consumed once the restored player is ready
    assert!(app.services.store.peek_session().is_none());

    app.clock.advance(1_500);
    player.tick();
    assert!(app.shell.calls().contains(&ShellCall::RequestFullscreen));
}

#[test]
fn test_round_trip_keeps_like_and_volume() {
    let app = app();
    let full_backend = RecordingBackend::new();
    let mut player = watch(&app, &full_backend, None);
    player.like();
    player.set_volume(37);
    full_backend.set_current_time(12.0);
    player.minimize().unwrap();
    drop(player);

    let mini_backend = RecordingBackend::new();
    let mut mini = float(&app, &mini_backend);
    assert!(mini_backend.calls().contains(&BackendCall::SetVolume(37)));

    // Heartbeat rewrites the session while floating
    app.clock.advance(1_000);
    mini_backend.set_current_time(13.0);
    mini.tick();
    let heartbeat = app.services.store.peek_session().unwrap();
    assert_eq!(heartbeat.like_status, Some(LikeStatus::Like));
    assert_eq!(heartbeat.volume, 37);

    mini.restore().unwrap();
    drop(mini);

    let restored_backend = RecordingBackend::new();
    let player = watch(&app, &restored_backend, Some(13));
    assert_eq!(player.like_status(), Some(LikeStatus::Like));
    assert_eq!(player.volume(), 37);
    assert!(!player.is_muted());
    assert!(restored_backend.calls().contains(&BackendCall::SetVolume(37)));
}

#[test]
fn test_stale_session_is_not_resumed() {
    let app = app();
    let session = PlayerSession {
        media_id: MediaId::new("abc123").unwrap(),
        video: VideoInfo {
            title: "First".into(),
            source_url: "https://www.youtube.com/watch?v=abc123".into(),
        },
        category: None,
        is_playing: true,
        current_time: 10.0,
        duration: 300.0,
        volume: 80,
        is_muted: false,
        progress: 3.3,
        like_status: None,
        timestamp: app.clock.now_ms() - 3_600_001,
    };
    app.services.store.save_session(&session).unwrap();

    assert!(MiniPlayerController::mount(RecordingBackend::new(), "mini", app.services.clone(), DESKTOP).is_none());
    assert!(app.services.store.peek_session().is_none());
}

#[test]
fn test_close_forgets_session_and_position() {
    let app = app();
    let mut player = watch(&app, &RecordingBackend::new(), None);
    player.minimize().unwrap();

    let mini_backend = RecordingBackend::new();
    let mut mini = float(&app, &mini_backend);
    mini.close();

    assert!(app.services.store.peek_session().is_none());
    assert!(app.services.store.load_position().is_none());
    assert!(!mini.has_pending_timers());
    assert!(MiniPlayerController::mount(RecordingBackend::new(), "mini", app.services.clone(), DESKTOP).is_none());
}

// =============================================================================
// Exclusivity Tests
// =============================================================================

#[test]
fn test_only_one_player_is_live() {
    let app = app();
    let mut player = watch(&app, &RecordingBackend::new(), None);
    player.minimize().unwrap();

    let mut mini = MiniPlayerController::mount(RecordingBackend::new(), "mini", app.services.clone(), DESKTOP).unwrap();
    // A full-screen player that never released the slot blocks the floating one
    let blocker = watch(&app, &RecordingBackend::new(), None);
    let ticket = mini.begin_initialize().unwrap();
    mini.runtime_loaded(ticket, Ok(()));

    assert!(matches!(
        mini.status(),
        PlayerStatus::Error {
            fault: PlayerFault::Backend { .. }
        }
    ));
    assert!(mini.handle().is_none());
    assert_eq!(app.services.slot.active(), blocker.handle());
}

#[test]
fn test_events_from_destroyed_player_are_ignored() {
    let app = app();
    let backend = RecordingBackend::new();
    let mut player = watch(&app, &backend, None);
    let old = player.handle().unwrap();

    let video = app.catalog.video_by_id("second").unwrap();
    let ticket = player.load_video_in_place(&video).unwrap();
    player.runtime_loaded(ticket, Ok(()));

    player.handle_event(old, AdapterEvent::Error { code: 150 });
    assert_eq!(player.status(), &PlayerStatus::Initializing);
    assert_eq!(player.media_id(), Some(&MediaId::new("def456").unwrap()));
}

// =============================================================================
// Floating Window Tests
// =============================================================================

#[test]
fn test_fling_left_snaps_to_left_edge() {
    let app = app();
    app.services
        .store
        .save_position(MiniPlayerPosition { x: 600.0, y: 200.0 })
        .unwrap();
    let mut player = watch(&app, &RecordingBackend::new(), None);
    player.minimize().unwrap();

    let mut mini = float(&app, &RecordingBackend::new());
    assert!(mini.touch_start(700.0, 220.0));
    app.clock.advance(16);
    mini.touch_move(620.0, 220.0);
    app.clock.advance(16);
    mini.touch_end();

    for _ in 0..25 {
        app.clock.advance(16);
        mini.tick();
    }
    assert_eq!(mini.position().x, 20.0);
    assert_eq!(
        app.services.store.load_position().map(|p| p.x),
        Some(20.0)
    );
}

#[test]
fn test_position_survives_across_videos() {
    let app = app();
    app.services
        .store
        .save_position(MiniPlayerPosition { x: 940.0, y: 456.0 })
        .unwrap();
    let mut player = watch(&app, &RecordingBackend::new(), None);
    player.minimize().unwrap();
    let mini = float(&app, &RecordingBackend::new());
    assert_eq!(mini.position().x, 940.0);
    assert_eq!(mini.position().y, 456.0);
}

// =============================================================================
// Related Panel Tests
// =============================================================================

#[test]
fn test_edge_dwell_opens_panel() {
    let app = app();
    let mut player = watch(&app, &RecordingBackend::new(), None);

    player.pointer_moved(1250.0);
    app.clock.advance(100);
    player.tick();
    assert!(!player.panel().is_open());

    app.clock.advance(100);
    player.tick();
    assert!(player.panel().is_open());
}

#[test]
fn test_brief_edge_pass_keeps_panel_closed() {
    let app = app();
    let mut player = watch(&app, &RecordingBackend::new(), None);

    player.pointer_moved(1250.0);
    app.clock.advance(100);
    player.pointer_moved(640.0);
    app.clock.advance(400);
    player.tick();
    assert!(!player.panel().is_open());
}

// =============================================================================
// Runtime Loader Tests
// =============================================================================

#[tokio::test]
async fn test_initialize_through_loader() {
    let app = app();
    let loader = RuntimeLoader::new("https://www.youtube.com/iframe_api", Duration::from_secs(3));
    let host = StubRuntimeHost::present();
    let backend = RecordingBackend::new();

    let mut player = FullScreenController::new(backend.clone(), "player", app.services.clone(), DESKTOP);
    let video = app.catalog.video_by_id("first").unwrap();
    player.mount(&video, None, None);
    player.initialize(&loader, &host).await;

    assert_eq!(player.status(), &PlayerStatus::Initializing);
    assert!(player.handle().is_some());
    assert_eq!(loader.injections(), 0);
}
