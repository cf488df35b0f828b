//! CLI command implementations

use crate::output::{print_record, print_rows, OutputFormat};
use anyhow::{anyhow, bail, Context};
use glide_core::drag::{DragMachine, DragPhase, PointerKind};
use glide_core::testing::{RecordingBackend, RecordingShell, ShellCall, StubRuntimeHost};
use glide_core::{
    extract_media_id, format_time, watch_url, AdapterEvent, Clock, FullScreenController, HostServices, ManualClock,
    MemoryStorage, MiniPlayerController, PlayerConfig, PlayerSession, Point, Route, RuntimeLoader, StaticCatalog,
    SystemClock, VideoCatalog, Viewport,
};
use serde::Serialize;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;
use tabled::Tabled;
use tracing::{debug, info};

/// Defaults, optionally overridden by a JSON file
pub fn load_config(path: Option<&Path>) -> anyhow::Result<PlayerConfig> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            Ok(PlayerConfig::from_json(&json)?)
        }
        None => Ok(PlayerConfig::default()),
    }
}

fn load_catalog(path: &Path) -> anyhow::Result<StaticCatalog> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let catalog = StaticCatalog::from_json(&json)?;
    debug!(videos = catalog.len(), "Catalog loaded");
    Ok(catalog)
}

fn parse_pair(value: &str, separator: char) -> anyhow::Result<(f64, f64)> {
    let (a, b) = value
        .split_once(separator)
        .ok_or_else(|| anyhow!("expected two numbers separated by '{}', got {:?}", separator, value))?;
    Ok((a.trim().parse()?, b.trim().parse()?))
}

// ============================================================================
// extract
// ============================================================================

#[derive(Serialize, Tabled)]
struct ExtractRow {
    source: String,
    media_id: String,
    watch_url: String,
}

/// Extract media ids
pub fn extract(urls: &[String], format: OutputFormat) -> anyhow::Result<()> {
    let rows: Vec<ExtractRow> = urls
        .iter()
        .map(|source| {
            let id = extract_media_id(source);
            ExtractRow {
                source: source.clone(),
                media_id: id.as_ref().map(|m| m.to_string()).unwrap_or_else(|| "-".into()),
                watch_url: id.as_ref().map(watch_url).unwrap_or_else(|| "-".into()),
            }
        })
        .collect();

    print_rows(&rows, format, |r| format!("{} -> {}", r.source, r.media_id))?;

    if rows.iter().any(|r| r.media_id == "-") {
        bail!("one or more sources have no media id");
    }
    Ok(())
}

// ============================================================================
// session
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionReport {
    #[serde(flatten)]
    session: PlayerSession,
    fresh: bool,
    remaining_ms: u64,
    written_at: String,
    resume_path: String,
}

/// Inspect a stored session record
pub fn session(file: &Path, now: Option<u64>, config: &PlayerConfig, format: OutputFormat) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let session: PlayerSession = serde_json::from_str(&json).context("not a session record")?;
    let session = session.sanitized();

    let now = now.unwrap_or_else(|| SystemClock.now_ms());
    let ttl = config.persistence.session_ttl_ms;
    let written_at = chrono::DateTime::from_timestamp_millis(session.timestamp as i64)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "invalid".into());
    let resume_path = Route::Watch {
        media_id: session.media_id.clone(),
        start_at: Some(session.current_time.floor() as u64),
    }
    .to_path();

    let report = SessionReport {
        fresh: session.is_fresh(now, ttl),
        remaining_ms: session.remaining_ms(now, ttl),
        written_at,
        resume_path,
        session,
    };

    print_record(&report, format, |r| {
        format!(
            "{} \"{}\" at {} / {} (volume {}{}), {}",
            r.session.media_id,
            r.session.video.title,
            format_time(r.session.current_time),
            format_time(r.session.duration),
            r.session.volume,
            if r.session.is_muted { ", muted" } else { "" },
            if r.fresh {
                format!("fresh for {}s", r.remaining_ms / 1000)
            } else {
                "stale".to_string()
            }
        )
    })
}

// ============================================================================
// related
// ============================================================================

#[derive(Serialize, Tabled)]
struct RelatedRow {
    slug: String,
    title: String,
    media_id: String,
}

/// List related videos
pub fn related(catalog: &Path, slug: &str, config: &PlayerConfig, format: OutputFormat) -> anyhow::Result<()> {
    let catalog = load_catalog(catalog)?;
    let video = catalog
        .video_by_id(slug)
        .ok_or_else(|| anyhow!("no video with slug {:?}", slug))?;
    let media_id = video
        .media_id()
        .ok_or_else(|| anyhow!("{} has no media id", video.media_url))?;
    let category = catalog
        .category_of(slug)
        .ok_or_else(|| anyhow!("{} is not in any category", slug))?;

    let mut videos = catalog.related_videos(&media_id, &category.slug);
    videos.truncate(config.panel.max_related);
    info!(count = videos.len(), category = %category.slug, "Related videos");

    let rows: Vec<RelatedRow> = videos
        .into_iter()
        .map(|v| RelatedRow {
            media_id: v.media_id().map(|m| m.to_string()).unwrap_or_else(|| "-".into()),
            slug: v.slug,
            title: v.title,
        })
        .collect();
    print_rows(&rows, format, |r| format!("{:<24} {}", r.slug, r.title))
}

// ============================================================================
// fling
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FlingReport {
    input: &'static str,
    released_at: Point,
    flung_to: Point,
    snapped_to: Point,
    snap_frames: u32,
}

/// Simulate a drag-and-release of the floating window
pub fn fling(
    from: &str,
    by: &str,
    duration: u64,
    viewport: &str,
    touch: bool,
    config: &PlayerConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    const STEPS: u64 = 10;
    const FRAME_MS: u64 = 16;

    let (x, y) = parse_pair(from, ',')?;
    let (dx, dy) = parse_pair(by, ',')?;
    let (width, height) = parse_pair(viewport, 'x')?;
    let kind = if touch { PointerKind::Touch } else { PointerKind::Mouse };

    let mut drag = DragMachine::new(Point::new(x, y), Viewport::new(width, height), config.drag.clone());
    let start = drag.position();
    let grab = Point::new(start.x + 10.0, start.y + 10.0);
    if !drag.begin(kind, grab, 0) {
        bail!("pointer missed the drag header");
    }

    let duration = duration.max(STEPS);
    for i in 1..=STEPS {
        let f = i as f64 / STEPS as f64;
        let t = duration * i / STEPS;
        drag.update(Point::new(grab.x + dx * f, grab.y + dy * f), t);
    }
    let released_at = drag.position();
    drag.release(duration);
    let flung_to = match drag.phase() {
        DragPhase::Snapping(animation) => animation.from,
        _ => released_at,
    };

    let mut now = duration;
    let mut snap_frames = 0;
    let snapped_to = loop {
        now += FRAME_MS;
        snap_frames += 1;
        if let Some(settled) = drag.tick(now) {
            break settled;
        }
    };

    let report = FlingReport {
        input: if touch { "touch" } else { "mouse" },
        released_at,
        flung_to,
        snapped_to,
        snap_frames,
    };
    print_record(&report, format, |r| {
        format!(
            "{} release at ({:.0}, {:.0}) -> fling ({:.0}, {:.0}) -> snap ({:.0}, {:.0}) in {} frames",
            r.input,
            r.released_at.x,
            r.released_at.y,
            r.flung_to.x,
            r.flung_to.y,
            r.snapped_to.x,
            r.snapped_to.y,
            r.snap_frames
        )
    })
}

// ============================================================================
// handoff
// ============================================================================

pub struct HandoffScript {
    pub slug: String,
    pub at: f64,
    pub volume: u8,
    pub muted: bool,
    pub floating_for: u64,
}

#[derive(Serialize, Tabled)]
struct Step {
    clock_ms: u64,
    player: &'static str,
    effect: String,
}

struct Recorder {
    clock: Rc<ManualClock>,
    shell: Rc<RecordingShell>,
    shell_seen: usize,
    started: u64,
    steps: Vec<Step>,
}

impl Recorder {
    fn record(&mut self, player: &'static str, effect: impl Into<String>) {
        self.steps.push(Step {
            clock_ms: self.clock.now_ms() - self.started,
            player,
            effect: effect.into(),
        });
    }

    fn backend(&mut self, player: &'static str, backend: &RecordingBackend) {
        for call in backend.calls() {
            self.record(player, format!("{:?}", call));
        }
        backend.clear_calls();
    }

    fn shell(&mut self) {
        let calls = self.shell.calls();
        for call in calls.iter().skip(self.shell_seen) {
            let effect = match call {
                ShellCall::Navigate(route) => format!("navigate {}", route.to_path()),
                ShellCall::GoBack => "history back".to_string(),
                ShellCall::RequestFullscreen => "request fullscreen".to_string(),
                ShellCall::ExitFullscreen => "exit fullscreen".to_string(),
            };
            self.record("shell", effect);
        }
        self.shell_seen = calls.len();
    }
}

/// Run a scripted minimize/restore round trip against in-memory hosts
pub async fn handoff(
    catalog: &Path,
    script: HandoffScript,
    config: PlayerConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    const DURATION: f64 = 300.0;
    const DESKTOP: Viewport = Viewport::new(1280.0, 720.0);

    let catalog = Rc::new(load_catalog(catalog)?);
    let video = catalog
        .video_by_id(&script.slug)
        .ok_or_else(|| anyhow!("no video with slug {:?}", script.slug))?;
    let category = catalog.category_of(&script.slug);

    let clock = Rc::new(ManualClock::new(SystemClock.now_ms()));
    let shell = Rc::new(RecordingShell::new());
    let loader = RuntimeLoader::new(
        config.playback.runtime_script_url.clone(),
        Duration::from_millis(config.playback.runtime_fallback_ms),
    );
    let host = StubRuntimeHost::present();
    let services = HostServices::new(
        config,
        Rc::new(MemoryStorage::new()),
        shell.clone(),
        catalog.clone(),
        clock.clone(),
    );
    let mut log = Recorder {
        started: clock.now_ms(),
        clock: clock.clone(),
        shell: shell.clone(),
        shell_seen: 0,
        steps: Vec::new(),
    };

    // Full screen, then minimize
    let backend = RecordingBackend::new();
    let mut full = FullScreenController::new(backend.clone(), "player", services.clone(), DESKTOP);
    full.mount(&video, category.clone(), None);
    full.initialize(&loader, &host).await;
    let handle = full.handle().ok_or_else(|| anyhow!("full-screen player failed: {}", full.status()))?;
    backend.set_duration(DURATION);
    full.handle_event(handle, AdapterEvent::Ready { duration: DURATION });
    full.set_volume(script.volume);
    if script.muted {
        full.toggle_mute();
    }
    backend.set_current_time(script.at);
    clock.advance(services.config.playback.poll_interval_ms);
    full.tick();
    log.backend("full-screen", &backend);

    full.minimize()?;
    log.backend("full-screen", &backend);
    log.shell();

    // Floating player
    let backend = RecordingBackend::new();
    let mut mini = MiniPlayerController::mount(backend.clone(), "mini", services.clone(), DESKTOP)
        .ok_or_else(|| anyhow!("no fresh session after minimize"))?;
    mini.initialize(&loader, &host).await;
    let handle = mini.handle().ok_or_else(|| anyhow!("floating player failed: {}", mini.status()))?;
    backend.set_duration(DURATION);
    backend.set_current_time(script.at);
    mini.handle_event(handle, AdapterEvent::Ready { duration: DURATION });
    log.backend("floating", &backend);

    let mut position = script.at;
    for _ in 0..script.floating_for {
        clock.advance(1000);
        position += 1.0;
        backend.set_current_time(position);
        mini.tick();
    }
    mini.restore()?;
    log.backend("floating", &backend);
    log.shell();

    let Some(Route::Watch { start_at, .. }) = shell.last_route() else {
        bail!("restore did not navigate to the watch page");
    };

    // Back to full screen
    let backend = RecordingBackend::new();
    let mut full = FullScreenController::new(backend.clone(), "player", services.clone(), DESKTOP);
    full.mount(&video, category, start_at);
    full.initialize(&loader, &host).await;
    let handle = full.handle().ok_or_else(|| anyhow!("restored player failed: {}", full.status()))?;
    backend.set_duration(DURATION);
    full.handle_event(handle, AdapterEvent::Ready { duration: DURATION });
    clock.advance(services.config.playback.fullscreen_request_delay_ms);
    full.tick();
    log.backend("full-screen", &backend);
    log.shell();
    full.teardown();

    info!(
        steps = log.steps.len(),
        volume = full.volume(),
        muted = full.is_muted(),
        "Hand-off complete"
    );
    print_rows(&log.steps, format, |s| format!("{:>6}ms  {:<12} {}", s.clock_ms, s.player, s.effect))
}
