//! Glide WASM - Browser host for the Glide player
//!
//! Binds `glide-core` to the page:
//! - YouTube IFrame API backend
//! - `localStorage` session hand-off
//! - Router navigation and document fullscreen
//! - `tracing` output on the browser console
//!
//! ## Usage
//!
//! ```javascript
//! import init, { GlideFullScreenPlayer, GlideMiniPlayer } from '@glide/wasm';
//!
//! await init();
//! const player = new GlideFullScreenPlayer('player', '{}', catalogJson, router.push);
//! player.mount('my-video', 'music', null);
//! await player.initialize();
//! requestAnimationFrame(function frame() { player.tick(); requestAnimationFrame(frame); });
//! ```

use glide_core::{
    HostServices, PlaybackSlot, PlayerConfig, RuntimeLoader, StaticCatalog, SystemClock, Viewport,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::prelude::*;

mod logging;
mod player;
mod runtime;
mod shell;
mod storage;
mod youtube;

pub use player::{GlideFullScreenPlayer, GlideMiniPlayer};
pub use runtime::BrowserRuntimeHost;
pub use shell::BrowserShell;
pub use storage::LocalStorage;
pub use youtube::{EventQueue, YouTubeBackend};

thread_local! {
    // One player slot and one script loader per page
    static SLOT: PlaybackSlot = PlaybackSlot::new();
    static LOADER: RefCell<Option<RuntimeLoader>> = const { RefCell::new(None) };
}

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logging::install(tracing::Level::INFO);
    glide_core::init();
}

/// Library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Raise console logging to debug
#[wasm_bindgen(js_name = enableDebugLogging)]
pub fn enable_debug_logging() {
    logging::install(tracing::Level::DEBUG);
}

/// Page-wide runtime host; the loader is created on first use with the
/// configured script URL
pub(crate) fn runtime_host(config: &PlayerConfig) -> BrowserRuntimeHost {
    let loader = LOADER.with(|cell| {
        cell.borrow_mut()
            .get_or_insert_with(|| {
                RuntimeLoader::new(
                    config.playback.runtime_script_url.clone(),
                    Duration::from_millis(config.playback.runtime_fallback_ms),
                )
            })
            .clone()
    });
    BrowserRuntimeHost::new(loader)
}

/// Host services for a player mounted on this page. `fullscreen_target` is the
/// id of the element that goes fullscreen.
pub(crate) fn services(
    config_json: &str,
    catalog_json: Option<String>,
    navigate: Option<js_sys::Function>,
    fullscreen_target: Option<String>,
) -> Result<HostServices, JsValue> {
    let config = if config_json.trim().is_empty() {
        PlayerConfig::default()
    } else {
        PlayerConfig::from_json(config_json).map_err(to_js)?
    };
    let catalog = match catalog_json {
        Some(json) => StaticCatalog::from_json(&json).map_err(to_js)?,
        None => StaticCatalog::default(),
    };
    let storage = LocalStorage::open().map_err(to_js)?;

    let mut services = HostServices::new(
        config,
        Rc::new(storage),
        Rc::new(BrowserShell::new(navigate, fullscreen_target)),
        Rc::new(catalog),
        Rc::new(SystemClock),
    );
    services.slot = SLOT.with(|slot| slot.clone());
    Ok(services)
}

pub(crate) fn viewport() -> Viewport {
    let size = web_sys::window().and_then(|w| {
        let width = w.inner_width().ok()?.as_f64()?;
        let height = w.inner_height().ok()?.as_f64()?;
        Some((width, height))
    });
    let (width, height) = size.unwrap_or((1280.0, 720.0));
    Viewport::new(width, height)
}

pub(crate) fn to_js(err: glide_core::Error) -> JsValue {
    JsValue::from_str(&format!("{}: {}", err.error_code(), err))
}
