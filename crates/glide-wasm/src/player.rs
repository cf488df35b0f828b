//! JavaScript-facing players
//!
//! Each wrapper owns its controller behind `Rc<RefCell<..>>` so provider
//! callbacks and the async runtime load can reach it. Events that arrive while
//! the controller is borrowed stay queued until the next `tick`.

use crate::runtime::BrowserRuntimeHost;
use crate::youtube::{EventQueue, YouTubeBackend};
use crate::{runtime_host, services, to_js, viewport};
use glide_core::{
    AdapterEvent, CategoryRef, EmbedBackend, FullScreenController, HandleId, InitTicket, MiniPlayerController,
    TouchOutcome, VideoCatalog,
};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;

trait Deliver {
    fn deliver(&mut self, handle: HandleId, event: AdapterEvent);
}

impl<B: EmbedBackend> Deliver for FullScreenController<B> {
    fn deliver(&mut self, handle: HandleId, event: AdapterEvent) {
        self.handle_event(handle, event);
    }
}

impl<B: EmbedBackend> Deliver for MiniPlayerController<B> {
    fn deliver(&mut self, handle: HandleId, event: AdapterEvent) {
        self.handle_event(handle, event);
    }
}

fn pump<C: Deliver>(controller: &RefCell<C>, events: &EventQueue) {
    let Ok(mut controller) = controller.try_borrow_mut() else {
        return;
    };
    for (handle, event) in events.drain() {
        controller.deliver(handle, event);
    }
}

fn wire<C: Deliver + 'static>(controller: &Rc<RefCell<C>>, events: &EventQueue) {
    let weak: Weak<RefCell<C>> = Rc::downgrade(controller);
    let queue = events.clone();
    events.set_waker(move || {
        if let Some(controller) = weak.upgrade() {
            pump(&controller, &queue);
        }
    });
}

/// Controllers that finish initialization once the runtime has loaded
trait Initialize {
    fn runtime_loaded(&mut self, ticket: InitTicket, result: glide_core::Result<()>);
}

impl<B: EmbedBackend> Initialize for FullScreenController<B> {
    fn runtime_loaded(&mut self, ticket: InitTicket, result: glide_core::Result<()>) {
        FullScreenController::runtime_loaded(self, ticket, result);
    }
}

impl<B: EmbedBackend> Initialize for MiniPlayerController<B> {
    fn runtime_loaded(&mut self, ticket: InitTicket, result: glide_core::Result<()>) {
        MiniPlayerController::runtime_loaded(self, ticket, result);
    }
}

/// Await the page's runtime loader for `ticket`. Resolves to whether an
/// initialization was started.
fn start<C: Initialize + 'static>(
    controller: &Rc<RefCell<C>>,
    host: &BrowserRuntimeHost,
    ticket: Option<InitTicket>,
) -> js_sys::Promise {
    let Some(ticket) = ticket else {
        return js_sys::Promise::resolve(&JsValue::FALSE);
    };
    let load = host.loader().load(host);
    let controller = controller.clone();
    wasm_bindgen_futures::future_to_promise(async move {
        let result = load.await;
        controller.borrow_mut().runtime_loaded(ticket, result);
        Ok(JsValue::TRUE)
    })
}

fn to_value<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Full-screen watch page player
#[wasm_bindgen]
pub struct GlideFullScreenPlayer {
    controller: Rc<RefCell<FullScreenController<YouTubeBackend>>>,
    catalog: Rc<dyn VideoCatalog>,
    events: EventQueue,
    host: BrowserRuntimeHost,
}

#[wasm_bindgen]
impl GlideFullScreenPlayer {
    /// `navigate` receives a path; without it the page uses `location.assign`
    #[wasm_bindgen(constructor)]
    pub fn new(
        container_id: String,
        config_json: String,
        catalog_json: String,
        navigate: Option<js_sys::Function>,
    ) -> Result<GlideFullScreenPlayer, JsValue> {
        let services = services(&config_json, Some(catalog_json), navigate, Some(container_id.clone()))?;
        let host = runtime_host(&services.config);
        let catalog = services.catalog.clone();
        let events = EventQueue::default();
        let controller = FullScreenController::new(
            YouTubeBackend::new(events.clone()),
            container_id,
            services,
            viewport(),
        );
        let controller = Rc::new(RefCell::new(controller));
        wire(&controller, &events);
        Ok(Self {
            controller,
            catalog,
            events,
            host,
        })
    }

    /// Enter the watch page for the catalog entry `slug`. Without a category
    /// the first category listing the video is used.
    #[wasm_bindgen]
    pub fn mount(&self, slug: &str, category_slug: Option<String>, start_at: Option<f64>) -> Result<(), JsValue> {
        let video = self
            .catalog
            .video_by_id(slug)
            .ok_or_else(|| JsValue::from_str(&format!("unknown video: {slug}")))?;
        let category = match category_slug {
            Some(wanted) => self
                .catalog
                .categories()
                .iter()
                .find(|c| c.category.slug == wanted)
                .map(|c| CategoryRef::from(&c.category)),
            None => self.catalog.category_of(slug),
        };
        let start_at = start_at.filter(|t| t.is_finite() && *t >= 0.0).map(|t| t as u64);
        self.controller.borrow_mut().mount(&video, category, start_at);
        Ok(())
    }

    /// Load the runtime and create the player. Resolves to false when
    /// initialization was refused; readiness arrives as a provider event.
    #[wasm_bindgen]
    pub fn initialize(&self) -> js_sys::Promise {
        let ticket = self.controller.borrow_mut().begin_initialize();
        start(&self.controller, &self.host, ticket)
    }

    /// Call from `requestAnimationFrame`
    #[wasm_bindgen]
    pub fn tick(&self) {
        pump(&self.controller, &self.events);
        self.controller.borrow_mut().tick();
    }

    #[wasm_bindgen(js_name = togglePlay)]
    pub fn toggle_play(&self) {
        self.controller.borrow_mut().toggle_play();
    }

    #[wasm_bindgen(js_name = skipForward)]
    pub fn skip_forward(&self) {
        self.controller.borrow_mut().skip_forward();
    }

    #[wasm_bindgen(js_name = skipBackward)]
    pub fn skip_backward(&self) {
        self.controller.borrow_mut().skip_backward();
    }

    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&self, volume: u8) {
        self.controller.borrow_mut().set_volume(volume);
    }

    #[wasm_bindgen(js_name = toggleMute)]
    pub fn toggle_mute(&self) {
        self.controller.borrow_mut().toggle_mute();
    }

    #[wasm_bindgen(js_name = toggleFullscreen)]
    pub fn toggle_fullscreen(&self) {
        self.controller.borrow_mut().toggle_fullscreen();
    }

    #[wasm_bindgen(js_name = toggleSubtitles)]
    pub fn toggle_subtitles(&self) {
        self.controller.borrow_mut().toggle_subtitles();
    }

    #[wasm_bindgen]
    pub fn like(&self) {
        self.controller.borrow_mut().like();
    }

    #[wasm_bindgen]
    pub fn dislike(&self) {
        self.controller.borrow_mut().dislike();
    }

    /// Progress bar click at `fraction` of its width
    #[wasm_bindgen(js_name = seekToFraction)]
    pub fn seek_to_fraction(&self, fraction: f64) {
        self.controller.borrow_mut().seek_to_fraction(fraction);
    }

    /// Resolves to false when the current error is not retryable
    #[wasm_bindgen]
    pub fn retry(&self) -> js_sys::Promise {
        let ticket = self.controller.borrow_mut().retry();
        start(&self.controller, &self.host, ticket)
    }

    #[wasm_bindgen]
    pub fn back(&self) -> Result<(), JsValue> {
        self.controller.borrow_mut().back().map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn minimize(&self) -> Result<(), JsValue> {
        self.controller.borrow_mut().minimize().map_err(to_js)
    }

    #[wasm_bindgen(js_name = selectRelated)]
    pub fn select_related(&self, index: usize) -> js_sys::Promise {
        let ticket = self.controller.borrow_mut().select_related(index);
        start(&self.controller, &self.host, ticket)
    }

    #[wasm_bindgen]
    pub fn interaction(&self) {
        self.controller.borrow_mut().interaction();
    }

    #[wasm_bindgen(js_name = pointerMoved)]
    pub fn pointer_moved(&self, x: f64) {
        self.controller.borrow_mut().pointer_moved(x);
    }

    #[wasm_bindgen(js_name = panelEntered)]
    pub fn panel_entered(&self) {
        self.controller.borrow_mut().panel_entered();
    }

    #[wasm_bindgen(js_name = panelLeft)]
    pub fn panel_left(&self, x: f64, panel_left_edge: f64) {
        self.controller.borrow_mut().panel_left(x, panel_left_edge);
    }

    /// Returns `"categoryInfoToggled"`, `"panelOpened"` or `"ignored"`
    #[wasm_bindgen(js_name = touchEnded)]
    pub fn touch_ended(&self, x: f64, y: f64) -> String {
        match self.controller.borrow_mut().touch_ended(x, y) {
            TouchOutcome::CategoryInfoToggled => "categoryInfoToggled",
            TouchOutcome::PanelOpened => "panelOpened",
            TouchOutcome::Ignored => "ignored",
        }
        .to_string()
    }

    #[wasm_bindgen(js_name = closePanel)]
    pub fn close_panel(&self) {
        self.controller.borrow_mut().close_panel();
    }

    #[wasm_bindgen]
    pub fn resize(&self) {
        self.controller.borrow_mut().resize(viewport());
    }

    /// Render snapshot
    #[wasm_bindgen]
    pub fn view(&self) -> Result<JsValue, JsValue> {
        to_value(&self.controller.borrow().view())
    }

    /// Destroy the player and clear every timer
    #[wasm_bindgen]
    pub fn unmount(&self) {
        self.controller.borrow_mut().teardown();
    }
}

/// Floating player hosted on the home page
#[wasm_bindgen]
pub struct GlideMiniPlayer {
    controller: Rc<RefCell<MiniPlayerController<YouTubeBackend>>>,
    events: EventQueue,
    host: BrowserRuntimeHost,
}

#[wasm_bindgen]
impl GlideMiniPlayer {
    /// Mount from the stored session; `undefined` when there is none
    #[wasm_bindgen]
    pub fn mount(
        container_id: String,
        config_json: String,
        navigate: Option<js_sys::Function>,
    ) -> Result<Option<GlideMiniPlayer>, JsValue> {
        let services = services(&config_json, None, navigate, None)?;
        let host = runtime_host(&services.config);
        let events = EventQueue::default();
        let Some(controller) =
            MiniPlayerController::mount(YouTubeBackend::new(events.clone()), container_id, services, viewport())
        else {
            return Ok(None);
        };
        let controller = Rc::new(RefCell::new(controller));
        wire(&controller, &events);
        Ok(Some(Self {
            controller,
            events,
            host,
        }))
    }

    #[wasm_bindgen]
    pub fn initialize(&self) -> js_sys::Promise {
        let ticket = self.controller.borrow_mut().begin_initialize();
        start(&self.controller, &self.host, ticket)
    }

    #[wasm_bindgen]
    pub fn tick(&self) {
        pump(&self.controller, &self.events);
        self.controller.borrow_mut().tick();
    }

    #[wasm_bindgen(js_name = togglePlay)]
    pub fn toggle_play(&self) {
        self.controller.borrow_mut().toggle_play();
    }

    #[wasm_bindgen(js_name = toggleMute)]
    pub fn toggle_mute(&self) {
        self.controller.borrow_mut().toggle_mute();
    }

    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&self, volume: u8) {
        self.controller.borrow_mut().set_volume(volume);
    }

    /// Returns true when the press landed on the drag header
    #[wasm_bindgen(js_name = mouseDown)]
    pub fn mouse_down(&self, x: f64, y: f64) -> bool {
        self.controller.borrow_mut().mouse_down(x, y)
    }

    #[wasm_bindgen(js_name = mouseMove)]
    pub fn mouse_move(&self, x: f64, y: f64) {
        self.controller.borrow_mut().mouse_move(x, y);
    }

    #[wasm_bindgen(js_name = mouseUp)]
    pub fn mouse_up(&self) {
        self.controller.borrow_mut().mouse_up();
    }

    #[wasm_bindgen(js_name = touchStart)]
    pub fn touch_start(&self, x: f64, y: f64) -> bool {
        self.controller.borrow_mut().touch_start(x, y)
    }

    #[wasm_bindgen(js_name = touchMove)]
    pub fn touch_move(&self, x: f64, y: f64) {
        self.controller.borrow_mut().touch_move(x, y);
    }

    #[wasm_bindgen(js_name = touchEnd)]
    pub fn touch_end(&self) {
        self.controller.borrow_mut().touch_end();
    }

    #[wasm_bindgen(js_name = hoverEnter)]
    pub fn hover_enter(&self) {
        self.controller.borrow_mut().hover_enter();
    }

    #[wasm_bindgen(js_name = hoverLeave)]
    pub fn hover_leave(&self) {
        self.controller.borrow_mut().hover_leave();
    }

    #[wasm_bindgen]
    pub fn restore(&self) -> Result<(), JsValue> {
        self.controller.borrow_mut().restore().map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn close(&self) {
        self.controller.borrow_mut().close();
    }

    #[wasm_bindgen]
    pub fn resize(&self) {
        self.controller.borrow_mut().resize(viewport());
    }

    #[wasm_bindgen]
    pub fn view(&self) -> Result<JsValue, JsValue> {
        to_value(&self.controller.borrow().view())
    }

    #[wasm_bindgen]
    pub fn unmount(&self) {
        self.controller.borrow_mut().teardown();
    }
}
