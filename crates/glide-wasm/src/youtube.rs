//! YouTube IFrame API backend
//!
//! `YT.Player` callbacks land in an [`EventQueue`] tagged with the handle that
//! created them; the owning player drains the queue into its controller.

use glide_core::{AdapterEvent, EmbedBackend, EmbedParams, Error, HandleId, ProviderState, Result};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = YT, js_name = Player)]
    pub type YtPlayer;

    #[wasm_bindgen(constructor, js_namespace = YT, js_class = "Player", catch)]
    fn new(element_id: &str, options: &JsValue) -> std::result::Result<YtPlayer, JsValue>;

    #[wasm_bindgen(method, js_name = playVideo, catch)]
    fn play_video(this: &YtPlayer) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = pauseVideo, catch)]
    fn pause_video(this: &YtPlayer) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = stopVideo, catch)]
    fn stop_video(this: &YtPlayer) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = seekTo, catch)]
    fn seek_to(this: &YtPlayer, seconds: f64, allow_seek_ahead: bool) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = setVolume, catch)]
    fn set_volume(this: &YtPlayer, volume: u8) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn mute(this: &YtPlayer) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = unMute, catch)]
    fn un_mute(this: &YtPlayer) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = getCurrentTime, catch)]
    fn get_current_time(this: &YtPlayer) -> std::result::Result<f64, JsValue>;

    #[wasm_bindgen(method, js_name = getDuration, catch)]
    fn get_duration(this: &YtPlayer) -> std::result::Result<f64, JsValue>;

    #[wasm_bindgen(method, js_name = getVideoLoadedFraction, catch)]
    fn get_video_loaded_fraction(this: &YtPlayer) -> std::result::Result<f64, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn destroy(this: &YtPlayer) -> std::result::Result<(), JsValue>;
}

/// Provider events waiting for delivery
#[derive(Clone, Default)]
pub struct EventQueue {
    pending: Rc<RefCell<VecDeque<(HandleId, AdapterEvent)>>>,
    waker: Rc<RefCell<Option<Box<dyn Fn()>>>>,
}

impl EventQueue {
    pub fn push(&self, handle: HandleId, event: AdapterEvent) {
        self.pending.borrow_mut().push_back((handle, event));
        if let Some(wake) = self.waker.borrow().as_ref() {
            wake();
        }
    }

    pub fn drain(&self) -> Vec<(HandleId, AdapterEvent)> {
        self.pending.borrow_mut().drain(..).collect()
    }

    /// Called after every push; used to deliver without waiting for a tick
    pub fn set_waker(&self, wake: impl Fn() + 'static) {
        *self.waker.borrow_mut() = Some(Box::new(wake));
    }
}

type EventClosure = Closure<dyn FnMut(JsValue)>;

struct LivePlayer {
    player: YtPlayer,
    mount_id: String,
    _callbacks: [EventClosure; 3],
}

/// Id of the node a handle's player is mounted on. `YT.Player` replaces that
/// node with its iframe, so the host container itself is never handed over.
pub fn mount_id(handle: HandleId) -> String {
    format!("youtube-player-{}", handle)
}

fn document() -> Result<web_sys::Document> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| Error::backend("no document"))
}

/// Append a fresh mount node for `handle` inside `container`
fn append_mount(container: &str, handle: HandleId) -> Result<String> {
    let document = document()?;
    let host = document
        .get_element_by_id(container)
        .ok_or_else(|| Error::backend(format!("container #{} not found", container)))?;
    let id = mount_id(handle);
    let node = document.create_element("div").map_err(backend_error)?;
    node.set_id(&id);
    host.append_child(&node).map_err(backend_error)?;
    Ok(id)
}

fn remove_mount(id: &str) {
    if let Some(node) = document().ok().and_then(|d| d.get_element_by_id(id)) {
        node.remove();
    }
}

pub struct YouTubeBackend {
    events: EventQueue,
    live: Option<LivePlayer>,
}

impl YouTubeBackend {
    pub fn new(events: EventQueue) -> Self {
        Self { events, live: None }
    }

    fn player(&self) -> Result<&YtPlayer> {
        self.live
            .as_ref()
            .map(|l| &l.player)
            .ok_or(Error::NoActivePlayer)
    }

    fn callbacks(&self, handle: HandleId) -> [EventClosure; 3] {
        let events = self.events.clone();
        let on_ready = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            let duration = get(&event, "target")
                .map(|t| t.unchecked_into::<YtPlayer>())
                .and_then(|p| p.get_duration().ok())
                .unwrap_or(0.0);
            events.push(handle, AdapterEvent::Ready { duration });
        });

        let events = self.events.clone();
        let on_state = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            let code = event_code(&event);
            match code.and_then(ProviderState::from_code) {
                Some(state) => events.push(handle, AdapterEvent::StateChange(state)),
                None => debug!(?code, "Unknown provider state"),
            }
        });

        let events = self.events.clone();
        let on_error = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            let code = event_code(&event).unwrap_or(-1);
            events.push(handle, AdapterEvent::Error { code });
        });

        [on_ready, on_state, on_error]
    }
}

impl EmbedBackend for YouTubeBackend {
    fn create(&mut self, container: &str, handle: HandleId, params: &EmbedParams) -> Result<()> {
        let callbacks = self.callbacks(handle);

        let player_vars = serde_wasm_bindgen::to_value(params).map_err(|e| Error::backend(e.to_string()))?;
        let events = js_sys::Object::new();
        set(&events, "onReady", callbacks[0].as_ref())?;
        set(&events, "onStateChange", callbacks[1].as_ref())?;
        set(&events, "onError", callbacks[2].as_ref())?;

        let options = js_sys::Object::new();
        set(&options, "videoId", &JsValue::from_str(&params.video_id))?;
        set(&options, "width", &JsValue::from_str("100%"))?;
        set(&options, "height", &JsValue::from_str("100%"))?;
        set(&options, "playerVars", &player_vars)?;
        set(&options, "events", &events)?;

        let mount_id = append_mount(container, handle)?;
        let player = match YtPlayer::new(&mount_id, &options) {
            Ok(player) => player,
            Err(e) => {
                remove_mount(&mount_id);
                return Err(backend_error(e));
            }
        };
        debug!(container, mount_id = %mount_id, "Player mounted");
        self.live = Some(LivePlayer {
            player,
            mount_id,
            _callbacks: callbacks,
        });
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.player()?.play_video().map_err(backend_error)
    }

    fn pause(&mut self) -> Result<()> {
        self.player()?.pause_video().map_err(backend_error)
    }

    fn stop(&mut self) -> Result<()> {
        self.player()?.stop_video().map_err(backend_error)
    }

    fn seek(&mut self, seconds: f64) -> Result<()> {
        self.player()?.seek_to(seconds, true).map_err(backend_error)
    }

    fn set_volume(&mut self, volume: u8) -> Result<()> {
        YtPlayer::set_volume(self.player()?, volume).map_err(backend_error)
    }

    fn mute(&mut self) -> Result<()> {
        YtPlayer::mute(self.player()?).map_err(backend_error)
    }

    fn unmute(&mut self) -> Result<()> {
        self.player()?.un_mute().map_err(backend_error)
    }

    fn current_time(&self) -> Result<f64> {
        self.player()?.get_current_time().map_err(backend_error)
    }

    fn duration(&self) -> Result<f64> {
        self.player()?.get_duration().map_err(backend_error)
    }

    fn loaded_fraction(&self) -> Result<f64> {
        self.player()?.get_video_loaded_fraction().map_err(backend_error)
    }

    /// The callbacks are dropped with the player. The mount node goes even
    /// when the provider's own destroy throws.
    fn destroy(&mut self) -> Result<()> {
        let Some(live) = self.live.take() else {
            return Ok(());
        };
        let result = YtPlayer::destroy(&live.player).map_err(backend_error);
        remove_mount(&live.mount_id);
        result
    }
}

fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    js_sys::Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn set(target: &js_sys::Object, key: &str, value: &JsValue) -> Result<()> {
    js_sys::Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(backend_error)
}

fn event_code(event: &JsValue) -> Option<i32> {
    get(event, "data").and_then(|d| d.as_f64()).map(|d| d as i32)
}

fn backend_error(value: JsValue) -> Error {
    Error::backend(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}
