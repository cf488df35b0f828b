//! IFrame API script injection
//!
//! The provider calls `window.onYouTubeIframeAPIReady` once its script has run.
//! Any handler the page installed before us is still called.

use glide_core::{Error, Result, RuntimeHost, RuntimeLoader};
use std::time::Duration;
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

const READY_CALLBACK: &str = "onYouTubeIframeAPIReady";

#[derive(Clone)]
pub struct BrowserRuntimeHost {
    loader: RuntimeLoader,
}

impl BrowserRuntimeHost {
    pub fn new(loader: RuntimeLoader) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &RuntimeLoader {
        &self.loader
    }

    fn install_ready_callback(&self, window: &web_sys::Window) -> Result<()> {
        let previous = js_sys::Reflect::get(window, &JsValue::from_str(READY_CALLBACK))
            .ok()
            .and_then(|v| v.dyn_into::<js_sys::Function>().ok());
        let loader = self.loader.clone();
        let callback = Closure::once_into_js(move || {
            if let Some(previous) = previous {
                if let Err(e) = previous.call0(&JsValue::NULL) {
                    warn!(error = ?e, "Previous ready handler threw");
                }
            }
            loader.signal_ready();
        });
        js_sys::Reflect::set(window, &JsValue::from_str(READY_CALLBACK), &callback)
            .map(|_| ())
            .map_err(runtime_error)
    }
}

impl RuntimeHost for BrowserRuntimeHost {
    fn is_runtime_present(&self) -> bool {
        let Some(window) = web_sys::window() else {
            return false;
        };
        js_sys::Reflect::get(&window, &JsValue::from_str("YT"))
            .ok()
            .filter(|yt| yt.is_object())
            .and_then(|yt| js_sys::Reflect::get(&yt, &JsValue::from_str("Player")).ok())
            .map(|player| player.is_function())
            .unwrap_or(false)
    }

    fn inject_script(&self, src: &str) -> Result<()> {
        let window = web_sys::window().ok_or_else(|| Error::RuntimeLoad("no window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| Error::RuntimeLoad("no document".into()))?;
        self.install_ready_callback(&window)?;

        let script: web_sys::HtmlScriptElement = document
            .create_element("script")
            .map_err(runtime_error)?
            .dyn_into()
            .map_err(|_| Error::RuntimeLoad("not a script element".into()))?;
        script.set_src(src);
        script.set_async(true);

        let head = document
            .head()
            .ok_or_else(|| Error::RuntimeLoad("no document head".into()))?;
        head.append_child(&script).map(|_| ()).map_err(runtime_error)
    }

    fn schedule_fallback(&self, after: Duration) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let host = self.clone();
        let callback = Closure::once_into_js(move || {
            host.loader.fallback_elapsed(&host);
        });
        let scheduled = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            after.as_millis().min(i32::MAX as u128) as i32,
        );
        if let Err(e) = scheduled {
            warn!(error = ?e, "Could not schedule runtime fallback");
        }
    }
}

fn runtime_error(value: JsValue) -> Error {
    Error::RuntimeLoad(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}
