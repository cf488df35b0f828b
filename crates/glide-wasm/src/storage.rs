//! `window.localStorage` as a [`Storage`]

use glide_core::{Error, Result, Storage};
use wasm_bindgen::JsValue;

pub struct LocalStorage {
    inner: web_sys::Storage,
}

impl LocalStorage {
    /// Fails when storage is disabled (private mode, sandboxed frames)
    pub fn open() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| Error::Storage("no window".into()))?;
        let inner = window
            .local_storage()
            .map_err(js_error)?
            .ok_or_else(|| Error::Storage("localStorage unavailable".into()))?;
        Ok(Self { inner })
    }
}

impl Storage for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get_item(key).map_err(js_error)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set_item(key, value).map_err(js_error)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove_item(key).map_err(js_error)
    }
}

fn js_error(value: JsValue) -> Error {
    Error::Storage(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}
