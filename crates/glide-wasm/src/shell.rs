//! Browser navigation and fullscreen

use glide_core::{Error, Result, Route, Shell};
use wasm_bindgen::JsValue;

/// Navigates through the application's router when one is supplied, otherwise
/// through `location.assign`. Fullscreen goes to the player container when one
/// is set, otherwise to the whole document.
pub struct BrowserShell {
    navigate: Option<js_sys::Function>,
    fullscreen_target: Option<String>,
}

impl BrowserShell {
    pub fn new(navigate: Option<js_sys::Function>, fullscreen_target: Option<String>) -> Self {
        Self {
            navigate,
            fullscreen_target,
        }
    }

    pub fn fullscreen_target(&self) -> Option<&str> {
        self.fullscreen_target.as_deref()
    }

    fn window(&self) -> Result<web_sys::Window> {
        web_sys::window().ok_or_else(|| Error::Navigation("no window".into()))
    }

    fn document(&self) -> Result<web_sys::Document> {
        self.window()?
            .document()
            .ok_or_else(|| Error::Navigation("no document".into()))
    }
}

impl Shell for BrowserShell {
    fn navigate(&self, route: &Route) -> Result<()> {
        let path = route.to_path();
        match &self.navigate {
            Some(callback) => callback
                .call1(&JsValue::NULL, &JsValue::from_str(&path))
                .map(|_| ())
                .map_err(nav_error),
            None => self.window()?.location().assign(&path).map_err(nav_error),
        }
    }

    fn go_back(&self) -> Result<()> {
        self.window()?.history().map_err(nav_error)?.back().map_err(nav_error)
    }

    fn request_fullscreen(&self) -> Result<()> {
        let document = self.document()?;
        let target = match &self.fullscreen_target {
            Some(id) => document
                .get_element_by_id(id)
                .ok_or_else(|| Error::Navigation(format!("container #{} not found", id)))?,
            None => document
                .document_element()
                .ok_or_else(|| Error::Navigation("no document element".into()))?,
        };
        target.request_fullscreen().map_err(nav_error)
    }

    fn exit_fullscreen(&self) -> Result<()> {
        self.document()?.exit_fullscreen();
        Ok(())
    }

    fn is_fullscreen(&self) -> bool {
        self.document()
            .map(|d| d.fullscreen_element().is_some())
            .unwrap_or(false)
    }
}

fn nav_error(value: JsValue) -> Error {
    Error::Navigation(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fullscreen_target() {
        assert_eq!(BrowserShell::new(None, Some("player".into())).fullscreen_target(), Some("player"));
        assert_eq!(BrowserShell::new(None, None).fullscreen_target(), None);
    }
}
