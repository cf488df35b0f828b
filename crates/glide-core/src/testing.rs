//! In-memory hosts
//!
//! Recording implementations of the host traits, used by unit and integration
//! tests and by `glide-cli` to run controllers headless.

use crate::adapter::{EmbedBackend, EmbedParams, RuntimeHost};
use crate::shell::Shell;
use crate::{Error, HandleId, Result, Route};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// One call made against a [`RecordingBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Create {
        container: String,
        handle: HandleId,
        params: EmbedParams,
    },
    Play,
    Pause,
    Stop,
    Seek(f64),
    SetVolume(u8),
    Mute,
    Unmute,
    Destroy,
}

#[derive(Debug)]
struct BackendState {
    calls: Vec<BackendCall>,
    current_time: f64,
    duration: f64,
    loaded_fraction: f64,
    fail_create: bool,
    fail_destroy: bool,
}

impl Default for BackendState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            current_time: 0.0,
            duration: 0.0,
            loaded_fraction: 0.0,
            fail_create: false,
            fail_destroy: false,
        }
    }
}

/// Backend that records every call. Clones share state, so a test can keep one
/// clone while a controller owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    state: Rc<RefCell<BackendState>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.borrow().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Handle passed to the most recent `create`
    pub fn last_handle(&self) -> Option<HandleId> {
        self.state.borrow().calls.iter().rev().find_map(|c| match c {
            BackendCall::Create { handle, .. } => Some(*handle),
            _ => None,
        })
    }

    /// Params passed to the most recent `create`
    pub fn last_params(&self) -> Option<EmbedParams> {
        self.state.borrow().calls.iter().rev().find_map(|c| match c {
            BackendCall::Create { params, .. } => Some(params.clone()),
            _ => None,
        })
    }

    pub fn set_current_time(&self, seconds: f64) {
        self.state.borrow_mut().current_time = seconds;
    }

    pub fn set_duration(&self, seconds: f64) {
        self.state.borrow_mut().duration = seconds;
    }

    pub fn set_loaded_fraction(&self, fraction: f64) {
        self.state.borrow_mut().loaded_fraction = fraction;
    }

    pub fn fail_create(&self, fail: bool) {
        self.state.borrow_mut().fail_create = fail;
    }

    pub fn fail_destroy(&self, fail: bool) {
        self.state.borrow_mut().fail_destroy = fail;
    }

    fn record(&self, call: BackendCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl EmbedBackend for RecordingBackend {
    fn create(&mut self, container: &str, handle: HandleId, params: &EmbedParams) -> Result<()> {
        if self.state.borrow().fail_create {
            return Err(Error::backend("create refused"));
        }
        self.record(BackendCall::Create {
            container: container.to_string(),
            handle,
            params: params.clone(),
        });
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.record(BackendCall::Play);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.record(BackendCall::Pause);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.record(BackendCall::Stop);
        Ok(())
    }

    fn seek(&mut self, seconds: f64) -> Result<()> {
        self.record(BackendCall::Seek(seconds));
        self.state.borrow_mut().current_time = seconds;
        Ok(())
    }

    fn set_volume(&mut self, volume: u8) -> Result<()> {
        self.record(BackendCall::SetVolume(volume));
        Ok(())
    }

    fn mute(&mut self) -> Result<()> {
        self.record(BackendCall::Mute);
        Ok(())
    }

    fn unmute(&mut self) -> Result<()> {
        self.record(BackendCall::Unmute);
        Ok(())
    }

    fn current_time(&self) -> Result<f64> {
        Ok(self.state.borrow().current_time)
    }

    fn duration(&self) -> Result<f64> {
        Ok(self.state.borrow().duration)
    }

    fn loaded_fraction(&self) -> Result<f64> {
        Ok(self.state.borrow().loaded_fraction)
    }

    fn destroy(&mut self) -> Result<()> {
        self.record(BackendCall::Destroy);
        if self.state.borrow().fail_destroy {
            Err(Error::backend("destroy threw"))
        } else {
            Ok(())
        }
    }
}

/// Runtime host that never touches a page
#[derive(Debug, Default)]
pub struct StubRuntimeHost {
    present: Cell<bool>,
    fail_injection: Cell<bool>,
    injected: RefCell<Vec<String>>,
    fallbacks: RefCell<Vec<Duration>>,
}

impl StubRuntimeHost {
    /// Host whose runtime is already loaded
    pub fn present() -> Self {
        let host = Self::default();
        host.set_present(true);
        host
    }

    pub fn set_present(&self, present: bool) {
        self.present.set(present);
    }

    pub fn fail_injection(&self, fail: bool) {
        self.fail_injection.set(fail);
    }

    pub fn injected(&self) -> Vec<String> {
        self.injected.borrow().clone()
    }

    pub fn fallbacks(&self) -> Vec<Duration> {
        self.fallbacks.borrow().clone()
    }
}

impl RuntimeHost for StubRuntimeHost {
    fn is_runtime_present(&self) -> bool {
        self.present.get()
    }

    fn inject_script(&self, src: &str) -> Result<()> {
        if self.fail_injection.get() {
            return Err(Error::RuntimeLoad(format!("could not insert {src}")));
        }
        self.injected.borrow_mut().push(src.to_string());
        Ok(())
    }

    fn schedule_fallback(&self, after: Duration) {
        self.fallbacks.borrow_mut().push(after);
    }
}

/// Shell effect recorded by [`RecordingShell`]
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCall {
    Navigate(Route),
    GoBack,
    RequestFullscreen,
    ExitFullscreen,
}

/// Shell that records navigation and tracks a fullscreen flag
#[derive(Debug, Default)]
pub struct RecordingShell {
    calls: RefCell<Vec<ShellCall>>,
    fullscreen: Cell<bool>,
}

impl RecordingShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ShellCall> {
        self.calls.borrow().clone()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                ShellCall::Navigate(route) => Some(route.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_route(&self) -> Option<Route> {
        self.routes().pop()
    }
}

impl Shell for RecordingShell {
    fn navigate(&self, route: &Route) -> Result<()> {
        self.calls.borrow_mut().push(ShellCall::Navigate(route.clone()));
        Ok(())
    }

    fn go_back(&self) -> Result<()> {
        self.calls.borrow_mut().push(ShellCall::GoBack);
        Ok(())
    }

    fn request_fullscreen(&self) -> Result<()> {
        self.calls.borrow_mut().push(ShellCall::RequestFullscreen);
        self.fullscreen.set(true);
        Ok(())
    }

    fn exit_fullscreen(&self) -> Result<()> {
        self.calls.borrow_mut().push(ShellCall::ExitFullscreen);
        self.fullscreen.set(false);
        Ok(())
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen.get()
    }
}
