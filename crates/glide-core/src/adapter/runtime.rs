//! Embed runtime loader
//!
//! The provider's script must be injected exactly once per page. The loader is an
//! explicit value the host creates once and shares; every caller of [`RuntimeLoader::load`]
//! gets a future that resolves when the runtime signals ready.

use crate::{Error, Result};
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Host capabilities the loader needs
pub trait RuntimeHost {
    /// True when the provider's global API object is already usable
    fn is_runtime_present(&self) -> bool;

    /// Insert the script tag and register the global ready callback, which must
    /// call [`RuntimeLoader::signal_ready`]
    fn inject_script(&self, src: &str) -> Result<()>;

    /// Arrange for [`RuntimeLoader::fallback_elapsed`] to be called after `after`
    fn schedule_fallback(&self, after: Duration);
}

/// Loader lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderPhase {
    Unloaded,
    Loading,
    Loaded,
    Failed(String),
}

struct LoaderInner {
    phase: LoaderPhase,
    waiters: Vec<oneshot::Sender<Result<()>>>,
    script_url: String,
    fallback: Duration,
    injections: u32,
}

/// Init-once embed runtime loader with a queue of waiting callers
#[derive(Clone)]
pub struct RuntimeLoader {
    inner: Rc<RefCell<LoaderInner>>,
}

impl RuntimeLoader {
    pub fn new(script_url: impl Into<String>, fallback: Duration) -> Self {
        Self {
            inner: Rc::new(RefCell::new(LoaderInner {
                phase: LoaderPhase::Unloaded,
                waiters: Vec::new(),
                script_url: script_url.into(),
                fallback,
                injections: 0,
            })),
        }
    }

    pub fn phase(&self) -> LoaderPhase {
        self.inner.borrow().phase.clone()
    }

    /// Number of times the script was injected
    pub fn injections(&self) -> u32 {
        self.inner.borrow().injections
    }

    /// Resolve once the runtime is ready. The waiter is registered before this
    /// returns, so concurrent callers are queued in call order.
    pub fn load(&self, host: &dyn RuntimeHost) -> impl Future<Output = Result<()>> + 'static {
        let (tx, rx) = oneshot::channel();
        self.register(host, tx);
        async move {
            rx.await
                .unwrap_or_else(|_| Err(Error::RuntimeLoad("loader dropped before ready".into())))
        }
    }

    fn register(&self, host: &dyn RuntimeHost, tx: oneshot::Sender<Result<()>>) {
        let mut inner = self.inner.borrow_mut();
        let phase = inner.phase.clone();
        match phase {
            LoaderPhase::Loaded => {
                let _ = tx.send(Ok(()));
            }
            LoaderPhase::Loading => {
                debug!(waiters = inner.waiters.len() + 1, "Queued for embed runtime");
                inner.waiters.push(tx);
            }
            LoaderPhase::Unloaded | LoaderPhase::Failed(_) => {
                if host.is_runtime_present() {
                    info!("Embed runtime already present");
                    inner.phase = LoaderPhase::Loaded;
                    let _ = tx.send(Ok(()));
                    return;
                }

                inner.phase = LoaderPhase::Loading;
                inner.waiters.push(tx);
                inner.injections += 1;
                let src = inner.script_url.clone();
                let fallback = inner.fallback;
                // The host may synchronously call back into the loader
                drop(inner);

                info!(src = %src, "Injecting embed runtime");
                match host.inject_script(&src) {
                    Ok(()) => host.schedule_fallback(fallback),
                    Err(e) => {
                        warn!(error = %e, "Embed runtime injection failed");
                        self.fail(e.to_string());
                    }
                }
            }
        }
    }

    /// The provider's global ready callback fired
    pub fn signal_ready(&self) {
        let waiters = {
            let mut inner = self.inner.borrow_mut();
            if inner.phase == LoaderPhase::Loaded {
                return;
            }
            inner.phase = LoaderPhase::Loaded;
            std::mem::take(&mut inner.waiters)
        };
        info!(waiters = waiters.len(), "Embed runtime ready");
        for tx in waiters {
            let _ = tx.send(Ok(()));
        }
    }

    /// The fallback timer fired: accept a runtime that is present without having
    /// signalled, otherwise fail every waiter
    pub fn fallback_elapsed(&self, host: &dyn RuntimeHost) {
        if self.inner.borrow().phase != LoaderPhase::Loading {
            return;
        }
        if host.is_runtime_present() {
            debug!("Embed runtime present without ready callback");
            self.signal_ready();
        } else {
            self.fail("embed runtime did not signal ready".to_string());
        }
    }

    /// Fail every waiter; a later `load` starts over
    pub fn fail(&self, reason: String) {
        let waiters = {
            let mut inner = self.inner.borrow_mut();
            inner.phase = LoaderPhase::Failed(reason.clone());
            std::mem::take(&mut inner.waiters)
        };
        warn!(reason = %reason, waiters = waiters.len(), "Embed runtime load failed");
        for tx in waiters {
            let _ = tx.send(Err(Error::RuntimeLoad(reason.clone())));
        }
    }
}

impl std::fmt::Debug for RuntimeLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("RuntimeLoader")
            .field("phase", &inner.phase)
            .field("waiters", &inner.waiters.len())
            .field("injections", &inner.injections)
            .finish()
    }
}
