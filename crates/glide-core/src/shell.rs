//! Application shell capabilities and the host service bundle

use crate::catalog::VideoCatalog;
use crate::clock::Clock;
use crate::persistence::{SessionStore, Storage};
use crate::{PlaybackSlot, PlayerConfig, Result, Route};
use std::rc::Rc;

/// Navigation and document-level fullscreen
pub trait Shell {
    fn navigate(&self, route: &Route) -> Result<()>;
    fn go_back(&self) -> Result<()>;
    fn request_fullscreen(&self) -> Result<()>;
    fn exit_fullscreen(&self) -> Result<()>;
    fn is_fullscreen(&self) -> bool;
}

/// Everything a controller needs from its host, shared by both controllers
#[derive(Clone)]
pub struct HostServices {
    pub store: SessionStore,
    pub shell: Rc<dyn Shell>,
    pub catalog: Rc<dyn VideoCatalog>,
    pub clock: Rc<dyn Clock>,
    pub slot: PlaybackSlot,
    pub config: Rc<PlayerConfig>,
}

impl HostServices {
    pub fn new(
        config: PlayerConfig,
        storage: Rc<dyn Storage>,
        shell: Rc<dyn Shell>,
        catalog: Rc<dyn VideoCatalog>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let store = SessionStore::new(storage, config.persistence.clone());
        Self {
            store,
            shell,
            catalog,
            clock,
            slot: PlaybackSlot::new(),
            config: Rc::new(config),
        }
    }

    pub fn now(&self) -> u64 {
        self.clock.now_ms()
    }
}

impl std::fmt::Debug for HostServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostServices")
            .field("slot", &self.slot)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
