//! Process-wide single-player guard

use crate::{Error, HandleId, Result};
use std::cell::Cell;
use std::rc::Rc;

/// Tracks the one embedded player allowed to be alive at a time.
///
/// Both controllers share a clone of the same slot. A hand-off must release the
/// outgoing handle before the incoming controller can acquire.
#[derive(Debug, Clone, Default)]
pub struct PlaybackSlot {
    active: Rc<Cell<Option<HandleId>>>,
}

impl PlaybackSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, handle: HandleId) -> Result<()> {
        match self.active.get() {
            Some(active) if active != handle => Err(Error::PlaybackSlotBusy { active }),
            _ => {
                self.active.set(Some(handle));
                Ok(())
            }
        }
    }

    /// Release if `handle` is the holder; a stale release is ignored
    pub fn release(&self, handle: HandleId) {
        if self.active.get() == Some(handle) {
            self.active.set(None);
        }
    }

    pub fn active(&self) -> Option<HandleId> {
        self.active.get()
    }

    pub fn is_free(&self) -> bool {
        self.active.get().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_refused() {
        let slot = PlaybackSlot::new();
        let first = HandleId::new();
        let second = HandleId::new();

        slot.acquire(first).unwrap();
        assert!(matches!(slot.acquire(second), Err(Error::PlaybackSlotBusy { active }) if active == first));

        slot.release(second);
        assert_eq!(slot.active(), Some(first));

        slot.release(first);
        assert!(slot.is_free());
        slot.acquire(second).unwrap();
    }

    #[test]
    fn test_clones_share_state() {
        let slot = PlaybackSlot::new();
        let other = slot.clone();
        slot.acquire(HandleId::new()).unwrap();
        assert!(!other.is_free());
    }
}
