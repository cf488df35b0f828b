//! Glide Core - Playback continuity for embedded video
//!
//! This crate keeps one video playing while the user moves between a
//! full-screen watch page and a draggable floating window:
//! - Embedded player adapter with stale-event filtering
//! - Full-screen controller with related-content panel
//! - Floating (minimized) controller with drag, fling and corner snap
//! - Session hand-off through key-value storage
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Glide Core                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐   minimize    ┌──────────────┐                │
//! │  │  FullScreen  │ ────────────▶ │     Mini     │                │
//! │  │  Controller  │ ◀──────────── │  Controller  │                │
//! │  └──────┬───────┘    restore    └──────┬───────┘                │
//! │         │                              │                        │
//! │         │        ┌──────────────┐      │                        │
//! │         ├───────▶│ SessionStore │◀─────┤                        │
//! │         │        └──────────────┘      │                        │
//! │  ┌──────┴───────┐                ┌─────┴────────┐               │
//! │  │ MediaAdapter │                │ MediaAdapter │               │
//! │  └──────┬───────┘                └──────┬───────┘               │
//! │         └──────────┬────────────────────┘                       │
//! │             ┌──────┴──────┐   ┌──────────────┐                  │
//! │             │ PlaybackSlot│   │ RuntimeLoader│                  │
//! │             └─────────────┘   └──────────────┘                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is single-threaded. Controllers are driven by host events
//! and a periodic `tick`; timers are deadlines compared against an injected
//! [`Clock`](clock::Clock).

pub mod error;
pub mod types;
pub mod config;
pub mod media_id;
pub mod clock;
pub mod timer;
pub mod adapter;
pub mod persistence;
pub mod catalog;
pub mod shell;
pub mod controls;
pub mod panel;
pub mod physics;
pub mod drag;
pub mod fullscreen;
pub mod mini;
pub mod testing;

pub use error::{Error, Result};
pub use types::*;
pub use config::{DragConfig, PanelConfig, PersistenceConfig, PlaybackConfig, PlayerConfig};
pub use media_id::{extract_media_id, watch_url};
pub use clock::{Clock, ManualClock, SystemClock};
pub use adapter::{
    AdapterEvent, EmbedBackend, EmbedParams, LoaderPhase, MediaAdapter, PlaybackSlot, RuntimeHost, RuntimeLoader,
};
pub use persistence::{MemoryStorage, MiniPlayerPosition, PlayerSession, SessionStore, Storage};
pub use catalog::{Category, CategoryInfo, StaticCatalog, Video, VideoCatalog};
pub use shell::{HostServices, Shell};
pub use panel::{RelatedPanel, TouchOutcome};
pub use drag::{DragMachine, DragPhase, PointerKind};
pub use fullscreen::{FullScreenController, FullScreenView, InitTicket};
pub use mini::{MiniPlayerController, MiniPlayerView};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the player library with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "Glide Core initialized");
}
