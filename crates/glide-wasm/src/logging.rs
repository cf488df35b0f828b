//! `tracing` output to the browser console

use std::cell::Cell;
use std::fmt::Write as _;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;
use wasm_bindgen::JsValue;

thread_local! {
    static MAX_LEVEL: Cell<Level> = const { Cell::new(Level::INFO) };
}

/// Forwards events to `console.debug/info/warn/error` by level
pub struct ConsoleLayer;

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level > MAX_LEVEL.with(Cell::get) {
            return;
        }
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        let line = JsValue::from_str(&format!(
            "[Glide] {} {}{}",
            event.metadata().target(),
            visitor.message,
            visitor.fields
        ));

        match level {
            Level::ERROR => web_sys::console::error_1(&line),
            Level::WARN => web_sys::console::warn_1(&line),
            Level::INFO => web_sys::console::info_1(&line),
            _ => web_sys::console::debug_1(&line),
        }
    }
}

/// Install the console subscriber once; later calls only change the level
pub fn install(max_level: Level) {
    MAX_LEVEL.with(|level| level.set(max_level));
    let _ = tracing_subscriber::registry().with(ConsoleLayer).try_init();
}
