//! Browser platform layer
//!
//! Everything that touches the DOM, WebXR or the clock lives here:
//! - `stage`: bindings to the three.js stage script
//! - `overlay`: DOM overlay elements (intro, AR button, keypad, end screen)
//! - `app`: startup, session lifecycle, frame loop and reward timers

mod app;
pub mod overlay;
pub mod stage;

pub use app::run;
pub use stage::{Stage, StageError};

use wasm_bindgen::{JsCast, JsValue};

use crate::sim::Clock;

/// `performance.now()` clock
#[derive(Debug, Clone)]
pub struct PerformanceClock {
    performance: Option<web_sys::Performance>,
}

impl PerformanceClock {
    pub fn new() -> Self {
        let performance = web_sys::window().and_then(|w| w.performance());
        if performance.is_none() {
            log::warn!("performance.now() unavailable, falling back to Date.now()");
        }
        Self { performance }
    }
}

impl Default for PerformanceClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for PerformanceClock {
    fn now_ms(&self) -> f64 {
        match &self.performance {
            Some(p) => p.now(),
            None => js_sys::Date::now(),
        }
    }
}

/// Human-readable text for a thrown JS value
pub(crate) fn describe(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
