//! External collaborator seams
//!
//! The sequencer drives these fire-and-forget: no completion is awaited
//! and no error comes back. Every collaborator is optional; an absent one
//! is skipped silently.

use std::cell::Cell;
use std::rc::Rc;

use colored::Colorize;

/// On-screen (or in-terminal) message line
pub trait MessageDisplay {
    /// Show `text`; `duration_ms == 0` means persist until replaced/hidden
    fn show_message(&mut self, text: &str, duration_ms: u64);
    /// Clear the message line
    fn hide_message(&mut self);
}

/// Haptic pattern playback
pub trait Haptics {
    fn play_pattern(&mut self, pattern: &str);
}

/// Sound playback
pub trait AudioSystem {
    fn play_sound(&mut self, sound: &str);
}

/// Ambient motion reading, non-negative magnitude
pub trait MotionSensor {
    fn motion_magnitude(&self) -> f64;
}

// =============================================================================
// TERMINAL / SIMULATED IMPLEMENTATIONS
// =============================================================================

/// Prints messages to stdout
#[derive(Debug, Default)]
pub struct TermDisplay;

impl MessageDisplay for TermDisplay {
    fn show_message(&mut self, text: &str, duration_ms: u64) {
        if duration_ms == 0 {
            println!("  {}", text.italic());
        } else {
            println!("  {} {}", text.italic(), format!("({}ms)", duration_ms).dimmed());
        }
    }

    fn hide_message(&mut self) {
        println!();
    }
}

/// Logs haptic patterns instead of buzzing
#[derive(Debug, Default)]
pub struct LogHaptics;

impl Haptics for LogHaptics {
    fn play_pattern(&mut self, pattern: &str) {
        println!("  {}", format!("~ haptic: {}", pattern).dimmed());
    }
}

/// Logs sounds instead of playing them
#[derive(Debug, Default)]
pub struct LogAudio;

impl AudioSystem for LogAudio {
    fn play_sound(&mut self, sound: &str) {
        println!("  {}", format!("~ sound: {}", sound).dimmed());
    }
}

/// Publishes the message line into the store (`display.message`), so a
/// frame-based driver can draw it wherever it likes
pub struct StoreDisplay {
    store: std::rc::Rc<crate::core::SharedStore>,
}

impl StoreDisplay {
    pub fn new(store: std::rc::Rc<crate::core::SharedStore>) -> Self {
        Self { store }
    }
}

impl MessageDisplay for StoreDisplay {
    fn show_message(&mut self, text: &str, _duration_ms: u64) {
        self.store.set("display.message", serde_json::json!(text));
    }

    fn hide_message(&mut self) {
        self.store.set("display.message", serde_json::json!(""));
    }
}

/// Motion sensor backed by a shared cell, settable from the driver loop
#[derive(Debug, Clone, Default)]
pub struct SimMotionSensor {
    magnitude: Rc<Cell<f64>>,
}

impl SimMotionSensor {
    pub fn new(initial: f64) -> Self {
        Self {
            magnitude: Rc::new(Cell::new(initial)),
        }
    }

    /// Handle the driver keeps to feed readings in
    pub fn handle(&self) -> Rc<Cell<f64>> {
        self.magnitude.clone()
    }
}

impl MotionSensor for SimMotionSensor {
    fn motion_magnitude(&self) -> f64 {
        self.magnitude.get().max(0.0)
    }
}
