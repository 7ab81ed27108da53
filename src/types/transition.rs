//! Time-bounded linear interpolation records
//!
//! At most one transition of each kind is live at a time; installing a new
//! one discards the old immediately. A transition exists only until its
//! progress reaches 1.0.

use serde::{Deserialize, Serialize};

/// Which visual attribute a transition drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Color,
    Size,
    Opacity,
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransitionKind::Color => "color",
            TransitionKind::Size => "size",
            TransitionKind::Opacity => "opacity",
        };
        write!(f, "{}", name)
    }
}

/// One in-flight interpolation from a captured start value to a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition<T: Copy> {
    /// Engine clock when the transition was installed (milliseconds)
    pub start_ms: f64,
    /// Length of the transition (milliseconds)
    pub duration_ms: f64,
    /// Value captured at install time
    pub from: T,
    /// Value to settle on
    pub to: T,
}

impl<T: Copy> Transition<T> {
    /// Install a new transition starting now
    pub fn new(start_ms: f64, duration_ms: f64, from: T, to: T) -> Self {
        Self {
            start_ms,
            duration_ms,
            from,
            to,
        }
    }

    /// Progress in [0, 1] at the given engine clock.
    ///
    /// A non-positive duration is already complete.
    pub fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    /// Has the transition run its course?
    pub fn is_complete(&self, now_ms: f64) -> bool {
        self.progress(now_ms) >= 1.0
    }
}

/// Scalar linear interpolation
pub fn lerp(from: f64, to: f64, progress: f64) -> f64 {
    from + (to - from) * progress.clamp(0.0, 1.0)
}
