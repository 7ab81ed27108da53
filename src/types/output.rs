//! Per-tick observable state, for terminal display and JSON streaming

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Rgb, Stage};

/// Snapshot of what an observer can see on one tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameOutput {
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Current interaction stage
    pub stage: Stage,
    /// Indicator radius (canvas cells)
    pub size: f64,
    /// Indicator color
    pub color: Rgb,
    /// Indicator opacity in [0, 1]
    pub opacity: f64,
    /// Is the breathing oscillator running?
    pub is_breathing: bool,
    /// Is the tutorial running?
    pub tutorial_active: bool,
    /// Has the tutorial finished?
    pub tutorial_complete: bool,
    /// Current step index while the tutorial is in its step phase
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
}

impl FrameOutput {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stage: Stage,
        size: f64,
        color: Rgb,
        opacity: f64,
        is_breathing: bool,
        tutorial_active: bool,
        tutorial_complete: bool,
        step: Option<usize>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            stage,
            size,
            color,
            opacity,
            is_breathing,
            tutorial_active,
            tutorial_complete,
            step,
        }
    }

    /// Format for terminal display (24-bit colored dot)
    pub fn to_terminal_string(&self) -> String {
        let dot = format!(
            "\x1b[38;2;{};{};{}m●\x1b[0m",
            self.color.r, self.color.g, self.color.b
        );
        let step = match self.step {
            Some(i) => format!(" | step={}", i),
            None => String::new(),
        };
        format!(
            "{} stage={} | size={:.2} | color={} | opacity={:.2}{}{}",
            dot,
            self.stage,
            self.size,
            self.color,
            self.opacity,
            step,
            if self.tutorial_complete {
                " | tutorial=done"
            } else if self.tutorial_active {
                " | tutorial=active"
            } else {
                ""
            },
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "stage={} | size={:.2} | color={} | opacity={:.2} | breathing={} | active={} | complete={}",
            self.stage,
            self.size,
            self.color,
            self.opacity,
            self.is_breathing,
            self.tutorial_active,
            self.tutorial_complete,
        )
    }
}
