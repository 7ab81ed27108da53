//! Tutorial script data
//!
//! Steps are pure, serializable data. Side effects are tagged commands
//! (`StepAction`) interpreted by the sequencer's executor, never closures,
//! so a script can be authored and inspected without running anything.

use serde::{Deserialize, Serialize};

use crate::types::Rgb;

/// Predicates a condition-gated step can wait on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    /// Motion magnitude below the stillness threshold
    Stillness,
    /// Motion magnitude above the movement threshold
    Movement,
    /// A discrete tap within the tap window (consumed on success)
    Tap,
}

impl std::fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConditionKind::Stillness => "stillness",
            ConditionKind::Movement => "movement",
            ConditionKind::Tap => "tap",
        };
        write!(f, "{}", name)
    }
}

/// Side-effecting command a step may run when it is shown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum StepAction {
    /// Transition the indicator color
    SetColor { color: Rgb, duration_ms: u64 },
    /// Enable the breathing oscillator
    StartBreathing { rate: f64, depth: f64 },
    /// Pulse the indicator to a target size
    PulseSize { size: f64, duration_ms: u64 },
    /// Fire a named haptic pattern (skipped when no haptics attached)
    PlayHaptic { pattern: String },
    /// Fire a named sound (skipped when no audio attached)
    PlaySound { sound: String },
}

/// How a step decides it is done.
///
/// Explicitly tagged: a step is either dwell-gated or condition-gated,
/// never ambiguously both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "gate")]
pub enum StepGate {
    /// Advance after a fixed dwell
    Dwell { duration_ms: u64 },
    /// Advance on the first poll where the predicate holds; the
    /// acknowledgement message is shown before advancing
    Condition {
        kind: ConditionKind,
        message: String,
    },
}

impl StepGate {
    /// Resolve authoring data that carries both a dwell duration and an
    /// optional condition. A condition always wins over the duration.
    pub fn resolve(duration_ms: u64, condition: Option<(ConditionKind, String)>) -> Self {
        match condition {
            Some((kind, message)) => StepGate::Condition { kind, message },
            None => StepGate::Dwell { duration_ms },
        }
    }
}

/// One unit of the tutorial script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorialStep {
    /// Text shown while the step is current (persists until replaced)
    pub message: String,
    /// Indicator color for this step
    pub pixel_color: Rgb,
    /// Optional haptic pattern fired when the step is shown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub haptic_pattern: Option<String>,
    /// Extra commands run when the step is shown
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<StepAction>,
    /// Advancement policy
    pub gate: StepGate,
}

impl TutorialStep {
    /// A step that advances after `duration_ms`
    pub fn dwell(message: impl Into<String>, duration_ms: u64, pixel_color: Rgb) -> Self {
        Self {
            message: message.into(),
            pixel_color,
            haptic_pattern: None,
            actions: Vec::new(),
            gate: StepGate::Dwell { duration_ms },
        }
    }

    /// A step that waits for a sensor condition
    pub fn on_condition(
        message: impl Into<String>,
        kind: ConditionKind,
        condition_message: impl Into<String>,
        pixel_color: Rgb,
    ) -> Self {
        Self {
            message: message.into(),
            pixel_color,
            haptic_pattern: None,
            actions: Vec::new(),
            gate: StepGate::Condition {
                kind,
                message: condition_message.into(),
            },
        }
    }

    /// Attach a haptic pattern
    pub fn with_haptic(mut self, pattern: impl Into<String>) -> Self {
        self.haptic_pattern = Some(pattern.into());
        self
    }

    /// Attach extra step actions
    pub fn with_actions(mut self, actions: Vec<StepAction>) -> Self {
        self.actions = actions;
        self
    }
}
