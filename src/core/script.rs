//! The onboarding script: introduction text plus the ordered steps
//!
//! Pure data. The sequencer interprets it; nothing here executes.

use serde::{Deserialize, Serialize};

use crate::types::{ConditionKind, Rgb, StepAction, TutorialStep};
use crate::{DEFAULT_BREATHING_DEPTH, DEFAULT_BREATHING_RATE, DEFAULT_PULSE_MS};

/// Step colors
const SOFT_WHITE: Rgb = Rgb::new(0xe8, 0xe0, 0xd8);
const PALE_BLUE: Rgb = Rgb::new(0x7e, 0xc4, 0xcf);
const WARM_AMBER: Rgb = Rgb::new(0xe8, 0xa8, 0x7c);
const QUIET_ROSE: Rgb = Rgb::new(0xd9, 0x8c, 0x8c);
const GOLD: Rgb = Rgb::new(0xf0, 0xc9, 0x87);

/// Introduction shown paragraph by paragraph before the steps begin.
/// Paragraphs are separated by blank lines.
const INTRODUCTION: &str = "\
Hello. I am a single point of light.

I don't have a face, or a voice, or much of anything. \
What I have is presence, and I share it with you.

Let me show you the three ways we can meet.";

/// A complete tutorial script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorialScript {
    /// Introduction text; empty means skip straight to the steps
    pub intro: String,
    /// Ordered steps
    pub steps: Vec<TutorialStep>,
}

impl TutorialScript {
    /// Split the introduction into displayable paragraphs
    pub fn intro_paragraphs(&self) -> Vec<String> {
        self.intro
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The default onboarding: greeting, stillness, movement, touch, close
    pub fn onboarding() -> Self {
        let steps = vec![
            TutorialStep::dwell("I am here with you.", 4000, SOFT_WHITE).with_actions(vec![
                StepAction::StartBreathing {
                    rate: DEFAULT_BREATHING_RATE,
                    depth: DEFAULT_BREATHING_DEPTH,
                },
            ]),
            TutorialStep::on_condition(
                "Hold still for a moment, and I will feel it.",
                ConditionKind::Stillness,
                "I feel your stillness.",
                PALE_BLUE,
            )
            .with_haptic("gentle"),
            TutorialStep::on_condition(
                "Now move me, gently.",
                ConditionKind::Movement,
                "I feel you moving.",
                WARM_AMBER,
            ),
            TutorialStep::on_condition(
                "Touch me once.",
                ConditionKind::Tap,
                "I felt that.",
                QUIET_ROSE,
            )
            .with_haptic("tap_ack")
            .with_actions(vec![StepAction::PlaySound {
                sound: "chime".to_string(),
            }]),
            TutorialStep::dwell("We are ready to begin.", 5000, GOLD).with_actions(vec![
                StepAction::PulseSize {
                    size: 5.0,
                    duration_ms: DEFAULT_PULSE_MS,
                },
            ]),
        ];

        Self {
            intro: INTRODUCTION.to_string(),
            steps,
        }
    }

    /// Same steps, no introduction
    pub fn onboarding_without_intro() -> Self {
        Self {
            intro: String::new(),
            ..Self::onboarding()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StepGate;

    #[test]
    fn test_onboarding_has_three_paragraphs() {
        let script = TutorialScript::onboarding();
        assert_eq!(script.intro_paragraphs().len(), 3);
    }

    #[test]
    fn test_onboarding_teaches_all_three_conditions() {
        let script = TutorialScript::onboarding();
        let kinds: Vec<_> = script
            .steps
            .iter()
            .filter_map(|s| match &s.gate {
                StepGate::Condition { kind, .. } => Some(*kind),
                StepGate::Dwell { .. } => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                ConditionKind::Stillness,
                ConditionKind::Movement,
                ConditionKind::Tap
            ]
        );
    }

    #[test]
    fn test_onboarding_opens_and_closes_with_dwell() {
        let script = TutorialScript::onboarding();
        assert!(matches!(script.steps.first().unwrap().gate, StepGate::Dwell { .. }));
        assert!(matches!(script.steps.last().unwrap().gate, StepGate::Dwell { .. }));
    }

    #[test]
    fn test_empty_intro_has_no_paragraphs() {
        let script = TutorialScript::onboarding_without_intro();
        assert!(script.intro_paragraphs().is_empty());
    }

    #[test]
    fn test_script_json_round_trip() {
        let script = TutorialScript::onboarding();
        let json = serde_json::to_string(&script).unwrap();
        let back: TutorialScript = serde_json::from_str(&json).unwrap();
        assert_eq!(back, script);
    }
}
