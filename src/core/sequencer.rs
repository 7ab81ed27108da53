//! Tutorial Sequencer: walks the onboarding script
//!
//! Phases: Inactive → Introduction → Steps → Complete. The sequencer is
//! polled once per tick with the app clock (`update(now_ms)`); deferred
//! work is a single pending timer interpreted as a tagged action, so a
//! newly scheduled advance always replaces the old one and at most one
//! deferred callback can ever be live.
//!
//! Triggering is event-driven: a subscription on `interaction.stage`
//! begins the tutorial when the stage becomes `awakening`, and a
//! subscription on `input.tap` records discrete taps. Handlers go through
//! `Weak` + `try_borrow_mut`, so a stage write issued from inside the
//! sequencer re-enters as a harmless no-op.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde_json::json;

use crate::core::collab::{AudioSystem, Haptics, MessageDisplay, MotionSensor};
use crate::core::{SharedStore, TransitionEngine, TutorialScript};
use crate::types::{ConditionKind, Stage, StepAction, StepGate, TutorialStep};
use crate::{
    CONDITION_MESSAGE_MS, DEFAULT_COLOR_TRANSITION_MS, INTRO_SETTLE_MS, MOVEMENT_THRESHOLD,
    PARAGRAPH_DWELL_MS, STILLNESS_THRESHOLD, TAP_WINDOW_MS,
};

/// Where the sequencer is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerPhase {
    Inactive,
    Introduction,
    Steps,
    Complete,
}

/// What a fired timer does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerAction {
    /// Show introduction paragraph `i`, or end the introduction past the last
    ShowIntroParagraph(usize),
    /// Enter the step phase at index 0
    BeginSteps,
    /// Move to the next step
    AdvanceStep,
}

/// The single cancellable deferred callback
#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    due_ms: u64,
    action: TimerAction,
}

/// Step-sequenced tutorial state machine
pub struct TutorialSequencer {
    store: Rc<SharedStore>,
    engine: Rc<RefCell<TransitionEngine>>,
    script: TutorialScript,
    intro_paragraphs: Vec<String>,

    display: Option<Box<dyn MessageDisplay>>,
    haptics: Option<Box<dyn Haptics>>,
    audio: Option<Box<dyn AudioSystem>>,
    sensor: Option<Box<dyn MotionSensor>>,

    phase: SequencerPhase,
    active: bool,
    complete: bool,
    current_step: usize,
    pending: Option<PendingTimer>,
    last_tap_ms: Option<u64>,
    now_ms: u64,
}

impl TutorialSequencer {
    /// Create a sequencer over a script. Collaborators are attached with
    /// the `with_*` builders; every one of them is optional.
    pub fn new(
        store: Rc<SharedStore>,
        engine: Rc<RefCell<TransitionEngine>>,
        script: TutorialScript,
    ) -> Self {
        let intro_paragraphs = script.intro_paragraphs();
        Self {
            store,
            engine,
            script,
            intro_paragraphs,
            display: None,
            haptics: None,
            audio: None,
            sensor: None,
            phase: SequencerPhase::Inactive,
            active: false,
            complete: false,
            current_step: 0,
            pending: None,
            last_tap_ms: None,
            now_ms: 0,
        }
    }

    pub fn with_display(mut self, display: Box<dyn MessageDisplay>) -> Self {
        self.display = Some(display);
        self
    }

    pub fn with_haptics(mut self, haptics: Box<dyn Haptics>) -> Self {
        self.haptics = Some(haptics);
        self
    }

    pub fn with_audio(mut self, audio: Box<dyn AudioSystem>) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn with_sensor(mut self, sensor: Box<dyn MotionSensor>) -> Self {
        self.sensor = Some(sensor);
        self
    }

    /// One-time wiring of the store subscriptions (stage trigger, taps)
    pub fn attach(seq: &Rc<RefCell<TutorialSequencer>>) {
        let store = seq.borrow().store.clone();

        let weak: Weak<RefCell<TutorialSequencer>> = Rc::downgrade(seq);
        store.on("interaction.stage", move |ev| {
            if ev.new_value.as_str() != Some(Stage::Awakening.as_str()) {
                return;
            }
            if let Some(seq) = weak.upgrade() {
                // A failed borrow means the write came from inside the
                // sequencer itself; the begin guard would reject it anyway
                if let Ok(mut seq) = seq.try_borrow_mut() {
                    seq.begin();
                }
            }
        });

        let weak: Weak<RefCell<TutorialSequencer>> = Rc::downgrade(seq);
        store.on("input.tap", move |ev| {
            if let Some(seq) = weak.upgrade() {
                if let Ok(mut seq) = seq.try_borrow_mut() {
                    if let Some(ts) = ev.new_value.as_u64() {
                        seq.record_tap(ts);
                    }
                }
            }
        });
    }

    /// Start the tutorial. Ignored while already active or after
    /// completion.
    pub fn begin(&mut self) {
        if self.active || self.complete {
            return;
        }
        self.active = true;
        if self.intro_paragraphs.is_empty() {
            self.fire(TimerAction::BeginSteps);
        } else {
            self.phase = SequencerPhase::Introduction;
            self.fire(TimerAction::ShowIntroParagraph(0));
        }
    }

    /// Per-tick poll: fires the due timer, then evaluates the current
    /// condition gate (at most one satisfaction per physical signal).
    pub fn update(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        if !self.active {
            return;
        }

        if let Some(pending) = self.pending {
            if now_ms >= pending.due_ms {
                self.pending = None;
                self.fire(pending.action);
            }
        }

        // Condition polling only while nothing is already scheduled, so a
        // satisfied condition schedules exactly one advance
        if self.active && self.phase == SequencerPhase::Steps && self.pending.is_none() {
            self.poll_condition();
        }
    }

    /// Force completion, bypassing the remaining steps. No deferred
    /// callback fires afterwards.
    pub fn skip_tutorial(&mut self) {
        if self.complete {
            return;
        }
        self.finish();
    }

    /// Record a discrete tap (store-delivered). The record is consumed by
    /// the first successful tap-condition check.
    pub fn record_tap(&mut self, timestamp_ms: u64) {
        self.last_tap_ms = Some(timestamp_ms);
    }

    pub fn is_tutorial_active(&self) -> bool {
        self.active
    }

    pub fn is_tutorial_complete(&self) -> bool {
        self.complete
    }

    pub fn phase(&self) -> SequencerPhase {
        self.phase
    }

    /// Index of the current step while in the step phase
    pub fn current_step_index(&self) -> Option<usize> {
        if self.phase == SequencerPhase::Steps && self.current_step < self.script.steps.len() {
            Some(self.current_step)
        } else {
            None
        }
    }

    /// The current step's script data
    pub fn current_step(&self) -> Option<&TutorialStep> {
        self.current_step_index()
            .and_then(|i| self.script.steps.get(i))
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    /// Schedule the single deferred action, superseding any previous one
    fn schedule(&mut self, due_ms: u64, action: TimerAction) {
        self.pending = Some(PendingTimer { due_ms, action });
    }

    fn fire(&mut self, action: TimerAction) {
        match action {
            TimerAction::ShowIntroParagraph(i) => {
                if let Some(paragraph) = self.intro_paragraphs.get(i).cloned() {
                    if let Some(d) = &mut self.display {
                        d.show_message(&paragraph, PARAGRAPH_DWELL_MS);
                    }
                    self.schedule(
                        self.now_ms + PARAGRAPH_DWELL_MS,
                        TimerAction::ShowIntroParagraph(i + 1),
                    );
                } else {
                    // Past the last paragraph: clear, settle, then steps
                    if let Some(d) = &mut self.display {
                        d.hide_message();
                    }
                    self.schedule(self.now_ms + INTRO_SETTLE_MS, TimerAction::BeginSteps);
                }
            }
            TimerAction::BeginSteps => {
                self.phase = SequencerPhase::Steps;
                self.current_step = 0;
                self.start_step();
            }
            TimerAction::AdvanceStep => {
                self.current_step += 1;
                self.start_step();
            }
        }
    }

    /// Show the current step and arm its gate. Cancels any previously
    /// scheduled advance first to rule out double-advancement.
    fn start_step(&mut self) {
        self.pending = None;

        let step = match self.script.steps.get(self.current_step).cloned() {
            Some(step) => step,
            None => {
                self.finish();
                return;
            }
        };

        if let Some(d) = &mut self.display {
            d.show_message(&step.message, 0);
        }
        self.engine
            .borrow_mut()
            .transition_color(step.pixel_color, DEFAULT_COLOR_TRANSITION_MS);
        if let Some(pattern) = &step.haptic_pattern {
            if let Some(h) = &mut self.haptics {
                h.play_pattern(pattern);
            }
        }
        for action in &step.actions {
            self.run_action(action);
        }

        match step.gate {
            StepGate::Dwell { duration_ms } => {
                self.schedule(self.now_ms + duration_ms, TimerAction::AdvanceStep);
            }
            StepGate::Condition { .. } => {
                // Armed; advancement happens from condition polling
            }
        }
    }

    /// Interpret one tagged step command
    fn run_action(&mut self, action: &StepAction) {
        match action {
            StepAction::SetColor { color, duration_ms } => {
                self.engine.borrow_mut().transition_color(*color, *duration_ms);
            }
            StepAction::StartBreathing { rate, depth } => {
                self.engine.borrow_mut().start_breathing(*rate, *depth);
            }
            StepAction::PulseSize { size, duration_ms } => {
                self.engine.borrow_mut().pulse_size(*size, *duration_ms);
            }
            StepAction::PlayHaptic { pattern } => {
                if let Some(h) = &mut self.haptics {
                    h.play_pattern(pattern);
                }
            }
            StepAction::PlaySound { sound } => {
                if let Some(a) = &mut self.audio {
                    a.play_sound(sound);
                }
            }
        }
    }

    /// Evaluate the current step's condition gate once
    fn poll_condition(&mut self) {
        let gate = match self.script.steps.get(self.current_step) {
            Some(step) => step.gate.clone(),
            None => return,
        };
        let (kind, message) = match gate {
            StepGate::Condition { kind, message } => (kind, message),
            StepGate::Dwell { .. } => return,
        };

        if self.condition_met(kind) {
            if let Some(d) = &mut self.display {
                d.show_message(&message, CONDITION_MESSAGE_MS);
            }
            self.schedule(self.now_ms + CONDITION_MESSAGE_MS, TimerAction::AdvanceStep);
        }
    }

    /// Named condition predicates. Tap consumes its record on success.
    fn condition_met(&mut self, kind: ConditionKind) -> bool {
        match kind {
            ConditionKind::Stillness => self
                .sensor
                .as_ref()
                .map_or(false, |s| s.motion_magnitude() < STILLNESS_THRESHOLD),
            ConditionKind::Movement => self
                .sensor
                .as_ref()
                .map_or(false, |s| s.motion_magnitude() > MOVEMENT_THRESHOLD),
            ConditionKind::Tap => match self.last_tap_ms {
                Some(ts) if self.now_ms.saturating_sub(ts) <= TAP_WINDOW_MS => {
                    self.last_tap_ms = None;
                    true
                }
                _ => false,
            },
        }
    }

    /// Deactivate, mark complete, push the post-tutorial stage if the
    /// store is not already there. Idempotent.
    fn finish(&mut self) {
        if self.complete {
            return;
        }
        self.pending = None;
        self.active = false;
        self.complete = true;
        self.phase = SequencerPhase::Complete;
        if let Some(d) = &mut self.display {
            d.hide_message();
        }
        if self.store.get_str("interaction.stage").as_deref() != Some(Stage::Attuned.as_str()) {
            self.store
                .set("interaction.stage", json!(Stage::Attuned.as_str()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collab::SimMotionSensor;
    use crate::types::Rgb;
    use pretty_assertions::assert_eq;

    const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);

    struct RecordingDisplay {
        log: Rc<RefCell<Vec<(String, u64)>>>,
    }

    impl MessageDisplay for RecordingDisplay {
        fn show_message(&mut self, text: &str, duration_ms: u64) {
            self.log.borrow_mut().push((text.to_string(), duration_ms));
        }
        fn hide_message(&mut self) {
            self.log.borrow_mut().push(("<hidden>".to_string(), 0));
        }
    }

    fn harness(script: TutorialScript) -> (Rc<SharedStore>, TutorialSequencer) {
        let store = Rc::new(SharedStore::new());
        let engine = Rc::new(RefCell::new(TransitionEngine::new(
            store.clone(),
            64.0,
            24.0,
            3.0,
        )));
        let seq = TutorialSequencer::new(store.clone(), engine, script);
        (store, seq)
    }

    fn two_dwell_script() -> TutorialScript {
        TutorialScript {
            intro: String::new(),
            steps: vec![
                TutorialStep::dwell("one", 1000, WHITE),
                TutorialStep::dwell("two", 500, WHITE),
            ],
        }
    }

    #[test]
    fn test_initially_inactive() {
        let (_, seq) = harness(two_dwell_script());
        assert_eq!(seq.phase(), SequencerPhase::Inactive);
        assert!(!seq.is_tutorial_active());
        assert!(!seq.is_tutorial_complete());
    }

    #[test]
    fn test_begin_twice_is_guarded() {
        let (_, mut seq) = harness(two_dwell_script());
        seq.begin();
        let step_before = seq.current_step_index();
        seq.begin();
        assert_eq!(seq.current_step_index(), step_before);
        assert!(seq.is_tutorial_active());
    }

    #[test]
    fn test_dwell_steps_advance_on_schedule() {
        let (_, mut seq) = harness(two_dwell_script());
        seq.begin();
        assert_eq!(seq.current_step_index(), Some(0));

        seq.update(999);
        assert_eq!(seq.current_step_index(), Some(0));
        seq.update(1000);
        assert_eq!(seq.current_step_index(), Some(1));
        seq.update(1500);
        assert!(seq.is_tutorial_complete());
        assert!(!seq.is_tutorial_active());
    }

    #[test]
    fn test_completion_pushes_attuned_stage() {
        let (store, mut seq) = harness(two_dwell_script());
        seq.begin();
        seq.update(1000);
        seq.update(1500);
        assert_eq!(store.get_str("interaction.stage").as_deref(), Some("attuned"));
    }

    #[test]
    fn test_completion_does_not_rewrite_attuned_stage() {
        let (store, mut seq) = harness(two_dwell_script());
        store.set("interaction.stage", json!("attuned"));

        let writes = Rc::new(RefCell::new(0u32));
        let w = writes.clone();
        store.on("interaction.stage", move |_| *w.borrow_mut() += 1);

        seq.begin();
        seq.update(1000);
        seq.update(1500);
        assert!(seq.is_tutorial_complete());
        assert_eq!(*writes.borrow(), 0, "stage already attuned, no rewrite");
    }

    #[test]
    fn test_condition_step_waits_for_sensor() {
        let sensor = SimMotionSensor::new(0.0);
        let magnitude = sensor.handle();
        let script = TutorialScript {
            intro: String::new(),
            steps: vec![TutorialStep::on_condition(
                "move",
                ConditionKind::Movement,
                "felt",
                WHITE,
            )],
        };
        let (_, seq) = harness(script);
        let mut seq = seq.with_sensor(Box::new(sensor));

        seq.begin();
        for t in (16..2000).step_by(16) {
            seq.update(t);
        }
        assert_eq!(seq.current_step_index(), Some(0), "no motion, no advance");

        magnitude.set(0.5);
        seq.update(2000);
        // Acknowledgement dwell, then advance
        seq.update(2000 + CONDITION_MESSAGE_MS);
        assert!(seq.is_tutorial_complete());
    }

    #[test]
    fn test_stillness_threshold_is_strict() {
        let sensor = SimMotionSensor::new(STILLNESS_THRESHOLD);
        let magnitude = sensor.handle();
        let script = TutorialScript {
            intro: String::new(),
            steps: vec![TutorialStep::on_condition(
                "still",
                ConditionKind::Stillness,
                "felt",
                WHITE,
            )],
        };
        let (_, seq) = harness(script);
        let mut seq = seq.with_sensor(Box::new(sensor));

        seq.begin();
        seq.update(16);
        assert_eq!(seq.current_step_index(), Some(0), "0.03 is not below 0.03");

        magnitude.set(0.0);
        seq.update(32);
        assert!(seq.pending.is_some(), "stillness observed, advance armed");
    }

    #[test]
    fn test_condition_without_sensor_never_fires() {
        let script = TutorialScript {
            intro: String::new(),
            steps: vec![TutorialStep::on_condition(
                "still",
                ConditionKind::Stillness,
                "felt",
                WHITE,
            )],
        };
        let (_, mut seq) = harness(script);
        seq.begin();
        for t in (16..5000).step_by(16) {
            seq.update(t);
        }
        assert!(!seq.is_tutorial_complete());
        assert_eq!(seq.current_step_index(), Some(0));
    }

    #[test]
    fn test_tap_consumed_once() {
        let (_, mut seq) = harness(two_dwell_script());
        seq.now_ms = 1000;
        seq.record_tap(900);

        assert!(seq.condition_met(ConditionKind::Tap));
        assert!(
            !seq.condition_met(ConditionKind::Tap),
            "second check without a new tap must fail"
        );
    }

    #[test]
    fn test_tap_expires_outside_window() {
        let (_, mut seq) = harness(two_dwell_script());
        seq.record_tap(0);
        seq.now_ms = TAP_WINDOW_MS + 1;
        assert!(!seq.condition_met(ConditionKind::Tap));
        seq.record_tap(seq.now_ms);
        assert!(seq.condition_met(ConditionKind::Tap));
    }

    #[test]
    fn test_skip_forces_completion_and_silences_timers() {
        let (_, mut seq) = harness(two_dwell_script());
        seq.begin();
        seq.update(16);
        assert!(seq.pending.is_some());

        seq.skip_tutorial();
        assert!(seq.is_tutorial_complete());
        assert!(!seq.is_tutorial_active());
        assert!(seq.pending.is_none());

        // Long past the old due time: nothing fires
        seq.update(60_000);
        assert_eq!(seq.phase(), SequencerPhase::Complete);
    }

    #[test]
    fn test_skip_after_complete_is_noop() {
        let (_, mut seq) = harness(two_dwell_script());
        seq.begin();
        seq.skip_tutorial();
        seq.skip_tutorial();
        assert!(seq.is_tutorial_complete());
    }

    #[test]
    fn test_introduction_chains_paragraphs() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let script = TutorialScript {
            intro: "First.\n\nSecond.".to_string(),
            steps: vec![TutorialStep::dwell("step", 1000, WHITE)],
        };
        let (_, seq) = harness(script);
        let mut seq = seq.with_display(Box::new(RecordingDisplay { log: log.clone() }));

        seq.begin();
        assert_eq!(seq.phase(), SequencerPhase::Introduction);
        assert_eq!(log.borrow().last().unwrap().0, "First.");

        seq.update(PARAGRAPH_DWELL_MS);
        assert_eq!(log.borrow().last().unwrap().0, "Second.");

        seq.update(2 * PARAGRAPH_DWELL_MS);
        assert_eq!(log.borrow().last().unwrap().0, "<hidden>");
        assert_eq!(seq.phase(), SequencerPhase::Introduction);

        seq.update(2 * PARAGRAPH_DWELL_MS + INTRO_SETTLE_MS);
        assert_eq!(seq.phase(), SequencerPhase::Steps);
        assert_eq!(log.borrow().last().unwrap().0, "step");
    }

    #[test]
    fn test_step_haptic_skipped_without_collaborator() {
        // A haptic-bearing step with no haptics attached must not panic
        let script = TutorialScript {
            intro: String::new(),
            steps: vec![TutorialStep::dwell("buzz", 100, WHITE).with_haptic("gentle")],
        };
        let (_, mut seq) = harness(script);
        seq.begin();
        seq.update(100);
        assert!(seq.is_tutorial_complete());
    }

    #[test]
    fn test_step_actions_drive_engine_and_collaborators() {
        struct RecordingHaptics(Rc<RefCell<Vec<String>>>);
        impl Haptics for RecordingHaptics {
            fn play_pattern(&mut self, pattern: &str) {
                self.0.borrow_mut().push(pattern.to_string());
            }
        }
        struct RecordingAudio(Rc<RefCell<Vec<String>>>);
        impl AudioSystem for RecordingAudio {
            fn play_sound(&mut self, sound: &str) {
                self.0.borrow_mut().push(sound.to_string());
            }
        }

        let buzzes = Rc::new(RefCell::new(Vec::new()));
        let sounds = Rc::new(RefCell::new(Vec::new()));
        let script = TutorialScript {
            intro: String::new(),
            steps: vec![TutorialStep::dwell("all", 100, WHITE).with_actions(vec![
                StepAction::SetColor {
                    color: Rgb::new(1, 2, 3),
                    duration_ms: 100,
                },
                StepAction::StartBreathing {
                    rate: 0.5,
                    depth: 0.2,
                },
                StepAction::PulseSize {
                    size: 6.0,
                    duration_ms: 100,
                },
                StepAction::PlayHaptic {
                    pattern: "gentle".to_string(),
                },
                StepAction::PlaySound {
                    sound: "chime".to_string(),
                },
            ])],
        };

        let store = Rc::new(SharedStore::new());
        let engine = Rc::new(RefCell::new(TransitionEngine::new(
            store.clone(),
            64.0,
            24.0,
            3.0,
        )));
        let mut seq = TutorialSequencer::new(store, engine.clone(), script)
            .with_haptics(Box::new(RecordingHaptics(buzzes.clone())))
            .with_audio(Box::new(RecordingAudio(sounds.clone())));

        seq.begin();
        {
            let engine = engine.borrow();
            assert!(engine.is_breathing());
            assert!(engine.has_transition(crate::types::TransitionKind::Size));
        }
        engine.borrow_mut().update(100.0);
        assert_eq!(engine.borrow().current_color(), Rgb::new(1, 2, 3));
        assert_eq!(engine.borrow().current_size(), 6.0);
        assert_eq!(&*buzzes.borrow(), &["gentle".to_string()]);
        assert_eq!(&*sounds.borrow(), &["chime".to_string()]);
    }

    #[test]
    fn test_empty_script_completes_immediately() {
        let script = TutorialScript {
            intro: String::new(),
            steps: vec![],
        };
        let (_, mut seq) = harness(script);
        seq.begin();
        assert!(seq.is_tutorial_complete());
    }
}
