//! One-time wiring and the per-tick driver surface
//!
//! `PresenceApp::init` builds the store, the engine, and the sequencer,
//! hooks up the store subscriptions, and validates the drawing surface.
//! A failed surface is reported through `render_error` and leaves the app
//! headless; everything else keeps running.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use crate::core::collab::{AudioSystem, Haptics, MessageDisplay, MotionSensor};
use crate::core::{
    RenderError, SharedStore, TermCanvas, TransitionEngine, TutorialScript, TutorialSequencer,
};
use crate::types::{FrameOutput, Stage};
use crate::DEFAULT_BASE_SIZE;

/// Everything `init` needs to know
pub struct AppConfig {
    pub width: u16,
    pub height: u16,
    pub base_size: f64,
    pub script: TutorialScript,
    /// Pre-built store, for callers that wire their own collaborators
    /// (for example a display publishing into `display.message`)
    pub store: Option<Rc<SharedStore>>,
    pub display: Option<Box<dyn MessageDisplay>>,
    pub haptics: Option<Box<dyn Haptics>>,
    pub audio: Option<Box<dyn AudioSystem>>,
    pub sensor: Option<Box<dyn MotionSensor>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 20,
            base_size: DEFAULT_BASE_SIZE,
            script: TutorialScript::onboarding(),
            store: None,
            display: None,
            haptics: None,
            audio: None,
            sensor: None,
        }
    }
}

/// The composed presence system
pub struct PresenceApp {
    store: Rc<SharedStore>,
    engine: Rc<RefCell<TransitionEngine>>,
    sequencer: Rc<RefCell<TutorialSequencer>>,
    canvas: Option<TermCanvas>,
    render_error: Option<RenderError>,
    now_ms: u64,
}

impl PresenceApp {
    /// Wire the whole system once. Never fails outright: a bad drawing
    /// surface is remembered in `render_error` and rendering is disabled.
    pub fn init(config: AppConfig) -> Self {
        let store = config.store.unwrap_or_else(|| Rc::new(SharedStore::new()));
        store.set("interaction.stage", json!(Stage::Dormant.as_str()));

        let engine = Rc::new(RefCell::new(TransitionEngine::new(
            store.clone(),
            config.width as f64,
            config.height as f64,
            config.base_size,
        )));

        let mut sequencer = TutorialSequencer::new(store.clone(), engine.clone(), config.script);
        if let Some(display) = config.display {
            sequencer = sequencer.with_display(display);
        }
        if let Some(haptics) = config.haptics {
            sequencer = sequencer.with_haptics(haptics);
        }
        if let Some(audio) = config.audio {
            sequencer = sequencer.with_audio(audio);
        }
        if let Some(sensor) = config.sensor {
            sequencer = sequencer.with_sensor(sensor);
        }
        let sequencer = Rc::new(RefCell::new(sequencer));
        TutorialSequencer::attach(&sequencer);

        let (canvas, render_error) = match TermCanvas::new(config.width, config.height) {
            Ok(canvas) => (Some(canvas), None),
            Err(e) => (None, Some(e)),
        };

        Self {
            store,
            engine,
            sequencer,
            canvas,
            render_error,
            now_ms: 0,
        }
    }

    /// Advance the whole system one tick. The engine updates before any
    /// frame is composed, and the sequencer is polled on every tick.
    pub fn tick(&mut self, delta_ms: u64) {
        self.now_ms += delta_ms;
        self.engine.borrow_mut().update(delta_ms as f64);
        self.sequencer.borrow_mut().update(self.now_ms);
    }

    /// Compose the current frame, if a drawing surface exists
    pub fn render(&self) -> Option<String> {
        let canvas = self.canvas.as_ref()?;
        let engine = self.engine.borrow();
        Some(canvas.frame(&self.store, engine.particles()))
    }

    /// The initialization failure of the drawing subsystem, if any
    pub fn render_error(&self) -> Option<&RenderError> {
        self.render_error.as_ref()
    }

    /// Move the interaction lifecycle; `awakening` starts the tutorial
    pub fn set_stage(&self, stage: Stage) {
        self.store.set("interaction.stage", json!(stage.as_str()));
    }

    /// Deliver a discrete tap at the current app clock
    pub fn tap(&self) {
        self.store.set("input.tap", json!(self.now_ms));
    }

    /// Current app clock (milliseconds)
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn store(&self) -> &Rc<SharedStore> {
        &self.store
    }

    pub fn engine(&self) -> &Rc<RefCell<TransitionEngine>> {
        &self.engine
    }

    pub fn sequencer(&self) -> &Rc<RefCell<TutorialSequencer>> {
        &self.sequencer
    }

    /// Observable snapshot of the current tick
    pub fn frame_output(&self) -> FrameOutput {
        let engine = self.engine.borrow();
        let seq = self.sequencer.borrow();
        let stage = self
            .store
            .get_str("interaction.stage")
            .and_then(|s| s.parse().ok())
            .unwrap_or(Stage::Dormant);
        FrameOutput::new(
            stage,
            engine.current_size(),
            engine.current_color(),
            engine.current_opacity(),
            engine.is_breathing(),
            seq.is_tutorial_active(),
            seq.is_tutorial_complete(),
            seq.current_step_index(),
        )
    }
}
