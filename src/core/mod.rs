//! Core subsystems for Lumen

pub mod app;
pub mod collab;
pub mod engine;
pub mod render;
pub mod script;
pub mod sequencer;
pub mod store;

pub use app::{AppConfig, PresenceApp};
pub use engine::{breathing_factor, Particle, TransitionEngine, RESTING_COLOR};
pub use render::{RenderError, TermCanvas};
pub use script::TutorialScript;
pub use sequencer::{SequencerPhase, TutorialSequencer};
pub use store::SharedStore;
