//! Shared types for Lumen

pub mod color;
pub mod events;
pub mod output;
pub mod stage;
pub mod step;
pub mod transition;

pub use color::{ColorParseError, Rgb};
pub use events::StoreEvent;
pub use output::FrameOutput;
pub use stage::Stage;
pub use step::{ConditionKind, StepAction, StepGate, TutorialStep};
pub use transition::{lerp, Transition, TransitionKind};
