//! Lumen: a single animated point of light that teaches you how to meet it
//!
//! Two subsystems cooperate through a shared publish/subscribe store:
//! the transition engine animates the light every frame, and the tutorial
//! sequencer walks a scripted onboarding gated by sensor conditions.

pub mod core;
pub mod types;

// =============================================================================
// SENSOR THRESHOLDS
// =============================================================================

/// Motion magnitude below this reads as stillness
pub const STILLNESS_THRESHOLD: f64 = 0.03;

/// Motion magnitude above this reads as deliberate movement
pub const MOVEMENT_THRESHOLD: f64 = 0.10;

/// A recorded tap satisfies the tap condition for this long (milliseconds)
pub const TAP_WINDOW_MS: u64 = 2000;

// =============================================================================
// TUTORIAL PACING
// =============================================================================

/// How long each introduction paragraph stays on screen (milliseconds)
pub const PARAGRAPH_DWELL_MS: u64 = 4000;

/// Pause between the cleared introduction and the first step (milliseconds)
pub const INTRO_SETTLE_MS: u64 = 2000;

/// How long a satisfied condition's acknowledgement is shown (milliseconds)
pub const CONDITION_MESSAGE_MS: u64 = 3000;

// =============================================================================
// ANIMATION DEFAULTS
// =============================================================================

/// Default color transition length (milliseconds)
pub const DEFAULT_COLOR_TRANSITION_MS: u64 = 1000;

/// Default size pulse length (milliseconds)
pub const DEFAULT_PULSE_MS: u64 = 500;

/// Default fade in/out length (milliseconds)
pub const DEFAULT_FADE_MS: u64 = 1000;

/// Resting indicator radius in canvas cells
pub const DEFAULT_BASE_SIZE: f64 = 3.0;

/// Default breathing rate (cycles per second, one breath every 4s)
pub const DEFAULT_BREATHING_RATE: f64 = 0.25;

/// Default breathing depth (fraction of base size)
pub const DEFAULT_BREATHING_DEPTH: f64 = 0.12;

// =============================================================================
// PARTICLES
// =============================================================================

/// Number of decorative drift particles
pub const PARTICLE_COUNT: usize = 24;

/// Fixed seed so a fresh session always opens on the same sky
pub const PARTICLE_SEED: u64 = 0x6c75_6d65_6e00_0001;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "0.1.0";
