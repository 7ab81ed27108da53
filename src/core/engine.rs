//! Transition Engine: breathing, color/size/opacity transitions, particles
//!
//! The engine owns a virtual clock advanced by `update(delta_ms)` and
//! publishes everything observable into the shared store (`pixel.*`).
//! The drawing layer never talks to the engine directly; it reads the
//! store and the decorative particle positions.
//!
//! Invariant: `pixel.size` has exactly one writer per tick. The breathing
//! oscillator writes it on every tick it is enabled, unless a `pulse_size`
//! transition is in flight, which overrides breathing until it completes.

use std::f64::consts::TAU;
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::json;

use crate::core::SharedStore;
use crate::types::{lerp, Rgb, Transition, TransitionKind};
use crate::{
    DEFAULT_COLOR_TRANSITION_MS, DEFAULT_FADE_MS, DEFAULT_PULSE_MS, PARTICLE_COUNT, PARTICLE_SEED,
};

/// Indicator color before anything has been asked of it
pub const RESTING_COLOR: Rgb = Rgb::new(0xe8, 0xe0, 0xd8);

/// Breathing size factor at a given phase in [0, 1)
pub fn breathing_factor(phase: f64, depth: f64) -> f64 {
    (phase * TAU).sin() * depth + 1.0
}

/// Decorative drift particle, wrapped at the viewport edges
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    /// Cells per second
    pub vx: f64,
    pub vy: f64,
    pub opacity: f64,
}

/// Continuous animation engine for the presence indicator
pub struct TransitionEngine {
    store: Rc<SharedStore>,

    /// Accumulated virtual time (milliseconds)
    clock_ms: f64,

    base_size: f64,
    current_size: f64,
    current_color: Rgb,
    current_opacity: f64,

    breathing: bool,
    breathing_rate: f64,
    breathing_depth: f64,
    breathing_phase: f64,

    color_transition: Option<Transition<Rgb>>,
    size_transition: Option<Transition<f64>>,
    opacity_transition: Option<Transition<f64>>,

    viewport_width: f64,
    viewport_height: f64,
    particles: Vec<Particle>,
    rng: ChaCha8Rng,
}

impl TransitionEngine {
    /// Create an engine publishing into `store`, with a particle viewport
    /// of `width` x `height` cells
    pub fn new(store: Rc<SharedStore>, width: f64, height: f64, base_size: f64) -> Self {
        let mut engine = Self {
            store,
            clock_ms: 0.0,
            base_size,
            current_size: base_size,
            current_color: RESTING_COLOR,
            current_opacity: 1.0,
            breathing: false,
            breathing_rate: 0.0,
            breathing_depth: 0.0,
            breathing_phase: 0.0,
            color_transition: None,
            size_transition: None,
            opacity_transition: None,
            viewport_width: width.max(1.0),
            viewport_height: height.max(1.0),
            particles: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(PARTICLE_SEED),
        };
        engine.seed_particles();
        engine.publish_all();
        engine
    }

    /// Advance all animation state by `delta_ms` and publish the results
    pub fn update(&mut self, delta_ms: f64) {
        self.clock_ms += delta_ms;

        // Breathing first: it yields the size slot to an active pulse,
        // including on the tick the pulse completes
        if self.breathing {
            self.breathing_phase =
                (self.breathing_phase + delta_ms / 1000.0 * self.breathing_rate).fract();
            if self.size_transition.is_none() {
                self.current_size =
                    self.base_size * breathing_factor(self.breathing_phase, self.breathing_depth);
                self.store.set("pixel.size", json!(self.current_size));
            }
        }

        if let Some(t) = self.size_transition {
            let p = t.progress(self.clock_ms);
            self.current_size = lerp(t.from, t.to, p);
            self.store.set("pixel.size", json!(self.current_size));
            if p >= 1.0 {
                self.size_transition = None;
            }
        }

        if let Some(t) = self.color_transition {
            let p = t.progress(self.clock_ms);
            self.current_color = t.from.lerp(t.to, p);
            self.store
                .set("pixel.color", json!(self.current_color.to_hex()));
            if p >= 1.0 {
                self.color_transition = None;
            }
        }

        if let Some(t) = self.opacity_transition {
            let p = t.progress(self.clock_ms);
            self.current_opacity = lerp(t.from, t.to, p);
            self.store.set("pixel.opacity", json!(self.current_opacity));
            if p >= 1.0 {
                self.opacity_transition = None;
            }
        }

        let dt = delta_ms / 1000.0;
        let (w, h) = (self.viewport_width, self.viewport_height);
        for particle in &mut self.particles {
            particle.x = (particle.x + particle.vx * dt).rem_euclid(w);
            particle.y = (particle.y + particle.vy * dt).rem_euclid(h);
        }
    }

    /// Enable the breathing oscillator. Resets the phase and persists
    /// rate/depth so other observers can read them.
    pub fn start_breathing(&mut self, rate: f64, depth: f64) {
        self.breathing = true;
        self.breathing_rate = rate;
        self.breathing_depth = depth.clamp(0.0, 0.999);
        self.breathing_phase = 0.0;
        self.store.set("pixel.is_breathing", json!(true));
        self.store.set("pixel.breathing_rate", json!(rate));
        self.store
            .set("pixel.breathing_depth", json!(self.breathing_depth));
    }

    /// Disable the oscillator; a no-op when already stopped
    pub fn stop_breathing(&mut self) {
        if !self.breathing {
            return;
        }
        self.breathing = false;
        self.store.set("pixel.is_breathing", json!(false));
    }

    /// Interpolate the color toward `target`, superseding any color
    /// transition in flight
    pub fn transition_color(&mut self, target: Rgb, duration_ms: u64) {
        self.color_transition = Some(Transition::new(
            self.clock_ms,
            duration_ms as f64,
            self.current_color,
            target,
        ));
    }

    /// Pulse the indicator to an absolute size, overriding breathing
    /// until the pulse completes
    pub fn pulse_size(&mut self, target_size: f64, duration_ms: u64) {
        self.size_transition = Some(Transition::new(
            self.clock_ms,
            duration_ms as f64,
            self.current_size,
            target_size,
        ));
    }

    /// Fade opacity to 1.0
    pub fn fade_in(&mut self, duration_ms: u64) {
        self.opacity_transition = Some(Transition::new(
            self.clock_ms,
            duration_ms as f64,
            self.current_opacity,
            1.0,
        ));
    }

    /// Fade opacity to 0.0
    pub fn fade_out(&mut self, duration_ms: u64) {
        self.opacity_transition = Some(Transition::new(
            self.clock_ms,
            duration_ms as f64,
            self.current_opacity,
            0.0,
        ));
    }

    /// Change the particle viewport and re-seed the particles
    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport_width = width.max(1.0);
        self.viewport_height = height.max(1.0);
        self.seed_particles();
    }

    /// Current particle positions for the drawing layer
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn base_size(&self) -> f64 {
        self.base_size
    }

    pub fn current_size(&self) -> f64 {
        self.current_size
    }

    pub fn current_color(&self) -> Rgb {
        self.current_color
    }

    pub fn current_opacity(&self) -> f64 {
        self.current_opacity
    }

    pub fn is_breathing(&self) -> bool {
        self.breathing
    }

    /// Is a transition of the given kind in flight?
    pub fn has_transition(&self, kind: TransitionKind) -> bool {
        match kind {
            TransitionKind::Color => self.color_transition.is_some(),
            TransitionKind::Size => self.size_transition.is_some(),
            TransitionKind::Opacity => self.opacity_transition.is_some(),
        }
    }

    fn seed_particles(&mut self) {
        let (w, h) = (self.viewport_width, self.viewport_height);
        self.particles = (0..PARTICLE_COUNT)
            .map(|_| Particle {
                x: self.rng.gen_range(0.0..w),
                y: self.rng.gen_range(0.0..h),
                size: self.rng.gen_range(0.4..1.2),
                vx: self.rng.gen_range(-1.5..1.5),
                vy: self.rng.gen_range(-1.5..1.5),
                opacity: self.rng.gen_range(0.15..0.6),
            })
            .collect();
    }

    fn publish_all(&self) {
        self.store.set("pixel.size", json!(self.current_size));
        self.store
            .set("pixel.color", json!(self.current_color.to_hex()));
        self.store.set("pixel.opacity", json!(self.current_opacity));
        self.store.set("pixel.is_breathing", json!(self.breathing));
    }
}

/// Convenience constructors used by the CLI and tests
impl TransitionEngine {
    pub fn transition_color_default(&mut self, target: Rgb) {
        self.transition_color(target, DEFAULT_COLOR_TRANSITION_MS);
    }

    pub fn pulse_size_default(&mut self, target_size: f64) {
        self.pulse_size(target_size, DEFAULT_PULSE_MS);
    }

    pub fn fade_in_default(&mut self) {
        self.fade_in(DEFAULT_FADE_MS);
    }

    pub fn fade_out_default(&mut self) {
        self.fade_out(DEFAULT_FADE_MS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn engine() -> TransitionEngine {
        TransitionEngine::new(Rc::new(SharedStore::new()), 64.0, 24.0, 3.0)
    }

    #[test]
    fn test_breathing_factor_periodic_and_bounded() {
        let depth = 0.3;
        for i in 0..100 {
            let phase = i as f64 / 100.0;
            let f = breathing_factor(phase, depth);
            assert!(f >= 1.0 - depth - 1e-12 && f <= 1.0 + depth + 1e-12);
            assert!((f - breathing_factor(phase + 1.0, depth)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_breathing_writes_size_every_tick() {
        let mut e = engine();
        e.start_breathing(0.25, 0.2);
        e.update(500.0); // 500ms at 0.25 cycles/s: phase = 0.125
        let expected = 3.0 * breathing_factor(0.125, 0.2);
        assert!((e.current_size() - expected).abs() < 1e-9);
        assert!(
            (e.store.get_f64("pixel.size").unwrap() - expected).abs() < 1e-9,
            "size must be published"
        );
    }

    #[test]
    fn test_breathing_phase_wraps() {
        let mut e = engine();
        e.start_breathing(1.0, 0.1); // one cycle per second
        e.update(2500.0);
        // phase = 2.5.fract() = 0.5
        let expected = 3.0 * breathing_factor(0.5, 0.1);
        assert!((e.current_size() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_stop_breathing_twice_is_noop() {
        let mut e = engine();
        e.start_breathing(0.25, 0.1);
        e.stop_breathing();
        e.stop_breathing();
        assert!(!e.is_breathing());
    }

    #[test]
    fn test_color_transition_endpoints() {
        let mut e = engine();
        let start = e.current_color();
        let target = Rgb::parse("#102030").unwrap();
        e.transition_color(target, 1000);

        e.update(0.0);
        assert_eq!(e.current_color(), start);

        e.update(1000.0);
        assert_eq!(e.current_color(), target);
        assert!(!e.has_transition(TransitionKind::Color));
        assert_eq!(
            e.store.get_str("pixel.color").as_deref(),
            Some("#102030")
        );
    }

    #[test]
    fn test_second_color_transition_discards_first() {
        let mut e = engine();
        let first = Rgb::parse("#ff0000").unwrap();
        let second = Rgb::parse("#0000ff").unwrap();

        e.transition_color(first, 1000);
        e.update(500.0);
        e.transition_color(second, 1000);
        e.update(2000.0);

        // The discarded transition's target never settles
        assert_eq!(e.current_color(), second);
        assert!(!e.has_transition(TransitionKind::Color));
    }

    #[test]
    fn test_pulse_overrides_breathing_for_size() {
        let mut e = engine();
        e.start_breathing(0.25, 0.5);
        e.pulse_size(10.0, 1000);

        let start = e.current_size();
        e.update(500.0);
        let expected = lerp(start, 10.0, 0.5);
        assert!(
            (e.current_size() - expected).abs() < 1e-9,
            "pulse, not breathing, must drive pixel.size"
        );
        assert!(
            (e.store.get_f64("pixel.size").unwrap() - expected).abs() < 1e-9
        );

        // Pulse completes, breathing takes the size slot back
        e.update(500.0);
        assert!(!e.has_transition(TransitionKind::Size));
        e.update(100.0);
        let phase: f64 = 1100.0 / 1000.0 * 0.25;
        let back = 3.0 * breathing_factor(phase.fract(), 0.5);
        assert!((e.current_size() - back).abs() < 1e-9);
    }

    #[test]
    fn test_fade_out_then_in() {
        let mut e = engine();
        e.fade_out(1000);
        e.update(1000.0);
        assert_eq!(e.current_opacity(), 0.0);

        e.fade_in(500);
        e.update(250.0);
        assert!((e.current_opacity() - 0.5).abs() < 1e-9);
        e.update(250.0);
        assert_eq!(e.current_opacity(), 1.0);
        assert!(!e.has_transition(TransitionKind::Opacity));
    }

    #[test]
    fn test_zero_duration_completes_next_tick() {
        let mut e = engine();
        let target = Rgb::parse("#123456").unwrap();
        e.transition_color(target, 0);
        e.update(0.0);
        assert_eq!(e.current_color(), target);
        assert!(!e.has_transition(TransitionKind::Color));
    }

    #[test]
    fn test_particles_stay_in_viewport() {
        let mut e = engine();
        for _ in 0..1000 {
            e.update(100.0);
        }
        for p in e.particles() {
            assert!(p.x >= 0.0 && p.x < 64.0, "x out of viewport: {}", p.x);
            assert!(p.y >= 0.0 && p.y < 24.0, "y out of viewport: {}", p.y);
        }
    }

    #[test]
    fn test_resize_reseeds_particles() {
        let mut e = engine();
        e.resize(10.0, 5.0);
        assert_eq!(e.particles().len(), PARTICLE_COUNT);
        for p in e.particles() {
            assert!(p.x < 10.0 && p.y < 5.0);
        }
    }
}
