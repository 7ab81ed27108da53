//! Terminal drawing layer
//!
//! Reads the indicator state from the store and composes a frame string;
//! it never mutates model state, so composing a frame is idempotent and
//! safe to call any number of times per tick.

use crate::core::engine::{Particle, RESTING_COLOR};
use crate::core::SharedStore;
use crate::types::Rgb;
use crate::DEFAULT_BASE_SIZE;

/// Horizontal squash factor: terminal cells are about twice as tall as wide
const CELL_ASPECT: f64 = 0.5;

/// Fatal initialization failure of the drawing subsystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Zero-area surface; nothing can ever be drawn on it
    EmptySurface { width: u16, height: u16 },
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::EmptySurface { width, height } => {
                write!(f, "unusable render surface: {}x{}", width, height)
            }
        }
    }
}

impl std::error::Error for RenderError {}

/// A fixed-size character canvas for the indicator and its particles
#[derive(Debug, Clone)]
pub struct TermCanvas {
    width: u16,
    height: u16,
}

impl TermCanvas {
    /// Validate the surface up front; a degenerate surface is fatal for
    /// the drawing subsystem (reported once by the caller, not retried)
    pub fn new(width: u16, height: u16) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptySurface { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Compose one frame from the published pixel state and the particle
    /// field. Pure read; no side effects.
    pub fn frame(&self, store: &SharedStore, particles: &[Particle]) -> String {
        let size = store.get_f64("pixel.size").unwrap_or(DEFAULT_BASE_SIZE);
        let opacity = store.get_f64("pixel.opacity").unwrap_or(1.0).clamp(0.0, 1.0);
        let color = store
            .get_str("pixel.color")
            .and_then(|s| Rgb::parse(&s).ok())
            .unwrap_or(RESTING_COLOR);

        let cx = self.width as f64 / 2.0;
        let cy = self.height as f64 / 2.0;

        let mut out = String::with_capacity((self.width as usize + 16) * self.height as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                let dx = (x as f64 + 0.5 - cx) * CELL_ASPECT;
                let dy = y as f64 + 0.5 - cy;
                let dist = (dx * dx + dy * dy).sqrt();

                if dist <= size && opacity > 0.0 {
                    // Core glow, brightest at the center
                    let brightness = opacity * (0.35 + 0.65 * (1.0 - dist / size.max(1e-9)));
                    out.push_str(&paint(color, brightness, '●'));
                } else if dist <= size + 1.0 && opacity > 0.0 {
                    out.push_str(&paint(color, opacity * 0.25, '·'));
                } else if let Some(p) = particle_at(particles, x, y) {
                    out.push_str(&paint(Rgb::new(0xb0, 0xb8, 0xc8), p.opacity, '·'));
                } else {
                    out.push(' ');
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Color a glyph with a brightness-scaled 24-bit foreground
fn paint(color: Rgb, brightness: f64, glyph: char) -> String {
    let b = brightness.clamp(0.0, 1.0);
    let scale = |c: u8| (c as f64 * b).round() as u8;
    format!(
        "\x1b[38;2;{};{};{}m{}\x1b[0m",
        scale(color.r),
        scale(color.g),
        scale(color.b),
        glyph
    )
}

fn particle_at(particles: &[Particle], x: u16, y: u16) -> Option<&Particle> {
    particles
        .iter()
        .find(|p| p.x.floor() as i64 == x as i64 && p.y.floor() as i64 == y as i64)
}
