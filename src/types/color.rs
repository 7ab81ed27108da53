//! RGB color parsed from `#RRGGBB`, with linear per-channel interpolation

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

lazy_static! {
    static ref HEX_COLOR: Regex = Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap();
}

/// Error for color strings that are not 6-hex-digit `#RRGGBB`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorParseError {
    /// The offending input
    pub input: String,
}

impl std::fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed color {:?}: expected #RRGGBB", self.input)
    }
}

impl std::error::Error for ColorParseError {}

/// A 24-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Create from raw channels
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#RRGGBB` string, rejecting anything else
    pub fn parse(input: &str) -> Result<Self, ColorParseError> {
        if !HEX_COLOR.is_match(input) {
            return Err(ColorParseError {
                input: input.to_string(),
            });
        }
        // Regex guarantees the slices are valid hex pairs
        let r = u8::from_str_radix(&input[1..3], 16).unwrap();
        let g = u8::from_str_radix(&input[3..5], 16).unwrap();
        let b = u8::from_str_radix(&input[5..7], 16).unwrap();
        Ok(Self { r, g, b })
    }

    /// Encode as lowercase zero-padded `#rrggbb`
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear per-channel interpolation, rounded to the nearest integer.
    ///
    /// `progress` is clamped to [0, 1]; 0 yields exactly `self`, 1 yields
    /// exactly `target`.
    pub fn lerp(self, target: Rgb, progress: f64) -> Rgb {
        let p = progress.clamp(0.0, 1.0);
        let channel = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * p).round() as u8;
        Rgb {
            r: channel(self.r, target.r),
            g: channel(self.g, target.g),
            b: channel(self.b, target.b),
        }
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgb::parse(&s).map_err(serde::de::Error::custom)
    }
}
