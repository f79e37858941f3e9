use serde::{Deserialize, Serialize};

/// Default tempo when a file has none: 500,000 µs per quarter note (120 BPM).
pub const DEFAULT_TEMPO: u32 = 500_000;

/// Largest tempo a tempo meta event can carry in its three bytes.
pub const MAX_TEMPO: u32 = 0xFF_FFFF;

/// Time signature and tempo of a song, in pulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
    /// Pulses per quarter note.
    pub quarter: u32,
    /// Microseconds per quarter note.
    pub tempo: u32,
}

impl TimeSignature {
    pub fn new(numerator: u32, denominator: u32, quarter: u32, tempo: u32) -> Self {
        Self {
            numerator,
            denominator,
            quarter,
            tempo,
        }
    }

    /// Length of one measure in pulses.
    pub fn measure(&self) -> i64 {
        if self.denominator == 0 {
            return 0;
        }
        self.numerator as i64 * self.quarter as i64 * 4 / self.denominator as i64
    }

    pub fn bpm(&self) -> f64 {
        if self.tempo == 0 {
            return 0.0;
        }
        60_000_000.0 / self.tempo as f64
    }
}

impl std::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} quarter={} tempo={}",
            self.numerator, self.denominator, self.quarter, self.tempo
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_length() {
        assert_eq!(TimeSignature::new(4, 4, 480, DEFAULT_TEMPO).measure(), 1920);
        assert_eq!(TimeSignature::new(3, 4, 480, DEFAULT_TEMPO).measure(), 1440);
        assert_eq!(TimeSignature::new(6, 8, 96, DEFAULT_TEMPO).measure(), 288);
    }

    #[test]
    fn bpm_from_tempo() {
        let time = TimeSignature::new(4, 4, 480, DEFAULT_TEMPO);
        assert!((time.bpm() - 120.0).abs() < 1e-9);
    }
}
