//! Frequency band extraction and beat detection from analyser bins.
//!
//! Input is the byte magnitude spectrum an analyser node produces (0..=255
//! per bin, `fft_size / 2` bins). Output is three smoothed bands in 0..=1.

use crate::config::AudioParams;
use crate::constants::*;
use std::ops::Range;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AudioBands {
    pub bass: f32,
    pub mid: f32,
    pub high: f32,
}

impl AudioBands {
    /// Average of the three bands, clamped to 0..=1.
    pub fn volume(&self) -> f32 {
        ((self.bass + self.mid + self.high) / 3.0).clamp(0.0, 1.0)
    }

    /// Turbulence drive for the integrator.
    pub fn level(&self) -> f32 {
        self.volume() * AUDIO_LEVEL_SCALE
    }

    fn sanitized(self) -> Self {
        let f = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            bass: f(self.bass),
            mid: f(self.mid),
            high: f(self.high),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AudioFrame {
    /// Smoothed bands.
    pub bands: AudioBands,
    /// Unsmoothed bands from this reading.
    pub raw: AudioBands,
    pub is_beat: bool,
}

/// Bin index range covering `lo_hz..hi_hz`, clipped to `bin_count`.
pub fn bin_range(lo_hz: f32, hi_hz: f32, bin_hz: f32, bin_count: usize) -> Range<usize> {
    let to_bin = |hz: f32| ((hz / bin_hz).round().max(0.0) as usize).min(bin_count);
    let start = to_bin(lo_hz);
    let end = to_bin(hi_hz).max(start);
    start..end
}

fn band_average(bins: &[u8], range: Range<usize>) -> f32 {
    let slice = bins.get(range).unwrap_or(&[]);
    if slice.is_empty() {
        return 0.0;
    }
    let sum: u32 = slice.iter().map(|&b| b as u32).sum();
    sum as f32 / slice.len() as f32 / 255.0
}

pub struct BandExtractor {
    pub params: AudioParams,
    bass: Range<usize>,
    mid: Range<usize>,
    high: Range<usize>,
    smooth: AudioBands,
    beat_threshold: f32,
    beat_hold_ms: Option<f64>,
}

impl BandExtractor {
    pub fn new(params: AudioParams) -> Self {
        let bin_count = params.fft_size / 2;
        let bin_hz = params.sample_rate_hz / params.fft_size.max(1) as f32;
        Self {
            bass: bin_range(BASS_BAND_HZ.0, BASS_BAND_HZ.1, bin_hz, bin_count),
            mid: bin_range(MID_BAND_HZ.0, MID_BAND_HZ.1, bin_hz, bin_count),
            high: bin_range(HIGH_BAND_MIN_HZ, f32::MAX, bin_hz, bin_count),
            params,
            smooth: AudioBands::default(),
            beat_threshold: 0.0,
            beat_hold_ms: None,
        }
    }

    /// Re-derive the bin ranges for a different sample rate.
    pub fn set_sample_rate(&mut self, sample_rate_hz: f32) {
        let params = AudioParams {
            sample_rate_hz,
            ..self.params.clone()
        };
        let smooth = self.smooth;
        *self = Self::new(params);
        self.smooth = smooth;
    }

    pub fn bands(&self) -> AudioBands {
        self.smooth
    }

    /// Unsmoothed bands for one spectrum.
    pub fn measure(&self, bins: &[u8]) -> AudioBands {
        AudioBands {
            bass: band_average(bins, self.bass.clone()),
            mid: band_average(bins, self.mid.clone()),
            high: (band_average(bins, self.high.clone()) * self.params.high_boost).min(1.0),
        }
    }

    /// Process one analyser reading taken `dt_ms` after the previous one.
    pub fn process(&mut self, bins: &[u8], dt_ms: f64) -> AudioFrame {
        let raw = self.measure(bins);
        let is_beat = self.detect_beat(raw.bass, dt_ms);
        let k = self.params.smoothing;
        self.smooth = AudioBands {
            bass: self.smooth.bass + (raw.bass - self.smooth.bass) * k,
            mid: self.smooth.mid + (raw.mid - self.smooth.mid) * k,
            high: self.smooth.high + (raw.high - self.smooth.high) * k,
        }
        .sanitized();
        AudioFrame {
            bands: self.smooth,
            raw,
            is_beat,
        }
    }

    /// No audio this frame: bands fall back to silence.
    pub fn silence(&mut self) -> AudioFrame {
        self.smooth = AudioBands::default();
        self.beat_hold_ms = None;
        AudioFrame::default()
    }

    fn detect_beat(&mut self, energy: f32, dt_ms: f64) -> bool {
        self.beat_threshold =
            self.beat_threshold * BEAT_THRESHOLD_DECAY + energy * (1.0 - BEAT_THRESHOLD_DECAY);
        let mut beat = false;
        let peak = energy > self.beat_threshold * BEAT_RATIO && energy > BEAT_FLOOR;
        if peak && self.beat_hold_ms.is_none() {
            beat = true;
            self.beat_hold_ms = Some(0.0);
            log::debug!("[audio] beat energy={:.2}", energy);
        }
        if let Some(held) = self.beat_hold_ms {
            let held = held + dt_ms;
            self.beat_hold_ms = (held <= BEAT_HOLD_MS).then_some(held);
        }
        beat
    }
}

impl Default for BandExtractor {
    fn default() -> Self {
        Self::new(AudioParams::default())
    }
}
