//! Microphone capture standing in for the browser's analyser node.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::collections::VecDeque;
use std::f32::consts::TAU;
use std::sync::{Arc, Mutex};

// Analyser byte scaling: decibels in this range map onto 0..=255.
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

pub struct Microphone {
    _stream: cpal::Stream,
    samples: Arc<Mutex<VecDeque<f32>>>,
    pub sample_rate: f32,
    fft_size: usize,
    window: Vec<f32>,
    frame: Vec<f32>,
    fft: Spectrum,
}

impl Microphone {
    pub fn open(fft_size: usize) -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow::anyhow!("No input device"))?;
        let config = device.default_input_config()?;
        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        log::info!(
            "[mic] {} @ {} Hz, {} ch",
            device.name().unwrap_or_default(),
            sample_rate,
            channels
        );

        let samples = Arc::new(Mutex::new(VecDeque::with_capacity(fft_size * 2)));
        let err_fn = |err| log::error!("[mic] stream error: {err}");
        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => {
                let sink = Arc::clone(&samples);
                device.build_input_stream(
                    &config.into(),
                    move |data: &[f32], _| push_frames(&sink, data, channels, fft_size, |s| s),
                    err_fn,
                    None,
                )?
            }
            cpal::SampleFormat::I16 => {
                let sink = Arc::clone(&samples);
                device.build_input_stream(
                    &config.into(),
                    move |data: &[i16], _| {
                        push_frames(&sink, data, channels, fft_size, |s| s as f32 / i16::MAX as f32)
                    },
                    err_fn,
                    None,
                )?
            }
            cpal::SampleFormat::U16 => {
                let sink = Arc::clone(&samples);
                device.build_input_stream(
                    &config.into(),
                    move |data: &[u16], _| {
                        push_frames(&sink, data, channels, fft_size, |s| {
                            (s as f32 - 32768.0) / 32768.0
                        })
                    },
                    err_fn,
                    None,
                )?
            }
            other => anyhow::bail!("unsupported sample format {other:?}"),
        };
        stream.play()?;

        let window = (0..fft_size)
            .map(|i| 0.5 - 0.5 * (TAU * i as f32 / fft_size as f32).cos())
            .collect();
        Ok(Self {
            _stream: stream,
            samples,
            sample_rate,
            fft_size,
            window,
            frame: vec![0.0; fft_size],
            fft: Spectrum::new(fft_size)?,
        })
    }

    /// Byte magnitude spectrum (`fft_size / 2` bins) of the latest samples.
    /// Returns false while the buffer is still filling.
    pub fn spectrum(&mut self, out: &mut Vec<u8>) -> bool {
        {
            let Ok(guard) = self.samples.lock() else {
                return false;
            };
            if guard.len() < self.fft_size {
                return false;
            }
            let skip = guard.len() - self.fft_size;
            for (dst, src) in self.frame.iter_mut().zip(guard.iter().skip(skip)) {
                *dst = *src;
            }
        }
        for (s, w) in self.frame.iter_mut().zip(&self.window) {
            *s *= w;
        }
        self.fft.bytes(&self.frame, out);
        true
    }
}

fn push_frames<T: Copy>(
    sink: &Mutex<VecDeque<f32>>,
    data: &[T],
    channels: usize,
    keep: usize,
    to_f32: impl Fn(T) -> f32,
) {
    let Ok(mut buf) = sink.lock() else {
        return;
    };
    for frame in data.chunks(channels.max(1)) {
        let mono = frame.iter().map(|s| to_f32(*s)).sum::<f32>() / frame.len() as f32;
        buf.push_back(mono);
    }
    while buf.len() > keep {
        buf.pop_front();
    }
}

/// Radix-2 FFT whose twiddle and bit-reversal tables are built once.
pub struct Spectrum {
    // e^(-2πik/n) for k < n/2.
    twiddles: Vec<(f32, f32)>,
    reversed: Vec<usize>,
    re: Vec<f32>,
    im: Vec<f32>,
}

impl Spectrum {
    pub fn new(n: usize) -> anyhow::Result<Self> {
        anyhow::ensure!(n >= 2 && n.is_power_of_two(), "FFT size {n} is not a power of two");
        let bits = n.trailing_zeros();
        let twiddles = (0..n / 2)
            .map(|k| {
                let angle = -TAU * k as f32 / n as f32;
                (angle.cos(), angle.sin())
            })
            .collect();
        let reversed = (0..n)
            .map(|i| i.reverse_bits() >> (usize::BITS - bits))
            .collect();
        Ok(Self {
            twiddles,
            reversed,
            re: vec![0.0; n],
            im: vec![0.0; n],
        })
    }

    /// Magnitudes of a windowed frame (`n / 2` bins), scaled to analyser bytes.
    pub fn bytes(&mut self, frame: &[f32], out: &mut Vec<u8>) {
        let n = self.re.len();
        for (i, &src) in self.reversed.iter().enumerate() {
            self.re[i] = frame.get(src).copied().unwrap_or(0.0);
            self.im[i] = 0.0;
        }
        let mut len = 2;
        while len <= n {
            let half = len / 2;
            let stride = n / len;
            for start in (0..n).step_by(len) {
                for j in 0..half {
                    let (wr, wi) = self.twiddles[j * stride];
                    let (a, b) = (start + j, start + j + half);
                    let tr = self.re[b] * wr - self.im[b] * wi;
                    let ti = self.re[b] * wi + self.im[b] * wr;
                    self.re[b] = self.re[a] - tr;
                    self.im[b] = self.im[a] - ti;
                    self.re[a] += tr;
                    self.im[a] += ti;
                }
            }
            len *= 2;
        }

        out.clear();
        out.reserve(n / 2);
        for k in 0..n / 2 {
            let magnitude = (self.re[k] * self.re[k] + self.im[k] * self.im[k]).sqrt() / n as f32;
            out.push(to_byte(magnitude));
        }
    }
}

fn to_byte(magnitude: f32) -> u8 {
    let db = 20.0 * magnitude.max(1e-12).log10();
    let scaled = (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS) * 255.0;
    scaled.clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(n: usize, cycles: f32) -> Vec<f32> {
        (0..n)
            .map(|i| (TAU * cycles * i as f32 / n as f32).sin())
            .collect()
    }

    #[test]
    fn tone_lands_in_its_bin() {
        let mut fft = Spectrum::new(1024).expect("power of two");
        let mut out = Vec::new();
        fft.bytes(&tone(1024, 8.0), &mut out);
        assert_eq!(out.len(), 512);
        let peak = out
            .iter()
            .enumerate()
            .max_by_key(|(_, v)| **v)
            .map(|(i, _)| i);
        assert_eq!(peak, Some(8));
        assert_eq!(out[100], 0, "silent bins read as zero");
    }

    #[test]
    fn matches_a_direct_transform() {
        let n = 256;
        let frame: Vec<f32> = tone(n, 5.0)
            .iter()
            .zip(tone(n, 37.3))
            .enumerate()
            .map(|(i, (a, b))| 0.6 * a + 0.02 * b + 0.001 * (i % 7) as f32)
            .collect();
        let mut fft = Spectrum::new(n).expect("power of two");
        let mut out = Vec::new();
        fft.bytes(&frame, &mut out);
        let mut compared = 0;
        for (k, &byte) in out.iter().enumerate() {
            let step = std::f64::consts::TAU * k as f64 / n as f64;
            let (re, im) = frame.iter().enumerate().fold((0.0f64, 0.0f64), |(re, im), (i, s)| {
                let phase = step * i as f64;
                (re + f64::from(*s) * phase.cos(), im - f64::from(*s) * phase.sin())
            });
            let direct = to_byte(((re * re + im * im).sqrt() / n as f64) as f32);
            // Near the floor both sides are dominated by rounding.
            if direct < 64 {
                continue;
            }
            compared += 1;
            assert!(
                (i32::from(byte) - i32::from(direct)).abs() <= 1,
                "bin {k}: fft {byte}, direct {direct}"
            );
        }
        assert!(compared >= 3, "only {compared} bins above the floor");
    }

    #[test]
    fn rejects_sizes_that_are_not_powers_of_two() {
        assert!(Spectrum::new(1000).is_err());
        assert!(Spectrum::new(1).is_err());
    }
}
