//! One frame of the whole system: sample hands, classify, extract audio
//! bands, resolve attractors and integrate particles.

use crate::attractor::{Attractor, AttractorSet};
use crate::audio::{AudioFrame, BandExtractor};
use crate::config::{FluxConfig, SimParams};
use crate::constants::MAX_FRAME_DT_SEC;
use crate::error::Result;
use crate::events::InteractionEvent;
use crate::gesture::GestureTracker;
use crate::hand::{sample_hand, HandFrame, Handedness, JointSource};
use crate::interaction::{HandsSnapshot, InteractionResolver, Resolution};
use crate::particles::ParticleField;
use crate::sim::{SimulationContext, StepStats};
use instant::Instant;

/// Frame delta fit for integration: non-finite or negative becomes 0, long
/// stalls are capped.
pub fn clamp_dt(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, MAX_FRAME_DT_SEC)
    } else {
        0.0
    }
}

/// Wall clock for front-ends without a host-supplied frame time.
pub struct FrameClock {
    start: Instant,
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self { start: now, last: now }
    }

    /// Returns `(dt_sec, now_ms)` for the frame starting now.
    pub fn tick(&mut self) -> (f32, f64) {
        let now = Instant::now();
        let dt = clamp_dt((now - self.last).as_secs_f32());
        self.last = now;
        (dt, (now - self.start).as_secs_f64() * 1000.0)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

pub struct FluxPipeline {
    pub gestures: GestureTracker,
    pub resolver: InteractionResolver,
    pub audio: BandExtractor,
    pub sim: SimulationContext,
    pub sim_params: SimParams,
    external: AttractorSet,
    hands: [Option<HandFrame>; 2],
    resolution: Resolution,
    audio_frame: AudioFrame,
    events: Vec<InteractionEvent>,
    stats: StepStats,
    frames: u64,
}

impl FluxPipeline {
    pub fn new(config: FluxConfig) -> Result<Self> {
        let particles = ParticleField::spawn(&config.spawn)?;
        Self::with_particles(config, particles)
    }

    pub fn with_particles(config: FluxConfig, particles: ParticleField) -> Result<Self> {
        config.sim.validate()?;
        Ok(Self {
            gestures: GestureTracker::new(config.gesture),
            resolver: InteractionResolver::new(config.interaction),
            audio: BandExtractor::new(config.audio),
            sim: SimulationContext::new(particles),
            sim_params: config.sim,
            external: AttractorSet::new(),
            hands: [None, None],
            resolution: Resolution::default(),
            audio_frame: AudioFrame::default(),
            events: Vec::new(),
            stats: StepStats::default(),
            frames: 0,
        })
    }

    /// Run one frame on the CPU integrator. `audio_bins` is the analyser's
    /// byte spectrum, `None` when no audio is available.
    pub fn tick<S: JointSource + ?Sized>(
        &mut self,
        source: &S,
        audio_bins: Option<&[u8]>,
        dt: f32,
        now_ms: f64,
    ) -> &[InteractionEvent] {
        let dt = self.prepare(source, audio_bins, dt, now_ms);
        self.stats = self.sim.step(&self.sim_params, dt);
        &self.events
    }

    /// Same as [`tick`](Self::tick) but leaves particle integration to an
    /// external integrator (the GPU kernel) that reads `self.sim`.
    pub fn tick_attractors<S: JointSource + ?Sized>(
        &mut self,
        source: &S,
        audio_bins: Option<&[u8]>,
        dt: f32,
        now_ms: f64,
    ) -> &[InteractionEvent] {
        let dt = self.prepare(source, audio_bins, dt, now_ms);
        self.sim.time += dt;
        self.stats = StepStats::default();
        &self.events
    }

    fn prepare<S: JointSource + ?Sized>(
        &mut self,
        source: &S,
        audio_bins: Option<&[u8]>,
        dt: f32,
        now_ms: f64,
    ) -> f32 {
        let dt = clamp_dt(dt);
        self.events.clear();
        self.frames += 1;

        for hand in Handedness::BOTH {
            let frame = sample_hand(source, hand);
            match &frame {
                Some(f) => self.gestures.observe(f, now_ms, &mut self.events),
                None => self.gestures.lose(hand, now_ms, &mut self.events),
            }
            self.hands[hand.index()] = frame;
        }

        self.audio_frame = match audio_bins {
            Some(bins) if !bins.is_empty() => self.audio.process(bins, f64::from(dt) * 1000.0),
            _ => self.audio.silence(),
        };

        let [left, right] = &self.hands;
        let snapshot = HandsSnapshot::from_frames(
            left.as_ref(),
            right.as_ref(),
            &self.gestures,
            &self.resolver.params,
        );
        self.resolution = self.resolver.resolve(
            &snapshot,
            dt,
            now_ms,
            self.audio_frame.is_beat,
            &mut self.events,
        );

        self.sim.attractors.clone_from(&self.resolution.attractors);
        self.sim.attractors.extend(self.external.iter().cloned());
        self.sim.audio = self.audio_frame.bands;
        self.sim.reset_factor = self.resolution.reset_factor;
        dt
    }

    /// Add a host-driven attractor (tornado, fountain, paint...) that stays
    /// active until [`clear_external`](Self::clear_external).
    pub fn push_external(&mut self, attractor: Attractor) {
        self.external.push(attractor);
    }

    pub fn clear_external(&mut self) {
        self.external.clear();
    }

    /// Snap every particle home immediately, skipping the ramp.
    pub fn snap_home(&mut self) {
        self.sim.particles.snap_home();
    }

    pub fn events(&self) -> &[InteractionEvent] {
        &self.events
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn audio_frame(&self) -> &AudioFrame {
        &self.audio_frame
    }

    pub fn hand(&self, hand: Handedness) -> Option<&HandFrame> {
        self.hands[hand.index()].as_ref()
    }

    pub fn stats(&self) -> StepStats {
        self.stats
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn particles(&self) -> &ParticleField {
        &self.sim.particles
    }
}
