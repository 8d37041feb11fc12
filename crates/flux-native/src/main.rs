use clap::Parser;
use flux_core::gpu::GpuSimulator;
use flux_core::{FluxConfig, FluxPipeline, FrameClock, InteractionEvent, SpawnParams};
use std::time::{Duration, Instant};

mod mic;
mod script;

use mic::Microphone;
use script::Scenario;

const DEFAULT_FRAMES: u64 = 600;
const FRAME_DT: f32 = 1.0 / 60.0;
const REPORT_EVERY_FRAMES: u64 = 60;

/// Headless flux run: scripted hands, optional microphone, CPU or GPU integrator.
#[derive(Parser, Debug)]
#[command(name = "flux-native", version, about, long_about = None)]
struct Args {
    /// Scripted hand performance to replay
    #[arg(long, value_enum, default_value_t = Scenario::Tour)]
    scenario: Scenario,

    /// Frames to simulate at 60 Hz
    #[arg(long, default_value_t = DEFAULT_FRAMES)]
    frames: u64,

    /// Particle pool size
    #[arg(long, default_value_t = SpawnParams::default().count)]
    particles: usize,

    /// Seed for the home positions
    #[arg(long, default_value_t = SpawnParams::default().seed)]
    seed: u64,

    /// Integrate on the GPU (falls back to the CPU when no adapter is found)
    #[arg(long)]
    gpu: bool,

    /// Feed the default input device into the band extractor
    #[arg(long)]
    mic: bool,
}

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    if let Err(e) = run(Args::parse()) {
        log::error!("[native] {e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = FluxConfig::default();
    config.spawn.count = args.particles;
    config.spawn.seed = args.seed;
    let mut pipeline = FluxPipeline::new(config)?;
    log::info!(
        "[native] scenario={} frames={} particles={} gpu={} mic={}",
        args.scenario.as_str(),
        args.frames,
        args.particles,
        args.gpu,
        args.mic
    );

    let mut gpu = if args.gpu {
        match pollster::block_on(GpuSimulator::new(&pipeline.sim_params, pipeline.particles())) {
            Ok(g) => Some(g),
            Err(e) => {
                log::warn!("[native] GPU unavailable ({e}), using the CPU integrator");
                None
            }
        }
    } else {
        None
    };

    let mut mic = if args.mic {
        match Microphone::open(pipeline.audio.params.fft_size) {
            Ok(m) => {
                pipeline.audio.set_sample_rate(m.sample_rate);
                Some(m)
            }
            Err(e) => {
                log::warn!("[native] microphone unavailable ({e:#}), running silent");
                None
            }
        }
    } else {
        None
    };

    let mut bins = Vec::new();
    let mut report = Report::default();
    let started = Instant::now();
    let mut clock = FrameClock::new();
    for frame in 0..args.frames {
        // Live input runs on the wall clock; scripted runs step a fixed dt.
        let (dt, now_ms) = if mic.is_some() {
            clock.tick()
        } else {
            (FRAME_DT, f64::from(frame as f32 * FRAME_DT) * 1000.0)
        };
        let t = (now_ms / 1000.0) as f32;
        let hands = args.scenario.hands_at(t);
        let audio = match mic.as_mut() {
            Some(m) => m.spectrum(&mut bins).then_some(bins.as_slice()),
            None => None,
        };

        let events = match gpu.as_mut() {
            Some(g) => {
                let events = pipeline.tick_attractors(&hands, audio, dt, now_ms).to_vec();
                g.step(&pipeline.sim_params, &pipeline.sim, dt);
                match Readback::from_poll(g.poll()) {
                    Readback::Fresh => g.sync_to(&mut pipeline.sim.particles),
                    Readback::Pending => {}
                    Readback::Lost => {
                        g.sync_to(&mut pipeline.sim.particles);
                        gpu = None;
                    }
                }
                events
            }
            None => pipeline.tick(&hands, audio, dt, now_ms).to_vec(),
        };
        report.observe(&pipeline, &events);

        if (frame + 1) % REPORT_EVERY_FRAMES == 0 {
            report.flush(&pipeline, t);
        }
        if mic.is_some() {
            // Live input: pace to real time so the spectrum keeps up.
            let target = Duration::from_secs_f32((frame + 1) as f32 * FRAME_DT);
            if let Some(wait) = target.checked_sub(started.elapsed()) {
                std::thread::sleep(wait);
            }
        }
    }

    if let Some(g) = gpu.as_mut() {
        if let Err(e) = g.wait() {
            log::warn!("[native] final GPU readback failed ({e}), keeping the last frame");
        }
        g.sync_to(&mut pipeline.sim.particles);
    }
    log::info!(
        "[native] done: {} frames in {:.2}s, {} resets, {} recoveries",
        pipeline.frames(),
        started.elapsed().as_secs_f32(),
        report.total_resets,
        report.total_recovered
    );
    Ok(())
}

#[derive(Debug, PartialEq)]
enum Readback {
    Fresh,
    Pending,
    // The run carries on with the CPU integrator from the last good frame.
    Lost,
}

impl Readback {
    fn from_poll(result: flux_core::Result<bool>) -> Self {
        match result {
            Ok(true) => Self::Fresh,
            Ok(false) => Self::Pending,
            Err(e) => {
                log::warn!("[native] GPU readback failed ({e}), using the CPU integrator");
                Self::Lost
            }
        }
    }
}

#[derive(Default)]
struct Report {
    events: usize,
    beats: usize,
    recovered: usize,
    total_resets: usize,
    total_recovered: usize,
}

impl Report {
    fn observe(&mut self, pipeline: &FluxPipeline, events: &[InteractionEvent]) {
        for e in events {
            log::debug!("[native] event {} {:?}", e.name(), e);
            if matches!(e, InteractionEvent::ResetTriggered { .. }) {
                self.total_resets += 1;
            }
        }
        self.events += events.len();
        self.beats += pipeline.audio_frame().is_beat as usize;
        let recovered = pipeline.stats().recovered;
        self.recovered += recovered;
        self.total_recovered += recovered;
    }

    fn flush(&mut self, pipeline: &FluxPipeline, t: f32) {
        let field = pipeline.particles();
        let center = pipeline.sim_params.center;
        let mean_radius = field
            .positions
            .iter()
            .map(|p| p.distance(center))
            .sum::<f32>()
            / field.len() as f32;
        let res = pipeline.resolution();
        let modes: Vec<_> = res.attractors.iter().map(|a| a.mode.as_str()).collect();
        log::info!(
            "[native] t={:.1}s attractors={:?} reset={:.2} spread={:.2} radius={:.2} volume={:.2} events={} beats={} recovered={}",
            t,
            modes,
            res.reset_factor,
            res.spread,
            mean_radius,
            pipeline.sim.audio.volume(),
            self.events,
            self.beats,
            self.recovered
        );
        self.events = 0;
        self.beats = 0;
        self.recovered = 0;
    }
}
