use crate::audio::MicAnalyser;
use crate::constants::*;
use flux_core::gpu::GpuSimulator;
use flux_core::hand::FlatJointSource;
use flux_core::{FluxPipeline, InteractionEvent};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys as web;

pub struct FrameContext {
    pub pipeline: FluxPipeline,
    pub joints: FlatJointSource,
    pub mic: Option<MicAnalyser>,
    pub gpu: Option<GpuSimulator>,
    bins: Vec<u8>,
    positions: Vec<f32>,
    heat: Vec<f32>,
    events: VecDeque<InteractionEvent>,
}

impl FrameContext {
    pub fn new(pipeline: FluxPipeline) -> Self {
        let mut ctx = Self {
            pipeline,
            joints: FlatJointSource::new(),
            mic: None,
            gpu: None,
            bins: Vec::new(),
            positions: Vec::new(),
            heat: Vec::new(),
            events: VecDeque::new(),
        };
        ctx.refresh_from_field();
        ctx
    }

    pub fn frame(&mut self, dt: f32, now_ms: f64) {
        let audio = match self.mic.as_ref() {
            Some(mic) => {
                mic.read(&mut self.bins);
                Some(self.bins.as_slice())
            }
            None => None,
        };

        match self.gpu.as_mut() {
            Some(gpu) => {
                let events = self.pipeline.tick_attractors(&self.joints, audio, dt, now_ms);
                self.events.extend(events.iter().cloned());
                gpu.step(&self.pipeline.sim_params, &self.pipeline.sim, dt);
                match gpu.poll() {
                    Ok(true) => {
                        gpu.write_positions(&mut self.positions);
                        self.heat.clear();
                        self.heat.extend(gpu.latest().iter().map(|p| p.position[3]));
                    }
                    Ok(false) => {}
                    Err(e) => {
                        log::warn!("[frame] GPU readback failed ({e}), using the CPU integrator");
                        if let Some(gpu) = self.gpu.take() {
                            gpu.sync_to(&mut self.pipeline.sim.particles);
                        }
                    }
                }
            }
            None => {
                let events = self.pipeline.tick(&self.joints, audio, dt, now_ms);
                self.events.extend(events.iter().cloned());
                self.refresh_from_field();
            }
        }

        while self.events.len() > MAX_QUEUED_EVENTS {
            self.events.pop_front();
        }
    }

    /// Rest every particle and push the rested field to the device.
    pub fn snap_home(&mut self) {
        self.pipeline.snap_home();
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.upload(self.pipeline.particles());
        }
        self.refresh_from_field();
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn heat(&self) -> &[f32] {
        &self.heat
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = InteractionEvent> + '_ {
        self.events.drain(..)
    }

    fn refresh_from_field(&mut self) {
        let field = self.pipeline.particles();
        field.write_positions(&mut self.positions);
        self.heat.clear();
        self.heat.extend_from_slice(&field.heat);
    }
}

/// Drive `ctx` from the XR session's animation frames until the session ends.
pub fn start_xr_loop(
    ctx: Rc<RefCell<FrameContext>>,
    session: web::XrSession,
    space: web::XrReferenceSpace,
) {
    let tick: Rc<RefCell<Option<Closure<dyn FnMut(f64, web::XrFrame)>>>> =
        Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    let session_tick = session.clone();
    let mut last_ms: Option<f64> = None;
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move |time: f64, xr_frame: web::XrFrame| {
        let dt = last_ms.map_or(FIRST_FRAME_DT_SEC, |last| ((time - last) / 1000.0) as f32);
        last_ms = Some(time);
        {
            let mut c = ctx.borrow_mut();
            crate::xr::sample_hands(&xr_frame, &space, &mut c.joints);
            c.frame(dt, time);
        }
        if let Some(cb) = tick_clone.borrow().as_ref() {
            _ = session_tick.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64, web::XrFrame)>));
    if let Some(cb) = tick.borrow().as_ref() {
        _ = session.request_animation_frame(cb.as_ref().unchecked_ref());
    }
    log::info!("[xr] frame loop started");
}
