#![cfg(target_arch = "wasm32")]
use flux_core::gpu::GpuSimulator;
use flux_core::{Attractor, FluxConfig, FluxPipeline, Handedness, InteractionEvent};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys as web;

mod audio;
mod constants;
mod frame;
mod xr;

use constants::*;
use frame::FrameContext;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("[flux] starting");
    Ok(())
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn parse_hand(name: &str) -> Result<Handedness, JsValue> {
    Handedness::BOTH
        .into_iter()
        .find(|h| h.as_str() == name)
        .ok_or_else(|| js_err(format!("unknown hand {name:?}")))
}

fn set(obj: &js_sys::Object, key: &str, value: impl Into<JsValue>) {
    _ = js_sys::Reflect::set(obj, &key.into(), &value.into());
}

fn event_to_js(event: &InteractionEvent) -> JsValue {
    let obj = js_sys::Object::new();
    set(&obj, "type", event.name());
    if let Some(hand) = event.hand() {
        set(&obj, "hand", hand.as_str());
    }
    match event {
        InteractionEvent::GestureChanged { from, to, .. } => {
            set(&obj, "from", from.as_str());
            set(&obj, "to", to.as_str());
        }
        InteractionEvent::GestureEntered { gesture, .. }
        | InteractionEvent::GestureExited { gesture, .. } => {
            set(&obj, "gesture", gesture.as_str());
        }
        InteractionEvent::PinchStarted { at_ms, .. }
        | InteractionEvent::PinchEnded { at_ms, .. }
        | InteractionEvent::ResetTriggered { at_ms } => {
            set(&obj, "atMs", *at_ms);
        }
    }
    obj.into()
}

fn attractor_to_js(a: &Attractor) -> JsValue {
    let obj = js_sys::Object::new();
    set(&obj, "mode", a.mode.as_str());
    let p = a.position;
    set(&obj, "position", js_sys::Float32Array::from(&p.to_array()[..]));
    set(&obj, "strength", a.strength);
    set(&obj, "radius", a.radius);
    if let Some(d) = a.direction {
        set(&obj, "direction", js_sys::Float32Array::from(&d.to_array()[..]));
    }
    if let Some(q) = a.partner {
        set(&obj, "partner", js_sys::Float32Array::from(&q.to_array()[..]));
    }
    set(&obj, "orbSize", a.orb_size);
    obj.into()
}

/// Handle owned by the page. Joints arrive either as flat arrays from JS or
/// straight from an `XRFrame`; particles go back out as flat float arrays.
#[wasm_bindgen]
pub struct FluxApp {
    inner: Rc<RefCell<FrameContext>>,
}

#[wasm_bindgen]
impl FluxApp {
    #[wasm_bindgen(constructor)]
    pub fn new(particle_count: u32, seed: u32) -> Result<FluxApp, JsValue> {
        let count = match particle_count {
            0 => DEFAULT_PARTICLE_COUNT,
            n => n.min(MAX_PARTICLE_COUNT),
        };
        let mut config = FluxConfig::default();
        config.spawn.count = count as usize;
        config.spawn.seed = u64::from(seed);
        let pipeline = FluxPipeline::new(config).map_err(js_err)?;
        log::info!("[flux] {} particles, seed {}", count, seed);
        Ok(FluxApp {
            inner: Rc::new(RefCell::new(FrameContext::new(pipeline))),
        })
    }

    /// Joint positions for one hand, `[x, y, z]` per joint in XR joint order.
    /// An empty array marks the hand untracked.
    pub fn set_hand_joints(&self, hand: &str, joints: &[f32]) -> Result<(), JsValue> {
        let hand = parse_hand(hand)?;
        let mut c = self.inner.borrow_mut();
        if joints.is_empty() {
            c.joints.clear(hand);
            return Ok(());
        }
        c.joints.set_hand(hand, joints).map_err(js_err)
    }

    /// Read both hands from an XR frame the page is already handling.
    pub fn update_from_xr(&self, xr_frame: &web::XrFrame, space: &web::XrReferenceSpace) {
        let mut c = self.inner.borrow_mut();
        xr::sample_hands(xr_frame, space, &mut c.joints);
    }

    /// Hand the render loop over to the session's animation frames.
    pub fn start_xr(&self, session: web::XrSession, space: web::XrReferenceSpace) {
        frame::start_xr_loop(self.inner.clone(), session, space);
    }

    pub fn tick(&self, dt: f32, now_ms: f64) {
        self.inner.borrow_mut().frame(dt, now_ms);
    }

    pub fn enable_microphone(&self) -> js_sys::Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let mic = audio::MicAnalyser::connect().await.map_err(js_err)?;
            let mut c = inner.borrow_mut();
            c.pipeline.audio.set_sample_rate(mic.sample_rate);
            c.mic = Some(mic);
            Ok(JsValue::TRUE)
        })
    }

    /// Move integration onto a WebGPU compute pass. Resolves to false when no
    /// adapter is available; the CPU integrator keeps running either way.
    pub fn use_gpu(&self) -> js_sys::Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let (params, field) = {
                let c = inner.borrow();
                (c.pipeline.sim_params.clone(), c.pipeline.particles().clone())
            };
            match GpuSimulator::new(&params, &field).await {
                Ok(gpu) => {
                    inner.borrow_mut().gpu = Some(gpu);
                    log::info!("[flux] GPU integrator enabled");
                    Ok(JsValue::TRUE)
                }
                Err(e) => {
                    log::warn!("[flux] GPU unavailable ({e}), staying on the CPU");
                    Ok(JsValue::FALSE)
                }
            }
        })
    }

    /// Flat `[x, y, z]` positions, refreshed after each tick.
    pub fn positions(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(self.inner.borrow().positions())
    }

    pub fn heat(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(self.inner.borrow().heat())
    }

    pub fn drain_events(&self) -> js_sys::Array {
        let mut c = self.inner.borrow_mut();
        c.drain_events().map(|e| event_to_js(&e)).collect()
    }

    /// This frame's attractors, hand-driven and injected.
    pub fn attractors(&self) -> js_sys::Array {
        let c = self.inner.borrow();
        c.pipeline.sim.attractors.iter().map(attractor_to_js).collect()
    }

    pub fn audio_bands(&self) -> js_sys::Float32Array {
        let c = self.inner.borrow();
        let b = c.pipeline.audio_frame().bands;
        js_sys::Float32Array::from(&[b.bass, b.mid, b.high, b.volume()][..])
    }

    pub fn reset_factor(&self) -> f32 {
        self.inner.borrow().pipeline.resolution().reset_factor
    }

    pub fn snap_home(&self) {
        self.inner.borrow_mut().snap_home();
    }
}
