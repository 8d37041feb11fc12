//! Hand-gesture driven, audio-reactive particle force fields.
//!
//! Platform independent: the WebXR front-end and the native harness both
//! feed joint positions and spectrum bins into [`frame::FluxPipeline`] and
//! read particle positions back out.

pub mod attractor;
pub mod audio;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod forces;
pub mod frame;
pub mod gesture;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod hand;
pub mod interaction;
pub mod kernel;
pub mod noise;
pub mod particles;
pub mod sim;
pub mod synth;

pub use attractor::{Attractor, AttractorMode, AttractorSet, AttractorSource};
pub use audio::{AudioBands, AudioFrame, BandExtractor};
pub use config::{AudioParams, FluxConfig, GestureParams, InteractionParams, SimParams, SpawnParams};
pub use error::{FluxError, Result};
pub use events::InteractionEvent;
pub use frame::{FluxPipeline, FrameClock};
pub use gesture::{Gesture, GestureTracker};
pub use hand::{FlatJointSource, HandFrame, Handedness, Joint, JointSource};
pub use interaction::{InteractionResolver, Resolution};
pub use particles::ParticleField;
pub use sim::{SimulationContext, StepStats};
