// Browser-side tuning: analyser setup and defaults for the exported app.
// Simulation and gesture tuning lives in `flux_core::constants`.

// Analyser node; the FFT size must match the band extractor's.
pub const ANALYSER_FFT_SIZE: u32 = 1024;
pub const ANALYSER_SMOOTHING: f64 = 0.8;
pub const ANALYSER_MIN_DECIBELS: f64 = -100.0;
pub const ANALYSER_MAX_DECIBELS: f64 = -30.0;

// Used when the host passes 0 for the particle count.
pub const DEFAULT_PARTICLE_COUNT: u32 = 16_384;
pub const MAX_PARTICLE_COUNT: u32 = 262_144;

// XR frame times arrive in ms; the first frame has no predecessor.
pub const FIRST_FRAME_DT_SEC: f32 = 1.0 / 72.0;

// Events are dropped oldest-first once the host stops draining them.
pub const MAX_QUEUED_EVENTS: usize = 256;
