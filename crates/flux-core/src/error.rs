use thiserror::Error;

/// Construction-time failures. Per-frame problems (missing joints, numeric
/// blow-ups) are recovered locally and never surface as errors.
#[derive(Debug, Error)]
pub enum FluxError {
    #[error("particle pool must not be empty")]
    EmptyParticlePool,
    #[error("joint buffer for {hand} hand has {len} floats, expected {expected}")]
    JointBufferLength {
        hand: &'static str,
        len: usize,
        expected: usize,
    },
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },
    #[error("no compatible GPU adapter")]
    NoAdapter,
    #[error("GPU device request failed: {0}")]
    Device(String),
    #[error("GPU readback failed: {0}")]
    Readback(String),
}

pub type Result<T> = std::result::Result<T, FluxError>;
