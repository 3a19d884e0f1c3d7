use thiserror::Error;

/// Rejected configuration input
///
/// Setters receiving an out-of-range value return this instead of mutating,
/// so the prior value is always retained.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ValidationError {
    #[error("grid width must be in [1, 20], got {0}")]
    Width(usize),

    #[error("grid height must be in [1, 20], got {0}")]
    Height(usize),

    #[error("trap count must be at most {max}, got {requested}")]
    TrapCount { requested: usize, max: usize },

    #[error("discount factor must be in [0, 1], got {0}")]
    Gamma(f32),

    #[error("epsilon must be in [0, 1], got {0}")]
    Epsilon(f32),

    #[error("epsilon decay must be in [0.9, 1], got {0}")]
    EpsilonDecay(f32),

    #[error("action delay must be in [1, 5000] ms, got {0}")]
    ActionDelay(u64),

    #[error("max episodes must be at least 1, got {0}")]
    MaxEpisodes(u32),
}
