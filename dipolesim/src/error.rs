use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the simulation core.
///
/// Every fallible operation of the engine returns one of these instead of panicking,
/// so the caller (CLI, renderer) decides whether to halt, reset or carry on.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration value or operator edit.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// The placement grid has fewer cells than particles + dipole charges.
    #[error("cannot place {requested} points on a grid of {available} cells; use fewer particles or a smaller radius")]
    Placement { requested: usize, available: usize },

    /// Two dipole charges touched while running without the stick/unstick model.
    #[error("dipole charges collided (separation {separation:.4} < contact distance {contact:.4})")]
    DipoleCollision { separation: f64, contact: f64 },

    /// Numerical issue (non-finite state, degenerate geometry).
    #[error("numerical error: {0}")]
    MathError(String),

    /// Scenario file could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Scenario file could not be parsed.
    #[error("invalid scenario file: {0}")]
    Config(#[from] serde_yaml::Error),
}
