use thiserror::Error;

/// Tunables or board settings that cannot drive a simulation.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The starting clean-ratio threshold lies outside `(0, 1]`.
    #[error("base_alpha must lie within (0, 1], got {0}")]
    BaseAlpha(f32),
    /// The threshold floor lies outside `[0, base_alpha]`.
    #[error("min_alpha must lie within [0, {base}], got {min}")]
    MinAlpha {
        /// Configured floor.
        min: f32,
        /// Configured starting threshold.
        base: f32,
    },
    /// The placement budget is zero.
    #[error("placement_attempts must be at least one")]
    NoAttempts,
    /// The bonus arc is wider than a full turn or negative.
    #[error("bonus_arc_width_degrees must lie within [0, 360], got {0}")]
    ArcWidth(f32),
    /// A distance, speed or delay is negative or not finite.
    #[error("{name} must be a finite, non-negative number, got {value}")]
    Negative {
        /// Name of the offending tunable.
        name: &'static str,
        /// Value that was rejected.
        value: f32,
    },
    /// The board has no tiles or a degenerate tile length.
    #[error("board {columns}x{rows} with tile length {tile_length} cannot host zones")]
    InvalidBoard {
        /// Configured column count.
        columns: u32,
        /// Configured row count.
        rows: u32,
        /// Configured tile length.
        tile_length: f32,
    },
}

/// Zone profile that is skipped when the roster is built.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ProfileError {
    /// The footprint has a zero dimension.
    #[error("profile {index}: footprint has a zero dimension")]
    EmptyFootprint {
        /// Position of the profile in the configuration.
        index: usize,
    },
    /// The footprint is larger than the board.
    #[error("profile {index}: footprint {width}x{height} exceeds the {columns}x{rows} board")]
    FootprintTooLarge {
        /// Position of the profile in the configuration.
        index: usize,
        /// Footprint width in tiles.
        width: u32,
        /// Footprint height in tiles.
        height: u32,
        /// Board width in tiles.
        columns: u32,
        /// Board height in tiles.
        rows: u32,
    },
    /// The lifetime is not strictly positive.
    #[error("profile {index}: lifetime must be positive, got {seconds}s")]
    Lifetime {
        /// Position of the profile in the configuration.
        index: usize,
        /// Configured lifetime.
        seconds: f32,
    },
}
