//! eyecalc: eye of ender throw calibration and reactive result tracking
//!
//! F3+C line → Throw → ThrowSet → CalculatorManager → observable results

pub mod core;
pub mod logging;
pub mod types;

// =============================================================================
// F3+C FORMAT
// =============================================================================

/// Prefix of an F3+C line taken in the overworld
pub const F3C_OVERWORLD_PREFIX: &str = "/execute in minecraft:overworld run tp @s";

/// Prefix of an F3+C line taken in the nether
pub const F3C_NETHER_PREFIX: &str = "/execute in minecraft:the_nether run tp @s";

/// Dimension token (index 2) of a nether F3+C line
pub const F3C_NETHER_DIMENSION: &str = "minecraft:the_nether";

/// Number of space separated tokens in a valid F3+C line
pub const F3C_TOKEN_COUNT: usize = 11;

// =============================================================================
// CALIBRATION [C] - empirically determined
// =============================================================================

/// Lens distortion amplitude in degrees. Exact cause unknown.
pub const LENS_CORRECTION_K: f64 = 0.00079;

/// Phase offset of the lens distortion term in degrees
pub const LENS_CORRECTION_PHASE: f64 = 45.0;

/// Default manual correction step in degrees
pub const DEFAULT_CORRECTION_STEP: f64 = 0.01;

/// Half of the vertical field of view used by tall resolution (degrees)
pub const TALL_RES_HALF_FOV: f64 = 15.0;

// =============================================================================
// GEOMETRY
// =============================================================================

/// Nether to overworld coordinate scale
pub const NETHER_SCALE: f64 = 8.0;

/// Blocks per chunk side
pub const CHUNK_SIZE: i32 = 16;

/// Distance of the world border from the origin along either axis (overworld blocks)
pub const WORLD_BORDER: f64 = 29_999_984.0;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
