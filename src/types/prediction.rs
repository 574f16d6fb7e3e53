//! Estimator outputs: chunk predictions, blind and divine results

use serde::{Deserialize, Serialize};

use crate::core::event::Disposable;
use crate::types::{Dimension, Fossil};
use crate::CHUNK_SIZE;

/// Yaw (degrees, 0 = +z, 90 = -x) pointing from one overworld point to another
pub fn yaw_between(from_x: f64, from_z: f64, to_x: f64, to_z: f64) -> f64 {
    (-(to_x - from_x)).atan2(to_z - from_z).to_degrees()
}

/// Candidate stronghold chunk
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkPrediction {
    pub chunk_x: i32,
    pub chunk_z: i32,
    /// Probability mass assigned to this chunk, 0.0-1.0
    pub certainty: f64,
}

impl ChunkPrediction {
    pub fn new(chunk_x: i32, chunk_z: i32, certainty: f64) -> Self {
        Self {
            chunk_x,
            chunk_z,
            certainty,
        }
    }

    /// Chunk containing the overworld block position
    pub fn containing(x: f64, z: f64, certainty: f64) -> Self {
        let size = CHUNK_SIZE as f64;
        Self::new((x / size).floor() as i32, (z / size).floor() as i32, certainty)
    }

    /// Overworld x of the chunk's centre
    pub fn x_in_overworld(&self) -> f64 {
        (self.chunk_x as f64 + 0.5) * CHUNK_SIZE as f64
    }

    /// Overworld z of the chunk's centre
    pub fn z_in_overworld(&self) -> f64 {
        (self.chunk_z as f64 + 0.5) * CHUNK_SIZE as f64
    }

    /// Horizontal distance from an overworld point to the chunk centre
    pub fn distance_from(&self, x: f64, z: f64) -> f64 {
        (self.x_in_overworld() - x).hypot(self.z_in_overworld() - z)
    }

    /// Yaw to face the chunk centre from an overworld point
    pub fn heading_from(&self, x: f64, z: f64) -> f64 {
        yaw_between(x, z, self.x_in_overworld(), self.z_in_overworld())
    }
}

/// Player position used for a blind estimate (player dimension coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlindPosition {
    pub x: f64,
    pub z: f64,
    pub dimension: Dimension,
}

impl BlindPosition {
    pub fn x_in_overworld(&self) -> f64 {
        self.x * self.dimension.overworld_scale()
    }

    pub fn z_in_overworld(&self) -> f64 {
        self.z * self.dimension.overworld_scale()
    }
}

/// Position-only estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlindResult {
    pub position: BlindPosition,
    /// Overworld distance from the world origin
    pub distance_from_origin: f64,
    /// Yaw pointing away from the origin, along the ring's radius
    pub heading_outward: f64,
    /// Is the position inside the first stronghold ring?
    pub in_first_ring: bool,
}

impl Disposable for BlindResult {
    fn dispose(&self) {}
}

/// Fossil-only estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivineResult {
    pub fossil: Fossil,
    /// Yaw from the origin of each first-ring stronghold sector
    pub sector_headings: [f64; 3],
}

impl Disposable for DivineResult {
    fn dispose(&self) {}
}
