//! RayCalculator: simple reference estimator
//!
//! Full: weighted least-squares intersection of the throw rays.
//! Blind: distance and outward heading relative to the world origin.
//! Divine: three first-ring sectors, 120° apart, offset by the fossil.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::core::calculator::{Calculator, CalculatorResult, FullResult};
use crate::core::divine_context::DivineContext;
use crate::core::event::{Disposable, Observable};
use crate::core::throw::{normalize_angle, Throw};
use crate::core::throw_set::ThrowSet;
use crate::types::{
    yaw_between, BlindPosition, BlindResult, ChunkPrediction, DivineResult,
};
use crate::{CHUNK_SIZE, WORLD_BORDER};

/// Std assumed for throws that are not bound to a profile (degrees)
pub const FALLBACK_SIGMA: f64 = 0.1;

/// Inner radius of the first stronghold ring (overworld blocks)
pub const FIRST_RING_INNER: f64 = 1280.0;

/// Outer radius of the first stronghold ring (overworld blocks)
pub const FIRST_RING_OUTER: f64 = 2816.0;

/// Rays closer to parallel than this cannot be intersected
const MIN_DETERMINANT: f64 = 1e-9;

struct Ray {
    x: f64,
    z: f64,
    dx: f64,
    dz: f64,
    alpha: f64,
    sigma: f64,
}

impl Ray {
    fn from_throw(throw: &Throw) -> Self {
        let alpha = throw.alpha();
        let radians = alpha.to_radians();
        let std = throw.std();
        Self {
            x: throw.x_in_overworld(),
            z: throw.z_in_overworld(),
            dx: -radians.sin(),
            dz: radians.cos(),
            alpha,
            sigma: if std > 0.0 { std } else { FALLBACK_SIGMA },
        }
    }
}

/// Full result of the ray estimator
#[derive(Debug)]
pub struct RayResult {
    predictions: Vec<ChunkPrediction>,
    disposed: AtomicBool,
}

impl RayResult {
    pub fn new(predictions: Vec<ChunkPrediction>) -> Self {
        Self {
            predictions,
            disposed: AtomicBool::new(false),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl CalculatorResult for RayResult {
    fn predictions(&self) -> Vec<ChunkPrediction> {
        self.predictions.clone()
    }
}

impl Disposable for RayResult {
    fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }
}

/// Reference estimator
#[derive(Debug, Default)]
pub struct RayCalculator;

impl RayCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Least-squares intersection in overworld coordinates, or `None` when the
    /// rays are parallel, the point lies behind a throw or outside the world border
    fn intersect(rays: &[Ray]) -> Option<(f64, f64)> {
        let (mut a00, mut a01, mut a11, mut b0, mut b1) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for ray in rays {
            let w = 1.0 / (ray.sigma * ray.sigma);
            // projection onto the ray's normal: I - d dᵀ
            let p00 = 1.0 - ray.dx * ray.dx;
            let p01 = -ray.dx * ray.dz;
            let p11 = 1.0 - ray.dz * ray.dz;
            a00 += w * p00;
            a01 += w * p01;
            a11 += w * p11;
            b0 += w * (p00 * ray.x + p01 * ray.z);
            b1 += w * (p01 * ray.x + p11 * ray.z);
        }
        let det = a00 * a11 - a01 * a01;
        if det.abs() < MIN_DETERMINANT {
            return None;
        }
        let x = (a11 * b0 - a01 * b1) / det;
        let z = (a00 * b1 - a01 * b0) / det;
        if !(x.abs() <= WORLD_BORDER && z.abs() <= WORLD_BORDER) {
            debug!(x, z, "intersection outside the world border");
            return None;
        }

        let in_front = rays
            .iter()
            .all(|ray| (x - ray.x) * ray.dx + (z - ray.z) * ray.dz > 0.0);
        in_front.then_some((x, z))
    }

    /// Mean squared angular residual in units of each throw's sigma
    fn mean_chi_squared(rays: &[Ray], x: f64, z: f64) -> f64 {
        let total: f64 = rays
            .iter()
            .map(|ray| {
                let error = normalize_angle(yaw_between(ray.x, ray.z, x, z) - ray.alpha);
                (error / ray.sigma).powi(2)
            })
            .sum();
        total / rays.len() as f64
    }

    /// The 3x3 chunks around the intersection, weighted by a gaussian whose
    /// width grows with distance and angular uncertainty
    fn neighbourhood(rays: &[Ray], x: f64, z: f64, consistency: f64) -> Vec<ChunkPrediction> {
        let n = rays.len() as f64;
        let mean_distance = rays.iter().map(|r| (x - r.x).hypot(z - r.z)).sum::<f64>() / n;
        let mean_sigma = rays.iter().map(|r| r.sigma).sum::<f64>() / n;
        let spread = (mean_distance * mean_sigma.to_radians()).max(1.0);

        let centre = ChunkPrediction::containing(x, z, 0.0);
        let mut predictions = Vec::with_capacity(9);
        for offset_x in -1..=1 {
            for offset_z in -1..=1 {
                let mut candidate =
                    ChunkPrediction::new(centre.chunk_x + offset_x, centre.chunk_z + offset_z, 0.0);
                let d = candidate.distance_from(x, z) / spread;
                candidate.certainty = (-0.5 * d * d).exp();
                predictions.push(candidate);
            }
        }
        let total: f64 = predictions.iter().map(|p| p.certainty).sum();
        for prediction in &mut predictions {
            prediction.certainty = prediction.certainty / total * consistency;
        }
        predictions
    }
}

impl Calculator for RayCalculator {
    fn triangulate(
        &self,
        throws: &ThrowSet,
        _player_position: &dyn Observable<Arc<Throw>>,
        _divine_context: &DivineContext,
    ) -> Option<FullResult> {
        let rays: Vec<Ray> = throws.throws().iter().map(|t| Ray::from_throw(t)).collect();
        if rays.len() < 2 {
            return None;
        }
        let (x, z) = Self::intersect(&rays)?;
        let consistency = (-0.5 * Self::mean_chi_squared(&rays, x, z)).exp();
        debug!(x, z, consistency, throws = rays.len(), "rays intersected");

        let predictions = Self::neighbourhood(&rays, x, z, consistency);
        Some(Arc::new(RayResult::new(predictions)))
    }

    fn blind(
        &self,
        position: BlindPosition,
        _divine_context: &DivineContext,
    ) -> Option<Arc<BlindResult>> {
        let x = position.x_in_overworld();
        let z = position.z_in_overworld();
        let distance = x.hypot(z);
        Some(Arc::new(BlindResult {
            position,
            distance_from_origin: distance,
            heading_outward: yaw_between(0.0, 0.0, x, z),
            in_first_ring: (FIRST_RING_INNER..=FIRST_RING_OUTER).contains(&distance),
        }))
    }

    fn divine(&self, divine_context: &DivineContext) -> Option<Arc<DivineResult>> {
        let fossil = divine_context.current_fossil()?;
        let sector = 120.0 / CHUNK_SIZE as f64;
        let base = (fossil.x_in_chunk() as f64 + 0.5) * sector;
        Some(Arc::new(DivineResult {
            fossil,
            sector_headings: [
                normalize_angle(base),
                normalize_angle(base + 120.0),
                normalize_angle(base + 240.0),
            ],
        }))
    }
}

// =============================================================================
// TESTS
// =============================================================================
