//! Estimator contract
//!
//! The manager only knows these traits. An estimator may return `None` for
//! any mode; that outcome is published as-is.

use std::fmt;
use std::sync::Arc;

use crate::core::divine_context::DivineContext;
use crate::core::event::{Disposable, Observable};
use crate::core::throw::Throw;
use crate::core::throw_set::ThrowSet;
use crate::types::{BlindPosition, BlindResult, ChunkPrediction, DivineResult};

/// Result of a full triangulation. May hold subscriptions of its own, which
/// `dispose` must release.
pub trait CalculatorResult: Disposable + Send + Sync + fmt::Debug {
    /// Candidate chunks, in no particular order
    fn predictions(&self) -> Vec<ChunkPrediction>;

    /// Most likely chunk, if any
    fn best_prediction(&self) -> Option<ChunkPrediction> {
        top_ranked(&self.predictions())
    }
}

/// Shared handle to a full result
pub type FullResult = Arc<dyn CalculatorResult>;

/// Geometric estimator
pub trait Calculator: Send + Sync {
    /// Full estimate from the throws, the player position and the clues
    fn triangulate(
        &self,
        throws: &ThrowSet,
        player_position: &dyn Observable<Arc<Throw>>,
        divine_context: &DivineContext,
    ) -> Option<FullResult>;

    /// Position-only estimate
    fn blind(
        &self,
        position: BlindPosition,
        divine_context: &DivineContext,
    ) -> Option<Arc<BlindResult>>;

    /// Clue-only estimate
    fn divine(&self, divine_context: &DivineContext) -> Option<Arc<DivineResult>>;
}

/// Highest-certainty prediction; the first one wins ties
pub fn top_ranked(predictions: &[ChunkPrediction]) -> Option<ChunkPrediction> {
    predictions.iter().copied().fold(None, |best, candidate| match best {
        Some(best) if best.certainty >= candidate.certainty => Some(best),
        _ => Some(candidate),
    })
}
