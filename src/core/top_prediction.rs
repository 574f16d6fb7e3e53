//! Publishes the best chunk of the current full result

use std::sync::Arc;

use crate::core::calculator::FullResult;
use crate::core::event::{Disposable, Observable, Subscription};
use crate::core::lock::{LockableField, ModificationLock};
use crate::types::ChunkPrediction;

/// Follows a full-result field and republishes its top-ranked chunk
#[derive(Debug)]
pub struct TopPredictionProvider {
    top_prediction: Arc<LockableField<ChunkPrediction>>,
    subscription: Subscription,
}

impl TopPredictionProvider {
    pub fn new(calculator_result: &LockableField<FullResult>, lock: &ModificationLock) -> Self {
        let top_prediction = Arc::new(LockableField::new(lock));
        top_prediction.set(Self::rank(&calculator_result.get()));

        let sink = Arc::clone(&top_prediction);
        let subscription = calculator_result.subscribe(move |result| {
            sink.set(Self::rank(result));
        });
        Self {
            top_prediction,
            subscription,
        }
    }

    fn rank(result: &Option<FullResult>) -> Option<ChunkPrediction> {
        result.as_ref().and_then(|result| result.best_prediction())
    }

    pub fn top_prediction(&self) -> &dyn Observable<ChunkPrediction> {
        self.top_prediction.as_ref()
    }
}

impl Disposable for TopPredictionProvider {
    fn dispose(&self) {
        self.subscription.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ray_calculator::RayResult;

    #[test]
    fn test_follows_full_result() {
        let lock = ModificationLock::new();
        let full = LockableField::<FullResult>::new(&lock);
        let provider = TopPredictionProvider::new(&full, &lock);
        assert_eq!(provider.top_prediction().get(), None);

        full.set(Some(Arc::new(RayResult::new(vec![
            ChunkPrediction::new(1, 1, 0.1),
            ChunkPrediction::new(2, 2, 0.7),
        ]))));
        assert_eq!(
            provider.top_prediction().get(),
            Some(ChunkPrediction::new(2, 2, 0.7))
        );

        full.set(None);
        assert_eq!(provider.top_prediction().get(), None);
    }

    #[test]
    fn test_dispose_stops_following() {
        let lock = ModificationLock::new();
        let full = LockableField::<FullResult>::new(&lock);
        let provider = TopPredictionProvider::new(&full, &lock);
        provider.dispose();
        provider.dispose();
        assert_eq!(full.subscriber_count(), 0);

        full.set(Some(Arc::new(RayResult::new(vec![ChunkPrediction::new(1, 1, 1.0)]))));
        assert_eq!(provider.top_prediction().get(), None);
    }
}
