//! CalculatorManager: keeps the full, blind and divine results current
//!
//! Triggers:
//! - throw set modified → full, blind, divine
//! - player position changed → blind, divine
//! - fossil changed → full, blind, divine
//!
//! Mode selection (blind / divine need an empty throw set):
//! - throws present → neither
//! - no player position → divine
//! - player in the nether → blind
//! - player elsewhere → divine

use chrono::Utc;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info};

use crate::core::calculator::{Calculator, FullResult};
use crate::core::divine_context::DivineContext;
use crate::core::event::{Disposable, DisposeHandler, Observable};
use crate::core::lock::{LockableField, ModificationLock};
use crate::core::throw::Throw;
use crate::core::throw_set::ThrowSet;
use crate::core::top_prediction::TopPredictionProvider;
use crate::types::{
    BlindPosition, BlindResult, ChunkPrediction, Dimension, DivineResult, ResultSnapshot,
};

/// Which position-free estimates apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSelection {
    pub blind: bool,
    pub divine: bool,
}

impl ModeSelection {
    /// `player_dimension` is `None` when there is no player position
    pub fn select(throw_set_empty: bool, player_dimension: Option<Dimension>) -> Self {
        if !throw_set_empty {
            return Self {
                blind: false,
                divine: false,
            };
        }
        let in_nether = player_dimension.map_or(false, |d| d.is_nether());
        Self {
            blind: in_nether,
            divine: !in_nether,
        }
    }
}

struct ManagerState {
    calculator: RwLock<Arc<dyn Calculator>>,
    throw_set: Arc<ThrowSet>,
    player_position: Arc<dyn Observable<Arc<Throw>>>,
    divine_context: Arc<DivineContext>,
    calculator_result: LockableField<FullResult>,
    blind_result: LockableField<Arc<BlindResult>>,
    divine_result: LockableField<Arc<DivineResult>>,
}

impl ManagerState {
    fn calculator(&self) -> Arc<dyn Calculator> {
        Arc::clone(&self.calculator.read())
    }

    fn modes(&self) -> (ModeSelection, Option<Arc<Throw>>) {
        let position = self.player_position.get();
        let modes = ModeSelection::select(
            self.throw_set.is_empty(),
            position.as_ref().map(|p| p.dimension()),
        );
        (modes, position)
    }

    fn on_throw_set_modified(&self) {
        debug!(throws = self.throw_set.len(), "throw set modified");
        self.update_all();
    }

    fn on_player_position_changed(&self) {
        debug!("player position changed");
        self.update_blind_result();
        self.update_divine_result();
    }

    fn on_fossil_changed(&self) {
        debug!("fossil changed");
        self.update_all();
    }

    fn update_all(&self) {
        self.update_calculator_result();
        self.update_blind_result();
        self.update_divine_result();
    }

    fn update_calculator_result(&self) {
        let result = self.calculator().triangulate(
            &self.throw_set,
            self.player_position.as_ref(),
            &self.divine_context,
        );
        debug!(present = result.is_some(), "full result recomputed");
        self.calculator_result.replace_disposing(result);
    }

    fn update_blind_result(&self) {
        let result = match self.modes() {
            (ModeSelection { blind: true, .. }, Some(position)) => self
                .calculator()
                .blind(BlindPosition::from(position.as_ref()), &self.divine_context),
            _ => None,
        };
        debug!(present = result.is_some(), "blind result recomputed");
        self.blind_result.replace_disposing(result);
    }

    fn update_divine_result(&self) {
        let result = match self.modes() {
            (ModeSelection { divine: true, .. }, _) => {
                self.calculator().divine(&self.divine_context)
            }
            _ => None,
        };
        debug!(present = result.is_some(), "divine result recomputed");
        self.divine_result.replace_disposing(result);
    }
}

/// Reactive owner of the estimator results
pub struct CalculatorManager {
    state: Arc<ManagerState>,
    top_prediction_provider: Arc<TopPredictionProvider>,
    dispose_handler: DisposeHandler,
    lock: ModificationLock,
    disposed: AtomicBool,
}

impl CalculatorManager {
    /// Subscribe to the throw set, the player position and the fossil. No
    /// result is computed until the first upstream change or `set_calculator`.
    pub fn new(
        calculator: Arc<dyn Calculator>,
        throw_set: Arc<ThrowSet>,
        player_position: Arc<dyn Observable<Arc<Throw>>>,
        divine_context: Arc<DivineContext>,
        lock: &ModificationLock,
    ) -> Self {
        let state = Arc::new(ManagerState {
            calculator: RwLock::new(calculator),
            throw_set,
            player_position,
            divine_context,
            calculator_result: LockableField::new(lock),
            blind_result: LockableField::new(lock),
            divine_result: LockableField::new(lock),
        });

        let dispose_handler = DisposeHandler::new();

        let weak: Weak<ManagerState> = Arc::downgrade(&state);
        dispose_handler.add(state.throw_set.when_modified().subscribe(move |_| {
            if let Some(state) = weak.upgrade() {
                state.on_throw_set_modified();
            }
        }));

        let weak: Weak<ManagerState> = Arc::downgrade(&state);
        dispose_handler.add(state.player_position.subscribe(Box::new(move |_| {
            if let Some(state) = weak.upgrade() {
                state.on_player_position_changed();
            }
        })));

        let weak: Weak<ManagerState> = Arc::downgrade(&state);
        dispose_handler.add(state.divine_context.fossil().subscribe(Box::new(move |_| {
            if let Some(state) = weak.upgrade() {
                state.on_fossil_changed();
            }
        })));

        let top_prediction_provider =
            Arc::new(TopPredictionProvider::new(&state.calculator_result, lock));
        dispose_handler.add(Arc::clone(&top_prediction_provider));

        Self {
            state,
            top_prediction_provider,
            dispose_handler,
            lock: lock.clone(),
            disposed: AtomicBool::new(false),
        }
    }

    /// Swap the estimator and recompute every result with it
    pub fn set_calculator(&self, calculator: Arc<dyn Calculator>) {
        info!("calculator replaced");
        *self.state.calculator.write() = calculator;
        self.state.update_all();
    }

    pub fn calculator_result(&self) -> &dyn Observable<FullResult> {
        &self.state.calculator_result
    }

    pub fn top_prediction(&self) -> &dyn Observable<ChunkPrediction> {
        self.top_prediction_provider.top_prediction()
    }

    pub fn blind_result(&self) -> &dyn Observable<Arc<BlindResult>> {
        &self.state.blind_result
    }

    pub fn divine_result(&self) -> &dyn Observable<Arc<DivineResult>> {
        &self.state.divine_result
    }

    /// Read the throws and every result slot under the shared lock
    pub fn snapshot(&self) -> ResultSnapshot {
        let _guard = self.lock.acquire();
        let top_prediction = self.top_prediction().get();
        let top_heading = top_prediction.zip(self.state.player_position.get()).map(
            |(top, player)| top.heading_from(player.x_in_overworld(), player.z_in_overworld()),
        );
        ResultSnapshot {
            timestamp: Utc::now(),
            throws: self
                .state
                .throw_set
                .throws()
                .iter()
                .map(|t| t.summary())
                .collect(),
            predictions: self.state.calculator_result.get().map(|r| r.predictions()),
            top_prediction,
            top_heading,
            blind: self.state.blind_result.get().map(|r| (*r).clone()),
            divine: self.state.divine_result.get().map(|r| (*r).clone()),
        }
    }
}

impl Disposable for CalculatorManager {
    /// Release upstream subscriptions and every held result. Idempotent.
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.dispose_handler.dispose();
        self.state.calculator_result.dispose_value();
        self.state.blind_result.dispose_value();
        self.state.divine_result.dispose_value();
        info!("calculator manager disposed");
    }
}

impl Drop for CalculatorManager {
    fn drop(&mut self) {
        self.dispose();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_table() {
        use Dimension::{Nether, Overworld};

        let neither = ModeSelection {
            blind: false,
            divine: false,
        };
        let blind = ModeSelection {
            blind: true,
            divine: false,
        };
        let divine = ModeSelection {
            blind: false,
            divine: true,
        };

        assert_eq!(ModeSelection::select(false, None), neither);
        assert_eq!(ModeSelection::select(false, Some(Nether)), neither);
        assert_eq!(ModeSelection::select(false, Some(Overworld)), neither);
        assert_eq!(ModeSelection::select(true, None), divine);
        assert_eq!(ModeSelection::select(true, Some(Nether)), blind);
        assert_eq!(ModeSelection::select(true, Some(Overworld)), divine);
    }

    #[test]
    fn test_blind_and_divine_never_both() {
        for empty in [true, false] {
            for dimension in [None, Some(Dimension::Nether), Some(Dimension::Overworld)] {
                let modes = ModeSelection::select(empty, dimension);
                assert!(!(modes.blind && modes.divine));
            }
        }
    }
}
