//! Session: one player's throws, position, clues and results
//!
//! Routes raw input lines (clipboard F3+C / F3+I text or short commands)
//! to the right component. Unrecognised lines are ignored.

use std::sync::Arc;
use tracing::{debug, info};

use crate::core::calculator::Calculator;
use crate::core::divine_context::DivineContext;
use crate::core::event::Disposable;
use crate::core::lock::{LockableField, ModificationLock};
use crate::core::manager::CalculatorManager;
use crate::core::std_profile::{PreferenceStdProfile, STD_PROFILE_ALT, STD_PROFILE_NORMAL};
use crate::core::throw::Throw;
use crate::core::throw_set::ThrowSet;
use crate::types::{Fossil, Preferences, ResultSnapshot};

/// What an input line did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineOutcome {
    /// New eye throw added (also updates the player position)
    ThrowAdded,
    /// F3+C that only updates the player position (nether or looking down)
    PositionUpdated,
    FossilSet,
    /// Manual correction of the last throw, new total in degrees
    Corrected(f64),
    /// Last throw moved to this std profile
    ProfileChanged(usize),
    Undone,
    Reset,
    /// Not something this session understands
    Ignored,
}

/// Owns every component of one calculation session
pub struct Session {
    preferences: Preferences,
    lock: ModificationLock,
    std_profile: Arc<PreferenceStdProfile>,
    throw_set: Arc<ThrowSet>,
    player_position: Arc<LockableField<Arc<Throw>>>,
    divine_context: Arc<DivineContext>,
    manager: CalculatorManager,
}

impl Session {
    pub fn new(preferences: Preferences, calculator: Arc<dyn Calculator>) -> Self {
        let lock = ModificationLock::new();
        let std_profile = Arc::new(PreferenceStdProfile::from_preferences(&preferences));
        let throw_set = Arc::new(ThrowSet::with_std_profile(&lock, std_profile.clone()));
        let player_position = Arc::new(LockableField::new(&lock));
        let divine_context = Arc::new(DivineContext::new(&lock));
        let manager = CalculatorManager::new(
            calculator,
            Arc::clone(&throw_set),
            player_position.clone(),
            Arc::clone(&divine_context),
            &lock,
        );
        Self {
            preferences,
            lock,
            std_profile,
            throw_set,
            player_position,
            divine_context,
            manager,
        }
    }

    /// Handle one line of input
    pub fn handle_line(&self, line: &str) -> LineOutcome {
        if let Some(throw) =
            Throw::parse_f3c(line, self.preferences.crosshair_correction, &self.lock)
        {
            return self.add_f3c(Arc::new(throw));
        }
        if let Some(fossil) = Fossil::parse_f3i(line) {
            self.divine_context.set_fossil(fossil);
            return LineOutcome::FossilSet;
        }
        match line.trim() {
            "+" => self.correct_last(true),
            "-" => self.correct_last(false),
            "alt" => self.toggle_last_profile(),
            "undo" => match self.throw_set.pop() {
                Some(_) => LineOutcome::Undone,
                None => LineOutcome::Ignored,
            },
            "reset" => {
                self.reset();
                LineOutcome::Reset
            }
            _ => LineOutcome::Ignored,
        }
    }

    fn add_f3c(&self, throw: Arc<Throw>) -> LineOutcome {
        if throw.is_nether() || throw.looking_below_horizon() {
            debug!(%throw, "player position updated");
            self.player_position.set(Some(throw));
            return LineOutcome::PositionUpdated;
        }
        info!(%throw, "throw added");
        let _batch = self.lock.acquire();
        self.throw_set.add(Arc::clone(&throw));
        self.player_position.set(Some(throw));
        LineOutcome::ThrowAdded
    }

    fn correct_last(&self, positive: bool) -> LineOutcome {
        match self.throw_set.last() {
            Some(throw) => {
                throw.add_correction(positive, &self.preferences);
                LineOutcome::Corrected(throw.correction())
            }
            None => LineOutcome::Ignored,
        }
    }

    fn toggle_last_profile(&self) -> LineOutcome {
        match self.throw_set.last() {
            Some(throw) => {
                let next = if throw.std_profile_number() == STD_PROFILE_ALT {
                    STD_PROFILE_NORMAL
                } else {
                    STD_PROFILE_ALT
                };
                throw.set_std_profile_number(next);
                LineOutcome::ProfileChanged(next)
            }
            None => LineOutcome::Ignored,
        }
    }

    /// Forget throws, position and fossil as one batch
    pub fn reset(&self) {
        let _batch = self.lock.acquire();
        self.throw_set.clear();
        self.player_position.set(None);
        self.divine_context.clear_fossil();
    }

    pub fn snapshot(&self) -> ResultSnapshot {
        self.manager.snapshot()
    }

    pub fn manager(&self) -> &CalculatorManager {
        &self.manager
    }

    pub fn throw_set(&self) -> &ThrowSet {
        &self.throw_set
    }

    pub fn std_profile(&self) -> &PreferenceStdProfile {
        &self.std_profile
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }
}

impl Disposable for Session {
    fn dispose(&self) {
        self.manager.dispose();
        self.throw_set.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ray_calculator::RayCalculator;

    fn session() -> Session {
        Session::new(Preferences::default(), Arc::new(RayCalculator::new()))
    }

    #[test]
    fn test_commands_without_throws_are_ignored() {
        let session = session();
        assert_eq!(session.handle_line("+"), LineOutcome::Ignored);
        assert_eq!(session.handle_line("alt"), LineOutcome::Ignored);
        assert_eq!(session.handle_line("undo"), LineOutcome::Ignored);
        assert_eq!(session.handle_line("chat message"), LineOutcome::Ignored);
    }

    #[test]
    fn test_looking_down_only_moves_player() {
        let session = session();
        let outcome = session
            .handle_line("/execute in minecraft:overworld run tp @s 10.0 70.0 10.0 30.0 45.0");
        assert_eq!(outcome, LineOutcome::PositionUpdated);
        assert!(session.throw_set().is_empty());
    }

    #[test]
    fn test_toggle_profile() {
        let session = session();
        session.handle_line("/execute in minecraft:overworld run tp @s 10.0 70.0 10.0 30.0 -31.0");
        assert_eq!(
            session.handle_line("alt"),
            LineOutcome::ProfileChanged(STD_PROFILE_ALT)
        );
        assert_eq!(
            session.handle_line("alt"),
            LineOutcome::ProfileChanged(STD_PROFILE_NORMAL)
        );
    }
}
