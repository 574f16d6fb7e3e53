//! Standard deviation profiles: per-throw error magnitude

use parking_lot::Mutex;
use tracing::debug;

use crate::core::event::Subject;
use crate::core::throw::Throw;
use crate::types::Preferences;

/// Profile used for ordinary throws
pub const STD_PROFILE_NORMAL: usize = 0;

/// Alternative profile (e.g. throws aimed with a different setup)
pub const STD_PROFILE_ALT: usize = 1;

/// Profile for throws whose bearing was typed in by hand
pub const STD_PROFILE_MANUAL: usize = 2;

/// Source of a throw's error magnitude, selectable by profile number
pub trait StdProfile: Send + Sync {
    /// Standard deviation (degrees) of profile `profile_number`
    fn std(&self, profile_number: usize) -> f64;

    /// Profile a freshly bound throw starts on
    fn initial_profile_number(&self, throw: &Throw) -> usize;

    /// Fires whenever any profile's value changes
    fn when_modified(&self) -> &Subject<()>;
}

/// Profile backed by the sigma preferences
#[derive(Debug)]
pub struct PreferenceStdProfile {
    sigmas: Mutex<[f64; 3]>,
    modified: Subject<()>,
}

impl PreferenceStdProfile {
    pub fn from_preferences(preferences: &Preferences) -> Self {
        Self {
            sigmas: Mutex::new([
                preferences.sigma,
                preferences.sigma_alt,
                preferences.sigma_manual,
            ]),
            modified: Subject::new(),
        }
    }

    /// Change one profile's sigma; subscribers hear about actual changes only
    pub fn set_sigma(&self, profile_number: usize, sigma: f64) {
        {
            let mut sigmas = self.sigmas.lock();
            let Some(slot) = sigmas.get_mut(profile_number) else {
                return;
            };
            if *slot == sigma {
                return;
            }
            *slot = sigma;
        }
        debug!(profile_number, sigma, "std profile changed");
        self.modified.notify(&());
    }
}

impl StdProfile for PreferenceStdProfile {
    fn std(&self, profile_number: usize) -> f64 {
        let sigmas = self.sigmas.lock();
        sigmas
            .get(profile_number)
            .copied()
            .unwrap_or(sigmas[STD_PROFILE_NORMAL])
    }

    fn initial_profile_number(&self, _throw: &Throw) -> usize {
        STD_PROFILE_NORMAL
    }

    fn when_modified(&self) -> &Subject<()> {
        &self.modified
    }
}
