//! Throw: one eye of ender bearing measurement
//!
//! Raw F3+C bearing → crosshair offset → lens correction → normalized
//! bearing, plus a user-applied manual correction and an error magnitude
//! (std) looked up from a bound `StdProfile`.

use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

use crate::core::event::{Disposable, Subject, Subscription};
use crate::core::lock::ModificationLock;
use crate::core::std_profile::StdProfile;
use crate::types::{BlindPosition, Dimension, Preferences, ThrowSummary};
use crate::{
    DEFAULT_CORRECTION_STEP, F3C_NETHER_DIMENSION, F3C_NETHER_PREFIX, F3C_OVERWORLD_PREFIX,
    F3C_TOKEN_COUNT, LENS_CORRECTION_K, LENS_CORRECTION_PHASE, TALL_RES_HALF_FOV,
};

/// Bring an angle into (-180°, 180°]
pub fn normalize_angle(alpha: f64) -> f64 {
    let alpha = alpha % 360.0;
    if alpha <= -180.0 {
        alpha + 360.0
    } else if alpha > 180.0 {
        alpha - 360.0
    } else {
        alpha
    }
}

/// Apply the crosshair offset and the empirical lens correction to a raw bearing
pub fn precise_alpha(raw_alpha: f64, crosshair_correction: f64) -> f64 {
    let alpha = raw_alpha + crosshair_correction;
    alpha - LENS_CORRECTION_K * (alpha + LENS_CORRECTION_PHASE).to_radians().sin()
}

#[derive(Default)]
struct ThrowState {
    correction: f64,
    std: f64,
    std_profile_number: usize,
    std_profile: Option<Arc<dyn StdProfile>>,
    std_profile_subscription: Option<Subscription>,
}

/// An eye of ender throw
pub struct Throw {
    x: f64,
    y: f64,
    z: f64,
    raw_alpha: f64,
    alpha_0: f64,
    beta: f64,
    dimension: Dimension,
    state: Mutex<ThrowState>,
    modified: Subject<()>,
    lock: ModificationLock,
}

impl Throw {
    /// Throw whose bearing needs no correction
    pub fn new(
        x: f64,
        y: f64,
        z: f64,
        alpha: f64,
        beta: f64,
        dimension: Dimension,
        lock: &ModificationLock,
    ) -> Self {
        Self::with_raw(x, y, z, alpha, alpha, beta, dimension, lock)
    }

    /// Throw keeping the raw bearing next to an already corrected one
    #[allow(clippy::too_many_arguments)]
    pub fn with_raw(
        x: f64,
        y: f64,
        z: f64,
        raw_alpha: f64,
        alpha: f64,
        beta: f64,
        dimension: Dimension,
        lock: &ModificationLock,
    ) -> Self {
        Self {
            x,
            y,
            z,
            raw_alpha,
            alpha_0: normalize_angle(alpha),
            beta,
            dimension,
            state: Mutex::new(ThrowState::default()),
            modified: Subject::new(),
            lock: lock.clone(),
        }
    }

    /// Parse an F3+C line. Anything that is not a well formed F3+C line,
    /// trailing line endings included, yields `None`; such lines are expected
    /// and are not errors.
    pub fn parse_f3c(
        line: &str,
        crosshair_correction: f64,
        lock: &ModificationLock,
    ) -> Option<Throw> {
        if !(line.starts_with(F3C_OVERWORLD_PREFIX) || line.starts_with(F3C_NETHER_PREFIX)) {
            trace!("ignoring non F3+C line");
            return None;
        }
        let tokens: Vec<&str> = line.split(' ').collect();
        if tokens.len() != F3C_TOKEN_COUNT {
            trace!(tokens = tokens.len(), "ignoring F3+C line with wrong token count");
            return None;
        }
        let number = |index: usize| -> Option<f64> {
            tokens[index].parse::<f64>().ok().filter(|v| v.is_finite())
        };

        let dimension = if tokens[2] == F3C_NETHER_DIMENSION {
            Dimension::Nether
        } else {
            Dimension::Overworld
        };
        let x = number(6)?;
        let y = number(7)?;
        let z = number(8)?;
        let raw_alpha = number(9)?;
        let beta = number(10)?;

        let alpha = precise_alpha(raw_alpha, crosshair_correction);
        Some(Throw::with_raw(x, y, z, raw_alpha, alpha, beta, dimension, lock))
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Bearing used by estimators: calibrated bearing plus manual correction
    pub fn alpha(&self) -> f64 {
        self.alpha_0 + self.correction()
    }

    /// Calibrated, normalized bearing without manual correction
    pub fn alpha_0(&self) -> f64 {
        self.alpha_0
    }

    /// Bearing exactly as read from the F3+C line
    pub fn raw_alpha(&self) -> f64 {
        self.raw_alpha
    }

    /// Pitch
    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn looking_below_horizon(&self) -> bool {
        self.beta > 0.0
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn is_nether(&self) -> bool {
        self.dimension.is_nether()
    }

    pub fn x_in_overworld(&self) -> f64 {
        self.x * self.dimension.overworld_scale()
    }

    pub fn z_in_overworld(&self) -> f64 {
        self.z * self.dimension.overworld_scale()
    }

    pub fn x_in_player_dimension(&self) -> f64 {
        self.x
    }

    pub fn y_in_player_dimension(&self) -> f64 {
        self.y
    }

    pub fn z_in_player_dimension(&self) -> f64 {
        self.z
    }

    // =========================================================================
    // Manual correction
    // =========================================================================

    pub fn correction(&self) -> f64 {
        self.state.lock().correction
    }

    /// Nudge the bearing by one step.
    ///
    /// With tall resolution a step is one vertical pixel of aiming error at the
    /// 30° field of view, converted to a bearing error at this throw's pitch.
    pub fn add_correction(&self, positive: bool, preferences: &Preferences) {
        let mut change = DEFAULT_CORRECTION_STEP;
        if preferences.use_tall_res {
            let pixel = (2.0 * TALL_RES_HALF_FOV.to_radians().tan()
                / preferences.resolution_height as f64)
                .atan();
            change = (pixel / self.beta.to_radians().cos()).to_degrees();
        }
        if !positive {
            change = -change;
        }
        let correction = {
            let mut state = self.state.lock();
            state.correction += change;
            state.correction
        };
        debug!(change, correction, "manual correction applied");
        self.notify_modified();
    }

    // =========================================================================
    // Std profile
    // =========================================================================

    /// Error magnitude from the bound profile (0.0 while unbound)
    pub fn std(&self) -> f64 {
        self.state.lock().std
    }

    pub fn std_profile_number(&self) -> usize {
        self.state.lock().std_profile_number
    }

    pub fn set_std_profile_number(&self, profile_number: usize) {
        self.state.lock().std_profile_number = profile_number;
        self.update_std();
    }

    /// Bind to `profile`, replacing any previous binding and its subscription
    pub fn set_std_profile(self: &Arc<Self>, profile: Arc<dyn StdProfile>) {
        let previous = self.state.lock().std_profile_subscription.take();
        if let Some(previous) = previous {
            previous.dispose();
        }

        let weak: Weak<Throw> = Arc::downgrade(self);
        let subscription = profile.when_modified().subscribe(move |_| {
            if let Some(throw) = weak.upgrade() {
                throw.update_std();
            }
        });
        {
            let mut state = self.state.lock();
            state.std_profile = Some(Arc::clone(&profile));
            state.std_profile_subscription = Some(subscription);
        }
        self.set_std_profile_number(profile.initial_profile_number(self));
    }

    fn update_std(&self) {
        let (profile, profile_number) = {
            let state = self.state.lock();
            match &state.std_profile {
                Some(profile) => (Arc::clone(profile), state.std_profile_number),
                None => return,
            }
        };
        let std = profile.std(profile_number);
        {
            let mut state = self.state.lock();
            if state.std == std {
                return;
            }
            state.std = std;
        }
        self.notify_modified();
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Fires after a correction or std change
    pub fn when_modified(&self) -> &Subject<()> {
        &self.modified
    }

    fn notify_modified(&self) {
        let subject = self.modified.clone();
        self.lock.notify_when_released(move || subject.notify(&()));
    }

    /// Serializable view of this throw
    pub fn summary(&self) -> ThrowSummary {
        ThrowSummary {
            x: self.x,
            y: self.y,
            z: self.z,
            dimension: self.dimension,
            raw_alpha: self.raw_alpha,
            alpha: self.alpha(),
            beta: self.beta,
            correction: self.correction(),
            std: self.std(),
        }
    }
}

impl Disposable for Throw {
    fn dispose(&self) {
        let subscription = self.state.lock().std_profile_subscription.take();
        if let Some(subscription) = subscription {
            subscription.dispose();
        }
    }
}

impl From<&Throw> for BlindPosition {
    fn from(throw: &Throw) -> Self {
        BlindPosition {
            x: throw.x_in_player_dimension(),
            z: throw.z_in_player_dimension(),
            dimension: throw.dimension(),
        }
    }
}

impl fmt::Display for Throw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x={}, z={}, alpha={}", self.x, self.z, self.alpha_0)
    }
}

impl fmt::Debug for Throw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throw")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("z", &self.z)
            .field("raw_alpha", &self.raw_alpha)
            .field("alpha_0", &self.alpha_0)
            .field("beta", &self.beta)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::std_profile::{PreferenceStdProfile, STD_PROFILE_ALT};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const LINE: &str = "/execute in minecraft:overworld run tp @s 100.5 65.0 -200.25 45.0 10.0";

    fn counter(throw: &Throw) -> (Arc<AtomicUsize>, Subscription) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let subscription = throw.when_modified().subscribe(move |_| {
            inner.fetch_add(1, Ordering::SeqCst);
        });
        (count, subscription)
    }

    #[test]
    fn test_normalize_range() {
        let mut raw = -10000.0;
        while raw <= 10000.0 {
            let alpha = normalize_angle(raw);
            assert!(alpha > -180.0 && alpha <= 180.0, "{} -> {}", raw, alpha);
            raw += 0.37;
        }
    }

    #[test]
    fn test_normalize_boundaries() {
        assert_eq!(normalize_angle(-180.0), 180.0);
        assert_eq!(normalize_angle(180.0), 180.0);
        assert_eq!(normalize_angle(540.0), 180.0);
        assert_eq!(normalize_angle(-190.0), 170.0);
        assert_eq!(normalize_angle(190.0), -170.0);
    }

    #[test]
    fn test_calibrated_bearing_normalized() {
        let lock = ModificationLock::new();
        let mut raw = -10000.0;
        while raw <= 10000.0 {
            let throw = Throw::with_raw(
                0.0,
                0.0,
                0.0,
                raw,
                precise_alpha(raw, 0.0),
                0.0,
                Dimension::Overworld,
                &lock,
            );
            assert!(throw.alpha_0() > -180.0 && throw.alpha_0() <= 180.0);
            assert_eq!(throw.raw_alpha(), raw);
            raw += 1.3;
        }
    }

    #[test]
    fn test_lens_correction() {
        // sin(45° + 45°) = 1
        let alpha = precise_alpha(45.0, 0.0);
        assert!((alpha - (45.0 - LENS_CORRECTION_K)).abs() < 1e-12);

        // crosshair offset is applied before the lens term
        let alpha = precise_alpha(40.0, 5.0);
        assert!((alpha - (45.0 - LENS_CORRECTION_K)).abs() < 1e-12);

        // sin(-45° + 45°) = 0
        assert!((precise_alpha(-45.0, 0.0) + 45.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_f3c() {
        let lock = ModificationLock::new();
        let throw = Throw::parse_f3c(LINE, 0.0, &lock).unwrap();
        assert_eq!(throw.dimension(), Dimension::Overworld);
        assert_eq!(throw.x_in_player_dimension(), 100.5);
        assert_eq!(throw.y_in_player_dimension(), 65.0);
        assert_eq!(throw.z_in_player_dimension(), -200.25);
        assert_eq!(throw.raw_alpha(), 45.0);
        assert_eq!(throw.beta(), 10.0);
        assert_eq!(throw.correction(), 0.0);
        assert!((throw.alpha() - precise_alpha(45.0, 0.0)).abs() < 1e-12);
    }

    #[test]
    fn test_parse_nether() {
        let lock = ModificationLock::new();
        let line = "/execute in minecraft:the_nether run tp @s 12.0 64.0 -8.0 -170.0 0.0";
        let throw = Throw::parse_f3c(line, 0.0, &lock).unwrap();
        assert_eq!(throw.dimension(), Dimension::Nether);
        assert_eq!(throw.x_in_overworld(), 96.0);
        assert_eq!(throw.z_in_overworld(), -64.0);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let lock = ModificationLock::new();
        let missing = "/execute in minecraft:overworld run tp @s 100.5 65.0 -200.25 45.0";
        let garbage = "/execute in minecraft:overworld run tp @s abc 65.0 -200.25 45.0 10.0";
        let extra = "/execute in minecraft:overworld run tp @s 1 2 3 4 5 6";
        let end = "/execute in minecraft:the_end run tp @s 1.0 2.0 3.0 4.0 5.0";
        for line in [missing, garbage, extra, end, "", "hello there"] {
            assert!(Throw::parse_f3c(line, 0.0, &lock).is_none(), "{}", line);
        }
    }

    #[test]
    fn test_parse_rejects_non_finite() {
        let lock = ModificationLock::new();
        let line = "/execute in minecraft:overworld run tp @s 1.0 2.0 3.0 NaN 5.0";
        assert!(Throw::parse_f3c(line, 0.0, &lock).is_none());
    }

    #[test]
    fn test_parse_rejects_trailing_characters() {
        let lock = ModificationLock::new();
        for suffix in ["\r\n", "\n", " "] {
            let line = format!("{}{}", LINE, suffix);
            assert!(Throw::parse_f3c(&line, 0.0, &lock).is_none(), "{:?}", suffix);
        }
    }

    #[test]
    fn test_correction_round_trip() {
        let lock = ModificationLock::new();
        let throw = Throw::parse_f3c(LINE, 0.0, &lock).unwrap();
        let preferences = Preferences::default();

        throw.add_correction(true, &preferences);
        assert!((throw.correction() - DEFAULT_CORRECTION_STEP).abs() < 1e-15);
        assert!((throw.alpha() - throw.alpha_0() - DEFAULT_CORRECTION_STEP).abs() < 1e-12);

        throw.add_correction(false, &preferences);
        assert_eq!(throw.correction(), 0.0);
    }

    #[test]
    fn test_tall_res_correction_step() {
        let lock = ModificationLock::new();
        let throw = Throw::new(0.0, 0.0, 0.0, 10.0, 60.0, Dimension::Overworld, &lock);
        let preferences = Preferences {
            use_tall_res: true,
            resolution_height: 16384,
            ..Preferences::default()
        };
        throw.add_correction(true, &preferences);

        let expected = (2.0 * 15f64.to_radians().tan() / 16384.0).atan().to_degrees() / 0.5;
        assert!((throw.correction() - expected).abs() < 1e-12);

        throw.add_correction(false, &preferences);
        assert_eq!(throw.correction(), 0.0);
    }

    #[test]
    fn test_correction_notifies() {
        let lock = ModificationLock::new();
        let throw = Throw::new(0.0, 0.0, 0.0, 10.0, 0.0, Dimension::Overworld, &lock);
        let (count, _s) = counter(&throw);
        throw.add_correction(true, &Preferences::default());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_std_profile_binding() {
        let lock = ModificationLock::new();
        let throw = Arc::new(Throw::new(0.0, 0.0, 0.0, 10.0, 0.0, Dimension::Overworld, &lock));
        let profile = Arc::new(PreferenceStdProfile::from_preferences(&Preferences {
            sigma: 0.1,
            sigma_alt: 0.3,
            ..Preferences::default()
        }));

        assert_eq!(throw.std(), 0.0);
        throw.set_std_profile(profile.clone());
        assert_eq!(throw.std(), 0.1);
        assert_eq!(profile.when_modified().subscriber_count(), 1);

        let (count, _s) = counter(&throw);
        throw.set_std_profile_number(STD_PROFILE_ALT);
        assert_eq!(throw.std(), 0.3);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // profile change reaches the throw
        profile.set_sigma(STD_PROFILE_ALT, 0.4);
        assert_eq!(throw.std(), 0.4);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        // a change to another profile does not re-notify
        profile.set_sigma(0, 0.2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_rebinding_releases_previous_profile() {
        let lock = ModificationLock::new();
        let throw = Arc::new(Throw::new(0.0, 0.0, 0.0, 10.0, 0.0, Dimension::Overworld, &lock));
        let first = Arc::new(PreferenceStdProfile::from_preferences(&Preferences::default()));
        let second = Arc::new(PreferenceStdProfile::from_preferences(&Preferences::default()));

        throw.set_std_profile(first.clone());
        throw.set_std_profile(second.clone());
        assert_eq!(first.when_modified().subscriber_count(), 0);
        assert_eq!(second.when_modified().subscriber_count(), 1);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let lock = ModificationLock::new();
        let unbound = Throw::new(0.0, 0.0, 0.0, 10.0, 0.0, Dimension::Overworld, &lock);
        unbound.dispose();
        unbound.dispose();

        let throw = Arc::new(Throw::new(0.0, 0.0, 0.0, 10.0, 0.0, Dimension::Overworld, &lock));
        let profile = Arc::new(PreferenceStdProfile::from_preferences(&Preferences::default()));
        throw.set_std_profile(profile.clone());
        throw.dispose();
        throw.dispose();
        assert_eq!(profile.when_modified().subscriber_count(), 0);
    }

    #[test]
    fn test_notifications_deferred_under_lock() {
        let lock = ModificationLock::new();
        let throw = Throw::new(0.0, 0.0, 0.0, 10.0, 0.0, Dimension::Overworld, &lock);
        let (count, _s) = counter(&throw);
        {
            let _batch = lock.acquire();
            throw.add_correction(true, &Preferences::default());
            throw.add_correction(true, &Preferences::default());
            assert_eq!(count.load(Ordering::SeqCst), 0);
        }
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_scaled_dimension_transform() {
        let lock = ModificationLock::new();
        let throw = Throw::new(12.0, 64.0, -8.0, 0.0, 0.0, Dimension::Nether, &lock);
        assert_eq!(throw.x_in_overworld(), 96.0);
        assert_eq!(throw.y_in_player_dimension(), 64.0);
        assert_eq!(throw.z_in_overworld(), -64.0);
        assert_eq!(throw.x_in_player_dimension(), 12.0);
    }
}
