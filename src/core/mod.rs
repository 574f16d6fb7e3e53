//! Core modules for eyecalc

pub mod event;
pub mod lock;
pub mod throw;
pub mod std_profile;
pub mod throw_set;
pub mod divine_context;
pub mod calculator;
pub mod ray_calculator;
pub mod top_prediction;
pub mod manager;
pub mod session;

pub use event::{Disposable, DisposeHandler, Observable, Subject, Subscription};
pub use lock::{LockableField, ModificationGuard, ModificationLock};
pub use throw::{normalize_angle, precise_alpha, Throw};
pub use std_profile::{
    PreferenceStdProfile, StdProfile, STD_PROFILE_ALT, STD_PROFILE_MANUAL, STD_PROFILE_NORMAL,
};
pub use throw_set::ThrowSet;
pub use divine_context::DivineContext;
pub use calculator::{top_ranked, Calculator, CalculatorResult, FullResult};
pub use ray_calculator::{RayCalculator, RayResult};
pub use top_prediction::TopPredictionProvider;
pub use manager::{CalculatorManager, ModeSelection};
pub use session::{LineOutcome, Session};
