//! Duration normalization across timer duration representations.
//!
//! Timeout logic elsewhere in the stack needs two things from a timer
//! duration: a sign test and a way to build one from a millisecond count.
//! Which concrete representation backs [`TimerDuration`] is decided once,
//! at build time, by the `legacy-clock` cargo feature:
//!
//! - default: [`chrono::Duration`], sign tested by comparison with zero
//! - `legacy-clock`: [`time::Duration`], which carries its own
//!   `is_negative()`
//!
//! Call sites never branch on the representation; they only use
//! [`is_neg`], [`milliseconds`], subtraction, and comparison, which both
//! representations support.

#[cfg(not(feature = "legacy-clock"))]
mod backend {
    /// The active timer duration representation.
    pub type TimerDuration = chrono::Duration;

    /// True iff the duration represents a negative interval.
    pub fn is_neg(duration: TimerDuration) -> bool {
        duration < TimerDuration::zero()
    }

    /// Construct a duration of `n` milliseconds.
    pub fn milliseconds(n: i64) -> TimerDuration {
        TimerDuration::milliseconds(n)
    }

    /// Convert an unsigned interval plus a sign into the active
    /// representation. Saturates on overflow.
    pub(crate) fn from_std_signed(positive: bool, duration: std::time::Duration) -> TimerDuration {
        let converted = TimerDuration::from_std(duration).unwrap_or(TimerDuration::MAX);
        if positive { converted } else { -converted }
    }
}

#[cfg(feature = "legacy-clock")]
mod backend {
    /// The active timer duration representation.
    pub type TimerDuration = time::Duration;

    /// True iff the duration represents a negative interval.
    pub fn is_neg(duration: TimerDuration) -> bool {
        duration.is_negative()
    }

    /// Construct a duration of `n` milliseconds.
    pub fn milliseconds(n: i64) -> TimerDuration {
        TimerDuration::milliseconds(n)
    }

    /// Convert an unsigned interval plus a sign into the active
    /// representation. Saturates on overflow.
    pub(crate) fn from_std_signed(positive: bool, duration: std::time::Duration) -> TimerDuration {
        let converted = TimerDuration::try_from(duration).unwrap_or(TimerDuration::MAX);
        if positive { converted } else { -converted }
    }
}

pub(crate) use backend::from_std_signed;
pub use backend::{TimerDuration, is_neg, milliseconds};
