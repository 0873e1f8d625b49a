//! Hardware power-down increment catalog.
//!
//! The low-power timer only supports a fixed ladder of countdown durations.
//! Longer sleeps are stitched together by the scheduler from these
//! increments, largest first. Everything in this module is `no_std`
//! friendly so the same catalog compiles for both the firmware and the
//! host-side emulator.

/// One bounded power-down interval natively supported by the timer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SleepIncrement {
    Ms8000,
    Ms4000,
    Ms2000,
    Ms1000,
    Ms500,
    Ms250,
    Ms120,
    Ms60,
    Ms30,
    Ms15,
}

impl SleepIncrement {
    /// Every supported increment, ordered largest to smallest.
    ///
    /// The scheduler walks this catalog greedily, so the descending order
    /// is load-bearing: the first increment that fits the remaining budget
    /// is the one used.
    pub const DESCENDING: [SleepIncrement; 10] = [
        SleepIncrement::Ms8000,
        SleepIncrement::Ms4000,
        SleepIncrement::Ms2000,
        SleepIncrement::Ms1000,
        SleepIncrement::Ms500,
        SleepIncrement::Ms250,
        SleepIncrement::Ms120,
        SleepIncrement::Ms60,
        SleepIncrement::Ms30,
        SleepIncrement::Ms15,
    ];

    /// The largest supported increment.
    pub const LARGEST: SleepIncrement = SleepIncrement::Ms8000;

    /// The smallest supported increment; budgets below this are dropped.
    pub const SMALLEST: SleepIncrement = SleepIncrement::Ms15;

    /// Duration of this increment in milliseconds.
    #[must_use]
    pub const fn millis(self) -> u32 {
        match self {
            SleepIncrement::Ms8000 => 8_000,
            SleepIncrement::Ms4000 => 4_000,
            SleepIncrement::Ms2000 => 2_000,
            SleepIncrement::Ms1000 => 1_000,
            SleepIncrement::Ms500 => 500,
            SleepIncrement::Ms250 => 250,
            SleepIncrement::Ms120 => 120,
            SleepIncrement::Ms60 => 60,
            SleepIncrement::Ms30 => 30,
            SleepIncrement::Ms15 => 15,
        }
    }

    /// Selects the largest increment not exceeding `budget_ms`, if any.
    #[must_use]
    pub fn largest_fitting(budget_ms: u32) -> Option<SleepIncrement> {
        SleepIncrement::DESCENDING
            .into_iter()
            .find(|increment| increment.millis() <= budget_ms)
    }
}

/// Countdown programmed into the power-down primitive for one halt.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SleepSpan {
    /// Halt for one bounded increment; the timer ends the halt at expiry.
    Timed(SleepIncrement),
    /// Halt with the countdown disabled; only an interrupt ends the halt.
    Forever,
}

impl SleepSpan {
    /// Programmed duration in milliseconds, if the span is bounded.
    #[must_use]
    pub const fn millis(self) -> Option<u32> {
        match self {
            SleepSpan::Timed(increment) => Some(increment.millis()),
            SleepSpan::Forever => None,
        }
    }
}
