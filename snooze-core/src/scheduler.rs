//! Sleep-duration scheduler and public entry point.
//!
//! Composes the collaborator seams into one sleep operation: wait for the
//! transport, optionally notify the peer, then stitch the requested
//! duration together from hardware power-down increments while arbitrating
//! between timer expiry, the periodic tick poll, and the wake-reason flag.
//!
//! Execution is single-threaded and cooperative; the only concurrency is
//! with interrupt handlers, and the only state they share with this module
//! is the [`WakeFlag`] and the millisecond counter.

use crate::clock::MonotonicClock;
use crate::increments::{SleepIncrement, SleepSpan};
use crate::indication::{Indication, IndicationSink};
use crate::power::PowerDown;
use crate::tick::TickHandler;
use crate::transport::{SleepConfig, Transport};
use crate::wake::{NO_WAKE_PENDING, SleepNotPossible, SleepResult, WakeCause, WakeFlag};

/// Outcome of the low-power phase before the public result mapping.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ScheduleOutcome {
    /// Every increment completed and no wake was requested.
    Expired,
    /// The tick poll requested a wake with this code.
    Tick(u8),
    /// An interrupt handler requested a wake with this code.
    Interrupt(u8),
}

/// Drives sleep requests for one node.
///
/// Owns the hardware and transport seams; the wake flag is borrowed because
/// interrupt handlers outside this crate write it concurrently.
pub struct SleepController<'f, P, T, K, I, C> {
    power: P,
    transport: T,
    tick: K,
    indications: I,
    clock: C,
    flag: &'f WakeFlag,
    config: SleepConfig,
}

impl<'f, P, T, K, I, C> SleepController<'f, P, T, K, I, C>
where
    P: PowerDown,
    T: Transport,
    K: TickHandler,
    I: IndicationSink,
    C: MonotonicClock,
{
    /// Creates a controller around the provided collaborators.
    pub const fn new(
        power: P,
        transport: T,
        tick: K,
        indications: I,
        clock: C,
        flag: &'f WakeFlag,
        config: SleepConfig,
    ) -> Self {
        Self {
            power,
            transport,
            tick,
            indications,
            clock,
            flag,
            config,
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &SleepConfig {
        &self.config
    }

    /// Sleeps for `duration_ms`, or until an asynchronous wake when
    /// `duration_ms` is 0.
    ///
    /// Waits for transport readiness first; time spent waiting is charged
    /// against the requested duration. When `notify_before_sleep` is set,
    /// the peer is notified and inbound messages are processed for the
    /// configured listen window before the radio is disabled. The window is
    /// extra wall-clock time, not part of the sleep budget.
    ///
    /// Returns the wake cause, or [`SleepNotPossible`] when the transport
    /// never became ready within the requested duration and the reconnect
    /// timeout. In that case no power-down has occurred.
    pub fn request(&mut self, duration_ms: u32, notify_before_sleep: bool) -> SleepResult {
        let Some(budget_ms) = self.await_readiness(duration_ms) else {
            // A wake raised during the wait must not leak into the next call.
            self.flag.clear();
            return Err(SleepNotPossible);
        };

        if notify_before_sleep {
            self.transport.notify_sleep();
            self.listen(self.config.listen_window_ms);
        }

        self.transport.disable();
        self.indications.indicate(Indication::Sleep);

        let outcome = self.low_power_phase(budget_ms);

        self.indications.indicate(Indication::Wakeup);

        Ok(match outcome {
            ScheduleOutcome::Expired => WakeCause::Timer,
            ScheduleOutcome::Tick(code) => WakeCause::Tick(code),
            ScheduleOutcome::Interrupt(code) => WakeCause::Interrupt(code),
        })
    }

    /// Waits for the transport, trading sleep budget for wall-clock time.
    ///
    /// Returns the budget left for the scheduler (0 keeps meaning
    /// "indefinite" for a 0 ms request), or `None` when a bound expired
    /// before the transport became ready.
    fn await_readiness(&mut self, duration_ms: u32) -> Option<u32> {
        let entered = self.clock.now();
        let mut waited_ms = 0u32;

        loop {
            if self.transport.is_ready() {
                break;
            }
            if waited_ms >= self.config.reconnect_timeout_ms {
                return None;
            }
            if duration_ms != 0 && waited_ms >= duration_ms {
                return None;
            }
            self.transport.process();
            waited_ms = self.clock.now().wrapping_sub(entered);
        }

        if duration_ms == 0 {
            // Indefinite sleep carries no budget to spend.
            Some(0)
        } else if waited_ms < duration_ms {
            Some(duration_ms - waited_ms)
        } else {
            None
        }
    }

    /// Processes inbound transport traffic for `window_ms` of wall time.
    fn listen(&mut self, window_ms: u32) {
        let entered = self.clock.now();
        while self.clock.now().wrapping_sub(entered) < window_ms {
            self.transport.process();
        }
    }

    /// Runs the halt sequence with the flag and analog-state bookkeeping.
    ///
    /// The flag is cleared on entry so a stale cause cannot end this sleep
    /// immediately, and again on exit so it cannot leak into the next call.
    fn low_power_phase(&mut self, budget_ms: u32) -> ScheduleOutcome {
        self.flag.clear();
        let saved = self.power.save();

        let outcome = if budget_ms > 0 {
            self.run_schedule(budget_ms)
        } else {
            self.power.power_down(SleepSpan::Forever);
            match self.flag.value() {
                NO_WAKE_PENDING => ScheduleOutcome::Expired,
                cause => ScheduleOutcome::Interrupt(cause),
            }
        };

        self.flag.clear();
        self.power.restore(saved);
        outcome
    }

    /// Greedy decomposition over the increment catalog.
    ///
    /// As many 8 s increments as fit, with a tick poll after each; then the
    /// smaller increments, largest first, each at most once; then one final
    /// tick poll whose result decides between expiry and a tick wake. Any
    /// interrupt aborts immediately and the undecremented budget is
    /// discarded, not owed to a later call.
    fn run_schedule(&mut self, budget_ms: u32) -> ScheduleOutcome {
        let mut remaining_ms = budget_ms;

        while remaining_ms >= SleepIncrement::LARGEST.millis() {
            if let Some(cause) = self.nap(SleepIncrement::LARGEST) {
                return ScheduleOutcome::Interrupt(cause);
            }
            remaining_ms -= SleepIncrement::LARGEST.millis();

            let requested = self.tick.poll();
            if requested != 0 {
                return ScheduleOutcome::Tick(requested);
            }
        }

        for increment in SleepIncrement::DESCENDING.into_iter().skip(1) {
            if remaining_ms >= increment.millis() {
                if let Some(cause) = self.nap(increment) {
                    return ScheduleOutcome::Interrupt(cause);
                }
                remaining_ms -= increment.millis();
            }
        }

        match self.tick.poll() {
            0 => ScheduleOutcome::Expired,
            requested => ScheduleOutcome::Tick(requested),
        }
    }

    /// One bounded halt plus wake arbitration and clock correction.
    ///
    /// The flag takes priority: when an interrupt cut the halt short the
    /// elapsed time is not reliably the programmed increment, so the clock
    /// is deliberately left uncorrected for that increment.
    fn nap(&mut self, increment: SleepIncrement) -> Option<u8> {
        self.power.power_down(SleepSpan::Timed(increment));

        match self.flag.value() {
            NO_WAKE_PENDING => {
                self.clock.advance(increment.millis());
                None
            }
            cause => Some(cause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MillisCounter;
    use crate::indication::Indication;
    use crate::transport::SleepConfig;

    use core::cell::{Cell, RefCell};

    use heapless::Vec as HeaplessVec;

    /// Milliseconds of wall time burned by one `Transport::process` call.
    const PROCESS_STEP_MS: u32 = 1;

    /// Shared backing state for the mock collaborators.
    struct Sim {
        counter: MillisCounter,
        flag: WakeFlag,
        naps: RefCell<HeaplessVec<SleepSpan, 16>>,
        saves: Cell<usize>,
        restores: Cell<usize>,
        // Raise the flag with this code during the nth power-down (1-based).
        interrupt_on_nap: Cell<Option<(usize, u8)>>,
        // Number of `process` calls after which the transport reports ready;
        // `usize::MAX` keeps it unready forever.
        ready_after: Cell<usize>,
        processed: Cell<usize>,
        notifies: Cell<usize>,
        disables: Cell<usize>,
        indications: RefCell<HeaplessVec<Indication, 4>>,
        tick_codes: RefCell<HeaplessVec<u8, 8>>,
        tick_polls: Cell<usize>,
    }

    impl Sim {
        fn new() -> Self {
            Self {
                counter: MillisCounter::new(),
                flag: WakeFlag::new(),
                naps: RefCell::new(HeaplessVec::new()),
                saves: Cell::new(0),
                restores: Cell::new(0),
                interrupt_on_nap: Cell::new(None),
                ready_after: Cell::new(0),
                processed: Cell::new(0),
                notifies: Cell::new(0),
                disables: Cell::new(0),
                indications: RefCell::new(HeaplessVec::new()),
                tick_codes: RefCell::new(HeaplessVec::new()),
                tick_polls: Cell::new(0),
            }
        }

        /// Scripts sequential tick results; polls past the end return 0.
        fn script_ticks(&self, codes: &[u8]) {
            let mut scripted = self.tick_codes.borrow_mut();
            scripted.clear();
            for code in codes {
                scripted.push(*code).expect("tick script too long");
            }
        }

        fn controller(
            &self,
            config: SleepConfig,
        ) -> SleepController<
            '_,
            SimPower<'_>,
            SimTransport<'_>,
            SimTick<'_>,
            SimIndications<'_>,
            &MillisCounter,
        > {
            SleepController::new(
                SimPower { sim: self },
                SimTransport { sim: self },
                SimTick { sim: self },
                SimIndications { sim: self },
                &self.counter,
                &self.flag,
                config,
            )
        }

        fn nap_count(&self) -> usize {
            self.naps.borrow().len()
        }

        fn napped_millis(&self) -> u32 {
            self.naps
                .borrow()
                .iter()
                .filter_map(|span| span.millis())
                .sum()
        }
    }

    struct SimPower<'s> {
        sim: &'s Sim,
    }

    /// Analog snapshot handed back to `restore`; the marker value lets the
    /// tests observe that the same snapshot round-trips.
    struct SimSaved(u8);

    impl PowerDown for SimPower<'_> {
        type Saved = SimSaved;

        fn save(&mut self) -> SimSaved {
            self.sim.saves.set(self.sim.saves.get() + 1);
            SimSaved(0xA5)
        }

        fn restore(&mut self, saved: SimSaved) {
            assert_eq!(saved.0, 0xA5);
            self.sim.restores.set(self.sim.restores.get() + 1);
        }

        fn power_down(&mut self, span: SleepSpan) {
            self.sim
                .naps
                .borrow_mut()
                .push(span)
                .expect("nap log full");
            let nap_index = self.sim.naps.borrow().len();
            if let Some((on_nap, cause)) = self.sim.interrupt_on_nap.get()
                && on_nap == nap_index
            {
                self.sim.flag.raise(cause);
            }
        }
    }

    struct SimTransport<'s> {
        sim: &'s Sim,
    }

    impl Transport for SimTransport<'_> {
        fn is_ready(&mut self) -> bool {
            self.sim.processed.get() >= self.sim.ready_after.get()
        }

        fn process(&mut self) {
            self.sim.processed.set(self.sim.processed.get() + 1);
            self.sim.counter.advance(PROCESS_STEP_MS);
        }

        fn notify_sleep(&mut self) {
            self.sim.notifies.set(self.sim.notifies.get() + 1);
        }

        fn disable(&mut self) {
            self.sim.disables.set(self.sim.disables.get() + 1);
        }
    }

    struct SimTick<'s> {
        sim: &'s Sim,
    }

    impl TickHandler for SimTick<'_> {
        fn poll(&mut self) -> u8 {
            let index = self.sim.tick_polls.get();
            self.sim.tick_polls.set(index + 1);
            self.sim
                .tick_codes
                .borrow()
                .get(index)
                .copied()
                .unwrap_or(0)
        }
    }

    struct SimIndications<'s> {
        sim: &'s Sim,
    }

    impl IndicationSink for SimIndications<'_> {
        fn indicate(&mut self, indication: Indication) {
            self.sim
                .indications
                .borrow_mut()
                .push(indication)
                .expect("indication log full");
        }
    }

    fn timed(increment: SleepIncrement) -> SleepSpan {
        SleepSpan::Timed(increment)
    }

    #[test]
    fn full_sleep_decomposes_greedily() {
        let sim = Sim::new();
        let mut controller = sim.controller(SleepConfig::default());

        let result = controller.request(9_500, false);

        assert_eq!(result, Ok(WakeCause::Timer));
        assert_eq!(
            sim.naps.borrow().as_slice(),
            &[
                timed(SleepIncrement::Ms8000),
                timed(SleepIncrement::Ms1000),
                timed(SleepIncrement::Ms250),
                timed(SleepIncrement::Ms250),
            ]
        );
        assert_eq!(sim.counter.now(), 9_500);
        assert_eq!(sim.flag.value(), NO_WAKE_PENDING);
    }

    #[test]
    fn decomposition_sums_to_requested_duration() {
        // (requested, slept): the slept column drops only what the greedy
        // walk cannot represent with the increment catalog.
        let cases = [
            (15_u32, 15_u32),
            (120, 120),
            (8_000, 8_000),
            (8_015, 8_015),
            (9_500, 9_500),
            (7_975, 7_975),
            (65_535, 65_530),
        ];

        for (duration, slept) in cases {
            let sim = Sim::new();
            let mut controller = sim.controller(SleepConfig::default());

            controller.request(duration, false).expect("sleep failed");

            assert_eq!(sim.napped_millis(), slept, "duration {duration}");
            assert!(duration - slept < SleepIncrement::SMALLEST.millis());
            assert_eq!(sim.counter.now(), slept);
        }
    }

    #[test]
    fn tick_wake_stops_after_completed_increments() {
        let sim = Sim::new();
        sim.script_ticks(&[0, 3]);
        let mut controller = sim.controller(SleepConfig::default());

        let result = controller.request(20_000, false);

        assert_eq!(result, Ok(WakeCause::Tick(3)));
        assert_eq!(sim.nap_count(), 2);
        assert_eq!(sim.napped_millis(), 16_000);
        // Completed increments are corrected even though the tick cut the
        // schedule short.
        assert_eq!(sim.counter.now(), 16_000);
        assert_eq!(sim.flag.value(), NO_WAKE_PENDING);
    }

    #[test]
    fn final_tick_result_is_surfaced() {
        let sim = Sim::new();
        sim.script_ticks(&[4]);
        let mut controller = sim.controller(SleepConfig::default());

        let result = controller.request(15, false);

        assert_eq!(result, Ok(WakeCause::Tick(4)));
        assert_eq!(sim.naps.borrow().as_slice(), &[timed(SleepIncrement::Ms15)]);
        assert_eq!(sim.counter.now(), 15);
    }

    #[test]
    fn interrupt_aborts_decomposition_without_correcting_cut_increment() {
        let sim = Sim::new();
        sim.interrupt_on_nap.set(Some((3, 5)));
        let mut controller = sim.controller(SleepConfig::default());

        let result = controller.request(9_500, false);

        assert_eq!(result, Ok(WakeCause::Interrupt(5)));
        // The third power-down was interrupted; no further increments ran.
        assert_eq!(sim.nap_count(), 3);
        // Only the two completed increments advanced the clock.
        assert_eq!(sim.counter.now(), 9_000);
        assert_eq!(sim.flag.value(), NO_WAKE_PENDING);
    }

    #[test]
    fn interrupt_during_first_nap_reports_cause_immediately() {
        let sim = Sim::new();
        sim.interrupt_on_nap.set(Some((1, 42)));
        let mut controller = sim.controller(SleepConfig::default());

        let result = controller.request(60_000, false);

        assert_eq!(result, Ok(WakeCause::Interrupt(42)));
        assert_eq!(sim.nap_count(), 1);
        assert_eq!(sim.counter.now(), 0);
    }

    #[test]
    fn indefinite_sleep_surfaces_interrupt_cause() {
        let sim = Sim::new();
        sim.interrupt_on_nap.set(Some((1, 5)));
        let mut controller = sim.controller(SleepConfig::default());

        let result = controller.request(0, false);

        assert_eq!(result, Ok(WakeCause::Interrupt(5)));
        assert_eq!(sim.naps.borrow().as_slice(), &[SleepSpan::Forever]);
        // Halted time of an interrupted indefinite sleep is unknown; no
        // correction is applied.
        assert_eq!(sim.counter.now(), 0);
        assert_eq!(sim.flag.value(), NO_WAKE_PENDING);
    }

    #[test]
    fn spurious_indefinite_wake_maps_to_timer() {
        let sim = Sim::new();
        let mut controller = sim.controller(SleepConfig::default());

        let result = controller.request(0, false);

        assert_eq!(result, Ok(WakeCause::Timer));
        assert_eq!(sim.naps.borrow().as_slice(), &[SleepSpan::Forever]);
    }

    #[test]
    fn stale_flag_does_not_end_the_next_sleep() {
        let sim = Sim::new();
        sim.flag.raise(9);
        let mut controller = sim.controller(SleepConfig::default());

        let result = controller.request(15, false);

        assert_eq!(result, Ok(WakeCause::Timer));
        assert_eq!(sim.nap_count(), 1);
        assert_eq!(sim.flag.value(), NO_WAKE_PENDING);
    }

    #[test]
    fn sub_increment_budget_expires_without_power_down() {
        let sim = Sim::new();
        let mut controller = sim.controller(SleepConfig::default());

        let result = controller.request(10, false);

        assert_eq!(result, Ok(WakeCause::Timer));
        assert_eq!(sim.nap_count(), 0);
        assert_eq!(sim.counter.now(), 0);
    }

    #[test]
    fn analog_state_saved_and_restored_once_per_request() {
        let sim = Sim::new();
        let mut controller = sim.controller(SleepConfig::default());

        controller.request(250, false).expect("sleep failed");

        assert_eq!(sim.saves.get(), 1);
        assert_eq!(sim.restores.get(), 1);
    }

    #[test]
    fn indications_bracket_the_low_power_phase() {
        let sim = Sim::new();
        let mut controller = sim.controller(SleepConfig::default());

        controller.request(120, false).expect("sleep failed");

        assert_eq!(
            sim.indications.borrow().as_slice(),
            &[Indication::Sleep, Indication::Wakeup]
        );
        assert_eq!(sim.disables.get(), 1);
    }

    #[test]
    fn readiness_wait_reduces_the_sleep_budget() {
        let sim = Sim::new();
        sim.ready_after.set(500);
        let mut controller = sim.controller(SleepConfig::default());

        let result = controller.request(9_500, false);

        assert_eq!(result, Ok(WakeCause::Timer));
        assert_eq!(sim.processed.get(), 500);
        // 500 ms of waiting leaves 9 000 ms of budget.
        assert_eq!(sim.napped_millis(), 9_000);
        assert_eq!(sim.counter.now(), 500 + 9_000);
    }

    #[test]
    fn reconnect_timeout_fails_the_request() {
        let sim = Sim::new();
        sim.ready_after.set(usize::MAX);
        let config = SleepConfig::new(1_000, 500);
        let mut controller = sim.controller(config);

        let result = controller.request(20_000, false);

        assert_eq!(result, Err(SleepNotPossible));
        assert_eq!(sim.nap_count(), 0);
        assert_eq!(sim.saves.get(), 0);
        assert_eq!(sim.notifies.get(), 0);
        assert!(sim.indications.borrow().is_empty());
        // Only the active wait advanced the counter; no correction ran.
        assert_eq!(sim.counter.now(), 1_000);
    }

    #[test]
    fn failed_request_clears_a_wake_raised_while_waiting() {
        let sim = Sim::new();
        sim.ready_after.set(usize::MAX);
        sim.flag.raise(7);
        let config = SleepConfig::new(1_000, 500);
        let mut controller = sim.controller(config);

        let result = controller.request(20_000, false);

        assert_eq!(result, Err(SleepNotPossible));
        assert_eq!(sim.flag.value(), NO_WAKE_PENDING);
    }

    #[test]
    fn exhausted_duration_fails_before_the_timeout() {
        let sim = Sim::new();
        sim.ready_after.set(usize::MAX);
        let mut controller = sim.controller(SleepConfig::default());

        let result = controller.request(300, false);

        assert_eq!(result, Err(SleepNotPossible));
        assert_eq!(sim.processed.get(), 300);
        assert_eq!(sim.nap_count(), 0);
    }

    #[test]
    fn indefinite_sleep_still_requires_readiness() {
        let sim = Sim::new();
        sim.ready_after.set(usize::MAX);
        let config = SleepConfig::new(2_000, 500);
        let mut controller = sim.controller(config);

        let result = controller.request(0, false);

        assert_eq!(result, Err(SleepNotPossible));
        assert_eq!(sim.processed.get(), 2_000);
        assert_eq!(sim.nap_count(), 0);
    }

    #[test]
    fn indefinite_sleep_waits_out_a_late_reconnect() {
        let sim = Sim::new();
        sim.ready_after.set(1_500);
        sim.interrupt_on_nap.set(Some((1, 6)));
        let config = SleepConfig::new(2_000, 500);
        let mut controller = sim.controller(config);

        let result = controller.request(0, false);

        assert_eq!(result, Ok(WakeCause::Interrupt(6)));
        assert_eq!(sim.naps.borrow().as_slice(), &[SleepSpan::Forever]);
    }

    #[test]
    fn notified_sleep_listens_before_disabling_the_radio() {
        let sim = Sim::new();
        let mut controller = sim.controller(SleepConfig::default());

        let result = controller.request(8_000, true);

        assert_eq!(result, Ok(WakeCause::Timer));
        assert_eq!(sim.notifies.get(), 1);
        assert_eq!(sim.disables.get(), 1);
        // The listen window burned wall-clock `process` steps but the full
        // 8 000 ms budget still went to the scheduler.
        assert_eq!(sim.processed.get(), 500);
        assert_eq!(sim.napped_millis(), 8_000);
        assert_eq!(sim.counter.now(), 500 + 8_000);
    }
}
