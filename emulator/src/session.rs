//! Interactive emulator session.
//!
//! Drives the shared sleep controller against a fully simulated node: a
//! virtual wall clock, an armable interrupt source, scripted tick results,
//! and a toggleable transport. Every externally visible effect is appended
//! to a transcript that is returned as the response to each command.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt::Write as _;

use snooze_core::clock::{MillisCounter, MonotonicClock};
use snooze_core::console::grammar::{Command, parse_line};
use snooze_core::console::status::{StatusFormatter, StatusSnapshot};
use snooze_core::console::{HELP_TOPICS, help_text};
use snooze_core::increments::SleepSpan;
use snooze_core::indication::{Indication, IndicationSink};
use snooze_core::power::PowerDown;
use snooze_core::scheduler::SleepController;
use snooze_core::tick::TickHandler;
use snooze_core::transport::{SleepConfig, Transport};
use snooze_core::wake::{SleepResult, WakeFlag};

/// Simulated node state shared by the collaborator implementations.
struct SimNode {
    /// Software millisecond counter, corrected by the scheduler.
    counter: MillisCounter,
    flag: WakeFlag,
    /// True elapsed time, including halted spans the software clock only
    /// learns about through corrections.
    wall_ms: Cell<u64>,
    /// Interrupt cause armed to fire as soon as the node next halts.
    armed_wake: Cell<Option<u8>>,
    transport_ready: Cell<bool>,
    tick_script: RefCell<VecDeque<u8>>,
    transcript: RefCell<Vec<String>>,
    last_sleep: Cell<Option<SleepResult>>,
}

impl SimNode {
    fn new() -> Self {
        Self {
            counter: MillisCounter::new(),
            flag: WakeFlag::new(),
            wall_ms: Cell::new(0),
            armed_wake: Cell::new(None),
            transport_ready: Cell::new(true),
            tick_script: RefCell::new(VecDeque::new()),
            transcript: RefCell::new(Vec::new()),
            last_sleep: Cell::new(None),
        }
    }

    fn record(&self, line: String) {
        self.transcript.borrow_mut().push(line);
    }

    fn drain_transcript(&self) -> Vec<String> {
        self.transcript.borrow_mut().drain(..).collect()
    }

    fn advance_wall(&self, ms: u64) {
        self.wall_ms.set(self.wall_ms.get() + ms);
    }
}

struct SimPower<'n> {
    node: &'n SimNode,
}

struct AnalogSnapshot {
    adc_enabled: bool,
}

impl PowerDown for SimPower<'_> {
    type Saved = AnalogSnapshot;

    fn save(&mut self) -> AnalogSnapshot {
        self.node.record("  analog state saved, ADC off".into());
        AnalogSnapshot { adc_enabled: true }
    }

    fn restore(&mut self, saved: AnalogSnapshot) {
        if saved.adc_enabled {
            self.node.record("  analog state restored, ADC on".into());
        }
    }

    fn power_down(&mut self, span: SleepSpan) {
        if let Some(cause) = self.node.armed_wake.take() {
            // The armed interrupt fires as soon as the halt begins.
            self.node.advance_wall(1);
            self.node.flag.raise(cause);
            self.node
                .record(format!("  halt cut short by interrupt {cause}"));
            return;
        }

        match span {
            SleepSpan::Timed(increment) => {
                self.node.advance_wall(u64::from(increment.millis()));
                self.node
                    .record(format!("  power-down {} ms", increment.millis()));
            }
            SleepSpan::Forever => {
                // Unreachable through the session guard; keep the virtual
                // node honest anyway.
                self.node.record("  power-down forever (no wake source, returning)".into());
            }
        }
    }
}

struct SimTransport<'n> {
    node: &'n SimNode,
}

impl Transport for SimTransport<'_> {
    fn is_ready(&mut self) -> bool {
        self.node.transport_ready.get()
    }

    fn process(&mut self) {
        // One housekeeping step burns one millisecond of wall time with the
        // CPU awake, so the free-running counter ticks too.
        self.node.advance_wall(1);
        self.node.counter.advance(1);
    }

    fn notify_sleep(&mut self) {
        self.node.record("  heartbeat sent to gateway".into());
    }

    fn disable(&mut self) {
        self.node.record("  radio disabled".into());
    }
}

struct SimTick<'n> {
    node: &'n SimNode,
}

impl TickHandler for SimTick<'_> {
    fn poll(&mut self) -> u8 {
        let code = self.node.tick_script.borrow_mut().pop_front().unwrap_or(0);
        self.node.record(format!("  tick poll -> {code}"));
        code
    }
}

struct SimIndications<'n> {
    node: &'n SimNode,
}

impl IndicationSink for SimIndications<'_> {
    fn indicate(&mut self, indication: Indication) {
        let label = match indication {
            Indication::Sleep => "sleep",
            Indication::Wakeup => "wakeup",
        };
        self.node.record(format!("  indication: {label}"));
    }
}

/// One interactive emulator session.
pub struct Session {
    node: SimNode,
    config: SleepConfig,
}

impl Session {
    pub fn new() -> Self {
        Self {
            node: SimNode::new(),
            config: SleepConfig::default(),
        }
    }

    /// Total simulated wall-clock time, halted spans included.
    pub fn wall_ms(&self) -> u64 {
        self.node.wall_ms.get()
    }

    /// Handles one console line and returns the response lines.
    pub fn handle_command(&mut self, line: &str) -> Vec<String> {
        match parse_line(line) {
            Ok(command) => self.execute(command),
            Err(failure) => vec![
                format!("error: {failure}"),
                "Type `help` for the command list.".to_string(),
            ],
        }
    }

    fn execute(&mut self, command: Command<'_>) -> Vec<String> {
        match command {
            Command::Sleep {
                duration_ms,
                notify,
            } => self.run_sleep(duration_ms, notify),
            Command::Wake { code } => {
                self.node.armed_wake.set(Some(code));
                vec![format!(
                    "interrupt {code} armed; it fires at the next power-down"
                )]
            }
            Command::Tick { code } => {
                self.node.tick_script.borrow_mut().push_back(code);
                vec![format!("tick poll scripted to return {code}")]
            }
            Command::Connect => {
                self.node.transport_ready.set(true);
                vec!["transport ready".to_string()]
            }
            Command::Disconnect => {
                self.node.transport_ready.set(false);
                vec!["transport unavailable".to_string()]
            }
            Command::Status => self.render_status(),
            Command::Help { topic } => render_help(topic),
        }
    }

    fn run_sleep(&mut self, duration_ms: u32, notify: bool) -> Vec<String> {
        if duration_ms == 0
            && self.node.armed_wake.get().is_none()
            && self.node.transport_ready.get()
        {
            return vec![
                "refusing to sleep forever: no wake source armed (see `wake`)".to_string(),
            ];
        }

        let wall_before = self.node.wall_ms.get();
        let mut controller = SleepController::new(
            SimPower { node: &self.node },
            SimTransport { node: &self.node },
            SimTick { node: &self.node },
            SimIndications { node: &self.node },
            &self.node.counter,
            &self.node.flag,
            self.config,
        );

        let result = controller.request(duration_ms, notify);
        self.node.last_sleep.set(Some(result));

        let mut responses = self.node.drain_transcript();
        let elapsed = self.node.wall_ms.get() - wall_before;
        match result {
            Ok(cause) => responses.push(format!("woke after {elapsed} ms wall time: {cause}")),
            Err(failure) => responses.push(format!("{failure} (waited {elapsed} ms)")),
        }
        responses
    }

    fn render_status(&self) -> Vec<String> {
        let clock_ms = self.node.counter.now();
        let transport_ready = self.node.transport_ready.get();
        let snapshot = match self.node.last_sleep.get() {
            // Nothing has slept yet, so there is no pending or last cause.
            None => StatusSnapshot::idle(clock_ms, transport_ready),
            last_sleep => StatusSnapshot {
                clock_ms,
                transport_ready,
                pending_wake: self.node.flag.value(),
                last_sleep,
            },
        };
        let formatter = StatusFormatter::new(&snapshot);

        let mut lines = Vec::new();
        let mut line = String::new();
        formatter
            .write_clock_line(&mut line)
            .expect("status render failed");
        lines.push(line);

        let mut line = String::new();
        formatter
            .write_transport_line(&mut line)
            .expect("status render failed");
        lines.push(line);

        let mut line = String::new();
        formatter
            .write_wake_line(&mut line)
            .expect("status render failed");
        lines.push(line);

        if let Some(armed) = self.node.armed_wake.get() {
            let mut line = String::new();
            write!(line, "armed interrupt {armed}").expect("status render failed");
            lines.push(line);
        }
        lines
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn render_help(topic: Option<&str>) -> Vec<String> {
    match topic {
        Some(topic) => match help_text(topic) {
            Some(text) => vec![text.to_string()],
            None => vec![format!("no help for `{topic}`")],
        },
        None => HELP_TOPICS
            .iter()
            .map(|(_, text)| (*text).to_string())
            .collect(),
    }
}
