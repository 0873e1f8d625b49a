//! Sleep-entry and wake-up indication signals.

/// Externally visible lifecycle signal bracketing the low-power phase.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Indication {
    /// Fired once immediately before the first power-down.
    Sleep,
    /// Fired once after the analog subsystem has been restored.
    Wakeup,
}

/// Sink for lifecycle indications (LED, log line, telemetry).
pub trait IndicationSink {
    /// Reports the indication to the embedding application.
    fn indicate(&mut self, indication: Indication);
}

/// Indication sink that discards every signal.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopIndication;

impl NoopIndication {
    /// Creates a new no-op sink.
    pub const fn new() -> Self {
        Self
    }
}

impl IndicationSink for NoopIndication {
    fn indicate(&mut self, _: Indication) {}
}
