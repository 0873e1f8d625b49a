//! Transport/connectivity seam and sleep configuration.
//!
//! The node will not power down while its uplink is unusable: the
//! scheduler polls [`Transport::is_ready`] and burns wall-clock budget in
//! [`Transport::process`] until the link comes back or a bound expires.

/// Connectivity collaborator consulted before every sleep.
pub trait Transport {
    /// Returns `true` when the uplink is usable and the node may sleep.
    fn is_ready(&mut self) -> bool;

    /// Runs one step of transport housekeeping (reconnection, inbound
    /// messages). Invoked repeatedly while waiting for readiness and
    /// during the smart-sleep listen window.
    fn process(&mut self);

    /// Notifies the remote peer that the node is about to sleep.
    fn notify_sleep(&mut self);

    /// Powers the radio down before the low-power phase.
    fn disable(&mut self);
}

/// Default bound on waiting for the transport to become ready.
pub const DEFAULT_RECONNECT_TIMEOUT_MS: u32 = 10_000;

/// Default listen window after the pre-sleep notification.
pub const DEFAULT_LISTEN_WINDOW_MS: u32 = 500;

/// Tunables for one sleep controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SleepConfig {
    /// Maximum time spent waiting for transport readiness before a sleep
    /// request fails with "not possible".
    pub reconnect_timeout_ms: u32,
    /// How long to keep listening for inbound messages after notifying the
    /// peer, when the caller asked for a notified sleep. Extra wall-clock
    /// time; not charged against the sleep budget.
    pub listen_window_ms: u32,
}

impl SleepConfig {
    /// Configuration with explicit bounds.
    #[must_use]
    pub const fn new(reconnect_timeout_ms: u32, listen_window_ms: u32) -> Self {
        Self {
            reconnect_timeout_ms,
            listen_window_ms,
        }
    }
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self::new(DEFAULT_RECONNECT_TIMEOUT_MS, DEFAULT_LISTEN_WINDOW_MS)
    }
}
