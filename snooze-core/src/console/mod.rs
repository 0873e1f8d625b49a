//! Debug-console tooling shared between firmware and emulator targets.
//!
//! The line grammar lives in [`grammar`] and is implemented with `winnow`
//! combinators that stay compatible with `no_std`. [`status`] renders the
//! node state surfaced by the `status` command.

pub mod grammar;
pub mod status;

/// Help text for every console command, keyed by command name.
pub const HELP_TOPICS: &[(&str, &str)] = &[
    (
        "sleep",
        "sleep <duration>[ms|s] [notify]  - power down for the duration (0 = until interrupt)",
    ),
    (
        "wake",
        "wake <code>                      - schedule an interrupt wake with a nonzero cause",
    ),
    (
        "tick",
        "tick <code>                      - make the next tick poll request a wake",
    ),
    (
        "connect",
        "connect                          - mark the transport ready",
    ),
    (
        "disconnect",
        "disconnect                       - mark the transport unavailable",
    ),
    (
        "status",
        "status                           - display clock, transport, and wake state",
    ),
    (
        "help",
        "help [command]                   - show help for a command",
    ),
];

/// Looks up the help text for `topic`, case-insensitively.
pub fn help_text(topic: &str) -> Option<&'static str> {
    HELP_TOPICS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(topic))
        .map(|(_, text)| *text)
}
