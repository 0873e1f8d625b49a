//! Line grammar for the node debug console.
//!
//! Commands are short and bounded, so the grammar parses a whole line in
//! one pass with `winnow` combinators directly over the input slice.
//! Keywords match case-insensitively; durations accept an optional `ms` or
//! `s` suffix and default to milliseconds.

use core::fmt;

use winnow::ascii::{Caseless, digit1, space0, space1};
use winnow::combinator::{alt, eof, opt, preceded, terminated};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::take_while;

/// A parsed console command.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Command<'a> {
    /// Request a sleep; `duration_ms == 0` sleeps until an interrupt.
    Sleep { duration_ms: u32, notify: bool },
    /// Schedule an interrupt wake with the given nonzero cause code.
    Wake { code: u8 },
    /// Script the next tick poll to return the given nonzero code.
    Tick { code: u8 },
    /// Mark the transport ready.
    Connect,
    /// Mark the transport unavailable.
    Disconnect,
    /// Show node status.
    Status,
    /// Show help, optionally for a single topic.
    Help { topic: Option<&'a str> },
}

/// Parse failure with the byte offset where the input stopped making sense.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ParseFailure {
    pub offset: usize,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized console input at offset {}", self.offset)
    }
}

/// Parses one console line into a [`Command`].
pub fn parse_line(line: &str) -> Result<Command<'_>, ParseFailure> {
    command_line.parse(line).map_err(|error| ParseFailure {
        offset: error.offset(),
    })
}

fn command_line<'a>(input: &mut &'a str) -> ModalResult<Command<'a>, ContextError> {
    terminated(preceded(space0, command), (space0, eof)).parse_next(input)
}

fn command<'a>(input: &mut &'a str) -> ModalResult<Command<'a>, ContextError> {
    alt((
        sleep_command,
        wake_command,
        tick_command,
        keyword_command,
        help_command,
    ))
    .parse_next(input)
}

fn sleep_command<'a>(input: &mut &'a str) -> ModalResult<Command<'a>, ContextError> {
    let duration_ms = preceded((Caseless("sleep"), space1), duration_ms).parse_next(input)?;
    let notify = opt(preceded(space1, Caseless("notify")))
        .parse_next(input)?
        .is_some();
    Ok(Command::Sleep {
        duration_ms,
        notify,
    })
}

fn wake_command<'a>(input: &mut &'a str) -> ModalResult<Command<'a>, ContextError> {
    preceded((Caseless("wake"), space1), cause_code)
        .map(|code| Command::Wake { code })
        .parse_next(input)
}

fn tick_command<'a>(input: &mut &'a str) -> ModalResult<Command<'a>, ContextError> {
    preceded((Caseless("tick"), space1), cause_code)
        .map(|code| Command::Tick { code })
        .parse_next(input)
}

fn keyword_command<'a>(input: &mut &'a str) -> ModalResult<Command<'a>, ContextError> {
    alt((
        Caseless("disconnect").value(Command::Disconnect),
        Caseless("connect").value(Command::Connect),
        Caseless("status").value(Command::Status),
    ))
    .parse_next(input)
}

fn help_command<'a>(input: &mut &'a str) -> ModalResult<Command<'a>, ContextError> {
    preceded(
        Caseless("help"),
        opt(preceded(space1, topic_word)),
    )
    .map(|topic| Command::Help { topic })
    .parse_next(input)
}

fn topic_word<'a>(input: &mut &'a str) -> ModalResult<&'a str, ContextError> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '-').parse_next(input)
}

/// Duration literal: bare milliseconds, or an integer with `ms`/`s` suffix.
fn duration_ms(input: &mut &str) -> ModalResult<u32, ContextError> {
    let value: u32 = digit1.parse_to().parse_next(input)?;
    let suffix = opt(alt((
        Caseless("ms").value(DurationUnit::Millis),
        Caseless("s").value(DurationUnit::Seconds),
    )))
    .parse_next(input)?;

    match suffix.unwrap_or(DurationUnit::Millis) {
        DurationUnit::Millis => Ok(value),
        DurationUnit::Seconds => value
            .checked_mul(1_000)
            .ok_or_else(|| winnow::error::ErrMode::Cut(ContextError::new())),
    }
}

#[derive(Copy, Clone)]
enum DurationUnit {
    Millis,
    Seconds,
}

/// Wake cause codes are a single nonzero byte.
fn cause_code(input: &mut &str) -> ModalResult<u8, ContextError> {
    digit1
        .parse_to::<u8>()
        .verify(|code| *code != 0)
        .parse_next(input)
}
