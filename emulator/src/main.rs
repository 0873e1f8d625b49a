mod session;

use std::io::{self, BufRead, Write};

use session::Session;

fn main() -> io::Result<()> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut session = Session::new();
    let mut line = String::new();

    writeln!(
        writer,
        "snooze emulator: one simulated node, transport ready, clock at 0 ms."
    )?;
    writeln!(writer, "`help` lists commands; `exit` leaves.")?;

    loop {
        // The prompt carries the simulated wall clock so a long sleep is
        // visible at a glance.
        line.clear();
        write!(writer, "[{} ms]> ", session.wall_ms())?;
        writer.flush()?;

        if reader.read_line(&mut line)? == 0 {
            writeln!(writer)?;
            return Ok(());
        }

        let trimmed = line.trim();
        match trimmed {
            "" => {}
            _ if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") => {
                return Ok(());
            }
            command => {
                for response in session.handle_command(command) {
                    writeln!(writer, "{response}")?;
                }
            }
        }
    }
}
