//! `pzb session` — drive an order desk from stdin, one chat line at a time.
//!
//! Line format: `<requester> <argument>`. The requester is the first
//! whitespace-delimited token; the rest of the line is the argument. Blank
//! lines and `#` comments are skipped; `quit` or EOF ends the session.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use pzb_config::Settings;
use pzb_engine::{render_error, render_outcome, Command, OrderDesk};
use tracing::debug;

/// Returns the number of commands executed.
pub fn run_session<R: BufRead, W: Write>(settings: &Settings, input: R, mut output: W) -> Result<usize> {
    let vocab = settings.vocabulary();
    let mut desk = OrderDesk::new(settings.allocator());
    let mut executed = 0usize;

    for line in input.lines() {
        let line = line.context("read session input failed")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") {
            break;
        }

        let (requester, arg) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let command = Command::parse_with_marker(arg, &vocab.currency_marker);
        debug!(requester, ?command, "session command");

        let reply = match desk.execute(requester, &command) {
            Ok(outcome) => render_outcome(&outcome, &vocab),
            Err(err) => render_error(&err, &vocab),
        };
        writeln!(output, "{reply}").context("write session output failed")?;
        executed += 1;
    }

    output.flush().context("flush session output failed")?;
    Ok(executed)
}
