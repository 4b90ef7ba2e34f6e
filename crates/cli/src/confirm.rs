//! Interactive yes/no prompt on the terminal.

use std::io::{BufRead, IsTerminal, Write};

use mercado_admin::services::Confirm;

/// Asks on stderr and reads the answer from stdin.
///
/// Without a terminal on stdin every question is answered no, so scripts
/// never provision users by accident.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        let stdin = std::io::stdin();
        if !stdin.is_terminal() {
            tracing::warn!(%prompt, "no terminal to confirm on; answering no (use --yes)");
            return false;
        }

        let mut err = std::io::stderr().lock();
        if write!(err, "{prompt} [y/N] ").and_then(|()| err.flush()).is_err() {
            return false;
        }
        let mut answer = String::new();
        if stdin.lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }
}

/// Accepts `y`, `yes`, `s` and `si` in any case.
fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "s" | "si" | "sí"
    )
}
