use std::io::{self, BufRead, IsTerminal, Write};

use crate::core::errors::Result;
use crate::core::traits::console::Console;

/// Console on the process's stdin/stdout.
///
/// Secrets are read with echo disabled when stdin is a terminal. Piped
/// input is read line by line so the binary stays scriptable.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdConsole;

impl Console for StdConsole {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no more input").into());
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn read_secret(&mut self, prompt: &str) -> Result<String> {
        if io::stdin().is_terminal() {
            Ok(rpassword::prompt_password(prompt)?)
        } else {
            self.read_line(prompt)
        }
    }
}
