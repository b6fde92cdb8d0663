use std::io::Write;
use std::process::{Command, Stdio};

use crate::core::errors::{KeepError, Result};
use crate::core::traits::clipboard::Clipboard;

/// A program invocation: binary plus fixed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Clipboard driven by the platform's copy/paste utilities.
///
/// macOS uses `pbcopy`/`pbpaste`, Wayland sessions `wl-copy`/`wl-paste`,
/// everything else `xclip`.
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    copy: Invocation,
    paste: Invocation,
}

impl CommandClipboard {
    pub fn new(copy: Invocation, paste: Invocation) -> Self {
        Self { copy, paste }
    }

    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            Self::new(Invocation::new("pbcopy", &[]), Invocation::new("pbpaste", &[]))
        } else if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            Self::new(
                Invocation::new("wl-copy", &[]),
                Invocation::new("wl-paste", &["--no-newline"]),
            )
        } else {
            Self::new(
                Invocation::new("xclip", &["-selection", "clipboard"]),
                Invocation::new("xclip", &["-selection", "clipboard", "-o"]),
            )
        }
    }

    /// Run `invocation`, feeding `stdin_data` if given, and return stdout.
    fn run(invocation: &Invocation, stdin_data: Option<&[u8]>) -> Result<Vec<u8>> {
        let failed = |reason: String| KeepError::Clipboard {
            detail: format!("{}: {reason}", invocation.program),
        };

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(if stdin_data.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| failed(format!("cannot run: {e}")))?;

        if let (Some(data), Some(mut stdin)) = (stdin_data, child.stdin.take()) {
            stdin
                .write_all(data)
                .map_err(|e| failed(format!("cannot write: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| failed(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!("exited with error: {}", stderr.trim())));
        }
        Ok(output.stdout)
    }
}

impl Clipboard for CommandClipboard {
    fn read(&self) -> Result<String> {
        let stdout = Self::run(&self.paste, None)?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    fn write(&self, value: &str) -> Result<()> {
        Self::run(&self.copy, Some(value.as_bytes()))?;
        Ok(())
    }
}
