use crate::core::errors::Result;

/// Port for line-oriented interaction with the user.
pub trait Console {
    /// Show `prompt` and read one echoed line, without its terminator.
    fn read_line(&mut self, prompt: &str) -> Result<String>;

    /// Show `prompt` and read one line with echo disabled.
    fn read_secret(&mut self, prompt: &str) -> Result<String>;
}
