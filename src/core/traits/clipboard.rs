use crate::core::errors::Result;

/// Port for the system clipboard.
pub trait Clipboard: Send {
    fn read(&self) -> Result<String>;

    fn write(&self, value: &str) -> Result<()>;
}
