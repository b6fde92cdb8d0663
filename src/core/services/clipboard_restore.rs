use std::thread::JoinHandle;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::errors::{KeepError, Result};
use crate::core::traits::clipboard::Clipboard;

/// How long a copied password stays on the clipboard.
pub const RESTORE_DELAY: Duration = Duration::from_secs(15);

/// How a restore task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored,
    Cancelled,
}

/// Puts a previous clipboard value back after a delay.
///
/// The task runs on its own thread with a single-threaded runtime. It can
/// be cancelled at any time; dropping an unfinished task cancels it, so a
/// restore never outlives its owner.
pub struct ClipboardRestore {
    token: CancellationToken,
    handle: Option<JoinHandle<Result<RestoreOutcome>>>,
}

impl ClipboardRestore {
    pub fn schedule<C>(clipboard: C, original: String, delay: Duration) -> Result<Self>
    where
        C: Clipboard + 'static,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let handle = std::thread::Builder::new()
            .name("clipboard-restore".into())
            .spawn(move || -> Result<RestoreOutcome> {
                runtime.block_on(async move {
                    tokio::select! {
                        _ = cancelled.cancelled() => {
                            debug!("clipboard restore cancelled");
                            Ok(RestoreOutcome::Cancelled)
                        }
                        _ = tokio::time::sleep(delay) => {
                            clipboard.write(&original)?;
                            debug!("clipboard restored");
                            Ok(RestoreOutcome::Restored)
                        }
                    }
                })
            })?;

        Ok(Self {
            token,
            handle: Some(handle),
        })
    }

    /// Abort the restore. The clipboard is left as it is.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Block until the task has finished.
    pub fn wait(mut self) -> Result<RestoreOutcome> {
        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => return Ok(RestoreOutcome::Cancelled),
        };
        handle.join().map_err(|_| KeepError::Clipboard {
            detail: "clipboard restore task panicked".into(),
        })?
    }
}

impl Drop for ClipboardRestore {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.token.cancel();
        }
    }
}
