use crate::adapters::clipboard::command_clipboard::CommandClipboard;
use crate::adapters::passphrase::PassphraseStrategy;
use crate::cli::context::AppContext;
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::models::account::Account;
use crate::core::models::decoded_message::SignatureStatus;
use crate::core::services::clipboard_restore::{ClipboardRestore, RESTORE_DELAY};
use crate::core::traits::account_store::AccountStore;
use crate::core::traits::clipboard::Clipboard;

/// Execute the `keep read` command.
///
/// Picks the account matching `pattern` (by `position` when several do),
/// decrypts it and prints its details. The password is printed only with
/// `print`; with `clipboard` it is copied and the previous clipboard value
/// is put back after a delay.
pub fn execute(
    ctx: &AppContext,
    pattern: &str,
    position: Option<usize>,
    print: bool,
    clipboard: bool,
) -> Result<()> {
    let service = ctx.service();
    let name = service.find_account(pattern, position)?;
    let secret_ring = ctx.secret_ring()?;
    let public_ring = ctx.public_ring_or_empty()?;

    let account = {
        let mut strategy = PassphraseStrategy::select(&ctx.passphrase);
        service.read_account(&name, &secret_ring, &public_ring, &mut strategy)?
    };

    output::header(&format!(
        "File path : {}",
        service.store.path_for(&name)?.display()
    ));
    report_provenance(&account);
    output::field("Name", account.name());
    output::field("Username", account.username());
    output::field("Notes", account.notes());
    if print {
        output::field("Password", account.password());
    }

    if clipboard {
        copy_password(&account)?;
    }
    Ok(())
}

fn report_provenance(account: &Account) {
    match account.provenance() {
        Some(SignatureStatus::Verified(signer)) => {
            output::success(&format!("Credentials have been signed by : {signer}"));
        }
        Some(SignatureStatus::UnknownSigner(signer)) => output::warning(&format!(
            "Credentials are signed by {signer}, a key found in none of your key-rings"
        )),
        Some(SignatureStatus::Unsigned) | None => {
            output::warning("This credential is not signed !!!");
        }
    }
}

fn copy_password(account: &Account) -> Result<()> {
    let clipboard = CommandClipboard::detect();
    let original = clipboard.read().unwrap_or_default();
    clipboard.write(account.password())?;

    let restore = ClipboardRestore::schedule(clipboard, original, RESTORE_DELAY)?;
    output::success(&format!(
        "Password copied to the clipboard, restored in {}s",
        RESTORE_DELAY.as_secs()
    ));
    restore.wait()?;
    Ok(())
}
