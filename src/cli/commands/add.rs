use crate::adapters::console::std_console::StdConsole;
use crate::adapters::passphrase::PassphraseStrategy;
use crate::cli::context::AppContext;
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::models::account::Account;
use crate::core::services::passphrase_resolver::PassphraseResolver;

/// Execute the `keep add` command.
///
/// Collects a new account on the console, encrypts it to the profile's
/// recipients, signs it when the profile names a signer, and writes it.
pub fn execute(ctx: &AppContext) -> Result<()> {
    let account = Account::from_console(&mut StdConsole)?;

    let recipients = ctx.public_ring()?.filter(&ctx.profile.recipient_key_ids);
    if recipients.is_empty() {
        output::warning(&format!(
            "No key of {} matches '{}': nobody will be able to read this account",
            ctx.profile.pubring_dir, ctx.profile.recipient_key_ids
        ));
    }

    let signer = if ctx.profile.signs() {
        let secret_ring = ctx.secret_ring()?;
        let unlocked = {
            let mut strategy = PassphraseStrategy::select(&ctx.passphrase);
            PassphraseResolver.unlock_signer(
                &secret_ring,
                &ctx.profile.signer_key_id,
                &mut strategy,
            )?
        };
        Some(unlocked)
    } else {
        output::warning("No signer key configured: the account will not be signed");
        None
    };

    let path = ctx
        .service()
        .add_account(&account, &recipients, signer.as_ref())?;
    output::success(&format!("Writing file : {}", path.display()));
    Ok(())
}
