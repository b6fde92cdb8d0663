use crate::cli::context::AppContext;
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::services::credential_service::numbered_listing;
use crate::core::traits::account_store::AccountStore;

/// Execute the `keep list` command.
pub fn execute(ctx: &AppContext, filter: Option<&str>) -> Result<()> {
    let names = ctx.service().store.list(filter.unwrap_or(""))?;
    if names.is_empty() {
        output::warning("No account matches");
        return Ok(());
    }
    println!("{}", numbered_listing(&names));
    Ok(())
}
