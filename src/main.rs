use clap::Parser;

use keep::cli::context::AppContext;
use keep::cli::{self, Cli, Commands};

fn main() {
    let args = Cli::parse();
    cli::init_tracing(args.verbose);

    let result = AppContext::from_cli(&args).and_then(|ctx| match &args.command {
        Commands::Read {
            file,
            number,
            print,
            clipboard,
        } => cli::commands::read::execute(&ctx, file, *number, *print, *clipboard),
        Commands::List { file } => cli::commands::list::execute(&ctx, file.as_deref()),
        Commands::Add => cli::commands::add::execute(&ctx),
    });

    if let Err(e) = result {
        cli::output::error(&format!("Error: {e}"));
        std::process::exit(1);
    }
}
