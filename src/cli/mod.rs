pub mod commands;
pub mod context;
pub mod output;

use clap::{Parser, Subcommand};

/// Environment variable holding the log filter, e.g. `KEEP_LOG=keep=debug`.
pub const LOG_ENV_VAR: &str = "KEEP_LOG";

/// Keep your credentials in OpenPGP-encrypted files, one per account.
#[derive(Parser, Debug)]
#[command(name = "keep", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Recipient key ids, overriding the profile (space separated)
    #[arg(short, long, global = true)]
    pub recipients: Option<String>,

    /// Account directory, overriding the profile
    #[arg(short, long, global = true)]
    pub dir: Option<String>,

    /// Profile to use (default: the first one)
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Path to alternative profile store
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decrypt and show an account
    Read {
        /// Account name, or part of it
        file: String,
        /// Position in the list when several accounts match
        number: Option<usize>,
        /// Print the password
        #[arg(long)]
        print: bool,
        /// Copy the password to the clipboard for 15 seconds
        #[arg(short, long)]
        clipboard: bool,
    },

    /// List accounts
    List {
        /// Only list accounts whose name contains this
        file: Option<String>,
    },

    /// Add a new account
    Add,
}

/// Send logs to stderr, filtered by `KEEP_LOG`.
///
/// Without `KEEP_LOG` only warnings are shown, or debug output for this
/// crate when `verbose` is set.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "keep=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn read_accepts_position_and_flags() {
        let cli = Cli::try_parse_from(["keep", "read", "example", "1", "--print", "-c", "-p", "work"])
            .unwrap();
        match cli.command {
            Commands::Read {
                file,
                number,
                print,
                clipboard,
            } => {
                assert_eq!(file, "example");
                assert_eq!(number, Some(1));
                assert!(print);
                assert!(clipboard);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.profile.as_deref(), Some("work"));
    }

    #[test]
    fn global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from(["keep", "list", "-d", "/tmp/a", "-r", "AAAA0001 BBBB0002"])
            .unwrap();
        assert_eq!(cli.dir.as_deref(), Some("/tmp/a"));
        assert_eq!(cli.recipients.as_deref(), Some("AAAA0001 BBBB0002"));
    }
}
