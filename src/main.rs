use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod cli;

use cli::CliHandler;

#[derive(Parser)]
#[command(
    name = "kp",
    about = "Key Protect command line client",
    long_about = "kp - Key Protect command line client

OVERVIEW:
  Manage keys in a Key Protect service instance and wrap/unwrap data
  under a root key. Authentication uses an API key from IBMCLOUD_API_KEY
  or BLUEMIX_API_KEY, or an interactive prompt.

QUICK START:
  kp list                               # List keys in the instance
  kp create MyRootKey --root            # Create a root key
  echo -n secret | kp wrap <KEY_ID>     # Wrap stdin under the key
  kp unwrap <KEY_ID> <CIPHERTEXT>       # Recover the plaintext
  kp delete <KEY_ID>                    # Destroy the key",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Service region (e.g. us-south, us-east)
    #[arg(short, long, global = true)]
    pub region: Option<String>,

    /// Explicit key service endpoint URL, overrides --region
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Service instance id (falls back to KP_INSTANCE_ID)
    #[arg(short, long, global = true)]
    pub instance: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print a fresh bearer token
    Token,

    /// List keys in the instance
    #[command(aliases = &["ls"])]
    List,

    /// Show a single key as JSON
    Get(GetArgs),

    /// Create a key
    Create(CreateArgs),

    /// Delete a key
    #[command(aliases = &["rm"])]
    Delete(DeleteArgs),

    /// Wrap plaintext under a root key
    Wrap(WrapArgs),

    /// Unwrap a ciphertext back to plaintext
    Unwrap(UnwrapArgs),
}

#[derive(Args)]
pub struct GetArgs {
    pub id: String,
}

#[derive(Args)]
pub struct CreateArgs {
    pub name: String,

    /// Create a root (non-exportable) key
    #[arg(long)]
    pub root: bool,

    /// Import key material from a file
    #[arg(long)]
    pub payload_file: Option<PathBuf>,
}

#[derive(Args)]
pub struct DeleteArgs {
    pub id: String,
}

#[derive(Args)]
pub struct WrapArgs {
    pub id: String,

    /// Read plaintext from a file instead of stdin
    #[arg(short = 'f', long)]
    pub input: Option<PathBuf>,

    /// Additional authenticated data entry, repeatable; order matters
    #[arg(long)]
    pub aad: Vec<String>,
}

#[derive(Args)]
pub struct UnwrapArgs {
    pub id: String,
    pub ciphertext: String,

    /// Must repeat the AAD given at wrap time, in the same order
    #[arg(long)]
    pub aad: Vec<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(format!("keyprotect={}", log_level));
    subscriber.init();

    let handler = match CliHandler::new(&cli) {
        Ok(handler) => handler,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = handler.execute(cli.command).await {
        eprintln!("Error: {}", e);
        if let keyprotect::KpError::Api { .. } = e {
            eprintln!("{}", e.render());
        }
        std::process::exit(1);
    }
}
