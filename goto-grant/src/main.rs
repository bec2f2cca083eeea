//! goto-grant - Automated (browser-less) OAuth setup for a GoToSocial bot
//!
//! Registers an application and then performs the browser legs of the
//! authorization code flow itself: login page fetch, credential form post,
//! allow form post, code capture. Useful for bot accounts whose
//! credentials you control. Falls back to nothing; when an instance's
//! login flow does not match, use goto-setup instead.

use std::path::PathBuf;

use clap::Parser;
use libgotobot::config::resolve_credentials_path;
use libgotobot::error::{GotobotError, Result};
use libgotobot::oauth;
use tracing::info;

#[derive(Parser)]
#[command(name = "goto-grant")]
#[command(about = "Automated browser-less OAuth token setup for GoToSocial bots", long_about = None)]
struct Cli {
    /// Instance URL (e.g., https://gts.example.org)
    #[arg(long, env = "GOTOBOT_INSTANCE")]
    instance: String,

    /// Name for the application/bot
    #[arg(long)]
    app_name: String,

    /// Account username or email
    #[arg(long)]
    username: String,

    /// Account password (prompted when omitted)
    #[arg(long)]
    password: Option<String>,

    /// OAuth scopes
    #[arg(long, default_value = "read write")]
    scopes: String,

    /// Output file for credentials (default: XDG config dir)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    libgotobot::logging::init_with_verbose(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        if matches!(e, GotobotError::Auth(_)) {
            eprintln!("\nThe automated flow is not guaranteed to work on every instance.");
            eprintln!("If this keeps failing, run the interactive flow: goto-setup");
        }
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let password = match cli.password {
        Some(password) => password,
        None => rpassword::prompt_password("Account password: ")
            .map_err(|e| GotobotError::InvalidInput(format!("cannot read password: {}", e)))?,
    };
    if password.trim().is_empty() {
        return Err(GotobotError::InvalidInput(
            "no password provided".to_string(),
        ));
    }

    println!("Setting up a bot on {} (automated flow)", cli.instance);
    println!("────────────────────────────────────────────────────────\n");

    let credentials = oauth::automated_setup(
        &cli.instance,
        &cli.app_name,
        &cli.scopes,
        &cli.username,
        &password,
    )
    .await?;

    let path = match cli.output {
        Some(path) => path,
        None => resolve_credentials_path()?,
    };
    credentials.save(&path)?;
    info!(path = %path.display(), "credentials saved");

    println!("🎉 Setup complete!");
    println!("  Account:     @{}", credentials.username());
    println!("  Credentials: {}", path.display());
    println!("\nTry it out:");
    println!("  goto-post \"Hello fediverse!\" --credentials {}", path.display());

    Ok(())
}
