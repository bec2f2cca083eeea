//! goto-setup - Interactive OAuth setup for a GoToSocial bot
//!
//! Registers an application, prints the authorization URL for the operator
//! to open in a browser, reads the pasted code back, then exchanges and
//! verifies the token and writes the credentials file.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use libgotobot::config::{normalize_instance_url, resolve_credentials_path};
use libgotobot::credentials::Credentials;
use libgotobot::error::{GotobotError, Result};
use libgotobot::oauth::{self, OOB_REDIRECT_URI};
use tracing::info;

#[derive(Parser)]
#[command(name = "goto-setup")]
#[command(about = "Interactive OAuth token setup for GoToSocial bots", long_about = None)]
struct Cli {
    /// Instance URL (e.g., https://gts.example.org)
    #[arg(long, env = "GOTOBOT_INSTANCE")]
    instance: String,

    /// Name for the application/bot
    #[arg(long)]
    app_name: String,

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
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let instance_url = normalize_instance_url(&cli.instance);

    println!("Setting up a bot on {}", instance_url);
    println!("────────────────────────────────────────────────────────\n");

    // Step 1: register the application
    let client = oauth::http_client()?;
    let registration =
        oauth::register_app(&client, &instance_url, &cli.app_name, &cli.scopes).await?;
    println!("✓ Application '{}' registered", cli.app_name);

    // Step 2: have the operator authorize it in a browser
    let auth_url = oauth::authorize_url(&instance_url, &registration.client_id, &cli.scopes);
    println!("\nOpen this URL in your browser, log in, and authorize the application:\n");
    println!("  {}\n", auth_url);

    let code = prompt_code()?;

    // Step 3: exchange the code
    let token = oauth::token::exchange_code(
        &client,
        &instance_url,
        &registration.client_id,
        &registration.client_secret,
        &code,
        OOB_REDIRECT_URI,
        &cli.scopes,
    )
    .await?;
    println!("✓ Access token obtained");

    // Step 4: verify it works
    let account = oauth::token::verify_token(&client, &instance_url, &token.access_token).await?;
    println!("✓ Token verified for @{}", account.username);

    // Step 5: persist the record
    let credentials = Credentials {
        instance_url,
        app_name: cli.app_name,
        client_id: registration.client_id,
        client_secret: registration.client_secret,
        access_token: token.access_token,
        token_type: token.token_type.unwrap_or_else(|| "Bearer".to_string()),
        scope: token.scope.or(Some(cli.scopes)),
        created_at: token.created_at,
        account: Some(account),
    };

    let path = match cli.output {
        Some(path) => path,
        None => resolve_credentials_path()?,
    };
    credentials.save(&path)?;
    info!(path = %path.display(), "credentials saved");

    println!("\n🎉 Setup complete!");
    println!("  Account:     @{}", credentials.username());
    println!("  Credentials: {}", path.display());
    println!("\nTry it out:");
    println!("  goto-post \"Hello fediverse!\" --credentials {}", path.display());

    Ok(())
}

fn prompt_code() -> Result<String> {
    print!("Enter the authorization code: ");
    io::stdout()
        .flush()
        .map_err(|e| GotobotError::InvalidInput(format!("cannot write to stdout: {}", e)))?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .map_err(|e| GotobotError::InvalidInput(format!("cannot read from stdin: {}", e)))?;

    let code = input.trim().to_string();
    if code.is_empty() {
        return Err(GotobotError::InvalidInput(
            "no authorization code provided".to_string(),
        ));
    }
    Ok(code)
}
