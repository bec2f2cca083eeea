//! goto-post - Post a status from a saved credentials record
//!
//! Reads the credentials file (or the GOTOBOT_INSTANCE/GOTOBOT_TOKEN
//! environment override for ad hoc use), optionally uploads media, and
//! posts one status. Content comes from the argument or stdin.

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use libgotobot::client::{BotClient, StatusParams};
use libgotobot::config::{env_override, resolve_credentials_path};
use libgotobot::credentials::Credentials;
use libgotobot::error::{GotobotError, Result};
use libgotobot::types::Visibility;
use tracing::info;

#[derive(Parser)]
#[command(name = "goto-post")]
#[command(about = "Post a status to a GoToSocial instance", long_about = None)]
struct Cli {
    /// Content to post (reads from stdin if not provided)
    content: Option<String>,

    /// Status visibility: public, unlisted, private, or direct
    #[arg(long, default_value = "public")]
    visibility: Visibility,

    /// Content warning (spoiler) text; also marks the status sensitive
    #[arg(long)]
    cw: Option<String>,

    /// ID of a status to reply to
    #[arg(long)]
    reply_to: Option<String>,

    /// Media file to attach (repeatable)
    #[arg(long)]
    media: Vec<PathBuf>,

    /// Alt text for the attached media (applied to each attachment)
    #[arg(long)]
    alt: Option<String>,

    /// Path to the credentials file
    #[arg(short, long)]
    credentials: Option<PathBuf>,

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
    let client = build_client(cli.credentials.as_deref())?;

    let content = read_content(cli.content)?;
    BotClient::validate_content(&content)?;

    // Upload attachments first; their ids go on the status
    let mut media_ids = Vec::with_capacity(cli.media.len());
    for path in &cli.media {
        let attachment = client.upload_media(path, cli.alt.as_deref()).await?;
        info!(id = %attachment.id, path = %path.display(), "media uploaded");
        media_ids.push(attachment.id);
    }

    let params = StatusParams {
        text: content,
        visibility: cli.visibility,
        sensitive: cli.cw.is_some(),
        spoiler_text: cli.cw,
        in_reply_to_id: cli.reply_to,
        media_ids,
    };

    let status = client.post_status(&params).await?;
    match status.url {
        Some(url) => println!("{}", url),
        None => println!("{}", status.id),
    }

    Ok(())
}

/// Environment override wins; otherwise load the credentials record
fn build_client(credentials_path: Option<&std::path::Path>) -> Result<BotClient> {
    if let Some((instance, token)) = env_override() {
        info!(instance = %instance, "using environment override");
        return BotClient::new(&instance, &token);
    }

    let path = match credentials_path {
        Some(path) => path.to_path_buf(),
        None => resolve_credentials_path()?,
    };
    let creds = Credentials::load(&path)?;
    BotClient::from_credentials(&creds)
}

fn read_content(arg: Option<String>) -> Result<String> {
    if let Some(content) = arg {
        return Ok(content);
    }

    if atty::is(atty::Stream::Stdin) {
        return Err(GotobotError::InvalidInput(
            "no content given; pass it as an argument or pipe it on stdin".to_string(),
        ));
    }

    let mut content = String::new();
    std::io::stdin()
        .read_to_string(&mut content)
        .map_err(|e| GotobotError::InvalidInput(format!("cannot read from stdin: {}", e)))?;
    Ok(content.trim_end().to_string())
}
