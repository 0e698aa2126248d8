//! notes: terminal front-end for the notes API.
//!
//! Resolves configuration, hands the bearer token to the client once, then
//! runs a single command and prints its output.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use notes_cli::commands::{self, LocalFile, SaveRequest};
use notes_cli::config::{self, CliConfig, Overrides};
use notes_client::{NoteId, NotesClient};

#[derive(Parser, Debug)]
#[command(name = "notes")]
#[command(about = "Read and write notes from the terminal", version)]
struct Args {
    /// Base URL of the notes API (overrides NOTES_API_URL and config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer token from the identity provider (overrides NOTES_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Config directory (default: <platform config dir>/notes)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Print every HTTP exchange as a JSON line on stderr
    #[arg(long, global = true)]
    trace_requests: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List notes and subscription status
    List,
    /// Show a single note
    Show { id: NoteId },
    /// Create a note, or update one with --id
    Save {
        #[arg(long)]
        id: Option<NoteId>,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        /// File to upload and attach
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Delete a note
    Delete { id: NoteId },
    /// Upload a file without attaching it
    Upload { path: PathBuf },
    /// Show subscription status
    Status,
    /// Inspect or initialise configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Print public client configuration published by the backend
    PublicConfig { name: String },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the resolved configuration
    Show,
    /// Write a default config file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "notes=debug,notes_cli=debug,notes_client=debug"
    } else {
        "notes=info,notes_cli=info,notes_client=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_dir = config::config_dir(args.config.as_deref())?;
    let overrides = Overrides {
        api_url: args.api_url.clone(),
        token: args.token.clone(),
    };
    let cfg = CliConfig::resolve(&config_dir, overrides, |key| std::env::var(key).ok())?;
    debug!("API URL: {}", cfg.api_url);

    let output = match args.command {
        Command::Config { action } => run_config(action, &config_dir, &cfg)?,
        command => {
            let client = NotesClient::new(&cfg.api_url)
                .with_context(|| format!("Invalid API URL: {}", cfg.api_url))?;
            match &cfg.token {
                Some(token) => client.set_auth_token(token.clone()),
                None if !matches!(command, Command::PublicConfig { .. }) => {
                    warn!(
                        "No token configured; set {} or pass --token",
                        config::TOKEN_ENV
                    );
                }
                None => {}
            }

            let _trace = args.trace_requests.then(|| {
                client.events().subscribe(|event| {
                    if let Ok(line) = serde_json::to_string(event) {
                        eprintln!("{}", line);
                    }
                })
            });

            run(command, &client).await?
        }
    };

    println!("{}", output);
    Ok(())
}

async fn run(command: Command, client: &NotesClient) -> Result<String> {
    match command {
        Command::List => commands::list(client).await,
        Command::Show { id } => commands::show(client, id).await,
        Command::Save {
            id,
            title,
            content,
            file,
        } => {
            let file = match file {
                Some(path) => Some(LocalFile::read(&path).await?),
                None => None,
            };
            let request = SaveRequest {
                id,
                title,
                content,
                file,
            };
            commands::save(client, request).await
        }
        Command::Delete { id } => commands::delete(client, id).await,
        Command::Upload { path } => {
            let file = LocalFile::read(&path).await?;
            commands::upload_only(client, file).await
        }
        Command::Status => commands::status(client).await,
        Command::PublicConfig { name } => commands::public_config(client, &name).await,
        Command::Config { .. } => anyhow::bail!("config commands do not talk to the API"),
    }
}

fn run_config(action: ConfigAction, config_dir: &Path, cfg: &CliConfig) -> Result<String> {
    match action {
        ConfigAction::Show => {
            let file = cfg
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string());
            let token = if cfg.token.is_some() { "(set)" } else { "(not set)" };
            Ok(format!(
                "api_url: {}\ntoken: {}\nconfig file: {}",
                cfg.api_url, token, file
            ))
        }
        ConfigAction::Init => {
            let (path, created) = config::init(config_dir)?;
            if created {
                info!("Wrote {}", path.display());
                Ok(format!("Created {}", path.display()))
            } else {
                Ok(format!("{} already exists", path.display()))
            }
        }
    }
}
