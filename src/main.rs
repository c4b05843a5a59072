use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use authkeep::config::default_config_path;
use authkeep::{BackendKind, CredentialHelper, Credentials, KeyringConfig, KeyringHelper};
use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "authkeep")]
#[command(about = "Store login credentials in the system keyring")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use only this backend (wallet, secret_service or pass)
    #[arg(long)]
    backend: Option<BackendKind>,

    /// Password store directory for the pass backend
    #[arg(long)]
    pass_dir: Option<PathBuf>,

    /// Log as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store credentials; the secret is read from stdin
    Add {
        #[arg(long)]
        url: String,
        #[arg(long)]
        username: String,
    },
    /// Look up stored credentials
    Get {
        #[arg(long)]
        url: String,
        /// Print the secret as well as the username
        #[arg(long)]
        show_secret: bool,
    },
    /// Remove stored credentials
    Delete {
        #[arg(long)]
        url: String,
    },
    /// Show which backend opens
    Status,
    /// List the backends that would be tried, in order
    Backends,
}

fn init_tracing(json: bool) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(json.then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .json()
        }))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn resolve_config(cli: &Cli) -> Result<KeyringConfig> {
    let path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config =
        KeyringConfig::load_or_default(&path)?.merge_env(|name| std::env::var(name).ok());

    if let Some(backend) = cli.backend {
        config.backend = Some(backend);
    }
    if let Some(pass_dir) = &cli.pass_dir {
        config.pass_dir = Some(pass_dir.clone());
    }

    Ok(config)
}

fn read_secret() -> Result<String> {
    let mut secret = String::new();
    std::io::stdin()
        .read_to_string(&mut secret)
        .context("Failed to read secret from stdin")?;

    let secret = secret.trim_end_matches(['\r', '\n']).to_string();
    if secret.is_empty() {
        anyhow::bail!("No secret given on stdin");
    }
    Ok(secret)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = resolve_config(&cli)?;

    if let Command::Backends = cli.command {
        for (position, descriptor) in config.candidates().iter().enumerate() {
            println!("{}. {descriptor}", position + 1);
        }
        return Ok(());
    }

    let helper = KeyringHelper::open(&config).context("Failed to open keyring")?;

    match cli.command {
        Command::Add { url, username } => {
            let secret = read_secret()?;
            helper
                .add(&Credentials::new(url.as_str(), username, secret))
                .with_context(|| format!("Failed to store credentials for {url}"))?;
            println!("Stored credentials for {url} in {}", helper.backend_name());
        }
        Command::Get { url, show_secret } => {
            let (username, secret) = helper
                .get(&url)
                .with_context(|| format!("No credentials for {url}"))?;
            println!("username: {username}");
            if show_secret {
                println!("secret: {}", secret.expose_secret());
            }
        }
        Command::Delete { url } => {
            helper
                .delete(&url)
                .with_context(|| format!("Failed to delete credentials for {url}"))?;
            println!("Deleted credentials for {url}");
        }
        Command::Status => {
            println!("Backend: {}", helper.backend_name());
        }
        Command::Backends => {}
    }

    Ok(())
}
