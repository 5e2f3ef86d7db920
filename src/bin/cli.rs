use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use registry_gitlab_auth::authz::resolve;
use registry_gitlab_auth::config::{NamingConfig, Settings};
use registry_gitlab_auth::docs;

#[derive(Parser, Debug)]
#[command(author, version, about = "registry gitlab auth tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the GitLab project paths tried for a package, in order
    Resolve { package: String },
    /// Validate the environment and print the effective settings
    CheckConfig,
    /// Write the OpenAPI document as JSON
    Openapi {
        /// Output file; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve { package } => {
            let naming = NamingConfig::from_lookup(|name| std::env::var(name).ok())?;
            let candidates = resolve(&package, &naming)?;
            for candidate in candidates {
                println!("{candidate}");
            }
        }
        Commands::CheckConfig => {
            let settings = Settings::from_env().context("invalid configuration")?;
            println!("{settings:#?}");
        }
        Commands::Openapi { out } => {
            let port = std::env::var("APP_PORT")
                .ok()
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(8000);
            let doc = serde_json::to_string_pretty(&docs::build_openapi(port)?)?;
            match out {
                Some(path) => {
                    fs::write(&path, doc).with_context(|| format!("failed to write {}", path.display()))?;
                    println!("wrote {}", path.display());
                }
                None => println!("{doc}"),
            }
        }
    }

    Ok(())
}
