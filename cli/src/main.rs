//! Pidmint CLI - Command-line front-end for persistent-identifier registration.
//!
//! ## Module Organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`commands`] | Command handlers, one per subcommand |
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `reserve` | Reserve an identifier in the registry |
//! | `status` | Show current registry metadata for an identifier |
//! | `publish` | Make a reserved identifier publicly resolvable |
//! | `withdraw` | Retire an identifier (delete if reserved, tombstone if public) |
//! | `lookup` | Probe whether a candidate identifier is free |
//!
//! Registry endpoint and credentials come from the environment
//! (`PIDMINT_REGISTRY_URL`, `PIDMINT_USERNAME`, `PIDMINT_PASSWORD`,
//! `PIDMINT_SITE_URL`, `PIDMINT_PUBLISHER`); `--registry-url` and
//! `--site-url` override per invocation.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use pidmint_core::config::RegistryConfig;
use pidmint_core::provider::EzidDoiProvider;

#[derive(Parser)]
#[command(name = "pidmint", version, about = "Reserve, publish, and withdraw persistent identifiers")]
struct Cli {
    /// Registry API base URL (overrides PIDMINT_REGISTRY_URL)
    #[arg(long, global = true)]
    registry_url: Option<String>,

    /// Site base URL landing pages live under (overrides PIDMINT_SITE_URL)
    #[arg(long, global = true)]
    site_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Identifier parts shared by every subcommand.
#[derive(Args)]
struct IdentifierArgs {
    /// Identifier protocol
    #[arg(long, default_value = "doi")]
    protocol: String,

    /// Authority namespace, e.g. 10.5072/FK2
    #[arg(long)]
    authority: String,

    /// Separator between authority and local part
    #[arg(long, default_value = "/")]
    separator: String,

    /// Local identifier part
    local: String,
}

/// Descriptive fields used to derive registry metadata.
#[derive(Args)]
struct MetadataArgs {
    /// Dataset title
    #[arg(long, default_value = "")]
    title: String,

    /// Author name; repeat for multiple authors
    #[arg(long = "author")]
    authors: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reserve an identifier in the registry
    Reserve {
        #[command(flatten)]
        id: IdentifierArgs,
        #[command(flatten)]
        metadata: MetadataArgs,
    },
    /// Show current registry metadata for an identifier
    Status {
        #[command(flatten)]
        id: IdentifierArgs,
    },
    /// Make a reserved identifier publicly resolvable
    Publish {
        #[command(flatten)]
        id: IdentifierArgs,
        #[command(flatten)]
        metadata: MetadataArgs,
    },
    /// Retire an identifier: delete if reserved, tombstone if public
    Withdraw {
        #[command(flatten)]
        id: IdentifierArgs,
        #[command(flatten)]
        metadata: MetadataArgs,
    },
    /// Probe whether a candidate identifier is free
    Lookup {
        #[command(flatten)]
        id: IdentifierArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = RegistryConfig::from_env();
    if let Some(registry_url) = &cli.registry_url {
        config = config.with_base_url(registry_url);
    }
    if let Some(site_url) = &cli.site_url {
        config = config.with_site_url(site_url);
    }

    let provider = EzidDoiProvider::from_config(&config)?;

    match cli.command {
        Commands::Reserve { id, metadata } => commands::reserve(&provider, &id, &metadata),
        Commands::Status { id } => commands::status(&provider, &id),
        Commands::Publish { id, metadata } => commands::publish(&provider, &id, &metadata),
        Commands::Withdraw { id, metadata } => commands::withdraw(&provider, &id, &metadata),
        Commands::Lookup { id } => commands::lookup(&provider, &id),
    }
}
