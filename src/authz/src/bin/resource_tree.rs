//! Resource Tree CLI
//!
//! Loads a JSON dataset into the in-memory stores, resolves the resources a
//! user may see on a client and prints the forest as pretty JSON.

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use resource_authz::telemetry::init_tracing;
use resource_authz::{Dataset, ResolverConfig};
use std::path::PathBuf;
use tracing::info;

/// Resolve a user's visible resource hierarchy
#[derive(Parser, Debug)]
#[command(name = "resource-tree")]
#[command(about = "Resolve the resources a user may see on a client")]
#[command(version)]
#[command(group(ArgGroup::new("query").args(["name", "permission", "sub_resources"])))]
struct Cli {
    /// JSON dataset with clients, users, resources and policies
    #[arg(short, long, env = "RESOURCE_TREE_DATASET")]
    dataset: PathBuf,

    /// TOML resolver configuration
    #[arg(short, long, env = "RESOURCE_TREE_CONFIG")]
    config: Option<PathBuf>,

    /// Client owning the resource server
    #[arg(long)]
    client: String,

    /// User to resolve for
    #[arg(long)]
    user: String,

    /// Only resources equal to, or under, the named resource
    #[arg(long)]
    name: Option<String>,

    /// Only resources carrying, or under one carrying, the permission
    #[arg(long)]
    permission: Option<String>,

    /// Link resources by name through the parent attribute
    #[arg(long)]
    sub_resources: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ResolverConfig::from_file(path)?,
        None => ResolverConfig::default(),
    };

    let level = if cli.verbose { "debug" } else { config.logging.level.as_str() };
    init_tracing(level);

    info!("Starting resource-tree v{}", resource_authz::VERSION);

    let stores = Dataset::from_file(&cli.dataset)?
        .load()
        .await
        .context("Failed to load dataset")?;

    let client = stores
        .client(&cli.client)
        .with_context(|| format!("Unknown client {}", cli.client))?;
    let user = stores
        .user(&cli.user)
        .with_context(|| format!("Unknown user {}", cli.user))?;

    let resolver = stores.resolver(config);

    let forest = if let Some(name) = &cli.name {
        resolver.resources_by_name(&client, &user, name).await?
    } else if let Some(permission) = &cli.permission {
        resolver.resources_by_permission(&client, &user, permission).await?
    } else if cli.sub_resources {
        resolver.sub_resources_for_user(&client, &user).await?
    } else {
        resolver.resources_for_user(&client, &user).await?
    };

    println!("{}", serde_json::to_string_pretty(&forest)?);
    Ok(())
}
