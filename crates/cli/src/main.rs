mod commands;
mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shelf_core::{CollectionRegistry, StoreConfig};

/// shelf — image collections on disk
#[derive(Parser)]
#[command(name = "shelf", version, about)]
struct Cli {
    /// Directory holding the collections (overrides the config file)
    #[arg(long, env = "SHELF_ROOT")]
    root: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, env = "SHELF_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, list and remove collections
    Collections {
        #[command(subcommand)]
        action: CollectionsAction,
    },
    /// Work with the images of one collection
    Images {
        /// Collection name
        collection: String,

        #[command(subcommand)]
        action: ImagesAction,
    },
}

#[derive(Subcommand)]
enum CollectionsAction {
    /// List collection names
    Ls,
    /// Create an empty collection
    Create { id: String },
    /// Delete a collection and all of its images
    Rm { id: String },
    /// Delete every collection under the root
    Clear,
}

#[derive(Subcommand)]
enum ImagesAction {
    /// Add image files (jpg, jpeg, png, webp)
    Add {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List images
    Ls {
        /// INBOX, COLLECTION or ARCHIVE
        #[arg(long)]
        status: Option<String>,
        /// created_at or updated_at
        #[arg(long)]
        order_by: Option<String>,
        /// ASC or DESC
        #[arg(long)]
        direction: Option<String>,
    },
    /// Show one image record
    Show { id: String },
    /// Move an image to another status
    Status { id: String, status: String },
    /// Delete an image and its files
    Rm { id: String },
    /// Per-status counts
    Summary,
}

fn load_config(cli: &Cli) -> Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.json_logs);

    let registry = CollectionRegistry::new(load_config(&cli)?)?;

    match cli.command {
        Commands::Collections { action } => match action {
            CollectionsAction::Ls => commands::collections::list(&registry)?,
            CollectionsAction::Create { id } => commands::collections::create(&registry, &id)?,
            CollectionsAction::Rm { id } => commands::collections::delete(&registry, &id)?,
            CollectionsAction::Clear => commands::collections::clear(&registry)?,
        },
        Commands::Images { collection, action } => {
            registry.with_collection(&collection, |c| -> shelf_core::Result<()> {
                match action {
                    ImagesAction::Add { files } => commands::images::add(c, &files),
                    ImagesAction::Ls {
                        status,
                        order_by,
                        direction,
                    } => commands::images::list(
                        c,
                        status.as_deref(),
                        order_by.as_deref(),
                        direction.as_deref(),
                    ),
                    ImagesAction::Show { id } => commands::images::show(c, &id),
                    ImagesAction::Status { id, status } => {
                        commands::images::set_status(c, &id, &status)
                    }
                    ImagesAction::Rm { id } => commands::images::delete(c, &id),
                    ImagesAction::Summary => commands::images::summary(c),
                }
            })?
        }
    }

    Ok(())
}
