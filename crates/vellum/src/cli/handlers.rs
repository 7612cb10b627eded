//! Command handlers.

use super::{Cli, Commands};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use vellum::{
    CommandGenerator, Fallback, FallbackChain, FileId, GenerateOptions, Payload,
    ProgressEvent, SaveOptions, StorageError, StorageErrorKind, VellumConfig, VellumResult,
};

/// Load the configuration and apply CLI overrides.
fn load_config(config: Option<&Path>, root: Option<PathBuf>) -> VellumResult<VellumConfig> {
    let config = match config {
        Some(path) => VellumConfig::from_file(path)?,
        None => VellumConfig::load()?,
    };
    Ok(match root {
        Some(root) => config.with_root(root),
        None => config,
    })
}

fn parse_id(id: &str) -> VellumResult<FileId> {
    id.parse()
}

fn print_json(value: &impl serde::Serialize) -> VellumResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| vellum::JsonError::new(format!("Failed to format output: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// `--set` values are JSON when they parse as JSON, strings otherwise.
fn field_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn fallback_chain(names: &[String]) -> FallbackChain {
    names
        .iter()
        .map(|name| match name.as_str() {
            "original" => Fallback::Original,
            variant => Fallback::from(variant),
        })
        .collect::<Vec<_>>()
        .into()
}

/// Log progress events until the storage goes away.
fn log_progress(
    mut receiver: mpsc::UnboundedReceiver<ProgressEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            match event {
                ProgressEvent::Variant(progress) => tracing::info!(
                    id = %progress.id(),
                    ready = progress.ready().len(),
                    total = progress.total(),
                    "Variant progress"
                ),
                ProgressEvent::Batch(progress) => tracing::info!(
                    id = ?progress.id(),
                    ready = progress.ready(),
                    total = progress.total(),
                    "Batch progress"
                ),
            }
        }
    })
}

/// Execute a parsed command line.
///
/// Only commands that touch stored files require a storage root.
pub async fn run(cli: Cli) -> VellumResult<()> {
    let config = load_config(cli.config.as_deref(), cli.root)?;
    let storage = || config.clone().into_storage();

    match cli.command {
        Commands::Identify { file } => {
            let metadata = config
                .identifier()
                .identify(Payload::Path(&file))
                .await?;
            print_json(&metadata)?;
        }

        Commands::Save { file, name, fields } => {
            let mut options = SaveOptions::new();
            if let Some(name) = name {
                options = options.with_name(name);
            }
            if !fields.is_empty() {
                options = options.with_before_save(move |metadata| {
                    for (key, value) in &fields {
                        metadata.insert(key.clone(), field_value(value));
                    }
                    Ok(())
                });
            }

            let saved = storage()?.save_file(Payload::Path(&file), options).await?;
            println!("{}", saved.id);
        }

        Commands::Metadata { id } => {
            let id = parse_id(&id)?;
            match storage()?.file_metadata(&id).await? {
                Some(metadata) => print_json(&metadata)?,
                None => not_found(&id)?,
            }
        }

        Commands::Path {
            id,
            variant,
            fallback,
        } => {
            let id = parse_id(&id)?;
            match storage()?
                .file_path(&id, variant.as_deref(), fallback_chain(&fallback))
                .await
            {
                Some(path) => println!("{}", path.display()),
                None => not_found(&id)?,
            }
        }

        Commands::Delete { id } => {
            let id = parse_id(&id)?;
            storage()?.delete_file(&id).await?;
        }

        Commands::Generate { id, command, clean } => {
            let id = parse_id(&id)?;
            let storage = storage()?;
            let generator = CommandGenerator::new(command);
            let logger = log_progress(storage.subscribe());

            storage
                .generate_file_variants(&id, &generator, GenerateOptions { clean })
                .await?;

            drop(storage);
            logger.await.ok();
        }

        Commands::GenerateAll { command, clean } => {
            let storage = storage()?;
            let generator = CommandGenerator::new(command);
            let logger = log_progress(storage.subscribe());

            let ran = storage
                .generate_all_files_variants(&generator, GenerateOptions { clean })
                .await?;
            if !ran {
                tracing::warn!("Another regeneration pass is running");
            }

            drop(storage);
            logger.await.ok();
        }
    }

    Ok(())
}

/// Lookups report absence as `None`; the CLI turns that into a failing exit.
fn not_found(id: &FileId) -> VellumResult<()> {
    Err(StorageError::new(StorageErrorKind::FileRead(format!("{} not found", id))).into())
}
