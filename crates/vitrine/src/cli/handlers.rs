//! Command handlers.

use super::commands::{Commands, OutputFormat, VisibilityArg};
use std::path::Path;
use std::sync::Arc;
use vitrine::{AppContext, ImageFile, ImageService, ImageView, ListQuery, VitrineConfig};
use vitrine_error::{StorageError, StorageErrorKind, VitrineResult};
use vitrine_security::SecretKey;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Run one command to completion.
pub async fn handle_command(
    command: Commands,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> CliResult {
    if let Commands::Keygen = command {
        println!("{}", SecretKey::generate().to_hex());
        return Ok(());
    }

    let config = VitrineConfig::load(config_path)?;
    let context = Arc::new(AppContext::new(config).await?);
    let service = ImageService::new(context)?;

    match command {
        Commands::Keygen => {}

        Commands::Migrate => {
            println!("Database is up to date");
        }

        Commands::Upload {
            user,
            path,
            private,
        } => {
            let data = read_file(&path).await?;
            let view = service.upload(user, data, private).await?;
            print_view(&view, format)?;
        }

        Commands::List {
            user,
            filter,
            order_by,
            ascending,
            page,
            limit,
        } => {
            let query = ListQuery::builder()
                .filter(filter.into())
                .order_by(order_by.into())
                .ascending(ascending)
                .page(page)
                .limit(limit)
                .build();
            let views = service.list_images(user, query).await?;
            print_views(&views, format)?;
        }

        Commands::Fetch {
            user,
            image_id,
            variant,
        } => {
            let file = service.fetch_private(user, image_id, variant.into()).await?;
            print_file(&file, format)?;
        }

        Commands::Public {
            file_name,
            key,
            variant,
        } => {
            let file = service.fetch_public(&file_name, &key, variant.into()).await?;
            print_file(&file, format)?;
        }

        Commands::Visibility {
            user,
            image_id,
            state,
        } => {
            let private = matches!(state, VisibilityArg::Private);
            let view = service.update_visibility(user, image_id, private).await?;
            print_view(&view, format)?;
        }

        Commands::Delete { user, image_id } => {
            service.delete(user, image_id).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::json!({ "deleted": image_id })),
                OutputFormat::Human => println!("Deleted image {}", image_id),
            }
        }
    }

    Ok(())
}

async fn read_file(path: &Path) -> VitrineResult<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", path.display(), e))).into()
    })
}

fn print_view(view: &ImageView, format: OutputFormat) -> CliResult {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(view)?),
        OutputFormat::Human => {
            println!("{:-<80}", "");
            println!("Image:       {} ({})", view.image_id, view.image_hash_name);
            println!(
                "Visibility:  {}",
                if view.is_private { "private" } else { "public" }
            );
            println!("Created:     {}", view.created_time);
            println!("Updated:     {}", view.updated_time);
            println!("Private URL: {}", view.private_url);
            if let Some(url) = &view.public_url {
                println!("Public URL:  {}", url);
            }
        }
    }
    Ok(())
}

fn print_views(views: &[ImageView], format: OutputFormat) -> CliResult {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(views)?),
        OutputFormat::Human => {
            for view in views {
                print_view(view, format)?;
            }
            println!("{:-<80}", "");
            println!("Total: {} images", views.len());
        }
    }
    Ok(())
}

fn print_file(file: &ImageFile, format: OutputFormat) -> CliResult {
    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "path": file.path,
                "variant": file.variant,
                "mime_type": file.mime_type,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Human => {
            println!("{} ({}, {})", file.path.display(), file.variant, file.mime_type);
        }
    }
    Ok(())
}
