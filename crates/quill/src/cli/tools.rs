//! Settings, health, evaluation, and extraction handlers.

use super::SettingsCommands;
use super::context::{load_context, save_context};
use quill::{
    ConfigError, FieldValue, IdeaField, IoError, PromptError, PromptErrorKind, QuillResult,
    Settings, backend_from_settings, evaluate, extract_field_value,
};
use std::io::Read;
use std::path::Path;

/// Handle `quill settings ...`.
pub fn handle_settings_command(
    command: SettingsCommands,
    settings: &Settings,
) -> QuillResult<()> {
    match command {
        SettingsCommands::Show => {
            let text = toml::to_string_pretty(settings)
                .map_err(|e| ConfigError::new(format!("Failed to serialize settings: {}", e)))?;
            print!("{}", text);
        }
        SettingsCommands::Init { path, force } => {
            let path = path
                .or_else(Settings::user_config_path)
                .ok_or_else(|| ConfigError::new("Could not determine home directory"))?;
            if path.exists() && !force {
                return Err(ConfigError::new(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                ))
                .into());
            }
            Settings::default().save(&path)?;
            println!("Wrote default settings to {}", path.display());
        }
    }
    Ok(())
}

/// Handle `quill health`.
pub async fn health(settings: &Settings) -> QuillResult<()> {
    let backend = backend_from_settings(settings);
    backend.health_check().await?;
    println!(
        "{} server at {} is reachable",
        backend.provider_name(),
        settings.base_url_with_scheme()
    );
    Ok(())
}

/// Handle `quill eval`.
pub fn evaluate_text(text: &str, times: usize) {
    for _ in 0..times {
        println!("{}", evaluate(text));
    }
}

/// Handle `quill extract`.
///
/// Prints the extracted value and, when a context file is given, stores it
/// in that file's metadata.
pub fn extract(
    field: IdeaField,
    input: Option<&Path>,
    context: Option<&Path>,
) -> QuillResult<()> {
    let selection = match input {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| IoError::new(format!("Failed to read {}: {}", path.display(), e)))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| IoError::new(format!("Failed to read stdin: {}", e)))?;
            buffer
        }
    };

    let Some(value) = extract_field_value(&selection, field) else {
        return Err(PromptError::new(PromptErrorKind::MissingSection(field.header())).into());
    };

    match &value {
        FieldValue::Text(text) => println!("{}", text),
        FieldValue::Tags(tags) => println!("{}", tags.join("\n")),
    }

    if let Some(path) = context {
        let mut generation_context = load_context(path)?;
        generation_context.metadata_mut().set_field(field, value);
        save_context(path, &generation_context)?;
        tracing::info!(field = %field, path = %path.display(), "Stored extracted value");
    }
    Ok(())
}
