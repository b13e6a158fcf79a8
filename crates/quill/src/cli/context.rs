//! Reading and writing context files.

use quill::{ConfigError, GenerationContext, IoError, QuillResult};
use std::path::Path;

/// Read a [`GenerationContext`] from a TOML file.
pub fn load_context(path: &Path) -> QuillResult<GenerationContext> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| IoError::new(format!("Failed to read {}: {}", path.display(), e)))?;
    let context = toml::from_str(&text)
        .map_err(|e| ConfigError::new(format!("Invalid context: {}", e)).with_source_file(path))?;
    tracing::debug!(path = %path.display(), "Loaded context");
    Ok(context)
}

/// Write a [`GenerationContext`] back as pretty TOML.
pub fn save_context(path: &Path, context: &GenerationContext) -> QuillResult<()> {
    let text = toml::to_string_pretty(context)
        .map_err(|e| ConfigError::new(format!("Failed to serialize context: {}", e)))?;
    std::fs::write(path, text)
        .map_err(|e| IoError::new(format!("Failed to write {}: {}", path.display(), e)))?;
    Ok(())
}
