use crate::error::Result;
use modeldex_api::models::Catalog;
use std::path::Path;

/// Read a persisted catalog. A missing file is `Ok(None)`.
pub fn load_catalog(path: &Path) -> Result<Option<Catalog>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Persist `catalog` as pretty JSON, replacing the previous file atomically.
pub fn save_catalog(catalog: &Catalog, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(catalog)?;

    // Write to temp, then rename
    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, json)?;
    std::fs::rename(temp_path, path)?;

    tracing::info!("Saved catalog to {}", path.display());
    Ok(())
}
