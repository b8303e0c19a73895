use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PhrasebookConfig {
    pub database: Option<String>,
    pub import_file: Option<String>,
}

/// Database and import file locations after config and flags are applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub database: PathBuf,
    pub import_file: PathBuf,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("phrasebook.toml")
}

/// Directory holding the running executable, falling back to the working directory
pub fn install_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join("data").join("phrases.db")
}

pub fn default_import_path_in(base: &Path) -> PathBuf {
    base.join("data").join("phrases.json")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<PhrasebookConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: PhrasebookConfig = toml::from_str(&contents)?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &PhrasebookConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Flags win over the config file, which wins over install-relative defaults
pub fn resolve_paths(
    config: Option<&PhrasebookConfig>,
    database_flag: Option<&Path>,
    import_flag: Option<&Path>,
    base: &Path,
) -> ResolvedPaths {
    let database = database_flag
        .map(Path::to_path_buf)
        .or_else(|| config.and_then(|c| c.database.as_ref()).map(PathBuf::from))
        .unwrap_or_else(|| default_database_path_in(base));

    let import_file = import_flag
        .map(Path::to_path_buf)
        .or_else(|| config.and_then(|c| c.import_file.as_ref()).map(PathBuf::from))
        .unwrap_or_else(|| default_import_path_in(base));

    ResolvedPaths { database, import_file }
}
