use crate::{CompareConfig, CompareError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "contentcmp.toml";

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: CompareConfig,
    pub path: PathBuf,
    pub exists: bool,
    pub portable: bool,
}

pub fn load_config(prefer_portable: bool) -> Result<LoadedConfig, CompareError> {
    let (path, portable) = resolve_config_path(prefer_portable)?;
    load_config_from(path, portable)
}

pub fn load_config_from(path: PathBuf, portable: bool) -> Result<LoadedConfig, CompareError> {
    let exists = path.exists();

    let config = if exists {
        let data = fs::read_to_string(&path)?;
        toml::from_str(&data)
            .map_err(|e| CompareError::Config(format!("{}: {}", path.display(), e)))?
    } else {
        CompareConfig::default()
    };

    Ok(LoadedConfig {
        config,
        path,
        exists,
        portable,
    })
}

pub fn ensure_config(prefer_portable: bool) -> Result<LoadedConfig, CompareError> {
    let loaded = load_config(prefer_portable)?;
    if !loaded.exists {
        save_config(&loaded.path, &loaded.config)?;
    }
    Ok(loaded)
}

pub fn save_config(path: &Path, config: &CompareConfig) -> Result<(), CompareError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = toml::to_string_pretty(config)
        .map_err(|e| CompareError::Serialization(e.to_string()))?;
    fs::write(path, data)?;
    Ok(())
}

fn resolve_config_path(prefer_portable: bool) -> Result<(PathBuf, bool), CompareError> {
    if let Some(portable_path) = portable_config_path() {
        if prefer_portable || portable_path.exists() {
            return Ok((portable_path, true));
        }
    }

    let dirs = ProjectDirs::from("", "contentcmp", "contentcmp")
        .ok_or_else(|| CompareError::Config("Unable to determine config directory".to_string()))?;
    Ok((dirs.config_dir().join(CONFIG_FILE_NAME), false))
}

fn portable_config_path() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CompareMode;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let loaded = load_config_from(dir.path().join(CONFIG_FILE_NAME), false).unwrap();
        assert!(!loaded.exists);
        assert_eq!(loaded.config, CompareConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = CompareConfig {
            mode: CompareMode::Diff,
            identity_separator: "|".to_string(),
            ..CompareConfig::default()
        };
        save_config(&path, &config).unwrap();

        let loaded = load_config_from(path, false).unwrap();
        assert!(loaded.exists);
        assert_eq!(loaded.config, config);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "mode = [").unwrap();
        let err = load_config_from(path, false).unwrap_err();
        assert!(matches!(err, CompareError::Config(_)));
    }
}
