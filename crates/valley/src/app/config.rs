use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use super::locations::{LocationError, LocationRegistry, LocationTable};

pub(crate) const LOCATIONS_ENV_VAR: &str = "VALLEY_LOCATIONS";
pub(crate) const LOCATIONS_FILE_NAME: &str = "locations.json";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("read location table '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse location table '{}' at {json_path}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid location table: {0}")]
    Invalid(#[from] LocationError),
}

/// Loads the registry from `VALLEY_LOCATIONS`, then `assets/locations.json`,
/// then the built-in table, in that order.
pub(crate) fn load_locations(assets_dir: Option<&Path>) -> Result<LocationRegistry, ConfigError> {
    match configured_locations_path(assets_dir) {
        Some(path) => {
            let registry = load_location_file(&path)?;
            info!(
                path = %path.display(),
                location_count = registry.locations().len(),
                "locations_loaded"
            );
            Ok(registry)
        }
        None => {
            info!("locations_builtin");
            Ok(LocationRegistry::builtin()?)
        }
    }
}

fn configured_locations_path(assets_dir: Option<&Path>) -> Option<PathBuf> {
    match env::var(LOCATIONS_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => return Some(PathBuf::from(value.trim())),
        Ok(_) | Err(env::VarError::NotPresent) => {}
        Err(error) => warn!(var = LOCATIONS_ENV_VAR, error = %error, "env_var_ignored"),
    }
    let candidate = assets_dir?.join(LOCATIONS_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

pub(crate) fn load_location_file(path: &Path) -> Result<LocationRegistry, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let table = parse_location_table(&raw, path)?;
    Ok(LocationRegistry::from_table(table)?)
}

pub(crate) fn parse_location_table(raw: &str, path: &Path) -> Result<LocationTable, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, LocationTable>(&mut deserializer).map_err(|error| {
        let json_path = error.path().to_string();
        ConfigError::Parse {
            path: path.to_path_buf(),
            json_path,
            source: error.into_inner(),
        }
    })
}
