//! Config file discovery and parsing

use crate::error::{Error, Result};
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions tried, in order, when discovering `<name>.<ext>`.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["yaml", "yml", "json", "toml"];

/// A parsed config document together with the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub document: Value,
}

/// Load the explicit file when one is given, otherwise discover
/// `default_name` in `search_paths`.
///
/// Returns `Ok(None)` when discovery finds nothing. An explicit file that
/// cannot be read, or any file that cannot be parsed, is an error.
pub fn load_file(
    explicit: Option<&Path>,
    default_name: Option<&str>,
    search_paths: &[PathBuf],
) -> Result<Option<LoadedFile>> {
    let discovered = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_name.and_then(|name| discover_config(name, search_paths)),
    };

    let Some(config_file) = discovered else {
        tracing::info!(
            name = default_name.unwrap_or(""),
            "Could not find configuration file, continuing without one"
        );
        return Ok(None);
    };

    tracing::trace!(file = %config_file.display(), "Loading config");
    let content = fs::read_to_string(&config_file)
        .map_err(|source| Error::ConfigFileRead { path: config_file.clone(), source })?;

    let document = parse_document(&content, &config_file)?;
    tracing::debug!(file = %config_file.display(), "Loaded config file");

    Ok(Some(LoadedFile { path: config_file, document }))
}

/// Parse file content by extension into a YAML value whose top level is a
/// mapping. An empty file is an empty mapping.
pub fn parse_document(content: &str, config_file: &Path) -> Result<Value> {
    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();

    let parse_err = |source: Box<dyn std::error::Error + Send + Sync>| Error::ConfigFileParse {
        path: config_file.to_path_buf(),
        source,
    };

    let value: Value = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(content).map_err(|e| parse_err(Box::new(e)))?,
        "json" => serde_json::from_str(content).map_err(|e| parse_err(Box::new(e)))?,
        "toml" => toml::from_str(content).map_err(|e| parse_err(Box::new(e)))?,
        other => {
            return Err(Error::UnsupportedFormat {
                path: config_file.to_path_buf(),
                extension: other.to_string(),
            })
        }
    };

    match value {
        Value::Null => Ok(Value::Mapping(Default::default())),
        Value::Mapping(_) => Ok(value),
        other => Err(parse_err(
            format!("expected a mapping at the top level, found {}", kind_of(&other)).into(),
        )),
    }
}

fn discover_config(name: &str, search_paths: &[PathBuf]) -> Option<PathBuf> {
    for dir in search_paths {
        for ext in SUPPORTED_EXTENSIONS {
            let path = dir.join(format!("{}.{}", name, ext));
            if path.is_file() {
                return Some(path);
            }
        }
    }

    None
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
