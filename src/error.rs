//! Error types for flag resolution.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced while loading configuration and binding flags.
///
/// A config file that cannot be found during discovery is not an error: the
/// loader treats it as an empty store and resolution continues with the
/// environment and defaults.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed reading config file {}: {source}", path.display())]
    ConfigFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed parsing config file {}: {source}", path.display())]
    ConfigFileParse {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Unsupported config extension '.{extension}' for file {}", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error(transparent)]
    Binding(#[from] BindingErrors),

    #[error("Failed decoding settings into target: {0}")]
    Decode(#[source] serde_yaml::Error),

    #[error("Failed rendering settings as YAML: {0}")]
    Encode(#[source] serde_yaml::Error),

    #[error("Binding was cancelled before all flags were resolved")]
    Cancelled,

    #[error(transparent)]
    Cli(#[from] clap::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A single key that could not be bound because another binding already
/// claims it, or claims a namespace above or below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingError {
    pub flag: String,
    pub key: String,
    pub existing_flag: String,
    pub existing_key: String,
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key == self.existing_key {
            write!(
                f,
                "flag '{}' cannot bind key '{}': already bound to flag '{}'",
                self.flag, self.key, self.existing_flag
            )
        } else {
            write!(
                f,
                "flag '{}' cannot bind key '{}': conflicts with key '{}' bound to flag '{}'",
                self.flag, self.key, self.existing_key, self.existing_flag
            )
        }
    }
}

/// Every binding failure of one resolution pass, reported together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BindingErrors(Vec<BindingError>);

impl BindingErrors {
    pub fn new(errors: Vec<BindingError>) -> Self {
        Self(errors)
    }

    pub fn errors(&self) -> &[BindingError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for BindingErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.0.len() == 1 { "error" } else { "errors" };
        write!(f, "{} flag binding {}:", self.0.len(), noun)?;
        for err in &self.0 {
            write!(f, "\n  - {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for BindingErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    fn conflict(flag: &str, key: &str, existing_flag: &str, existing_key: &str) -> BindingError {
        BindingError {
            flag: flag.to_string(),
            key: key.to_string(),
            existing_flag: existing_flag.to_string(),
            existing_key: existing_key.to_string(),
        }
    }

    #[test]
    fn test_binding_errors_list_every_conflict() {
        let errors = BindingErrors::new(vec![
            conflict("db-host", "db.host", "db", "db"),
            conflict("db-port", "db.port", "db", "db"),
        ]);

        let rendered = errors.to_string();
        assert!(rendered.starts_with("2 flag binding errors:"));
        assert!(rendered.contains("flag 'db-host' cannot bind key 'db.host'"));
        assert!(rendered.contains("flag 'db-port' cannot bind key 'db.port'"));
    }

    #[test]
    fn test_same_key_conflict_message() {
        let err = conflict("db_host", "db.host", "db-host", "db.host");
        assert_eq!(
            err.to_string(),
            "flag 'db_host' cannot bind key 'db.host': already bound to flag 'db-host'"
        );
    }

    #[test]
    fn test_encode_and_decode_messages_differ() {
        let source = || serde_yaml::from_str::<u8>("x").expect_err("not a number");
        assert!(Error::Encode(source()).to_string().starts_with("Failed rendering settings as YAML"));
        assert!(Error::Decode(source()).to_string().starts_with("Failed decoding settings into target"));
    }
}
