use crate::config::schema::{QuerySet, ValidationError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to load a query-set file, tagged with the file when known.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read query set from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse query set TOML{}: {source}", location(path))]
    Toml {
        path: Option<PathBuf>,
        #[source]
        source: toml_edit::de::Error,
    },

    #[error("invalid query set{}: {source}", location(path))]
    Validation {
        path: Option<PathBuf>,
        #[source]
        source: ValidationError,
    },
}

impl ConfigError {
    fn at(self, file: &Path) -> Self {
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(file.to_path_buf()),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(file.to_path_buf()),
                source,
            },
            other => other,
        }
    }
}

fn location(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|path| format!(" ({})", path.display()))
        .unwrap_or_default()
}

pub fn load_from_str(input: &str) -> Result<QuerySet, ConfigError> {
    let set: QuerySet =
        toml_edit::de::from_str(input).map_err(|source| ConfigError::Toml { path: None, source })?;
    set.validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(set)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<QuerySet, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.at(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_minimal_set() {
        let set = load_from_str(
            r#"
language = "python"

[[queries]]
name = "ints"
pattern = "(integer) @int"
"#,
        )
        .unwrap();
        assert_eq!(set.language, "python");
        assert_eq!(set.queries.len(), 1);
        assert_eq!(set.queries[0].range(), None);
    }

    #[test]
    fn malformed_toml_reported() {
        let err = load_from_str("language = ").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { path: None, .. }));
    }

    #[test]
    fn messages_name_the_file() {
        let err = load_from_str("language = ").unwrap_err();
        assert!(err.to_string().starts_with("failed to parse query set TOML: "));

        let err = err.at(Path::new("sets/a.toml"));
        assert!(err
            .to_string()
            .starts_with("failed to parse query set TOML (sets/a.toml): "));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn missing_file_reported_with_path() {
        let err = load_from_path("/definitely/not/here.toml").unwrap_err();
        match err {
            ConfigError::Io { path, .. } => assert_eq!(path, PathBuf::from("/definitely/not/here.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
