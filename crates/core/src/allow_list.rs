//! Newline-delimited repository allow-list.
//!
//! Names outside this list are never touched, regardless of their presence
//! at the source.

use std::path::Path;

use tracing::{debug, info};

use crate::errors::ConfigError;

/// Ordered set of repository names eligible for migration.
///
/// Loaded once at startup; used only as a membership filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    names: Vec<String>,
}

impl AllowList {
    /// Load an allow-list from a newline-delimited file.
    ///
    /// Entries are trimmed, blank lines ignored, duplicates dropped keeping
    /// the first occurrence. A missing file or a file yielding no names is
    /// a configuration error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading repository allow-list");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let list = Self::parse(&contents)?;
        debug!(count = list.len(), "allow-list loaded");
        Ok(list)
    }

    fn parse(contents: &str) -> Result<Self, ConfigError> {
        let mut names: Vec<String> = Vec::new();
        for line in contents.lines() {
            let name = line.trim();
            if name.is_empty() {
                continue;
            }
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }

        if names.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "migrate.repo_list".into(),
                detail: "allow-list contains no repository names".into(),
            });
        }

        Ok(Self { names })
    }

    /// Whether `name` is eligible for migration.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_trims_and_skips_blanks() {
        let list = AllowList::parse("  alpha  \n\nbeta\n   \ngamma\n").unwrap();
        assert_eq!(list.names(), ["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_parse_drops_duplicates_keeping_order() {
        let list = AllowList::parse("alpha\nbeta\nalpha\n").unwrap();
        assert_eq!(list.names(), ["alpha", "beta"]);
    }

    #[test]
    fn test_parse_rejects_empty() {
        let result = AllowList::parse("\n   \n\n");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "migrate.repo_list"
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = AllowList::load("/nonexistent/repos.txt");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repos.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"alpha\nbeta\n").unwrap();

        let list = AllowList::load(&path).expect("load failed");
        assert_eq!(list.len(), 2);
        assert!(list.contains("alpha"));
        assert!(!list.contains("delta"));
    }
}
