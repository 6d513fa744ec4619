//! Loads the API catalog: the registry of cryptographic entry points and
//! where their algorithm/provider arguments live.

use std::collections::HashMap;
use std::path::Path;

use model::{ApiEntry, ApiRef, ArgSpec};
use serde::Deserialize;
use thiserror::Error;

/// The catalog bundled with this binary, covering the common JCE entry points.
pub const DEFAULT_CATALOG_YAML: &str = include_str!("../resources/crypto-catalog-jce.yaml");

#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog YAML ({path}): {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    apis: Vec<ApiEntryYaml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEntryYaml {
    declaring_class: String,
    method_name: String,
    #[serde(default)]
    algorithm_index: Option<i32>,
    #[serde(default)]
    provider_name_index: Option<i32>,
    #[serde(default)]
    provider_object_index: Option<i32>,
}

/// The loaded, indexed set of known cryptographic entry points.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<ApiEntry>,
    by_key: HashMap<String, ArgSpec>,
}

impl Catalog {
    fn from_entries(entries: Vec<ApiEntry>) -> Self {
        let mut by_key = HashMap::new();
        for entry in &entries {
            // First entry wins on a duplicate key; insertion order is the YAML order.
            by_key.entry(entry.api.key()).or_insert(entry.arg_spec);
        }
        Self { entries, by_key }
    }

    pub fn entries(&self) -> &[ApiEntry] {
        &self.entries
    }

    /// Looks up the argument spec for a `declaringClass#methodName` call site.
    pub fn lookup(&self, declaring_class: &str, method_name: &str) -> Option<&ArgSpec> {
        self.by_key.get(&format!("{declaring_class}#{method_name}"))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        let default_spec = ArgSpec::default();
        let entries = file
            .apis
            .into_iter()
            .map(|e| ApiEntry {
                api: ApiRef::new(e.declaring_class, e.method_name),
                arg_spec: ArgSpec {
                    algorithm_index: e.algorithm_index.unwrap_or(default_spec.algorithm_index),
                    provider_name_index: e
                        .provider_name_index
                        .unwrap_or(default_spec.provider_name_index),
                    provider_object_index: e
                        .provider_object_index
                        .unwrap_or(default_spec.provider_object_index),
                },
            })
            .collect();
        Ok(Self::from_entries(entries))
    }

    pub fn load(path: &Path) -> Result<Self, CatalogLoadError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&contents).map_err(|source| CatalogLoadError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    /// The catalog bundled with this binary.
    pub fn default_catalog() -> Self {
        Self::from_yaml_str(DEFAULT_CATALOG_YAML).expect("bundled default catalog must parse")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_catalog() {
        let yaml = r#"
apis:
  - declaringClass: javax/crypto/Cipher
    methodName: getInstance
  - declaringClass: java/security/MessageDigest
    methodName: getInstance
    algorithmIndex: 0
    providerNameIndex: -1
    providerObjectIndex: -1
"#;
        let catalog = Catalog::from_yaml_str(yaml).unwrap();
        assert_eq!(catalog.entries().len(), 2);
        let spec = catalog.lookup("javax/crypto/Cipher", "getInstance").unwrap();
        assert_eq!(spec.algorithm_index, 0);
        assert_eq!(spec.provider_name_index, 1);

        let digest = catalog
            .lookup("java/security/MessageDigest", "getInstance")
            .unwrap();
        assert_eq!(digest.provider_name_index, -1);
    }

    #[test]
    fn first_entry_wins_on_duplicate_key() {
        let yaml = r#"
apis:
  - declaringClass: javax/crypto/Cipher
    methodName: getInstance
    algorithmIndex: 0
  - declaringClass: javax/crypto/Cipher
    methodName: getInstance
    algorithmIndex: 5
"#;
        let catalog = Catalog::from_yaml_str(yaml).unwrap();
        let spec = catalog.lookup("javax/crypto/Cipher", "getInstance").unwrap();
        assert_eq!(spec.algorithm_index, 0);
    }

    #[test]
    fn default_catalog_loads() {
        let catalog = Catalog::default_catalog();
        assert!(!catalog.entries().is_empty());
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        std::fs::write(
            &path,
            "apis:\n  - declaringClass: javax/crypto/Cipher\n    methodName: getInstance\n",
        )
        .unwrap();
        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.entries().len(), 1);
    }
}
