//! Policy data model and YAML loading, with normalization applied once at
//! load time: algorithm/provider literals are uppercased and regexes are
//! compiled with an implicit case-insensitive prefix.

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use std::path::Path;

/// The policy bundled with this binary.
pub const DEFAULT_POLICY_YAML: &str = include_str!("../resources/policy-fips-140-2-l1.yaml");

#[derive(Debug, Error)]
pub enum PolicyLoadError {
    #[error("failed to read policy file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse policy YAML ({path}): {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error(transparent)]
    Regex(#[from] RegexCompileError),
}

#[derive(Debug, Error)]
#[error("invalid regex '{pattern}' in rule '{rule_id}': {source}")]
pub struct RegexCompileError {
    pub rule_id: String,
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

#[derive(Debug, Deserialize)]
struct PolicyFile {
    #[serde(rename = "policyId")]
    policy_id: String,
    name: String,
    #[serde(default)]
    description: String,
    version: String,
    rules: Vec<RuleYaml>,
}

#[derive(Debug, Deserialize)]
struct RuleYaml {
    id: String,
    #[serde(default)]
    description: String,
    api: String,
    #[serde(default)]
    algorithms: Option<AlgorithmsYaml>,
    #[serde(default)]
    providers: Option<ProvidersYaml>,
}

#[derive(Debug, Deserialize, Default)]
struct AlgorithmsYaml {
    #[serde(default)]
    allow: Option<Vec<String>>,
    #[serde(default)]
    deny: Vec<String>,
    #[serde(rename = "allowRegex", default)]
    allow_regex: Option<Vec<String>>,
    #[serde(rename = "denyRegex", default)]
    deny_regex: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ProvidersYaml {
    #[serde(default)]
    allow: Vec<String>,
    #[serde(default)]
    deny: Vec<String>,
}

/// Normalized algorithm restriction for one rule.
///
/// `allow`/`allow_regex` being present at all (even empty) is restrictive:
/// an empty allow list means no algorithm ever passes. Absence of both
/// means the algorithm is unconstrained.
#[derive(Debug, Clone)]
pub struct Algorithms {
    pub allow: Option<Vec<String>>,
    pub deny: Vec<String>,
    pub allow_regex: Option<Vec<Regex>>,
    pub deny_regex: Vec<Regex>,
}

impl Algorithms {
    pub fn is_restrictive(&self) -> bool {
        self.allow.is_some() || self.allow_regex.is_some()
    }

    pub fn is_denied(&self, algorithm_upper: &str) -> bool {
        self.deny.iter().any(|d| d == algorithm_upper)
            || self.deny_regex.iter().any(|r| r.is_match(algorithm_upper))
    }

    pub fn is_allowed(&self, algorithm_upper: &str) -> bool {
        let exact = self
            .allow
            .as_ref()
            .map(|a| a.iter().any(|x| x == algorithm_upper))
            .unwrap_or(false);
        let by_regex = self
            .allow_regex
            .as_ref()
            .map(|rs| rs.iter().any(|r| r.is_match(algorithm_upper)))
            .unwrap_or(false);
        exact || by_regex
    }
}

/// Normalized provider restriction for one rule. Empty `allow` is
/// unrestricted (unlike `Algorithms::allow`), matching the spec's
/// "allow-if-nonempty" semantics for providers.
#[derive(Debug, Clone)]
pub struct Providers {
    pub allow: Vec<String>,
    pub deny: Vec<String>,
}

impl Providers {
    pub fn is_denied(&self, provider_upper: &str) -> bool {
        self.deny.iter().any(|d| d == provider_upper)
    }

    pub fn is_allowed(&self, provider_upper: &str) -> bool {
        self.allow.is_empty() || self.allow.iter().any(|a| a == provider_upper)
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub description: String,
    pub api: String,
    pub algorithms: Option<Algorithms>,
    pub providers: Option<Providers>,
}

#[derive(Debug, Clone)]
pub struct Policy {
    pub policy_id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub rules: Vec<Rule>,
}

impl Policy {
    /// Rules matching a `declaringClass#methodName` api key, in file order.
    pub fn rules_for_api<'a>(&'a self, api_key: &str) -> impl Iterator<Item = &'a Rule> {
        self.rules.iter().filter(move |r| r.api == api_key)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, PolicyLoadError> {
        let file: PolicyFile = serde_yaml::from_str(yaml).map_err(|source| PolicyLoadError::Yaml {
            path: "<inline>".to_owned(),
            source,
        })?;
        Self::from_file(file)
    }

    fn from_file(file: PolicyFile) -> Result<Self, PolicyLoadError> {
        let mut rules = Vec::with_capacity(file.rules.len());
        for rule in file.rules {
            let algorithms = rule
                .algorithms
                .map(|a| normalize_algorithms(&rule.id, a))
                .transpose()?;
            let providers = rule.providers.map(normalize_providers);
            rules.push(Rule {
                id: rule.id,
                description: rule.description,
                api: rule.api,
                algorithms,
                providers,
            });
        }
        Ok(Policy {
            policy_id: file.policy_id,
            name: file.name,
            description: file.description,
            version: file.version,
            rules,
        })
    }

    pub fn load(path: &Path) -> Result<Self, PolicyLoadError> {
        let contents = std::fs::read_to_string(path).map_err(|source| PolicyLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file: PolicyFile = serde_yaml::from_str(&contents).map_err(|source| PolicyLoadError::Yaml {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_file(file)
    }

    /// The policy bundled with this binary.
    pub fn default_policy() -> Self {
        Self::from_yaml_str(DEFAULT_POLICY_YAML).expect("bundled default policy must parse")
    }
}

fn normalize_algorithms(rule_id: &str, yaml: AlgorithmsYaml) -> Result<Algorithms, RegexCompileError> {
    let allow = yaml
        .allow
        .map(|v| v.into_iter().map(|s| s.to_uppercase()).collect());
    let deny = yaml.deny.into_iter().map(|s| s.to_uppercase()).collect();
    let allow_regex = yaml
        .allow_regex
        .map(|patterns| compile_case_insensitive(rule_id, patterns))
        .transpose()?;
    let deny_regex = compile_case_insensitive(rule_id, yaml.deny_regex)?;
    Ok(Algorithms {
        allow,
        deny,
        allow_regex,
        deny_regex,
    })
}

fn compile_case_insensitive(rule_id: &str, patterns: Vec<String>) -> Result<Vec<Regex>, RegexCompileError> {
    patterns
        .into_iter()
        .map(|pattern| {
            let prefixed = format!("(?i){pattern}");
            Regex::new(&prefixed).map_err(|source| RegexCompileError {
                rule_id: rule_id.to_owned(),
                pattern,
                source,
            })
        })
        .collect()
}

fn normalize_providers(yaml: ProvidersYaml) -> Providers {
    Providers {
        allow: yaml.allow.into_iter().map(|s| s.to_uppercase()).collect(),
        deny: yaml.deny.into_iter().map(|s| s.to_uppercase()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_minimal_policy() {
        let yaml = r#"
policyId: test
name: Test Policy
version: "1.0"
rules:
  - id: R1
    api: javax/crypto/Cipher#getInstance
    algorithms:
      allow: [aes]
      deny: [des]
"#;
        let policy = Policy::from_yaml_str(yaml).unwrap();
        assert_eq!(policy.rules.len(), 1);
        let rule = &policy.rules[0];
        let algo = rule.algorithms.as_ref().unwrap();
        assert!(algo.is_allowed("AES"));
        assert!(!algo.is_allowed("RSA"));
        assert!(algo.is_denied("DES"));
    }

    #[test]
    fn empty_allow_list_is_fully_restrictive() {
        let yaml = r#"
policyId: test
name: Test Policy
version: "1.0"
rules:
  - id: R1
    api: javax/crypto/Cipher#getInstance
    algorithms:
      allow: []
"#;
        let policy = Policy::from_yaml_str(yaml).unwrap();
        let algo = policy.rules[0].algorithms.as_ref().unwrap();
        assert!(algo.is_restrictive());
        assert!(!algo.is_allowed("AES"));
    }

    #[test]
    fn absent_allow_is_unrestricted() {
        let yaml = r#"
policyId: test
name: Test Policy
version: "1.0"
rules:
  - id: R1
    api: javax/crypto/Cipher#getInstance
    algorithms:
      deny: [des]
"#;
        let policy = Policy::from_yaml_str(yaml).unwrap();
        let algo = policy.rules[0].algorithms.as_ref().unwrap();
        assert!(!algo.is_restrictive());
    }

    #[test]
    fn invalid_regex_is_rejected_at_load_time() {
        let yaml = r#"
policyId: test
name: Test Policy
version: "1.0"
rules:
  - id: R1
    api: javax/crypto/Cipher#getInstance
    algorithms:
      allowRegex: ["(unclosed"]
"#;
        let err = Policy::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, PolicyLoadError::Regex(_)));
    }

    #[test]
    fn default_policy_loads() {
        let policy = Policy::default_policy();
        assert!(!policy.rules.is_empty());
    }
}
