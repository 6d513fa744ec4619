//! Shared data types that cross the catalog / policy / scanner boundary.
//!
//! Kept in their own crate so `policy` (which evaluates findings) and
//! `scanner` (which produces them) don't need to depend on each other.

use serde::Serialize;
use std::fmt;

/// Identifies a cryptographic entry-point API by its declaring class and
/// method name, e.g. `javax/crypto/Cipher#getInstance`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ApiRef {
    pub declaring_class: String,
    pub method_name: String,
}

impl ApiRef {
    pub fn new(declaring_class: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            declaring_class: declaring_class.into(),
            method_name: method_name.into(),
        }
    }

    /// The `<class>#<method>` key used to index the catalog and to match
    /// a policy rule's `api` field.
    pub fn key(&self) -> String {
        format!("{}#{}", self.declaring_class, self.method_name)
    }
}

impl fmt::Display for ApiRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Which argument positions of a call site carry the algorithm name, the
/// provider name, and the provider object, respectively. A negative index
/// means "this API has no such argument".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArgSpec {
    pub algorithm_index: i32,
    pub provider_name_index: i32,
    pub provider_object_index: i32,
}

impl Default for ArgSpec {
    fn default() -> Self {
        Self {
            algorithm_index: 0,
            provider_name_index: 1,
            provider_object_index: 1,
        }
    }
}

/// One catalog entry: an API paired with where its interesting arguments live.
#[derive(Debug, Clone, Serialize)]
pub struct ApiEntry {
    pub api: ApiRef,
    pub arg_spec: ArgSpec,
}

/// Source location of a call site, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub class_name: String,
    /// The enclosing method's canonical `returnType name(paramTypes)` rendering.
    pub method_signature: String,
    /// The `SourceFile` attribute's value, if the class carries one.
    pub source_file: Option<String>,
    /// -1 when no `LineNumberTable` entry covers the instruction.
    pub line: i64,
}

/// One positional argument of a call site. `literal` is `Some` iff the
/// value tracker resolved it to a string constant; `printable` is a
/// human-readable rendering and is never absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgumentValue {
    pub index: i32,
    pub printable: String,
    pub literal: Option<String>,
}

impl ArgumentValue {
    pub fn known(index: i32, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            index,
            printable: value.clone(),
            literal: Some(value),
        }
    }

    pub fn unresolved(index: i32) -> Self {
        Self {
            index,
            printable: "UNKNOWN".to_owned(),
            literal: None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.literal.as_deref()
    }
}

/// A single matched call site into a cataloged API.
///
/// `args` holds every positional argument of the invocation (receiver
/// excluded), with the invariant `args[i].index == i` and `args.len()`
/// equal to the descriptor's parameter count. `algorithm`/`provider` are
/// `None` when the catalog's `ArgSpec` declares no such argument exists
/// for this API (a negative or out-of-range index), distinct from the
/// argument existing but not resolving to a literal.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub api: ApiRef,
    pub declaring_class: String,
    pub method_name: String,
    pub sub_signature: String,
    pub args: Vec<ArgumentValue>,
    pub algorithm: Option<ArgumentValue>,
    pub provider: Option<ArgumentValue>,
    pub location: Location,
}

/// The outcome of evaluating a finding against a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Pass,
    Fail,
    Unknown,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
            Verdict::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

/// Rule id used when no rule in the policy matched the finding's API.
pub const NO_POLICY_RULE: &str = "NO_POLICY_RULE";
/// Rule id used when at least one rule matched but none of them reached a decision.
pub const NO_DECISION: &str = "NO_DECISION";

/// The result of running the policy engine over one finding.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub finding: Finding,
    pub policy_id: String,
    pub rule_id: String,
    pub verdict: Verdict,
    pub reason: String,
}
