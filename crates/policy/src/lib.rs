mod engine;
mod model;

pub use engine::evaluate;
pub use model::{
    Algorithms, Policy, PolicyLoadError, Providers, RegexCompileError, Rule, DEFAULT_POLICY_YAML,
};
