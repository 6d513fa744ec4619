//! The policy engine: a single pure function mapping a finding and a
//! policy to an `Analysis`. No trait, no dynamic dispatch — every
//! finding is evaluated the same deterministic way.

use model::{Analysis, ArgumentValue, Finding, Verdict, NO_DECISION, NO_POLICY_RULE};

use crate::model::{Policy, Rule};

struct RuleOutcome {
    verdict: Verdict,
    reason: String,
    rule_id: String,
}

/// Evaluates one finding against a policy and returns the final analysis.
///
/// Rules are matched by exact API key in the order they appear in the
/// policy. Each matching rule is evaluated independently; the first
/// `PASS` or `UNKNOWN` short-circuits the whole evaluation. A `FAIL` is
/// remembered but does not stop evaluation, so a later rule's `PASS` can
/// still override an earlier `FAIL` for the same finding.
pub fn evaluate(finding: &Finding, policy: &Policy) -> Analysis {
    let api_key = finding.api.key();
    let mut matched_any = false;
    let mut first_fail: Option<RuleOutcome> = None;

    for rule in policy.rules_for_api(&api_key) {
        matched_any = true;
        let outcome = evaluate_rule(finding, rule);
        match outcome.verdict {
            Verdict::Pass | Verdict::Unknown => {
                return to_analysis(finding, &policy.policy_id, outcome);
            }
            Verdict::Fail => {
                if first_fail.is_none() {
                    first_fail = Some(outcome);
                }
            }
        }
    }

    if let Some(outcome) = first_fail {
        return to_analysis(finding, &policy.policy_id, outcome);
    }

    if !matched_any {
        return to_analysis(
            finding,
            &policy.policy_id,
            RuleOutcome {
                verdict: Verdict::Unknown,
                reason: "No rule for API".to_owned(),
                rule_id: NO_POLICY_RULE.to_owned(),
            },
        );
    }

    // Every matching rule is total (always Pass/Fail/Unknown); this is
    // unreachable in practice but kept as the spec's documented fallback.
    to_analysis(
        finding,
        &policy.policy_id,
        RuleOutcome {
            verdict: Verdict::Unknown,
            reason: NO_DECISION.to_owned(),
            rule_id: NO_DECISION.to_owned(),
        },
    )
}

fn to_analysis(finding: &Finding, policy_id: &str, outcome: RuleOutcome) -> Analysis {
    Analysis {
        finding: finding.clone(),
        policy_id: policy_id.to_owned(),
        verdict: outcome.verdict,
        reason: outcome.reason,
        rule_id: outcome.rule_id,
    }
}

fn evaluate_rule(finding: &Finding, rule: &Rule) -> RuleOutcome {
    let rule_id = if rule.id.trim().is_empty() {
        "RULE".to_owned()
    } else {
        rule.id.clone()
    };

    // 1. Algorithm presence.
    let algorithm = match &finding.algorithm {
        None => {
            return RuleOutcome {
                verdict: Verdict::Pass,
                reason: "DEFAULT_ALGO_ALLOWED".to_owned(),
                rule_id,
            }
        }
        Some(a) => a,
    };

    // 2. Algorithm resolution.
    let algorithm_literal = match algorithm.as_str() {
        None => {
            return RuleOutcome {
                verdict: Verdict::Unknown,
                reason: "ALGO_UNRESOLVED".to_owned(),
                rule_id,
            }
        }
        Some(s) => s.to_uppercase(),
    };

    // 3. Algorithm policy presence.
    let algorithms = match &rule.algorithms {
        None => {
            return RuleOutcome {
                verdict: Verdict::Unknown,
                reason: "NO_ALGORITHM_POLICY".to_owned(),
                rule_id,
            }
        }
        Some(a) => a,
    };

    // 4. Deny-first.
    if algorithms.is_denied(&algorithm_literal) {
        return RuleOutcome {
            verdict: Verdict::Fail,
            reason: "ALGO_DENIED".to_owned(),
            rule_id,
        };
    }

    // 5. Allow (if restrictive).
    if algorithms.is_restrictive() && !algorithms.is_allowed(&algorithm_literal) {
        return RuleOutcome {
            verdict: Verdict::Fail,
            reason: "ALGO_NOT_ALLOWED".to_owned(),
            rule_id,
        };
    }

    // 6. Provider presence.
    let provider = match &finding.provider {
        None => {
            return RuleOutcome {
                verdict: Verdict::Pass,
                reason: "ALLOWED_ALGO_DEFAULT_PROVIDER".to_owned(),
                rule_id,
            }
        }
        Some(p) => p,
    };

    // 7. Provider resolution.
    let (provider_original, provider_upper) = match provider.as_str() {
        None => {
            return RuleOutcome {
                verdict: Verdict::Unknown,
                reason: "PROVIDER_UNRESOLVED".to_owned(),
                rule_id,
            }
        }
        Some(s) => (s.to_owned(), s.to_uppercase()),
    };

    if let Some(providers) = &rule.providers {
        // 8. Provider deny.
        if providers.is_denied(&provider_upper) {
            return RuleOutcome {
                verdict: Verdict::Fail,
                reason: format!("PROVIDER_DENIED:{provider_original}"),
                rule_id,
            };
        }

        // 9. Provider allow (if non-empty).
        if !providers.allow.is_empty() && !providers.is_allowed(&provider_upper) {
            return RuleOutcome {
                verdict: Verdict::Fail,
                reason: format!("PROVIDER_NOT_ALLOWED:{provider_original}"),
                rule_id,
            };
        }
    }

    // 10. Otherwise.
    RuleOutcome {
        verdict: Verdict::Pass,
        reason: "ALLOWED_ALGO".to_owned(),
        rule_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Algorithms, Providers, Rule};
    use model::{ApiRef, Location};

    fn finding(algorithm: Option<ArgumentValue>, provider: Option<ArgumentValue>) -> Finding {
        Finding {
            api: ApiRef::new("javax/crypto/Cipher", "getInstance"),
            declaring_class: "javax/crypto/Cipher".to_owned(),
            method_name: "getInstance".to_owned(),
            sub_signature: "Cipher getInstance(String)".to_owned(),
            args: Vec::new(),
            algorithm,
            provider,
            location: Location {
                class_name: "com/example/Foo".to_owned(),
                method_signature: "void encrypt()".to_owned(),
                source_file: None,
                line: 42,
            },
        }
    }

    fn policy_with(rules: Vec<Rule>) -> Policy {
        Policy {
            policy_id: "test".to_owned(),
            name: "test".to_owned(),
            description: String::new(),
            version: "1.0".to_owned(),
            rules,
        }
    }

    fn allow_rule(id: &str, allow: &[&str]) -> Rule {
        Rule {
            id: id.to_owned(),
            description: String::new(),
            api: "javax/crypto/Cipher#getInstance".to_owned(),
            algorithms: Some(Algorithms {
                allow: Some(allow.iter().map(|s| s.to_uppercase()).collect()),
                deny: vec![],
                allow_regex: None,
                deny_regex: vec![],
            }),
            providers: None,
        }
    }

    #[test]
    fn no_matching_rule_is_unknown_with_synthetic_id() {
        let f = finding(Some(ArgumentValue::known(0, "AES")), None);
        let policy = policy_with(vec![]);
        let analysis = evaluate(&f, &policy);
        assert_eq!(analysis.verdict, Verdict::Unknown);
        assert_eq!(analysis.rule_id, NO_POLICY_RULE);
        assert_eq!(analysis.reason, "No rule for API");
    }

    #[test]
    fn empty_allow_list_fails() {
        let f = finding(Some(ArgumentValue::known(0, "AES")), None);
        let policy = policy_with(vec![allow_rule("R1", &[])]);
        let analysis = evaluate(&f, &policy);
        assert_eq!(analysis.verdict, Verdict::Fail);
        assert_eq!(analysis.rule_id, "R1");
        assert_eq!(analysis.reason, "ALGO_NOT_ALLOWED");
    }

    #[test]
    fn deny_wins_over_allow() {
        let f = finding(Some(ArgumentValue::known(0, "DES")), None);
        let rule = Rule {
            id: "R1".to_owned(),
            description: String::new(),
            api: "javax/crypto/Cipher#getInstance".to_owned(),
            algorithms: Some(Algorithms {
                allow: Some(vec!["DES".to_owned(), "AES".to_owned()]),
                deny: vec!["DES".to_owned()],
                allow_regex: None,
                deny_regex: vec![],
            }),
            providers: None,
        };
        let policy = policy_with(vec![rule]);
        let analysis = evaluate(&f, &policy);
        assert_eq!(analysis.verdict, Verdict::Fail);
        assert_eq!(analysis.reason, "ALGO_DENIED");
    }

    #[test]
    fn later_pass_overrides_earlier_fail() {
        let f = finding(Some(ArgumentValue::known(0, "AES")), None);
        let policy = policy_with(vec![allow_rule("R1", &["RSA"]), allow_rule("R2", &["AES"])]);
        let analysis = evaluate(&f, &policy);
        assert_eq!(analysis.verdict, Verdict::Pass);
        assert_eq!(analysis.rule_id, "R2");
    }

    #[test]
    fn earlier_unknown_short_circuits_before_later_pass() {
        let f = finding(Some(ArgumentValue::unresolved(0)), None);
        let policy = policy_with(vec![allow_rule("R1", &["AES"]), allow_rule("R2", &["AES"])]);
        let analysis = evaluate(&f, &policy);
        assert_eq!(analysis.verdict, Verdict::Unknown);
        assert_eq!(analysis.rule_id, "R1");
        assert_eq!(analysis.reason, "ALGO_UNRESOLVED");
    }

    #[test]
    fn unconstrained_algorithm_is_unknown_no_algorithm_policy() {
        let f = finding(Some(ArgumentValue::known(0, "ANYTHING")), None);
        let rule = Rule {
            id: "R1".to_owned(),
            description: String::new(),
            api: "javax/crypto/Cipher#getInstance".to_owned(),
            algorithms: None,
            providers: None,
        };
        let policy = policy_with(vec![rule]);
        let analysis = evaluate(&f, &policy);
        assert_eq!(analysis.verdict, Verdict::Unknown);
        assert_eq!(analysis.reason, "NO_ALGORITHM_POLICY");
    }

    #[test]
    fn missing_algorithm_argument_defaults_to_pass() {
        let f = finding(None, None);
        let rule = Rule {
            id: "R1".to_owned(),
            description: String::new(),
            api: "javax/crypto/Cipher#getInstance".to_owned(),
            algorithms: Some(Algorithms {
                allow: Some(vec!["AES".to_owned()]),
                deny: vec![],
                allow_regex: None,
                deny_regex: vec![],
            }),
            providers: None,
        };
        let policy = policy_with(vec![rule]);
        let analysis = evaluate(&f, &policy);
        assert_eq!(analysis.verdict, Verdict::Pass);
        assert_eq!(analysis.reason, "DEFAULT_ALGO_ALLOWED");
    }

    #[test]
    fn missing_provider_argument_defaults_to_pass() {
        let f = finding(Some(ArgumentValue::known(0, "AES")), None);
        let rule = Rule {
            id: "R1".to_owned(),
            description: String::new(),
            api: "javax/crypto/Cipher#getInstance".to_owned(),
            algorithms: Some(Algorithms {
                allow: Some(vec!["AES".to_owned()]),
                deny: vec![],
                allow_regex: None,
                deny_regex: vec![],
            }),
            providers: Some(Providers {
                allow: vec![],
                deny: vec!["BC".to_owned()],
            }),
        };
        let policy = policy_with(vec![rule]);
        let analysis = evaluate(&f, &policy);
        assert_eq!(analysis.verdict, Verdict::Pass);
        assert_eq!(analysis.reason, "ALLOWED_ALGO_DEFAULT_PROVIDER");
    }

    #[test]
    fn provider_allow_nonempty_restricts() {
        let f = finding(
            Some(ArgumentValue::known(0, "AES")),
            Some(ArgumentValue::known(1, "BC")),
        );
        let rule = Rule {
            id: "R1".to_owned(),
            description: String::new(),
            api: "javax/crypto/Cipher#getInstance".to_owned(),
            algorithms: Some(Algorithms {
                allow: None,
                deny: vec![],
                allow_regex: None,
                deny_regex: vec![],
            }),
            providers: Some(Providers {
                allow: vec!["SUNJCE".to_owned()],
                deny: vec![],
            }),
        };
        let policy = policy_with(vec![rule]);
        let analysis = evaluate(&f, &policy);
        assert_eq!(analysis.verdict, Verdict::Fail);
        assert_eq!(analysis.reason, "PROVIDER_NOT_ALLOWED:BC");
    }

    #[test]
    fn provider_deny_reports_original_case() {
        let f = finding(
            Some(ArgumentValue::known(0, "AES")),
            Some(ArgumentValue::known(1, "BC")),
        );
        let rule = Rule {
            id: "R1".to_owned(),
            description: String::new(),
            api: "javax/crypto/Cipher#getInstance".to_owned(),
            algorithms: Some(Algorithms {
                allow: None,
                deny: vec![],
                allow_regex: None,
                deny_regex: vec![],
            }),
            providers: Some(Providers {
                allow: vec![],
                deny: vec!["BC".to_owned()],
            }),
        };
        let policy = policy_with(vec![rule]);
        let analysis = evaluate(&f, &policy);
        assert_eq!(analysis.verdict, Verdict::Fail);
        assert_eq!(analysis.reason, "PROVIDER_DENIED:BC");
    }

    #[test]
    fn unresolved_provider_is_unknown() {
        let f = finding(
            Some(ArgumentValue::known(0, "AES")),
            Some(ArgumentValue::unresolved(1)),
        );
        let rule = Rule {
            id: "R1".to_owned(),
            description: String::new(),
            api: "javax/crypto/Cipher#getInstance".to_owned(),
            algorithms: Some(Algorithms {
                allow: None,
                deny: vec![],
                allow_regex: None,
                deny_regex: vec![],
            }),
            providers: Some(Providers {
                allow: vec![],
                deny: vec!["BC".to_owned()],
            }),
        };
        let policy = policy_with(vec![rule]);
        let analysis = evaluate(&f, &policy);
        assert_eq!(analysis.verdict, Verdict::Unknown);
        assert_eq!(analysis.reason, "PROVIDER_UNRESOLVED");
    }
}
