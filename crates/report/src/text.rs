//! Plain-text report rendering: one line per finding, written directly
//! against a `Write` sink rather than through a templating engine —
//! matching the teacher's own `display_class`-style renderers in
//! `cs_class_printer`/`file-info::ui`.

use std::collections::BTreeMap;
use std::fmt::Write;

use model::{Analysis, ArgumentValue};

fn value_or_none(value: &Option<ArgumentValue>) -> &str {
    value
        .as_ref()
        .and_then(ArgumentValue::as_str)
        .unwrap_or("None")
}

/// Writes the text report for a whole scan. `analyses` is keyed by class
/// name, with each class's analyses in scan order.
pub fn write_text_report<W: Write>(
    w: &mut W,
    analyses: &BTreeMap<String, Vec<Analysis>>,
) -> std::fmt::Result {
    for (class_name, class_analyses) in analyses {
        for analysis in class_analyses {
            let location = &analysis.finding.location;
            writeln!(
                w,
                "class={}:{} method={} api={} algorithm={} provider={} verdict={} reason={} rule={}",
                class_name,
                location.line,
                location.method_signature,
                analysis.finding.api,
                value_or_none(&analysis.finding.algorithm),
                value_or_none(&analysis.finding.provider),
                analysis.verdict,
                analysis.reason,
                analysis.rule_id,
            )?;
        }
        writeln!(w, "Total findings: {}", class_analyses.len())?;
    }
    Ok(())
}
