pub mod config;

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use model::Analysis;

use config::{Config, ReportFormat};

/// The rendered report, matching `config.format`.
pub enum Rendered {
    Text(String),
    Html(Vec<report::HtmlPage>),
}

/// Runs the full pipeline: load corpus, catalog, and policy; scan; evaluate
/// every finding; render the report.
pub fn run(config: &Config) -> Result<Rendered> {
    let catalog = match &config.catalog_path {
        Some(path) => catalog::Catalog::load(path)
            .with_context(|| format!("loading catalog from {}", path.display()))?,
        None => catalog::Catalog::default_catalog(),
    };

    let policy = match &config.policy_path {
        Some(path) => policy::Policy::load(path)
            .with_context(|| format!("loading policy from {}", path.display()))?,
        None => policy::Policy::default_policy(),
    };

    let entries = classfile::walk_corpus(&config.input)
        .with_context(|| format!("reading corpus from {}", config.input.display()))?;

    tracing::info!(count = entries.len(), "enumerated corpus entries");

    let cancelled = AtomicBool::new(false);
    let findings_by_class = scanner::scan_corpus(&entries, &catalog, &cancelled);

    let analyses = evaluate_all(&findings_by_class, &policy);

    Ok(match config.format {
        ReportFormat::Text => Rendered::Text(render_text(&analyses)?),
        ReportFormat::Html => Rendered::Html(report::render_html_report(&analyses)),
    })
}

fn evaluate_all(
    findings_by_class: &BTreeMap<String, Vec<model::Finding>>,
    policy: &policy::Policy,
) -> BTreeMap<String, Vec<Analysis>> {
    findings_by_class
        .iter()
        .map(|(class_path, findings)| {
            let analyses = findings
                .iter()
                .map(|finding| policy::evaluate(finding, policy))
                .collect();
            (class_path.clone(), analyses)
        })
        .collect()
}

fn render_text(analyses: &BTreeMap<String, Vec<Analysis>>) -> Result<String> {
    let mut out = String::new();
    report::write_text_report(&mut out, analyses).context("rendering text report")?;
    Ok(out)
}
