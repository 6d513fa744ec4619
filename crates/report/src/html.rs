//! HTML report rendering: a summary `index.html` plus one page per class
//! that has at least one `FAIL`/`UNKNOWN` finding. Built by hand with
//! `String`/`write!`, same as the text report — nothing in the corpus
//! pulls in a templating engine for output this small. A small inline
//! script gives the per-class table client-side sort (by column) and
//! filter (by verdict), since the report is meant to be opened directly
//! from disk with no server behind it.

use std::collections::BTreeMap;
use std::fmt::Write;

use model::{Analysis, ArgumentValue, Verdict};

/// One HTML file, named relative to the report output directory.
pub struct HtmlPage {
    pub file_name: String,
    pub content: String,
}

const TABLE_SCRIPT: &str = r#"<script>
function sortTable(table, col) {
  var rows = Array.prototype.slice.call(table.tBodies[0].rows);
  var asc = table.getAttribute('data-sort-col') != col || table.getAttribute('data-sort-dir') !== 'asc';
  rows.sort(function (a, b) {
    var x = a.cells[col].innerText, y = b.cells[col].innerText;
    return asc ? x.localeCompare(y, undefined, {numeric: true}) : y.localeCompare(x, undefined, {numeric: true});
  });
  rows.forEach(function (r) { table.tBodies[0].appendChild(r); });
  table.setAttribute('data-sort-col', col);
  table.setAttribute('data-sort-dir', asc ? 'asc' : 'desc');
}
function filterTable(table, verdictColumn, verdict) {
  var rows = table.tBodies[0].rows;
  for (var i = 0; i < rows.length; i++) {
    var cell = rows[i].cells[verdictColumn];
    rows[i].style.display = (verdict === 'ALL' || cell.innerText === verdict) ? '' : 'none';
  }
}
</script>"#;

fn value_or_none(value: &Option<ArgumentValue>) -> &str {
    value
        .as_ref()
        .and_then(ArgumentValue::as_str)
        .unwrap_or("None")
}

pub fn render_html_report(analyses: &BTreeMap<String, Vec<Analysis>>) -> Vec<HtmlPage> {
    let mut pages = Vec::new();
    pages.push(render_index(analyses));

    for (class_name, class_analyses) in analyses {
        if class_analyses.iter().any(|a| a.verdict != Verdict::Pass) {
            pages.push(render_class_page(class_name, class_analyses));
        }
    }

    pages
}

fn render_index(analyses: &BTreeMap<String, Vec<Analysis>>) -> HtmlPage {
    let mut html = String::new();
    let _ = writeln!(html, "<!DOCTYPE html><html><head><title>Crypto API Audit</title>{TABLE_SCRIPT}</head><body>");
    let _ = writeln!(html, "<h1>Crypto API Audit</h1>");
    let _ = writeln!(
        html,
        "<table border=\"1\" id=\"summary\"><thead><tr><th onclick=\"sortTable(document.getElementById('summary'),0)\">Class</th><th onclick=\"sortTable(document.getElementById('summary'),1)\">Findings</th><th onclick=\"sortTable(document.getElementById('summary'),2)\">Pass</th><th onclick=\"sortTable(document.getElementById('summary'),3)\">Fail</th><th onclick=\"sortTable(document.getElementById('summary'),4)\">Unknown</th></tr></thead><tbody>"
    );

    for (class_name, class_analyses) in analyses {
        let pass = class_analyses.iter().filter(|a| a.verdict == Verdict::Pass).count();
        let fail = class_analyses.iter().filter(|a| a.verdict == Verdict::Fail).count();
        let unknown = class_analyses
            .iter()
            .filter(|a| a.verdict == Verdict::Unknown)
            .count();
        let link = if fail > 0 || unknown > 0 {
            format!("<a href=\"{}\">{}</a>", class_page_name(class_name), escape(class_name))
        } else {
            escape(class_name)
        };
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            link,
            class_analyses.len(),
            pass,
            fail,
            unknown
        );
    }

    let _ = writeln!(html, "</tbody></table></body></html>");
    HtmlPage {
        file_name: "index.html".to_owned(),
        content: html,
    }
}

fn render_class_page(class_name: &str, analyses: &[Analysis]) -> HtmlPage {
    let mut html = String::new();
    let _ = writeln!(
        html,
        "<!DOCTYPE html><html><head><title>{}</title>{TABLE_SCRIPT}</head><body>",
        escape(class_name)
    );
    let _ = writeln!(html, "<h1>{}</h1>", escape(class_name));
    let _ = writeln!(
        html,
        "<div>Filter by verdict: \
         <button onclick=\"filterTable(document.getElementById('findings'),5,'ALL')\">ALL</button> \
         <button onclick=\"filterTable(document.getElementById('findings'),5,'PASS')\">PASS</button> \
         <button onclick=\"filterTable(document.getElementById('findings'),5,'FAIL')\">FAIL</button> \
         <button onclick=\"filterTable(document.getElementById('findings'),5,'UNKNOWN')\">UNKNOWN</button></div>"
    );
    let _ = writeln!(
        html,
        "<table border=\"1\" id=\"findings\"><thead><tr>\
         <th onclick=\"sortTable(document.getElementById('findings'),0)\">Method</th>\
         <th onclick=\"sortTable(document.getElementById('findings'),1)\">Line</th>\
         <th onclick=\"sortTable(document.getElementById('findings'),2)\">API</th>\
         <th onclick=\"sortTable(document.getElementById('findings'),3)\">Algorithm</th>\
         <th onclick=\"sortTable(document.getElementById('findings'),4)\">Provider</th>\
         <th onclick=\"sortTable(document.getElementById('findings'),5)\">Verdict</th>\
         <th onclick=\"sortTable(document.getElementById('findings'),6)\">Reason</th>\
         <th onclick=\"sortTable(document.getElementById('findings'),7)\">Rule</th>\
         </tr></thead><tbody>"
    );

    for analysis in analyses {
        let f = &analysis.finding;
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&f.location.method_signature),
            f.location.line,
            escape(&f.api.to_string()),
            escape(value_or_none(&f.algorithm)),
            escape(value_or_none(&f.provider)),
            analysis.verdict,
            escape(&analysis.reason),
            escape(&analysis.rule_id),
        );
    }

    let _ = writeln!(html, "</tbody></table></body></html>");
    HtmlPage {
        file_name: class_page_name(class_name),
        content: html,
    }
}

fn class_page_name(class_name: &str) -> String {
    let sanitized: String = class_name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    format!("{sanitized}.html")
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{ApiRef, Finding, Location};

    fn analysis(verdict: Verdict) -> Analysis {
        Analysis {
            finding: Finding {
                api: ApiRef::new("javax/crypto/Cipher", "getInstance"),
                declaring_class: "javax/crypto/Cipher".to_owned(),
                method_name: "getInstance".to_owned(),
                sub_signature: "Cipher getInstance(String)".to_owned(),
                args: vec![ArgumentValue::known(0, "DES")],
                algorithm: Some(ArgumentValue::known(0, "DES")),
                provider: None,
                location: Location {
                    class_name: "com/example/Foo".to_owned(),
                    method_signature: "void encrypt()".to_owned(),
                    source_file: None,
                    line: 12,
                },
            },
            policy_id: "test".to_owned(),
            verdict,
            reason: "ALGO_DENIED".to_owned(),
            rule_id: "R1".to_owned(),
        }
    }

    #[test]
    fn only_classes_with_non_pass_findings_get_a_page() {
        let mut map = BTreeMap::new();
        map.insert("Clean".to_owned(), vec![analysis(Verdict::Pass)]);
        map.insert("Bad".to_owned(), vec![analysis(Verdict::Fail)]);

        let pages = render_html_report(&map);
        let names: Vec<_> = pages.iter().map(|p| p.file_name.clone()).collect();
        assert!(names.contains(&"index.html".to_owned()));
        assert!(names.iter().any(|n| n.contains("Bad")));
        assert!(!names.iter().any(|n| n.contains("Clean")));
    }

    #[test]
    fn class_page_includes_filter_and_sort_controls() {
        let mut map = BTreeMap::new();
        map.insert("Bad".to_owned(), vec![analysis(Verdict::Fail)]);
        let pages = render_html_report(&map);
        let class_page = pages.iter().find(|p| p.file_name.contains("Bad")).unwrap();
        assert!(class_page.content.contains("filterTable"));
        assert!(class_page.content.contains("sortTable"));
    }
}
