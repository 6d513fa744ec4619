mod matcher;
mod tracker;

pub use matcher::{match_invoke, scan_method};
pub use tracker::{Lattice, Tracker, TrackedInvoke};

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use catalog::Catalog;
use classfile::{decode_instructions, parse_class_file, CorpusEntry, MalformedClassError};
use model::Finding;
use rayon::prelude::*;

/// Scans one already-read `.class` file's bytes, returning the class's
/// fully-qualified name (falling back to the corpus display path if the
/// constant pool doesn't resolve one) along with every finding across all
/// of its methods. A class that fails to parse is logged and skipped
/// rather than aborting the whole run.
pub fn scan_class(entry: &CorpusEntry, catalog: &Catalog) -> (String, Vec<Finding>) {
    let class = match parse_class_file(&entry.display_path, &entry.bytes) {
        Ok(class) => class,
        Err(err) => {
            log_malformed(&entry.display_path, &err);
            return (entry.display_path.clone(), Vec::new());
        }
    };

    let class_name = class
        .this_class_name()
        .unwrap_or(&entry.display_path)
        .to_owned();
    let source_file = class.source_file();

    let findings = class
        .methods
        .iter()
        .filter_map(|method| {
            let code = method.code()?;
            let method_name = class.utf8_at(method.name_index.index())?;
            let method_descriptor = class.utf8_at(method.descriptor_index.index())?;
            let method_signature = method_descriptor
                .parse::<descriptor::MethodDescriptor>()
                .map(|d| d.canonical_signature(method_name))
                .unwrap_or_else(|_| method_descriptor.to_owned());
            let instructions = decode_instructions(&class, code);
            Some(scan_method(
                &instructions,
                code,
                catalog,
                &class_name,
                &method_signature,
                source_file,
            ))
        })
        .flatten()
        .collect();

    (class_name, findings)
}

fn log_malformed(path: &str, err: &MalformedClassError) {
    tracing::warn!(path, error = %err, "skipping malformed class file");
}

/// Scans a whole corpus in parallel, one task per class, with methods
/// within a class processed sequentially. Results are merged into a
/// sorted map keyed by the class's fully-qualified name so report output
/// is deterministic regardless of scheduling order.
///
/// `cancelled` is checked at each class boundary; once set, remaining
/// classes are skipped and already-collected findings are still returned.
pub fn scan_corpus(
    entries: &[CorpusEntry],
    catalog: &Catalog,
    cancelled: &AtomicBool,
) -> BTreeMap<String, Vec<Finding>> {
    let results: Vec<(String, Vec<Finding>)> = entries
        .par_iter()
        .filter_map(|entry| {
            if cancelled.load(Ordering::Relaxed) {
                return None;
            }
            Some(scan_class(entry, catalog))
        })
        .collect();

    let mut merged: BTreeMap<String, Vec<Finding>> = BTreeMap::new();
    for (class_name, findings) in results {
        if !findings.is_empty() {
            merged.entry(class_name).or_default().extend(findings);
        }
    }
    merged
}
