//! Matches tracked invocations against the catalog and builds `Finding`s.

use catalog::Catalog;
use model::{ApiRef, ArgumentValue, Finding, Location};

use crate::tracker::{Lattice, TrackedInvoke};

/// Converts the tracker's internal lattice value into the finding's
/// positional `ArgumentValue`, assigning it `index`.
fn to_argument_value(index: usize, value: &Lattice) -> ArgumentValue {
    match value.as_str() {
        Some(s) => ArgumentValue::known(index as i32, s),
        None => ArgumentValue::unresolved(index as i32),
    }
}

/// Looks up an argument by its catalog-declared position. A negative index,
/// or one past the end of the finding's actual argument list, means the
/// catalog declares this API has no such argument — distinct from the
/// argument existing but not resolving to a literal.
fn arg_at(args: &[ArgumentValue], index: i32) -> Option<ArgumentValue> {
    if index < 0 {
        return None;
    }
    args.get(index as usize).cloned()
}

/// Looks up one invocation in the catalog and, if it's a cataloged API,
/// builds the corresponding finding.
pub fn match_invoke(
    invoke: &TrackedInvoke,
    catalog: &Catalog,
    code: &classfile::CodeAttribute,
    class_name: &str,
    method_signature: &str,
    source_file: Option<&str>,
) -> Option<Finding> {
    let spec = catalog.lookup(&invoke.class, &invoke.method)?;

    let args: Vec<ArgumentValue> = invoke
        .args
        .iter()
        .enumerate()
        .map(|(i, v)| to_argument_value(i, v))
        .collect();

    let algorithm = arg_at(&args, spec.algorithm_index);
    let provider = arg_at(&args, spec.provider_name_index);

    Some(Finding {
        api: ApiRef::new(invoke.class.clone(), invoke.method.clone()),
        declaring_class: invoke.class.clone(),
        method_name: invoke.method.clone(),
        sub_signature: invoke
            .descriptor
            .parse::<descriptor::MethodDescriptor>()
            .map(|d| d.canonical_signature(&invoke.method))
            .unwrap_or_else(|_| invoke.descriptor.clone()),
        args,
        algorithm,
        provider,
        location: Location {
            class_name: class_name.to_owned(),
            method_signature: method_signature.to_owned(),
            source_file: source_file.map(str::to_owned),
            line: code.line_for_pc(invoke.pc),
        },
    })
}

/// Scans every invocation in a decoded method, in instruction order,
/// returning the findings for cataloged call sites.
pub fn scan_method(
    instructions: &[classfile::Instruction],
    code: &classfile::CodeAttribute,
    catalog: &Catalog,
    class_name: &str,
    method_signature: &str,
    source_file: Option<&str>,
) -> Vec<Finding> {
    let mut tracker = crate::tracker::Tracker::new();
    let invokes = tracker.run(instructions, |descriptor| {
        descriptor
            .parse::<descriptor::MethodDescriptor>()
            .map(|d| d.parameter_count())
            .unwrap_or(0)
    });

    invokes
        .iter()
        .filter_map(|inv| match_invoke(inv, catalog, code, class_name, method_signature, source_file))
        .collect()
}
