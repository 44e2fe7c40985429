//! Reader and writer for the line-based nesting mapping format.
//!
//! One assigned class per line, six whitespace-delimited fields:
//!
//! ```text
//! class  enclClass  enclMethodName  enclMethodDesc  innerNameOrIndex  access
//! ```
//!
//! Empty enclosing-method fields nest the class directly into the enclosing
//! class; the fifth field then carries the kind: empty or a positive integer
//! means Anonymous, anything else is an Inner simple name. With an enclosing
//! method, a positive integer is an anonymous positional index and anything
//! else a local class name whose generated digit prefix is stripped.
//! Malformed or unresolvable lines are skipped, never fatal; only I/O
//! failures abort a read or write.

#![forbid(unsafe_code)]

use std::fs;
use std::io::Write;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use renest_core::name::{natural_cmp, strip_local_prefix};
use renest_graph::{ClassGraph, ClassId, MethodId};
use renest_nest::{NestKind, NestingGraph, Subject};

#[derive(Debug, Error)]
pub enum MappingsError {
    #[error("mapping i/o failed")]
    Io(#[from] std::io::Error),
}

/// Per-read accounting. `healed` entries are also counted in `applied`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadSummary {
    pub applied: usize,
    pub skipped: usize,
    pub healed: usize,
}

pub fn read(path: impl AsRef<Path>, graph: &mut NestingGraph) -> Result<ReadSummary, MappingsError> {
    let text = fs::read_to_string(path)?;
    Ok(read_from(&text, graph))
}

/// Applies every well-formed mapping line to `graph`. Lines with the wrong
/// field count, empty class names, or unparseable access flags are skipped
/// with a diagnostic, as are lines naming classes or methods the graph does
/// not know.
pub fn read_from(text: &str, graph: &mut NestingGraph) -> ReadSummary {
    let mut summary = ReadSummary::default();

    for line in text.lines() {
        if apply_line(line, graph, &mut summary.healed) {
            summary.applied += 1;
        } else {
            summary.skipped += 1;
        }
    }

    summary
}

fn apply_line(line: &str, graph: &mut NestingGraph, healed: &mut usize) -> bool {
    // single-character split keeps empty fields from consecutive tabs
    let fields: Vec<&str> = line.split(|c: char| c.is_whitespace()).collect();
    let &[class_name, encl_name, method_name, method_desc, inner_name, access] = fields.as_slice() else {
        warn!(line, fields = fields.len(), "mapping line does not have 6 fields");
        return false;
    };

    if class_name.is_empty() {
        warn!(line, "mapping line is missing the class name");
        return false;
    }
    if encl_name.is_empty() {
        warn!(line, "mapping line is missing the enclosing class name");
        return false;
    }
    if access.parse::<u32>().is_err() {
        warn!(line, access, "mapping line has invalid access flags");
        return false;
    }

    let Some(class) = graph.graph().class_by_name(class_name) else {
        warn!(class = class_name, "ignoring mapping for unknown class");
        return false;
    };
    let Some(encl_class) = graph.graph().class_by_name(encl_name) else {
        warn!(
            class = class_name,
            enclosing = encl_name,
            "ignoring mapping with unknown enclosing class"
        );
        return false;
    };

    if method_name.is_empty() || method_desc.is_empty() {
        // nested directly into a class; an empty or purely positional name
        // field marks the nest as anonymous
        if inner_name.is_empty() || inner_name.parse::<u32>().is_ok_and(|n| n > 0) {
            return apply(graph, class, Subject::Class(encl_class), NestKind::Anonymous, None);
        }
        return apply(
            graph,
            class,
            Subject::Class(encl_class),
            NestKind::Inner,
            Some(inner_name),
        );
    }

    let Some(stored) = graph.graph().method_by_sig(encl_class, method_name, method_desc) else {
        warn!(
            class = class_name,
            enclosing = encl_name,
            method = method_name,
            "ignoring mapping with unknown enclosing method"
        );
        return false;
    };

    if inner_name.is_empty() || inner_name.parse::<u32>().is_ok_and(|n| n > 0) {
        // anonymous entry: the stored coordinates may be stale, so prefer
        // the method the live constructor call site points at
        let method = match live_anonymous_site(graph.graph(), class) {
            Some(live) => {
                if live != stored {
                    info!(
                        class = class_name,
                        stored = %graph.subject_display(Subject::Method(stored)),
                        live = %graph.subject_display(Subject::Method(live)),
                        "moving anonymous class to its live call site"
                    );
                    *healed += 1;
                }
                live
            }
            None => stored,
        };
        return apply(graph, class, Subject::Method(method), NestKind::Anonymous, None);
    }

    let name = strip_local_prefix(inner_name);
    let name = (!name.is_empty()).then_some(name);
    apply(graph, class, Subject::Method(stored), NestKind::Inner, name)
}

fn apply(
    graph: &mut NestingGraph,
    class: ClassId,
    subject: Subject,
    kind: NestKind,
    name: Option<&str>,
) -> bool {
    let result = match kind {
        NestKind::Anonymous => {
            let encl_class = graph.enclosing_class_of(subject);
            let encl_method = graph.enclosing_method_of(subject);
            graph.assign_anonymous(class, encl_class, encl_method)
        }
        _ => graph.assign_inner(class, subject, name),
    };

    match result {
        Ok(()) => true,
        Err(err) => {
            warn!(class = %graph.graph().class(class).name, %err, "ignoring unappliable mapping");
            false
        }
    }
}

/// The signal anonymous inference runs on: exactly one non-synthetic
/// constructor called from exactly one site.
fn live_anonymous_site(graph: &ClassGraph, class: ClassId) -> Option<MethodId> {
    let constructors = graph.instance_constructors(class);
    let [constructor] = constructors.as_slice() else {
        return None;
    };
    let [call_site] = graph.method(*constructor).refs_in.as_slice() else {
        return None;
    };
    Some(*call_site)
}

/// Writes every assigned real class, in natural name order. Refuses to
/// overwrite an existing file. Returns `false` without touching the
/// filesystem when there is nothing to write.
pub fn write(path: impl AsRef<Path>, graph: &NestingGraph) -> Result<bool, MappingsError> {
    let mut buf = Vec::new();
    if !write_to(&mut buf, graph)? {
        return Ok(false);
    }

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(&buf)?;
    Ok(true)
}

pub fn write_to(out: &mut impl Write, graph: &NestingGraph) -> Result<bool, MappingsError> {
    let mut classes: Vec<ClassId> = graph
        .graph()
        .class_ids()
        .filter(|&c| graph.graph().is_real(c) && graph.has_nest(c))
        .collect();
    if classes.is_empty() {
        return Ok(false);
    }
    classes.sort_by(|&a, &b| natural_cmp(&graph.graph().class(a).name, &graph.graph().class(b).name));

    for class in classes {
        let Some(nest) = graph.nest(class) else {
            continue;
        };

        let encl_class = graph.enclosing_class_of(nest.subject);
        let (method_name, method_desc) = match graph.enclosing_method_of(nest.subject) {
            Some(m) => {
                let method = graph.graph().method(m);
                (method.name.as_str(), method.desc.as_str())
            }
            None => ("", ""),
        };

        // anonymous classes nested straight into a class carry no stored
        // name; an empty field keeps the kind recoverable on read
        let inner_field = match (nest.kind, nest.subject) {
            (NestKind::Anonymous, Subject::Class(_)) => String::new(),
            (NestKind::Inner, Subject::Method(_)) => {
                format!("{}{}", graph.local_prefix(class), graph.inner_name(class))
            }
            _ => graph.inner_name(class).to_string(),
        };

        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}",
            graph.graph().class(class).name,
            graph.graph().class(encl_class).name,
            method_name,
            method_desc,
            inner_field,
            graph.graph().class(class).access,
        )?;
    }

    Ok(true)
}
