//! JSON facts interchange.
//!
//! External tooling (classfile loaders, project front ends) hands renest a
//! structural snapshot as JSON; this module turns it into a [`ClassGraph`].
//! Call edges with endpoints missing from the snapshot are skipped with a
//! diagnostic, since facts files are often partial views.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::graph::{ClassGraph, GraphBuilder};

#[derive(Debug, Error)]
pub enum FactsError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed facts file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct FactsFile {
    pub classes: Vec<ClassFacts>,
    #[serde(default)]
    pub calls: Vec<CallFacts>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassFacts {
    pub name: String,
    #[serde(default)]
    pub access: u16,
    #[serde(default = "default_true")]
    pub input: bool,
    #[serde(rename = "super", default)]
    pub super_class: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub outer: Option<String>,
    #[serde(default)]
    pub fields: Vec<MemberFacts>,
    #[serde(default)]
    pub methods: Vec<MemberFacts>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberFacts {
    pub name: String,
    pub desc: String,
    #[serde(default)]
    pub access: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallFacts {
    pub from: MethodRef,
    pub to: MethodRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MethodRef {
    pub class: String,
    pub name: String,
    pub desc: String,
}

impl MethodRef {
    fn display(&self) -> String {
        format!("{}.{}{}", self.class, self.name, self.desc)
    }
}

fn default_true() -> bool {
    true
}

pub fn load_facts(path: &Path) -> Result<ClassGraph, FactsError> {
    let text = fs::read_to_string(path)?;
    parse_facts(&text)
}

pub fn parse_facts(text: &str) -> Result<ClassGraph, FactsError> {
    let file: FactsFile = serde_json::from_str(text)?;
    build_graph(&file)
}

pub fn build_graph(file: &FactsFile) -> Result<ClassGraph, FactsError> {
    let mut builder = GraphBuilder::new();

    for class in &file.classes {
        let id = builder.add_class(&class.name, class.access);
        builder.set_input(id, class.input);
        if let Some(super_class) = &class.super_class {
            builder.set_super(id, super_class);
        }
        for interface in &class.interfaces {
            builder.add_interface(id, interface);
        }
        if let Some(outer) = &class.outer {
            builder.set_outer_class(id, outer);
        }
        for field in &class.fields {
            builder.add_field(id, &field.name, &field.desc, field.access)?;
        }
        for method in &class.methods {
            builder.add_method(id, &method.name, &method.desc, method.access)?;
        }
    }

    for call in &file.calls {
        let from = builder.find_method(&call.from.class, &call.from.name, &call.from.desc);
        let to = builder.find_method(&call.to.class, &call.to.name, &call.to.desc);
        match (from, to) {
            (Some(from), Some(to)) => builder.add_call(from, to),
            _ => warn!(
                from = %call.from.display(),
                to = %call.to.display(),
                "skipping call edge with unresolved endpoint"
            ),
        }
    }

    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACTS: &str = r#"{
        "classes": [
            {
                "name": "a/Bar",
                "access": 33,
                "methods": [
                    { "name": "run", "desc": "()V" }
                ]
            },
            {
                "name": "a/Baz",
                "methods": [
                    { "name": "<init>", "desc": "()V" },
                    { "name": "call", "desc": "()V" }
                ],
                "fields": [
                    { "name": "this$0", "desc": "La/Bar;", "access": 4096 }
                ]
            }
        ],
        "calls": [
            {
                "from": { "class": "a/Bar", "name": "run", "desc": "()V" },
                "to": { "class": "a/Baz", "name": "<init>", "desc": "()V" }
            },
            {
                "from": { "class": "a/Missing", "name": "x", "desc": "()V" },
                "to": { "class": "a/Baz", "name": "call", "desc": "()V" }
            }
        ]
    }"#;

    #[test]
    fn loads_classes_and_call_edges() {
        let graph = parse_facts(FACTS).unwrap();

        let bar = graph.class_by_name("a/Bar").unwrap();
        let baz = graph.class_by_name("a/Baz").unwrap();
        assert!(graph.is_real(bar));
        assert!(graph.is_real(baz));

        let run = graph.method_by_sig(bar, "run", "()V").unwrap();
        let ctor = graph.method_by_sig(baz, "<init>", "()V").unwrap();
        assert_eq!(graph.method(ctor).refs_in, vec![run]);

        // the unresolved edge is dropped, not fatal
        let call = graph.method_by_sig(baz, "call", "()V").unwrap();
        assert!(graph.method(call).refs_in.is_empty());

        // the synthetic capture field links to its type class
        let field = graph.class(baz).fields[0];
        assert_eq!(graph.field(field).type_class, Some(bar));
    }

    #[test]
    fn malformed_json_is_fatal() {
        assert!(matches!(
            parse_facts("{ not json").unwrap_err(),
            FactsError::Json(_)
        ));
    }
}
