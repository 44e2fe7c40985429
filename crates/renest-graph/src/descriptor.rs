//! Minimal JVM descriptor parsing.
//!
//! Only what reference derivation needs: which class names a field or method
//! descriptor mentions, and whether a mention is behind an array dimension.

use crate::facts::FactsError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Primitive,
    Object(String),
    Array(Box<FieldType>),
}

impl FieldType {
    /// The class name this type refers to, if any, together with whether it
    /// sits behind one or more array dimensions.
    pub fn object_name(&self) -> Option<(&str, bool)> {
        match self {
            FieldType::Primitive => None,
            FieldType::Object(name) => Some((name, false)),
            FieldType::Array(elem) => {
                let (name, _) = elem.object_name()?;
                Some((name, true))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub params: Vec<FieldType>,
    pub return_type: Option<FieldType>,
}

impl MethodDescriptor {
    /// All class-typed parameter and return positions.
    pub fn object_refs(&self) -> impl Iterator<Item = (&str, bool)> {
        self.params
            .iter()
            .chain(self.return_type.iter())
            .filter_map(FieldType::object_name)
    }
}

pub fn parse_field_descriptor(desc: &str) -> Result<FieldType, FactsError> {
    let (ty, rest) = parse_field_type(desc)
        .ok_or_else(|| FactsError::InvalidDescriptor(desc.to_string()))?;
    if !rest.is_empty() {
        return Err(FactsError::InvalidDescriptor(desc.to_string()));
    }
    Ok(ty)
}

pub fn parse_method_descriptor(desc: &str) -> Result<MethodDescriptor, FactsError> {
    let invalid = || FactsError::InvalidDescriptor(desc.to_string());

    let mut rest = desc.strip_prefix('(').ok_or_else(invalid)?;
    let mut params = Vec::new();
    loop {
        if let Some(after) = rest.strip_prefix(')') {
            rest = after;
            break;
        }
        let (param, after) = parse_field_type(rest).ok_or_else(invalid)?;
        params.push(param);
        rest = after;
    }

    let return_type = if let Some(after) = rest.strip_prefix('V') {
        rest = after;
        None
    } else {
        let (ty, after) = parse_field_type(rest).ok_or_else(invalid)?;
        rest = after;
        Some(ty)
    };

    if !rest.is_empty() {
        return Err(invalid());
    }

    Ok(MethodDescriptor {
        params,
        return_type,
    })
}

fn parse_field_type(input: &str) -> Option<(FieldType, &str)> {
    match input.as_bytes().first()? {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => {
            Some((FieldType::Primitive, &input[1..]))
        }
        b'L' => {
            let end = input.find(';')?;
            let name = &input[1..end];
            if name.is_empty() {
                return None;
            }
            Some((FieldType::Object(name.to_string()), &input[end + 1..]))
        }
        b'[' => {
            let (elem, rest) = parse_field_type(&input[1..])?;
            Some((FieldType::Array(Box::new(elem)), rest))
        }
        _ => None,
    }
}
