use std::collections::HashMap;

use renest_core::access;

use crate::descriptor::{parse_field_descriptor, parse_method_descriptor};
use crate::facts::FactsError;

/// Stable index of a class in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

/// Stable index of a method in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(pub u32);

/// Stable index of a field in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub u32);

#[derive(Debug, Clone)]
pub struct ClassData {
    /// JVM internal name, e.g. `a/b/Outer$Inner`.
    pub name: String,
    pub access: u16,
    /// Whether the class was part of the analyzed input, as opposed to a
    /// placeholder interned for an external reference.
    pub real: bool,
    pub input: bool,
    pub super_class: Option<ClassId>,
    pub interfaces: Vec<ClassId>,
    /// Structural outer class, when that metadata survived stripping. This is
    /// independent of any inferred nest.
    pub outer_class: Option<ClassId>,
    pub methods: Vec<MethodId>,
    pub fields: Vec<FieldId>,
    /// Direct subclasses and implementors.
    pub subclasses: Vec<ClassId>,
    /// Classes whose structural outer class is this one.
    pub inner_classes: Vec<ClassId>,
    /// Methods that take or return this class.
    pub arg_type_refs: Vec<MethodId>,
    /// Cleared when an array type of this class is observed; arrays rule the
    /// class out as anonymous.
    pub can_be_anonymous: bool,
}

#[derive(Debug, Clone)]
pub struct MethodData {
    pub class: ClassId,
    pub name: String,
    pub desc: String,
    pub access: u16,
    /// Methods that call this one, in first-seen order.
    pub refs_in: Vec<MethodId>,
    /// Methods this one calls, in first-seen order.
    pub refs_out: Vec<MethodId>,
}

impl MethodData {
    pub fn is_static(&self) -> bool {
        access::is_static(self.access)
    }

    pub fn is_synthetic(&self) -> bool {
        access::is_synthetic(self.access)
    }

    pub fn is_bridge(&self) -> bool {
        access::is_bridge(self.access)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }
}

#[derive(Debug, Clone)]
pub struct FieldData {
    pub class: ClassId,
    pub name: String,
    pub desc: String,
    pub access: u16,
    /// The class the field type refers to, if it is a class type (possibly
    /// behind array dimensions).
    pub type_class: Option<ClassId>,
    pub type_is_array: bool,
}

impl FieldData {
    pub fn is_static(&self) -> bool {
        access::is_static(self.access)
    }

    pub fn is_synthetic(&self) -> bool {
        access::is_synthetic(self.access)
    }

    pub fn is_final(&self) -> bool {
        access::is_final(self.access)
    }
}

/// Immutable structural facts for a set of classes.
///
/// Build one with [`GraphBuilder`] or load one from a facts file. All lookups
/// are by arena id; ids are assigned densely in interning order.
#[derive(Debug, Clone, Default)]
pub struct ClassGraph {
    classes: Vec<ClassData>,
    methods: Vec<MethodData>,
    fields: Vec<FieldData>,
    by_name: HashMap<String, ClassId>,
}

impl ClassGraph {
    pub fn class(&self, id: ClassId) -> &ClassData {
        &self.classes[id.0 as usize]
    }

    pub fn method(&self, id: MethodId) -> &MethodData {
        &self.methods[id.0 as usize]
    }

    pub fn field(&self, id: FieldId) -> &FieldData {
        &self.fields[id.0 as usize]
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.classes.len() as u32).map(ClassId)
    }

    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn method_by_sig(&self, class: ClassId, name: &str, desc: &str) -> Option<MethodId> {
        self.class(class)
            .methods
            .iter()
            .copied()
            .find(|&m| self.method(m).name == name && self.method(m).desc == desc)
    }

    pub fn is_real(&self, id: ClassId) -> bool {
        self.class(id).real
    }

    pub fn is_enum(&self, id: ClassId) -> bool {
        access::is_enum(self.class(id).access)
    }

    pub fn is_interface(&self, id: ClassId) -> bool {
        access::is_interface(self.class(id).access)
    }

    /// Non-synthetic `<init>` methods.
    pub fn instance_constructors(&self, id: ClassId) -> Vec<MethodId> {
        self.class_methods(id, |m| !m.is_synthetic() && m.is_constructor())
    }

    /// Non-synthetic methods other than `<init>`/`<clinit>`.
    pub fn declared_methods(&self, id: ClassId) -> Vec<MethodId> {
        self.class_methods(id, |m| {
            !m.is_synthetic() && !m.is_constructor() && m.name != "<clinit>"
        })
    }

    /// Synthetic non-bridge methods.
    pub fn synthetic_methods(&self, id: ClassId) -> Vec<MethodId> {
        self.class_methods(id, |m| m.is_synthetic() && !m.is_bridge())
    }

    pub fn has_synthetic_methods(&self, id: ClassId) -> bool {
        self.class(id)
            .methods
            .iter()
            .any(|&m| self.method(m).is_synthetic() && !self.method(m).is_bridge())
    }

    /// Synthetic fields, excluding an enum's generated values array.
    pub fn synthetic_fields(&self, id: ClassId) -> Vec<FieldId> {
        self.class(id)
            .fields
            .iter()
            .copied()
            .filter(|&f| self.field(f).is_synthetic() && !self.is_enum_values_field(id, f))
            .collect()
    }

    pub fn has_synthetic_fields(&self, id: ClassId) -> bool {
        !self.synthetic_fields(id).is_empty()
    }

    fn is_enum_values_field(&self, class: ClassId, field: FieldId) -> bool {
        let field = self.field(field);
        self.is_enum(class)
            && field.is_synthetic()
            && field.type_is_array
            && field.type_class == Some(class)
    }

    fn class_methods(&self, id: ClassId, pred: impl Fn(&MethodData) -> bool) -> Vec<MethodId> {
        self.class(id)
            .methods
            .iter()
            .copied()
            .filter(|&m| pred(self.method(m)))
            .collect()
    }
}

/// Incremental [`ClassGraph`] construction.
///
/// Any class name passed anywhere is interned; classes never declared via
/// [`GraphBuilder::add_class`] end up as non-real placeholders.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: ClassGraph,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a real class. Re-declaring an interned placeholder upgrades
    /// it in place.
    pub fn add_class(&mut self, name: &str, access: u16) -> ClassId {
        let id = self.intern(name);
        let data = &mut self.graph.classes[id.0 as usize];
        data.access = access;
        data.real = true;
        id
    }

    /// Interns a class reference without declaring it.
    pub fn class_ref(&mut self, name: &str) -> ClassId {
        self.intern(name)
    }

    pub fn set_input(&mut self, class: ClassId, input: bool) {
        self.graph.classes[class.0 as usize].input = input;
    }

    pub fn set_super(&mut self, class: ClassId, super_name: &str) {
        let super_id = self.intern(super_name);
        self.graph.classes[class.0 as usize].super_class = Some(super_id);
    }

    pub fn add_interface(&mut self, class: ClassId, interface_name: &str) {
        let iface = self.intern(interface_name);
        self.graph.classes[class.0 as usize].interfaces.push(iface);
    }

    pub fn set_outer_class(&mut self, class: ClassId, outer_name: &str) {
        let outer = self.intern(outer_name);
        self.graph.classes[class.0 as usize].outer_class = Some(outer);
    }

    /// Arrays of a class rule it out as anonymous; loaders call this when
    /// they observe an array type outright.
    pub fn mark_not_anonymous(&mut self, class: ClassId) {
        self.graph.classes[class.0 as usize].can_be_anonymous = false;
    }

    /// Adds a method and derives argument/return type references from its
    /// descriptor.
    pub fn add_method(
        &mut self,
        class: ClassId,
        name: &str,
        desc: &str,
        access: u16,
    ) -> Result<MethodId, FactsError> {
        let parsed = parse_method_descriptor(desc)?;

        let id = MethodId(self.graph.methods.len() as u32);
        self.graph.methods.push(MethodData {
            class,
            name: name.to_string(),
            desc: desc.to_string(),
            access,
            refs_in: Vec::new(),
            refs_out: Vec::new(),
        });
        self.graph.classes[class.0 as usize].methods.push(id);

        let refs: Vec<(String, bool)> = parsed
            .object_refs()
            .map(|(n, arr)| (n.to_string(), arr))
            .collect();
        for (type_name, is_array) in refs {
            let type_id = self.intern(&type_name);
            if is_array {
                self.mark_not_anonymous(type_id);
            } else {
                self.graph.classes[type_id.0 as usize].arg_type_refs.push(id);
            }
        }

        Ok(id)
    }

    /// Adds a field and links its type class from the descriptor.
    pub fn add_field(
        &mut self,
        class: ClassId,
        name: &str,
        desc: &str,
        access: u16,
    ) -> Result<FieldId, FactsError> {
        let parsed = parse_field_descriptor(desc)?;
        let (type_class, type_is_array) = match parsed.object_name() {
            Some((type_name, is_array)) => {
                let type_name = type_name.to_string();
                let type_id = self.intern(&type_name);
                if is_array {
                    self.mark_not_anonymous(type_id);
                }
                (Some(type_id), is_array)
            }
            None => (None, false),
        };

        let id = FieldId(self.graph.fields.len() as u32);
        self.graph.fields.push(FieldData {
            class,
            name: name.to_string(),
            desc: desc.to_string(),
            access,
            type_class,
            type_is_array,
        });
        self.graph.classes[class.0 as usize].fields.push(id);
        Ok(id)
    }

    /// Looks up an already-added method by owner name and signature.
    pub fn find_method(&self, class_name: &str, name: &str, desc: &str) -> Option<MethodId> {
        let class = self.graph.by_name.get(class_name)?;
        self.graph.method_by_sig(*class, name, desc)
    }

    /// Records a call edge; duplicate edges collapse to one.
    pub fn add_call(&mut self, from: MethodId, to: MethodId) {
        let refs_out = &mut self.graph.methods[from.0 as usize].refs_out;
        if !refs_out.contains(&to) {
            refs_out.push(to);
        }
        let refs_in = &mut self.graph.methods[to.0 as usize].refs_in;
        if !refs_in.contains(&from) {
            refs_in.push(from);
        }
    }

    pub fn finish(mut self) -> ClassGraph {
        for id in 0..self.graph.classes.len() as u32 {
            let id = ClassId(id);
            if let Some(sup) = self.graph.classes[id.0 as usize].super_class {
                self.graph.classes[sup.0 as usize].subclasses.push(id);
            }
            let interfaces = self.graph.classes[id.0 as usize].interfaces.clone();
            for iface in interfaces {
                self.graph.classes[iface.0 as usize].subclasses.push(id);
            }
            if let Some(outer) = self.graph.classes[id.0 as usize].outer_class {
                self.graph.classes[outer.0 as usize].inner_classes.push(id);
            }
        }
        self.graph
    }

    fn intern(&mut self, name: &str) -> ClassId {
        if let Some(&id) = self.graph.by_name.get(name) {
            return id;
        }
        let id = ClassId(self.graph.classes.len() as u32);
        self.graph.classes.push(ClassData {
            name: name.to_string(),
            access: 0,
            real: false,
            input: false,
            super_class: None,
            interfaces: Vec::new(),
            outer_class: None,
            methods: Vec::new(),
            fields: Vec::new(),
            subclasses: Vec::new(),
            inner_classes: Vec::new(),
            arg_type_refs: Vec::new(),
            can_be_anonymous: true,
        });
        self.graph.by_name.insert(name.to_string(), id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use renest_core::access::{ACC_ENUM, ACC_STATIC, ACC_SYNTHETIC};

    #[test]
    fn interning_creates_placeholders() {
        let mut b = GraphBuilder::new();
        let a = b.add_class("a/A", 0);
        b.set_super(a, "java/lang/Object");
        let g = b.finish();

        let obj = g.class_by_name("java/lang/Object").unwrap();
        assert!(g.is_real(a));
        assert!(!g.is_real(obj));
        assert_eq!(g.class(obj).subclasses, vec![a]);
    }

    #[test]
    fn method_descriptors_derive_arg_type_refs() {
        let mut b = GraphBuilder::new();
        let a = b.add_class("a/A", 0);
        let m = b.add_method(a, "run", "(La/B;[La/C;)La/D;", 0).unwrap();
        let g = b.finish();

        let bb = g.class_by_name("a/B").unwrap();
        let cc = g.class_by_name("a/C").unwrap();
        let dd = g.class_by_name("a/D").unwrap();
        assert_eq!(g.class(bb).arg_type_refs, vec![m]);
        // array mentions veto anonymity instead of adding a reference
        assert!(g.class(cc).arg_type_refs.is_empty());
        assert!(!g.class(cc).can_be_anonymous);
        assert_eq!(g.class(dd).arg_type_refs, vec![m]);
    }

    #[test]
    fn synthetic_fields_skip_enum_values_array() {
        let mut b = GraphBuilder::new();
        let e = b.add_class("a/E", ACC_ENUM);
        b.add_field(e, "$VALUES", "[La/E;", ACC_STATIC | ACC_SYNTHETIC)
            .unwrap();
        b.add_field(e, "this$0", "La/A;", ACC_SYNTHETIC).unwrap();
        let g = b.finish();

        let synth = g.synthetic_fields(e);
        assert_eq!(synth.len(), 1);
        assert_eq!(g.field(synth[0]).name, "this$0");
    }

    #[test]
    fn member_classification() {
        let mut b = GraphBuilder::new();
        let a = b.add_class("a/A", 0);
        b.add_method(a, "<init>", "()V", 0).unwrap();
        b.add_method(a, "<init>", "(I)V", ACC_SYNTHETIC).unwrap();
        b.add_method(a, "<clinit>", "()V", ACC_STATIC).unwrap();
        b.add_method(a, "run", "()V", 0).unwrap();
        b.add_method(a, "access$000", "()V", ACC_STATIC | ACC_SYNTHETIC)
            .unwrap();
        let g = b.finish();

        assert_eq!(g.instance_constructors(a).len(), 1);
        assert_eq!(g.declared_methods(a).len(), 1);
        assert_eq!(g.synthetic_methods(a).len(), 2);
    }

    #[test]
    fn call_edges_deduplicate() {
        let mut b = GraphBuilder::new();
        let a = b.add_class("a/A", 0);
        let c = b.add_class("a/B", 0);
        let m1 = b.add_method(a, "f", "()V", 0).unwrap();
        let m2 = b.add_method(c, "g", "()V", 0).unwrap();
        b.add_call(m1, m2);
        b.add_call(m1, m2);
        let g = b.finish();

        assert_eq!(g.method(m1).refs_out, vec![m2]);
        assert_eq!(g.method(m2).refs_in, vec![m1]);
    }
}
