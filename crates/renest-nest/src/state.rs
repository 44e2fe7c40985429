//! The mutable nesting graph.
//!
//! Structural facts stay read-only in the underlying [`ClassGraph`]; this
//! layer holds one mutable `ClassState` per class: the committed nest,
//! derived naming, child bookkeeping and the memoized caches with their
//! dirty-propagation rules.

use renest_core::access::{self, ACC_FINAL, ACC_STATIC, INNER_ACCESS_MASK};
use renest_core::name::{inner_name_part, sibling_cmp, simple_class_name};
use tracing::debug;

use renest_graph::{ClassGraph, ClassId, MethodId};

use crate::error::NestError;
use crate::nest::{Nest, NestKind, Subject};
use crate::ranker;

#[derive(Debug, Clone)]
struct ClassState {
    nestable: bool,
    nest: Option<Nest>,
    inner_access: Option<u16>,
    inner_name: String,
    local_prefix: String,
    /// Classes currently nested into this one, in assignment order.
    nesting_children: Vec<ClassId>,
    /// Anonymous-kind children, kept in sibling order for positional naming.
    anonymous_children: Vec<ClassId>,
    /// Method-subject Inner-kind ("local") children, in sibling order.
    local_children: Vec<ClassId>,
    potential_score: u8,
    potential_score_dirty: bool,
    has_static_members: Option<bool>,
    is_method_arg_type: Option<bool>,
}

impl Default for ClassState {
    fn default() -> Self {
        Self {
            nestable: true,
            nest: None,
            inner_access: None,
            inner_name: String::new(),
            local_prefix: String::new(),
            nesting_children: Vec::new(),
            anonymous_children: Vec::new(),
            local_children: Vec::new(),
            potential_score: 0,
            potential_score_dirty: true,
            has_static_members: None,
            is_method_arg_type: None,
        }
    }
}

/// A [`ClassGraph`] plus per-class nesting state.
#[derive(Debug)]
pub struct NestingGraph {
    graph: ClassGraph,
    states: Vec<ClassState>,
}

impl NestingGraph {
    pub fn new(graph: ClassGraph) -> Self {
        let states = vec![ClassState::default(); graph.class_count()];
        Self { graph, states }
    }

    pub fn graph(&self) -> &ClassGraph {
        &self.graph
    }

    fn state(&self, class: ClassId) -> &ClassState {
        &self.states[class.0 as usize]
    }

    fn state_mut(&mut self, class: ClassId) -> &mut ClassState {
        &mut self.states[class.0 as usize]
    }

    pub fn nest(&self, class: ClassId) -> Option<Nest> {
        self.state(class).nest
    }

    pub fn has_nest(&self, class: ClassId) -> bool {
        self.state(class).nest.is_some()
    }

    /// Placeholder classes are never nestable; real ones are unless toggled.
    pub fn is_nestable(&self, class: ClassId) -> bool {
        self.state(class).nestable && self.graph.is_real(class)
    }

    /// Toggling a class non-nestable also unnests it.
    pub fn set_nestable(&mut self, class: ClassId, nestable: bool) {
        self.state_mut(class).nestable = nestable;
        if !nestable {
            self.unassign(class);
        }
        self.mark_dirty(class);
    }

    pub fn inner_access(&self, class: ClassId) -> Option<u16> {
        self.state(class).inner_access
    }

    pub fn inner_name(&self, class: ClassId) -> &str {
        &self.state(class).inner_name
    }

    /// Explicit naming override, used when loading persisted mappings.
    pub fn set_inner_name(&mut self, class: ClassId, name: &str) {
        let state = self.state_mut(class);
        state.inner_name.clear();
        state.inner_name.push_str(name);
    }

    pub fn local_prefix(&self, class: ClassId) -> &str {
        &self.state(class).local_prefix
    }

    pub fn nesting_children(&self, class: ClassId) -> &[ClassId] {
        &self.state(class).nesting_children
    }

    /// The class a subject belongs to: the class itself, or a method's owner.
    pub fn enclosing_class_of(&self, subject: Subject) -> ClassId {
        match subject {
            Subject::Class(class) => class,
            Subject::Method(method) => self.graph.method(method).class,
        }
    }

    /// The method of a subject, if it is one.
    pub fn enclosing_method_of(&self, subject: Subject) -> Option<MethodId> {
        match subject {
            Subject::Class(_) => None,
            Subject::Method(method) => Some(method),
        }
    }

    pub fn subject_display(&self, subject: Subject) -> String {
        match subject {
            Subject::Class(class) => self.graph.class(class).name.clone(),
            Subject::Method(method) => {
                let m = self.graph.method(method);
                format!("{}.{}{}", self.graph.class(m.class).name, m.name, m.desc)
            }
        }
    }

    /// Whether `class` (transitively) encloses `subject`, through structural
    /// outer edges or committed nests.
    pub fn encloses(&self, class: ClassId, subject: Subject) -> bool {
        let start = match subject {
            Subject::Class(c) => c,
            Subject::Method(m) => {
                let owner = self.graph.method(m).class;
                if owner == class {
                    return true;
                }
                owner
            }
        };
        let mut visited = Vec::new();
        self.encloses_class(class, start, &mut visited)
    }

    fn encloses_class(&self, class: ClassId, current: ClassId, visited: &mut Vec<ClassId>) -> bool {
        if visited.contains(&current) {
            return false;
        }
        visited.push(current);

        if let Some(outer) = self.graph.class(current).outer_class {
            if outer == class || self.encloses_class(class, outer, visited) {
                return true;
            }
        }
        if let Some(nest) = self.state(current).nest {
            let encl = self.enclosing_class_of(nest.subject);
            if encl == class || self.encloses_class(class, encl, visited) {
                return true;
            }
        }
        false
    }

    /// Whether `class` may be nested into `subject`: not itself, not a class
    /// it already encloses, not one of its structural subclasses.
    pub fn can_nest_into(&self, class: ClassId, subject: Subject) -> bool {
        let target = self.enclosing_class_of(subject);
        class != target
            && !self.encloses(class, Subject::Class(target))
            && !self.graph.class(class).subclasses.contains(&target)
    }

    /// Commits a nest assignment. Rejects non-nestable classes, dummy kinds
    /// and targets that would close a cycle; no state changes on rejection.
    pub fn assign(&mut self, class: ClassId, subject: Subject, kind: NestKind) -> Result<(), NestError> {
        if kind.is_dummy() {
            return Err(NestError::DummyKind);
        }
        if !self.is_nestable(class) {
            return Err(NestError::NotNestable {
                class: self.graph.class(class).name.clone(),
            });
        }
        if !self.can_nest_into(class, subject) {
            return Err(NestError::CannotNest {
                class: self.graph.class(class).name.clone(),
                subject: self.subject_display(subject),
            });
        }

        debug!(
            class = %self.graph.class(class).name,
            subject = %self.subject_display(subject),
            ?kind,
            "nest class"
        );
        self.apply_nest(class, Some(Nest { subject, kind }));
        Ok(())
    }

    /// Nests `class` anonymously into a method, or into a class when the
    /// enclosing method is unknown.
    pub fn assign_anonymous(
        &mut self,
        class: ClassId,
        encl_class: ClassId,
        encl_method: Option<MethodId>,
    ) -> Result<(), NestError> {
        let subject = match encl_method {
            Some(method) => Subject::Method(method),
            None => Subject::Class(encl_class),
        };
        self.assign(class, subject, NestKind::Anonymous)
    }

    /// Nests `class` as an inner class, optionally overriding the derived
    /// simple name (persisted mappings carry the original one).
    pub fn assign_inner(
        &mut self,
        class: ClassId,
        subject: Subject,
        simple_name: Option<&str>,
    ) -> Result<(), NestError> {
        self.assign(class, subject, NestKind::Inner)?;
        if let Some(name) = simple_name {
            self.set_inner_name(class, name);
        }
        Ok(())
    }

    /// Clears the nest and all derived naming state.
    pub fn unassign(&mut self, class: ClassId) {
        if self.state(class).nest.is_some() {
            debug!(class = %self.graph.class(class).name, "unnest class");
        }
        self.apply_nest(class, None);
    }

    fn apply_nest(&mut self, class: ClassId, new: Option<Nest>) {
        let state = self.state_mut(class);
        state.inner_access = None;
        state.inner_name.clear();
        state.local_prefix.clear();

        if let Some(old) = self.state(class).nest {
            let encl = self.enclosing_class_of(old.subject);
            self.state_mut(encl).nesting_children.retain(|&c| c != class);
            self.mark_dirty(encl);

            match old.kind {
                NestKind::Anonymous => self.remove_anonymous_child(encl, class),
                NestKind::Inner => {
                    if matches!(old.subject, Subject::Method(_)) {
                        self.remove_local_child(encl, class);
                    }
                }
                NestKind::Dummy => unreachable!("dummy nests are never committed"),
            }
        }

        self.state_mut(class).nest = new;

        if let Some(nest) = new {
            let encl = self.enclosing_class_of(nest.subject);
            let children = &mut self.state_mut(encl).nesting_children;
            if !children.contains(&class) {
                children.push(class);
            }
            self.mark_dirty(encl);

            match nest.kind {
                NestKind::Anonymous => self.add_anonymous_child(encl, class),
                NestKind::Inner => {
                    if matches!(nest.subject, Subject::Method(_)) {
                        self.add_local_child(encl, class);
                    }
                }
                NestKind::Dummy => unreachable!("dummy nests are never committed"),
            }
        }

        self.mark_dirty(class);

        if let Some(nest) = new {
            self.derive_inner_access(class, nest);
            if nest.kind == NestKind::Inner {
                let derived =
                    inner_name_part(simple_class_name(&self.graph.class(class).name)).to_string();
                self.state_mut(class).inner_name = derived;
            }
        }
    }

    fn add_anonymous_child(&mut self, encl: ClassId, class: ClassId) {
        self.insert_sibling(encl, class, true);
        self.renumber_anonymous(encl);
    }

    fn remove_anonymous_child(&mut self, encl: ClassId, class: ClassId) {
        self.state_mut(encl).anonymous_children.retain(|&c| c != class);
        self.renumber_anonymous(encl);
    }

    fn add_local_child(&mut self, encl: ClassId, class: ClassId) {
        self.insert_sibling(encl, class, false);
        self.renumber_local(encl);
    }

    fn remove_local_child(&mut self, encl: ClassId, class: ClassId) {
        self.state_mut(encl).local_children.retain(|&c| c != class);
        self.renumber_local(encl);
    }

    fn insert_sibling(&mut self, encl: ClassId, class: ClassId, anonymous: bool) {
        let name = self.graph.class(class).name.clone();
        let siblings = if anonymous {
            &mut self.states[encl.0 as usize].anonymous_children
        } else {
            &mut self.states[encl.0 as usize].local_children
        };
        if siblings.contains(&class) {
            return;
        }
        let graph = &self.graph;
        let pos = siblings
            .iter()
            .position(|&c| sibling_cmp(&graph.class(c).name, &name).is_gt())
            .unwrap_or(siblings.len());
        siblings.insert(pos, class);
    }

    /// Anonymous children are named positionally, 1-based in sibling order.
    fn renumber_anonymous(&mut self, encl: ClassId) {
        let children = self.state(encl).anonymous_children.clone();
        for (index, child) in children.into_iter().enumerate() {
            self.state_mut(child).inner_name = (index + 1).to_string();
        }
    }

    /// Local-class prefixes only need to be locally unique; a 1-based counter
    /// keeps remapping collision-free.
    fn renumber_local(&mut self, encl: ClassId) {
        let children = self.state(encl).local_children.clone();
        for (index, child) in children.into_iter().enumerate() {
            self.state_mut(child).local_prefix = (index + 1).to_string();
        }
    }

    fn derive_inner_access(&mut self, class: ClassId, nest: Nest) {
        let mut inner_access = self.graph.class(class).access & INNER_ACCESS_MASK;

        match nest.kind {
            NestKind::Inner => {
                if self.has_static_members(class) {
                    inner_access |= ACC_STATIC;
                }
            }
            NestKind::Anonymous => {
                let static_site = match self.enclosing_method_of(nest.subject) {
                    Some(method) => self.graph.method(method).is_static(),
                    None => true,
                };
                if static_site {
                    inner_access |= ACC_STATIC;
                }
                inner_access &= !ACC_FINAL;
            }
            NestKind::Dummy => unreachable!("dummy nests are never committed"),
        }

        self.state_mut(class).inner_access = Some(inner_access);
    }

    /// Idempotent dirty propagation: clears this class's derived caches, then
    /// cascades to its enclosing class and everything nested into it. The
    /// early return on an already-dirty class is what keeps the walk finite
    /// over the mutual enclosing/nested edges.
    pub fn mark_dirty(&mut self, class: ClassId) {
        let state = self.state_mut(class);
        if state.potential_score_dirty {
            return;
        }
        state.potential_score_dirty = true;
        state.has_static_members = None;
        state.is_method_arg_type = None;

        if let Some(nest) = self.state(class).nest {
            let encl = self.enclosing_class_of(nest.subject);
            self.mark_dirty(encl);
        }
        for child in self.state(class).nesting_children.clone() {
            self.mark_dirty(child);
        }
    }

    /// Best score among all current candidates for this class; memoized.
    pub fn potential_score(&mut self, class: ClassId) -> u8 {
        if self.state(class).potential_score_dirty {
            let has_static = self.compute_has_static_members(class);
            let arg_type = self.compute_is_method_arg_type(class);
            let state = self.state_mut(class);
            state.has_static_members = Some(has_static);
            state.is_method_arg_type = Some(arg_type);

            let score = self.potential_score_uncached(class);
            let state = self.state_mut(class);
            state.potential_score = score;
            state.potential_score_dirty = false;
        }
        self.state(class).potential_score
    }

    /// Same value as [`NestingGraph::potential_score`], computed fresh.
    pub fn potential_score_uncached(&self, class: ClassId) -> u8 {
        if !self.is_nestable(class) {
            return 0;
        }
        let results = ranker::rank(self, class, None);
        ranker::best_candidate(&results).map_or(0, |c| c.score)
    }

    pub fn has_potential_nest(&mut self, class: ClassId) -> bool {
        if !self.is_nestable(class) {
            return false;
        }
        self.has_nest(class) || self.potential_score(class) > 0
    }

    /// Static bit of the derived inner access when present, else of the raw
    /// access flags.
    pub fn is_actually_static(&self, class: ClassId) -> bool {
        let access = self
            .state(class)
            .inner_access
            .unwrap_or(self.graph.class(class).access);
        access::is_static(access)
    }

    pub fn has_static_members(&self, class: ClassId) -> bool {
        match self.state(class).has_static_members {
            Some(cached) => cached,
            None => self.compute_has_static_members(class),
        }
    }

    fn compute_has_static_members(&self, class: ClassId) -> bool {
        if self.graph.is_enum(class) {
            return false;
        }
        let data = self.graph.class(class);
        if data
            .inner_classes
            .iter()
            .any(|&c| access::is_static(self.graph.class(c).access))
        {
            return true;
        }
        if self
            .state(class)
            .nesting_children
            .iter()
            .any(|&c| self.is_actually_static(c))
        {
            return true;
        }
        if data.fields.iter().any(|&f| {
            let field = self.graph.field(f);
            field.is_static() && !field.is_synthetic() && !field.is_final()
        }) {
            return true;
        }
        data.methods.iter().any(|&m| {
            let method = self.graph.method(m);
            method.is_static() && !method.is_synthetic() && method.name != "<clinit>"
        })
    }

    pub fn is_method_arg_type(&self, class: ClassId) -> bool {
        match self.state(class).is_method_arg_type {
            Some(cached) => cached,
            None => self.compute_is_method_arg_type(class),
        }
    }

    fn compute_is_method_arg_type(&self, class: ClassId) -> bool {
        self.graph.class(class).arg_type_refs.iter().any(|&m| {
            let method = self.graph.method(m);
            if method.is_synthetic() {
                return false;
            }
            // values captured into an anonymous constructor don't count
            if method.is_constructor() {
                let nest = self.state(method.class).nest;
                if matches!(nest, Some(n) if n.kind == NestKind::Anonymous) {
                    return false;
                }
            }
            true
        })
    }

    pub fn can_be_anonymous(&self, class: ClassId) -> bool {
        self.graph.class(class).can_be_anonymous
            && !self.graph.is_interface(class)
            && !self.has_static_members(class)
            && !self.is_method_arg_type(class)
    }

    /// Enums only qualify as inner classes when they extend the enum base
    /// directly; deeper specializations are anonymous variant bodies.
    pub fn can_be_inner(&self, class: ClassId) -> bool {
        if !self.graph.is_enum(class) {
            return true;
        }
        match self.graph.class(class).super_class {
            Some(sup) => self.graph.class(sup).name == "java/lang/Enum",
            None => false,
        }
    }

    /// Whether an Inner-kind nested class could be made static: its enclosing
    /// class must be top-level or itself static, and no synthetic field may
    /// hold a reference to an enclosing class.
    pub fn can_be_static(&self, class: ClassId) -> bool {
        let Some(nest) = self.state(class).nest else {
            return false;
        };
        if nest.kind != NestKind::Inner {
            return false;
        }

        let encl = self.enclosing_class_of(nest.subject);
        if !self.is_top_level(encl) && !self.is_actually_static(encl) {
            return false;
        }

        !self.graph.synthetic_fields(class).iter().any(|&f| {
            match self.graph.field(f).type_class {
                Some(ty) => self.encloses(ty, Subject::Class(class)),
                None => false,
            }
        })
    }

    pub fn is_top_level(&self, class: ClassId) -> bool {
        self.graph.class(class).outer_class.is_none() && self.state(class).nest.is_none()
    }

    pub fn top_level_class(&self, class: ClassId) -> ClassId {
        if let Some(outer) = self.graph.class(class).outer_class {
            return self.top_level_class(outer);
        }
        if let Some(nest) = self.state(class).nest {
            return self.top_level_class(self.enclosing_class_of(nest.subject));
        }
        class
    }
}
