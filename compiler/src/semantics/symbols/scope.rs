//! Lexical scope representation.
//!
//! A `ScopeTable` owns one scope's value bindings, its type namespace, and
//! the metadata describing what kind of region it is. Function scopes also
//! carry an [`ActivationRecord`]; the signature and return layout are only
//! reachable through it, so block and loop scopes cannot be given one by
//! accident.

use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;

use goscope_core::types::TypeId;

use crate::semantics::ids::ScopeId;
use crate::semantics::symbols::binding::{Binding, BindingAttr, TypeDef};
use crate::semantics::symbols::error::ScopeError;

/// Classification of a scope.
///
/// Kinds are compared by name, so `Named("loop")` and `Loop` are the same
/// kind. Build kinds from text with `ScopeKind::from`.
#[derive(Debug, Clone, Eq)]
pub enum ScopeKind {
    Global,
    Function,
    Block,
    Loop,
    Struct,
    Switch,
    Named(String),
}

impl PartialEq for ScopeKind {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Hash for ScopeKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl ScopeKind {
    pub fn as_str(&self) -> &str {
        match self {
            ScopeKind::Global => "global",
            ScopeKind::Function => "function",
            ScopeKind::Block => "block",
            ScopeKind::Loop => "loop",
            ScopeKind::Struct => "struct",
            ScopeKind::Switch => "switch",
            ScopeKind::Named(name) => name,
        }
    }
}

impl From<&str> for ScopeKind {
    /// Known kind names map to their variant; anything else is `Named`.
    fn from(name: &str) -> Self {
        match name {
            "global" => ScopeKind::Global,
            "function" => ScopeKind::Function,
            "block" => ScopeKind::Block,
            "loop" => ScopeKind::Loop,
            "struct" => ScopeKind::Struct,
            "switch" => ScopeKind::Switch,
            other => ScopeKind::Named(other.to_string()),
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compile-time description of a function's storage frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationRecord {
    pub param_types: Vec<TypeId>,
    pub param_sizes: Vec<usize>,
    pub return_types: Vec<TypeId>,
    pub return_sizes: Vec<usize>,
    /// Place holding the return value once the body is lowered.
    pub return_slot: Option<String>,
}

impl ActivationRecord {
    pub fn param_count(&self) -> usize {
        self.param_types.len()
    }

    pub fn signature(&self) -> &[TypeId] {
        &self.param_types
    }
}

/// Binding environment of a single scope.
#[derive(Debug)]
pub struct ScopeTable {
    /// Position in the scope registry.
    pub id: ScopeId,
    /// Enclosing scope, fixed at creation.
    pub parent: Option<ScopeId>,
    kind: ScopeKind,
    bindings: IndexMap<String, Binding>,
    types: IndexMap<String, TypeDef>,
    frame: Option<ActivationRecord>,
    start_offset: usize,
    end_offset: Option<usize>,
}

impl ScopeTable {
    pub fn new(
        id: ScopeId,
        parent: Option<ScopeId>,
        kind: ScopeKind,
        start_offset: usize,
    ) -> Self {
        Self {
            id,
            parent,
            kind,
            bindings: IndexMap::new(),
            types: IndexMap::new(),
            frame: None,
            start_offset,
            end_offset: None,
        }
    }

    /// Bind `name` unless this scope already binds it. Returns whether a new
    /// binding was created; the first declaration's attributes are kept.
    pub fn bind(&mut self, name: impl Into<String>, ty: TypeId) -> bool {
        let name = name.into();
        if self.bindings.contains_key(&name) {
            return false;
        }
        self.bindings.insert(name, Binding::new(ty));
        true
    }

    /// Update an attribute of an existing binding.
    pub fn set_attr(&mut self, name: &str, attr: BindingAttr) -> Result<(), ScopeError> {
        let scope = self.id;
        let binding = self
            .bindings
            .get_mut(name)
            .ok_or_else(|| ScopeError::Unbound {
                name: name.to_string(),
                scope,
            })?;
        binding.apply(attr);
        Ok(())
    }

    /// Bind `name` with its storage layout. Returns `false`, leaving the
    /// existing binding untouched, when the name is already bound here.
    pub fn bind_with_layout(
        &mut self,
        name: impl Into<String>,
        ty: TypeId,
        size: usize,
        offset: usize,
    ) -> bool {
        let name = name.into();
        if self.bindings.contains_key(&name) {
            return false;
        }
        let mut binding = Binding::new(ty);
        binding.size = Some(size);
        binding.offset = Some(offset);
        self.bindings.insert(name, binding);
        true
    }

    pub fn has_binding(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.bindings.iter().map(|(name, binding)| (name.as_str(), binding))
    }

    /// Register a type name; the first definition wins.
    pub fn define_type(&mut self, name: impl Into<String>, ty: TypeId, size: usize) -> bool {
        let name = name.into();
        if self.types.contains_key(&name) {
            return false;
        }
        self.types.insert(name, TypeDef::new(ty, size));
        true
    }

    /// Append a member to a type defined in this scope.
    pub fn add_field(
        &mut self,
        type_name: &str,
        field: impl Into<String>,
        ty: TypeId,
        size: usize,
    ) -> Result<bool, ScopeError> {
        let scope = self.id;
        let def = self
            .types
            .get_mut(type_name)
            .ok_or_else(|| ScopeError::UnknownTypeDef {
                name: type_name.to_string(),
                scope,
            })?;
        Ok(def.add_field(field, ty, size))
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn type_defs(&self) -> impl Iterator<Item = (&str, &TypeDef)> {
        self.types.iter().map(|(name, def)| (name.as_str(), def))
    }

    pub fn kind(&self) -> &ScopeKind {
        &self.kind
    }

    pub fn set_kind(&mut self, kind: ScopeKind) {
        self.kind = kind;
    }

    /// Tag this scope as a function frame. Existing frame data is kept.
    pub fn mark_activation_record(&mut self) -> &mut ActivationRecord {
        self.frame.get_or_insert_with(ActivationRecord::default)
    }

    pub fn is_activation_record(&self) -> bool {
        self.frame.is_some()
    }

    pub fn activation_record(&self) -> Option<&ActivationRecord> {
        self.frame.as_ref()
    }

    pub fn activation_record_mut(&mut self) -> Option<&mut ActivationRecord> {
        self.frame.as_mut()
    }

    /// Offset cursor value when the scope opened.
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// Highest offset reached by this scope or any block nested in it,
    /// known once the scope has closed.
    pub fn end_offset(&self) -> Option<usize> {
        self.end_offset
    }

    pub(crate) fn seal(&mut self, end_offset: usize) {
        self.end_offset = Some(end_offset);
    }

    /// Bytes reserved by this scope and its nested blocks.
    pub fn frame_size(&self) -> Option<usize> {
        self.end_offset.map(|end| end - self.start_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: u32) -> ScopeTable {
        ScopeTable::new(ScopeId::from_raw(id), Some(ScopeId::GLOBAL), ScopeKind::Block, 0)
    }

    #[test]
    fn first_binding_wins() {
        let mut scope = block(1);
        assert!(scope.bind("x", TypeId::int()));
        assert!(!scope.bind("x", TypeId::string()));
        assert_eq!(scope.binding("x").map(|b| &b.ty), Some(&TypeId::int()));
    }

    #[test]
    fn set_attr_requires_existing_binding() {
        let mut scope = block(1);
        let err = scope.set_attr("y", BindingAttr::Size(4)).unwrap_err();
        assert_eq!(
            err,
            ScopeError::Unbound {
                name: "y".into(),
                scope: ScopeId::from_raw(1)
            }
        );

        scope.bind("y", TypeId::int());
        scope.set_attr("y", BindingAttr::Size(4)).unwrap();
        assert_eq!(scope.binding("y").and_then(|b| b.size), Some(4));
    }

    #[test]
    fn value_and_type_namespaces_are_disjoint() {
        let mut scope = block(2);
        scope.bind("Point", TypeId::int());
        assert!(scope.define_type("Point", TypeId::new("Point"), 8));

        assert!(scope.has_binding("Point"));
        assert!(scope.has_type("Point"));
        assert!(!scope.has_type("x"));
        assert_eq!(scope.type_def("Point").map(|def| def.size), Some(8));
    }

    #[test]
    fn fields_need_a_defined_type() {
        let mut scope = block(1);
        assert!(scope.add_field("Pair", "a", TypeId::int(), 4).is_err());

        scope.define_type("Pair", TypeId::new("Pair"), 8);
        assert_eq!(scope.add_field("Pair", "a", TypeId::int(), 4), Ok(true));
        assert_eq!(scope.add_field("Pair", "a", TypeId::int(), 4), Ok(false));
    }

    #[test]
    fn activation_record_is_opt_in() {
        let mut scope = block(3);
        assert!(!scope.is_activation_record());
        assert!(scope.activation_record_mut().is_none());

        scope.mark_activation_record().param_types = vec![TypeId::int()];
        scope.mark_activation_record();
        assert_eq!(scope.activation_record().map(|f| f.param_count()), Some(1));
    }

    #[test]
    fn kinds_compare_by_name() {
        assert_eq!(ScopeKind::Named("loop".into()), ScopeKind::Loop);
        assert_eq!(ScopeKind::from("function"), ScopeKind::Function);
        assert!(matches!(ScopeKind::from("function"), ScopeKind::Function));
        assert_eq!(
            ScopeKind::from("select"),
            ScopeKind::Named("select".to_string())
        );
        assert_ne!(ScopeKind::from("select"), ScopeKind::Switch);
    }

    #[test]
    fn frame_size_is_known_after_sealing() {
        let mut scope = ScopeTable::new(ScopeId::from_raw(4), None, ScopeKind::Loop, 8);
        assert_eq!(scope.frame_size(), None);
        scope.seal(20);
        assert_eq!(scope.end_offset(), Some(20));
        assert_eq!(scope.frame_size(), Some(12));
    }
}
