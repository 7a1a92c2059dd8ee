//! Binding entries and helpers.
//!
//! A binding records what the front end knows about a declared value: its
//! type, how many bytes it occupies, and where it lives in the enclosing
//! activation record. Type names live in a separate namespace described by
//! [`TypeDef`].

use indexmap::IndexMap;

use goscope_core::types::TypeId;

/// Attributes attached to a value binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub ty: TypeId,
    pub size: Option<usize>,
    pub offset: Option<usize>,
    /// Auxiliary attributes set by the traversal, in insertion order.
    pub extra: IndexMap<String, String>,
}

impl Binding {
    pub fn new(ty: TypeId) -> Self {
        Self {
            ty,
            size: None,
            offset: None,
            extra: IndexMap::new(),
        }
    }

    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }

    pub(crate) fn apply(&mut self, attr: BindingAttr) {
        match attr {
            BindingAttr::Type(ty) => self.ty = ty,
            BindingAttr::Size(size) => self.size = Some(size),
            BindingAttr::Offset(offset) => self.offset = Some(offset),
            BindingAttr::Extra { key, value } => {
                self.extra.insert(key, value);
            }
        }
    }
}

/// A single attribute update for an existing binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingAttr {
    Type(TypeId),
    Size(usize),
    Offset(usize),
    Extra { key: String, value: String },
}

impl BindingAttr {
    pub fn extra(key: impl Into<String>, value: impl Into<String>) -> Self {
        BindingAttr::Extra {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Layout of one member of a struct-like type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    pub ty: TypeId,
    pub size: usize,
}

/// A named type registered in a scope's type namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    pub ty: TypeId,
    /// Total size in bytes.
    pub size: usize,
    pub fields: IndexMap<String, FieldLayout>,
}

impl TypeDef {
    pub fn new(ty: TypeId, size: usize) -> Self {
        Self {
            ty,
            size,
            fields: IndexMap::new(),
        }
    }

    /// Append a member; the first definition of a member name wins.
    pub fn add_field(&mut self, name: impl Into<String>, ty: TypeId, size: usize) -> bool {
        let name = name.into();
        if self.fields.contains_key(&name) {
            return false;
        }
        self.fields.insert(name, FieldLayout { ty, size });
        true
    }

    /// Byte offset of a member within the type, counting earlier members.
    pub fn field_offset(&self, name: &str) -> Option<usize> {
        let index = self.fields.get_index_of(name)?;
        Some(
            self.fields
                .values()
                .take(index)
                .map(|field| field.size)
                .sum(),
        )
    }
}

/// Result of a combined value-then-type lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<'a> {
    Value(&'a Binding),
    Type(&'a TypeDef),
}

impl<'a> Resolved<'a> {
    pub fn ty(&self) -> &'a TypeId {
        match self {
            Resolved::Value(binding) => &binding.ty,
            Resolved::Type(def) => &def.ty,
        }
    }

    pub fn size(&self) -> Option<usize> {
        match self {
            Resolved::Value(binding) => binding.size,
            Resolved::Type(def) => Some(def.size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_updates_land_on_their_fields() {
        let mut binding = Binding::new(TypeId::int());
        binding.apply(BindingAttr::Size(8));
        binding.apply(BindingAttr::Offset(16));
        binding.apply(BindingAttr::extra("place", "t3"));

        assert_eq!(binding.size, Some(8));
        assert_eq!(binding.offset, Some(16));
        assert_eq!(binding.extra("place"), Some("t3"));
        assert_eq!(binding.extra("missing"), None);
    }

    #[test]
    fn struct_fields_keep_declaration_order() {
        let mut point = TypeDef::new(TypeId::new("Point"), 12);
        assert!(point.add_field("x", TypeId::int(), 4));
        assert!(point.add_field("y", TypeId::int(), 4));
        assert!(point.add_field("label", TypeId::rune(), 4));
        assert!(!point.add_field("x", TypeId::float(), 8));

        assert_eq!(point.fields["x"].ty, TypeId::int());
        assert_eq!(point.field_offset("x"), Some(0));
        assert_eq!(point.field_offset("label"), Some(8));
        assert_eq!(point.field_offset("z"), None);
    }
}
