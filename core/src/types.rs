//! Shared nominal type identifiers.
//!
//! These lightweight handles let the symbol table and diagnostics refer to
//! Go-like types by their spelled name without depending on a full type
//! representation. Composite constructors produce the same spelling the
//! source language uses, so two independently built names compare equal.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeId {
    pub name: String,
}

impl TypeId {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn int() -> Self {
        Self::new("int")
    }

    pub fn float() -> Self {
        Self::new("float")
    }

    pub fn string() -> Self {
        Self::new("string")
    }

    pub fn bool() -> Self {
        Self::new("bool")
    }

    pub fn rune() -> Self {
        Self::new("rune")
    }

    /// Placeholder for statements and functions without a result.
    pub fn void() -> Self {
        Self::new("void")
    }

    pub fn pointer_to(target: &TypeId) -> Self {
        Self::new(format!("*{}", target.name))
    }

    pub fn array_of(len: usize, element: &TypeId) -> Self {
        Self::new(format!("[{}]{}", len, element.name))
    }

    pub fn slice_of(element: &TypeId) -> Self {
        Self::new(format!("[]{}", element.name))
    }

    pub fn map_of(key: &TypeId, value: &TypeId) -> Self {
        Self::new(format!("map[{}]{}", key.name, value.name))
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for TypeId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_names_follow_source_spelling() {
        let int = TypeId::int();
        assert_eq!(TypeId::pointer_to(&int).as_str(), "*int");
        assert_eq!(TypeId::array_of(4, &int).as_str(), "[4]int");
        assert_eq!(TypeId::slice_of(&TypeId::string()).as_str(), "[]string");
        assert_eq!(
            TypeId::map_of(&TypeId::string(), &int).to_string(),
            "map[string]int"
        );
    }

    #[test]
    fn independently_built_names_compare_equal() {
        assert_eq!(TypeId::from("int"), TypeId::int());
        assert_ne!(TypeId::int(), TypeId::float());
    }
}
