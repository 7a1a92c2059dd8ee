//! Storage for scopes and the stacks that track the active ones.
//!
//! Scopes are never removed from the [`ScopeArena`]; a `ScopeId` stays valid
//! for the whole compilation so metadata of closed scopes can be read back.
//! The two stacks move in lockstep while the traversal enters and leaves
//! scopes.

use std::ops::{Index, IndexMut};

use crate::semantics::ids::ScopeId;
use crate::semantics::symbols::scope::{ScopeKind, ScopeTable};

/// Append-only owner of every scope in a compilation unit.
#[derive(Debug, Default)]
pub struct ScopeArena {
    entries: Vec<ScopeTable>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new scope and return its identifier.
    pub fn alloc(
        &mut self,
        parent: Option<ScopeId>,
        kind: ScopeKind,
        start_offset: usize,
    ) -> ScopeId {
        let id = ScopeId::from_raw(self.entries.len() as u32);
        self.entries
            .push(ScopeTable::new(id, parent, kind, start_offset));
        id
    }

    pub fn get(&self, id: ScopeId) -> Option<&ScopeTable> {
        self.entries.get(id.index())
    }

    pub fn get_mut(&mut self, id: ScopeId) -> Option<&mut ScopeTable> {
        self.entries.get_mut(id.index())
    }

    /// Retrieve the parent of a scope, if any.
    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.get(id).and_then(|scope| scope.parent)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScopeTable> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Index<ScopeId> for ScopeArena {
    type Output = ScopeTable;

    fn index(&self, id: ScopeId) -> &ScopeTable {
        &self.entries[id.index()]
    }
}

impl IndexMut<ScopeId> for ScopeArena {
    fn index_mut(&mut self, id: ScopeId) -> &mut ScopeTable {
        &mut self.entries[id.index()]
    }
}

/// Stack of currently active scopes, innermost last.
#[derive(Debug, Default)]
pub struct ScopeIdStack {
    stack: Vec<ScopeId>,
}

impl ScopeIdStack {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn push(&mut self, scope: ScopeId) {
        self.stack.push(scope);
    }

    pub fn pop(&mut self) -> Option<ScopeId> {
        self.stack.pop()
    }

    pub fn current(&self) -> Option<ScopeId> {
        self.stack.last().copied()
    }

    /// Active scopes from innermost to outermost.
    pub fn innermost_first(&self) -> impl Iterator<Item = ScopeId> + '_ {
        self.stack.iter().rev().copied()
    }

    pub fn as_slice(&self) -> &[ScopeId] {
        &self.stack
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

/// One scope's allocation cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    /// Next free offset.
    next: usize,
    /// Highest offset reached by this scope or any nested block.
    high_water: usize,
    /// Started a new activation record instead of continuing the parent's.
    fresh: bool,
}

/// Per-scope allocation cursors into the current activation record.
///
/// Closing a nested block hands its high-water mark to the enclosing
/// cursor without moving that cursor, so sibling blocks reuse the same
/// offsets while the frame still accounts for the largest of them.
#[derive(Debug, Default)]
pub struct OffsetStack {
    cursors: Vec<Cursor>,
}

impl OffsetStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a cursor continuing from the enclosing one.
    pub fn push_nested(&mut self) {
        let current = self.current();
        self.cursors.push(Cursor {
            next: current,
            high_water: current,
            fresh: false,
        });
    }

    /// Push a cursor starting a fresh frame at zero.
    pub fn push_fresh(&mut self) {
        self.cursors.push(Cursor {
            next: 0,
            high_water: 0,
            fresh: true,
        });
    }

    /// Pop the innermost cursor and return its high-water mark.
    pub fn pop(&mut self) -> Option<usize> {
        let popped = self.cursors.pop()?;
        if !popped.fresh {
            if let Some(parent) = self.cursors.last_mut() {
                parent.high_water = parent.high_water.max(popped.high_water);
            }
        }
        Some(popped.high_water)
    }

    pub fn current(&self) -> usize {
        self.cursors.last().map_or(0, |cursor| cursor.next)
    }

    /// High-water mark of the innermost cursor.
    pub fn high_water(&self) -> usize {
        self.cursors.last().map_or(0, |cursor| cursor.high_water)
    }

    /// Advance the innermost cursor and return its previous value.
    pub fn advance(&mut self, size: usize) -> usize {
        match self.cursors.last_mut() {
            Some(cursor) => {
                let start = cursor.next;
                cursor.next += size;
                cursor.high_water = cursor.high_water.max(cursor.next);
                start
            }
            None => 0,
        }
    }

    /// Next free offset of every cursor, outermost first.
    pub fn offsets(&self) -> Vec<usize> {
        self.cursors.iter().map(|cursor| cursor.next).collect()
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_ids_follow_allocation_order() {
        let mut arena = ScopeArena::new();
        let root = arena.alloc(None, ScopeKind::Global, 0);
        let child = arena.alloc(Some(root), ScopeKind::Block, 0);

        assert_eq!(root, ScopeId::GLOBAL);
        assert_eq!(child.to_raw(), 1);
        assert_eq!(arena.parent(child), Some(root));
        assert_eq!(arena.parent(root), None);
        assert_eq!(arena.len(), 2);
        assert!(arena.get(ScopeId::from_raw(7)).is_none());
    }

    #[test]
    fn nested_cursor_continues_and_fresh_cursor_resets() {
        let mut offsets = OffsetStack::new();
        offsets.push_fresh();
        assert_eq!(offsets.advance(8), 0);

        offsets.push_nested();
        assert_eq!(offsets.current(), 8);
        assert_eq!(offsets.advance(4), 8);
        assert_eq!(offsets.current(), 12);

        offsets.push_fresh();
        assert_eq!(offsets.current(), 0);

        offsets.pop();
        offsets.pop();
        assert_eq!(offsets.current(), 8);
    }

    #[test]
    fn nested_high_water_reaches_the_enclosing_cursor() {
        let mut offsets = OffsetStack::new();
        offsets.push_fresh();
        offsets.advance(4);

        offsets.push_nested();
        offsets.advance(8);
        assert_eq!(offsets.pop(), Some(12));
        assert_eq!(offsets.current(), 4);
        assert_eq!(offsets.high_water(), 12);

        offsets.push_nested();
        offsets.advance(2);
        assert_eq!(offsets.pop(), Some(6));
        assert_eq!(offsets.high_water(), 12);

        offsets.push_fresh();
        offsets.advance(100);
        assert_eq!(offsets.pop(), Some(100));
        assert_eq!(offsets.high_water(), 12);
        assert_eq!(offsets.pop(), Some(12));
        assert!(offsets.is_empty());
    }

    #[test]
    fn scope_stack_iterates_innermost_first() {
        let mut stack = ScopeIdStack::new();
        stack.push(ScopeId::from_raw(0));
        stack.push(ScopeId::from_raw(2));
        stack.push(ScopeId::from_raw(5));

        let order: Vec<u32> = stack.innermost_first().map(ScopeId::to_raw).collect();
        assert_eq!(order, vec![5, 2, 0]);
        assert_eq!(stack.current(), Some(ScopeId::from_raw(5)));
    }
}
