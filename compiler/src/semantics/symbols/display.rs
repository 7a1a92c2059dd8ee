//! Pretty-printing helpers for the scope registry.
//!
//! The formatter produces deterministic, human-friendly output to assist with
//! debugging and snapshot-style regression tests. Scopes appear in
//! allocation order and bindings in declaration order.

use std::fmt::{self, Write};

use crate::semantics::symbols::manager::ScopeManager;
use crate::semantics::symbols::scope::{ActivationRecord, ScopeTable};

/// Format the full state of a manager into a human-readable string.
pub fn format_scopes(manager: &ScopeManager) -> String {
    let mut formatter = ScopeFormatter::new();
    match formatter.write_manager(manager) {
        Ok(()) => formatter.finish(),
        Err(fmt::Error) => String::new(),
    }
}

/// Stateful formatter used to render scope tables.
#[derive(Debug, Default)]
pub struct ScopeFormatter {
    buffer: String,
}

impl ScopeFormatter {
    /// Create a fresh formatter.
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Emit the counters, active stacks, function registry and every scope.
    pub fn write_manager(&mut self, manager: &ScopeManager) -> fmt::Result {
        writeln!(self.buffer, "ScopeManager {{")?;
        writeln!(
            self.buffer,
            "  temps: {}, labels: {}, scopes: {}",
            manager.temp_count(),
            manager.label_count(),
            manager.scope_count()
        )?;

        let active = manager
            .active_scopes()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let cursors = manager
            .offset_cursors()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(self.buffer, "  active: [{}]", active)?;
        writeln!(self.buffer, "  offsets: [{}]", cursors)?;

        let functions = manager.functions();
        if !functions.is_empty() {
            writeln!(self.buffer, "  functions {{")?;
            for (name, scope) in functions {
                self.indent_line(4, &format!("{} -> scope {}", name, scope))?;
            }
            writeln!(self.buffer, "  }}")?;
        }

        for scope in manager.scopes() {
            self.write_scope(scope, 2)?;
        }

        writeln!(self.buffer, "}}")
    }

    /// Consume the formatter and return the accumulated string.
    pub fn finish(self) -> String {
        self.buffer
    }

    fn write_scope(&mut self, scope: &ScopeTable, indent: usize) -> fmt::Result {
        let parent = match scope.parent {
            Some(parent) => format!(" parent {}", parent),
            None => String::new(),
        };
        let extent = match scope.end_offset() {
            Some(end) => format!(" [{}..{}]", scope.start_offset(), end),
            None => format!(" [{}..]", scope.start_offset()),
        };
        self.indent_line(
            indent,
            &format!("scope {} {}{}{}", scope.id, scope.kind(), parent, extent),
        )?;

        if let Some(frame) = scope.activation_record() {
            self.write_frame(frame, indent + 2)?;
        }

        for (name, def) in scope.type_defs() {
            self.indent_line(
                indent + 2,
                &format!("type {} = {} (size {})", name, def.ty, def.size),
            )?;
            for (field, layout) in &def.fields {
                self.indent_line(
                    indent + 4,
                    &format!("{}: {} (size {})", field, layout.ty, layout.size),
                )?;
            }
        }

        for (name, binding) in scope.bindings() {
            let mut line = format!("{}: {}", name, binding.ty);
            if let Some(size) = binding.size {
                line.push_str(&format!(" size {}", size));
            }
            if let Some(offset) = binding.offset {
                line.push_str(&format!(" @{}", offset));
            }
            for (key, value) in &binding.extra {
                line.push_str(&format!(" {}={}", key, value));
            }
            self.indent_line(indent + 2, &line)?;
        }

        Ok(())
    }

    fn write_frame(&mut self, frame: &ActivationRecord, indent: usize) -> fmt::Result {
        let params = join(&frame.param_types);
        let returns = join(&frame.return_types);
        let slot = frame.return_slot.as_deref().unwrap_or("-");
        self.indent_line(
            indent,
            &format!("frame ({}) -> ({}) ret {}", params, returns, slot),
        )
    }

    fn indent_line(&mut self, indent: usize, text: &str) -> fmt::Result {
        writeln!(self.buffer, "{:indent$}{}", "", text, indent = indent)
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for ScopeManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_scopes(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantics::symbols::scope::ScopeKind;
    use goscope_core::types::TypeId;

    #[test]
    fn dump_lists_scopes_in_allocation_order() {
        let mut manager = ScopeManager::new();
        manager.declare_type("Point", TypeId::new("Point"), 8);
        manager.open_frame(ScopeKind::Function);
        manager.register_function("main");
        manager.set_signature(vec![TypeId::int()]).unwrap();
        manager.declare("x", TypeId::int(), 4);
        manager.declare_temporary(TypeId::bool(), 1);
        manager.close_scope();

        let expected = "\
ScopeManager {
  temps: 1, labels: 0, scopes: 2
  active: [0]
  offsets: [0]
  functions {
    main -> scope 1
  }
  scope 0 global [0..]
    type Point = Point (size 8)
  scope 1 function parent 0 [0..5]
    frame (int) -> () ret -
    x: int size 4 @0
    t0: bool size 1 @4
}
";
        assert_eq!(format_scopes(&manager), expected);
        assert_eq!(manager.to_string(), expected);
    }
}
