//! Source line helpers used throughout diagnostic reporting.
//!
//! The front end tags every diagnostic with the line it was raised on. A
//! `LineCounter` lets a traversal driver keep that position current while
//! it consumes newline tokens.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Line(pub u32);

impl Line {
    pub const fn new(line: u32) -> Self {
        Self(line)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Line {
    fn from(line: u32) -> Self {
        Self(line)
    }
}

/// Running line position of a traversal.
#[derive(Debug, Clone, Default)]
pub struct LineCounter {
    line: u32,
}

impl LineCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `count` consumed newlines.
    pub fn add(&mut self, count: u32) {
        self.line += count;
    }

    pub fn current(&self) -> Line {
        Line(self.line)
    }
}
