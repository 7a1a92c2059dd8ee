//! Output sinks for rendered diagnostics.
//!
//! The collector renders every diagnostic the moment it is recorded. Where
//! that text goes is decided once, when the collector is built.

use std::fmt;
use std::io::{self, Write};

/// Destination for rendered diagnostic lines.
#[derive(Default)]
pub enum Echo {
    /// Write each line to standard error.
    #[default]
    Stderr,
    /// Keep diagnostics in memory only.
    Silent,
    /// Write each line to a caller-supplied writer.
    Writer(Box<dyn Write + Send>),
}

impl Echo {
    pub(crate) fn emit(&mut self, rendered: &str) -> io::Result<()> {
        match self {
            Echo::Stderr => writeln!(io::stderr().lock(), "{}", rendered),
            Echo::Silent => Ok(()),
            Echo::Writer(writer) => writeln!(writer, "{}", rendered),
        }
    }
}

impl fmt::Debug for Echo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Echo::Stderr => f.write_str("Echo::Stderr"),
            Echo::Silent => f.write_str("Echo::Silent"),
            Echo::Writer(_) => f.write_str("Echo::Writer(..)"),
        }
    }
}
