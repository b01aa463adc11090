//! Result of a generation pass.

use crate::cache::CacheStats;
use routegen_codegen::{SourceUnit, ThunkGroup};
use routegen_core::{Diagnostic, Endpoint};
use std::fs;
use std::io;
use std::path::Path;

/// Everything one pass produced.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    /// All diagnostics, ordered by location then kind.
    pub diagnostics: Vec<Diagnostic>,
    /// Generated source units.
    pub units: Vec<SourceUnit>,
    /// Built endpoints in stable source order. Dropped registrations are
    /// only present as diagnostics.
    pub endpoints: Vec<Endpoint>,
    /// Thunk groups; member indices refer to `endpoints`.
    pub groups: Vec<ThunkGroup>,
    /// Cache hits and misses of the pass.
    pub cache_stats: CacheStats,
}

impl GenerationOutput {
    /// Whether any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Error diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// The unit called `name`.
    #[must_use]
    pub fn unit(&self, name: &str) -> Option<&SourceUnit> {
        self.units.iter().find(|u| u.name == name)
    }

    /// Writes every unit into `dir`, skipping files whose content is
    /// already identical.
    ///
    /// # Errors
    ///
    /// Returns the first I/O failure.
    pub fn write_units(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)?;
        for unit in &self.units {
            let path = dir.join(&unit.name);
            if fs::read_to_string(&path).is_ok_and(|existing| existing == unit.content) {
                continue;
            }
            fs::write(&path, &unit.content)?;
        }
        Ok(())
    }
}
