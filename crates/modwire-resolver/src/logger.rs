//! Per-module audit log: one append-only text buffer per module, optionally
//! flushed to a directory after the resolve.
//!
//! The log records the candidate table before and after every round, every
//! disabled wire with its reason, and the blame-resolution narrative. Its
//! format is for post-hoc audit, not a functional contract. Logging is
//! fire-and-forget: filesystem failures are downgraded to warnings and never
//! affect the resolve.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use modwire_core::resource::ResourceId;

use crate::consistency::UseConstraintError;
use crate::resource::ResolverResource;

#[derive(Debug, Default)]
pub struct ResolveLog {
    dir: Option<PathBuf>,
    buffers: BTreeMap<String, String>,
}

impl ResolveLog {
    /// In-memory log; nothing is written to disk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log that flushes one file per module into `dir`.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!("failed to create resolve log directory {}: {e}", dir.display());
            return Self::new();
        }
        Self {
            dir: Some(dir),
            buffers: BTreeMap::new(),
        }
    }

    fn file_key(resource: &ResourceId) -> String {
        format!("{}_{}.log", resource.symbolic_name, resource.version)
    }

    pub fn log(&mut self, resource: &ResourceId, line: impl AsRef<str>) {
        let buffer = self.buffers.entry(Self::file_key(resource)).or_default();
        buffer.push_str(line.as_ref());
        buffer.push('\n');
    }

    /// Dump a module's full candidate table: candidate counts, substitution
    /// markers, priorities of enabled wires and reasons of disabled ones.
    pub fn dump(&mut self, resource: &ResolverResource) {
        let mut out = String::new();
        for wires in resource.table() {
            let _ = write!(out, "[{}]", wires.len());
            if wires.is_substitution() {
                out.push_str("[S]");
            }
            let _ = writeln!(out, " {}:", wires.requirement());
            let mut priority = 1;
            for wire in wires.iter() {
                match wire.disabled_reason() {
                    None => {
                        let _ = writeln!(out, "\t[{priority}] {}", wire.capability());
                        priority += 1;
                    }
                    Some(reason) => {
                        let _ = writeln!(out, "\t[X] {} - {reason}", wire.capability());
                    }
                }
            }
        }
        let buffer = self.buffers.entry(Self::file_key(resource.id())).or_default();
        buffer.push_str(&out);
        buffer.push('\n');
    }

    pub fn log_error(&mut self, error: &UseConstraintError) {
        let line = format!(
            "-- use-constraint violation on package '{}' --\n{error}",
            error.package
        );
        let resource = error.resource.clone();
        self.log(&resource, line);
    }

    /// Buffered contents for one module; for tests and embedders that keep
    /// the log in memory.
    pub fn contents(&self, resource: &ResourceId) -> Option<&str> {
        self.buffers
            .get(&Self::file_key(resource))
            .map(String::as_str)
    }

    /// Write all buffers to the configured directory, if any.
    pub fn flush(&self) {
        let Some(dir) = &self.dir else {
            return;
        };
        for (name, buffer) in &self.buffers {
            let path = dir.join(name);
            if let Err(e) = fs::write(&path, buffer) {
                tracing::warn!("failed to write resolve log {}: {e}", path.display());
            }
        }
    }
}

impl Drop for ResolveLog {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modwire_core::context::StaticContext;
    use modwire_core::resource::Resource;

    fn rid(s: &str) -> ResourceId {
        ResourceId::parse(s).unwrap()
    }

    #[test]
    fn log_lines_accumulate_per_module() {
        let mut log = ResolveLog::new();
        log.log(&rid("a:1.0.0"), "first");
        log.log(&rid("a:1.0.0"), "second");
        log.log(&rid("b:1.0.0"), "other");
        assert_eq!(log.contents(&rid("a:1.0.0")), Some("first\nsecond\n"));
        assert_eq!(log.contents(&rid("b:1.0.0")), Some("other\n"));
    }

    #[test]
    fn dump_marks_disabled_wires() {
        let mut context = StaticContext::new();
        let mut x = Resource::new(rid("x:1.0.0"));
        x.export_package("org.example.api", []);
        let mut y = Resource::new(rid("y:1.0.0"));
        y.export_package("org.example.api", []);
        context.add_mandatory(x).add_mandatory(y);

        let mut app = Resource::new(rid("app:1.0.0"));
        app.import_package("org.example.api");
        let mut resolved = ResolverResource::new(&app, &context, true);
        resolved.table_mut()[0].wires_mut()[1].disable("struck out in a test");

        let mut log = ResolveLog::new();
        log.dump(&resolved);
        let contents = log.contents(&rid("app:1.0.0")).unwrap();
        assert!(contents.contains("[2] package=org.example.api"));
        assert!(contents.contains("[1] package=org.example.api [x:1.0.0]"));
        assert!(contents.contains("[X] package=org.example.api [y:1.0.0] - struck out in a test"));
    }

    #[test]
    fn flush_writes_one_file_per_module() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = ResolveLog::with_dir(dir.path().join("resolve"));
        log.log(&rid("a:1.0.0"), "hello");
        log.flush();
        let written = std::fs::read_to_string(dir.path().join("resolve/a_1.0.0.log")).unwrap();
        assert_eq!(written, "hello\n");
    }
}
