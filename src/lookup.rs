use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions probed when a candidate path has no file behind it, in
/// priority order.
pub const EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mts", "mjs", "cjs", "vue"];

/// Identifier of a successfully resolved module, as reported by the lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Confirms candidate paths against the module graph.
///
/// Contextual rewrites go through this seam instead of straight to disk so
/// the engine can be driven by a bundler's own resolution when embedded,
/// and by a recording fake in tests.
pub trait ModuleLookup {
    /// Resolve a candidate path, returning the confirmed module on success
    /// and `None` when nothing is found. The importer is available for
    /// lookups that resolve relative to it; `DiskLookup` ignores it.
    fn resolve(&self, candidate: &Path, importer: Option<&Path>) -> Option<ModuleId>;
}

/// Filesystem-backed lookup: the candidate resolves if it names a file
/// directly, with one of [`EXTENSIONS`] appended, or as a directory with an
/// `index` file inside.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskLookup;

impl ModuleLookup for DiskLookup {
    fn resolve(&self, candidate: &Path, _importer: Option<&Path>) -> Option<ModuleId> {
        let hit = probe(candidate)?;
        let resolved = fs::canonicalize(&hit).unwrap_or(hit);
        Some(ModuleId::new(resolved.to_string_lossy().into_owned()))
    }
}

fn probe(candidate: &Path) -> Option<PathBuf> {
    if candidate.is_file() {
        return Some(candidate.to_path_buf());
    }
    for ext in EXTENSIONS {
        let with_ext = append_extension(candidate, ext);
        if with_ext.is_file() {
            return Some(with_ext);
        }
    }
    let index = candidate.join("index");
    for ext in EXTENSIONS {
        let with_ext = append_extension(&index, ext);
        if with_ext.is_file() {
            return Some(with_ext);
        }
    }
    None
}

/// Append an extension without touching any existing one, so a candidate
/// like `entry.spec` probes `entry.spec.ts` rather than `entry.ts`.
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut joined = OsString::from(path.as_os_str());
    joined.push(".");
    joined.push(ext);
    PathBuf::from(joined)
}
