//! Import statement parsing and module resolution.
//!
//! Resolution is split in two: [`parse_imports`] turns source lines into
//! [`ImportReference`]s, then [`ImportResolver`] maps a dotted module onto a
//! file through a [`SourceLookup`].

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

/// `from pkg.mod import a, b` at column 0. Relative modules do not match.
static FROM_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^from\s+([A-Za-z_][\w.]*)\s+import\s+(.+)$").expect("from-import regex")
});

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_]\w*$").expect("identifier regex"));

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// One single-line `from M import ...` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReference {
    /// Dotted module path (`pkg.helper`).
    pub module_path: String,
    /// Imported names, first-seen order, no duplicates.
    pub symbols: Vec<String>,
}

/// Parse one source line. Returns `None` for anything but a single-line,
/// non-wildcard, absolute `from` import.
pub fn parse_import_line(line: &str) -> Option<ImportReference> {
    let caps = FROM_IMPORT_RE.captures(line.trim_end())?;
    let module_path = caps[1].to_string();

    let names = caps[2].split('#').next().unwrap_or_default().trim();
    if names.starts_with('(') || names.ends_with('\\') || names.contains('*') {
        return None;
    }

    let mut symbols: Vec<String> = Vec::new();
    for item in names.split(',') {
        // `name as alias` imports `name`
        let Some(name) = item.split_whitespace().next() else {
            continue;
        };
        if IDENTIFIER_RE.is_match(name) && !symbols.iter().any(|s| s == name) {
            symbols.push(name.to_string());
        }
    }

    if symbols.is_empty() {
        return None;
    }
    Some(ImportReference {
        module_path,
        symbols,
    })
}

/// Collect every qualified import in `lines`, in source order.
pub fn parse_imports<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<ImportReference> {
    lines.into_iter().filter_map(parse_import_line).collect()
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// File access used by the resolver. Paths are root-relative with `/` separators.
pub trait SourceLookup: Send + Sync {
    fn is_file(&self, path: &str) -> bool;
    fn read_to_string(&self, path: &str) -> std::io::Result<String>;
}

/// [`SourceLookup`] over a directory on disk.
#[derive(Debug, Clone)]
pub struct FsLookup {
    root: PathBuf,
}

impl FsLookup {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SourceLookup for FsLookup {
    fn is_file(&self, path: &str) -> bool {
        self.root.join(path).is_file()
    }

    fn read_to_string(&self, path: &str) -> std::io::Result<String> {
        std::fs::read_to_string(self.root.join(path))
    }
}

/// Maps dotted module paths onto source files.
pub struct ImportResolver<'a> {
    lookup: &'a dyn SourceLookup,
    extension: &'a str,
}

impl<'a> ImportResolver<'a> {
    pub fn new(lookup: &'a dyn SourceLookup, extension: &'a str) -> Self {
        Self { lookup, extension }
    }

    /// `pkg.helper` → `pkg/helper.py` when that file exists, else
    /// `pkg/helper/__init__.py` whether or not it exists.
    pub fn resolve(&self, module_path: &str) -> String {
        let base = module_path.replace('.', "/");
        let module_file = format!("{base}.{}", self.extension);
        if self.lookup.is_file(&module_file) {
            return module_file;
        }
        format!("{base}/__init__.{}", self.extension)
    }

    pub fn read(&self, path: &str) -> std::io::Result<String> {
        self.lookup.read_to_string(path)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory lookup for resolver tests.
    #[derive(Default)]
    pub(crate) struct MemoryLookup(pub HashMap<String, String>);

    impl MemoryLookup {
        pub(crate) fn with(files: &[(&str, &str)]) -> Self {
            Self(
                files
                    .iter()
                    .map(|(p, c)| (p.to_string(), c.to_string()))
                    .collect(),
            )
        }
    }

    impl SourceLookup for MemoryLookup {
        fn is_file(&self, path: &str) -> bool {
            self.0.contains_key(path)
        }

        fn read_to_string(&self, path: &str) -> std::io::Result<String> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))
        }
    }

    #[test]
    fn parses_symbol_list() {
        let import = parse_import_line("from pkg.helper import check_spn,  list_users ,x").unwrap();
        assert_eq!(import.module_path, "pkg.helper");
        assert_eq!(import.symbols, vec!["check_spn", "list_users", "x"]);
    }

    #[test]
    fn alias_and_comment_are_dropped() {
        let import =
            parse_import_line("from pkg.helper import check_spn as spn, other  # noqa").unwrap();
        assert_eq!(import.symbols, vec!["check_spn", "other"]);
    }

    #[test]
    fn duplicate_symbols_in_one_statement_collapse() {
        let import = parse_import_line("from m import a, b, a").unwrap();
        assert_eq!(import.symbols, vec!["a", "b"]);
    }

    #[test]
    fn unsupported_forms_are_ignored() {
        assert!(parse_import_line("import os").is_none());
        assert!(parse_import_line("from pkg import *").is_none());
        assert!(parse_import_line("from pkg import (").is_none());
        assert!(parse_import_line("from pkg import a, \\").is_none());
        assert!(parse_import_line("from .local import thing").is_none());
        assert!(parse_import_line("    from pkg import nested").is_none());
        assert!(parse_import_line("# from pkg import commented").is_none());
    }

    #[test]
    fn parse_imports_keeps_source_order() {
        let source = "import json\nfrom a.b import x\n\nfrom c import y, z\n";
        let imports = parse_imports(source.lines());
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].module_path, "a.b");
        assert_eq!(imports[1].symbols, vec!["y", "z"]);
    }

    #[test]
    fn resolves_module_file_first() {
        let lookup = MemoryLookup::with(&[
            ("pkg/helper.py", ""),
            ("pkg/helper/__init__.py", ""),
        ]);
        let resolver = ImportResolver::new(&lookup, "py");
        assert_eq!(resolver.resolve("pkg.helper"), "pkg/helper.py");
    }

    #[test]
    fn falls_back_to_package_entry_even_when_missing() {
        let lookup = MemoryLookup::default();
        let resolver = ImportResolver::new(&lookup, "py");
        assert_eq!(resolver.resolve("pkg.helper"), "pkg/helper/__init__.py");
        assert!(resolver.read("pkg/helper/__init__.py").is_err());
    }

    #[test]
    fn fs_lookup_reads_relative_to_root() {
        let root = std::env::temp_dir().join(format!("ckb-imports-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(root.join("pkg")).unwrap();
        std::fs::write(root.join("pkg/helper.py"), "X = 1\n").unwrap();

        let lookup = FsLookup::new(root.clone());
        let resolver = ImportResolver::new(&lookup, "py");
        let path = resolver.resolve("pkg.helper");
        assert_eq!(path, "pkg/helper.py");
        assert_eq!(resolver.read(&path).unwrap(), "X = 1\n");

        let _ = std::fs::remove_dir_all(&root);
    }
}
