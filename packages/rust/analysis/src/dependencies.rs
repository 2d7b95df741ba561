//! Per-control dependency map: resolved file → imported names and their source.

use std::collections::BTreeMap;

use tracing::debug;

use controlkb_shared::Dependency;

use crate::imports::{ImportResolver, parse_imports};
use crate::symbols::SymbolExtractor;

/// Resolve every qualified import in `source` and extract the imported symbols.
///
/// Imports that land on the same file share one entry. A file that cannot
/// be read still gets an entry, with an empty `code_map`.
pub fn build_dependencies(
    source: &str,
    resolver: &ImportResolver<'_>,
    extractor: &mut SymbolExtractor,
) -> BTreeMap<String, Dependency> {
    let mut dependencies: BTreeMap<String, Dependency> = BTreeMap::new();

    for import in parse_imports(source.lines()) {
        let path = resolver.resolve(&import.module_path);
        let entry = dependencies.entry(path).or_default();
        for symbol in import.symbols {
            if !entry.imported_elements.contains(&symbol) {
                entry.imported_elements.push(symbol);
            }
        }
    }

    for (path, dependency) in dependencies.iter_mut() {
        match resolver.read(path) {
            Ok(code) => {
                dependency.code_map = extractor.extract(&code, &dependency.imported_elements);
                debug!(
                    path = %path,
                    imported = dependency.imported_elements.len(),
                    found = dependency.code_map.len(),
                    "dependency extracted"
                );
            }
            Err(e) => {
                debug!(path = %path, error = %e, "dependency source unavailable");
            }
        }
    }

    dependencies
}
