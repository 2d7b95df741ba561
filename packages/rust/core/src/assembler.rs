//! Control record assembly and knowledge-base persistence.
//!
//! Takes one scanned control, derives its title, category, dependencies and
//! request keys, and writes the full collection to disk.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use controlkb_analysis::{
    AssignmentTitle, ControlSource, FsLookup, ImportResolver, RequestKeyExtractor, SourceLookup,
    SymbolExtractor, TitleStrategy, build_dependencies,
};
use controlkb_shared::{BuildConfig, CategoryTable, Control, ControlKbError, Result};

/// Builds [`Control`] records. Cheap to clone; all parts are shared read-only.
#[derive(Clone)]
pub struct ControlAssembler {
    title: Arc<dyn TitleStrategy>,
    categories: Arc<CategoryTable>,
    request_keys: RequestKeyExtractor,
    lookup: Arc<dyn SourceLookup>,
    extension: String,
}

impl ControlAssembler {
    pub fn new(
        title: Arc<dyn TitleStrategy>,
        categories: Arc<CategoryTable>,
        request_keys: RequestKeyExtractor,
        lookup: Arc<dyn SourceLookup>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            title,
            categories,
            request_keys,
            lookup,
            extension: extension.into(),
        }
    }

    /// Assembler reading dependencies from `config.source_root` on disk.
    pub fn from_config(config: &BuildConfig, categories: CategoryTable) -> Result<Self> {
        Ok(Self::new(
            Arc::new(AssignmentTitle::new(&config.title_field)?),
            Arc::new(categories),
            RequestKeyExtractor::new(&config.request_accessor)?,
            Arc::new(FsLookup::new(config.source_root.clone())),
            config.scan.extension.clone(),
        ))
    }

    /// Build the record for one control.
    ///
    /// Fails when the control declares no title or the title has no category.
    /// Unresolvable imports and missing symbols only leave gaps in the
    /// dependency map.
    pub fn assemble(&self, source: &ControlSource, extractor: &mut SymbolExtractor) -> Result<Control> {
        let title = self
            .title
            .extract_title(&source.raw_text)
            .ok_or_else(|| ControlKbError::MissingTitle {
                file_name: source.file_name.clone(),
            })?;

        let control_category =
            self.categories
                .category(&title)
                .ok_or_else(|| ControlKbError::UnmappedTitle {
                    title: title.clone(),
                    file_name: source.file_name.clone(),
                })?;

        let resolver = ImportResolver::new(self.lookup.as_ref(), &self.extension);
        let dependencies = build_dependencies(&source.raw_text, &resolver, extractor);

        let mut requests_keys = self.request_keys.extract(&source.raw_text);
        for code in dependencies.values().flat_map(|d| d.code_map.values()) {
            self.request_keys.extract_into(code, &mut requests_keys);
        }

        debug!(
            file = %source.file_name,
            title = %title,
            dependencies = dependencies.len(),
            request_keys = requests_keys.len(),
            "control assembled"
        );

        Ok(Control {
            title,
            file_name: source.file_name.clone(),
            control_category,
            code: source.raw_text.clone(),
            dependencies,
            requests_keys,
        })
    }
}

/// Reject a collection in which two controls share a title.
pub fn check_unique_titles(controls: &[Control]) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for control in controls {
        if let Some(first_file) = seen.insert(&control.title, &control.file_name) {
            return Err(ControlKbError::DuplicateTitle {
                title: control.title.clone(),
                file_name: control.file_name.clone(),
                first_file: first_file.to_string(),
            });
        }
    }
    Ok(())
}

/// Write the whole collection as one JSON array, replacing any previous file.
///
/// The array is serialized in memory and written to a temporary sibling
/// before being renamed over `path`, so a failed save leaves the previous
/// knowledge base in place.
#[instrument(skip_all, fields(path = %path.display(), controls = controls.len()))]
pub fn save_knowledge_base(path: &Path, controls: &[Control]) -> Result<()> {
    let json = serde_json::to_string_pretty(controls)
        .map_err(|e| ControlKbError::Serialization(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ControlKbError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ControlKbError::config(format!("invalid output path {}", path.display())))?;
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, json).map_err(|e| ControlKbError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| ControlKbError::io(path, e))?;

    info!(count = controls.len(), "knowledge base written");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
