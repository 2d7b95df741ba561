//! End-to-end `build` pipeline: scan → analyze → validate → write KB.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{info, instrument};

use controlkb_analysis::{ControlSource, SymbolExtractor, scan_controls};
use controlkb_shared::{BuildConfig, CategoryTable, Control, ControlKbError, Result};

use crate::assembler::{ControlAssembler, check_unique_titles, save_knowledge_base};

/// Result of the `build` pipeline.
#[derive(Debug)]
pub struct BuildResult {
    /// Path of the written knowledge base.
    pub output: PathBuf,
    /// Number of controls written.
    pub control_count: usize,
    /// Dependency files referenced across all controls.
    pub dependency_count: usize,
    /// Distinct request keys across all controls.
    pub request_key_count: usize,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called each time a control finishes analysis.
    fn control_analyzed(&self, file_name: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn control_analyzed(&self, _file_name: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &BuildResult) {}
}

/// Run the full `build` pipeline.
///
/// 1. Load the title → category table
/// 2. Scan the controls directory
/// 3. Analyze every control on the blocking pool
/// 4. Reject duplicate titles
/// 5. Replace the knowledge base file
///
/// Any fatal error aborts before step 5, leaving the previous file in place.
#[instrument(skip_all, fields(controls_dir = %config.controls_dir.display()))]
pub async fn build_knowledge_base(
    config: &BuildConfig,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let start = Instant::now();
    info!(output = %config.output.display(), "starting build pipeline");

    // --- Phase 1: Category table ---
    progress.phase("Loading category table");
    let categories = CategoryTable::load(&config.category_table)?;
    info!(entries = categories.len(), "category table loaded");

    // --- Phase 2: Scan ---
    progress.phase("Scanning controls");
    let sources = scan_controls(&config.controls_dir, &config.scan)?;
    info!(controls = sources.len(), "controls discovered");

    // --- Phase 3: Analyze ---
    progress.phase("Analyzing controls");
    let assembler = Arc::new(ControlAssembler::from_config(config, categories)?);
    let controls = analyze_all(assembler, sources, progress).await?;

    // --- Phase 4: Validate ---
    progress.phase("Checking titles");
    check_unique_titles(&controls)?;

    // --- Phase 5: Write ---
    progress.phase("Writing knowledge base");
    save_knowledge_base(&config.output, &controls)?;

    let dependency_count = controls.iter().map(|c| c.dependencies.len()).sum();
    let request_key_count = controls
        .iter()
        .flat_map(|c| c.requests_keys.iter())
        .collect::<std::collections::BTreeSet<_>>()
        .len();

    let result = BuildResult {
        output: config.output.clone(),
        control_count: controls.len(),
        dependency_count,
        request_key_count,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        control_count = result.control_count,
        dependency_count = result.dependency_count,
        request_key_count = result.request_key_count,
        elapsed_ms = result.elapsed.as_millis(),
        "build pipeline complete"
    );

    Ok(result)
}

/// Analyze every source on its own blocking task.
///
/// Each task owns a parser; the assembler is shared read-only. The returned
/// controls are sorted by file name regardless of completion order.
async fn analyze_all(
    assembler: Arc<ControlAssembler>,
    sources: Vec<ControlSource>,
    progress: &dyn ProgressReporter,
) -> Result<Vec<Control>> {
    let total = sources.len();
    let mut tasks = JoinSet::new();

    for source in sources {
        let assembler = Arc::clone(&assembler);
        tasks.spawn_blocking(move || {
            let mut extractor = SymbolExtractor::new()?;
            assembler.assemble(&source, &mut extractor)
        });
    }

    let mut controls = Vec::with_capacity(total);
    while let Some(joined) = tasks.join_next().await {
        let control = joined.map_err(|e| ControlKbError::Worker(e.to_string()))??;
        progress.control_analyzed(&control.file_name, controls.len() + 1, total);
        controls.push(control);
    }

    controls.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(controls)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
