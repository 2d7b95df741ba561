//! Control file enumeration.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use controlkb_shared::{ControlKbError, Result, ScanConfig};

/// Raw text of one control module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSource {
    /// File name without directory.
    pub file_name: String,
    pub raw_text: String,
}

/// Whether a directory entry name is a control module under `options`.
pub fn is_control_file(file_name: &str, options: &ScanConfig) -> bool {
    let extension = Path::new(file_name).extension().and_then(|e| e.to_str());
    if extension != Some(options.extension.as_str()) {
        return false;
    }
    if options
        .exclude_prefixes
        .iter()
        .any(|prefix| file_name.starts_with(prefix.as_str()))
    {
        return false;
    }
    !options.exclude_files.iter().any(|name| name == file_name)
}

/// Read every control module in `dir`, sorted by file name.
///
/// Subdirectories are not descended into.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn scan_controls(dir: &Path, options: &ScanConfig) -> Result<Vec<ControlSource>> {
    let entries = std::fs::read_dir(dir).map_err(|e| ControlKbError::io(dir, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ControlKbError::io(dir, e))?;
        if !entry.path().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(String::from) else {
            warn!(path = %entry.path().display(), "skipping non UTF-8 file name");
            continue;
        };
        if is_control_file(&name, options) {
            names.push(name);
        } else {
            debug!(file = %name, "not a control file");
        }
    }
    names.sort();

    let sources = names
        .into_iter()
        .map(|file_name| {
            let path = dir.join(&file_name);
            let raw_text =
                std::fs::read_to_string(&path).map_err(|e| ControlKbError::io(&path, e))?;
            Ok(ControlSource {
                file_name,
                raw_text,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(count = sources.len(), "control files scanned");
    Ok(sources)
}
