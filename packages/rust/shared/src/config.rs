//! Application configuration for controlkb.
//!
//! User config lives at `~/.controlkb/controlkb.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ControlKbError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "controlkb.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".controlkb";

// ---------------------------------------------------------------------------
// Config structs (matching controlkb.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Control file selection.
    #[serde(default)]
    pub scan: ScanConfig,

    /// Source patterns the analyzer looks for.
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the control modules.
    #[serde(default = "default_controls_dir")]
    pub controls_dir: String,

    /// Root that dotted import paths are resolved against.
    #[serde(default = "default_source_root")]
    pub source_root: String,

    /// JSON title→category table.
    #[serde(default = "default_category_table")]
    pub category_table: String,

    /// Knowledge base output file.
    #[serde(default = "default_knowledge_base")]
    pub knowledge_base: String,

    /// Keyed request-result collection.
    #[serde(default = "default_requests_results")]
    pub requests_results: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            controls_dir: default_controls_dir(),
            source_root: default_source_root(),
            category_table: default_category_table(),
            knowledge_base: default_knowledge_base(),
            requests_results: default_requests_results(),
        }
    }
}

fn default_controls_dir() -> String {
    "ad_miner/sources/modules/controls".into()
}
fn default_source_root() -> String {
    ".".into()
}
fn default_category_table() -> String {
    "agent/llm_assets/implemented_controls_map.json".into()
}
fn default_knowledge_base() -> String {
    "agent/llm_assets/all_controls_info.json".into()
}
fn default_requests_results() -> String {
    "agent/llm_assets/requests_results.json".into()
}

/// `[scan]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Extension (without dot) a control file must carry.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// File name prefixes that are never controls.
    #[serde(default = "default_exclude_prefixes")]
    pub exclude_prefixes: Vec<String>,

    /// Exact file names that are never controls.
    #[serde(default = "default_exclude_files")]
    pub exclude_files: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            exclude_prefixes: default_exclude_prefixes(),
            exclude_files: default_exclude_files(),
        }
    }
}

fn default_extension() -> String {
    "py".into()
}
fn default_exclude_prefixes() -> Vec<String> {
    vec!["azure".into()]
}
fn default_exclude_files() -> Vec<String> {
    vec![
        "__init__.py".into(),
        "smolcard_class.py".into(),
        "control_template.py".into(),
    ]
}

/// `[extraction]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Identifier subscripted with request keys (`requests_results["key"]`).
    #[serde(default = "default_request_accessor")]
    pub request_accessor: String,

    /// Attribute assigned the control title (`self.title = "..."`).
    #[serde(default = "default_title_field")]
    pub title_field: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            request_accessor: default_request_accessor(),
            title_field: default_title_field(),
        }
    }
}

fn default_request_accessor() -> String {
    "requests_results".into()
}
fn default_title_field() -> String {
    "self.title".into()
}

// ---------------------------------------------------------------------------
// Build config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime build configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Directory holding the control modules.
    pub controls_dir: PathBuf,
    /// Root for dotted import resolution.
    pub source_root: PathBuf,
    /// Title→category table path.
    pub category_table: PathBuf,
    /// Knowledge base output file.
    pub output: PathBuf,
    /// Control file selection.
    pub scan: ScanConfig,
    /// Request-key accessor identifier.
    pub request_accessor: String,
    /// Title attribute.
    pub title_field: String,
}

impl From<&AppConfig> for BuildConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            controls_dir: PathBuf::from(&config.paths.controls_dir),
            source_root: PathBuf::from(&config.paths.source_root),
            category_table: PathBuf::from(&config.paths.category_table),
            output: PathBuf::from(&config.paths.knowledge_base),
            scan: config.scan.clone(),
            request_accessor: config.extraction.request_accessor.clone(),
            title_field: config.extraction.title_field.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.controlkb/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ControlKbError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.controlkb/controlkb.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ControlKbError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ControlKbError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ControlKbError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ControlKbError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ControlKbError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
