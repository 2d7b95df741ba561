//! Static analysis of control modules.
//!
//! Each stage works on plain source text:
//! - [`scanner`]: enumerate and read control files
//! - [`imports`]: parse `from M import a, b` lines and resolve them to files
//! - [`symbols`]: extract top-level definitions with tree-sitter
//! - [`dependencies`]: combine the two into a per-control dependency map
//! - [`request_keys`]: harvest `requests_results["key"]` references
//! - [`title`]: find the declared control title

pub mod dependencies;
pub mod imports;
pub mod request_keys;
pub mod scanner;
pub mod symbols;
pub mod title;

pub use dependencies::build_dependencies;
pub use imports::{FsLookup, ImportReference, ImportResolver, SourceLookup, parse_imports};
pub use request_keys::RequestKeyExtractor;
pub use scanner::{ControlSource, is_control_file, scan_controls};
pub use symbols::SymbolExtractor;
pub use title::{AssignmentTitle, TitleStrategy};
