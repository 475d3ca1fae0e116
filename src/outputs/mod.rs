//! Output generation for batch reports.
//!
//! # Submodules
//!
//! - [`json`]: Pretty JSON reports, report files, and NDJSON event lines
//! - [`markdown`]: A readable Markdown report
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     └── 081502.json
//!
//! markdown_output_dir/
//! └── 2025-05-06_081502.md
//! ```

pub mod json;
pub mod markdown;
