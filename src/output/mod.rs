//! Output module for assembling crawl results
//!
//! This module handles:
//! - Rendering accepted pages into one markdown document
//! - Generating the llm.txt index
//! - Recording crawl statistics
//! - Writing artifacts to disk

mod assembler;
mod error;
pub mod llm_txt;
pub mod markdown;
pub mod stats;

pub use assembler::{AssembledOutput, Assembler};
pub use error::{OutputError, OutputResult};
pub use llm_txt::{classify_page, extract_description, render_llm_txt, PageKind};
pub use stats::{print_statistics, CrawlStats, SkipReason, SkippedUrl};

use std::fs;
use std::path::Path;

/// Writes `contents` to `path`, creating parent directories
///
/// The file is written under a temporary name and renamed into place, so an
/// interrupted write never leaves a truncated artifact at `path`.
pub fn write_artifact(path: &Path, contents: &str) -> OutputResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| OutputError::Write(format!("not a file path: {}", path.display())))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".partial");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        OutputError::Write(format!("failed to move output into {}: {}", path.display(), e))
    })?;

    tracing::debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}
