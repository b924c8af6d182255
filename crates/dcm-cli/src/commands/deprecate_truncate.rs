//! Handler for `dcm deprecatetruncate`.

use std::path::Path;

use miette::Result;

use dcm_ops::ops_deprecate_truncate::{self, DeprecateTruncateOptions};
use dcm_util::progress;

pub fn exec(dir: &Path, images: Vec<String>) -> Result<()> {
    let config = super::load_config()?;
    let result = ops_deprecate_truncate::deprecate_truncate(&DeprecateTruncateOptions {
        dir: dir.to_path_buf(),
        images,
        file_name: config.catalog.file_name,
    })?;

    let deleted: usize = result.reports.iter().map(|r| r.deleted.len()).sum();
    progress::status(
        "Finished",
        &format!("{deleted} bundle(s) deleted, {} file(s) written", result.save.written.len()),
    );
    Ok(())
}
