//! Handler for `dcm add`.

use std::path::Path;

use miette::Result;

use dcm_ops::ops_add::{self, AddOptions};
use dcm_util::progress;

pub fn exec(dir: &Path, images: Vec<String>, overwrite_latest: bool, mirror: Option<&Path>) -> Result<()> {
    let config = super::load_config()?;
    let source = dcm_ops::image_source(&config.images, mirror);

    let result = ops_add::add(
        &AddOptions {
            dir: dir.to_path_buf(),
            images,
            overwrite_latest,
            file_name: config.catalog.file_name,
        },
        source.as_ref(),
    )?;

    for report in &result.reports {
        if report.default_channel_changed {
            progress::status_info(
                "Default",
                &format!("channel of {} is now {}", report.bundle, report.default_channel),
            );
        }
    }
    progress::status(
        "Finished",
        &format!(
            "{} bundle(s) added, {} file(s) written",
            result.reports.len(),
            result.save.written.len()
        ),
    );
    Ok(())
}
