//! Handler for `dcm migrate`.

use std::path::Path;

use miette::Result;

use dcm_ops::ops_migrate::{self, MigrateOptions};
use dcm_util::progress;

pub fn exec(index_image: &str, output_dir: &Path, mirror: Option<&Path>) -> Result<()> {
    let config = super::load_config()?;
    let source = dcm_ops::image_source(&config.images, mirror);
    let save = ops_migrate::migrate(
        &MigrateOptions {
            index_image: index_image.to_string(),
            output_dir: output_dir.to_path_buf(),
            file_name: config.catalog.file_name,
        },
        source.as_ref(),
    )?;
    progress::status(
        "Finished",
        &format!("{} file(s) written to {}", save.written.len(), output_dir.display()),
    );
    Ok(())
}
