//! Operation: migrate an index image to a declarative config directory.

use std::path::PathBuf;

use dcm_core::store::{CatalogStore, SaveReport};
use dcm_image::{ImageRef, ImageSource};
use dcm_util::errors::DcmError;
use dcm_util::{fs, progress};

/// Options for `dcm migrate`.
pub struct MigrateOptions {
    pub index_image: String,
    /// Must be empty or absent.
    pub output_dir: PathBuf,
    pub file_name: String,
}

/// Render `opts.index_image` and write the result under `opts.output_dir`.
pub fn migrate(opts: &MigrateOptions, source: &dyn ImageSource) -> miette::Result<SaveReport> {
    if !fs::is_empty_dir(&opts.output_dir)? {
        return Err(DcmError::Generic {
            message: format!(
                "output directory {} must be empty or absent",
                opts.output_dir.display()
            ),
        }
        .into());
    }
    let image = ImageRef::parse(&opts.index_image)?;

    progress::status("Pulling", image.as_str());
    let pb = progress::spinner(&format!("Rendering {image}"));
    let rendered = source.pull(&image).and_then(|()| source.render_catalog(&image));
    pb.finish_and_clear();
    let cfg = rendered?;
    tracing::info!(
        image = %image,
        packages = cfg.packages.len(),
        bundles = cfg.bundles.len(),
        "rendered index image"
    );

    progress::status("Writing", &opts.output_dir.display().to_string());
    let save = CatalogStore::with_file_name(&opts.output_dir, &opts.file_name).save(&cfg)?;
    Ok(save)
}
