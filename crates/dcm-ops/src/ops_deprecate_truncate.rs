//! Operation: deprecate bundles by truncating their channels.

use std::path::PathBuf;

use dcm_core::store::{CatalogStore, SaveReport};
use dcm_graph::truncate::{deprecate_truncate as truncate_package, TruncateReport};
use dcm_util::errors::DcmError;
use dcm_util::progress;

/// Options for `dcm deprecatetruncate`.
pub struct DeprecateTruncateOptions {
    pub dir: PathBuf,
    /// Images of the bundles to deprecate, processed in order.
    pub images: Vec<String>,
    pub file_name: String,
}

#[derive(Debug)]
pub struct DeprecateTruncateResult {
    pub reports: Vec<TruncateReport>,
    pub save: SaveReport,
}

/// Truncate every bundle built from `opts.images` out of its channels.
///
/// An image shared by several bundles targets each of them.
///
/// All images must be present in the catalog before anything is removed.
/// A target already deleted by an earlier target's truncation is skipped.
pub fn deprecate_truncate(opts: &DeprecateTruncateOptions) -> miette::Result<DeprecateTruncateResult> {
    if !opts.dir.is_dir() {
        return Err(DcmError::Generic {
            message: format!("catalog directory {} does not exist", opts.dir.display()),
        }
        .into());
    }
    let mut store = CatalogStore::with_file_name(&opts.dir, &opts.file_name);
    let mut model = crate::load_model(&mut store)?;

    let mut targets = Vec::new();
    let mut missing = Vec::new();
    for image in &opts.images {
        let found = model.find_by_image(image);
        if found.is_empty() {
            missing.push(image.clone());
        }
        targets.extend(
            found
                .into_iter()
                .map(|(package, bundle)| (package.to_string(), bundle.to_string())),
        );
    }
    if !missing.is_empty() {
        return Err(DcmError::BundleNotFound { images: missing }.into());
    }

    let mut reports = Vec::new();
    for (package, bundle) in targets {
        let Some(graph) = model.package_mut(&package) else {
            continue;
        };
        if !graph.contains(&bundle) {
            progress::status_info("Skipping", &format!("{bundle}, already removed"));
            continue;
        }
        let report = truncate_package(graph, &bundle)?;
        progress::status("Truncated", &report.to_string());
        reports.push(report);
    }

    model.validate()?;
    progress::status("Writing", &opts.dir.display().to_string());
    let save = store.save(&model.to_config())?;
    Ok(DeprecateTruncateResult { reports, save })
}
