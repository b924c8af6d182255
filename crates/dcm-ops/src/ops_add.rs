//! Operation: add bundle images to a catalog directory.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use dcm_core::bundle::Bundle;
use dcm_core::package::{Icon, Package};
use dcm_core::store::{CatalogStore, SaveReport};
use dcm_graph::default_channel::{channel_summaries, DefaultChannelHints};
use dcm_graph::insert::{insert_bundle, InsertOptions, InsertReport};
use dcm_graph::PackageGraph;
use dcm_image::{ImageRef, ImageSource};
use dcm_util::errors::DcmError;
use dcm_util::{fs, progress};

/// Options for `dcm add`.
pub struct AddOptions {
    /// Catalog root directory; created when missing.
    pub dir: PathBuf,
    /// Bundle image references, inserted in order.
    pub images: Vec<String>,
    /// Allow replacing an existing channel head with the same name.
    pub overwrite_latest: bool,
    /// Per-package file name used when saving.
    pub file_name: String,
}

#[derive(Debug)]
pub struct AddResult {
    pub reports: Vec<InsertReport>,
    pub save: SaveReport,
}

/// Default channel hints read from the labels of each bundle's image.
struct LabelHints<'a> {
    source: &'a dyn ImageSource,
}

impl DefaultChannelHints for LabelHints<'_> {
    fn default_channel_hint(&self, bundle: &Bundle) -> Result<Option<String>, DcmError> {
        if bundle.image.is_empty() {
            return Ok(None);
        }
        let image = ImageRef::parse(&bundle.image)?;
        self.source.default_channel(&image)
    }
}

/// A bundle rendered in this run, with the metadata its image carried.
struct Rendered {
    bundle: Bundle,
    description: Option<String>,
    icon: Option<Icon>,
}

/// Render `opts.images` and insert them into the catalog under `opts.dir`.
///
/// The catalog is written once, after every bundle was inserted and the
/// resulting model validated.
pub fn add(opts: &AddOptions, source: &dyn ImageSource) -> miette::Result<AddResult> {
    fs::ensure_dir(&opts.dir)?;
    let mut store = CatalogStore::with_file_name(&opts.dir, &opts.file_name);
    let mut model = crate::load_model(&mut store)?;

    let refs = opts
        .images
        .iter()
        .map(|image| ImageRef::parse(image))
        .collect::<Result<Vec<_>, _>>()?;

    let mut by_package: BTreeMap<String, Vec<Rendered>> = BTreeMap::new();
    for image in &refs {
        let rendered = render(source, image)?;
        by_package
            .entry(rendered.bundle.package.clone())
            .or_default()
            .push(rendered);
    }

    let hints = LabelHints { source };
    let options = InsertOptions {
        overwrite_latest: opts.overwrite_latest,
    };
    let mut reports = Vec::new();

    for (package, rendered) in by_package {
        let mut graph = match model.package(&package) {
            Some(existing) => existing.clone(),
            None => new_package(&package, &rendered, &hints)?,
        };

        let mut added = BTreeSet::new();
        for r in &rendered {
            progress::status("Adding", &format!("{} to package {package}", r.bundle.name));
            added.insert(r.bundle.name.clone());
            let report = insert_bundle(&mut graph, r.bundle.clone(), &hints, options)?;
            tracing::info!(package = %package, "{report}");
            reports.push(report);
        }

        update_summary(&mut graph, &rendered, &added)?;
        model.put_package(graph);
    }

    model.validate()?;
    progress::status("Writing", &opts.dir.display().to_string());
    let save = store.save(&model.to_config())?;
    Ok(AddResult { reports, save })
}

fn render(source: &dyn ImageSource, image: &ImageRef) -> Result<Rendered, DcmError> {
    progress::status("Pulling", image.as_str());
    let pb = progress::spinner(&format!("Rendering {image}"));
    let result = source.pull(image).and_then(|()| source.render_bundle(image));
    pb.finish_and_clear();

    let mut rendered = result?;
    if rendered.bundle.image.is_empty() {
        rendered.bundle.image = image.to_string();
    }
    Ok(Rendered {
        bundle: Bundle::from_blob(rendered.bundle)?,
        description: rendered.description,
        icon: rendered.icon,
    })
}

/// A package that does not exist yet takes its metadata from the first
/// bundle added to it.
fn new_package(
    name: &str,
    rendered: &[Rendered],
    hints: &dyn DefaultChannelHints,
) -> Result<PackageGraph, DcmError> {
    progress::status_info("Creating", &format!("package {name}"));
    let mut package = Package::new(name, "");
    if let Some(first) = rendered.first() {
        package.default_channel = hints.default_channel_hint(&first.bundle)?.unwrap_or_default();
        package.description = first.description.clone();
        package.icon = first.icon.clone();
    }
    Ok(PackageGraph::new(package))
}

/// Refresh description and icon from the default channel's head when that
/// head was rendered in this run.
fn update_summary(
    graph: &mut PackageGraph,
    rendered: &[Rendered],
    added: &BTreeSet<String>,
) -> Result<(), DcmError> {
    let summaries = channel_summaries(graph)?;
    let Some(head) = summaries.get(graph.default_channel()).map(|s| &s.max_head) else {
        return Ok(());
    };
    if !added.contains(head) {
        return Ok(());
    }
    if let Some(r) = rendered.iter().rev().find(|r| &r.bundle.name == head) {
        tracing::debug!(package = graph.name(), bundle = %head, "updating package description and icon");
        graph.package.description = r.description.clone();
        graph.package.icon = r.icon.clone();
    }
    Ok(())
}
