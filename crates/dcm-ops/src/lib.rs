//! Catalog operations behind the dcm commands.
//!
//! Each operation transforms the whole catalog in memory and writes it back
//! once at the end. Nothing is written on error.

pub mod ops_add;
pub mod ops_deprecate_truncate;
pub mod ops_migrate;

use std::path::Path;

use dcm_core::config::ImagesConfig;
use dcm_core::store::CatalogStore;
use dcm_graph::Model;
use dcm_image::{CommandSource, ImageSource, MirrorSource};
use dcm_util::errors::DcmError;

/// The mirror directory when one is given, otherwise the configured
/// external commands.
pub fn image_source(config: &ImagesConfig, mirror: Option<&Path>) -> Box<dyn ImageSource> {
    match mirror.or(config.mirror.as_deref()) {
        Some(dir) => {
            tracing::debug!(mirror = %dir.display(), "using image mirror");
            Box::new(MirrorSource::new(dir))
        }
        None => Box::new(CommandSource::from_config(config)),
    }
}

/// Load the catalog under the store's root and check it is consistent.
fn load_model(store: &mut CatalogStore) -> Result<Model, DcmError> {
    let model = Model::from_config(store.load()?)?;
    model.validate()?;
    tracing::debug!(
        root = %store.root().display(),
        packages = model.packages().count(),
        "loaded catalog"
    );
    Ok(model)
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::path::Path;

    use dcm_image::{ImageRef, MirrorSource, DEFAULT_CHANNEL_LABEL};
    use serde_json::json;

    /// Write a rendered bundle image into a mirror directory.
    pub fn mirror_bundle(
        mirror: &Path,
        image: &str,
        name: &str,
        version: &str,
        channels: &[(&str, Option<&str>)],
        default_channel: Option<&str>,
    ) {
        let mut properties = vec![json!({
            "type": "olm.package",
            "value": {"packageName": "etcd", "version": version}
        })];
        for (channel, replaces) in channels {
            properties.push(match replaces {
                Some(r) => json!({"type": "olm.channel", "value": {"name": channel, "replaces": r}}),
                None => json!({"type": "olm.channel", "value": {"name": channel}}),
            });
        }
        let rendered = json!({
            "bundle": {
                "schema": "olm.bundle",
                "name": name,
                "package": "etcd",
                "image": image,
                "properties": properties,
            },
            "description": format!("etcd {version}"),
        });
        let dir = MirrorSource::new(mirror).image_dir(&ImageRef::parse(image).unwrap());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("bundle.json"), rendered.to_string()).unwrap();
        if let Some(ch) = default_channel {
            let labels = std::collections::BTreeMap::from([(DEFAULT_CHANNEL_LABEL, ch)]);
            std::fs::write(dir.join("labels.json"), serde_json::to_string(&labels).unwrap()).unwrap();
        }
    }
}
