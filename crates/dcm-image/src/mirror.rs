//! Image source backed by a directory of pre-rendered images.
//!
//! Each image reference maps to a subdirectory named by
//! [`ImageRef::dir_name`] holding:
//! - `bundle.json`: a [`RenderedBundle`] for bundle images
//! - `labels.json`: optional image labels
//! - `catalog.json`: a blob stream for index images

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dcm_core::declcfg::DeclarativeConfig;
use dcm_util::errors::DcmError;

use crate::reference::ImageRef;
use crate::source::{ImageSource, RenderedBundle};

pub const BUNDLE_FILE: &str = "bundle.json";
pub const LABELS_FILE: &str = "labels.json";
pub const CATALOG_FILE: &str = "catalog.json";

#[derive(Debug, Clone)]
pub struct MirrorSource {
    root: PathBuf,
}

impl MirrorSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the rendered content of `image`.
    pub fn image_dir(&self, image: &ImageRef) -> PathBuf {
        self.root.join(image.dir_name())
    }

    fn read(&self, image: &ImageRef, file: &str) -> Result<String, DcmError> {
        let path = self.image_dir(image).join(file);
        std::fs::read_to_string(&path).map_err(|e| DcmError::Image {
            image: image.to_string(),
            message: format!("cannot read {}: {e}", path.display()),
        })
    }
}

impl ImageSource for MirrorSource {
    fn pull(&self, image: &ImageRef) -> Result<(), DcmError> {
        let dir = self.image_dir(image);
        if !dir.is_dir() {
            return Err(DcmError::Image {
                image: image.to_string(),
                message: format!("not found in mirror {}", self.root.display()),
            });
        }
        Ok(())
    }

    fn labels(&self, image: &ImageRef) -> Result<BTreeMap<String, String>, DcmError> {
        self.pull(image)?;
        if !self.image_dir(image).join(LABELS_FILE).is_file() {
            return Ok(BTreeMap::new());
        }
        let data = self.read(image, LABELS_FILE)?;
        serde_json::from_str(&data).map_err(|e| DcmError::Image {
            image: image.to_string(),
            message: format!("invalid {LABELS_FILE}: {e}"),
        })
    }

    fn render_bundle(&self, image: &ImageRef) -> Result<RenderedBundle, DcmError> {
        self.pull(image)?;
        let data = self.read(image, BUNDLE_FILE)?;
        serde_json::from_str(&data).map_err(|e| DcmError::Image {
            image: image.to_string(),
            message: format!("invalid {BUNDLE_FILE}: {e}"),
        })
    }

    fn render_catalog(&self, image: &ImageRef) -> Result<DeclarativeConfig, DcmError> {
        self.pull(image)?;
        let data = self.read(image, CATALOG_FILE)?;
        DeclarativeConfig::from_json_stream(&data, &format!("{image} {CATALOG_FILE}"))
    }
}
