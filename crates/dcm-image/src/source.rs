//! The image source abstraction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use dcm_core::declcfg::{BundleBlob, DeclarativeConfig};
use dcm_core::package::Icon;
use dcm_util::errors::DcmError;

use crate::reference::ImageRef;

/// Image label naming the channel a bundle wants as its package default.
pub const DEFAULT_CHANNEL_LABEL: &str = "operators.operatorframework.io.bundle.channel.default.v1";

/// A bundle image rendered to its catalog blob, plus the summary metadata
/// a package takes from its default channel head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedBundle {
    pub bundle: BundleBlob,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
}

/// Where bundle and index images come from.
pub trait ImageSource {
    /// Make the image available locally.
    fn pull(&self, image: &ImageRef) -> Result<(), DcmError>;

    fn labels(&self, image: &ImageRef) -> Result<BTreeMap<String, String>, DcmError>;

    /// Render a bundle image to its `olm.bundle` blob.
    fn render_bundle(&self, image: &ImageRef) -> Result<RenderedBundle, DcmError>;

    /// Render an index image to the declarative config it serves.
    fn render_catalog(&self, image: &ImageRef) -> Result<DeclarativeConfig, DcmError>;

    /// The default channel label of the image, if set and non-empty.
    fn default_channel(&self, image: &ImageRef) -> Result<Option<String>, DcmError> {
        self.pull(image)?;
        Ok(self
            .labels(image)?
            .remove(DEFAULT_CHANNEL_LABEL)
            .filter(|ch| !ch.is_empty()))
    }
}
