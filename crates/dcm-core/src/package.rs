use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::declcfg::SCHEMA_PACKAGE;

/// An `olm.package` blob: the package name, its default channel and the
/// summary metadata shown by catalog consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub default_channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unknown keys, written back verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Package icon, base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    #[serde(rename = "base64data")]
    pub data: String,
    #[serde(rename = "mediatype")]
    pub media_type: String,
}

impl Package {
    pub fn new(name: impl Into<String>, default_channel: impl Into<String>) -> Self {
        Self {
            schema: SCHEMA_PACKAGE.to_string(),
            name: name.into(),
            default_channel: default_channel.into(),
            icon: None,
            description: None,
            extra: BTreeMap::new(),
        }
    }
}
