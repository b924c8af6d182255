//! Declarative config blobs and their JSON stream encoding.
//!
//! A catalog file is a stream of concatenated JSON objects, each tagged with
//! a `schema`. Packages, bundles and channels are decoded; every other schema
//! is kept as an opaque [`Meta`] and written back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use dcm_util::errors::DcmError;

use crate::package::Package;
use crate::property::RawProperty;

pub const SCHEMA_PACKAGE: &str = "olm.package";
pub const SCHEMA_BUNDLE: &str = "olm.bundle";
pub const SCHEMA_CHANNEL: &str = "olm.channel";

/// An `olm.bundle` blob as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleBlob {
    pub schema: String,
    pub name: String,
    pub package: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub properties: Vec<RawProperty>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_images: Vec<RelatedImage>,
    /// Unknown keys, written back verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// An image referenced by a bundle besides the bundle image itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelatedImage {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub image: String,
}

/// An `olm.channel` blob: the members of one channel of a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelBlob {
    pub schema: String,
    pub package: String,
    pub name: String,
    #[serde(default)]
    pub entries: Vec<ChannelEntry>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ChannelBlob {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: SCHEMA_CHANNEL.to_string(),
            package: package.into(),
            name: name.into(),
            entries: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaces: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skips: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_range: Option<String>,
}

/// A blob of any other schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Meta {
    pub schema: String,
    pub package: Option<String>,
    pub blob: Value,
}

/// The full contents of a catalog, flattened.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclarativeConfig {
    pub packages: Vec<Package>,
    pub bundles: Vec<BundleBlob>,
    pub channels: Vec<ChannelBlob>,
    pub others: Vec<Meta>,
}

impl DeclarativeConfig {
    /// Decode a stream of JSON blobs. `origin` names the source in errors.
    pub fn from_json_stream(data: &str, origin: &str) -> Result<Self, DcmError> {
        let catalog_err = |message: String| DcmError::Catalog {
            path: origin.to_string(),
            message,
        };

        let mut cfg = Self::default();
        for value in serde_json::Deserializer::from_str(data).into_iter::<Value>() {
            let value = value.map_err(|e| catalog_err(format!("invalid JSON: {e}")))?;
            let schema = value
                .get("schema")
                .and_then(Value::as_str)
                .ok_or_else(|| catalog_err("blob without a \"schema\" key".to_string()))?
                .to_string();
            match schema.as_str() {
                SCHEMA_PACKAGE => {
                    let pkg: Package = serde_json::from_value(value)
                        .map_err(|e| catalog_err(format!("invalid {SCHEMA_PACKAGE} blob: {e}")))?;
                    cfg.packages.push(pkg);
                }
                SCHEMA_BUNDLE => {
                    let bundle: BundleBlob = serde_json::from_value(value)
                        .map_err(|e| catalog_err(format!("invalid {SCHEMA_BUNDLE} blob: {e}")))?;
                    cfg.bundles.push(bundle);
                }
                SCHEMA_CHANNEL => {
                    let channel: ChannelBlob = serde_json::from_value(value)
                        .map_err(|e| catalog_err(format!("invalid {SCHEMA_CHANNEL} blob: {e}")))?;
                    cfg.channels.push(channel);
                }
                _ => {
                    let package = value
                        .get("package")
                        .and_then(Value::as_str)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string);
                    cfg.others.push(Meta {
                        schema,
                        package,
                        blob: value,
                    });
                }
            }
        }
        Ok(cfg)
    }

    /// Encode as a stream of pretty-printed blobs: packages, bundles,
    /// channels and then opaque blobs, each followed by a newline.
    pub fn to_json_stream(&self) -> Result<String, DcmError> {
        let mut out = String::new();
        let encode_err = |e: serde_json::Error| DcmError::Generic {
            message: format!("Failed to encode catalog blob: {e}"),
        };
        for pkg in &self.packages {
            out.push_str(&serde_json::to_string_pretty(pkg).map_err(encode_err)?);
            out.push('\n');
        }
        for bundle in &self.bundles {
            out.push_str(&serde_json::to_string_pretty(bundle).map_err(encode_err)?);
            out.push('\n');
        }
        for channel in &self.channels {
            out.push_str(&serde_json::to_string_pretty(channel).map_err(encode_err)?);
            out.push('\n');
        }
        for meta in &self.others {
            out.push_str(&serde_json::to_string_pretty(&meta.blob).map_err(encode_err)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Append everything from `other`.
    pub fn merge(&mut self, other: DeclarativeConfig) {
        self.packages.extend(other.packages);
        self.bundles.extend(other.bundles);
        self.channels.extend(other.channels);
        self.others.extend(other.others);
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
            && self.bundles.is_empty()
            && self.channels.is_empty()
            && self.others.is_empty()
    }
}
