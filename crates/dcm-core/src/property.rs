//! Typed bundle properties.
//!
//! On disk a bundle carries a flat list of `{type, value}` pairs. The types
//! the graph engine understands are decoded into [`Property`]; everything
//! else stays opaque and is passed through untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

pub const TYPE_PACKAGE: &str = "olm.package";
pub const TYPE_CHANNEL: &str = "olm.channel";
pub const TYPE_SKIPS: &str = "olm.skips";
pub const TYPE_SKIP_RANGE: &str = "olm.skipRange";
pub const TYPE_SUBSTITUTES_FOR: &str = "olm.substitutesFor";
pub const TYPE_DEPRECATED: &str = "olm.deprecated";

/// A property exactly as it appears in a bundle blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProperty {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Value,
}

/// Membership of a bundle in one channel, with the bundle's replaces edge
/// as recorded for that channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelMembership {
    pub name: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub replaces: Option<String>,
}

impl ChannelMembership {
    pub fn new(name: impl Into<String>, replaces: Option<&str>) -> Self {
        Self {
            name: name.into(),
            replaces: replaces.map(str::to_string),
        }
    }
}

/// Value of the `olm.package` property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageProperty {
    pub package_name: String,
    pub version: String,
}

/// A decoded bundle property.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Package(PackageProperty),
    Channel(ChannelMembership),
    Skips(String),
    SkipRange(String),
    SubstitutesFor(String),
    Deprecated,
    Other(RawProperty),
}

impl Property {
    /// Decode a raw property. Unknown types become [`Property::Other`].
    pub fn parse(raw: &RawProperty) -> Result<Self, serde_json::Error> {
        let value = raw.value.clone();
        Ok(match raw.kind.as_str() {
            TYPE_PACKAGE => Property::Package(serde_json::from_value(value)?),
            TYPE_CHANNEL => Property::Channel(serde_json::from_value(value)?),
            TYPE_SKIPS => Property::Skips(serde_json::from_value(value)?),
            TYPE_SKIP_RANGE => Property::SkipRange(serde_json::from_value(value)?),
            TYPE_SUBSTITUTES_FOR => Property::SubstitutesFor(serde_json::from_value(value)?),
            TYPE_DEPRECATED => Property::Deprecated,
            _ => Property::Other(raw.clone()),
        })
    }

    /// Encode back into the on-disk `{type, value}` shape.
    pub fn to_raw(&self) -> RawProperty {
        let (kind, value) = match self {
            Property::Package(p) => (
                TYPE_PACKAGE,
                json!({ "packageName": p.package_name, "version": p.version }),
            ),
            Property::Channel(ch) => match &ch.replaces {
                Some(r) => (TYPE_CHANNEL, json!({ "name": ch.name, "replaces": r })),
                None => (TYPE_CHANNEL, json!({ "name": ch.name })),
            },
            Property::Skips(s) => (TYPE_SKIPS, Value::String(s.clone())),
            Property::SkipRange(r) => (TYPE_SKIP_RANGE, Value::String(r.clone())),
            Property::SubstitutesFor(s) => (TYPE_SUBSTITUTES_FOR, Value::String(s.clone())),
            Property::Deprecated => (TYPE_DEPRECATED, json!({})),
            Property::Other(raw) => return raw.clone(),
        };
        RawProperty {
            kind: kind.to_string(),
            value,
        }
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
