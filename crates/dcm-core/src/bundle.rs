//! The owned bundle entity.
//!
//! A [`Bundle`] holds the graph-relevant properties as typed fields and
//! keeps every other property opaque. The flat property list is derived on
//! demand by [`Bundle::to_blob`], so there is no second representation to
//! keep in sync while the graph is being edited.

use semver::Version;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use dcm_util::errors::DcmError;

use crate::declcfg::{BundleBlob, RelatedImage, SCHEMA_BUNDLE};
use crate::property::{ChannelMembership, PackageProperty, Property, RawProperty};

/// One release of a package.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    pub name: String,
    pub package: String,
    pub image: String,
    pub version: Version,
    /// Channel memberships, each with the replaces edge for that channel.
    pub channels: Vec<ChannelMembership>,
    pub skips: Vec<String>,
    pub skip_range: Option<String>,
    pub substitutes_for: Option<String>,
    /// Legacy `olm.deprecated` marker.
    pub deprecated: bool,
    pub related_images: Vec<RelatedImage>,
    /// Properties the graph engine does not interpret.
    pub properties: Vec<RawProperty>,
    pub extra: BTreeMap<String, Value>,
}

impl Bundle {
    /// A bundle with no edges and no payload.
    pub fn new(
        name: impl Into<String>,
        package: impl Into<String>,
        image: impl Into<String>,
        version: Version,
    ) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            image: image.into(),
            version,
            channels: Vec::new(),
            skips: Vec::new(),
            skip_range: None,
            substitutes_for: None,
            deprecated: false,
            related_images: Vec::new(),
            properties: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Build the typed entity from an on-disk blob.
    ///
    /// Requires exactly one `olm.package` property agreeing with the blob's
    /// package and carrying a semantic version, and at most one
    /// `olm.skipRange` and `olm.substitutesFor`.
    pub fn from_blob(blob: BundleBlob) -> Result<Self, DcmError> {
        let malformed = |message: String| DcmError::MalformedProperty {
            bundle: blob.name.clone(),
            message,
        };

        let mut packages: Vec<PackageProperty> = Vec::new();
        let mut skip_ranges: Vec<String> = Vec::new();
        let mut substitutes: Vec<String> = Vec::new();
        let mut bundle = Bundle::new(
            blob.name.clone(),
            blob.package.clone(),
            blob.image.clone(),
            Version::new(0, 0, 0),
        );

        for raw in &blob.properties {
            let prop = Property::parse(raw)
                .map_err(|e| malformed(format!("invalid {} property: {e}", raw.kind)))?;
            match prop {
                Property::Package(p) => packages.push(p),
                Property::Channel(ch) => bundle.channels.push(ch),
                Property::Skips(s) => bundle.skips.push(s),
                Property::SkipRange(r) => skip_ranges.push(r),
                Property::SubstitutesFor(s) => substitutes.push(s),
                Property::Deprecated => bundle.deprecated = true,
                Property::Other(raw) => bundle.properties.push(raw),
            }
        }

        let [package] = packages.as_slice() else {
            return Err(malformed(format!(
                "found {} olm.package properties, expected 1",
                packages.len()
            )));
        };
        if package.package_name != blob.package {
            return Err(malformed(format!(
                "olm.package names package {:?}, but the bundle belongs to {:?}",
                package.package_name, blob.package
            )));
        }
        bundle.version = Version::parse(&package.version).map_err(|e| {
            malformed(format!("version {:?} is not semver: {e}", package.version))
        })?;

        if skip_ranges.len() > 1 {
            return Err(malformed(format!(
                "found {} olm.skipRange properties, expected at most 1",
                skip_ranges.len()
            )));
        }
        bundle.skip_range = skip_ranges.pop().filter(|r| !r.is_empty());

        let substitutes: BTreeSet<String> =
            substitutes.into_iter().filter(|s| !s.is_empty()).collect();
        if substitutes.len() > 1 {
            return Err(malformed(format!(
                "found {} olm.substitutesFor properties, expected at most 1",
                substitutes.len()
            )));
        }
        bundle.substitutes_for = substitutes.into_iter().next();

        bundle.related_images = blob.related_images;
        bundle.extra = blob.extra;
        bundle.normalize();
        Ok(bundle)
    }

    /// Derive the on-disk blob, with properties in canonical order.
    pub fn to_blob(&self) -> BundleBlob {
        let mut props = vec![Property::Package(PackageProperty {
            package_name: self.package.clone(),
            version: self.version.to_string(),
        })];
        props.extend(self.channels.iter().cloned().map(Property::Channel));
        props.extend(self.skips.iter().cloned().map(Property::Skips));
        props.extend(self.skip_range.iter().cloned().map(Property::SkipRange));
        props.extend(self.substitutes_for.iter().cloned().map(Property::SubstitutesFor));
        if self.deprecated {
            props.push(Property::Deprecated);
        }

        let mut properties: Vec<RawProperty> = props.iter().map(Property::to_raw).collect();
        properties.extend(self.properties.iter().cloned());

        BundleBlob {
            schema: SCHEMA_BUNDLE.to_string(),
            name: self.name.clone(),
            package: self.package.clone(),
            image: self.image.clone(),
            properties,
            related_images: self.related_images.clone(),
            extra: self.extra.clone(),
        }
    }

    /// The single replaces target shared by all channel memberships.
    ///
    /// Memberships without replaces are ignored; a bundle may be the tail of
    /// one channel and replace a bundle in another.
    pub fn replaces(&self) -> Result<Option<&str>, DcmError> {
        let distinct: BTreeSet<&str> = self
            .channels
            .iter()
            .filter_map(|ch| ch.replaces.as_deref())
            .collect();
        if distinct.len() > 1 {
            return Err(DcmError::AmbiguousReplaces {
                bundle: self.name.clone(),
                targets: distinct.into_iter().map(str::to_string).collect(),
            });
        }
        Ok(distinct.into_iter().next())
    }

    pub fn channel_names(&self) -> BTreeSet<&str> {
        self.channels.iter().map(|ch| ch.name.as_str()).collect()
    }

    pub fn in_channel(&self, channel: &str) -> bool {
        self.channels.iter().any(|ch| ch.name == channel)
    }

    /// Replaces target recorded for `channel`, if the bundle is a member.
    pub fn replaces_in(&self, channel: &str) -> Option<&str> {
        self.channels
            .iter()
            .find(|ch| ch.name == channel)
            .and_then(|ch| ch.replaces.as_deref())
    }

    /// Add a membership unless the exact (channel, replaces) pair exists.
    pub fn add_channel(&mut self, channel: &str, replaces: Option<&str>) -> bool {
        let membership = ChannelMembership::new(channel, replaces);
        if self.channels.contains(&membership) {
            return false;
        }
        self.channels.push(membership);
        true
    }

    /// Drop every membership of `channel`.
    pub fn remove_channel(&mut self, channel: &str) -> bool {
        let before = self.channels.len();
        self.channels.retain(|ch| ch.name != channel);
        before != self.channels.len()
    }

    /// Point every membership at `replaces`.
    pub fn set_replaces(&mut self, replaces: Option<&str>) {
        for ch in &mut self.channels {
            ch.replaces = replaces.map(str::to_string);
        }
        self.normalize();
    }

    pub fn skips_bundle(&self, name: &str) -> bool {
        self.skips.iter().any(|s| s == name)
    }

    pub fn add_skip(&mut self, name: &str) -> bool {
        if self.skips_bundle(name) {
            return false;
        }
        self.skips.push(name.to_string());
        true
    }

    /// Remove duplicate memberships, skips, related images and opaque
    /// properties, keeping the first occurrence of each.
    pub fn normalize(&mut self) {
        dedup_in_order(&mut self.channels);
        dedup_in_order(&mut self.skips);
        dedup_in_order(&mut self.related_images);
        dedup_in_order(&mut self.properties);
    }
}

impl fmt::Display for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.version)
    }
}

fn dedup_in_order<T: PartialEq + Clone>(items: &mut Vec<T>) {
    let mut kept: Vec<T> = Vec::with_capacity(items.len());
    for item in items.drain(..) {
        if !kept.contains(&item) {
            kept.push(item);
        }
    }
    *items = kept;
}
